use serde::Serialize;

use super::tokenizer::tokenize_detailed;

/// One submitted command line, split into a lower-cased command name and its
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCommand {
    pub original: String,
    pub tokens: Vec<String>,
    pub command: String,
    pub args: Vec<String>,
    pub error: Option<String>,
}

impl ParsedCommand {
    pub fn is_empty(&self) -> bool { self.command.is_empty() }
}

pub fn parse_command(line: &str) -> ParsedCommand {
    let tokenized = tokenize_detailed(line);
    let tokens = tokenized.tokens;
    let command = tokens.first().map(|t| t.to_lowercase()).unwrap_or_default();
    let args = tokens.iter().skip(1).cloned().collect();

    let error = if tokens.is_empty() {
        Some("No command entered".to_string())
    } else {
        tokenized.unterminated.map(|q| format!("Unterminated quote ({q})"))
    };

    ParsedCommand {
        original: line.to_string(),
        tokens,
        command,
        args,
        error,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn command_is_lowercased_args_verbatim() {
        let parsed = parse_command(r#"Roll "2D6+1" Extra"#);
        assert_eq!(parsed.command, "roll");
        assert_eq!(parsed.args, vec!["2D6+1", "Extra"]);
        assert_eq!(parsed.tokens.len(), 3);
        assert_eq!(parsed.original, r#"Roll "2D6+1" Extra"#);
        assert_eq!(parsed.error, None);
    }

    #[test]
    fn empty_line_reports_error() {
        let parsed = parse_command("   ");
        assert!(parsed.is_empty());
        assert!(parsed.args.is_empty());
        assert_eq!(parsed.error.as_deref(), Some("No command entered"));
    }

    #[test]
    fn unterminated_quote_still_parses() {
        let parsed = parse_command("announcement 'hello there");
        assert_eq!(parsed.command, "announcement");
        assert_eq!(parsed.args, vec!["hello there"]);
        assert_eq!(parsed.error.as_deref(), Some("Unterminated quote (')"));
    }
}
