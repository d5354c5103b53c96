use tracing::trace;

const QUOTES: [char; 3] = ['"', '\'', '`'];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tokenized {
    pub tokens: Vec<String>,
    /// Quote character left open at the end of input, if any.
    pub unterminated: Option<char>,
}

/// Splits a command line into tokens.
///
/// Whitespace separates tokens outside quotes. A quote (`"`, `'` or a
/// backtick) opens a quoted run that only the same character closes; the
/// quotes themselves are dropped. A backslash before a quote or another
/// backslash inserts that character literally. An unterminated quote keeps
/// whatever was collected so far.
pub fn tokenize(input: &str) -> Vec<String> { tokenize_detailed(input).tokens }

pub fn tokenize_detailed(input: &str) -> Tokenized {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // Distinguishes an empty quoted token from no token at all.
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek().is_some_and(|next| *next == '\\' || QUOTES.contains(next)) => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_token = true;
            }
            c if quote == Some(c) => quote = None,
            c if quote.is_none() && QUOTES.contains(&c) => {
                quote = Some(c);
                in_token = true;
            }
            c if quote.is_none() && c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    if let Some(q) = quote {
        trace!(quote = %q, "unterminated quote");
    }
    Tokenized { tokens, unterminated: quote }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn toks(input: &str) -> Vec<String> { tokenize(input) }

    #[test]
    fn quoted_run_is_one_token() {
        assert_eq!(toks(r#"split "my window" now"#), vec!["split", "my window", "now"]);
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(toks("a  b"), vec!["a", "b"]);
        assert_eq!(toks("  a\tb \n"), vec!["a", "b"]);
        assert!(toks("").is_empty());
        assert!(toks("   ").is_empty());
    }

    #[test]
    fn unterminated_quote_keeps_partial_token() {
        let out = tokenize_detailed(r#"foo "bar"#);
        assert_eq!(out.tokens, vec!["foo", "bar"]);
        assert_eq!(out.unterminated, Some('"'));

        let out = tokenize_detailed(r#"foo ""#);
        assert_eq!(out.tokens, vec!["foo", ""]);
    }

    #[test]
    fn all_three_quote_styles() {
        assert_eq!(toks("'a b' `c d` \"e f\""), vec!["a b", "c d", "e f"]);
    }

    #[test]
    fn other_quotes_are_literal_inside_a_quote() {
        assert_eq!(toks(r#""it's `here`""#), vec!["it's `here`"]);
    }

    #[test]
    fn backslash_escapes() {
        assert_eq!(toks(r#"say \"hi\""#), vec!["say", "\"hi\""]);
        assert_eq!(toks(r#""a \" b""#), vec!["a \" b"]);
        assert_eq!(toks(r"a\\b"), vec![r"a\b"]);
        assert_eq!(toks(r"c:\dir"), vec![r"c:\dir"]);
    }

    #[test]
    fn empty_quotes_yield_empty_token() {
        assert_eq!(toks(r#"echo "" x"#), vec!["echo", "", "x"]);
    }

    #[test]
    fn adjacent_quoted_and_bare_text_join() {
        assert_eq!(toks(r#"ab"c d"e"#), vec!["abc de"]);
    }
}
