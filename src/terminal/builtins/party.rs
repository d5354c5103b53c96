use crate::terminal::command::{
    ArgSpec, Category, Command, CommandOutput, CommandSpec, missing_capability,
};
use crate::terminal::context::{CommandContext, PartyRequest};

const SUBCOMMANDS: &[&str] = &["create", "join", "leave", "list", "info", "delete", "mode", "stats"];

pub struct PartyCommand {
    spec: CommandSpec,
}

impl PartyCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec {
                name: "party",
                aliases: &["p"],
                description: "Create, join and manage parties",
                usage: "party <create|join|leave|list|info|delete|mode|stats> [value]",
                args: vec![
                    ArgSpec::required("subcommand", "Party action"),
                    ArgSpec::optional("value", "Party name, invite code or mode"),
                ],
                category: Category::Party,
            },
        }
    }
}

fn request_for(subcommand: &str, value: Option<String>) -> Result<PartyRequest, String> {
    let needs = |what: &str| format!("Usage: party {subcommand} <{what}>");
    Ok(match subcommand {
        "create" => PartyRequest::Create(value),
        "join" => PartyRequest::Join(value.ok_or_else(|| needs("code"))?),
        "leave" => PartyRequest::Leave,
        "list" => PartyRequest::List,
        "info" => PartyRequest::Info,
        "delete" => PartyRequest::Delete(value),
        "mode" => PartyRequest::Mode(value.ok_or_else(|| needs("mode"))?),
        "stats" => PartyRequest::Stats,
        other => {
            return Err(format!(
                "Unknown party subcommand: {other}. Available: {}",
                SUBCOMMANDS.join(", ")
            ));
        }
    })
}

impl Command for PartyCommand {
    fn spec(&self) -> &CommandSpec { &self.spec }

    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
        let Some((subcommand, rest)) = args.split_first() else {
            return Ok(CommandOutput::text(format!("Usage: {}", self.spec.usage)));
        };
        let subcommand = subcommand.to_lowercase();
        let value = (!rest.is_empty()).then(|| rest.join(" "));
        let request = match request_for(&subcommand, value) {
            Ok(request) => request,
            Err(message) => return Ok(CommandOutput::text(message)),
        };
        let Some(party) = ctx.party.as_deref_mut() else {
            return Ok(missing_capability("party"));
        };
        let lines = party.handle(ctx.user.as_ref(), request)?;
        Ok(CommandOutput::Lines(lines))
    }
}
