use super::window::transform_current;
use crate::model::WindowType;
use crate::terminal::command::{
    ArgSpec, Category, Command, CommandOutput, CommandSpec, missing_capability,
};
use crate::terminal::context::CommandContext;

const DENIED: &str = "Permission denied: admin access required.";

pub struct AdminCommand {
    spec: CommandSpec,
}

impl AdminCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec {
                name: "admin",
                aliases: &[],
                description: "Open the admin panel in this window",
                usage: "admin",
                args: vec![],
                category: Category::Admin,
            },
        }
    }
}

impl Command for AdminCommand {
    fn spec(&self) -> &CommandSpec { &self.spec }

    fn execute(&self, _: &[String], ctx: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
        if !ctx.is_admin() {
            return Ok(CommandOutput::text(DENIED));
        }
        Ok(transform_current(ctx, WindowType::Admin))
    }
}

pub struct AnnouncementCommand {
    spec: CommandSpec,
}

impl AnnouncementCommand {
    pub fn new() -> Self {
        Self {
            spec: CommandSpec {
                name: "announcement",
                aliases: &["announce"],
                description: "Broadcast a message to every user",
                usage: "announcement \"<text>\"",
                args: vec![ArgSpec::required("text", "Message to broadcast")],
                category: Category::Admin,
            },
        }
    }
}

impl Command for AnnouncementCommand {
    fn spec(&self) -> &CommandSpec { &self.spec }

    fn execute(&self, args: &[String], ctx: &mut CommandContext<'_>) -> anyhow::Result<CommandOutput> {
        let Some(user) = ctx.user.clone().filter(|u| u.is_admin) else {
            return Ok(CommandOutput::text(DENIED));
        };
        let text = args.join(" ");
        if text.trim().is_empty() {
            return Ok(CommandOutput::text("Announcement text must not be empty."));
        }
        let Some(announcer) = ctx.announcer.as_deref_mut() else {
            return Ok(missing_capability("announcer"));
        };
        announcer.announce(&user, &text)?;
        Ok(CommandOutput::text(format!("Announcement sent: {text}")))
    }
}
