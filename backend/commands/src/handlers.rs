//! Built-in command handlers.
//!
//! `help` (alias `commands`) is the only command the pipeline ships with;
//! everything else is registered by the host.
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::dispatch::{CommandContext, CommandHandler, CommandResponse};
use crate::pattern::PatternError;
use crate::registry::{CommandRegistry, RegistryError};
use crate::types::{CommandDescriptor, CommandInvocation, Value};

/// Commands listed per help page.
pub const HELP_PAGE_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

/// Lists the commands the invoker can use, one page at a time, or shows the
/// details of one command.
pub struct HelpHandler;

impl HelpHandler {
    pub fn descriptor() -> Result<CommandDescriptor, PatternError> {
        Ok(CommandDescriptor::new("help")
            .alias("commands")
            .pattern("M?")?
            .help("Shows the commands you can use.\n[CMD_KEY]help (page) lists a page, [CMD_KEY]help (command) shows one command."))
    }

    fn page(ctx: &CommandContext, page: usize) -> CommandResponse {
        let visible: Vec<_> = ctx.registry.visible_to(ctx.permission).collect();
        let pages = visible.len().div_ceil(HELP_PAGE_SIZE).max(1);
        if page > pages {
            return CommandResponse::ephemeral(format!("Page {page} does not exist! There are {pages} pages."));
        }

        let mut lines = vec![format!("**Commands** (page {page}/{pages})")];
        for desc in visible.iter().skip((page - 1) * HELP_PAGE_SIZE).take(HELP_PAGE_SIZE) {
            lines.push(format!("`{}`", desc.usage(&ctx.prefix)));
        }
        if page < pages {
            lines.push(format!("Use `{}help {}` for the next page.", ctx.prefix, page + 1));
        }
        lines.push(format!("Use `{}help (command)` for details.", ctx.prefix));
        CommandResponse::ephemeral(lines.join("\n"))
    }

    fn detail(ctx: &CommandContext, name: &str) -> CommandResponse {
        let found = ctx
            .registry
            .find(name)
            .map(|c| c.descriptor.as_ref())
            .filter(|d| !d.hidden && ctx.permission >= d.permission);
        let Some(desc) = found else {
            return CommandResponse::ephemeral(format!("There is no command called `{name}`."));
        };

        let mut lines = vec![format!("**{}{}**", ctx.prefix, desc.name)];
        if let Some(help) = desc.help_text(&ctx.prefix) {
            lines.push(help);
        }
        lines.push(format!("Usage: `{}`", desc.usage(&ctx.prefix)));
        if !desc.aliases.is_empty() {
            let aliases: Vec<_> = desc.aliases.iter().map(|a| format!("`{}{a}`", ctx.prefix)).collect();
            lines.push(format!("Aliases: {}", aliases.join(", ")));
        }
        CommandResponse::ephemeral(lines.join("\n"))
    }
}

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn handle(&self, ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse> {
        Ok(match inv.args.value(0) {
            Some(Value::Count(page)) => Self::page(ctx, usize::try_from(*page).unwrap_or(usize::MAX)),
            Some(Value::Text(name)) => Self::detail(ctx, name),
            _ => Self::page(ctx, 1),
        })
    }
}

/// Register every built-in command.
pub fn register_builtins(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    registry.register(HelpHandler::descriptor()?, Arc::new(HelpHandler))
}
