//! Command dispatch: run an invocation through the gates, resolve its
//! arguments and call the handler.
//!
//! Gate order is fixed: permission, cooldown, confirmation, argument
//! matching. A rejection at any gate leaves the cooldown record untouched;
//! the record is stamped once the handler has run, whatever it returned.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use argot_core::{
    ChannelId, EntityDirectory, EntityId, LinkProbe, PermissionLevel, ScopeId, TeamDirectory,
};
use argot_logging::{CommandEvent, CommandEventLogger};
use argot_security::PermissionPolicy;
use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, instrument, Span};

use crate::confirmation::ConfirmationStore;
use crate::conversation::ReplyWaiter;
use crate::cooldown::{CooldownPermit, CooldownRejection, CooldownStore};
use crate::detection::detect_command;
use crate::matcher::{arity_range, match_arguments, MatchError};
use crate::pattern::TypeCode;
use crate::registry::{CommandRegistry, RegisteredCommand};
use crate::resolve::{BooleanPolicy, ResolveContext};
use crate::scanner::{scan, Token};
use crate::types::{CommandDescriptor, CommandInvocation};

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// Context passed to every command handler.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub invoker: EntityId,
    pub scope: ScopeId,
    pub channel: ChannelId,
    /// Effective level after policy overrides.
    pub permission: PermissionLevel,
    pub privileged: bool,
    pub prefix: String,
    pub registry: Arc<CommandRegistry>,
    pub replies: Arc<ReplyWaiter>,
    pub reply_timeout: Duration,
}

impl CommandContext {
    /// Wait for the invoker's next message in this channel.
    pub async fn next_message(&self) -> Option<String> {
        self.replies.wait_for(self.invoker, self.channel, self.reply_timeout).await
    }
}

/// The result returned by a command handler: text reply to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub text: String,
    pub ephemeral: bool, // only visible to the invoker
}

impl CommandResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self { text: text.into(), ephemeral: false }
    }
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self { text: text.into(), ephemeral: true }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &CommandContext, inv: &CommandInvocation) -> Result<CommandResponse>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{command}` requires level {required}")]
    PermissionDenied { command: String, required: PermissionLevel },

    #[error("`{command}` is on cooldown for another {}s", .remaining.as_secs())]
    CooldownActive { command: String, remaining: Duration, message: String },

    #[error("`{command}` is already running")]
    AlreadyRunning { command: String },

    #[error("`{command}` needs confirmation")]
    ConfirmationRequired { command: String, warning: String, hint: String },

    #[error("expected {} arguments, got {got}", arity_range(.min, .max))]
    ArityMismatch { min: usize, max: Option<usize>, got: usize, usage: String },

    #[error("argument {} (`{raw}`) is not a valid {}", .position + 1, .code.describe())]
    TypeResolutionFailed { slot: usize, position: usize, code: TypeCode, raw: String, usage: String },

    #[error("command failed: {0}")]
    Handler(#[from] anyhow::Error),
}

impl DispatchError {
    /// Stable tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::UnknownCommand(_) => "unknown_command",
            DispatchError::PermissionDenied { .. } => "permission_denied",
            DispatchError::CooldownActive { .. } => "cooldown_active",
            DispatchError::AlreadyRunning { .. } => "already_running",
            DispatchError::ConfirmationRequired { .. } => "confirmation_required",
            DispatchError::ArityMismatch { .. } => "arity_mismatch",
            DispatchError::TypeResolutionFailed { .. } => "type_resolution_failed",
            DispatchError::Handler(_) => "handler_failed",
        }
    }

    /// Text to show the invoker.
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::UnknownCommand(name) => format!("There is no command called `{name}`."),
            DispatchError::PermissionDenied { .. } => {
                "You do not have permission to use this command!".to_string()
            }
            DispatchError::CooldownActive { message, .. } => message.clone(),
            DispatchError::AlreadyRunning { command } => {
                format!("`{command}` is already running, wait for it to finish!")
            }
            DispatchError::ConfirmationRequired { warning, hint, .. } => {
                format!("{warning}\nType `{hint}` to confirm.")
            }
            DispatchError::ArityMismatch { min, max, got, usage } => format!(
                "Expected {} arguments but got {got}.\nUsage: `{usage}`",
                arity_range(min, max)
            ),
            DispatchError::TypeResolutionFailed { position, code, raw, usage, .. } => format!(
                "Argument {} (`{raw}`) is not a valid {}.\nUsage: `{usage}`",
                position + 1,
                code.describe()
            ),
            DispatchError::Handler(_) => "Something went wrong running that command.".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-invocation input
// ---------------------------------------------------------------------------

/// Who is invoking, where, and how to look up other participants.
#[derive(Clone)]
pub struct Invocation {
    pub author: EntityId,
    pub scope: ScopeId,
    pub channel: ChannelId,
    /// Level reported by the transport, before policy overrides.
    pub permission: PermissionLevel,
    pub entities: Arc<dyn EntityDirectory>,
}

/// What happened to an inbound message.
#[derive(Debug)]
pub enum MessageOutcome {
    Dispatched(Result<CommandResponse, DispatchError>),
    /// Consumed by a handler waiting for a reply.
    Replied,
    Ignored,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GateSettings {
    pub prefix: String,
    /// First argument that redeems a pending confirmation.
    pub confirmation_token: String,
    pub reply_timeout: Duration,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            confirmation_token: "cnf".to_string(),
            reply_timeout: Duration::from_secs(120),
        }
    }
}

/// Everything a dispatcher owns. Built at the composition root.
pub struct DispatcherParts {
    pub registry: Arc<CommandRegistry>,
    pub policy: PermissionPolicy,
    pub cooldowns: CooldownStore,
    pub confirmations: Arc<ConfirmationStore>,
    pub replies: Arc<ReplyWaiter>,
    pub teams: Arc<dyn TeamDirectory>,
    pub links: Arc<dyn LinkProbe>,
    pub booleans: BooleanPolicy,
    pub settings: GateSettings,
}

impl DispatcherParts {
    /// Parts with default policy, stores and settings.
    pub fn new(registry: CommandRegistry, teams: Arc<dyn TeamDirectory>, links: Arc<dyn LinkProbe>) -> Self {
        Self {
            registry: Arc::new(registry),
            policy: PermissionPolicy::default(),
            cooldowns: CooldownStore::new(),
            confirmations: Arc::new(ConfirmationStore::new(Duration::from_secs(60))),
            replies: Arc::new(ReplyWaiter::new()),
            teams,
            links,
            booleans: BooleanPolicy::default(),
            settings: GateSettings::default(),
        }
    }
}

pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
    policy: PermissionPolicy,
    cooldowns: CooldownStore,
    confirmations: Arc<ConfirmationStore>,
    replies: Arc<ReplyWaiter>,
    teams: Arc<dyn TeamDirectory>,
    links: Arc<dyn LinkProbe>,
    booleans: BooleanPolicy,
    settings: GateSettings,
}

impl CommandDispatcher {
    pub fn new(parts: DispatcherParts) -> Self {
        let DispatcherParts {
            registry,
            policy,
            cooldowns,
            confirmations,
            replies,
            teams,
            links,
            booleans,
            settings,
        } = parts;
        Self { registry, policy, cooldowns, confirmations, replies, teams, links, booleans, settings }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn cooldowns(&self) -> &CooldownStore {
        &self.cooldowns
    }

    pub fn confirmations(&self) -> &ConfirmationStore {
        &self.confirmations
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    /// Route an inbound message: prefixed text is dispatched, anything else is
    /// offered to a waiting handler.
    pub async fn handle_message(&self, inv: &Invocation, text: &str) -> MessageOutcome {
        match detect_command(text, &self.settings.prefix) {
            Some(cmd) => MessageOutcome::Dispatched(self.dispatch(inv, &cmd.name, cmd.raw_args).await),
            None if self.replies.offer(inv.author, inv.channel, text) => MessageOutcome::Replied,
            None => MessageOutcome::Ignored,
        }
    }

    /// Run `name` with `raw_args` for `inv`.
    #[instrument(
        name = "dispatch",
        skip_all,
        fields(command = %name, invoker = %inv.author, channel = %inv.channel, image = tracing::field::Empty)
    )]
    pub async fn dispatch(
        &self,
        inv: &Invocation,
        name: &str,
        raw_args: &str,
    ) -> Result<CommandResponse, DispatchError> {
        let started = Instant::now();
        let outcome = self.run(inv, name, raw_args).await;

        let command = self.registry.find(name).map_or(name, |c| c.descriptor.name.as_str()).to_string();
        let event = match &outcome {
            Ok(_) => CommandEvent::Executed {
                command,
                elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            },
            Err(DispatchError::ConfirmationRequired { .. }) => CommandEvent::ConfirmationIssued { command },
            Err(err) => CommandEvent::Rejected {
                command,
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        };
        CommandEventLogger::log_event(inv.author.0, inv.channel.0, raw_args, event);

        outcome
    }

    async fn run(&self, inv: &Invocation, name: &str, raw_args: &str) -> Result<CommandResponse, DispatchError> {
        let command = self
            .registry
            .find(name)
            .ok_or_else(|| DispatchError::UnknownCommand(name.to_lowercase()))?;
        let desc = command.descriptor.as_ref();
        Span::current().record("image", desc.produces_image);

        // Permission
        if !self.policy.permits(inv.author, inv.permission, desc.permission) {
            return Err(DispatchError::PermissionDenied {
                command: desc.name.clone(),
                required: desc.permission,
            });
        }

        // Cooldown
        let permit = self.reserve_cooldown(desc, inv.author)?;

        // Confirmation
        let mut tokens: Vec<Token<'_>> = scan(raw_args).collect();
        if let Some(warning) = &desc.confirmation {
            if self.redeem_confirmation(desc, inv, &tokens) {
                tokens.remove(0);
            } else {
                self.confirmations.begin(&desc.name, inv.author, inv.channel);
                return Err(DispatchError::ConfirmationRequired {
                    command: desc.name.clone(),
                    warning: warning.clone(),
                    hint: self.confirmation_hint(name, &tokens),
                });
            }
        }

        // Arguments
        let privileged = self.policy.is_privileged(inv.author, inv.permission);
        let resolve = ResolveContext {
            invoker: inv.author,
            privileged,
            entities: inv.entities.as_ref(),
            teams: self.teams.as_ref(),
            links: self.links.as_ref(),
            booleans: &self.booleans,
        };
        let matched = match_arguments(&desc.pattern, &tokens, &resolve)
            .await
            .map_err(|err| usage_error(err, desc, &self.settings.prefix))?;
        debug!(args = matched.args.len(), properties = matched.properties.values.len(), "arguments resolved");

        self.execute(command, inv, name, raw_args, matched, privileged, permit).await
    }

    fn reserve_cooldown(
        &self,
        desc: &CommandDescriptor,
        entity: EntityId,
    ) -> Result<Option<CooldownPermit>, DispatchError> {
        let Some(cooldown) = &desc.cooldown else {
            return Ok(None);
        };
        self.cooldowns
            .try_acquire(&desc.name, entity, cooldown.duration)
            .map(Some)
            .map_err(|rejection| match rejection {
                CooldownRejection::Waiting(remaining) => DispatchError::CooldownActive {
                    command: desc.name.clone(),
                    remaining,
                    message: cooldown.render(remaining),
                },
                CooldownRejection::InFlight => DispatchError::AlreadyRunning { command: desc.name.clone() },
            })
    }

    /// A pending record is consumed only when the token is present.
    fn redeem_confirmation(&self, desc: &CommandDescriptor, inv: &Invocation, tokens: &[Token<'_>]) -> bool {
        let has_token = tokens
            .first()
            .is_some_and(|t| t.as_str().eq_ignore_ascii_case(&self.settings.confirmation_token));
        has_token && self.confirmations.redeem(&desc.name, inv.author, inv.channel).is_some()
    }

    fn confirmation_hint(&self, invoked_as: &str, tokens: &[Token<'_>]) -> String {
        let token = &self.settings.confirmation_token;
        let mut hint = format!("{}{} {token}", self.settings.prefix, invoked_as.to_lowercase());
        let rest = tokens.iter().skip_while(|t| t.as_str().eq_ignore_ascii_case(token));
        for t in rest {
            hint.push(' ');
            if t.is_quoted() || t.as_str().contains(char::is_whitespace) {
                hint.push_str(&format!("\"{}\"", t.as_str()));
            } else {
                hint.push_str(t.as_str());
            }
        }
        hint
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute(
        &self,
        command: &RegisteredCommand,
        inv: &Invocation,
        invoked_as: &str,
        raw_args: &str,
        matched: crate::matcher::Matched,
        privileged: bool,
        permit: Option<CooldownPermit>,
    ) -> Result<CommandResponse, DispatchError> {
        let desc = command.descriptor.as_ref();
        let context = CommandContext {
            invoker: inv.author,
            scope: inv.scope,
            channel: inv.channel,
            permission: self.policy.effective_level(inv.author, inv.permission),
            privileged,
            prefix: self.settings.prefix.clone(),
            registry: self.registry.clone(),
            replies: self.replies.clone(),
            reply_timeout: self.settings.reply_timeout,
        };
        let invocation = CommandInvocation {
            name: desc.name.clone(),
            invoked_as: invoked_as.to_lowercase(),
            args: matched.args,
            properties: matched.properties,
            raw_args: raw_args.to_string(),
        };

        let outcome = command.handler.handle(&context, &invocation).await;
        // The handler body ran, so the use counts even if it failed.
        if let Some(permit) = permit {
            permit.commit();
        }
        let response = outcome?;
        info!(command = %desc.name, "command executed");
        Ok(response)
    }
}

fn usage_error(err: MatchError, desc: &CommandDescriptor, prefix: &str) -> DispatchError {
    let usage = desc.usage(prefix);
    match err {
        MatchError::Arity { min, max, got } => DispatchError::ArityMismatch { min, max, got, usage },
        MatchError::Type { slot, position, code, raw } => {
            DispatchError::TypeResolutionFailed { slot, position, code, raw, usage }
        }
    }
}
