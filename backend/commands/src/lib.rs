//! Command argument resolution and dispatch.
//!
//! Text after a command name is scanned into tokens, matched against the
//! command's declared pattern, and resolved into typed values. Before any of
//! that, the dispatcher runs the permission, cooldown and confirmation gates.

pub mod confirmation;
pub mod conversation;
pub mod cooldown;
pub mod detection;
pub mod dispatch;
pub mod handlers;
pub mod matcher;
pub mod pattern;
pub mod properties;
pub mod registry;
pub mod resolve;
pub mod scanner;
pub mod types;

pub use confirmation::{ConfirmationStore, PendingConfirmation};
pub use conversation::ReplyWaiter;
pub use cooldown::{CooldownPermit, CooldownRejection, CooldownStore};
pub use detection::{detect_command, DetectedCommand};
pub use dispatch::{
    CommandContext, CommandDispatcher, CommandHandler, CommandResponse, DispatchError, DispatcherParts,
    GateSettings, Invocation, MessageOutcome,
};
pub use handlers::{register_builtins, HelpHandler};
pub use matcher::{match_arguments, MatchError, Matched};
pub use pattern::{ArgumentSlot, CommandPattern, PatternError, PatternSpec, TypeCode};
pub use properties::{PropertyInvalid, PropertyRule, PropertySchema, PropertySpec, PropertyUpdates};
pub use registry::{CommandRegistry, RegisteredCommand, RegistryError};
pub use resolve::{BooleanPolicy, ResolveContext, MAX_NUMBER, MIN_NUMBER};
pub use scanner::{scan, Scanner, Token};
pub use types::{
    format_remaining, Arguments, CommandDescriptor, CommandInvocation, Cooldown, ResolvedArgument, Value,
    CMD_KEY, COOLDOWN_PLACEHOLDER,
};
