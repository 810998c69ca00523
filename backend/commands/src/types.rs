//! Command metadata and resolved-argument types.

use std::time::Duration;

use argot_core::{EntityRef, PermissionLevel, TeamRef};
use chrono_humanize::{Accuracy, HumanTime, Tense};

use crate::pattern::{CommandPattern, PatternError};
use crate::properties::{PropertySchema, PropertyUpdates};

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A typed argument value produced by a resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Percentage(f64),
    /// Natural number, always ≥ 1.
    Count(u64),
    Text(String),
    Link(String),
    Entity(EntityRef),
    Team(TeamRef),
    Boolean(bool),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "number",
            Value::Percentage(_) => "percentage",
            Value::Count(_) => "count",
            Value::Text(_) => "text",
            Value::Link(_) => "link",
            Value::Entity(_) => "player",
            Value::Team(_) => "team",
            Value::Boolean(_) => "boolean",
        }
    }

    /// Numeric view of any numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) | Value::Percentage(v) => Some(*v),
            Value::Count(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Link(s) => Some(s),
            _ => None,
        }
    }
}

/// A resolved value together with the token it came from. `raw` is `None`
/// when the value is a declared default.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArgument {
    pub value: Value,
    pub raw: Option<String>,
}

impl ResolvedArgument {
    pub fn from_token(value: Value, raw: &str) -> Self {
        Self { value, raw: Some(raw.to_string()) }
    }

    pub fn defaulted(value: Value) -> Self {
        Self { value, raw: None }
    }
}

/// Ordered positional arguments. An optional slot that received no token and
/// has no declared default is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Option<ResolvedArgument>>,
}

impl Arguments {
    pub(crate) fn push(&mut self, arg: Option<ResolvedArgument>) {
        self.values.push(arg);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResolvedArgument> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.get(index).map(|arg| &arg.value)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<&Value>> {
        self.values.iter().map(|arg| arg.as_ref().map(|a| &a.value))
    }

    pub fn integer(&self, index: usize) -> Option<i64> {
        match self.value(index)? {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn count(&self, index: usize) -> Option<u64> {
        match self.value(index)? {
            Value::Count(v) => Some(*v),
            _ => None,
        }
    }

    pub fn number(&self, index: usize) -> Option<f64> {
        self.value(index)?.as_number()
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.value(index)?.as_text()
    }

    pub fn boolean(&self, index: usize) -> Option<bool> {
        match self.value(index)? {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn entity(&self, index: usize) -> Option<&EntityRef> {
        match self.value(index)? {
            Value::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn team(&self, index: usize) -> Option<&TeamRef> {
        match self.value(index)? {
            Value::Team(t) => Some(t),
            _ => None,
        }
    }

    /// Entities from `start` onwards, for variadic player slots.
    pub fn entities_from(&self, start: usize) -> impl Iterator<Item = &EntityRef> {
        self.values.iter().skip(start).filter_map(|arg| match arg.as_ref().map(|a| &a.value) {
            Some(Value::Entity(e)) => Some(e),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Command descriptor
// ---------------------------------------------------------------------------

/// Placeholder replaced by the active command prefix in help text.
pub const CMD_KEY: &str = "[CMD_KEY]";

/// Placeholder replaced by the remaining wait time in cooldown messages.
pub const COOLDOWN_PLACEHOLDER: &str = "[COOLDOWN]";

const DEFAULT_COOLDOWN_MESSAGE: &str = "You can use this command again in **[COOLDOWN]**!";

#[derive(Debug, Clone)]
pub struct Cooldown {
    pub duration: Duration,
    /// May contain [`COOLDOWN_PLACEHOLDER`].
    pub message: String,
}

impl Cooldown {
    pub fn render(&self, remaining: Duration) -> String {
        self.message.replace(COOLDOWN_PLACEHOLDER, &format_remaining(remaining))
    }
}

/// Whole seconds, rounded up, in words: `23 hours, 59 minutes and 58 seconds`.
pub fn format_remaining(remaining: Duration) -> String {
    let mut secs = remaining.as_secs();
    if remaining.subsec_nanos() > 0 || secs == 0 {
        secs += 1;
    }
    let delta = i64::try_from(secs)
        .ok()
        .and_then(chrono::TimeDelta::try_seconds)
        .unwrap_or(chrono::TimeDelta::MAX);
    HumanTime::from(delta).to_text_en(Accuracy::Precise, Tense::Present)
}

/// Immutable metadata registered once per handler.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub aliases: Vec<String>,
    /// Minimum level the invoker needs.
    pub permission: PermissionLevel,
    pub pattern: CommandPattern,
    pub cooldown: Option<Cooldown>,
    /// Warning shown before a confirmation-gated command runs.
    pub confirmation: Option<String>,
    pub produces_image: bool,
    pub hidden: bool,
    /// Long help; may contain [`CMD_KEY`].
    pub help: Option<String>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            aliases: Vec::new(),
            permission: PermissionLevel::Player,
            pattern: CommandPattern::default(),
            cooldown: None,
            confirmation: None,
            produces_image: false,
            hidden: false,
            help: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_lowercase());
        self
    }

    pub fn permission(mut self, level: PermissionLevel) -> Self {
        self.permission = level;
        self
    }

    /// Positional pattern from its compact form.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, PatternError> {
        self.pattern = CommandPattern::positional(pattern)?;
        Ok(self)
    }

    pub fn with_pattern(mut self, pattern: CommandPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Leading positional slots followed by property pairs.
    pub fn properties(mut self, leading: &str, schema: PropertySchema) -> Result<Self, PatternError> {
        self.pattern = CommandPattern::properties(leading, schema)?;
        Ok(self)
    }

    pub fn cooldown(mut self, duration: Duration, message: impl Into<String>) -> Self {
        self.cooldown = Some(Cooldown { duration, message: message.into() });
        self
    }

    pub fn cooldown_default(self, duration: Duration) -> Self {
        self.cooldown(duration, DEFAULT_COOLDOWN_MESSAGE)
    }

    pub fn confirm(mut self, warning: impl Into<String>) -> Self {
        self.confirmation = Some(warning.into());
        self
    }

    pub fn image(mut self) -> Self {
        self.produces_image = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// `!name (arg) [arg]`
    pub fn usage(&self, prefix: &str) -> String {
        let args = self.pattern.usage();
        if args.is_empty() {
            format!("{prefix}{}", self.name)
        } else {
            format!("{prefix}{} {args}", self.name)
        }
    }

    pub fn help_text(&self, prefix: &str) -> Option<String> {
        self.help.as_ref().map(|h| h.replace(CMD_KEY, prefix))
    }

    /// Name followed by aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// Parsed invocation
// ---------------------------------------------------------------------------

/// A gate-passing invocation with its arguments resolved.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    /// Canonical command name.
    pub name: String,
    /// Name or alias the user typed.
    pub invoked_as: String,
    pub args: Arguments,
    /// Property updates; empty unless the command uses the property grammar.
    pub properties: PropertyUpdates,
    /// Argument text as typed, confirmation token included.
    pub raw_args: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_builder_normalises_names() {
        let desc = CommandDescriptor::new("BlackJack").alias("BJ");
        assert_eq!(desc.name, "blackjack");
        assert_eq!(desc.names().collect::<Vec<_>>(), vec!["blackjack", "bj"]);
    }

    #[test]
    fn usage_lists_slots() {
        let desc = CommandDescriptor::new("sendquest").pattern("PCS?").unwrap();
        assert_eq!(desc.usage("!"), "!sendquest (player) (count) [text]");
        let bare = CommandDescriptor::new("daily");
        assert_eq!(bare.usage("!"), "!daily");
    }

    #[test]
    fn help_text_substitutes_prefix() {
        let desc = CommandDescriptor::new("daily").help("[CMD_KEY]daily gives money");
        assert_eq!(desc.help_text("$").unwrap(), "$daily gives money");
    }

    #[test]
    fn cooldown_message_includes_remaining_time() {
        let desc = CommandDescriptor::new("daily").cooldown(
            Duration::from_secs(86_400),
            "Come back in **[COOLDOWN]**!",
        );
        let text = desc.cooldown.unwrap().render(Duration::from_secs(90));
        assert!(text.starts_with("Come back in **"));
        assert!(text.contains("minute"));
        assert!(!text.contains(COOLDOWN_PLACEHOLDER));
    }

    #[test]
    fn remaining_time_rounds_up() {
        assert_eq!(
            format_remaining(Duration::from_millis(4_200)),
            format_remaining(Duration::from_secs(5))
        );
    }

    #[test]
    fn arguments_accessors() {
        let mut args = Arguments::default();
        args.push(Some(ResolvedArgument::from_token(Value::Integer(500), "500")));
        args.push(None);
        assert_eq!(args.integer(0), Some(500));
        assert_eq!(args.number(0), Some(500.0));
        assert!(args.get(1).is_none());
        assert_eq!(args.len(), 2);
    }
}
