//! Named-property grammar for "set many fields at once" commands.
//!
//! A schema maps `"primary/alias1/alias2"` to a single type code and splits
//! the properties into a required and an optional set. Input is a sequence
//! of `name value` pairs in any order. Resolution is best-effort: each
//! failing property is reported as a [`PropertyInvalid`] next to the ones
//! that resolved, and nothing aborts the match.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::pattern::{PatternError, TypeCode};
use crate::types::{ResolvedArgument, Value};

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

type Check = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A post-resolution validation attached to one property.
#[derive(Clone)]
pub struct PropertyRule {
    check: Check,
    message: String,
}

impl PropertyRule {
    /// Numeric value must be `>= min`.
    pub fn at_least(min: f64) -> Self {
        Self {
            check: Arc::new(move |v| v.as_number().is_some_and(|n| n >= min)),
            message: format!("Must be at least {min}!"),
        }
    }

    /// Numeric value must lie in `min..=max`.
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            check: Arc::new(move |v| v.as_number().is_some_and(|n| (min..=max).contains(&n))),
            message: format!("Must be {min}-{max}!"),
        }
    }

    pub fn custom<F>(check: F, message: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self { check: Arc::new(check), message: message.into() }
    }

    /// Replace the failure message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn apply(&self, value: &Value) -> Result<(), String> {
        if (self.check)(value) {
            Ok(())
        } else {
            Err(self.message.clone())
        }
    }
}

impl fmt::Debug for PropertyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRule").field("message", &self.message).finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PropertySpec {
    pub canonical: String,
    pub aliases: Vec<String>,
    pub code: TypeCode,
    pub required: bool,
    pub rules: Vec<PropertyRule>,
}

impl PropertySpec {
    fn parse(key: &str, code: &str, required: bool) -> Result<Self, PatternError> {
        let mut names = key.split('/').map(|n| n.trim().to_lowercase());
        let canonical = names.next().filter(|n| !n.is_empty()).ok_or(PatternError::EmptyPropertyName)?;
        let aliases: Vec<String> = names.collect();
        if aliases.iter().any(String::is_empty) {
            return Err(PatternError::EmptyPropertyName);
        }

        let mut chars = code.chars();
        let code = match (chars.next().and_then(TypeCode::from_char), chars.next()) {
            (Some(code), None) => code,
            _ => return Err(PatternError::InvalidPropertyType(code.to_string())),
        };

        Ok(Self { canonical, aliases, code, required, rules: Vec::new() })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Compact form, `attack/atk:R`.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.names().collect::<Vec<_>>().join("/"), self.code)
    }

    pub(crate) fn validate(&self, value: &Value) -> Result<(), String> {
        self.rules.iter().try_for_each(|rule| rule.apply(value))
    }
}

/// Recognised properties of a property-style command.
#[derive(Debug, Clone, Default)]
pub struct PropertySchema {
    specs: Vec<PropertySpec>,
}

impl PropertySchema {
    /// Build from `(names, type code)` pairs, e.g. `("attack/atk", "R")`.
    pub fn new(required: &[(&str, &str)], optional: &[(&str, &str)]) -> Result<Self, PatternError> {
        let mut schema = Self::default();
        let declared = required
            .iter()
            .map(|entry| (entry, true))
            .chain(optional.iter().map(|entry| (entry, false)));
        for ((key, code), is_required) in declared {
            let spec = PropertySpec::parse(key, code, is_required)?;
            if let Some(clash) = spec.names().find(|name| schema.lookup(name).is_some()) {
                return Err(PatternError::DuplicateProperty(clash.to_string()));
            }
            schema.specs.push(spec);
        }
        Ok(schema)
    }

    /// Attach a validation rule to a property, addressed by any of its names.
    pub fn with_rule(mut self, name: &str, rule: PropertyRule) -> Result<Self, PatternError> {
        let lower = name.to_lowercase();
        let spec = self
            .specs
            .iter_mut()
            .find(|spec| spec.names().any(|n| n == lower))
            .ok_or_else(|| PatternError::UnknownProperty(name.to_string()))?;
        spec.rules.push(rule);
        Ok(self)
    }

    /// Case-insensitive lookup by canonical name or alias.
    pub fn lookup(&self, name: &str) -> Option<&PropertySpec> {
        let lower = name.to_lowercase();
        self.specs.iter().find(|spec| spec.names().any(|n| n == lower))
    }

    pub fn specs(&self) -> &[PropertySpec] {
        &self.specs
    }

    pub fn required(&self) -> impl Iterator<Item = &PropertySpec> {
        self.specs.iter().filter(|spec| spec.required)
    }

    pub fn optional(&self) -> impl Iterator<Item = &PropertySpec> {
        self.specs.iter().filter(|spec| !spec.required)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A property that could not be applied, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInvalid {
    pub property: String,
    pub reason: String,
}

impl PropertyInvalid {
    pub fn new(property: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { property: property.into(), reason: reason.into() }
    }
}

impl fmt::Display for PropertyInvalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.property, self.reason)
    }
}

/// Resolved properties keyed by canonical name, in the order supplied, plus
/// everything that failed. A property named twice keeps only its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyUpdates {
    pub values: IndexMap<String, ResolvedArgument>,
    pub invalid: Vec<PropertyInvalid>,
}

impl PropertyUpdates {
    pub fn get(&self, canonical: &str) -> Option<&Value> {
        self.values.get(canonical).map(|arg| &arg.value)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.invalid.is_empty()
    }

    /// Move an already-resolved property to the invalid list, for checks only
    /// the handler can make (e.g. "weapon not found").
    pub fn reject(&mut self, canonical: &str, reason: impl Into<String>) {
        if self.values.shift_remove(canonical).is_some() {
            self.invalid.push(PropertyInvalid::new(canonical, reason));
        }
    }

    /// One line per property: `hp → 43` or `hp → Must be at least 30!`.
    pub fn report(&self) -> Vec<String> {
        let applied = self.values.iter().map(|(name, arg)| {
            let shown = arg.raw.clone().unwrap_or_else(|| format!("{:?}", arg.value));
            format!("{name} → {shown}")
        });
        applied.chain(self.invalid.iter().map(ToString::to_string)).collect()
    }
}

/// Failure message for a token that does not resolve as `code`.
pub(crate) fn invalid_message(code: TypeCode) -> &'static str {
    match code {
        TypeCode::Integer => "Must be a whole number!",
        TypeCode::Float => "Must be a number!",
        TypeCode::Percentage => "Must be a percentage!",
        TypeCode::Count => "Must be a whole number of at least 1!",
        TypeCode::Text | TypeCode::PageOrText => "Must not be empty!",
        TypeCode::Link => "Must be a link to an image!",
        TypeCode::Entity => "Player not found!",
        TypeCode::Team => "Team not found!",
        TypeCode::Boolean => "Must be yes or no!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quest_schema() -> PropertySchema {
        PropertySchema::new(
            &[],
            &[("attack/atk", "R"), ("strg/strength", "R"), ("hp", "R"), ("spawn", "%")],
        )
        .unwrap()
    }

    #[test]
    fn lookup_tolerates_aliases_and_case() {
        let schema = quest_schema();
        assert_eq!(schema.lookup("ATK").unwrap().canonical, "attack");
        assert_eq!(schema.lookup("strength").unwrap().canonical, "strg");
        assert!(schema.lookup("mana").is_none());
    }

    #[test]
    fn partitions_required_and_optional() {
        let schema = PropertySchema::new(&[("name", "S")], &[("hp", "R")]).unwrap();
        assert_eq!(schema.required().map(|s| s.canonical.as_str()).collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(schema.optional().map(|s| s.canonical.as_str()).collect::<Vec<_>>(), vec!["hp"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = PropertySchema::new(&[], &[("attack/atk", "R"), ("atk", "I")]).unwrap_err();
        assert_eq!(err, PatternError::DuplicateProperty("atk".into()));
    }

    #[test]
    fn rejects_bad_type_strings() {
        assert!(PropertySchema::new(&[], &[("hp", "RR")]).is_err());
        assert!(PropertySchema::new(&[], &[("hp", "R?")]).is_err());
        assert!(PropertySchema::new(&[], &[("hp", "")]).is_err());
        assert!(PropertySchema::new(&[], &[("/hp", "R")]).is_err());
    }

    #[test]
    fn encodes_names_in_declared_order() {
        let schema = quest_schema();
        let encoded: Vec<_> = schema.specs().iter().map(PropertySpec::encode).collect();
        assert_eq!(encoded[0], "attack/atk:R");
        assert_eq!(encoded[3], "spawn:%");
    }

    #[test]
    fn rules_report_their_message() {
        let rule = PropertyRule::at_least(30.0);
        assert_eq!(rule.apply(&Value::Float(-1.0)), Err("Must be at least 30!".into()));
        assert!(rule.apply(&Value::Float(43.0)).is_ok());

        let spawn = PropertyRule::between(1.0, 25.0).message("Must be 1-25%!");
        assert_eq!(spawn.apply(&Value::Percentage(30.0)), Err("Must be 1-25%!".into()));
    }

    #[test]
    fn with_rule_needs_known_property() {
        assert!(quest_schema().with_rule("atk", PropertyRule::at_least(1.0)).is_ok());
        assert_eq!(
            quest_schema().with_rule("mana", PropertyRule::at_least(1.0)).unwrap_err(),
            PatternError::UnknownProperty("mana".into())
        );
    }

    #[test]
    fn reject_moves_value_to_invalid() {
        let mut updates = PropertyUpdates::default();
        updates
            .values
            .insert("weapon".into(), ResolvedArgument::from_token(Value::Text("Stick".into()), "Stick"));
        updates.reject("weapon", "Weapon not found!");
        assert!(updates.values.is_empty());
        assert_eq!(updates.invalid, vec![PropertyInvalid::new("weapon", "Weapon not found!")]);
    }
}
