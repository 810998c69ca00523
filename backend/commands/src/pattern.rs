//! Pattern grammar: the compact, declarative description of the arguments a
//! command expects.
//!
//! A positional pattern is a string of type codes, each optionally followed
//! by `?` (optional) or `*` (variadic, consumes every remaining token):
//!
//! | code | argument            |
//! |------|---------------------|
//! | `S`  | text                |
//! | `M`  | page number or name |
//! | `I`  | integer             |
//! | `C`  | count (≥ 1)         |
//! | `R`  | number              |
//! | `T`  | team                |
//! | `P`  | player              |
//! | `B`  | yes/no              |
//! | `%`  | percentage          |
//! | `L`  | image link          |
//!
//! Optional slots are trailing-only and the variadic slot, if any, is last.
//! Both rules are checked when the pattern is decoded, so a malformed pattern
//! fails at registration instead of at match time.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::properties::PropertySchema;
use crate::types::Value;

// ---------------------------------------------------------------------------
// Type codes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Text,
    PageOrText,
    Integer,
    Count,
    Float,
    Team,
    Entity,
    Boolean,
    Percentage,
    Link,
}

impl TypeCode {
    pub const ALL: [TypeCode; 10] = [
        TypeCode::Text,
        TypeCode::PageOrText,
        TypeCode::Integer,
        TypeCode::Count,
        TypeCode::Float,
        TypeCode::Team,
        TypeCode::Entity,
        TypeCode::Boolean,
        TypeCode::Percentage,
        TypeCode::Link,
    ];

    pub fn from_char(c: char) -> Option<Self> {
        TypeCode::ALL.into_iter().find(|code| code.as_char() == c)
    }

    pub fn as_char(self) -> char {
        match self {
            TypeCode::Text => 'S',
            TypeCode::PageOrText => 'M',
            TypeCode::Integer => 'I',
            TypeCode::Count => 'C',
            TypeCode::Float => 'R',
            TypeCode::Team => 'T',
            TypeCode::Entity => 'P',
            TypeCode::Boolean => 'B',
            TypeCode::Percentage => '%',
            TypeCode::Link => 'L',
        }
    }

    /// Short noun used in usage lines and error messages.
    pub fn describe(self) -> &'static str {
        match self {
            TypeCode::Text => "text",
            TypeCode::PageOrText => "page or name",
            TypeCode::Integer => "integer",
            TypeCode::Count => "count",
            TypeCode::Float => "number",
            TypeCode::Team => "team",
            TypeCode::Entity => "player",
            TypeCode::Boolean => "yes/no",
            TypeCode::Percentage => "percentage",
            TypeCode::Link => "image link",
        }
    }

    /// Whether `value` is something a resolver for this code could produce.
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (TypeCode::Text, Value::Text(_))
                | (TypeCode::PageOrText, Value::Count(_) | Value::Text(_))
                | (TypeCode::Integer, Value::Integer(_))
                | (TypeCode::Count, Value::Count(_))
                | (TypeCode::Float, Value::Float(_))
                | (TypeCode::Team, Value::Team(_))
                | (TypeCode::Entity, Value::Entity(_))
                | (TypeCode::Boolean, Value::Boolean(_))
                | (TypeCode::Percentage, Value::Percentage(_))
                | (TypeCode::Link, Value::Link(_))
        )
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("unknown type code `{code}` at position {position}")]
    UnknownTypeCode { code: char, position: usize },

    #[error("modifier `{modifier}` at position {position} does not follow a type code")]
    DanglingModifier { modifier: char, position: usize },

    #[error("variadic slot {slot} must be the last slot")]
    VariadicNotTerminal { slot: usize },

    #[error("mandatory slot {slot} follows an optional slot")]
    MandatoryAfterOptional { slot: usize },

    #[error("slot {slot} does not exist")]
    NoSuchSlot { slot: usize },

    #[error("slot {slot} is mandatory and cannot carry a default")]
    DefaultOnMandatory { slot: usize },

    #[error("default for slot {slot} is not a valid {expected}")]
    DefaultTypeMismatch { slot: usize, expected: &'static str },

    #[error("leading slots of a property pattern must be mandatory and non-variadic")]
    UnsupportedPropertyLead,

    #[error("property type `{0}` must be a single type code")]
    InvalidPropertyType(String),

    #[error("property name must not be empty")]
    EmptyPropertyName,

    #[error("property name `{0}` is declared twice")]
    DuplicateProperty(String),

    #[error("unknown property `{0}`")]
    UnknownProperty(String),
}

// ---------------------------------------------------------------------------
// Slots & positional patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentSlot {
    pub code: TypeCode,
    pub optional: bool,
    pub variadic: bool,
    /// Substituted when an optional slot receives no token.
    pub default: Option<Value>,
}

impl ArgumentSlot {
    fn new(code: TypeCode) -> Self {
        Self { code, optional: false, variadic: false, default: None }
    }
}

/// A decoded positional pattern.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternSpec {
    slots: Vec<ArgumentSlot>,
}

impl PatternSpec {
    /// The pattern of a command that takes no arguments.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut slots: Vec<ArgumentSlot> = Vec::new();

        for (position, c) in pattern.chars().enumerate() {
            match c {
                '?' | '*' => {
                    let last = match slots.last_mut() {
                        Some(slot) if !slot.optional && !slot.variadic => slot,
                        _ => return Err(PatternError::DanglingModifier { modifier: c, position }),
                    };
                    if c == '?' {
                        last.optional = true;
                    } else {
                        last.variadic = true;
                    }
                }
                _ => {
                    let code = TypeCode::from_char(c)
                        .ok_or(PatternError::UnknownTypeCode { code: c, position })?;
                    slots.push(ArgumentSlot::new(code));
                }
            }
        }

        let spec = Self { slots };
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<(), PatternError> {
        let mut seen_optional = false;
        for (slot, arg) in self.slots.iter().enumerate() {
            if arg.variadic && slot + 1 != self.slots.len() {
                return Err(PatternError::VariadicNotTerminal { slot });
            }
            if arg.optional {
                seen_optional = true;
            } else if seen_optional {
                return Err(PatternError::MandatoryAfterOptional { slot });
            }
        }
        Ok(())
    }

    /// Declare the value an optional slot takes when no token is supplied.
    pub fn with_default(mut self, slot: usize, value: Value) -> Result<Self, PatternError> {
        let arg = self.slots.get_mut(slot).ok_or(PatternError::NoSuchSlot { slot })?;
        if !arg.optional {
            return Err(PatternError::DefaultOnMandatory { slot });
        }
        if !arg.code.accepts(&value) {
            return Err(PatternError::DefaultTypeMismatch { slot, expected: arg.code.describe() });
        }
        arg.default = Some(value);
        Ok(self)
    }

    pub fn slots(&self) -> &[ArgumentSlot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_variadic(&self) -> bool {
        self.slots.last().is_some_and(|slot| slot.variadic)
    }

    /// Fewest tokens that satisfy the pattern. A variadic slot needs at least one.
    pub fn min_args(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.optional).count()
    }

    /// Most tokens the pattern accepts, `None` when the last slot is variadic.
    pub fn max_args(&self) -> Option<usize> {
        if self.is_variadic() {
            None
        } else {
            Some(self.slots.len())
        }
    }

    /// Compact form of the pattern, e.g. `SRRRRS?S?L?%?`.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Human usage fragment: `(text) (number) [link] (player)...`.
    pub fn usage(&self) -> String {
        self.slots
            .iter()
            .map(|slot| {
                let noun = slot.code.describe();
                if slot.optional {
                    format!("[{noun}]")
                } else if slot.variadic {
                    format!("({noun})...")
                } else {
                    format!("({noun})")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for PatternSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.slots {
            write!(f, "{}", slot.code)?;
            if slot.optional {
                f.write_str("?")?;
            } else if slot.variadic {
                f.write_str("*")?;
            }
        }
        Ok(())
    }
}

impl FromStr for PatternSpec {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatternSpec::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Command patterns
// ---------------------------------------------------------------------------

/// What a command expects after its name.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Ordered slots.
    Positional(PatternSpec),
    /// Some mandatory leading slots, then `name value` pairs for a fixed set
    /// of properties ("set many fields at once").
    Properties { leading: PatternSpec, schema: PropertySchema },
}

impl CommandPattern {
    pub fn positional(pattern: &str) -> Result<Self, PatternError> {
        PatternSpec::parse(pattern).map(CommandPattern::Positional)
    }

    pub fn properties(leading: &str, schema: PropertySchema) -> Result<Self, PatternError> {
        let leading = PatternSpec::parse(leading)?;
        if leading.slots().iter().any(|slot| slot.optional || slot.variadic) {
            return Err(PatternError::UnsupportedPropertyLead);
        }
        Ok(CommandPattern::Properties { leading, schema })
    }

    pub fn min_args(&self) -> usize {
        match self {
            CommandPattern::Positional(spec) => spec.min_args(),
            // At least one property name after the leading slots.
            CommandPattern::Properties { leading, .. } => leading.min_args() + 1,
        }
    }

    pub fn max_args(&self) -> Option<usize> {
        match self {
            CommandPattern::Positional(spec) => spec.max_args(),
            CommandPattern::Properties { .. } => None,
        }
    }

    pub fn usage(&self) -> String {
        match self {
            CommandPattern::Positional(spec) => spec.usage(),
            CommandPattern::Properties { leading, .. } if leading.is_empty() => {
                "(property value)+".to_string()
            }
            CommandPattern::Properties { leading, .. } => {
                format!("{} (property value)+", leading.usage())
            }
        }
    }
}

impl Default for CommandPattern {
    fn default() -> Self {
        CommandPattern::Positional(PatternSpec::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_quest_pattern() {
        let spec = PatternSpec::parse("SRRRRS?S?L?%?").unwrap();
        assert_eq!(spec.slots().len(), 9);
        assert_eq!(spec.min_args(), 5);
        assert_eq!(spec.max_args(), Some(9));
        assert!(spec.slots()[5].optional);
        assert_eq!(spec.slots()[7].code, TypeCode::Link);
        assert_eq!(spec.slots()[8].code, TypeCode::Percentage);
    }

    #[test]
    fn decodes_variadic_tail() {
        let spec = PatternSpec::parse("IP*").unwrap();
        assert!(spec.is_variadic());
        assert_eq!(spec.min_args(), 2);
        assert_eq!(spec.max_args(), None);
    }

    #[test]
    fn encode_round_trips() {
        for pattern in ["", "S", "SRRRRS?S?L?%?", "IP*", "PCS?", "CC?B?", "M?", "SS*", "T%LBM"] {
            let spec: PatternSpec = pattern.parse().unwrap();
            assert_eq!(spec.encode(), pattern);
        }
    }

    #[test]
    fn rejects_unknown_code() {
        assert_eq!(
            PatternSpec::parse("SX"),
            Err(PatternError::UnknownTypeCode { code: 'X', position: 1 })
        );
        assert!(PatternSpec::parse("s").is_err());
    }

    #[test]
    fn rejects_dangling_modifiers() {
        assert!(matches!(
            PatternSpec::parse("?S"),
            Err(PatternError::DanglingModifier { modifier: '?', position: 0 })
        ));
        assert!(matches!(
            PatternSpec::parse("S?*"),
            Err(PatternError::DanglingModifier { modifier: '*', .. })
        ));
        assert!(matches!(
            PatternSpec::parse("S*?"),
            Err(PatternError::DanglingModifier { modifier: '?', .. })
        ));
    }

    #[test]
    fn variadic_must_be_terminal() {
        assert_eq!(
            PatternSpec::parse("P*I"),
            Err(PatternError::VariadicNotTerminal { slot: 0 })
        );
    }

    #[test]
    fn optional_slots_are_trailing_only() {
        assert_eq!(
            PatternSpec::parse("S?I"),
            Err(PatternError::MandatoryAfterOptional { slot: 1 })
        );
        assert_eq!(
            PatternSpec::parse("S?P*"),
            Err(PatternError::MandatoryAfterOptional { slot: 1 })
        );
    }

    #[test]
    fn defaults_only_on_optional_slots() {
        let spec = PatternSpec::parse("S%?").unwrap();
        assert!(spec.clone().with_default(1, Value::Percentage(25.0)).is_ok());
        assert_eq!(
            spec.clone().with_default(0, Value::Text("x".into())),
            Err(PatternError::DefaultOnMandatory { slot: 0 })
        );
        assert_eq!(
            spec.clone().with_default(1, Value::Boolean(true)),
            Err(PatternError::DefaultTypeMismatch { slot: 1, expected: "percentage" })
        );
        assert_eq!(
            spec.with_default(7, Value::Percentage(1.0)),
            Err(PatternError::NoSuchSlot { slot: 7 })
        );
    }

    #[test]
    fn renders_usage() {
        let spec = PatternSpec::parse("IP*").unwrap();
        assert_eq!(spec.usage(), "(integer) (player)...");
        let spec = PatternSpec::parse("PC?").unwrap();
        assert_eq!(spec.usage(), "(player) [count]");
    }

    #[test]
    fn property_patterns_need_plain_leading_slots() {
        let schema = PropertySchema::default();
        let pattern = CommandPattern::properties("S", schema.clone()).unwrap();
        assert_eq!(pattern.min_args(), 2);
        assert_eq!(pattern.max_args(), None);
        assert_eq!(pattern.usage(), "(text) (property value)+");
        assert_eq!(
            CommandPattern::properties("S?", schema).unwrap_err(),
            PatternError::UnsupportedPropertyLead
        );
    }

    #[test]
    fn type_codes_round_trip_through_chars() {
        for code in TypeCode::ALL {
            assert_eq!(TypeCode::from_char(code.as_char()), Some(code));
        }
    }
}
