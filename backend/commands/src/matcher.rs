//! Argument matcher: walks a [`CommandPattern`] against scanned tokens.
//!
//! Positional slots resolve strictly left to right and stop at the first
//! failure. Property pairs are best-effort and collect failures instead.

use thiserror::Error;
use tracing::trace;

use crate::pattern::{CommandPattern, PatternSpec, TypeCode};
use crate::properties::{invalid_message, PropertyInvalid, PropertySchema, PropertyUpdates};
use crate::resolve::ResolveContext;
use crate::scanner::Token;
use crate::types::{Arguments, ResolvedArgument};

const UNKNOWN_PROPERTY: &str = "Unknown property!";
const MISSING_VALUE: &str = "Missing value!";
const REQUIRED_PROPERTY: &str = "This property is required!";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("expected {} arguments, got {got}", arity_range(.min, .max))]
    Arity { min: usize, max: Option<usize>, got: usize },

    /// `slot` indexes the pattern, `position` the token list.
    #[error("argument {} (`{raw}`) is not a valid {}", .position + 1, .code.describe())]
    Type { slot: usize, position: usize, code: TypeCode, raw: String },
}

pub(crate) fn arity_range(min: &usize, max: &Option<usize>) -> String {
    match *max {
        Some(max) if max == *min => min.to_string(),
        Some(max) => format!("{min}-{max}"),
        None => format!("at least {min}"),
    }
}

/// Output of a successful match.
#[derive(Debug, Clone, Default)]
pub struct Matched {
    pub args: Arguments,
    pub properties: PropertyUpdates,
}

/// Match `tokens` against `pattern`. Arity is checked before anything is
/// resolved.
pub async fn match_arguments(
    pattern: &CommandPattern,
    tokens: &[Token<'_>],
    ctx: &ResolveContext<'_>,
) -> Result<Matched, MatchError> {
    let (min, max) = (pattern.min_args(), pattern.max_args());
    if tokens.len() < min || max.is_some_and(|max| tokens.len() > max) {
        return Err(MatchError::Arity { min, max, got: tokens.len() });
    }

    match pattern {
        CommandPattern::Positional(spec) => {
            let args = match_positional(spec, tokens, ctx).await?;
            Ok(Matched { args, properties: PropertyUpdates::default() })
        }
        CommandPattern::Properties { leading, schema } => {
            let split = leading.slots().len();
            let args = match_positional(leading, &tokens[..split], ctx).await?;
            let properties = match_properties(schema, &tokens[split..], ctx).await;
            Ok(Matched { args, properties })
        }
    }
}

async fn match_positional(
    spec: &PatternSpec,
    tokens: &[Token<'_>],
    ctx: &ResolveContext<'_>,
) -> Result<Arguments, MatchError> {
    let mut args = Arguments::default();

    for (slot, arg) in spec.slots().iter().enumerate() {
        if arg.variadic {
            for (position, token) in tokens.iter().enumerate().skip(slot) {
                args.push(Some(resolve_slot(slot, position, arg.code, token, ctx).await?));
            }
            break;
        }
        match tokens.get(slot) {
            Some(token) => args.push(Some(resolve_slot(slot, slot, arg.code, token, ctx).await?)),
            // Arity guarantees only optional slots run out of tokens.
            None => args.push(arg.default.clone().map(ResolvedArgument::defaulted)),
        }
    }

    Ok(args)
}

async fn resolve_slot(
    slot: usize,
    position: usize,
    code: TypeCode,
    token: &Token<'_>,
    ctx: &ResolveContext<'_>,
) -> Result<ResolvedArgument, MatchError> {
    let raw = token.as_str();
    match ctx.resolve(code, raw).await {
        Some(value) => Ok(ResolvedArgument::from_token(value, raw)),
        None => {
            trace!(slot, position, code = %code, "slot failed to resolve");
            Err(MatchError::Type { slot, position, code, raw: raw.to_string() })
        }
    }
}

async fn match_properties(
    schema: &PropertySchema,
    tokens: &[Token<'_>],
    ctx: &ResolveContext<'_>,
) -> PropertyUpdates {
    let mut updates = PropertyUpdates::default();

    for pair in tokens.chunks(2) {
        let name = pair[0].as_str();
        let Some(spec) = schema.lookup(name) else {
            updates.invalid.push(PropertyInvalid::new(name, UNKNOWN_PROPERTY));
            continue;
        };
        let canonical = spec.canonical.as_str();

        // Last mention wins.
        updates.values.shift_remove(canonical);
        updates.invalid.retain(|invalid| invalid.property != canonical);

        let Some(token) = pair.get(1) else {
            updates.invalid.push(PropertyInvalid::new(canonical, MISSING_VALUE));
            continue;
        };
        let raw = token.as_str();
        let outcome = match ctx.resolve(spec.code, raw).await {
            Some(value) => spec.validate(&value).map(|()| value),
            None => Err(invalid_message(spec.code).to_string()),
        };
        match outcome {
            Ok(value) => {
                updates.values.insert(canonical.to_string(), ResolvedArgument::from_token(value, raw));
            }
            Err(reason) => updates.invalid.push(PropertyInvalid::new(canonical, reason)),
        }
    }

    for spec in schema.required() {
        let mentioned = updates.values.contains_key(&spec.canonical)
            || updates.invalid.iter().any(|invalid| invalid.property == spec.canonical);
        if !mentioned {
            updates.invalid.push(PropertyInvalid::new(spec.canonical.clone(), REQUIRED_PROPERTY));
        }
    }

    updates
}
