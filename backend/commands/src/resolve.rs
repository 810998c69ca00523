//! Value resolvers: one conversion per type code, from a raw token to a typed
//! [`Value`].
//!
//! Numeric, text and boolean resolvers are pure functions and are exposed as
//! such. Entity, team and link resolution go through the capabilities carried
//! by [`ResolveContext`].

use std::collections::HashSet;
use std::num::IntErrorKind;
use std::sync::LazyLock;

use argot_core::{EntityDirectory, EntityId, LinkProbe, TeamDirectory};
use regex::Regex;
use tracing::debug;

use crate::pattern::TypeCode;
use crate::types::Value;

/// Largest magnitude any numeric resolver returns.
pub const MAX_NUMBER: i64 = i64::MAX;
pub const MIN_NUMBER: i64 = -MAX_NUMBER;

/// A comma (or a run of commas) followed by three digits. Runs are tolerated
/// so `1,,,000` still reads as `1000`.
static THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",+(\d{3})").expect("thousands separator regex"));

/// Zero-width characters and the byte-order mark.
static INVISIBLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{200B}-\u{200D}\u{2060}\u{FEFF}]").expect("invisible char regex"));

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Split an informal `k` / `m` suffix off a number.
fn split_suffix(raw: &str) -> (&str, i64) {
    if let Some(stem) = raw.strip_suffix('k') {
        (stem, 1_000)
    } else if let Some(stem) = raw.strip_suffix('m') {
        (stem, 1_000_000)
    } else {
        (raw, 1)
    }
}

fn strip_separators(raw: &str) -> String {
    THOUSANDS.replace_all(raw, "${1}").into_owned()
}

fn clamp_float(value: f64) -> f64 {
    value.clamp(MIN_NUMBER as f64, MAX_NUMBER as f64)
}

/// Signed integer with grouping commas and `k`/`m` suffixes, clamped to
/// `MIN_NUMBER..=MAX_NUMBER`.
pub fn resolve_integer(raw: &str) -> Option<i64> {
    let (stem, multiplier) = split_suffix(raw.trim());
    let digits = strip_separators(stem);
    let base = match digits.parse::<i64>() {
        Ok(v) => v,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => MAX_NUMBER,
            IntErrorKind::NegOverflow => MIN_NUMBER,
            _ => return None,
        },
    };
    let scaled = base.checked_mul(multiplier).unwrap_or(if base < 0 { MIN_NUMBER } else { MAX_NUMBER });
    Some(scaled.max(MIN_NUMBER))
}

/// Float with the same separator and suffix handling as [`resolve_integer`].
pub fn resolve_float(raw: &str) -> Option<f64> {
    let (stem, multiplier) = split_suffix(raw.trim());
    let value = strip_separators(stem).parse::<f64>().ok()?;
    if value.is_nan() {
        return None;
    }
    Some(clamp_float(value * multiplier as f64))
}

/// A float with an optional trailing `%`.
pub fn resolve_percentage(raw: &str) -> Option<f64> {
    resolve_float(raw.trim().trim_end_matches('%'))
}

/// A natural number, one or more.
pub fn resolve_count(raw: &str) -> Option<u64> {
    resolve_integer(raw).filter(|v| *v >= 1).and_then(|v| u64::try_from(v).ok())
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

/// Remove invisible characters and collapse whitespace. Empty after cleaning
/// is invalid.
pub fn resolve_text(raw: &str) -> Option<String> {
    let visible = INVISIBLE.replace_all(raw, "");
    let cleaned = visible.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Page number when the token is a count, cleaned text otherwise.
pub fn resolve_page_or_text(raw: &str) -> Option<Value> {
    match resolve_count(raw) {
        Some(page) => Some(Value::Count(page)),
        None => resolve_text(raw).map(Value::Text),
    }
}

// ---------------------------------------------------------------------------
// Booleans
// ---------------------------------------------------------------------------

/// Accepted yes/no words. In lenient mode anything not truthy is `false`; in
/// strict mode it must be one of the falsy words.
#[derive(Debug, Clone)]
pub struct BooleanPolicy {
    truthy: HashSet<String>,
    falsy: HashSet<String>,
    strict: bool,
}

impl BooleanPolicy {
    pub fn new<T, F>(truthy: T, falsy: F, strict: bool) -> Self
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        Self {
            truthy: truthy.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            falsy: falsy.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
            strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn resolve(&self, raw: &str) -> Option<bool> {
        let word = raw.trim().to_lowercase();
        if self.truthy.contains(&word) {
            Some(true)
        } else if !self.strict || self.falsy.contains(&word) {
            Some(false)
        } else {
            None
        }
    }
}

impl Default for BooleanPolicy {
    fn default() -> Self {
        Self::new(
            ["yes", "y", "true", "t", "on", "1"],
            ["no", "n", "false", "f", "off", "0"],
            false,
        )
    }
}

// ---------------------------------------------------------------------------
// Entities & links
// ---------------------------------------------------------------------------

/// `42`, `<@42>` or `<@!42>`.
pub fn parse_entity_id(raw: &str) -> Option<EntityId> {
    let raw = raw.trim();
    let id = match raw.strip_prefix("<@").and_then(|r| r.strip_suffix('>')) {
        Some(mention) => mention.strip_prefix('!').unwrap_or(mention),
        None => raw,
    };
    id.parse::<u64>().ok().map(EntityId)
}

fn strip_angle_brackets(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')).unwrap_or(raw)
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a resolver may consult for one invocation.
pub struct ResolveContext<'a> {
    pub invoker: EntityId,
    /// Waives the "active" requirement on entity references.
    pub privileged: bool,
    pub entities: &'a dyn EntityDirectory,
    pub teams: &'a dyn TeamDirectory,
    pub links: &'a dyn LinkProbe,
    pub booleans: &'a BooleanPolicy,
}

impl ResolveContext<'_> {
    /// Resolve `raw` as `code`. `None` means the token is not a valid value
    /// of that type.
    pub async fn resolve(&self, code: TypeCode, raw: &str) -> Option<Value> {
        match code {
            TypeCode::Text => resolve_text(raw).map(Value::Text),
            TypeCode::PageOrText => resolve_page_or_text(raw),
            TypeCode::Integer => resolve_integer(raw).map(Value::Integer),
            TypeCode::Count => resolve_count(raw).map(Value::Count),
            TypeCode::Float => resolve_float(raw).map(Value::Float),
            TypeCode::Percentage => resolve_percentage(raw).map(Value::Percentage),
            TypeCode::Boolean => self.booleans.resolve(raw).map(Value::Boolean),
            TypeCode::Team => self.teams.find_team(&raw.trim().to_lowercase()).map(Value::Team),
            TypeCode::Entity => self.resolve_entity(raw).await,
            TypeCode::Link => self.resolve_link(raw).await,
        }
    }

    async fn resolve_entity(&self, raw: &str) -> Option<Value> {
        let id = parse_entity_id(raw)?;
        let entity = self.entities.find_entity(id, self.invoker).await?;
        if !entity.active && !self.privileged {
            debug!(entity = %id, invoker = %self.invoker, "entity not visible to invoker");
            return None;
        }
        Some(Value::Entity(entity))
    }

    async fn resolve_link(&self, raw: &str) -> Option<Value> {
        let url = strip_angle_brackets(raw);
        if self.links.is_image(url).await {
            Some(Value::Link(url.to_string()))
        } else {
            debug!(url, "link did not resolve to an image");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argot_core::testing::{FixedLinkProbe, MemoryEntities, MemoryTeams};

    struct Fixture {
        entities: MemoryEntities,
        teams: MemoryTeams,
        links: FixedLinkProbe,
        booleans: BooleanPolicy,
    }

    impl Fixture {
        fn new() -> Self {
            let entities = MemoryEntities::new();
            entities.insert(42, "Alice").insert_inactive(43, "Bob");
            Self {
                entities,
                teams: MemoryTeams::new().with_team("t1", "Red Bananas"),
                links: FixedLinkProbe::new(["https://img.example/cat.png"]),
                booleans: BooleanPolicy::default(),
            }
        }

        fn ctx(&self, privileged: bool) -> ResolveContext<'_> {
            ResolveContext {
                invoker: EntityId(1),
                privileged,
                entities: &self.entities,
                teams: &self.teams,
                links: &self.links,
                booleans: &self.booleans,
            }
        }
    }

    #[test]
    fn integers_accept_separators_and_suffixes() {
        assert_eq!(resolve_integer("1,000"), Some(1000));
        assert_eq!(resolve_integer("1,000,000"), Some(1_000_000));
        assert_eq!(resolve_integer("1,,,000"), Some(1000));
        assert_eq!(resolve_integer("2k"), Some(2000));
        assert_eq!(resolve_integer("3m"), Some(3_000_000));
        assert_eq!(resolve_integer("-7"), Some(-7));
        assert_eq!(resolve_integer("1.5"), None);
        assert_eq!(resolve_integer("ten"), None);
        assert_eq!(resolve_integer(""), None);
    }

    #[test]
    fn integers_clamp_to_symmetric_range() {
        assert_eq!(resolve_integer("99999999999999999999"), Some(MAX_NUMBER));
        assert_eq!(resolve_integer("-99999999999999999999"), Some(MIN_NUMBER));
        assert_eq!(resolve_integer("-9223372036854775808"), Some(MIN_NUMBER));
        assert_eq!(resolve_integer("9223372036854775807k"), Some(MAX_NUMBER));
    }

    #[test]
    fn integer_resolution_is_idempotent() {
        for v in [0, 1, -1, 500, MAX_NUMBER, MIN_NUMBER] {
            let once = resolve_integer(&v.to_string()).unwrap();
            assert_eq!(once, v);
            assert_eq!(resolve_integer(&once.to_string()), Some(once));
        }
    }

    #[test]
    fn floats_follow_integer_rules() {
        assert_eq!(resolve_float("1.3"), Some(1.3));
        assert_eq!(resolve_float("1,000.5"), Some(1000.5));
        assert_eq!(resolve_float("1.5k"), Some(1500.0));
        assert_eq!(resolve_float("1e30"), Some(MAX_NUMBER as f64));
        assert_eq!(resolve_float("NaN"), None);
        assert_eq!(resolve_float("abc"), None);
        let once = resolve_float("4.2").unwrap();
        assert_eq!(resolve_float(&once.to_string()), Some(once));
    }

    #[test]
    fn percentages_drop_the_sign() {
        assert_eq!(resolve_percentage("25%"), Some(25.0));
        assert_eq!(resolve_percentage("12.5"), Some(12.5));
        assert_eq!(resolve_percentage("%"), None);
    }

    #[test]
    fn counts_are_natural_numbers() {
        assert_eq!(resolve_count("0"), None);
        assert_eq!(resolve_count("-3"), None);
        assert_eq!(resolve_count("1"), Some(1));
        assert_eq!(resolve_count("1,000"), Some(1000));
        assert_eq!(resolve_count("2k"), Some(2000));
    }

    #[test]
    fn text_cleaning() {
        assert_eq!(resolve_text("  Mega \t Mouse\n"), Some("Mega Mouse".into()));
        assert_eq!(resolve_text("a\u{200B}b\u{FEFF}"), Some("ab".into()));
        assert_eq!(resolve_text("\u{200B}  \u{200C}"), None);
        assert_eq!(resolve_text(""), None);
    }

    #[test]
    fn text_cleaning_is_a_fixed_point() {
        for raw in ["  Mega   Mouse ", "x\u{200D}y  z", "plain"] {
            let once = resolve_text(raw).unwrap();
            assert_eq!(resolve_text(&once), Some(once.clone()));
        }
    }

    #[test]
    fn page_or_text_prefers_counts() {
        assert_eq!(resolve_page_or_text("3"), Some(Value::Count(3)));
        assert_eq!(resolve_page_or_text("0"), Some(Value::Text("0".into())));
        assert_eq!(resolve_page_or_text("Stick"), Some(Value::Text("Stick".into())));
    }

    #[test]
    fn lenient_booleans() {
        let policy = BooleanPolicy::default();
        assert_eq!(policy.resolve("YES"), Some(true));
        assert_eq!(policy.resolve("on"), Some(true));
        assert_eq!(policy.resolve("no"), Some(false));
        assert_eq!(policy.resolve("maybe"), Some(false));
    }

    #[test]
    fn strict_booleans() {
        let policy = BooleanPolicy::new(["yes"], ["no"], true);
        assert_eq!(policy.resolve("Yes"), Some(true));
        assert_eq!(policy.resolve("NO"), Some(false));
        assert_eq!(policy.resolve("maybe"), None);
    }

    #[test]
    fn entity_ids_and_mentions() {
        assert_eq!(parse_entity_id("42"), Some(EntityId(42)));
        assert_eq!(parse_entity_id("<@42>"), Some(EntityId(42)));
        assert_eq!(parse_entity_id("<@!42>"), Some(EntityId(42)));
        assert_eq!(parse_entity_id("<@x>"), None);
        assert_eq!(parse_entity_id("alice"), None);
    }

    #[tokio::test]
    async fn entity_visibility_depends_on_privilege() {
        let fx = Fixture::new();
        let plain = fx.ctx(false);
        assert!(matches!(plain.resolve(TypeCode::Entity, "<@42>").await, Some(Value::Entity(e)) if e.id == EntityId(42)));
        assert_eq!(plain.resolve(TypeCode::Entity, "43").await, None);
        assert_eq!(plain.resolve(TypeCode::Entity, "44").await, None);

        let privileged = fx.ctx(true);
        assert!(privileged.resolve(TypeCode::Entity, "43").await.is_some());
    }

    #[tokio::test]
    async fn teams_are_case_insensitive() {
        let fx = Fixture::new();
        let ctx = fx.ctx(false);
        assert!(matches!(ctx.resolve(TypeCode::Team, "RED BANANAS").await, Some(Value::Team(t)) if t.id == "t1"));
        assert_eq!(ctx.resolve(TypeCode::Team, "blue").await, None);
    }

    #[tokio::test]
    async fn links_need_an_image_probe_hit() {
        let fx = Fixture::new();
        let ctx = fx.ctx(false);
        assert_eq!(
            ctx.resolve(TypeCode::Link, "<https://img.example/cat.png>").await,
            Some(Value::Link("https://img.example/cat.png".into()))
        );
        assert_eq!(ctx.resolve(TypeCode::Link, "https://example.com").await, None);
    }

    #[tokio::test]
    async fn strict_boolean_is_invalid_through_context() {
        let mut fx = Fixture::new();
        fx.booleans = BooleanPolicy::new(["yes"], ["no"], true);
        let ctx = fx.ctx(false);
        assert_eq!(ctx.resolve(TypeCode::Boolean, "perhaps").await, None);
        assert_eq!(ctx.resolve(TypeCode::Boolean, "no").await, Some(Value::Boolean(false)));
    }
}
