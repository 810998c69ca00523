//! Config validation: checks with user-friendly error messages.

use crate::schema::ArgotConfig;
use argot_core::PermissionLevel;
use std::collections::HashSet;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl ConfigValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError::new(path, message));
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError::new(path, message));
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ArgotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_commands(config, &mut report);
    validate_resolvers(config, &mut report);
    validate_permissions(config, &mut report);
    validate_links(config, &mut report);
    report
}

fn validate_commands(config: &ArgotConfig, report: &mut ValidationReport) {
    let commands = config.commands();

    let prefix = commands.prefix();
    if prefix.is_empty() {
        report.error("commands.prefix", "Prefix cannot be empty; every message would be a command");
    } else if prefix.contains(char::is_whitespace) {
        report.error("commands.prefix", "Prefix cannot contain whitespace");
    }

    let token = commands.confirmation_token();
    if token.is_empty() {
        report.error("commands.confirmationToken", "Confirmation token cannot be empty");
    } else if token.contains(char::is_whitespace) {
        report.error("commands.confirmationToken", "Confirmation token must be a single word");
    }

    if commands.confirmation_timeout_secs == Some(0) {
        report.error("commands.confirmationTimeoutSecs", "confirmationTimeoutSecs must be > 0");
    }
    if commands.reply_timeout_secs == Some(0) {
        report.error("commands.replyTimeoutSecs", "replyTimeoutSecs must be > 0");
    }
}

fn validate_resolvers(config: &ArgotConfig, report: &mut ValidationReport) {
    let resolvers = config.resolvers();
    let truthy: HashSet<String> = resolvers.truthy().iter().map(|w| w.to_lowercase()).collect();
    let falsy: HashSet<String> = resolvers.falsy().iter().map(|w| w.to_lowercase()).collect();

    if truthy.is_empty() {
        report.warn("resolvers.truthy", "No truthy words; every boolean argument will be false");
    }
    if falsy.is_empty() && resolvers.is_strict() {
        report.warn("resolvers.falsy", "No falsy words in strict mode; false cannot be expressed");
    }

    let mut overlap: Vec<&String> = truthy.intersection(&falsy).collect();
    if !overlap.is_empty() {
        overlap.sort();
        let words: Vec<&str> = overlap.iter().map(|w| w.as_str()).collect();
        report.error(
            "resolvers",
            format!("Words listed as both truthy and falsy: {}", words.join(", ")),
        );
    }
}

fn validate_permissions(config: &ArgotConfig, report: &mut ValidationReport) {
    let permissions = config.permissions();

    match permissions.privileged_level() {
        Ok(PermissionLevel::Banned) => {
            report.error("permissions.privilegedLevel", "Banned entities cannot be privileged")
        }
        Ok(level) if level < PermissionLevel::ScopeAdmin => report.warn(
            "permissions.privilegedLevel",
            format!("Every `{level}` can act on inactive entities"),
        ),
        Ok(_) => {}
        Err(e) => report.errors.push(e),
    }

    // One entry per bad override, not just the first.
    for (id, level) in &permissions.overrides {
        let path = format!("permissions.overrides.{id}");
        match id.trim().parse::<u64>() {
            Err(_) => report.error(&path, "Entity id must be a number"),
            Ok(0) => report.warn(&path, "Entity id 0 never matches a real participant"),
            Ok(entity) if permissions.banned.contains(&entity) => {
                report.warn(&path, "Entity is also banned; the ban wins")
            }
            Ok(_) => {}
        }
        if let Err(message) = level.parse::<PermissionLevel>() {
            report.error(&path, message);
        }
    }
}

fn validate_links(config: &ArgotConfig, report: &mut ValidationReport) {
    let links = config.links();
    if links.timeout_secs == Some(0) {
        report.error("links.timeoutSecs", "timeoutSecs must be > 0");
    }
    if links.user_agent.as_deref().is_some_and(|ua| ua.trim().is_empty()) {
        report.warn("links.userAgent", "Empty user agent; some hosts refuse such requests");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ArgotConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn empty_config_is_valid() {
        let report = validate(&ArgotConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn empty_prefix_is_error() {
        let report = validate(&parse("commands:\n  prefix: \"\"\n"));
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "commands.prefix");
    }

    #[test]
    fn whitespace_in_token_is_error() {
        let report = validate(&parse("commands:\n  confirmationToken: \"yes please\"\n"));
        assert_eq!(report.errors[0].path, "commands.confirmationToken");
    }

    #[test]
    fn zero_timeouts_are_errors() {
        let report = validate(&parse(
            "commands:\n  replyTimeoutSecs: 0\n  confirmationTimeoutSecs: 0\nlinks:\n  timeoutSecs: 0\n",
        ));
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn overlapping_boolean_words_are_error() {
        let report = validate(&parse("resolvers:\n  truthy: [yes, Maybe]\n  falsy: [no, maybe]\n"));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("maybe"));
    }

    #[test]
    fn override_checks() {
        let report = validate(&parse(
            "permissions:\n  banned: [5]\n  overrides:\n    \"0\": admin\n    \"5\": mod\n    abc: owner\n    \"9\": wizard\n",
        ));
        let error_paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(error_paths.contains(&"permissions.overrides.abc"));
        assert!(error_paths.contains(&"permissions.overrides.9"));
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn unknown_privileged_level_is_error() {
        let report = validate(&parse("permissions:\n  privilegedLevel: wizard\n"));
        assert_eq!(report.errors[0].path, "permissions.privilegedLevel");
    }
}
