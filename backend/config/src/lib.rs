//! `argot-config`: runtime configuration for the Argot command pipeline.
//!
//! Provides:
//! - Typed config schema (commands, resolvers, permissions, links, logging)
//! - YAML loading with a defaults-on-first-run fallback
//! - Default value application
//! - Validation with paths and messages

pub mod defaults;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use io::{config_dir, config_file_path, load_config, parse_config};
pub use schema::{
    ArgotConfig, BooleanMode, CommandsConfig, LinksConfig, LoggingConfig, PermissionsConfig,
    ResolversConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::path::Path;

/// Load a config file, apply defaults and validate it.
///
/// Warnings are logged. Any validation error fails the load with every
/// error listed.
pub async fn load_and_prepare(path: &Path) -> Result<ArgotConfig> {
    let config = apply_all_defaults(load_config(path).await?);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        let lines: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("invalid configuration:\n{}", lines.join("\n"));
    }

    Ok(config)
}
