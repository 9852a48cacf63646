//! Validate a produced value against a target schema

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::cli::input::{load_config, load_schema, load_value};
use crate::cli::output::format_issues;
use crate::validation::Validator;

/// Arguments for the `validate` command
#[derive(Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Target schema file
    pub target: PathBuf,
    /// Value to check, `-` for stdin
    pub value: PathBuf,
    /// Session configuration (TOML), for the numeric policy
    pub config: Option<PathBuf>,
}

/// Handle the `validate` command
pub fn handle_validate(args: &ValidateArgs) -> Result<String, CliError> {
    let schema = load_schema(&args.target)?;
    let value = load_value(&args.value)?;
    let config = load_config(args.config.as_deref())?;

    let issues: Vec<String> = Validator::with_policy(config.numeric_policy)
        .validate(&value, &schema)
        .iter()
        .map(ToString::to_string)
        .collect();

    if issues.is_empty() {
        Ok(format_issues(&issues))
    } else {
        Err(CliError::ValidationFailed(issues))
    }
}
