//! CLI command implementations

pub mod generate;
pub mod preview;
pub mod template;
pub mod validate;

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::cli::input::{load_config, load_mapping, load_overrides, load_schema};
use crate::session::MappingSession;

/// Inputs shared by every command that needs a populated session
#[derive(Debug, Clone, Default)]
pub struct SessionArgs {
    /// Source (API response) schema file
    pub source: PathBuf,
    /// Target (UI requirement) schema file
    pub target: PathBuf,
    /// Mapping file: target field to source field(s)
    pub mapping: Option<PathBuf>,
    /// Overrides file: target field to function text
    pub overrides: Option<PathBuf>,
    /// Session configuration (TOML)
    pub config: Option<PathBuf>,
}

/// Build a session from schema, mapping and override files
pub fn build_session(args: &SessionArgs) -> Result<MappingSession, CliError> {
    let source = load_schema(&args.source)?;
    let target = load_schema(&args.target)?;
    let config = load_config(args.config.as_deref())?;
    let mut session = MappingSession::with_config(source, target, config);

    if let Some(path) = &args.mapping {
        for (target, source) in load_mapping(path)? {
            session.on_mapping_toggle(&target, &source);
        }
    }

    if let Some(path) = &args.overrides {
        for (target, text) in load_overrides(path)? {
            session.on_override_save(&target, &text);
        }
    }

    Ok(session)
}
