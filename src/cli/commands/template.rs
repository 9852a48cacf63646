//! Print the editable custom-function template for a mapped field

use crate::cli::commands::{SessionArgs, build_session};
use crate::cli::error::CliError;

/// Arguments for the `template` command
#[derive(Debug, Clone, Default)]
pub struct TemplateArgs {
    pub session: SessionArgs,
    /// Target field to write a custom function for
    pub field: String,
}

/// Handle the `template` command
///
/// An existing override is returned as saved; otherwise a fresh template.
pub fn handle_template(args: &TemplateArgs) -> Result<String, CliError> {
    let session = build_session(&args.session)?;
    if let Some(text) = session.overrides().get(&args.field) {
        return Ok(text.to_string());
    }
    session.override_template(&args.field).ok_or_else(|| {
        CliError::MappingError(format!("field '{}' has no mapped sources", args.field))
    })
}
