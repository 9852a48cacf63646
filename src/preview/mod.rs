//! Preview executor: run a conversion program on sample data and validate
//! the output against the target schema

mod error;
mod executor;

pub use error::{PreviewError, PreviewResult};
pub use executor::{PreviewExecutor, PreviewOutcome, preview};
