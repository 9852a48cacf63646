//! CLI module for the api-mapper binary

pub mod commands;
pub mod error;
pub mod input;
pub mod output;

pub use error::CliError;
