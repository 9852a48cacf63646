//! Loading schemas, mappings, overrides and samples from JSON or YAML files

use std::io::Read;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::cli::error::CliError;
use crate::config::SessionConfig;
use crate::schema::SchemaNode;

/// Source fields for one target in a mapping file: a name or a list of names
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourceList {
    One(String),
    Many(Vec<String>),
}

/// Read a file, or stdin when the path is `-`
fn read_input(path: &Path) -> Result<String, CliError> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| CliError::InvalidArgument(format!("Failed to read stdin: {}", e)))?;
        Ok(content)
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| CliError::FileReadError(path.to_path_buf(), e.to_string()))
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Parse a JSON or YAML file into a typed value
fn parse_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = read_input(path)?;
    let parse_error = |e: String| CliError::ParseError(PathBuf::from(path), e);
    if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))
    } else {
        serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))
    }
}

/// Load any structured value, such as sample input or a produced object
pub fn load_value(path: &Path) -> Result<Value, CliError> {
    parse_file(path)
}

pub fn load_schema(path: &Path) -> Result<SchemaNode, CliError> {
    let value = load_value(path)?;
    Ok(SchemaNode::from_value(&value)?)
}

/// Load a mapping file as ordered `(target, source)` pairs
///
/// Repeated sources for one target are listed once.
pub fn load_mapping(path: &Path) -> Result<Vec<(String, String)>, CliError> {
    let raw: IndexMap<String, SourceList> = parse_file(path)?;
    let mut pairs = Vec::new();
    for (target, sources) in raw {
        let sources = match sources {
            SourceList::One(source) => vec![source],
            SourceList::Many(list) => list,
        };
        if sources.is_empty() {
            return Err(CliError::MappingError(format!(
                "target field '{}' has an empty source list",
                target
            )));
        }
        let mut seen: Vec<&str> = Vec::new();
        for source in &sources {
            if !seen.contains(&source.as_str()) {
                seen.push(source);
                pairs.push((target.clone(), source.clone()));
            }
        }
    }
    Ok(pairs)
}

/// Load an overrides file: target field to function text
pub fn load_overrides(path: &Path) -> Result<IndexMap<String, String>, CliError> {
    parse_file(path)
}

/// Load a TOML config, or the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<SessionConfig, CliError> {
    match path {
        Some(path) => Ok(SessionConfig::load(path)?),
        None => Ok(SessionConfig::default()),
    }
}
