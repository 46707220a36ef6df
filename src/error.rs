use std::path::PathBuf;

use thiserror::Error;

use crate::schema::LeafType;
use crate::types::Layer;

#[derive(Debug, Error)]
pub enum StackfigError {
    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in config file")]
    UnknownKeys(Vec<StackfigError>),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Config file {path} must contain a JSON object at the top level")]
    NotAnObject { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot convert {layer} value {value} for '{key}' to {expected}")]
    Coercion {
        key: String,
        value: String,
        layer: Layer,
        expected: LeafType,
    },

    #[error("Resolved configuration failed validation: {0}")]
    Validation(#[source] serde_json::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("App name is required — call .app_name() on the builder")]
    AppNameRequired,
}

/// Programmer errors in the schema description, reported before any source is read.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("field '{path}' has no default value")]
    MissingDefault { path: String },

    #[error("field '{path}' has a default of unsupported shape ({found})")]
    UnsupportedDefault { path: String, found: String },

    #[error("invalid segment name '{segment}' under '{parent}'")]
    InvalidSegment { parent: String, segment: String },

    #[error("field '{path}' is declared twice")]
    DuplicatePath { path: String },

    #[error("group '{path}' has no fields")]
    EmptyGroup { path: String },

    #[error("'{first}' and '{second}' both map to environment variable {name}")]
    EnvNameCollision {
        first: String,
        second: String,
        name: String,
    },

    #[error("'{first}' and '{second}' both map to command-line option id {id}")]
    OptionIdCollision {
        first: String,
        second: String,
        id: String,
    },

    #[error("field '{path}' would shadow the built-in --{path} flag")]
    ReservedName { path: String },
}
