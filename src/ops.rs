//! Config operations: listing, key lookup, the env mapping table, template
//! generation, and the result types callers display.
//!
//! Provides the logic behind `config list`, `config get`, `config env` and
//! `config gen`. Everything here works on an already-built [`Schema`] and a
//! resolved mapping, so none of it touches the filesystem except writing a
//! generated template.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::coerce::assemble;
use crate::env::EnvNames;
use crate::error::StackfigError;
use crate::flatten::{FieldPath, flatten_schema};
use crate::merge::{Resolved, merge_layers};
use crate::overrides::option_id;
use crate::schema::Schema;
use crate::types::Layer;

/// One row of `config list`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub key: String,
    pub value: String,
    pub layer: Layer,
}

/// One row of `config env`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvRow {
    /// Dotted path, also the long CLI flag without the leading `--`.
    pub path: String,
    /// Parser-internal option id.
    pub option_id: String,
    /// `None` when env loading is disabled.
    pub lower: Option<String>,
    pub upper: Option<String>,
    pub default: String,
}

/// Result of a config operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// A generated JSON template string.
    Template(String),
    /// Confirmation that a template was written to a file.
    TemplateWritten { path: PathBuf },
    /// A key's resolved value, where it came from, and its doc comment.
    KeyValue {
        key: String,
        value: String,
        layer: Layer,
        doc: Vec<String>,
    },
    /// All resolved leaves in declaration order.
    Listing { entries: Vec<ListEntry> },
    /// The path / env name / default mapping table.
    EnvTable { rows: Vec<EnvRow> },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Template(t) => write!(f, "{t}"),
            ConfigResult::TemplateWritten { path } => {
                write!(f, "Config template written to {}", path.display())
            }
            ConfigResult::KeyValue {
                key,
                value,
                layer,
                doc,
            } => {
                for line in doc {
                    writeln!(f, "# {line}")?;
                }
                write!(f, "{key} = {value}  ({layer})")
            }
            ConfigResult::Listing { entries } => {
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{} = {}  ({})", entry.key, entry.value, entry.layer)?;
                }
                Ok(())
            }
            ConfigResult::EnvTable { rows } => write_env_table(f, rows),
        }
    }
}

fn write_env_table(f: &mut fmt::Formatter<'_>, rows: &[EnvRow]) -> fmt::Result {
    const HEADERS: [&str; 4] = ["CLI FLAG", "LOWERCASE ENV", "UPPERCASE ENV", "DEFAULT"];
    let cells: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                format!("--{}", row.path),
                row.lower.clone().unwrap_or_else(|| "-".into()),
                row.upper.clone().unwrap_or_else(|| "-".into()),
                row.default.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let header = HEADERS.map(String::from);
    for (i, row) in std::iter::once(&header).chain(&cells).enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        write!(f, "{}", line.trim_end())?;
    }
    Ok(())
}

/// Render a leaf value for display. Strings are shown without quotes.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Navigate a nested JSON object by dotted key path (e.g. `"key_02.subkey_01"`).
pub fn value_get<'a>(value: &'a Value, dotted_key: &str) -> Option<&'a Value> {
    dotted_key
        .split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

/// List every resolved leaf with its value and the layer that supplied it.
///
/// `value` is the assembled configuration, so entries show the coerced value
/// rather than the raw text a source supplied.
pub fn list_values(fields: &[FieldPath], value: &Value, resolved: &Resolved) -> ConfigResult {
    let entries = fields
        .iter()
        .filter_map(|field| {
            let leaf = resolved.get(&field.path)?;
            let shown = value_get(value, &field.path)?;
            Some(ListEntry {
                key: field.path.clone(),
                value: format_value(shown),
                layer: leaf.layer,
            })
        })
        .collect();
    ConfigResult::Listing { entries }
}

/// Look up one leaf by dotted key, including its doc comment.
pub fn get_value(
    fields: &[FieldPath],
    value: &Value,
    resolved: &Resolved,
    key: &str,
) -> Result<ConfigResult, StackfigError> {
    let not_found = || StackfigError::KeyNotFound(key.into());
    let field = fields.iter().find(|f| f.path == key).ok_or_else(not_found)?;
    let leaf = resolved.get(key).ok_or_else(not_found)?;
    let shown = value_get(value, key).ok_or_else(not_found)?;

    Ok(ConfigResult::KeyValue {
        key: key.into(),
        value: format_value(shown),
        layer: leaf.layer,
        doc: field.doc.clone(),
    })
}

/// Build the mapping table from dotted path to CLI flag and env names.
///
/// With `namespace` set to `None` (env disabled) the env columns are empty.
pub fn env_table(
    fields: &[FieldPath],
    namespace: Option<&str>,
) -> Result<ConfigResult, StackfigError> {
    let names = namespace
        .map(|ns| EnvNames::new(fields, ns))
        .transpose()?;

    let rows = fields
        .iter()
        .map(|field| {
            let name = names.as_ref().and_then(|n| n.get(&field.path));
            EnvRow {
                path: field.path.clone(),
                option_id: option_id(&field.path),
                lower: name.map(|n| n.lower.clone()),
                upper: name.map(|n| n.upper.clone()),
                default: format_value(&field.default),
            }
        })
        .collect();
    Ok(ConfigResult::EnvTable { rows })
}

/// Generate a JSON document holding every default, nested like the schema.
pub fn generate_template(schema: &Schema) -> Result<String, StackfigError> {
    let defaults = merge_layers(&flatten_schema(schema), vec![]);
    let value = assemble(schema, &defaults)?;
    to_json_pretty(&value)
}

/// Pretty-print any resolved configuration as JSON.
pub fn to_json_pretty<T: Serialize>(config: &T) -> Result<String, StackfigError> {
    serde_json::to_string_pretty(config).map_err(StackfigError::Serialize)
}
