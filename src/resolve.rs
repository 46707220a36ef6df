//! Core resolution pipeline: collect every layer, merge, and produce a typed config.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no I/O, making the full
//! pipeline testable with synthetic inputs. Steps:
//!
//! 1. Flatten the schema into its leaf paths
//! 2. Parse, validate and flatten config files into the File layer
//! 3. Look up lowercase-dotted and uppercase-underscored env names
//! 4. Collect CLI overrides
//! 5. Merge all layers onto the defaults, last writer wins per leaf
//! 6. Coerce leaves to their declared types and rebuild the nested value
//! 7. Deserialize the nested value into `C`

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::coerce::assemble;
use crate::env::{self, EnvNames, EnvProvider};
use crate::error::StackfigError;
use crate::file;
use crate::flatten::flatten_schema;
use crate::merge::{Resolved, merge_layers};
use crate::overrides;
use crate::schema::Schema;
use crate::types::{Layer, RawValue, Sparse};

/// All pre-loaded data needed to resolve a config. No I/O happens here.
pub struct ResolveInput<'a> {
    /// File contents in precedence order: first = lowest priority, last = highest.
    pub files: Vec<(PathBuf, String)>,
    /// Whether to reject unknown keys in config files.
    pub strict: bool,
    /// Application namespace for env names. `None` disables both env layers.
    pub env_namespace: Option<String>,
    /// Where env values are read from.
    pub env: &'a dyn EnvProvider,
    /// CLI overrides as `(dotted_key, value)` pairs. Later entries win.
    pub cli_overrides: Vec<(String, RawValue)>,
}

/// The outcome of a resolution run.
#[derive(Debug, Clone)]
pub struct Resolution<C> {
    /// The typed configuration.
    pub config: C,
    /// The nested value `config` was built from.
    pub value: Value,
    /// Every leaf's winning raw value and the layer it came from.
    pub resolved: Resolved,
}

/// Collect and merge every layer into the flat resolved mapping.
pub fn resolve_flat(schema: &Schema, input: ResolveInput<'_>) -> Result<Resolved, StackfigError> {
    let fields = flatten_schema(schema);

    let file_layer = file::file_layer(&fields, &input.files, input.strict)?;

    let (lower, upper) = match &input.env_namespace {
        Some(namespace) => {
            let names = EnvNames::new(&fields, namespace)?;
            (
                env::collect_lower(&names, input.env),
                env::collect_upper(&names, input.env),
            )
        }
        None => (Sparse::new(), Sparse::new()),
    };

    let cli = overrides::overrides_to_sparse(&fields, &input.cli_overrides);

    let resolved = merge_layers(
        &fields,
        vec![
            (Layer::File, file_layer),
            (Layer::LowerEnv, lower),
            (Layer::UpperEnv, upper),
            (Layer::Cli, cli),
        ],
    );
    debug!(leaves = resolved.len(), "resolved configuration");
    Ok(resolved)
}

/// Resolve and construct the typed configuration.
pub fn resolve<C: DeserializeOwned>(
    schema: &Schema,
    input: ResolveInput<'_>,
) -> Result<Resolution<C>, StackfigError> {
    let resolved = resolve_flat(schema, input)?;
    let value = assemble(schema, &resolved)?;
    let config: C = serde_json::from_value(value.clone()).map_err(StackfigError::Validation)?;
    Ok(Resolution {
        config,
        value,
        resolved,
    })
}
