//! Environment variable names and the two env layers.
//!
//! Every dotted path gets two names under the application namespace:
//!
//! | Dotted path | Lowercase-dotted | Uppercase-underscored |
//! |---|---|---|
//! | `key_00` | `app_name.key_00` | `APP_NAME_KEY_00` |
//! | `key_02.subkey_01` | `app_name.key_02.subkey_01` | `APP_NAME_KEY_02_SUBKEY_01` |
//!
//! The environment is read through [`EnvProvider`] so tests can pass a plain
//! map instead of touching the process environment.

use std::collections::{BTreeMap, HashMap};
use std::env::VarError;

use tracing::{debug, warn};

use crate::error::SchemaError;
use crate::flatten::FieldPath;
use crate::types::{Layer, RawValue, Sparse};

/// Read access to a set of environment variables.
pub trait EnvProvider {
    /// The value of `name`, or `None` if it is not set.
    fn get(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        match std::env::var(name) {
            Ok(value) => Some(value),
            Err(VarError::NotPresent) => None,
            Err(VarError::NotUnicode(_)) => {
                warn!(name, "ignoring environment variable with non-UTF-8 value");
                None
            }
        }
    }
}

impl EnvProvider for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

impl EnvProvider for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

/// `{namespace}.{dotted_path}`, lowercased as a whole.
pub fn lower_name(namespace: &str, path: &str) -> String {
    format!("{namespace}.{path}").to_lowercase()
}

/// The lowercase name with `.` → `_`, upper-cased.
pub fn upper_name(namespace: &str, path: &str) -> String {
    lower_name(namespace, path).replace('.', "_").to_uppercase()
}

/// Both env names for one dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvName {
    pub path: String,
    pub lower: String,
    pub upper: String,
}

/// Lookup tables from dotted path to env names, computed once per resolution.
#[derive(Debug, Clone)]
pub struct EnvNames {
    entries: Vec<EnvName>,
}

impl EnvNames {
    /// Derive names for every field.
    ///
    /// Two paths that differ only in `.` versus `_` (`a.b_c` and `a_b.c`)
    /// would share an uppercase name; that is rejected here rather than
    /// letting one silently shadow the other.
    pub fn new(fields: &[FieldPath], namespace: &str) -> Result<EnvNames, SchemaError> {
        let mut by_upper: HashMap<String, &str> = HashMap::new();
        let mut entries = Vec::with_capacity(fields.len());
        for field in fields {
            let upper = upper_name(namespace, &field.path);
            if let Some(first) = by_upper.insert(upper.clone(), &field.path) {
                return Err(SchemaError::EnvNameCollision {
                    first: first.to_string(),
                    second: field.path.clone(),
                    name: upper,
                });
            }
            entries.push(EnvName {
                path: field.path.clone(),
                lower: lower_name(namespace, &field.path),
                upper,
            });
        }
        Ok(EnvNames { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvName> {
        self.entries.iter()
    }

    pub fn get(&self, path: &str) -> Option<&EnvName> {
        self.entries.iter().find(|e| e.path == path)
    }
}

/// Collect the lowercase-dotted env layer.
pub fn collect_lower(names: &EnvNames, env: &dyn EnvProvider) -> Sparse {
    collect(names, env, Layer::LowerEnv, |e| &e.lower)
}

/// Collect the uppercase-underscored env layer.
pub fn collect_upper(names: &EnvNames, env: &dyn EnvProvider) -> Sparse {
    collect(names, env, Layer::UpperEnv, |e| &e.upper)
}

fn collect(
    names: &EnvNames,
    env: &dyn EnvProvider,
    layer: Layer,
    pick: impl Fn(&EnvName) -> &String,
) -> Sparse {
    let mut sparse = Sparse::new();
    for entry in names.iter() {
        if let Some(value) = env.get(pick(entry)) {
            sparse.insert(entry.path.clone(), RawValue::Text(value));
        }
    }
    debug!(%layer, supplied = sparse.len(), "collected environment layer");
    sparse
}
