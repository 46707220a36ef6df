//! The command-line layer, independent of any argument parser.
//!
//! A CLI parser registers one option per dotted path. Parsers generally want
//! identifiers without dots, so each option's internal id is the dotted path
//! with `.` replaced by [`ID_SEPARATOR`] (`key_02.subkey_01` → `key_02__subkey_01`).
//! The user-facing flag keeps the dots: `--key_02.subkey_01`.
//!
//! Options the user did not pass must arrive as `None`; they are dropped here
//! so a parser default can never outrank the lower layers.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::flatten::FieldPath;
use crate::types::{RawValue, Sparse};

/// Separator that stands in for `.` inside option ids.
pub const ID_SEPARATOR: &str = "__";

/// The parser-internal id for a dotted path.
pub fn option_id(path: &str) -> String {
    path.replace('.', ID_SEPARATOR)
}

/// Build the CLI layer from `(option_id, value)` pairs.
///
/// `None` values are omitted. Ids that name no schema path (options the
/// consumer added for its own use) are ignored. If an id repeats, the last
/// value wins.
pub fn collect_cli<I, K, V>(fields: &[FieldPath], options: I) -> Sparse
where
    I: IntoIterator<Item = (K, Option<V>)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let by_id: HashMap<String, &str> = fields
        .iter()
        .map(|f| (option_id(&f.path), f.path.as_str()))
        .collect();

    let mut sparse = Sparse::new();
    for (id, value) in options {
        let (Some(path), Some(value)) = (by_id.get(id.as_ref()), value) else {
            continue;
        };
        sparse.insert(path.to_string(), RawValue::Text(value.into()));
    }
    debug!(supplied = sparse.len(), "collected cli layer");
    sparse
}

/// Fold dotted-path overrides into a CLI layer. Unknown paths are dropped
/// with a warning; later entries win.
pub fn overrides_to_sparse(fields: &[FieldPath], entries: &[(String, RawValue)]) -> Sparse {
    let valid = valid_keys(fields);
    let mut sparse = Sparse::new();
    for (path, value) in entries {
        if valid.contains(path.as_str()) {
            sparse.insert(path.clone(), value.clone());
        } else {
            warn!(key = %path, "ignoring override for unknown config key");
        }
    }
    sparse
}

/// All leaf paths of the flattened schema.
pub fn valid_keys(fields: &[FieldPath]) -> HashSet<&str> {
    fields.iter().map(|f| f.path.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::sample_fields;

    #[test]
    fn option_id_replaces_dots() {
        assert_eq!(option_id("key_00"), "key_00");
        assert_eq!(option_id("key_02.subkey_01"), "key_02__subkey_01");
        assert_eq!(
            option_id("level1.level2.level3.deep_value"),
            "level1__level2__level3__deep_value"
        );
    }

    #[test]
    fn supplied_options_mapped_back_to_paths() {
        let sparse = collect_cli(
            &sample_fields(),
            vec![
                ("key_00", Some("cli_value")),
                ("key_02__subkey_01", Some("cli_nested")),
            ],
        );
        assert_eq!(sparse.len(), 2);
        assert_eq!(sparse["key_00"], RawValue::Text("cli_value".into()));
        assert_eq!(
            sparse["key_02.subkey_01"],
            RawValue::Text("cli_nested".into())
        );
    }

    #[test]
    fn unset_options_omitted() {
        let sparse = collect_cli(
            &sample_fields(),
            vec![("key_00", None), ("key_01", Some("set"))],
        );
        assert!(!sparse.contains_key("key_00"));
        assert_eq!(sparse.len(), 1);
    }

    #[test]
    fn explicit_empty_string_is_supplied() {
        let sparse = collect_cli(&sample_fields(), vec![("key_00", Some(""))]);
        assert_eq!(sparse["key_00"], RawValue::Text(String::new()));
    }

    #[test]
    fn foreign_options_ignored() {
        let sparse = collect_cli(
            &sample_fields(),
            vec![("verbose", Some("true")), ("input_file", Some("x.txt"))],
        );
        assert!(sparse.is_empty());
    }

    #[test]
    fn dotted_id_is_not_an_option_id() {
        let sparse = collect_cli(&sample_fields(), vec![("key_02.subkey_01", Some("x"))]);
        assert!(sparse.is_empty());
    }

    #[test]
    fn overrides_keep_known_paths_only() {
        let entries = vec![
            ("key_01".to_string(), RawValue::Text("a".into())),
            ("nope".to_string(), RawValue::Text("b".into())),
            ("key_01".to_string(), RawValue::Text("c".into())),
        ];
        let sparse = overrides_to_sparse(&sample_fields(), &entries);
        assert_eq!(sparse.len(), 1);
        assert_eq!(sparse["key_01"], RawValue::Text("c".into()));
    }

    #[test]
    fn valid_keys_excludes_groups() {
        let fields = sample_fields();
        let keys = valid_keys(&fields);
        assert_eq!(keys.len(), 8);
        assert!(keys.contains("key_03.subkey_01.subsubkey_01"));
        assert!(!keys.contains("key_02"));
    }
}
