//! Strict-mode validation: detect unknown keys in config files.
//!
//! A key is unknown when its dotted path is not a leaf of the schema. That
//! covers typos, stale keys, a scalar written where a group is declared
//! (`"key_02": "x"`), and an object written where a leaf is declared
//! (`"key_00": {"a": 1}` flattens to `key_00.a`, `"key_00": {}` stays an
//! object at `key_00`). An empty object where a group is declared is allowed.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::error::StackfigError;
use crate::flatten::FieldPath;

/// Dotted keys from a flattened file that are not schema leaves, in file order.
pub fn find_unknown_keys(pairs: &[(String, Value)], fields: &[FieldPath]) -> Vec<String> {
    let valid: HashSet<&str> = fields.iter().map(|f| f.path.as_str()).collect();
    pairs
        .iter()
        .filter(|(key, value)| match value {
            Value::Object(_) => !is_group(key, fields),
            _ => !valid.contains(key.as_str()),
        })
        .map(|(key, _)| key.clone())
        .collect()
}

/// Whether `key` names a group, i.e. is a strict dotted prefix of some leaf.
fn is_group(key: &str, fields: &[FieldPath]) -> bool {
    fields.iter().any(|f| {
        f.path
            .strip_prefix(key)
            .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Validate that a flattened config file holds no unknown keys.
///
/// Each unknown key is reported with its file path and best-effort line number.
pub fn validate_unknown_keys(
    pairs: &[(String, Value)],
    fields: &[FieldPath],
    content: &str,
    path: &Path,
) -> Result<(), StackfigError> {
    let unknown = find_unknown_keys(pairs, fields);
    if unknown.is_empty() {
        return Ok(());
    }

    let errors: Vec<StackfigError> = unknown
        .into_iter()
        .map(|key| {
            let line = find_key_line(content, &key);
            StackfigError::UnknownKey {
                key,
                path: path.to_path_buf(),
                line,
            }
        })
        .collect();

    Err(StackfigError::UnknownKeys(errors))
}

/// Find the 1-indexed line number for a dotted key in JSON text.
///
/// Looks for `"segment":` for each segment in turn, each search starting at
/// the line where the previous segment was found. This is a best-effort
/// heuristic and does not understand escapes or keys repeated in earlier
/// sibling objects. Returns 0 if the key cannot be located.
pub(crate) fn find_key_line(content: &str, dotted_key: &str) -> usize {
    let lines: Vec<&str> = content.lines().collect();
    let mut start = 0;

    for segment in dotted_key.split('.') {
        let needle = format!("\"{segment}\"");
        let found = lines[start..].iter().position(|line| {
            line.match_indices(&needle)
                .any(|(i, _)| line[i + needle.len()..].trim_start().starts_with(':'))
        });
        match found {
            Some(offset) => start += offset,
            None => return 0,
        }
    }
    start + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::sample_fields;
    use crate::flatten::flatten_value;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("/test/config.json")
    }

    fn check(content: &str) -> Result<(), StackfigError> {
        let value: Value = serde_json::from_str(content).unwrap();
        let pairs = flatten_value(value.as_object().unwrap());
        validate_unknown_keys(&pairs, &sample_fields(), content, &path())
    }

    #[test]
    fn valid_config_passes() {
        let content = r#"{
  "key_00": "a",
  "key_02": {"subkey_01": "b"},
  "key_03": {"subkey_01": {"subsubkey_01": "c"}}
}"#;
        assert!(check(content).is_ok());
    }

    #[test]
    fn unknown_top_level_key() {
        let content = "{\n  \"key_00\": \"a\",\n  \"typo_key\": 42\n}\n";
        match check(content).unwrap_err() {
            StackfigError::UnknownKeys(keys) => {
                assert_eq!(keys.len(), 1);
                match &keys[0] {
                    StackfigError::UnknownKey { key, line, .. } => {
                        assert_eq!(key, "typo_key");
                        assert_eq!(*line, 3);
                    }
                    other => panic!("Expected UnknownKey, got: {other:?}"),
                }
            }
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_nested_key() {
        let content = "{\n  \"key_02\": {\n    \"subkey_01\": \"x\",\n    \"typo\": \"bad\"\n  }\n}\n";
        match check(content).unwrap_err() {
            StackfigError::UnknownKeys(keys) => match &keys[0] {
                StackfigError::UnknownKey { key, line, .. } => {
                    assert_eq!(key, "key_02.typo");
                    assert_eq!(*line, 4);
                }
                other => panic!("Expected UnknownKey, got: {other:?}"),
            },
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn scalar_where_group_declared_is_unknown() {
        let err = check(r#"{"key_02": "flat"}"#).unwrap_err();
        assert!(matches!(err, StackfigError::UnknownKeys(keys) if keys.len() == 1));
    }

    #[test]
    fn object_where_leaf_declared_is_unknown() {
        let keys = find_unknown_keys(
            &flatten_value(serde_json::json!({"key_00": {"a": 1}}).as_object().unwrap()),
            &sample_fields(),
        );
        assert_eq!(keys, vec!["key_00.a".to_string()]);
    }

    #[test]
    fn empty_object_where_leaf_declared_is_unknown() {
        match check(r#"{"key_00": {}}"#).unwrap_err() {
            StackfigError::UnknownKeys(errs) => {
                assert_eq!(errs.len(), 1);
                assert!(matches!(&errs[0], StackfigError::UnknownKey { key, .. } if key == "key_00"));
            }
            other => panic!("Expected UnknownKeys, got {other:?}"),
        }
        assert!(check(r#"{"nope": {}}"#).is_err());
    }

    #[test]
    fn empty_object_where_group_declared_is_allowed() {
        assert!(check(r#"{"key_02": {}, "key_03": {"subkey_01": {}}}"#).is_ok());
    }

    #[test]
    fn multiple_unknown_keys() {
        match check(r#"{"typo1": 1, "typo2": 2}"#).unwrap_err() {
            StackfigError::UnknownKeys(keys) => assert_eq!(keys.len(), 2),
            other => panic!("Expected UnknownKeys, got: {other:?}"),
        }
    }

    #[test]
    fn empty_object_ok() {
        assert!(check("{}").is_ok());
    }

    #[test]
    fn line_number_follows_nesting() {
        // "subkey_01" appears under key_02 first; the finder must descend into key_03.
        let content = "{\n\"key_02\": {\n\"subkey_01\": \"a\"\n},\n\"key_03\": {\n\"subkey_01\": {\n\"bogus\": 1\n}\n}\n}";
        assert_eq!(find_key_line(content, "key_03.subkey_01.bogus"), 7);
    }

    #[test]
    fn line_number_single_line_document() {
        assert_eq!(find_key_line(r#"{"a": {"b": 1}}"#, "a.b"), 1);
    }

    #[test]
    fn line_number_missing_key_is_zero() {
        assert_eq!(find_key_line("{\n\"a\": 1\n}", "zzz"), 0);
    }

    #[test]
    fn value_equal_to_key_name_not_matched() {
        let content = "{\n\"x\": \"typo\",\n\"typo\": 1\n}";
        assert_eq!(find_key_line(content, "typo"), 3);
    }
}
