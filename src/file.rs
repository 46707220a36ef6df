//! The File layer: discovery, loading, and flattening of JSON config files.
//!
//! # Discovery
//!
//! Each [`SearchPath`] resolves to one directory, checked for
//! `{dir}/{file_name}`. The list is priority-ascending: later entries win.
//! By default the only entry is [`SearchPath::Platform`], i.e.
//! `~/.config/{app_name}/config.json` on Linux.
//!
//! - [`SearchMode::Merge`] — every found file is read, in priority order.
//! - [`SearchMode::FirstMatch`] — only the highest-priority file found is read.
//!
//! Missing files are silently skipped in both modes. Only actual I/O errors
//! (permissions, etc.) are propagated.
//!
//! # Flattening
//!
//! Each file must hold a JSON object mirroring the schema's groups and leaves.
//! It is flattened with the same dotted-path rule as the schema. `null`
//! values count as absent. Keys that are not schema leaves fail the load in
//! strict mode and are logged and skipped otherwise.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::StackfigError;
use crate::flatten::{FieldPath, flatten_value};
use crate::overrides::valid_keys;
use crate::types::{RawValue, SearchMode, SearchPath, Sparse};
use crate::validate;

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Expand all search paths into concrete directories (priority-ascending).
pub fn expand_search_paths(search_paths: &[SearchPath], app_name: &str) -> Vec<PathBuf> {
    search_paths
        .iter()
        .filter_map(|sp| resolve_search_path(sp, app_name))
        .collect()
}

/// Load config files from the search paths, respecting [`SearchMode`].
pub fn load_config_files(
    search_paths: &[SearchPath],
    file_name: &str,
    app_name: &str,
    mode: SearchMode,
) -> Result<Vec<(PathBuf, String)>, StackfigError> {
    let dirs = expand_search_paths(search_paths, app_name);

    match mode {
        SearchMode::Merge => load_all(&dirs, file_name),
        SearchMode::FirstMatch => load_first_match(&dirs, file_name),
    }
}

/// Read one file. A missing file is `Ok(None)`.
pub fn read_optional(path: &Path) -> Result<Option<String>, StackfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StackfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Load all config files found across directories (for Merge mode).
fn load_all(dirs: &[PathBuf], file_name: &str) -> Result<Vec<(PathBuf, String)>, StackfigError> {
    let mut results = Vec::new();
    for dir in dirs {
        let file_path = dir.join(file_name);
        if let Some(content) = read_optional(&file_path)? {
            results.push((file_path, content));
        }
    }
    Ok(results)
}

/// Load only the highest-priority config file found (for FirstMatch mode).
///
/// Searches from the end of the directory list (highest priority) backward.
fn load_first_match(
    dirs: &[PathBuf],
    file_name: &str,
) -> Result<Vec<(PathBuf, String)>, StackfigError> {
    for dir in dirs.iter().rev() {
        let file_path = dir.join(file_name);
        if let Some(content) = read_optional(&file_path)? {
            return Ok(vec![(file_path, content)]);
        }
    }
    Ok(vec![])
}

/// Build the File layer from loaded file contents (lowest priority first).
pub fn file_layer(
    fields: &[FieldPath],
    files: &[(PathBuf, String)],
    strict: bool,
) -> Result<Sparse, StackfigError> {
    let valid = valid_keys(fields);
    let mut sparse = Sparse::new();
    for (path, content) in files {
        let parsed: Value = serde_json::from_str(content).map_err(|e| StackfigError::Parse {
            path: path.clone(),
            source: e,
        })?;
        let Value::Object(object) = parsed else {
            return Err(StackfigError::NotAnObject { path: path.clone() });
        };
        let pairs: Vec<(String, Value)> = flatten_value(&object)
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();

        if strict {
            validate::validate_unknown_keys(&pairs, fields, content, path)?;
        } else {
            for key in validate::find_unknown_keys(&pairs, fields) {
                warn!(key = %key, path = %path.display(), "ignoring unknown key in config file");
            }
        }

        for (key, value) in pairs {
            if valid.contains(key.as_str()) && !value.is_object() {
                sparse.insert(key, RawValue::Json(value));
            }
        }
        debug!(path = %path.display(), "read config file");
    }
    debug!(supplied = sparse.len(), "collected file layer");
    Ok(sparse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::sample_fields;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn layer(content: &str, strict: bool) -> Result<Sparse, StackfigError> {
        file_layer(
            &sample_fields(),
            &[(PathBuf::from("config.json"), content.to_string())],
            strict,
        )
    }

    #[test]
    fn resolve_explicit_path() {
        let p = PathBuf::from("/tmp/myapp");
        let resolved = resolve_search_path(&SearchPath::Path(p.clone()), "ignored");
        assert_eq!(resolved, Some(p));
    }

    #[test]
    fn load_no_files_exist() {
        let dir = TempDir::new().unwrap();
        let paths = vec![SearchPath::Path(dir.path().to_path_buf())];
        let files =
            load_config_files(&paths, "config.json", "test", SearchMode::Merge).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn load_multiple_files_in_priority_order() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        fs::write(dir1.path().join("config.json"), r#"{"key_00": "a"}"#).unwrap();
        fs::write(dir2.path().join("config.json"), r#"{"key_01": "b"}"#).unwrap();

        let paths = vec![
            SearchPath::Path(dir1.path().to_path_buf()),
            SearchPath::Path(dir2.path().to_path_buf()),
        ];
        let files = load_config_files(&paths, "config.json", "test", SearchMode::Merge).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].1.contains("key_00"));
        assert!(files[1].1.contains("key_01"));
    }

    #[test]
    fn missing_file_silently_skipped() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        fs::write(dir2.path().join("config.json"), "{}").unwrap();

        let paths = vec![
            SearchPath::Path(dir1.path().to_path_buf()),
            SearchPath::Path(dir2.path().to_path_buf()),
        ];
        let files = load_config_files(&paths, "config.json", "test", SearchMode::Merge).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_returns_io_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let file_path = dir.path().join("config.json");
        fs::write(&file_path, "{}").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; only assert when the read really fails.
        let readable = fs::read_to_string(&file_path).is_ok();
        let result = read_optional(&file_path);
        if !readable {
            assert!(matches!(result, Err(StackfigError::Io { .. })));
        }

        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn first_match_returns_highest_priority() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        fs::write(dir1.path().join("config.json"), r#"{"key_00": "low"}"#).unwrap();
        fs::write(dir2.path().join("config.json"), r#"{"key_00": "high"}"#).unwrap();

        let paths = vec![
            SearchPath::Path(dir1.path().to_path_buf()),
            SearchPath::Path(dir2.path().to_path_buf()),
        ];
        let files =
            load_config_files(&paths, "config.json", "test", SearchMode::FirstMatch).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].1.contains("high"));
    }

    #[test]
    fn first_match_falls_back_to_lower_priority() {
        let dir1 = TempDir::new().unwrap();
        let dir2 = TempDir::new().unwrap();
        fs::write(dir1.path().join("config.json"), r#"{"key_00": "fallback"}"#).unwrap();

        let paths = vec![
            SearchPath::Path(dir1.path().to_path_buf()),
            SearchPath::Path(dir2.path().to_path_buf()),
        ];
        let files =
            load_config_files(&paths, "config.json", "test", SearchMode::FirstMatch).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].1.contains("fallback"));
    }

    #[test]
    fn read_optional_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_optional(&dir.path().join("nope.json")).unwrap().is_none());
    }

    // --- file_layer ---

    #[test]
    fn nested_file_flattens_to_paths() {
        let sparse = layer(r#"{"key_02": {"subkey_02": "L2"}}"#, true).unwrap();
        assert_eq!(sparse.len(), 1);
        assert_eq!(sparse["key_02.subkey_02"], RawValue::Json(json!("L2")));
    }

    #[test]
    fn null_values_are_absent() {
        let sparse = layer(r#"{"key_00": null, "key_01": "x"}"#, true).unwrap();
        assert!(!sparse.contains_key("key_00"));
        assert!(sparse.contains_key("key_01"));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = layer("invalid json", true).unwrap_err();
        assert!(matches!(err, StackfigError::Parse { .. }));
    }

    #[test]
    fn non_object_root_rejected() {
        let err = layer("[1, 2]", true).unwrap_err();
        assert!(matches!(err, StackfigError::NotAnObject { .. }));
    }

    #[test]
    fn strict_rejects_unknown_key() {
        let err = layer(r#"{"typo": 1}"#, true).unwrap_err();
        assert!(matches!(err, StackfigError::UnknownKeys(_)));
    }

    #[test]
    fn lenient_skips_unknown_key() {
        let sparse = layer(r#"{"typo": 1, "key_00": "ok"}"#, false).unwrap();
        assert_eq!(sparse.len(), 1);
        assert_eq!(sparse["key_00"], RawValue::Json(json!("ok")));
    }

    #[test]
    fn empty_object_at_leaf_is_unknown() {
        let err = layer(r#"{"key_00": {}}"#, true).unwrap_err();
        assert!(matches!(err, StackfigError::UnknownKeys(_)));

        let sparse = layer(r#"{"key_00": {}, "key_01": "ok"}"#, false).unwrap();
        assert_eq!(sparse.len(), 1);
        assert!(!sparse.contains_key("key_00"));
    }

    #[test]
    fn empty_group_object_supplies_nothing() {
        let sparse = layer(r#"{"key_02": {}}"#, true).unwrap();
        assert!(sparse.is_empty());
    }

    #[test]
    fn later_file_wins_per_leaf() {
        let files = vec![
            (
                PathBuf::from("base.json"),
                r#"{"key_02": {"subkey_01": "base", "subkey_02": "base"}}"#.to_string(),
            ),
            (
                PathBuf::from("local.json"),
                r#"{"key_02": {"subkey_02": "local"}}"#.to_string(),
            ),
        ];
        let sparse = file_layer(&sample_fields(), &files, true).unwrap();
        assert_eq!(sparse["key_02.subkey_01"], RawValue::Json(json!("base")));
        assert_eq!(sparse["key_02.subkey_02"], RawValue::Json(json!("local")));
    }
}
