//! Flatten nested structures into dotted key paths.
//!
//! The same rule serves both sides of resolution: [`flatten_schema`] turns the
//! declared tree into the canonical leaf list, and [`flatten_value`] turns a
//! parsed JSON document (a config file, or any serialized struct) into sparse
//! dotted pairs that can be matched against that list.

use serde_json::{Map, Value};

use crate::schema::{LeafType, Node, Schema};

/// One leaf of the flattened schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    /// Dotted path, e.g. `key_02.subkey_01`.
    pub path: String,
    pub ty: LeafType,
    pub default: Value,
    pub doc: Vec<String>,
}

/// Flatten a schema into its leaves, depth-first in declaration order.
///
/// `{ key_00, key_02 { subkey_01, subkey_02 } }` becomes
/// `["key_00", "key_02.subkey_01", "key_02.subkey_02"]`.
pub fn flatten_schema(schema: &Schema) -> Vec<FieldPath> {
    let mut out = Vec::new();
    collect_leaves(schema.fields(), "", &mut out);
    out
}

fn collect_leaves(nodes: &[Node], prefix: &str, out: &mut Vec<FieldPath>) {
    for node in nodes {
        let path = dotted(prefix, node.name());
        match node {
            Node::Leaf {
                ty, default, doc, ..
            } => out.push(FieldPath {
                path,
                ty: *ty,
                default: default.clone(),
                doc: doc.clone(),
            }),
            Node::Group { children, .. } => collect_leaves(children, &path, out),
        }
    }
}

/// Flatten a JSON object into dotted key-value pairs.
///
/// Non-empty objects are recursed into; every other value (arrays, `null`
/// and nested empty objects included) is emitted as a leaf at its dotted
/// path. An empty root emits nothing.
///
/// `{"database": {"url": "pg://"}}` → `[("database.url", "pg://")]`
pub fn flatten_value(object: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    collect_pairs(object, "", &mut out);
    out
}

fn collect_pairs(object: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (key, value) in object {
        let path = dotted(prefix, key);
        match value {
            Value::Object(inner) if !inner.is_empty() => collect_pairs(inner, &path, out),
            other => out.push((path, other.clone())),
        }
    }
}

pub(crate) fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::sample_schema;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("Expected object, got {other}"),
        }
    }

    #[test]
    fn schema_paths_in_declaration_order() {
        let paths: Vec<String> = flatten_schema(&sample_schema())
            .into_iter()
            .map(|f| f.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "key_00",
                "key_01",
                "key_02.subkey_01",
                "key_02.subkey_02",
                "key_02.subkey_03",
                "key_03.subkey_00.subsubkey_00",
                "key_03.subkey_01.subsubkey_00",
                "key_03.subkey_01.subsubkey_01",
            ]
        );
    }

    #[test]
    fn schema_leaves_carry_type_and_default() {
        let fields = flatten_schema(&sample_schema());
        let leaf = fields.iter().find(|f| f.path == "key_02.subkey_03").unwrap();
        assert_eq!(leaf.ty, LeafType::String);
        assert_eq!(leaf.default, json!("layer_01_value_02_03"));
    }

    #[test]
    fn groups_are_not_leaves() {
        let fields = flatten_schema(&sample_schema());
        assert!(fields.iter().all(|f| f.path != "key_02"));
        assert!(fields.iter().all(|f| f.path != "key_03.subkey_01"));
    }

    #[test]
    fn flat_object() {
        let pairs = flatten_value(&object(json!({"a": "value_a", "n": 3})));
        assert_eq!(
            pairs,
            vec![("a".into(), json!("value_a")), ("n".into(), json!(3))]
        );
    }

    #[test]
    fn nested_object() {
        let pairs = flatten_value(&object(
            json!({"a": "value_a", "b": {"c": "value_c", "d": {"e": "value_e"}}}),
        ));
        assert_eq!(
            pairs,
            vec![
                ("a".into(), json!("value_a")),
                ("b.c".into(), json!("value_c")),
                ("b.d.e".into(), json!("value_e")),
            ]
        );
    }

    #[test]
    fn arrays_and_nulls_are_leaves() {
        let pairs = flatten_value(&object(json!({"list": [1, 2], "gone": null})));
        assert!(pairs.contains(&("list".into(), json!([1, 2]))));
        assert!(pairs.contains(&("gone".into(), Value::Null)));
    }

    #[test]
    fn nested_empty_object_is_a_leaf() {
        let pairs = flatten_value(&object(json!({"key_02": {}, "a": {"b": {}}})));
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&("a.b".into(), json!({}))));
        assert!(pairs.contains(&("key_02".into(), json!({}))));
        assert!(flatten_value(&Map::new()).is_empty());
    }
}
