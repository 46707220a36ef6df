//! Turn resolved raw values into typed JSON and rebuild the nested tree.
//!
//! Text sources (environment, command line) are parsed according to the
//! leaf's declared type. JSON sources (file, defaults) are checked and
//! normalized: a JSON string is treated like text, an integral float fills an
//! integer leaf, an integer fills a float leaf.

use serde_json::{Map, Number, Value};

use crate::error::StackfigError;
use crate::flatten::dotted;
use crate::merge::Resolved;
use crate::schema::{LeafType, Node, Schema};
use crate::types::{Layer, RawValue};

/// Convert one raw value into the declared type.
pub fn coerce(
    path: &str,
    raw: &RawValue,
    ty: LeafType,
    layer: Layer,
) -> Result<Value, StackfigError> {
    let coerced = match raw {
        RawValue::Text(text) => coerce_text(text, ty),
        RawValue::Json(value) => coerce_json(value, ty),
    };
    coerced.ok_or_else(|| StackfigError::Coercion {
        key: path.to_string(),
        value: raw.to_string(),
        layer,
        expected: ty,
    })
}

fn coerce_text(text: &str, ty: LeafType) -> Option<Value> {
    match ty {
        LeafType::String => Some(Value::String(text.to_string())),
        LeafType::Integer => parse_integer(text.trim()),
        LeafType::Float => parse_float(text.trim()),
        LeafType::Boolean => parse_bool(text.trim()).map(Value::Bool),
    }
}

fn coerce_json(value: &Value, ty: LeafType) -> Option<Value> {
    if let Value::String(text) = value {
        return coerce_text(text, ty);
    }
    match (ty, value) {
        (LeafType::Integer, Value::Number(n)) if n.is_f64() => {
            // `i64::MAX as f64` rounds up to 2^63, so the upper bounds are exclusive.
            let f = n.as_f64()?;
            if f.fract() != 0.0 {
                None
            } else if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Some(Value::Number((f as i64).into()))
            } else if f >= 0.0 && f < u64::MAX as f64 {
                Some(Value::Number((f as u64).into()))
            } else {
                None
            }
        }
        (LeafType::Integer, Value::Number(_)) => Some(value.clone()),
        (LeafType::Float, Value::Number(n)) => n.as_f64().and_then(Number::from_f64).map(Value::Number),
        (LeafType::Boolean, Value::Bool(_)) => Some(value.clone()),
        (LeafType::Boolean, Value::Number(n)) => match n.as_u64() {
            Some(0) => Some(Value::Bool(false)),
            Some(1) => Some(Value::Bool(true)),
            _ => None,
        },
        _ => None,
    }
}

fn parse_integer(text: &str) -> Option<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    text.parse::<u64>().ok().map(|u| Value::Number(u.into()))
}

fn parse_float(text: &str) -> Option<Value> {
    let f = text.parse::<f64>().ok()?;
    Number::from_f64(f).map(Value::Number)
}

/// Case-insensitive `true`/`false`/`1`/`0`.
fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Some(false)
    } else {
        None
    }
}

/// Rebuild the nested configuration from the resolved flat mapping.
///
/// Every group becomes a JSON object of its children; every leaf is coerced
/// to its declared type. The first value that fails to coerce aborts
/// assembly.
pub fn assemble(schema: &Schema, resolved: &Resolved) -> Result<Value, StackfigError> {
    assemble_group(schema.fields(), "", resolved).map(Value::Object)
}

fn assemble_group(
    nodes: &[Node],
    prefix: &str,
    resolved: &Resolved,
) -> Result<Map<String, Value>, StackfigError> {
    let mut object = Map::new();
    for node in nodes {
        let path = dotted(prefix, node.name());
        let value = match node {
            Node::Leaf { ty, .. } => {
                let leaf = resolved
                    .get(&path)
                    .ok_or_else(|| StackfigError::KeyNotFound(path.clone()))?;
                coerce(&path, &leaf.value, *ty, leaf.layer)?
            }
            Node::Group { children, .. } => {
                Value::Object(assemble_group(children, &path, resolved)?)
            }
        };
        object.insert(node.name().to_string(), value);
    }
    Ok(object)
}
