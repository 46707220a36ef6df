//! Explicit description of the configuration tree.
//!
//! A [`Schema`] is an ordered tree of [`Node`]s: groups hold children, leaves
//! hold a declared [`LeafType`] and a default value. It is built once at
//! startup and never mutated afterwards.
//!
//! Two ways to get one:
//!
//! ```ignore
//! // By hand.
//! let schema = Schema::builder()
//!     .string("host", "localhost")
//!     .group("server", |g| g.integer("port", 8080).boolean("tls", false))
//!     .build()?;
//!
//! // From a `#[derive(confique::Config)]` struct.
//! let schema = Schema::from_config::<AppConfig>()?;
//! ```
//!
//! With confique, the declared type of each leaf is read off its
//! `#[config(default = ...)]` expression, so every leaf needs a default.

use std::collections::{HashMap, HashSet};
use std::fmt;

use confique::Config;
use confique::meta::{FieldKind, LeafKind, Meta};
use serde_json::{Number, Value};

use crate::error::SchemaError;
use crate::flatten::dotted;
use crate::overrides::option_id;

/// Clap generates `--help` on every command.
const RESERVED_FLAG: &str = "help";

/// The primitive type a leaf's resolved value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafType {
    String,
    Integer,
    Float,
    Boolean,
}

impl LeafType {
    /// Classify a JSON scalar. Returns `None` for null, arrays and objects.
    pub fn of(value: &Value) -> Option<LeafType> {
        match value {
            Value::String(_) => Some(LeafType::String),
            Value::Bool(_) => Some(LeafType::Boolean),
            Value::Number(n) if n.is_f64() => Some(LeafType::Float),
            Value::Number(_) => Some(LeafType::Integer),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for LeafType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LeafType::String => "string",
            LeafType::Integer => "integer",
            LeafType::Float => "float",
            LeafType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A named field in the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf {
        name: String,
        ty: LeafType,
        default: Value,
        doc: Vec<String>,
    },
    Group {
        name: String,
        doc: Vec<String>,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Leaf { name, .. } | Node::Group { name, .. } => name,
        }
    }

    pub fn doc(&self) -> &[String] {
        match self {
            Node::Leaf { doc, .. } | Node::Group { doc, .. } => doc,
        }
    }

    fn doc_mut(&mut self) -> &mut Vec<String> {
        match self {
            Node::Leaf { doc, .. } | Node::Group { doc, .. } => doc,
        }
    }
}

/// A validated configuration tree. The root is an unnamed group.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<Node>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Derive the schema from a confique config struct's metadata.
    pub fn from_config<C: Config>() -> Result<Schema, SchemaError> {
        Schema::from_meta(&C::META)
    }

    pub fn from_meta(meta: &Meta) -> Result<Schema, SchemaError> {
        let fields = nodes_from_meta(meta, "")?;
        Schema::new(fields)
    }

    /// Validate a hand-assembled node list.
    pub fn new(fields: Vec<Node>) -> Result<Schema, SchemaError> {
        validate_nodes(&fields, "")?;
        check_option_ids(&fields)?;
        Ok(Schema { fields })
    }

    /// Top-level fields in declaration order.
    pub fn fields(&self) -> &[Node] {
        &self.fields
    }

    /// Look up a node (leaf or group) by dotted path.
    pub fn node(&self, dotted_key: &str) -> Option<&Node> {
        let mut nodes = self.fields.as_slice();
        let mut found = None;
        for segment in dotted_key.split('.') {
            let node = nodes.iter().find(|n| n.name() == segment)?;
            nodes = match node {
                Node::Group { children, .. } => children,
                Node::Leaf { .. } => &[],
            };
            found = Some(node);
        }
        found
    }
}

/// Fluent construction of a [`Schema`]. Fields keep the order they are added in.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Node>,
}

impl SchemaBuilder {
    pub fn string(self, name: &str, default: &str) -> Self {
        self.leaf(name, LeafType::String, Value::String(default.to_string()))
    }

    pub fn integer(self, name: &str, default: i64) -> Self {
        self.leaf(name, LeafType::Integer, Value::Number(default.into()))
    }

    /// Non-finite defaults cannot be represented and are rejected by [`build`](Self::build).
    pub fn float(self, name: &str, default: f64) -> Self {
        let value = Number::from_f64(default).map_or(Value::Null, Value::Number);
        self.leaf(name, LeafType::Float, value)
    }

    pub fn boolean(self, name: &str, default: bool) -> Self {
        self.leaf(name, LeafType::Boolean, Value::Bool(default))
    }

    /// Attach a documentation line to the most recently added field.
    pub fn doc(mut self, line: &str) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.doc_mut().push(line.to_string());
        }
        self
    }

    /// Add a nested group whose fields are declared by `build`.
    pub fn group(mut self, name: &str, build: impl FnOnce(SchemaBuilder) -> SchemaBuilder) -> Self {
        let children = build(SchemaBuilder::default()).fields;
        self.fields.push(Node::Group {
            name: name.to_string(),
            doc: Vec::new(),
            children,
        });
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        Schema::new(self.fields)
    }

    fn leaf(mut self, name: &str, ty: LeafType, default: Value) -> Self {
        self.fields.push(Node::Leaf {
            name: name.to_string(),
            ty,
            default,
            doc: Vec::new(),
        });
        self
    }
}

fn nodes_from_meta(meta: &Meta, prefix: &str) -> Result<Vec<Node>, SchemaError> {
    let mut nodes = Vec::with_capacity(meta.fields.len());
    for field in meta.fields {
        let path = dotted(prefix, field.name);
        let doc: Vec<String> = field.doc.iter().map(|line| line.trim().to_string()).collect();
        let node = match &field.kind {
            FieldKind::Leaf {
                kind:
                    LeafKind::Required {
                        default: Some(expr),
                        ..
                    },
                ..
            } => {
                let default =
                    serde_json::to_value(expr).map_err(|e| SchemaError::UnsupportedDefault {
                        path: path.clone(),
                        found: e.to_string(),
                    })?;
                let ty = LeafType::of(&default).ok_or_else(|| SchemaError::UnsupportedDefault {
                    path: path.clone(),
                    found: shape(&default).to_string(),
                })?;
                Node::Leaf {
                    name: field.name.to_string(),
                    ty,
                    default,
                    doc,
                }
            }
            FieldKind::Leaf { .. } => return Err(SchemaError::MissingDefault { path }),
            FieldKind::Nested { meta, .. } => Node::Group {
                name: field.name.to_string(),
                doc,
                children: nodes_from_meta(meta, &path)?,
            },
        };
        nodes.push(node);
    }
    Ok(nodes)
}

fn validate_nodes(nodes: &[Node], prefix: &str) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for node in nodes {
        let name = node.name();
        if name.is_empty() || name.contains('.') || name.chars().any(char::is_whitespace) {
            return Err(SchemaError::InvalidSegment {
                parent: prefix.to_string(),
                segment: name.to_string(),
            });
        }
        let path = dotted(prefix, name);
        if !seen.insert(name) {
            return Err(SchemaError::DuplicatePath { path });
        }
        match node {
            Node::Leaf { ty, default, .. } => {
                if LeafType::of(default) != Some(*ty) {
                    return Err(SchemaError::UnsupportedDefault {
                        path,
                        found: shape(default).to_string(),
                    });
                }
            }
            Node::Group { children, .. } => {
                if children.is_empty() {
                    return Err(SchemaError::EmptyGroup { path });
                }
                validate_nodes(children, &path)?;
            }
        }
    }
    Ok(())
}

/// Each leaf needs its own clap option id, and `--help` belongs to clap.
fn check_option_ids(nodes: &[Node]) -> Result<(), SchemaError> {
    let mut paths = Vec::new();
    leaf_paths(nodes, "", &mut paths);
    let mut ids: HashMap<String, String> = HashMap::new();
    for path in paths {
        if path == RESERVED_FLAG {
            return Err(SchemaError::ReservedName { path });
        }
        let id = option_id(&path);
        if let Some(first) = ids.get(&id) {
            return Err(SchemaError::OptionIdCollision {
                first: first.clone(),
                second: path,
                id,
            });
        }
        ids.insert(id, path);
    }
    Ok(())
}

fn leaf_paths(nodes: &[Node], prefix: &str, out: &mut Vec<String>) {
    for node in nodes {
        let path = dotted(prefix, node.name());
        match node {
            Node::Leaf { .. } => out.push(path),
            Node::Group { children, .. } => leaf_paths(children, &path, out),
        }
    }
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
