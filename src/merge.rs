use std::collections::HashMap;

use tracing::trace;

use crate::flatten::FieldPath;
use crate::types::{Layer, RawValue, Sparse};

/// The winning value for one leaf and the layer it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLeaf {
    pub path: String,
    pub value: RawValue,
    pub layer: Layer,
}

/// Every leaf of the schema with its winning raw value, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    leaves: Vec<ResolvedLeaf>,
}

impl Resolved {
    pub fn get(&self, path: &str) -> Option<&ResolvedLeaf> {
        self.leaves.iter().find(|leaf| leaf.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedLeaf> {
        self.leaves.iter()
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

/// Fold sparse layers onto the schema defaults, last writer wins per leaf.
///
/// Layers are applied in ascending precedence regardless of the order they
/// are passed in. Each override replaces exactly one leaf, so a higher layer
/// setting `a.b` leaves a lower layer's `a.c` untouched. Values are never
/// inspected, only the presence of a key. Keys outside the schema are dropped.
pub fn merge_layers(fields: &[FieldPath], layers: Vec<(Layer, Sparse)>) -> Resolved {
    let mut leaves: Vec<ResolvedLeaf> = fields
        .iter()
        .map(|f| ResolvedLeaf {
            path: f.path.clone(),
            value: RawValue::Json(f.default.clone()),
            layer: Layer::Default,
        })
        .collect();
    let index: HashMap<String, usize> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.path.clone(), i))
        .collect();

    let mut layers = layers;
    layers.sort_by_key(|(layer, _)| *layer);

    for (layer, sparse) in layers {
        for (path, value) in sparse {
            let Some(&i) = index.get(&path) else {
                trace!(%layer, key = %path, "dropping value for unknown key");
                continue;
            };
            trace!(%layer, key = %path, "override");
            leaves[i].value = value;
            leaves[i].layer = layer;
        }
    }

    Resolved { leaves }
}
