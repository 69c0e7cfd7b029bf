//! Mapping trees
//!
//! A mapping tree describes the shape of the output: every key is a
//! destination field, every value is either a path into the source object
//! or a nested tree. Whether a value is a leaf or a subtree is decided once,
//! when the tree is built, so the mapper only has to match on the variant.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{MapperError, json_type_name};
use crate::path::FieldPath;

/// One node of a mapping tree
#[derive(Debug, Clone, PartialEq)]
pub enum MappingNode {
    /// Copy the value found at this path
    Leaf(FieldPath),
    /// Build a nested object from the same source
    SubTree(Mappings),
}

/// Ordered destination keys and their mapping nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mappings {
    entries: Vec<(String, MappingNode)>,
}

impl Mappings {
    /// Create an empty mapping tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf: `field` receives the value at `path`
    pub fn field(mut self, field: impl Into<String>, path: impl Into<FieldPath>) -> Self {
        self.insert(field.into(), MappingNode::Leaf(path.into()));
        self
    }

    /// Add a subtree: `field` receives an object built from `mappings`
    pub fn nested(mut self, field: impl Into<String>, mappings: Mappings) -> Self {
        self.insert(field.into(), MappingNode::SubTree(mappings));
        self
    }

    /// Insert or replace a node, keeping the position of an existing key
    pub fn insert(&mut self, field: String, node: MappingNode) {
        match self.entries.iter_mut().find(|(k, _)| *k == field) {
            Some(entry) => entry.1 = node,
            None => self.entries.push((field, node)),
        }
    }

    /// Look up the node for a destination key
    pub fn get(&self, field: &str) -> Option<&MappingNode> {
        self.entries.iter().find(|(k, _)| k == field).map(|(_, node)| node)
    }

    /// Iterate destination keys in declared order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappingNode)> {
        self.entries.iter().map(|(k, node)| (k.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of leaf paths in the whole tree
    pub fn leaf_count(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, node)| match node {
                MappingNode::Leaf(_) => 1,
                MappingNode::SubTree(sub) => sub.leaf_count(),
            })
            .sum()
    }

    /// Build a tree from an untyped JSON object.
    ///
    /// Strings become leaves and objects become subtrees; anything else is
    /// rejected.
    pub fn from_json_map(map: &Map<String, Value>) -> Result<Self, MapperError> {
        let mut mappings = Mappings::new();
        for (field, value) in map {
            let node = match value {
                Value::String(path) => MappingNode::Leaf(FieldPath::parse(path)),
                Value::Object(sub) => MappingNode::SubTree(Mappings::from_json_map(sub)?),
                other => {
                    return Err(MapperError::InvalidMapping {
                        field: field.clone(),
                        found: json_type_name(other),
                    });
                }
            };
            mappings.insert(field.clone(), node);
        }
        debug!(fields = mappings.len(), "Parsed mapping tree");
        Ok(mappings)
    }

    /// Convert back to the untyped JSON form
    pub fn to_json(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|(field, node)| {
                let value = match node {
                    MappingNode::Leaf(path) => Value::String(path.as_str().to_string()),
                    MappingNode::SubTree(sub) => sub.to_json(),
                };
                (field.clone(), value)
            })
            .collect();
        Value::Object(map)
    }
}

impl serde::Serialize for Mappings {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Mappings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Mappings::from_json_map(&map).map_err(serde::de::Error::custom)
    }
}
