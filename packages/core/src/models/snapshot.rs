//! Serialized Form
//!
//! [`NodeSnapshot`] is the detached, owned JSON shape of a subtree. Parent
//! handles are never part of it; they are rebuilt on restore.
//!
//! ## Example
//!
//! ```json
//! {
//!   "kind": "object",
//!   "properties": {
//!     "name": { "kind": "value", "dataType": "string", "value": "Ada" },
//!     "alias": { "kind": "value", "dataType": "string", "value": "", "contextReference": "name" },
//!     "status": { "kind": "enum", "selected": 1, "available": [
//!       { "index": 0, "name": "Open" }, { "index": 1, "name": "Done" }
//!     ] },
//!     "tags": {
//!       "kind": "array",
//!       "schema": { "kind": "value", "dataType": "string", "value": "" },
//!       "values": [ { "kind": "value", "dataType": "string", "value": "math" } ]
//!     }
//!   }
//! }
//! ```

use crate::models::array::ArrayNode;
use crate::models::error::TreeError;
use crate::models::node::{EnumMember, EnumNode, Node, NodeId, ValueNode};
use crate::models::object::{check_property_name, ObjectNode};
use crate::models::primitive::{PrimitiveKind, PrimitiveValue};
use crate::models::tree::ValueTree;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Owned, serializable copy of a subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeSnapshot {
    #[serde(rename_all = "camelCase")]
    Value {
        data_type: PrimitiveKind,
        value: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context_reference: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    Enum {
        selected: i64,
        available: Vec<EnumMember>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context_reference: Option<String>,
    },

    Array {
        schema: Box<NodeSnapshot>,
        #[serde(default)]
        values: Vec<NodeSnapshot>,
    },

    Object {
        #[serde(default)]
        properties: IndexMap<String, NodeSnapshot>,
    },
}

impl NodeSnapshot {
    /// Parse a snapshot from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, TreeError> {
        serde_json::from_str(json).map_err(|e| TreeError::invalid_snapshot(e.to_string()))
    }

    /// Pretty-printed JSON text
    pub fn to_json_string(&self) -> Result<String, TreeError> {
        serde_json::to_string_pretty(self).map_err(|e| TreeError::invalid_snapshot(e.to_string()))
    }
}

impl ValueTree {
    /// Serializable copy of the subtree at `id`
    pub fn snapshot(&self, id: NodeId) -> Result<NodeSnapshot, TreeError> {
        Ok(match self.node(id)? {
            Node::Value(leaf) => NodeSnapshot::Value {
                data_type: leaf.data_type,
                value: leaf.value.to_json(),
                context_reference: leaf.context_reference.clone(),
            },
            Node::Enum(enum_node) => NodeSnapshot::Enum {
                selected: enum_node.selected_index().unwrap_or_default(),
                available: enum_node.available.clone(),
                context_reference: enum_node.leaf.context_reference.clone(),
            },
            Node::Array(array) => NodeSnapshot::Array {
                schema: Box::new(self.snapshot(array.schema)?),
                values: array
                    .values
                    .iter()
                    .map(|value| self.snapshot(*value))
                    .collect::<Result<_, _>>()?,
            },
            Node::Object(object) => NodeSnapshot::Object {
                properties: object
                    .properties
                    .iter()
                    .map(|(name, child)| Ok((name.clone(), self.snapshot(*child)?)))
                    .collect::<Result<_, TreeError>>()?,
            },
        })
    }

    /// Rebuild a snapshot as a new detached subtree
    ///
    /// Property names are restored verbatim; a snapshot holding two names
    /// that collide under the tree's name comparison is rejected.
    pub fn restore(&mut self, snapshot: &NodeSnapshot) -> Result<NodeId, TreeError> {
        let watermark = self.watermark();
        match self.restore_into(snapshot, None) {
            Ok(id) => {
                tracing::debug!("Restored snapshot as {} ({} live nodes)", id, self.len());
                Ok(id)
            }
            Err(e) => {
                self.release_since(watermark);
                Err(e)
            }
        }
    }

    fn restore_into(
        &mut self,
        snapshot: &NodeSnapshot,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        match snapshot {
            NodeSnapshot::Value {
                data_type,
                value,
                context_reference,
            } => {
                let value = PrimitiveValue::from_json(*data_type, value)
                    .map_err(TreeError::invalid_snapshot)?;
                let leaf = ValueNode {
                    data_type: *data_type,
                    value,
                    context_reference: context_reference.clone(),
                };
                Ok(self.insert(Node::Value(leaf), parent))
            }
            NodeSnapshot::Enum {
                selected,
                available,
                context_reference,
            } => {
                let mut enum_node = EnumNode {
                    leaf: ValueNode::with_value(PrimitiveValue::Integer(0)),
                    available: available.clone(),
                };
                if !available.is_empty() && !enum_node.select_index(*selected) {
                    return Err(TreeError::invalid_snapshot(format!(
                        "enum selection {} is not an available member",
                        selected
                    )));
                }
                enum_node.leaf.context_reference = context_reference.clone();
                Ok(self.insert(Node::Enum(enum_node), parent))
            }
            NodeSnapshot::Array { schema, values } => {
                let array = self.insert(Node::Object(ObjectNode::default()), parent);
                let schema = self.restore_into(schema, Some(array))?;
                let mut restored = ArrayNode::new(schema);
                for value in values {
                    restored.values.push(self.restore_into(value, Some(array))?);
                }
                *self.node_mut(array)? = Node::Array(restored);
                Ok(array)
            }
            NodeSnapshot::Object { properties } => {
                let object = self.insert(Node::Object(ObjectNode::default()), parent);
                let comparison = self.config().name_comparison;
                let mut restored = ObjectNode::default();
                for (name, child) in properties {
                    check_property_name(name)
                        .map_err(|e| TreeError::invalid_snapshot(e.to_string()))?;
                    if restored.names().any(|existing| comparison.matches(existing, name)) {
                        return Err(TreeError::invalid_snapshot(format!(
                            "duplicate property name '{}'",
                            name
                        )));
                    }
                    let child = self.restore_into(child, Some(object))?;
                    restored.properties.insert(name.clone(), child);
                }
                *self.node_mut(object)? = Node::Object(restored);
                Ok(object)
            }
        }
    }

    /// Plain JSON view of the data (lossy)
    ///
    /// Objects become JSON objects, arrays JSON arrays of their elements,
    /// enums the selected member name, values their JSON scalar.
    pub fn to_plain_json(&self, id: NodeId) -> Result<serde_json::Value, TreeError> {
        Ok(match self.node(id)? {
            Node::Value(leaf) => leaf.value.to_plain_json(),
            Node::Enum(enum_node) => match enum_node.selected_name() {
                Some(name) => serde_json::Value::String(name.to_string()),
                None => serde_json::Value::Null,
            },
            Node::Array(array) => serde_json::Value::Array(
                array
                    .values
                    .iter()
                    .map(|value| self.to_plain_json(*value))
                    .collect::<Result<_, _>>()?,
            ),
            Node::Object(object) => {
                let mut map = serde_json::Map::new();
                for (name, child) in object.iter() {
                    map.insert(name.to_string(), self.to_plain_json(child)?);
                }
                serde_json::Value::Object(map)
            }
        })
    }
}
