//! Node Data Structures
//!
//! This module defines the tagged-union element of a value tree and its leaf
//! payloads.
//!
//! # Architecture
//!
//! - **Arena storage**: nodes live in a [`ValueTree`](crate::models::ValueTree) and are
//!   addressed by [`NodeId`]
//! - **Downward ownership**: containers hold the ids of their children
//! - **Upward relation**: every slot records its parent id (creation context, not ownership)
//!
//! # Examples
//!
//! ```rust
//! use valuespace_core::models::{Node, PrimitiveKind, ValueNode};
//!
//! let leaf = Node::Value(ValueNode::new(PrimitiveKind::Integer));
//! assert!(leaf.is_leaf());
//! assert_eq!(leaf.as_leaf().unwrap().value.as_integer(), Some(0));
//! ```

use crate::models::array::ArrayNode;
use crate::models::object::ObjectNode;
use crate::models::primitive::{PrimitiveKind, PrimitiveValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a node inside its owning [`ValueTree`](crate::models::ValueTree)
///
/// A handle pairs an arena index with the generation of the slot. Freed
/// slots are reused under a new generation, so a handle to a removed node
/// stays invalid instead of silently pointing at a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Raw arena index
    pub fn index(self) -> usize {
        self.index
    }

    /// Reuse count of the slot this handle was issued for
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            0 => write!(f, "#{}", self.index),
            generation => write!(f, "#{}v{}", self.index, generation),
        }
    }
}

/// Kind of node that editing operations can create from scratch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Primitive(PrimitiveKind),
    Array,
    Object,
}

impl From<PrimitiveKind> for NodeKind {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}

/// Leaf node holding a single primitive value
#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    /// Declared kind of `value`
    pub data_type: PrimitiveKind,

    /// Current value (always of kind `data_type`)
    pub value: PrimitiveValue,

    /// Dotted path of another leaf this value is taken from at resolution time
    pub context_reference: Option<String>,
}

impl ValueNode {
    /// Leaf of `kind` holding the kind's default value
    pub fn new(kind: PrimitiveKind) -> Self {
        Self::with_value(PrimitiveValue::default_for(kind))
    }

    /// Leaf holding `value`
    pub fn with_value(value: PrimitiveValue) -> Self {
        Self {
            data_type: value.kind(),
            value,
            context_reference: None,
        }
    }

    /// The trimmed context reference, if one is set and not blank
    pub fn reference(&self) -> Option<&str> {
        self.context_reference
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty())
    }
}

/// One selectable member of an enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    /// Ordinal position of the member
    pub index: i64,

    /// Display name of the member
    pub name: String,
}

impl EnumMember {
    pub fn new(index: i64, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

/// Leaf node selecting one of a fixed list of members
///
/// The selected ordinal is stored as an `Integer` leaf so enum nodes take
/// part in context resolution like any other leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumNode {
    /// Selected ordinal (`data_type` is always `Integer`)
    pub leaf: ValueNode,

    /// Members in declaration order
    pub available: Vec<EnumMember>,
}

impl EnumNode {
    /// Enum over `names`, selecting the first member
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let available = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| EnumMember::new(index as i64, name))
            .collect();

        Self {
            leaf: ValueNode::with_value(PrimitiveValue::Integer(0)),
            available,
        }
    }

    /// Currently selected ordinal
    pub fn selected_index(&self) -> Option<i64> {
        self.leaf.value.as_integer()
    }

    /// Member matching the selected ordinal
    pub fn selected(&self) -> Option<&EnumMember> {
        let index = self.selected_index()?;
        self.available.iter().find(|member| member.index == index)
    }

    /// Name of the selected member
    pub fn selected_name(&self) -> Option<&str> {
        self.selected().map(|member| member.name.as_str())
    }

    /// Select a member by ordinal, returning `false` if no member has it
    pub fn select_index(&mut self, index: i64) -> bool {
        if self.available.iter().any(|member| member.index == index) {
            self.leaf.value = PrimitiveValue::Integer(index);
            true
        } else {
            false
        }
    }

    /// Select a member by name, returning `false` if no member has it
    pub fn select_name(&mut self, name: &str) -> bool {
        match self.available.iter().find(|member| member.name == name) {
            Some(member) => {
                self.leaf.value = PrimitiveValue::Integer(member.index);
                true
            }
            None => false,
        }
    }
}

/// Element of a value tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Value(ValueNode),
    Enum(EnumNode),
    Array(ArrayNode),
    Object(ObjectNode),
}

impl Node {
    /// Short variant name used in diagnostics
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Enum(_) => "enum",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Whether this node is a leaf (`Value` or `Enum`)
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Value(_) | Self::Enum(_))
    }

    /// Leaf payload of `Value` and `Enum` nodes
    pub fn as_leaf(&self) -> Option<&ValueNode> {
        match self {
            Self::Value(leaf) => Some(leaf),
            Self::Enum(node) => Some(&node.leaf),
            _ => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut ValueNode> {
        match self {
            Self::Value(leaf) => Some(leaf),
            Self::Enum(node) => Some(&mut node.leaf),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumNode> {
        match self {
            Self::Enum(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayNode> {
        match self {
            Self::Array(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Self::Object(node) => Some(node),
            _ => None,
        }
    }

    /// Ids of direct children (array schema first, then values; object properties in order)
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::Value(_) | Self::Enum(_) => Vec::new(),
            Self::Array(array) => std::iter::once(array.schema)
                .chain(array.values.iter().copied())
                .collect(),
            Self::Object(object) => object.properties.values().copied().collect(),
        }
    }
}
