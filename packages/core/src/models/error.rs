//! Structural Error Types
//!
//! Errors raised by tree operations: stale handles, wrong node variants,
//! ownership violations and malformed snapshots.

use crate::models::node::NodeId;
use crate::models::primitive::PrimitiveKind;
use thiserror::Error;

/// Structural errors for value tree operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// Handle does not point at a live node
    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// Node is not of the variant an operation requires
    #[error("Node {id} is a {found} node, expected {expected}")]
    UnexpectedVariant {
        id: NodeId,
        expected: &'static str,
        found: &'static str,
    },

    /// Value kind does not match the leaf's declared kind
    #[error("Kind mismatch on node {id}: expected {expected}, found {found}")]
    KindMismatch {
        id: NodeId,
        expected: PrimitiveKind,
        found: PrimitiveKind,
    },

    /// Node already belongs to a container
    #[error("Node {id} is already attached to {parent}")]
    AlreadyAttached { id: NodeId, parent: NodeId },

    /// Attaching would make a node its own ancestor
    #[error("Attaching {child} under {parent} would create a cycle")]
    WouldCreateCycle { child: NodeId, parent: NodeId },

    /// Identifier refuses removal
    #[error("Child '{name}' cannot be removed")]
    NotRemovable { name: String },

    /// Name cannot be used for a property
    #[error("Invalid property name '{name}': {reason}")]
    InvalidPropertyName { name: String, reason: String },

    /// Property does not exist
    #[error("Property not found: {name}")]
    PropertyNotFound { name: String },

    /// Array index past the end
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Enum member does not exist
    #[error("Enum member not found: {member}")]
    EnumMemberNotFound { member: String },

    /// Snapshot carries a value that cannot be restored
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TreeError {
    /// Create a node not found error
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NodeNotFound { id }
    }

    /// Create an unexpected variant error
    pub fn unexpected_variant(id: NodeId, expected: &'static str, found: &'static str) -> Self {
        Self::UnexpectedVariant {
            id,
            expected,
            found,
        }
    }

    /// Create a not removable error
    pub fn not_removable(name: impl Into<String>) -> Self {
        Self::NotRemovable { name: name.into() }
    }

    /// Create a property not found error
    pub fn property_not_found(name: impl Into<String>) -> Self {
        Self::PropertyNotFound { name: name.into() }
    }

    /// Create an invalid property name error
    pub fn invalid_property_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPropertyName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid snapshot error
    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        Self::InvalidSnapshot(msg.into())
    }
}
