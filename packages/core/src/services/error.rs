//! Service Layer Error Types
//!
//! This module defines error types for reference resolution and type
//! bridging. Structural failures from the tree itself are wrapped so callers
//! can propagate everything with `?`.

use crate::models::TreeError;
use thiserror::Error;

/// Context reference resolution errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContextError {
    /// Reference path does not exist in the context map
    #[error("Context reference not found: {path}")]
    ReferenceNotFound { path: String },

    /// Reference resolves to something that cannot supply the value
    #[error("Type mismatch for reference '{path}': {reason}")]
    TypeMismatch { path: String, reason: String },

    /// Reference chain revisits a path
    #[error("Circular context reference: {}", .chain.join(" -> "))]
    CircularReference { chain: Vec<String> },

    /// Structural tree failure
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl ContextError {
    /// Create a reference not found error
    pub fn reference_not_found(path: impl Into<String>) -> Self {
        Self::ReferenceNotFound { path: path.into() }
    }

    /// Create a type mismatch error
    pub fn type_mismatch(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeMismatch {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Host type conversion errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// Target type cannot structurally accept the node
    #[error("Unsupported target type {type_name}: {reason}")]
    UnsupportedTargetType { type_name: String, reason: String },

    /// Stored property has no matching member on the target type
    #[error("Type {type_name} has no member '{member}'")]
    MemberNotFound { type_name: String, member: String },

    /// Instance shape contradicts its descriptor
    #[error("Instance of {type_name} has unexpected shape: {found}")]
    InstanceMismatch { type_name: String, found: String },

    /// Stored enum ordinal is outside the target's members
    #[error("Enum {type_name} has no member at index {index}")]
    InvalidEnumIndex { type_name: String, index: i64 },

    /// Host enum value is not one of the declared members
    #[error("Enum {type_name} has no member with value {value}")]
    InvalidEnumValue { type_name: String, value: i64 },

    /// Host value cannot be converted to the requested type
    #[error("Value mismatch: expected {expected}, found {found}")]
    ValueMismatch { expected: String, found: String },

    /// Context resolution failed before conversion
    #[error("Context resolution failed: {0}")]
    Context(#[from] ContextError),

    /// Structural tree failure
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl BridgeError {
    /// Create an unsupported target type error
    pub fn unsupported_target(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedTargetType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a member not found error
    pub fn member_not_found(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self::MemberNotFound {
            type_name: type_name.into(),
            member: member.into(),
        }
    }

    /// Create an instance mismatch error
    pub fn instance_mismatch(type_name: impl Into<String>, found: impl Into<String>) -> Self {
        Self::InstanceMismatch {
            type_name: type_name.into(),
            found: found.into(),
        }
    }

    /// Create a value mismatch error
    pub fn value_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::ValueMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
