//! Data Models
//!
//! This module contains the value model used throughout ValueSpace:
//!
//! - `ValueTree` - Arena owning every node, addressed by `NodeId`
//! - `Node` - Tagged union of value, enum, array and object nodes
//! - `Property` / `Index` - Identifiers for editing children of containers
//! - `NodeSnapshot` - Serializable form of a subtree
//!
//! Structure is edited through methods on [`ValueTree`]; the node types
//! themselves are read-only views outside this crate.

mod array;
mod error;
mod identifier;
mod node;
mod object;
mod primitive;
mod snapshot;
mod tree;

pub use array::ArrayNode;
pub use error::TreeError;
pub use identifier::{Identifier, Index, Property};
pub use node::{EnumMember, EnumNode, Node, NodeId, NodeKind, ValueNode};
pub use object::ObjectNode;
pub use primitive::{PrimitiveKind, PrimitiveValue};
pub use snapshot::NodeSnapshot;
pub use tree::ValueTree;
