//! Value Services
//!
//! This module contains the operations that work across a whole value tree:
//!
//! - `reference_resolver` - Flattening objects into dotted paths and resolving context references
//! - `reflect` - Host type descriptors (`Reflect`, `TypeDescriptor`, `HostValue`)
//! - `type_bridge` - Conversion between host values and value trees
//!
//! Services read and edit trees through the public `ValueTree` API and
//! report failures through the error types in `error`.

pub mod error;
pub mod reference_resolver;
pub mod reflect;
pub mod type_bridge;

pub use error::{BridgeError, ContextError};
pub use reference_resolver::{
    apply_context, apply_own_context, get_references, resolve_leaf, ContextMap, LeafReference,
};
pub use reflect::{
    DefaultFn, DescriptorFn, EnumMemberDescriptor, FieldDescriptor, HostValue, Reflect,
    TypeDescriptor, TypeShape,
};
pub use type_bridge::{export, from_node, from_node_with_context, import, template, to_node};
