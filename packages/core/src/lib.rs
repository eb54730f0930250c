//! ValueSpace Core Value Model
//!
//! This crate provides a generic value model: arbitrary structured data held
//! as a uniform tree of tagged nodes that can be edited without a compile-time
//! schema, resolved against companion data, and converted to and from typed
//! host values.
//!
//! # Architecture
//!
//! - **Arena storage**: a [`ValueTree`](models::ValueTree) owns every node; children and
//!   parents are referenced by [`NodeId`](models::NodeId) handles
//! - **Context references**: leaves may alias another leaf by dotted path, resolved in two phases
//! - **Explicit descriptors**: host types opt into conversion through [`Reflect`](services::Reflect)
//! - **Serialized form**: subtrees round-trip through the JSON [`NodeSnapshot`](models::NodeSnapshot)
//!
//! # Modules
//!
//! - [`models`] - Nodes, the tree arena, identifiers and snapshots
//! - [`services`] - Reference resolution and the type bridge
//! - [`config`] - Tree configuration (name comparison policy)
//! - [`utils`] - Unique name generation

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{ModelConfig, NameComparison};
pub use models::*;
pub use services::*;

// Used by the `reflect_record!` expansion
#[doc(hidden)]
pub use indexmap::IndexMap;
