//! Value Tree Arena
//!
//! [`ValueTree`] owns every node of one or more value trees. Containers own
//! their children through [`NodeId`] handles and every slot keeps the id of
//! its parent, so upward lookups never extend a node's lifetime.
//!
//! # Architecture
//!
//! - **Slots**: generational entries; a freed slot goes on a free list and its generation
//!   is bumped, so handles to the old node stay invalid after the slot is reused
//! - **Attached vs detached**: a node is attached when its parent's collection lists it;
//!   clones keep their original's parent id but start detached
//! - **Destruction**: removing a child frees its whole subtree
//!
//! # Examples
//!
//! ```rust
//! use valuespace_core::models::{PrimitiveKind, ValueTree};
//!
//! let mut tree = ValueTree::new();
//! let root = tree.create_object();
//! let name = tree.create_property(root, "Name", PrimitiveKind::String.into())?;
//!
//! assert_eq!(tree.parent(name.element), Some(root));
//! assert_eq!(tree.path_of(name.element).as_deref(), Some("Name"));
//! # Ok::<(), valuespace_core::models::TreeError>(())
//! ```

use crate::config::ModelConfig;
use crate::models::array::ArrayNode;
use crate::models::error::TreeError;
use crate::models::node::{EnumNode, Node, NodeId, NodeKind, ValueNode};
use crate::models::object::ObjectNode;
use crate::models::primitive::{PrimitiveKind, PrimitiveValue};

#[derive(Debug, Clone)]
struct Slot {
    parent: Option<NodeId>,
    node: Node,

    /// Allocation sequence number, compared against watermarks
    born: u64,
}

#[derive(Debug, Clone, Default)]
struct Entry {
    generation: u32,
    slot: Option<Slot>,
}

/// Arena owning value tree nodes
#[derive(Debug, Clone, Default)]
pub struct ValueTree {
    entries: Vec<Entry>,
    free: Vec<usize>,
    allocations: u64,
    live: usize,
    config: ModelConfig,
}

impl ValueTree {
    /// Empty tree with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty tree with a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `TreeError::InvalidConfig` if `config.validate()` fails.
    pub fn with_config(config: ModelConfig) -> Result<Self, TreeError> {
        config.validate().map_err(TreeError::InvalidConfig)?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Whether `id` points at a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).map(|slot| &slot.node)
    }

    /// Node behind `id`
    ///
    /// # Errors
    ///
    /// Returns `TreeError::NodeNotFound` for stale handles.
    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::node_not_found(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.slot_mut(id)
            .map(|slot| &mut slot.node)
            .ok_or(TreeError::node_not_found(id))
    }

    /// Leaf payload of a `Value` or `Enum` node
    pub fn leaf(&self, id: NodeId) -> Result<&ValueNode, TreeError> {
        let node = self.node(id)?;
        node.as_leaf()
            .ok_or_else(|| TreeError::unexpected_variant(id, "leaf", node.variant_name()))
    }

    /// Current value of a leaf
    pub fn value(&self, id: NodeId) -> Result<&PrimitiveValue, TreeError> {
        self.leaf(id).map(|leaf| &leaf.value)
    }

    /// Parent id recorded for `id` (set for attached nodes and for clones)
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.parent)
    }

    /// Parent chain of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            // A parent id can outlive its node once that node is removed
            if !self.contains(parent) || chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.parent(parent);
        }
        chain
    }

    /// Nearest ancestor that is an object node
    pub fn enclosing_object(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .into_iter()
            .find(|ancestor| matches!(self.get(*ancestor), Some(Node::Object(_))))
    }

    /// Whether `id` is listed in its parent's collection
    pub fn is_attached(&self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        match self.get(parent) {
            Some(Node::Object(object)) => object.properties.values().any(|child| *child == id),
            Some(Node::Array(array)) => array.schema == id || array.values.contains(&id),
            _ => false,
        }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Detached leaf holding the default value of `kind`
    pub fn create_value(&mut self, kind: PrimitiveKind) -> NodeId {
        self.insert(Node::Value(ValueNode::new(kind)), None)
    }

    /// Detached leaf holding `value`
    pub fn create_leaf(&mut self, value: impl Into<PrimitiveValue>) -> NodeId {
        self.insert(Node::Value(ValueNode::with_value(value.into())), None)
    }

    /// Detached enum over `names`, selecting the first member
    pub fn create_enum<I, S>(&mut self, names: I) -> NodeId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(Node::Enum(EnumNode::new(names)), None)
    }

    /// Detached empty object
    pub fn create_object(&mut self) -> NodeId {
        self.insert(Node::Object(ObjectNode::default()), None)
    }

    /// Detached empty array whose schema is a default node of `schema_kind`
    pub fn create_array(&mut self, schema_kind: NodeKind) -> NodeId {
        let schema = self.create_default(schema_kind);
        let array = self.insert(Node::Array(ArrayNode::new(schema)), None);
        self.set_parent(schema, Some(array));
        array
    }

    /// Detached array around an existing detached schema node
    pub fn create_array_with_schema(&mut self, schema: NodeId) -> Result<NodeId, TreeError> {
        if !self.contains(schema) {
            return Err(TreeError::node_not_found(schema));
        }
        if self.is_attached(schema) {
            if let Some(parent) = self.parent(schema) {
                return Err(TreeError::AlreadyAttached { id: schema, parent });
            }
        }

        let array = self.insert(Node::Array(ArrayNode::new(schema)), None);
        self.set_parent(schema, Some(array));
        Ok(array)
    }

    /// Detached default node of `kind`
    ///
    /// Arrays created this way use a string leaf as their schema.
    pub fn create_default(&mut self, kind: NodeKind) -> NodeId {
        match kind {
            NodeKind::Primitive(kind) => self.create_value(kind),
            NodeKind::Array => self.create_array(NodeKind::Primitive(PrimitiveKind::String)),
            NodeKind::Object => self.create_object(),
        }
    }

    // ========================================================================
    // Cloning and removal
    // ========================================================================

    /// Deep copy of the subtree at `id`
    ///
    /// The copy records the same parent as the original but is not inserted
    /// into the parent's collection.
    pub fn clone_node(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        let parent = self.slot(id).ok_or(TreeError::node_not_found(id))?.parent;
        let copy = self.copy_subtree(id, parent)?;
        tracing::trace!("Cloned node {} into {}", id, copy);
        Ok(copy)
    }

    /// Remove `id` from its parent (if attached) and free its subtree
    ///
    /// # Errors
    ///
    /// Returns `TreeError::NotRemovable` for an array's schema.
    pub fn discard(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.contains(id) {
            return Err(TreeError::node_not_found(id));
        }

        if self.is_attached(id) {
            if let Some(parent) = self.parent(id) {
                let schema_name = self.config.schema_property_name.clone();
                match self.node_mut(parent)? {
                    Node::Object(object) => object.properties.retain(|_, child| *child != id),
                    Node::Array(array) => {
                        if array.schema == id {
                            return Err(TreeError::not_removable(schema_name));
                        }
                        array.values.retain(|child| *child != id);
                    }
                    _ => {}
                }
            }
        }

        self.free_subtree(id);
        Ok(())
    }

    pub(crate) fn copy_subtree(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        let original = self.node(id)?.clone();
        let copy = self.insert(original.clone(), parent);

        match original {
            Node::Value(_) | Node::Enum(_) => {}
            Node::Array(array) => {
                let schema = self.copy_subtree(array.schema, Some(copy))?;
                let mut values = Vec::with_capacity(array.values.len());
                for value in &array.values {
                    values.push(self.copy_subtree(*value, Some(copy))?);
                }
                *self.node_mut(copy)? = Node::Array(ArrayNode { schema, values });
            }
            Node::Object(object) => {
                let mut copied = ObjectNode::default();
                for (name, child) in &object.properties {
                    let child_copy = self.copy_subtree(*child, Some(copy))?;
                    copied.properties.insert(name.clone(), child_copy);
                }
                *self.node_mut(copy)? = Node::Object(copied);
            }
        }

        Ok(copy)
    }

    pub(crate) fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(slot) = self.release(current) {
                pending.extend(slot.node.children());
            }
        }
    }

    pub(crate) fn insert(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        let slot = Slot {
            parent,
            node,
            born: self.allocations,
        };
        self.allocations += 1;
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index];
            entry.slot = Some(slot);
            return NodeId::new(index, entry.generation);
        }

        self.entries.push(Entry {
            generation: 0,
            slot: Some(slot),
        });
        NodeId::new(self.entries.len() - 1, 0)
    }

    /// Free a single slot, bumping its generation
    fn release(&mut self, id: NodeId) -> Option<Slot> {
        let entry = self.entries.get_mut(id.index())?;
        if entry.generation != id.generation() {
            return None;
        }
        let slot = entry.slot.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index());
        self.live -= 1;
        Some(slot)
    }

    /// Current allocation mark, see [`ValueTree::release_since`]
    pub(crate) fn watermark(&self) -> u64 {
        self.allocations
    }

    /// Free every node allocated after `watermark` (used to roll back failed builds)
    pub(crate) fn release_since(&mut self, watermark: u64) {
        let young: Vec<NodeId> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match &entry.slot {
                Some(slot) if slot.born >= watermark => {
                    Some(NodeId::new(index, entry.generation))
                }
                _ => None,
            })
            .collect();
        for id in young {
            self.release(id);
        }
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(slot) = self.slot_mut(id) {
            slot.parent = parent;
        }
    }

    /// Check that `child` may be placed under `parent`
    pub(crate) fn ensure_attachable(&self, child: NodeId, parent: NodeId) -> Result<(), TreeError> {
        if !self.contains(child) {
            return Err(TreeError::node_not_found(child));
        }
        if self.is_attached(child) {
            if let Some(current) = self.parent(child) {
                return Err(TreeError::AlreadyAttached { id: child, parent: current });
            }
        }
        if child == parent || self.ancestors(parent).contains(&child) {
            return Err(TreeError::WouldCreateCycle { child, parent });
        }
        Ok(())
    }

    // ========================================================================
    // Leaf editing
    // ========================================================================

    /// Replace a leaf's value
    ///
    /// # Errors
    ///
    /// Returns `TreeError::KindMismatch` if `value` is not of the leaf's kind.
    pub fn set_value(
        &mut self,
        id: NodeId,
        value: impl Into<PrimitiveValue>,
    ) -> Result<(), TreeError> {
        let value = value.into();
        let node = self.node_mut(id)?;
        let variant = node.variant_name();

        if let Node::Enum(enum_node) = &mut *node {
            let index = value.as_integer().ok_or(TreeError::KindMismatch {
                id,
                expected: PrimitiveKind::Integer,
                found: value.kind(),
            })?;
            if !enum_node.select_index(index) {
                return Err(TreeError::EnumMemberNotFound {
                    member: index.to_string(),
                });
            }
            return Ok(());
        }

        let leaf = node
            .as_leaf_mut()
            .ok_or_else(|| TreeError::unexpected_variant(id, "leaf", variant))?;
        if leaf.data_type != value.kind() {
            return Err(TreeError::KindMismatch {
                id,
                expected: leaf.data_type,
                found: value.kind(),
            });
        }
        leaf.value = value;
        Ok(())
    }

    /// Set or clear a leaf's context reference (not validated until resolution)
    pub fn set_context_reference(
        &mut self,
        id: NodeId,
        reference: Option<String>,
    ) -> Result<(), TreeError> {
        let node = self.node_mut(id)?;
        let variant = node.variant_name();
        let leaf = node
            .as_leaf_mut()
            .ok_or_else(|| TreeError::unexpected_variant(id, "leaf", variant))?;
        leaf.context_reference = reference;
        Ok(())
    }

    /// Select an enum member by name
    pub fn select_enum_member(&mut self, id: NodeId, name: &str) -> Result<(), TreeError> {
        let node = self.node_mut(id)?;
        let variant = node.variant_name();
        let Node::Enum(enum_node) = node else {
            return Err(TreeError::unexpected_variant(id, "enum", variant));
        };
        if enum_node.select_name(name) {
            Ok(())
        } else {
            Err(TreeError::EnumMemberNotFound {
                member: name.to_string(),
            })
        }
    }

    // ========================================================================
    // Paths
    // ========================================================================

    /// Dotted path of `id` from the top of its attached chain
    ///
    /// Array elements contribute their position, array schemas the configured
    /// schema property name. Returns `None` for stale handles.
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        self.slot(id)?;

        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            let segment = match self.get(parent) {
                Some(Node::Object(object)) => object
                    .properties
                    .iter()
                    .find(|(_, child)| **child == current)
                    .map(|(name, _)| name.clone()),
                Some(Node::Array(array)) if array.schema == current => {
                    Some(self.config.schema_property_name.clone())
                }
                Some(Node::Array(array)) => array
                    .values
                    .iter()
                    .position(|child| *child == current)
                    .map(|position| position.to_string()),
                _ => None,
            };
            match segment {
                Some(segment) => segments.push(segment),
                None => break,
            }
            current = parent;
        }

        segments.reverse();
        Some(segments.join("."))
    }

    /// Follow a dotted path down from `root`
    pub fn find_path(&self, root: NodeId, path: &str) -> Option<NodeId> {
        let mut current = root;
        for segment in path.split('.').filter(|segment| !segment.is_empty()) {
            current = match self.get(current)? {
                Node::Object(_) => self.property(current, segment)?,
                Node::Array(array) if segment == self.config.schema_property_name => array.schema,
                Node::Array(array) => *array.values.get(segment.parse::<usize>().ok()?)?,
                Node::Value(_) | Node::Enum(_) => return None,
            };
        }
        Some(current)
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.entries
            .get(id.index())
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.slot.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.entries
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.slot.as_mut())
    }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
