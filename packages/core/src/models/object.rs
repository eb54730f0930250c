//! Object Nodes
//!
//! An object is an ordered map from property name to child node. Insertion
//! order is kept because it drives display order and the order in which
//! dotted-path references are enumerated.

use crate::config::PATH_SEPARATOR;
use crate::models::error::TreeError;
use crate::models::identifier::Property;
use crate::models::node::{Node, NodeId, NodeKind};
use crate::models::tree::ValueTree;
use crate::utils::unique_name;
use indexmap::IndexMap;

/// Container mapping property names to children
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectNode {
    pub(crate) properties: IndexMap<String, NodeId>,
}

impl ObjectNode {
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.properties
            .iter()
            .map(|(name, child)| (name.as_str(), *child))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.properties.keys().map(String::as_str)
    }
}

impl ValueTree {
    /// Object payload of `id`
    pub fn object(&self, id: NodeId) -> Result<&ObjectNode, TreeError> {
        match self.node(id)? {
            Node::Object(object) => Ok(object),
            other => Err(TreeError::unexpected_variant(id, "object", other.variant_name())),
        }
    }

    fn object_mut(&mut self, id: NodeId) -> Result<&mut ObjectNode, TreeError> {
        match self.node_mut(id)? {
            Node::Object(object) => Ok(object),
            other => Err(TreeError::unexpected_variant(id, "object", other.variant_name())),
        }
    }

    /// Stored key matching `name` under the tree's name comparison
    fn property_key(&self, object: NodeId, name: &str) -> Option<String> {
        let comparison = self.config().name_comparison;
        self.object(object)
            .ok()?
            .properties
            .keys()
            .find(|key| comparison.matches(key, name))
            .cloned()
    }

    /// Child stored under `name`
    pub fn property(&self, object: NodeId, name: &str) -> Option<NodeId> {
        let key = self.property_key(object, name)?;
        self.object(object).ok()?.properties.get(&key).copied()
    }

    /// Identifiers of every property, in order
    pub fn properties(&self, object: NodeId) -> Result<Vec<Property>, TreeError> {
        Ok(self
            .object(object)?
            .iter()
            .map(|(name, child)| Property::new(name, child))
            .collect())
    }

    /// Create a default node of `kind` and add it under a unique variant of `name`
    pub fn create_property(
        &mut self,
        object: NodeId,
        name: &str,
        kind: NodeKind,
    ) -> Result<Property, TreeError> {
        self.object(object)?;
        check_property_name(name)?;
        let child = self.create_default(kind);
        self.add_property(object, name, child)
    }

    /// Attach a detached node under a unique variant of `name`
    ///
    /// If `name` is taken, `"name 1"`, `"name 2"`, ... are tried in order.
    ///
    /// # Errors
    ///
    /// - `AlreadyAttached` if `node` already has an owner
    /// - `WouldCreateCycle` if `object` lies inside `node`
    /// - `InvalidPropertyName` if `name` contains the path separator
    pub fn add_property(
        &mut self,
        object: NodeId,
        name: &str,
        node: NodeId,
    ) -> Result<Property, TreeError> {
        check_property_name(name)?;
        self.ensure_attachable(node, object)?;

        let comparison = self.config().name_comparison;
        let name = unique_name(name, self.object(object)?.names(), comparison);

        self.object_mut(object)?.properties.insert(name.clone(), node);
        self.set_parent(node, Some(object));

        tracing::trace!("Added property '{}' ({}) to object {}", name, node, object);
        Ok(Property::new(name, node))
    }

    /// Remove a property and free its subtree
    pub fn remove_property(&mut self, object: NodeId, name: &str) -> Result<(), TreeError> {
        let key = self
            .property_key(object, name)
            .ok_or_else(|| TreeError::property_not_found(name))?;
        let child = self
            .object_mut(object)?
            .properties
            .shift_remove(&key)
            .ok_or_else(|| TreeError::property_not_found(name))?;

        self.free_subtree(child);
        tracing::trace!("Removed property '{}' from object {}", key, object);
        Ok(())
    }

    /// Rename a property in place, keeping its position
    ///
    /// Returns `false` (and changes nothing) when `new_name` is blank,
    /// contains the path separator or is already used by a different property.
    pub fn rename_property(
        &mut self,
        object: NodeId,
        old_name: &str,
        new_name: &str,
    ) -> Result<bool, TreeError> {
        let old_key = self
            .property_key(object, old_name)
            .ok_or_else(|| TreeError::property_not_found(old_name))?;

        if check_property_name(new_name).is_err() {
            return Ok(false);
        }

        let comparison = self.config().name_comparison;
        let collides = self
            .object(object)?
            .names()
            .any(|key| key != old_key && comparison.matches(key, new_name));
        if collides {
            return Ok(false);
        }

        let properties = &mut self.object_mut(object)?.properties;
        if let Some((index, _, child)) = properties.shift_remove_full(&old_key) {
            properties.shift_insert(index, new_name.to_string(), child);
        }

        tracing::trace!("Renamed property '{}' to '{}'", old_key, new_name);
        Ok(true)
    }
}

/// Names must be non-blank and free of the path separator, so every
/// property has exactly one dotted path
pub(crate) fn check_property_name(name: &str) -> Result<(), TreeError> {
    if name.trim().is_empty() {
        return Err(TreeError::invalid_property_name(name, "name is blank"));
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(TreeError::invalid_property_name(
            name,
            format!("name contains the path separator '{}'", PATH_SEPARATOR),
        ));
    }
    Ok(())
}
