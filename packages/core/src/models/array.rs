//! Array Nodes
//!
//! An array owns a schema node and an ordered list of elements. New elements
//! are clones of the schema, and replacing the schema clears the elements.

use crate::models::error::TreeError;
use crate::models::identifier::{Index, Property};
use crate::models::node::{Node, NodeId, NodeKind};
use crate::models::tree::ValueTree;

/// Container of schema-shaped elements
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayNode {
    pub(crate) schema: NodeId,
    pub(crate) values: Vec<NodeId>,
}

impl ArrayNode {
    pub(crate) fn new(schema: NodeId) -> Self {
        Self {
            schema,
            values: Vec::new(),
        }
    }

    /// Template node cloned for every new element
    pub fn schema(&self) -> NodeId {
        self.schema
    }

    /// Elements in order
    pub fn values(&self) -> &[NodeId] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ValueTree {
    /// Array payload of `id`
    pub fn array(&self, id: NodeId) -> Result<&ArrayNode, TreeError> {
        match self.node(id)? {
            Node::Array(array) => Ok(array),
            other => Err(TreeError::unexpected_variant(id, "array", other.variant_name())),
        }
    }

    fn array_mut(&mut self, id: NodeId) -> Result<&mut ArrayNode, TreeError> {
        match self.node_mut(id)? {
            Node::Array(array) => Ok(array),
            other => Err(TreeError::unexpected_variant(id, "array", other.variant_name())),
        }
    }

    /// Replace the schema with a default node of `kind`, clearing all elements
    ///
    /// Returns the id of the new schema node.
    pub fn change_schema(&mut self, array: NodeId, kind: NodeKind) -> Result<NodeId, TreeError> {
        self.array(array)?;
        let schema = self.create_default(kind);
        self.set_schema(array, schema)?;
        Ok(schema)
    }

    /// Install a detached node as the schema, clearing all elements
    pub fn set_schema(&mut self, array: NodeId, schema: NodeId) -> Result<(), TreeError> {
        self.array(array)?;
        self.ensure_attachable(schema, array)?;

        let (old_schema, old_values) = {
            let payload = self.array_mut(array)?;
            let old_schema = std::mem::replace(&mut payload.schema, schema);
            (old_schema, std::mem::take(&mut payload.values))
        };
        self.set_parent(schema, Some(array));

        self.free_subtree(old_schema);
        for value in old_values {
            self.free_subtree(value);
        }

        tracing::trace!("Array {} schema replaced by {}", array, schema);
        Ok(())
    }

    /// Append a clone of the schema
    pub fn create_element(&mut self, array: NodeId) -> Result<Index, TreeError> {
        let schema = self.array(array)?.schema;
        let element = self.copy_subtree(schema, Some(array))?;

        let values = &mut self.array_mut(array)?.values;
        values.push(element);
        let position = values.len() - 1;

        tracing::trace!("Array {} gained element {} at {}", array, element, position);
        Ok(Index::new(position, element))
    }

    /// Append an existing detached node
    ///
    /// The node is not checked against the schema.
    pub fn push_element(&mut self, array: NodeId, node: NodeId) -> Result<Index, TreeError> {
        self.array(array)?;
        self.ensure_attachable(node, array)?;

        let values = &mut self.array_mut(array)?.values;
        values.push(node);
        let position = values.len() - 1;
        self.set_parent(node, Some(array));

        Ok(Index::new(position, node))
    }

    /// Remove the element at `index` and free its subtree
    pub fn remove_at(&mut self, array: NodeId, index: usize) -> Result<(), TreeError> {
        let values = &mut self.array_mut(array)?.values;
        if index >= values.len() {
            return Err(TreeError::IndexOutOfRange {
                index,
                len: values.len(),
            });
        }
        let element = values.remove(index);

        self.free_subtree(element);
        tracing::trace!("Removed element {} from array {}", index, array);
        Ok(())
    }

    /// Identifiers of every element, in order
    pub fn elements(&self, array: NodeId) -> Result<Vec<Index>, TreeError> {
        Ok(self
            .array(array)?
            .values
            .iter()
            .enumerate()
            .map(|(position, element)| Index::new(position, *element))
            .collect())
    }

    /// The schema exposed as a non-removable pseudo-property for editing
    pub fn schema_property(&self, array: NodeId) -> Result<Property, TreeError> {
        let schema = self.array(array)?.schema;
        Ok(Property::fixed(
            self.config().schema_property_name.clone(),
            schema,
        ))
    }
}
