//! Child Identifiers
//!
//! An identifier addresses one child inside its container: a [`Property`]
//! by name inside an object, an [`Index`] by position inside an array. The
//! owning container is found through the element's parent handle, so an
//! identifier stays usable after sibling edits.

use crate::models::error::TreeError;
use crate::models::node::{Node, NodeId};
use crate::models::tree::ValueTree;

/// Named child of an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name
    pub name: String,

    /// Addressed node
    pub element: NodeId,

    removable: bool,
}

impl Property {
    pub(crate) fn new(name: impl Into<String>, element: NodeId) -> Self {
        Self {
            name: name.into(),
            element,
            removable: true,
        }
    }

    /// Structurally required child (e.g. an array schema) that refuses removal
    pub(crate) fn fixed(name: impl Into<String>, element: NodeId) -> Self {
        Self {
            name: name.into(),
            element,
            removable: false,
        }
    }

    pub fn is_removable(&self) -> bool {
        self.removable
    }

    /// Rename this property inside its owning object
    ///
    /// Returns `false` and changes nothing if the name is taken by another
    /// property or if this identifier is a fixed pseudo-property.
    pub fn rename(&mut self, tree: &mut ValueTree, new_name: &str) -> Result<bool, TreeError> {
        if !self.removable {
            return Ok(false);
        }

        let owner = self.owner(tree)?;
        let renamed = tree.rename_property(owner, &self.name, new_name)?;
        if renamed {
            self.name = new_name.to_string();
        }
        Ok(renamed)
    }

    /// Remove this property from its owning object, freeing its subtree
    pub fn remove(self, tree: &mut ValueTree) -> Result<(), TreeError> {
        if !self.removable {
            return Err(TreeError::not_removable(self.name));
        }

        let owner = self.owner(tree)?;
        tree.remove_property(owner, &self.name)
    }

    fn owner(&self, tree: &ValueTree) -> Result<NodeId, TreeError> {
        tree.node(self.element)?;
        match tree.parent(self.element) {
            Some(parent) if tree.is_attached(self.element) => Ok(parent),
            _ => Err(TreeError::property_not_found(self.name.clone())),
        }
    }
}

/// Positional child of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    /// Position when the identifier was produced
    pub position: usize,

    /// Addressed node
    pub element: NodeId,
}

impl Index {
    pub(crate) fn new(position: usize, element: NodeId) -> Self {
        Self { position, element }
    }

    /// Array elements are always removable
    pub fn is_removable(&self) -> bool {
        true
    }

    /// Remove this element from its owning array, freeing its subtree
    ///
    /// If earlier siblings were removed since this identifier was produced,
    /// the element's current position is used.
    pub fn remove(self, tree: &mut ValueTree) -> Result<(), TreeError> {
        tree.node(self.element)?;
        let owner = tree
            .parent(self.element)
            .ok_or(TreeError::node_not_found(self.element))?;
        let position = match tree.node(owner)? {
            Node::Array(array) => array
                .values()
                .iter()
                .position(|element| *element == self.element)
                .ok_or(TreeError::IndexOutOfRange {
                    index: self.position,
                    len: array.len(),
                })?,
            other => {
                return Err(TreeError::unexpected_variant(
                    owner,
                    "array",
                    other.variant_name(),
                ))
            }
        };
        tree.remove_at(owner, position)
    }
}

/// Any child identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Property(Property),
    Index(Index),
}

impl Identifier {
    pub fn element(&self) -> NodeId {
        match self {
            Self::Property(property) => property.element,
            Self::Index(index) => index.element,
        }
    }

    pub fn is_removable(&self) -> bool {
        match self {
            Self::Property(property) => property.is_removable(),
            Self::Index(index) => index.is_removable(),
        }
    }

    /// Display label: the property name or the element position
    pub fn label(&self) -> String {
        match self {
            Self::Property(property) => property.name.clone(),
            Self::Index(index) => index.position.to_string(),
        }
    }

    pub fn remove(self, tree: &mut ValueTree) -> Result<(), TreeError> {
        match self {
            Self::Property(property) => property.remove(tree),
            Self::Index(index) => index.remove(tree),
        }
    }
}

impl From<Property> for Identifier {
    fn from(property: Property) -> Self {
        Self::Property(property)
    }
}

impl From<Index> for Identifier {
    fn from(index: Index) -> Self {
        Self::Index(index)
    }
}

impl ValueTree {
    /// Identifiers of every child of a container
    ///
    /// Arrays list their schema pseudo-property first, then their elements.
    /// Leaves have no children.
    pub fn children_of(&self, container: NodeId) -> Result<Vec<Identifier>, TreeError> {
        match self.node(container)? {
            Node::Object(_) => Ok(self
                .properties(container)?
                .into_iter()
                .map(Identifier::from)
                .collect()),
            Node::Array(_) => {
                let mut children = vec![Identifier::from(self.schema_property(container)?)];
                children.extend(self.elements(container)?.into_iter().map(Identifier::from));
                Ok(children)
            }
            Node::Value(_) | Node::Enum(_) => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::node::NodeKind;
    use crate::models::primitive::PrimitiveKind;

    #[test]
    fn test_property_rename_through_identifier() {
        let mut tree = ValueTree::new();
        let root = tree.create_object();
        let mut title = tree
            .create_property(root, "Title", PrimitiveKind::String.into())
            .unwrap();
        tree.create_property(root, "Body", PrimitiveKind::String.into()).unwrap();

        assert!(title.rename(&mut tree, "Heading").unwrap());
        assert_eq!(title.name, "Heading");
        assert_eq!(tree.property(root, "Heading"), Some(title.element));

        assert!(!title.rename(&mut tree, "Body").unwrap());
        assert_eq!(title.name, "Heading");
    }

    #[test]
    fn test_property_remove_through_identifier() {
        let mut tree = ValueTree::new();
        let root = tree.create_object();
        let flag = tree
            .create_property(root, "Flag", PrimitiveKind::Boolean.into())
            .unwrap();

        flag.clone().remove(&mut tree).unwrap();
        assert!(tree.object(root).unwrap().is_empty());
        assert!(flag.remove(&mut tree).is_err());
    }

    #[test]
    fn test_index_remove_tracks_position() {
        let mut tree = ValueTree::new();
        let array = tree.create_array(NodeKind::Primitive(PrimitiveKind::Integer));
        let first = tree.create_element(array).unwrap();
        let second = tree.create_element(array).unwrap();
        let third = tree.create_element(array).unwrap();

        first.remove(&mut tree).unwrap();
        // `third` was produced at position 2 but now lives at 1
        third.remove(&mut tree).unwrap();

        assert_eq!(tree.array(array).unwrap().values(), &[second.element]);
    }

    #[test]
    fn test_children_of_array_lists_schema_first() {
        let mut tree = ValueTree::new();
        let array = tree.create_array(NodeKind::Object);
        tree.create_element(array).unwrap();

        let children = tree.children_of(array).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].label(), "Schema");
        assert!(!children[0].is_removable());
        assert_eq!(children[1].label(), "0");
        assert!(children[1].is_removable());
    }

    #[test]
    fn test_schema_pseudo_property_cannot_be_renamed() {
        let mut tree = ValueTree::new();
        let array = tree.create_array(NodeKind::Object);
        let mut schema = tree.schema_property(array).unwrap();

        assert!(!schema.rename(&mut tree, "Other").unwrap());
        assert_eq!(schema.name, "Schema");
    }
}
