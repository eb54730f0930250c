//! Type Bridge
//!
//! Converts between host values (through their [`TypeDescriptor`]) and value
//! tree nodes.
//!
//! # Host to node
//!
//! [`to_node`] classifies the descriptor in this order:
//!
//! 1. Enumeration: an enum node listing every member; the instance selects
//!    the member, otherwise the first one is selected
//! 2. Primitive: a value node holding the instance or the kind's default
//! 3. Without an instance, the descriptor's default constructor is used when
//!    it has one
//! 4. List: an array whose schema is the element type's template and whose
//!    values come from the instance
//! 5. Record: an object with one property per non-ignored field
//!
//! A record type met again while its own template is being built (for
//! example through a list of itself) yields an empty object, which keeps
//! templates of recursive types finite.
//!
//! # Node to host
//!
//! [`from_node`] dispatches on the node variant. Arrays need an appendable
//! list type, objects a constructible record type whose members cover every
//! stored property.

use crate::models::{Node, NodeId, ValueTree};
use crate::services::error::BridgeError;
use crate::services::reference_resolver::{apply_context, ContextMap};
use crate::services::reflect::{HostValue, Reflect, TypeDescriptor, TypeShape};
use indexmap::IndexMap;
use std::any::TypeId;

/// Build a detached node tree for `descriptor`, filled from `instance`
///
/// On error, every node allocated by the call is freed again.
pub fn to_node(
    tree: &mut ValueTree,
    descriptor: &TypeDescriptor,
    instance: Option<&HostValue>,
) -> Result<NodeId, BridgeError> {
    let watermark = tree.watermark();
    let mut builder = NodeBuilder {
        tree: &mut *tree,
        records: Vec::new(),
    };

    match builder.build(descriptor, instance) {
        Ok(id) => {
            tracing::debug!("Converted {} into node {}", descriptor.name, id);
            Ok(id)
        }
        Err(e) => {
            tree.release_since(watermark);
            Err(e)
        }
    }
}

struct NodeBuilder<'a> {
    tree: &'a mut ValueTree,

    /// Record types on the current conversion path
    records: Vec<RecordKey>,
}

/// Identity of a record type: its Rust type when known, otherwise its name
#[derive(Debug, Clone, PartialEq, Eq)]
enum RecordKey {
    Type(TypeId),
    Name(String),
}

impl RecordKey {
    fn of(descriptor: &TypeDescriptor) -> Self {
        match descriptor.type_id {
            Some(type_id) => Self::Type(type_id),
            None => Self::Name(descriptor.name.clone()),
        }
    }
}

impl NodeBuilder<'_> {
    fn build(
        &mut self,
        descriptor: &TypeDescriptor,
        instance: Option<&HostValue>,
    ) -> Result<NodeId, BridgeError> {
        match &descriptor.shape {
            TypeShape::Enum(members) => {
                let id = self
                    .tree
                    .create_enum(members.iter().map(|member| member.name.clone()));
                if let Some(instance) = instance {
                    let value = instance.clone().into_enum(&descriptor.name)?;
                    let ordinal = members
                        .iter()
                        .position(|member| member.value == value)
                        .ok_or_else(|| BridgeError::InvalidEnumValue {
                            type_name: descriptor.name.clone(),
                            value,
                        })?;
                    self.tree.set_value(id, ordinal as i64)?;
                }
                Ok(id)
            }

            TypeShape::Primitive(kind) => match instance {
                None => Ok(self.tree.create_value(*kind)),
                Some(HostValue::Primitive(value)) if value.kind() == *kind => {
                    Ok(self.tree.create_leaf(value.clone()))
                }
                Some(other) => Err(BridgeError::instance_mismatch(
                    &descriptor.name,
                    other.kind_name(),
                )),
            },

            TypeShape::Record { .. }
                if instance.is_none() && self.records.contains(&RecordKey::of(descriptor)) =>
            {
                Ok(self.tree.create_object())
            }

            TypeShape::List { .. } | TypeShape::Record { .. } => {
                let constructed = match instance {
                    Some(_) => None,
                    None => descriptor.default.map(|construct| construct()).transpose()?,
                };
                let instance = instance.or(constructed.as_ref());

                match &descriptor.shape {
                    TypeShape::List { element, .. } => {
                        self.build_list(descriptor, &element(), instance)
                    }
                    _ => self.build_record(descriptor, instance),
                }
            }
        }
    }

    fn build_list(
        &mut self,
        descriptor: &TypeDescriptor,
        element: &TypeDescriptor,
        instance: Option<&HostValue>,
    ) -> Result<NodeId, BridgeError> {
        let items = match instance {
            None => &[][..],
            Some(HostValue::List(items)) => items.as_slice(),
            Some(other) => {
                return Err(BridgeError::instance_mismatch(
                    &descriptor.name,
                    other.kind_name(),
                ))
            }
        };

        let schema = self.build(element, None)?;
        let array = self.tree.create_array_with_schema(schema)?;

        for item in items {
            let value = self.build(element, Some(item))?;
            self.tree.push_element(array, value)?;
        }
        Ok(array)
    }

    fn build_record(
        &mut self,
        descriptor: &TypeDescriptor,
        instance: Option<&HostValue>,
    ) -> Result<NodeId, BridgeError> {
        let TypeShape::Record { fields } = &descriptor.shape else {
            return Err(BridgeError::unsupported_target(
                &descriptor.name,
                "expected a record type",
            ));
        };
        let values = match instance {
            None => None,
            Some(HostValue::Record(values)) => Some(values),
            Some(other) => {
                return Err(BridgeError::instance_mismatch(
                    &descriptor.name,
                    other.kind_name(),
                ))
            }
        };

        self.records.push(RecordKey::of(descriptor));
        let object = self.tree.create_object();
        for field in fields {
            let Some(field_descriptor) = field.descriptor else {
                continue;
            };
            let value = values.and_then(|values| values.get(&field.name));
            let child = self.build(&field_descriptor(), value)?;
            self.tree.add_property(object, &field.name, child)?;
        }
        self.records.pop();

        Ok(object)
    }
}

/// Materialize the host value stored at `node` as an instance of `descriptor`
pub fn from_node(
    tree: &ValueTree,
    node: NodeId,
    descriptor: &TypeDescriptor,
) -> Result<HostValue, BridgeError> {
    match tree.node(node)? {
        Node::Enum(enum_node) => {
            let TypeShape::Enum(members) = &descriptor.shape else {
                return Err(BridgeError::unsupported_target(
                    &descriptor.name,
                    "an enum node needs an enumeration type",
                ));
            };
            let index = enum_node.selected_index().unwrap_or_default();
            let member = usize::try_from(index)
                .ok()
                .and_then(|ordinal| members.get(ordinal))
                .ok_or_else(|| BridgeError::InvalidEnumIndex {
                    type_name: descriptor.name.clone(),
                    index,
                })?;
            Ok(HostValue::Enum(member.value))
        }

        Node::Value(leaf) => Ok(HostValue::Primitive(leaf.value.clone())),

        Node::Array(array) => match &descriptor.shape {
            TypeShape::List {
                element,
                appendable: true,
            } => {
                let element = element();
                let items = array
                    .values()
                    .iter()
                    .map(|value| from_node(tree, *value, &element))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(HostValue::List(items))
            }
            TypeShape::List { .. } => Err(BridgeError::unsupported_target(
                &descriptor.name,
                "list type cannot be appended to",
            )),
            _ => Err(BridgeError::unsupported_target(
                &descriptor.name,
                "an array node needs a list type",
            )),
        },

        Node::Object(object) => {
            let TypeShape::Record { fields } = &descriptor.shape else {
                return Err(BridgeError::unsupported_target(
                    &descriptor.name,
                    "an object node needs a record type",
                ));
            };
            if descriptor.default.is_none() {
                return Err(BridgeError::unsupported_target(
                    &descriptor.name,
                    "record type has no default constructor",
                ));
            }

            let comparison = tree.config().name_comparison;
            let mut values = IndexMap::new();
            for (name, child) in object.iter() {
                let field = fields
                    .iter()
                    .find(|field| comparison.matches(&field.name, name))
                    .and_then(|field| field.descriptor.map(|descriptor| (field, descriptor)));
                let Some((field, field_descriptor)) = field else {
                    return Err(BridgeError::member_not_found(&descriptor.name, name));
                };
                values.insert(
                    field.name.clone(),
                    from_node(tree, child, &field_descriptor())?,
                );
            }
            Ok(HostValue::Record(values))
        }
    }
}

/// Resolve context references at or below `node`, then convert it
pub fn from_node_with_context(
    tree: &mut ValueTree,
    node: NodeId,
    descriptor: &TypeDescriptor,
    context: &ContextMap<'_>,
) -> Result<HostValue, BridgeError> {
    apply_context(tree, node, context)?;
    from_node(tree, node, descriptor)
}

/// Convert a typed value into a detached node tree
pub fn import<T: Reflect>(tree: &mut ValueTree, value: &T) -> Result<NodeId, BridgeError> {
    to_node(tree, &T::descriptor(), Some(&value.to_host()?))
}

/// Build the default node tree for `T`
pub fn template<T: Reflect>(tree: &mut ValueTree) -> Result<NodeId, BridgeError> {
    to_node(tree, &T::descriptor(), None)
}

/// Convert the node tree at `node` back into a `T`
pub fn export<T: Reflect>(tree: &ValueTree, node: NodeId) -> Result<T, BridgeError> {
    let host = from_node(tree, node, &T::descriptor())?;
    tracing::debug!("Exported node {} as {}", node, T::descriptor().name);
    T::from_host(host)
}

#[cfg(test)]
#[path = "type_bridge_test.rs"]
mod type_bridge_test;
