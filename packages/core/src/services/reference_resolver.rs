//! Context Reference Resolution
//!
//! A leaf may carry a context reference: the dotted path of another leaf in a
//! companion object. Resolution replaces the leaf's value with the value
//! found at that path, following chains of references until a literal is
//! reached.
//!
//! # Flattening
//!
//! [`get_references`] walks an object and yields one [`LeafReference`] per
//! non-object property, keyed by its dotted path. Nested objects contribute
//! their name to the path but no reference of their own:
//!
//! ```text
//! { a: { b: 1, c: 2 }, d: 3 }   =>   a.b -> 1, a.c -> 2, d -> 3
//! ```
//!
//! # Resolution
//!
//! Resolution runs in two phases. The plan phase reads the target and the
//! context and computes every substitution; the write phase stores them. A
//! tree can therefore be resolved against one of its own objects
//! ([`apply_own_context`]), and a failing resolution leaves the target
//! untouched.
//!
//! Reference chains are followed iteratively with a visited set, so any
//! acyclic chain resolves and a revisited path fails with
//! [`ContextError::CircularReference`].

use crate::config::NameComparison;
use crate::models::{Node, NodeId, PrimitiveKind, PrimitiveValue, TreeError, ValueTree};
use crate::services::error::ContextError;
use indexmap::{IndexMap, IndexSet};

/// A leaf (or array) found while flattening an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafReference {
    /// Dotted path from the flattened object
    pub path: String,

    /// Node found at `path`
    pub element: NodeId,
}

/// Flatten `object` into dotted-path references, in property order
pub fn get_references(
    tree: &ValueTree,
    object: NodeId,
) -> Result<Vec<LeafReference>, ContextError> {
    let mut references = Vec::new();
    let mut prefix = Vec::new();
    collect_references(tree, object, &mut prefix, &mut references)?;
    Ok(references)
}

fn collect_references(
    tree: &ValueTree,
    object: NodeId,
    prefix: &mut Vec<String>,
    references: &mut Vec<LeafReference>,
) -> Result<(), ContextError> {
    for (name, child) in tree.object(object)?.iter() {
        prefix.push(name.to_string());
        if matches!(tree.node(child)?, Node::Object(_)) {
            collect_references(tree, child, prefix, references)?;
        } else {
            references.push(LeafReference {
                path: prefix.join("."),
                element: child,
            });
        }
        prefix.pop();
    }
    Ok(())
}

/// Lookup table from dotted path to context leaf
///
/// Paths are matched with the name comparison of the tree the map points
/// into.
#[derive(Debug, Clone)]
pub struct ContextMap<'a> {
    tree: &'a ValueTree,
    comparison: NameComparison,
    entries: IndexMap<String, LeafReference>,
}

impl<'a> ContextMap<'a> {
    /// Flatten `object` into a context map
    pub fn from_object(tree: &'a ValueTree, object: NodeId) -> Result<Self, ContextError> {
        let references = get_references(tree, object)?;
        Ok(Self::from_references(tree, references))
    }

    /// Context map over already flattened references
    ///
    /// When two references share a path, the later one wins.
    pub fn from_references(
        tree: &'a ValueTree,
        references: impl IntoIterator<Item = LeafReference>,
    ) -> Self {
        let comparison = tree.config().name_comparison;
        let entries = references
            .into_iter()
            .map(|reference| (comparison.normalize(&reference.path).into_owned(), reference))
            .collect();

        Self {
            tree,
            comparison,
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reference stored under `path`
    pub fn get(&self, path: &str) -> Option<&LeafReference> {
        self.entries.get(&*self.comparison.normalize(path.trim()))
    }

    /// Paths in flattening order
    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.values().map(|reference| reference.path.as_str())
    }

    /// Follow `reference` through the context until a literal value is found
    ///
    /// Every leaf on the chain must be of kind `expected` when one is given.
    ///
    /// # Errors
    ///
    /// - `ReferenceNotFound` if a path on the chain is missing
    /// - `TypeMismatch` if a path resolves to an array or object, or to a leaf
    ///   of the wrong kind
    /// - `CircularReference` if the chain revisits a path
    pub fn resolve(
        &self,
        reference: &str,
        expected: Option<PrimitiveKind>,
    ) -> Result<PrimitiveValue, ContextError> {
        let mut visited: IndexSet<String> = IndexSet::new();
        let mut path = reference.trim().to_string();

        loop {
            let key = self.comparison.normalize(&path).into_owned();
            if !visited.insert(key) {
                let mut chain: Vec<String> = visited.into_iter().collect();
                chain.push(path);
                return Err(ContextError::CircularReference { chain });
            }

            let element = self
                .get(&path)
                .ok_or_else(|| ContextError::reference_not_found(path.clone()))?
                .element;

            let node = self.tree.node(element)?;
            let leaf = node.as_leaf().ok_or_else(|| {
                ContextError::type_mismatch(
                    path.clone(),
                    format!("resolves to a {} node, expected a leaf", node.variant_name()),
                )
            })?;

            if let Some(expected) = expected {
                if leaf.data_type != expected {
                    return Err(ContextError::type_mismatch(
                        path,
                        format!("resolves to a {} leaf, expected {}", leaf.data_type, expected),
                    ));
                }
            }

            match leaf.reference() {
                Some(next) => path = next.to_string(),
                None => return Ok(leaf.value.clone()),
            }
        }
    }
}

/// Pending write computed by the plan phase
#[derive(Debug, Clone, PartialEq)]
struct Substitution {
    target: NodeId,
    value: PrimitiveValue,
}

/// Resolve every context reference at or below `node` against `context`
///
/// Arrays resolve their values (not their schema); objects resolve their
/// properties in order. Returns the number of leaves that were substituted.
pub fn apply_context(
    tree: &mut ValueTree,
    node: NodeId,
    context: &ContextMap<'_>,
) -> Result<usize, ContextError> {
    let plan = plan_substitutions(tree, node, context)?;
    write_substitutions(tree, plan)
}

/// Resolve references at or below `node` against `context_object` of the same tree
pub fn apply_own_context(
    tree: &mut ValueTree,
    node: NodeId,
    context_object: NodeId,
) -> Result<usize, ContextError> {
    let plan = {
        let context = ContextMap::from_object(tree, context_object)?;
        plan_substitutions(tree, node, &context)?
    };
    write_substitutions(tree, plan)
}

fn plan_substitutions(
    tree: &ValueTree,
    node: NodeId,
    context: &ContextMap<'_>,
) -> Result<Vec<Substitution>, ContextError> {
    let mut plan = Vec::new();
    let mut pending = vec![node];

    while let Some(current) = pending.pop() {
        match tree.node(current)? {
            Node::Value(leaf) => {
                if let Some(reference) = leaf.reference() {
                    let value = context.resolve(reference, Some(leaf.data_type))?;
                    plan.push(Substitution {
                        target: current,
                        value,
                    });
                }
            }
            Node::Enum(enum_node) => {
                if let Some(reference) = enum_node.leaf.reference() {
                    let value = context.resolve(reference, Some(PrimitiveKind::Integer))?;
                    let index = value.as_integer().unwrap_or_default();
                    if !enum_node.available.iter().any(|member| member.index == index) {
                        return Err(ContextError::type_mismatch(
                            reference,
                            format!("no enum member has index {}", index),
                        ));
                    }
                    plan.push(Substitution {
                        target: current,
                        value,
                    });
                }
            }
            // Pushed in reverse so the plan follows document order
            Node::Array(array) => pending.extend(array.values().iter().rev().copied()),
            Node::Object(object) => {
                let children: Vec<NodeId> = object.iter().map(|(_, child)| child).collect();
                pending.extend(children.into_iter().rev());
            }
        }
    }

    Ok(plan)
}

fn write_substitutions(
    tree: &mut ValueTree,
    plan: Vec<Substitution>,
) -> Result<usize, ContextError> {
    let count = plan.len();
    for Substitution { target, value } in plan {
        tracing::debug!("Context substitution {} <- {}", target, value);
        tree.set_value(target, value).map_err(ContextError::from)?;
    }
    Ok(count)
}

/// Resolve a single leaf's reference without writing it
pub fn resolve_leaf(
    tree: &ValueTree,
    leaf: NodeId,
    context: &ContextMap<'_>,
) -> Result<Option<PrimitiveValue>, ContextError> {
    let node = tree.node(leaf)?;
    let payload = node
        .as_leaf()
        .ok_or_else(|| TreeError::unexpected_variant(leaf, "leaf", node.variant_name()))?;
    match payload.reference() {
        Some(reference) => context.resolve(reference, Some(payload.data_type)).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
#[path = "reference_resolver_test.rs"]
mod reference_resolver_test;
