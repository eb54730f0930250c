//! Tests for the value tree arena
//!
//! Tests cover:
//! - Clone independence and clone parent handles
//! - Discarding attached and detached nodes
//! - Parent chains and dotted paths
//! - Leaf editing with kind checks
//! - Stale handles and slot reuse

#[cfg(test)]
mod tests {
    use crate::config::ModelConfig;
    use crate::models::{Node, NodeKind, PrimitiveKind, PrimitiveValue, TreeError, ValueTree};

    /// Object `{ items: [1, 2], meta: { title: "Notes" } }`
    fn sample_tree() -> (ValueTree, crate::models::NodeId) {
        let mut tree = ValueTree::new();
        let root = tree.create_object();

        let items = tree
            .create_property(root, "items", NodeKind::Array)
            .unwrap()
            .element;
        tree.change_schema(items, PrimitiveKind::Integer.into()).unwrap();
        for value in [1, 2] {
            let element = tree.create_element(items).unwrap().element;
            tree.set_value(element, value).unwrap();
        }

        let meta = tree
            .create_property(root, "meta", NodeKind::Object)
            .unwrap()
            .element;
        let title = tree
            .create_property(meta, "title", PrimitiveKind::String.into())
            .unwrap()
            .element;
        tree.set_value(title, "Notes").unwrap();

        (tree, root)
    }

    #[test]
    fn test_clone_is_independent() {
        let (mut tree, root) = sample_tree();
        let items = tree.property(root, "items").unwrap();

        let copy = tree.clone_node(items).unwrap();
        let copied_first = tree.array(copy).unwrap().values()[0];
        tree.set_value(copied_first, 99).unwrap();
        tree.remove_at(copy, 1).unwrap();

        let original = tree.array(items).unwrap();
        assert_eq!(original.len(), 2);
        assert_eq!(
            tree.value(original.values()[0]).unwrap(),
            &PrimitiveValue::Integer(1)
        );
        assert_eq!(tree.array(copy).unwrap().len(), 1);
    }

    #[test]
    fn test_clone_keeps_parent_but_is_detached() {
        let (mut tree, root) = sample_tree();
        let meta = tree.property(root, "meta").unwrap();

        let copy = tree.clone_node(meta).unwrap();
        assert_eq!(tree.parent(copy), Some(root));
        assert!(!tree.is_attached(copy));
        assert!(tree.is_attached(meta));
        assert_eq!(tree.object(root).unwrap().len(), 2);

        // Children of the copy point at the copy, not at the original
        let title = tree.property(copy, "title").unwrap();
        assert_eq!(tree.parent(title), Some(copy));
    }

    #[test]
    fn test_discard_attached_node() {
        let (mut tree, root) = sample_tree();
        let before = tree.len();
        let meta = tree.property(root, "meta").unwrap();
        let title = tree.property(meta, "title").unwrap();

        tree.discard(meta).unwrap();

        assert_eq!(tree.len(), before - 2);
        assert!(!tree.contains(meta));
        assert!(!tree.contains(title));
        assert_eq!(tree.property(root, "meta"), None);
    }

    #[test]
    fn test_discard_detached_clone_leaves_original() {
        let (mut tree, root) = sample_tree();
        let items = tree.property(root, "items").unwrap();
        let before = tree.len();

        let copy = tree.clone_node(items).unwrap();
        tree.discard(copy).unwrap();

        assert_eq!(tree.len(), before);
        assert_eq!(tree.property(root, "items"), Some(items));
        assert_eq!(tree.array(items).unwrap().len(), 2);
    }

    #[test]
    fn test_discard_schema_is_refused() {
        let (mut tree, root) = sample_tree();
        let items = tree.property(root, "items").unwrap();
        let schema = tree.array(items).unwrap().schema();

        assert!(matches!(
            tree.discard(schema),
            Err(TreeError::NotRemovable { .. })
        ));
        assert!(tree.contains(schema));
    }

    #[test]
    fn test_ancestors_and_enclosing_object() {
        let (tree, root) = sample_tree();
        let items = tree.property(root, "items").unwrap();
        let element = tree.array(items).unwrap().values()[1];

        assert_eq!(tree.ancestors(element), vec![items, root]);
        assert_eq!(tree.enclosing_object(element), Some(root));
        assert!(tree.ancestors(root).is_empty());
        assert_eq!(tree.enclosing_object(root), None);
    }

    #[test]
    fn test_paths() {
        let (tree, root) = sample_tree();
        let meta = tree.property(root, "meta").unwrap();
        let title = tree.property(meta, "title").unwrap();
        let items = tree.property(root, "items").unwrap();
        let second = tree.array(items).unwrap().values()[1];
        let schema = tree.array(items).unwrap().schema();

        assert_eq!(tree.path_of(title).as_deref(), Some("meta.title"));
        assert_eq!(tree.path_of(second).as_deref(), Some("items.1"));
        assert_eq!(tree.path_of(schema).as_deref(), Some("items.Schema"));
        assert_eq!(tree.path_of(root).as_deref(), Some(""));

        assert_eq!(tree.find_path(root, "meta.title"), Some(title));
        assert_eq!(tree.find_path(root, "items.1"), Some(second));
        assert_eq!(tree.find_path(root, "items.Schema"), Some(schema));
        assert_eq!(tree.find_path(root, "items.5"), None);
        assert_eq!(tree.find_path(root, "meta.title.deeper"), None);
        assert_eq!(tree.find_path(root, ""), Some(root));
    }

    #[test]
    fn test_set_value_checks_kind() {
        let (mut tree, root) = sample_tree();
        let title = tree.find_path(root, "meta.title").unwrap();

        assert_eq!(
            tree.set_value(title, 5),
            Err(TreeError::KindMismatch {
                id: title,
                expected: PrimitiveKind::String,
                found: PrimitiveKind::Integer,
            })
        );
        assert!(matches!(
            tree.set_value(root, "text"),
            Err(TreeError::UnexpectedVariant { .. })
        ));
        assert_eq!(
            tree.value(title).unwrap(),
            &PrimitiveValue::String("Notes".to_string())
        );
    }

    #[test]
    fn test_enum_editing() {
        let mut tree = ValueTree::new();
        let status = tree.create_enum(["Open", "Closed"]);

        tree.select_enum_member(status, "Closed").unwrap();
        assert_eq!(tree.value(status).unwrap(), &PrimitiveValue::Integer(1));

        tree.set_value(status, 0).unwrap();
        assert_eq!(
            tree.node(status).unwrap().as_enum().unwrap().selected_name(),
            Some("Open")
        );

        assert!(matches!(
            tree.set_value(status, 4),
            Err(TreeError::EnumMemberNotFound { .. })
        ));
        assert!(matches!(
            tree.select_enum_member(status, "Archived"),
            Err(TreeError::EnumMemberNotFound { .. })
        ));
    }

    #[test]
    fn test_stale_handles() {
        let (mut tree, root) = sample_tree();
        let meta = tree.property(root, "meta").unwrap();
        tree.remove_property(root, "meta").unwrap();

        // A reused slot gets a new generation
        let fresh = tree.create_object();
        assert_ne!(fresh, meta);
        assert!(tree.contains(fresh));

        assert_eq!(tree.node(meta), Err(TreeError::node_not_found(meta)));
        assert_eq!(tree.path_of(meta), None);
        assert!(tree.clone_node(meta).is_err());
        assert!(tree.discard(meta).is_err());
        assert!(tree.set_context_reference(meta, None).is_err());
    }

    #[test]
    fn test_freed_slots_are_reused() {
        let mut tree = ValueTree::new();
        let root = tree.create_object();

        let mut previous = None;
        for _ in 0..100 {
            let scratch = tree
                .create_property(root, "scratch", PrimitiveKind::String.into())
                .unwrap()
                .element;
            tree.remove_property(root, "scratch").unwrap();
            assert!(!tree.contains(scratch));
            if let Some(previous) = previous {
                assert_ne!(scratch, previous);
            }
            previous = Some(scratch);
        }

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.entries.len(), 2);

        let stale = previous.unwrap();
        let reused = tree.create_leaf(5);
        assert_eq!(reused.index(), stale.index());
        assert_eq!(reused.generation(), stale.generation() + 1);
        assert_eq!(tree.node(stale), Err(TreeError::node_not_found(stale)));
        assert_eq!(tree.value(reused).unwrap(), &PrimitiveValue::Integer(5));
    }

    #[test]
    fn test_release_since_frees_reused_slots() {
        let mut tree = ValueTree::new();
        let root = tree.create_object();
        let spare = tree.create_object();
        tree.discard(spare).unwrap();

        let mark = tree.watermark();
        let leaf = tree.create_leaf(1);
        let object = tree.create_object();
        assert_eq!(leaf.index(), spare.index());

        tree.release_since(mark);
        assert!(!tree.contains(leaf));
        assert!(!tree.contains(object));
        assert!(tree.contains(root));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_context_reference_editing() {
        let mut tree = ValueTree::new();
        let leaf = tree.create_value(PrimitiveKind::String);

        tree.set_context_reference(leaf, Some("settings.name".to_string())).unwrap();
        assert_eq!(tree.leaf(leaf).unwrap().reference(), Some("settings.name"));

        tree.set_context_reference(leaf, None).unwrap();
        assert_eq!(tree.leaf(leaf).unwrap().reference(), None);

        let object = tree.create_object();
        assert!(tree
            .set_context_reference(object, Some("x".to_string()))
            .is_err());
    }

    #[test]
    fn test_create_default_array_uses_string_schema() {
        let mut tree = ValueTree::new();
        let array = tree.create_default(NodeKind::Array);
        let schema = tree.array(array).unwrap().schema();

        assert!(matches!(tree.node(schema).unwrap(), Node::Value(_)));
        assert_eq!(tree.leaf(schema).unwrap().data_type, PrimitiveKind::String);
        assert_eq!(tree.parent(schema), Some(array));
        assert!(tree.is_attached(schema));
    }

    #[test]
    fn test_with_config_validates() {
        let config = ModelConfig {
            schema_property_name: "  ".to_string(),
            ..ModelConfig::default()
        };
        assert!(matches!(
            ValueTree::with_config(config),
            Err(TreeError::InvalidConfig(_))
        ));
    }
}
