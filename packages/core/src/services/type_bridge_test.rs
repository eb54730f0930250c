//! Tests for the type bridge
//!
//! Tests cover:
//! - Round trips for flat, nested, list and enum records
//! - Templates built without an instance
//! - Unsupported targets and unknown members
//! - Conversion after context resolution
//! - Numeric edges of the carried kinds

#[cfg(test)]
mod tests {
    use crate::models::{Node, PrimitiveKind, PrimitiveValue, ValueTree};
    use crate::services::error::BridgeError;
    use crate::services::reference_resolver::ContextMap;
    use crate::services::reflect::{HostValue, Reflect, TypeDescriptor};
    use crate::services::type_bridge::{
        export, from_node, from_node_with_context, import, template, to_node,
    };
    use crate::{reflect_enum, reflect_record};
    use chrono::{TimeDelta, TimeZone, Utc};
    use rust_decimal::Decimal;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Contact {
        name: String,
        age: i64,
        balance: Decimal,
        active: bool,
    }
    reflect_record!(Contact { name, age, balance, active });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Address {
        street: String,
        city: String,
    }
    reflect_record!(Address { street, city });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Customer {
        name: String,
        address: Address,
    }
    reflect_record!(Customer { name, address });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Playlist {
        title: String,
        track_ids: Vec<i64>,
    }
    reflect_record!(Playlist { title, track_ids });

    #[derive(Debug, Clone, Default, PartialEq)]
    enum Status {
        #[default]
        Draft,
        Review,
        Published,
    }
    reflect_enum!(Status { Draft, Review, Published });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Article {
        headline: String,
        status: Status,
        rendered: String,
    }
    reflect_record!(Article { headline, status }, ignore { rendered });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Category {
        label: String,
        children: Vec<Category>,
    }
    reflect_record!(Category { label, children });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Reading {
        sensor: String,
        value: f64,
    }
    reflect_record!(Reading { sensor, value });

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counters {
        offset: i32,
        total: u32,
    }
    reflect_record!(Counters { offset, total });

    mod billing {
        use crate::reflect_record;

        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct Account {
            pub iban: String,
        }
        reflect_record!(Account { iban });
    }

    /// Shares its type name with `billing::Account`
    #[derive(Debug, Clone, Default, PartialEq)]
    struct Account {
        owner: String,
        billing: billing::Account,
    }
    reflect_record!(Account { owner, billing });

    fn round_trip<T: Reflect + Clone + PartialEq + std::fmt::Debug>(value: &T) -> T {
        let mut tree = ValueTree::new();
        let node = import(&mut tree, value).unwrap();
        export::<T>(&tree, node).unwrap()
    }

    #[test]
    fn test_flat_record_round_trip() {
        let contact = Contact {
            name: "Grace".to_string(),
            age: 85,
            balance: Decimal::new(100_050, 2),
            active: true,
        };
        assert_eq!(round_trip(&contact), contact);
    }

    #[test]
    fn test_nested_record_round_trip() {
        let customer = Customer {
            name: "Ada".to_string(),
            address: Address {
                street: "12 Analytical Way".to_string(),
                city: "London".to_string(),
            },
        };
        assert_eq!(round_trip(&customer), customer);
    }

    #[test]
    fn test_list_record_round_trip() {
        let playlist = Playlist {
            title: "Focus".to_string(),
            track_ids: vec![3, 1, 4, 1, 5],
        };
        assert_eq!(round_trip(&playlist), playlist);
    }

    #[test]
    fn test_enum_record_round_trip() {
        let article = Article {
            headline: "Arena allocation".to_string(),
            status: Status::Published,
            rendered: String::new(),
        };
        assert_eq!(round_trip(&article), article);
    }

    #[test]
    fn test_record_shape_in_tree() {
        let mut tree = ValueTree::new();
        let article = Article {
            headline: "Hello".to_string(),
            status: Status::Review,
            rendered: "<h1>Hello</h1>".to_string(),
        };
        let node = import(&mut tree, &article).unwrap();

        let names: Vec<&str> = tree.object(node).unwrap().names().collect();
        assert_eq!(names, vec!["headline", "status"]);

        let status = tree.property(node, "status").unwrap();
        let enum_node = tree.node(status).unwrap().as_enum().unwrap();
        assert_eq!(enum_node.selected_name(), Some("Review"));
        assert_eq!(enum_node.available.len(), 3);
    }

    #[test]
    fn test_template_uses_defaults() {
        let mut tree = ValueTree::new();
        let node = template::<Playlist>(&mut tree).unwrap();

        let title = tree.property(node, "title").unwrap();
        assert_eq!(
            tree.value(title).unwrap(),
            &PrimitiveValue::String(String::new())
        );

        let tracks = tree.property(node, "track_ids").unwrap();
        let array = tree.array(tracks).unwrap();
        assert!(array.is_empty());
        assert_eq!(
            tree.leaf(array.schema()).unwrap().data_type,
            PrimitiveKind::Integer
        );
    }

    #[test]
    fn test_recursive_record_template_is_finite() {
        let mut tree = ValueTree::new();
        let node = template::<Category>(&mut tree).unwrap();

        let children = tree.property(node, "children").unwrap();
        let schema = tree.array(children).unwrap().schema();
        assert!(tree.object(schema).unwrap().is_empty());

        let nested = Category {
            label: "root".to_string(),
            children: vec![Category {
                label: "leaf".to_string(),
                children: Vec::new(),
            }],
        };
        assert_eq!(round_trip(&nested), nested);
    }

    #[test]
    fn test_primitive_defaults() {
        let mut tree = ValueTree::new();
        let when = to_node(&mut tree, &chrono::DateTime::<Utc>::descriptor(), None).unwrap();
        let span = to_node(&mut tree, &TimeDelta::descriptor(), None).unwrap();

        assert!(tree.value(when).unwrap().as_date_time().is_some());
        assert_eq!(
            tree.value(span).unwrap(),
            &PrimitiveValue::Duration(TimeDelta::zero())
        );
    }

    #[test]
    fn test_date_time_round_trip() {
        let mut tree = ValueTree::new();
        let when = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        let node = import(&mut tree, &when).unwrap();
        assert_eq!(export::<chrono::DateTime<Utc>>(&tree, node).unwrap(), when);
    }

    #[test]
    fn test_unknown_property_is_member_not_found() {
        let mut tree = ValueTree::new();
        let node = import(&mut tree, &Address::default()).unwrap();
        tree.create_property(node, "postcode", PrimitiveKind::String.into()).unwrap();

        assert_eq!(
            export::<Address>(&tree, node),
            Err(BridgeError::member_not_found("Address", "postcode"))
        );
    }

    #[test]
    fn test_ignored_member_is_not_assignable() {
        let mut tree = ValueTree::new();
        let node = import(&mut tree, &Article::default()).unwrap();
        tree.create_property(node, "rendered", PrimitiveKind::String.into()).unwrap();

        assert!(matches!(
            export::<Article>(&tree, node),
            Err(BridgeError::MemberNotFound { member, .. }) if member == "rendered"
        ));
    }

    #[test]
    fn test_array_needs_appendable_list() {
        let mut tree = ValueTree::new();
        let array = tree.create_array(PrimitiveKind::Integer.into());
        tree.create_element(array).unwrap();

        let fixed = TypeDescriptor::list("FixedPair", i64::descriptor, false);
        assert!(matches!(
            from_node(&tree, array, &fixed),
            Err(BridgeError::UnsupportedTargetType { .. })
        ));
        assert!(matches!(
            from_node(&tree, array, &Address::descriptor()),
            Err(BridgeError::UnsupportedTargetType { .. })
        ));
    }

    #[test]
    fn test_object_needs_constructible_record() {
        let mut tree = ValueTree::new();
        let object = tree.create_object();

        let mut descriptor = Address::descriptor();
        descriptor.default = None;
        assert!(matches!(
            from_node(&tree, object, &descriptor),
            Err(BridgeError::UnsupportedTargetType { .. })
        ));
        assert!(matches!(
            from_node(&tree, object, &Vec::<i64>::descriptor()),
            Err(BridgeError::UnsupportedTargetType { .. })
        ));
    }

    #[test]
    fn test_enum_index_out_of_range() {
        let mut tree = ValueTree::new();
        let status = tree.create_enum(["A", "B", "C", "D"]);
        tree.set_value(status, 3).unwrap();

        assert!(matches!(
            from_node(&tree, status, &Status::descriptor()),
            Err(BridgeError::InvalidEnumIndex { index: 3, .. })
        ));
    }

    #[test]
    fn test_instance_mismatch_frees_partial_nodes() {
        let mut tree = ValueTree::new();
        let before = tree.len();
        // `name` converts fine, `address` has the wrong shape
        let mut fields = crate::IndexMap::new();
        fields.insert("name".to_string(), "Ada".to_string().to_host().unwrap());
        fields.insert("address".to_string(), HostValue::Enum(0));
        let wrong = HostValue::Record(fields);

        assert!(matches!(
            to_node(&mut tree, &Customer::descriptor(), Some(&wrong)),
            Err(BridgeError::InstanceMismatch { .. })
        ));
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn test_from_node_with_context() {
        let mut context_tree = ValueTree::new();
        let context = context_tree.create_object();
        let city = context_tree.create_leaf("Paris");
        context_tree.add_property(context, "home_city", city).unwrap();

        let mut tree = ValueTree::new();
        let node = template::<Address>(&mut tree).unwrap();
        let target = tree.property(node, "city").unwrap();
        tree.set_context_reference(target, Some("home_city".to_string())).unwrap();

        let map = ContextMap::from_object(&context_tree, context).unwrap();
        let host = from_node_with_context(&mut tree, node, &Address::descriptor(), &map).unwrap();
        let address = Address::from_host(host).unwrap();
        assert_eq!(address.city, "Paris");
    }

    #[test]
    fn test_from_node_with_context_propagates_failure() {
        let mut tree = ValueTree::new();
        let node = template::<Address>(&mut tree).unwrap();
        let target = tree.property(node, "street").unwrap();
        tree.set_context_reference(target, Some("nowhere".to_string())).unwrap();

        let context_tree = ValueTree::new();
        let map = ContextMap::from_references(&context_tree, Vec::new());
        assert!(matches!(
            from_node_with_context(&mut tree, node, &Address::descriptor(), &map),
            Err(BridgeError::Context(_))
        ));
    }

    #[test]
    fn test_value_node_returned_as_is() {
        let mut tree = ValueTree::new();
        let leaf = tree.create_leaf(true);
        // The descriptor is not consulted for plain values
        let host = from_node(&tree, leaf, &String::descriptor()).unwrap();
        assert_eq!(host, HostValue::Primitive(PrimitiveValue::Boolean(true)));
        assert!(String::from_host(host).is_err());
    }

    #[test]
    fn test_edited_tree_exports_edits() {
        let mut tree = ValueTree::new();
        let playlist = Playlist {
            title: "Mix".to_string(),
            track_ids: vec![1],
        };
        let node = import(&mut tree, &playlist).unwrap();

        let tracks = tree.property(node, "track_ids").unwrap();
        assert!(matches!(tree.node(tracks).unwrap(), Node::Array(_)));
        let added = tree.create_element(tracks).unwrap();
        tree.set_value(added.element, 9).unwrap();
        let title = tree.property(node, "title").unwrap();
        tree.set_value(title, "Evening mix").unwrap();

        let exported = export::<Playlist>(&tree, node).unwrap();
        assert_eq!(exported.title, "Evening mix");
        assert_eq!(exported.track_ids, vec![1, 9]);
    }

    #[test]
    fn test_float_record_round_trip_keeps_digits() {
        for value in [123456789.123456789, 0.1 + 0.2, -2.5e-9] {
            let reading = Reading {
                sensor: "t1".to_string(),
                value,
            };
            assert_eq!(round_trip(&reading), reading);
        }
    }

    #[test]
    fn test_float_without_exact_decimal_fails_import() {
        let mut tree = ValueTree::new();
        for value in [1e30, 1e-30, f64::MAX] {
            let reading = Reading {
                sensor: "t1".to_string(),
                value,
            };
            assert!(matches!(
                import(&mut tree, &reading),
                Err(BridgeError::ValueMismatch { .. })
            ));
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_narrow_integer_record_round_trip() {
        for counters in [
            Counters {
                offset: i32::MIN,
                total: u32::MAX,
            },
            Counters {
                offset: -1,
                total: 0,
            },
        ] {
            assert_eq!(round_trip(&counters), counters);
        }
    }

    #[test]
    fn test_narrow_integer_out_of_range_fails_export() {
        let mut tree = ValueTree::new();
        let node = import(&mut tree, &Counters::default()).unwrap();
        let total = tree.property(node, "total").unwrap();
        tree.set_value(total, -1).unwrap();

        assert!(matches!(
            export::<Counters>(&tree, node),
            Err(BridgeError::ValueMismatch { .. })
        ));
    }

    #[test]
    fn test_same_named_record_types_are_distinct() {
        let mut tree = ValueTree::new();
        let node = template::<Account>(&mut tree).unwrap();

        let nested = tree.property(node, "billing").unwrap();
        let names: Vec<&str> = tree.object(nested).unwrap().names().collect();
        assert_eq!(names, vec!["iban"]);

        let account = Account {
            owner: "Ada".to_string(),
            billing: billing::Account {
                iban: "GB00 0000".to_string(),
            },
        };
        assert_eq!(round_trip(&account), account);
    }
}
