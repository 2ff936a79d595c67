use nova_ioc_metadata::{
    MarkerTable, MarkerUse, MemberKind, MetadataError, MetadataRegistry, RegistryConfig, Scope,
    TypeDescriptor,
};
use nova_ioc_types::{parse_type, ClassKind, TypeKey, TypeStore};
use pretty_assertions::assert_eq;

use super::{ctor, field, method, registry};

fn ty(text: &str) -> nova_ioc_types::Type {
    parse_type(text).unwrap()
}

#[test]
fn constructor_provides_type_and_supertypes_with_class_qualifier() {
    let registry = registry(vec![
        TypeDescriptor::interface("Repo").type_params(&["T"]),
        TypeDescriptor::class("UserRepo")
            .implements("Repo<User>")
            .marker(MarkerUse::named("users"))
            .constructor(ctor(&[])),
    ]);

    let class = registry.class_by_name("UserRepo").unwrap();
    let ctor = registry.member(class.constructor());
    assert_eq!(ctor.kind(), MemberKind::Constructor);
    assert_eq!(
        ctor.provided_type_keys(),
        &[
            TypeKey::provided(ty("UserRepo"), Some("users".into())),
            TypeKey::provided(ty("Repo<User>"), Some("users".into())),
        ]
    );
    assert_eq!(class.scope(), Scope::Singleton);
    assert!(registry.class_by_name("Repo").is_none(), "interfaces are not components");
}

#[test]
fn generic_superclass_members_resolve_against_leaf_arguments() {
    let registry = registry(vec![
        TypeDescriptor::new("Base", ClassKind::Abstract)
            .type_params(&["T"])
            .field(field("value", "T").marker(MarkerUse::inject()))
            .method(method("wrap", &["T"], Some("List<T>")).marker(MarkerUse::provides())),
        TypeDescriptor::class("IntBase")
            .extends("Base<Integer>")
            .constructor(ctor(&[])),
    ]);

    let class = registry.class_by_name("IntBase").unwrap();
    let value = registry.member(class.fields()[0]);
    assert_eq!(value.declared_in(), "Base");
    assert_eq!(
        value.dependencies().last().map(|d| &d.key),
        Some(&TypeKey::required(registry.store(), ty("Integer"), None))
    );

    let wrap = registry.member(class.methods()[0]);
    assert_eq!(wrap.signature().params, vec![ty("Integer")]);
    assert_eq!(
        wrap.provided_type_keys(),
        &[TypeKey::provided(ty("List<Integer>"), None)]
    );
    assert_eq!(wrap.signature().to_string(), "IntBase.wrap(Integer)");
}

#[test]
fn most_derived_override_wins_and_synthetic_members_are_skipped() {
    let registry = registry(vec![
        TypeDescriptor::new("Base", ClassKind::Abstract)
            .method(method("make", &[], Some("String")).marker(MarkerUse::provides()))
            .method(method("other", &[], Some("Integer")).marker(MarkerUse::provides())),
        TypeDescriptor::class("Leaf")
            .extends("Base")
            .constructor(ctor(&[]))
            // Unmarked override hides the inherited provider.
            .method(method("make", &[], Some("String")))
            .method(
                method("bridge", &[], Some("Long"))
                    .marker(MarkerUse::provides())
                    .synthetic(),
            ),
    ]);

    let class = registry.class_by_name("Leaf").unwrap();
    let names: Vec<&str> = class
        .methods()
        .iter()
        .map(|id| registry.member(*id).name())
        .collect();
    assert_eq!(names, vec!["other"]);
}

#[test]
fn constructor_choice() {
    let build = |desc: TypeDescriptor| {
        MetadataRegistry::build(RegistryConfig {
            descriptors: vec![desc],
            ..RegistryConfig::default()
        })
    };

    let err = build(
        TypeDescriptor::class("Two")
            .constructor(ctor(&[]))
            .constructor(ctor(&["String"])),
    )
    .unwrap_err();
    assert!(
        matches!(err, MetadataError::AmbiguousConstructor { count: 2, .. }),
        "{err}"
    );

    let err = build(TypeDescriptor::class("None")).unwrap_err();
    assert!(matches!(err, MetadataError::MissingConstructor { .. }), "{err}");

    let registry = build(
        TypeDescriptor::class("Picked")
            .constructor(ctor(&[]))
            .constructor(ctor(&["String"]).marker(MarkerUse::inject())),
    )
    .unwrap();
    let class = registry.class_by_name("Picked").unwrap();
    assert_eq!(
        registry.member(class.constructor()).signature().params,
        vec![ty("String")]
    );
}

#[test]
fn meta_markers_and_handlers() {
    let mut markers = MarkerTable::new();
    markers.register("Bean", &["Provides"]).unwrap();
    markers.register("OnClick", &["Handler"]).unwrap();

    let registry = MetadataRegistry::build(RegistryConfig {
        store: TypeStore::new(),
        markers,
        descriptors: vec![TypeDescriptor::class("Ui")
            .constructor(ctor(&[]))
            .method(method("clock", &[], Some("Clock")).marker(MarkerUse::new("Bean")))
            .method(method("clicked", &["Click"], None).marker(MarkerUse::new("OnClick")))],
    })
    .unwrap();

    let class = registry.class_by_name("Ui").unwrap();
    let clock = registry.member(class.methods()[0]);
    assert!(clock.flags().provider);
    assert_eq!(clock.provided_type_keys(), &[TypeKey::provided(ty("Clock"), None)]);

    let clicked = registry.member(class.methods()[1]);
    assert!(clicked.is_taskable());
    assert!(clicked.dependencies().is_empty());
    assert_eq!(clicked.handler_key().map(|h| h.marker()), Some("OnClick"));
    assert!(registry
        .providers_of(&TypeKey::required(registry.store(), ty("Clock"), None))
        .contains(&clock.id()));
}

#[test]
fn property_and_optional_parameters() {
    let registry = registry(vec![TypeDescriptor::class("Db").constructor(
        nova_ioc_metadata::ConstructorDescriptor::new(
            vec![
                nova_ioc_metadata::ParamDescriptor::new("url", "String")
                    .marker(MarkerUse::property("db.url")),
                nova_ioc_metadata::ParamDescriptor::new("pool", "Pool")
                    .marker(MarkerUse::new("Optional")),
            ],
            |_| Ok(std::sync::Arc::new(()) as nova_ioc_metadata::Value),
        ),
    )]);

    let ctor = registry.member(registry.class_by_name("Db").unwrap().constructor());
    let deps = ctor.dependencies();
    assert_eq!(deps[0].key, TypeKey::property("db.url"));
    assert!(!deps[0].optional);
    assert!(deps[1].optional);
}

#[test]
fn invalid_descriptors_are_rejected() {
    let result = MetadataRegistry::build(RegistryConfig {
        descriptors: vec![
            TypeDescriptor::class("Dup").constructor(ctor(&[])),
            TypeDescriptor::class("Dup").constructor(ctor(&[])),
        ],
        ..RegistryConfig::default()
    });
    assert!(matches!(result, Err(MetadataError::DuplicateType { .. })));

    let result = MetadataRegistry::build(RegistryConfig {
        descriptors: vec![TypeDescriptor::class("Bad").constructor(ctor(&["List<"]))],
        ..RegistryConfig::default()
    });
    assert!(matches!(result, Err(MetadataError::Type { .. })));

    let result = MetadataRegistry::build(RegistryConfig {
        descriptors: vec![TypeDescriptor::class("Both")
            .marker(MarkerUse::new("Singleton"))
            .marker(MarkerUse::new("Prototype"))
            .constructor(ctor(&[]))],
        ..RegistryConfig::default()
    });
    assert!(matches!(result, Err(MetadataError::ConflictingScope { .. })));

    let result = MetadataRegistry::build(RegistryConfig {
        descriptors: vec![TypeDescriptor::class("Void")
            .constructor(ctor(&[]))
            .method(method("nothing", &[], None).marker(MarkerUse::provides()))],
        ..RegistryConfig::default()
    });
    assert!(matches!(result, Err(MetadataError::UnsupportedMember { .. })));
}
