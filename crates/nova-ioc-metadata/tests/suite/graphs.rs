use nova_ioc_metadata::{MarkerUse, TypeDescriptor};
use pretty_assertions::assert_eq;

use super::{ctor, field, method, registry};

#[test]
fn constructor_dependency_produces_member_and_class_edges() {
    let registry = registry(vec![
        TypeDescriptor::class("A").constructor(ctor(&["B"])),
        TypeDescriptor::class("B").constructor(ctor(&[])),
    ]);
    let a = registry.class_by_name("A").unwrap();
    let b = registry.class_by_name("B").unwrap();

    assert!(registry
        .member_graph()
        .has_edge(a.constructor(), b.constructor()));
    assert!(!registry
        .member_graph()
        .has_edge(b.constructor(), a.constructor()));
    assert!(registry.class_graph().has_edge(a.id(), b.id()));
    assert!(!registry.has_cycle_between_members());
    assert!(!registry.has_cycle_between_classes());
}

#[test]
fn provider_methods_on_one_class_form_a_member_cycle() {
    let registry = registry(vec![TypeDescriptor::class("Conv")
        .constructor(ctor(&[]))
        .method(method("m1", &["Integer"], Some("String")).marker(MarkerUse::provides()))
        .method(method("m2", &["String"], Some("Integer")).marker(MarkerUse::provides()))]);

    let class = registry.class_by_name("Conv").unwrap();
    let (m1, m2) = (class.methods()[0], class.methods()[1]);

    assert!(registry.has_cycle_between_members());
    let cycle_set = registry.member_graph().cycle_set();
    assert!(cycle_set.contains(&m1));
    assert!(cycle_set.contains(&m2));
    assert!(!cycle_set.contains(&class.constructor()));
    // Both methods still depend on their receiver.
    assert!(registry.member_graph().has_edge(m1, class.constructor()));
    // A single class never cycles with itself.
    assert!(!registry.has_cycle_between_classes());
}

#[test]
fn constructor_ignores_members_of_its_own_class() {
    let registry = registry(vec![TypeDescriptor::class("Selfish")
        .constructor(ctor(&["Clock"]))
        .method(method("clock", &[], Some("Clock")).marker(MarkerUse::provides()))]);

    let class = registry.class_by_name("Selfish").unwrap();
    assert_eq!(
        registry
            .member_graph()
            .successors(class.constructor())
            .count(),
        0
    );
    assert!(!registry.has_cycle_between_members());
}

#[test]
fn receivers_bind_to_the_owner_constructor_only() {
    // `Special` also provides `Base` through its supertypes.
    let registry = registry(vec![
        TypeDescriptor::class("Base")
            .constructor(ctor(&[]))
            .field(field("clock", "Clock").marker(MarkerUse::inject())),
        TypeDescriptor::class("Special")
            .extends("Base")
            .constructor(ctor(&[])),
    ]);

    let base = registry.class_by_name("Base").unwrap();
    let special = registry.class_by_name("Special").unwrap();
    let clock_field = base.fields()[0];
    let successors: Vec<_> = registry.member_graph().successors(clock_field).collect();
    assert_eq!(successors, vec![base.constructor()]);

    // The inherited field belongs to `Special` and wires into its constructor.
    let inherited = special.fields()[0];
    assert_eq!(
        registry.member_graph().successors(inherited).collect::<Vec<_>>(),
        vec![special.constructor()]
    );
}

#[test]
fn collection_requirements_link_every_element_provider() {
    let registry = registry(vec![
        TypeDescriptor::interface("Plugin"),
        TypeDescriptor::class("Host").constructor(ctor(&["List<Plugin>"])),
        TypeDescriptor::class("P1")
            .implements("Plugin")
            .marker(MarkerUse::named("first"))
            .constructor(ctor(&[])),
        TypeDescriptor::class("P2").implements("Plugin").constructor(ctor(&[])),
    ]);
    let host = registry.class_by_name("Host").unwrap();
    assert_eq!(registry.member_graph().successors(host.constructor()).count(), 2);
    assert_eq!(registry.class_graph().successors(host.id()).count(), 2);
}

#[test]
fn class_cycle_is_reported_with_both_classes() {
    let registry = registry(vec![
        TypeDescriptor::class("Left").constructor(ctor(&["Right"])),
        TypeDescriptor::class("Right")
            .constructor(ctor(&[]))
            .field(field("left", "Left").marker(MarkerUse::inject())),
    ]);
    let cycles = registry.class_graph().cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].len(), 2);
    // The member graph has no cycle: the field runs after both constructors.
    assert!(!registry.has_cycle_between_members());
}
