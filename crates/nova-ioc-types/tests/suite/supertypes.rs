use nova_ioc_types::{
    generic_supertypes, parse_type, parse_type_with_vars, substitute, type_bindings, ClassDef,
    ClassKind, Type, TypeEnv, TypeStore,
};

use pretty_assertions::assert_eq;

fn class(name: &str, kind: ClassKind, params: &[&str], sup: Option<&str>, ifaces: &[&str]) -> ClassDef {
    let mut def = ClassDef::new(name, kind);
    def.type_params = params.iter().map(|p| (*p).into()).collect();
    def.super_class = sup.map(|s| parse_type_with_vars(s, params).unwrap());
    def.interfaces = ifaces
        .iter()
        .map(|i| parse_type_with_vars(i, params).unwrap())
        .collect();
    def
}

#[test]
fn nested_arguments_flow_through_two_levels() {
    let mut store = TypeStore::new();
    store.add_class(class("Source", ClassKind::Interface, &["T"], None, &[]));
    store.add_class(class(
        "Holder",
        ClassKind::Abstract,
        &["T"],
        None,
        &["Source<List<T>>"],
    ));
    store.add_class(class(
        "Pair",
        ClassKind::Abstract,
        &["K", "V"],
        Some("Holder<V>"),
        &[],
    ));
    store.add_class(class(
        "Leaf",
        ClassKind::Class,
        &[],
        Some("Pair<String, Integer>"),
        &[],
    ));

    let sups = generic_supertypes(&store, &Type::named("Leaf"));
    assert_eq!(
        sups,
        vec![
            parse_type("Leaf").unwrap(),
            parse_type("Pair<String, Integer>").unwrap(),
            parse_type("Holder<Integer>").unwrap(),
            parse_type("Source<List<Integer>>").unwrap(),
            Type::top(),
        ]
    );
}

#[test]
fn bindings_ignore_arity_mismatch() {
    let mut store = TypeStore::new();
    store.add_class(class("Pair", ClassKind::Abstract, &["K", "V"], None, &[]));
    let def = store.class("Pair").unwrap();

    assert!(type_bindings(def, &[Type::named("String")]).is_empty());

    let bindings = type_bindings(def, &[Type::named("String"), Type::named("Integer")]);
    assert_eq!(
        substitute(&parse_type_with_vars("Map<V, K[]>", &["K", "V"]).unwrap(), &bindings),
        parse_type("Map<Integer, String[]>").unwrap()
    );
}

#[test]
fn unknown_classes_are_leaves_below_the_top_type() {
    let store = TypeStore::new();
    assert_eq!(
        generic_supertypes(&store, &Type::named("Mystery")),
        vec![Type::named("Mystery"), Type::top()]
    );
    assert_eq!(generic_supertypes(&store, &Type::top()), vec![Type::top()]);
}
