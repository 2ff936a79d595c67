use std::sync::Arc;

use nova_ioc::validation::{IOC_CYCLE, IOC_UNRESOLVED};
use nova_ioc::{
    BootstrapError, ConfigError, Container, ContainerBuilder, ContainerConfig, OrderingError,
    OrderingService,
};
use nova_ioc_metadata::{ConstructorDescriptor, StaticScanner, TypeDescriptor};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::{build, container, ctor, unit_ctor, value};

fn logged(
    log: &Arc<Mutex<Vec<&'static str>>>,
    name: &'static str,
    deps: &[&str],
) -> ConstructorDescriptor {
    let log = Arc::clone(log);
    ctor(deps, move |_| {
        log.lock().push(name);
        Ok(value(name))
    })
}

#[test]
fn constructor_dependency_is_created_first() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let container = container(vec![
        TypeDescriptor::class("A").constructor(logged(&log, "A", &["B"])),
        TypeDescriptor::class("B").constructor(logged(&log, "B", &[])),
    ]);

    let registry = container.registry();
    let a = registry.class_by_name("A").unwrap();
    let b = registry.class_by_name("B").unwrap();
    let position = |id| container.order().iter().position(|m| *m == id).unwrap();
    assert!(position(b.constructor()) < position(a.constructor()));
    assert_eq!(
        OrderingService::new(registry).class_order().unwrap(),
        vec![b.id(), a.id()]
    );
    assert_eq!(*log.lock(), vec!["B", "A"]);
}

#[test]
fn missing_dependency_fails_validation() {
    let err = build(vec![TypeDescriptor::class("A").constructor(unit_ctor(&["B"]))]).unwrap_err();
    let BootstrapError::Validation(err) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(err.issues.len(), 1);
    assert_eq!(err.issues[0].code, IOC_UNRESOLVED);
    assert_eq!(err.issues[0].implicated, vec!["A.new(B)".to_string(), "B".to_string()]);
    assert!(err.to_string().contains("IOC_UNRESOLVED"), "{err}");
}

#[test]
fn constructor_cycle_is_reported_for_both_graphs() {
    let err = build(vec![
        TypeDescriptor::class("A").constructor(unit_ctor(&["B"])),
        TypeDescriptor::class("B").constructor(unit_ctor(&["A"])),
    ])
    .unwrap_err();
    let BootstrapError::Validation(err) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(err.issues.iter().all(|issue| issue.code == IOC_CYCLE));
    assert_eq!(err.issues.len(), 2);
    assert_eq!(err.issues[0].implicated, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(
        err.issues[1].implicated,
        vec!["A.new(B)".to_string(), "B.new(A)".to_string()]
    );
}

#[test]
fn ordering_refuses_cycles_when_validation_is_off() {
    let mut config = ContainerConfig::default();
    config.validation.cycles = false;
    let err = ContainerBuilder::new()
        .config(config)
        .descriptor(TypeDescriptor::class("A").constructor(unit_ctor(&["B"])))
        .descriptor(TypeDescriptor::class("B").constructor(unit_ctor(&["A"])))
        .build()
        .unwrap_err();
    match err {
        BootstrapError::Ordering(OrderingError::Cyclic { nodes }) => {
            assert_eq!(nodes, vec!["A.new(B)".to_string(), "B.new(A)".to_string()]);
        }
        other => panic!("expected an ordering error, got {other:?}"),
    }
}

#[test]
fn lazy_bootstrap_defers_instantiation() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let config = ContainerConfig {
        eager_singletons: false,
        ..ContainerConfig::default()
    };
    let container = ContainerBuilder::new()
        .config(config)
        .descriptor(TypeDescriptor::class("A").constructor(logged(&log, "A", &["B"])))
        .descriptor(TypeDescriptor::class("B").constructor(logged(&log, "B", &[])))
        .build()
        .unwrap();
    assert!(log.lock().is_empty());

    container.get_instance("A").unwrap();
    assert_eq!(*log.lock(), vec!["B", "A"]);
}

#[test]
fn bootstrap_scans_configured_packages_only() {
    let scanner = StaticScanner::new(vec![
        TypeDescriptor::class("app.Service").constructor(unit_ctor(&["app.store.Db"])),
        TypeDescriptor::class("app.store.Db").constructor(unit_ctor(&[])),
        // Would fail validation if it were scanned.
        TypeDescriptor::class("tools.Broken").constructor(unit_ctor(&["Missing"])),
    ]);
    let config = ContainerConfig {
        packages: vec!["app".into()],
        ..ContainerConfig::default()
    };

    let container = Container::bootstrap(config, &scanner).unwrap();
    assert_eq!(container.registry().classes().len(), 2);
    assert!(container.registry().class_by_name("tools.Broken").is_none());
    assert!(container.get_instance("app.Service").is_ok());
}

#[test]
fn config_file_drives_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nova-ioc.toml");
    std::fs::write(
        &path,
        r#"
packages = ["app"]
eager_singletons = false

[validation]
handler_params = false

[logging]
level = "nova.ioc=debug"
json = true

[properties]
"app.name" = "demo"
"#,
    )
    .unwrap();

    let config = ContainerConfig::load_from_path(&path).unwrap();
    assert_eq!(config.packages, vec!["app".to_string()]);
    assert!(!config.eager_singletons);
    assert!(!config.validation.handler_params);
    assert!(config.validation.cycles);
    assert!(config.logging.json);

    let container = Container::bootstrap(config, &StaticScanner::default()).unwrap();
    assert_eq!(container.property("app.name").unwrap().as_deref(), Some("demo"));
    assert_eq!(container.property("app.missing").unwrap(), None);
}

#[test]
fn config_rejects_unknown_keys_and_missing_files() {
    let err = ContainerConfig::load_from_str("eager = true").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");

    let err = ContainerConfig::load_from_str("[validation]\ncycle = false").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");

    let dir = tempfile::tempdir().unwrap();
    let err = ContainerConfig::load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "{err:?}");
}

#[test]
fn container_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Container>();
}
