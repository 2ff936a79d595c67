use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use nova_ioc::validation::IOC_UNRESOLVED;
use nova_ioc::{
    BootstrapError, Container, ContainerBuilder, ContainerConfig, Converter, CustomResolver,
    MapPropertySource, ResolveError, SharedConverter,
};
use nova_ioc_metadata::marker::builtin;
use nova_ioc_metadata::{ConstructorDescriptor, MarkerUse, ParamDescriptor, TypeDescriptor, Value};
use nova_ioc_types::{Type, TypeKey};
use pretty_assertions::assert_eq;

use super::{arg, ctor, value};

#[derive(Debug, PartialEq)]
struct Pool {
    url: String,
    size: u32,
}

fn pool_descriptor() -> TypeDescriptor {
    TypeDescriptor::class("Pool").constructor(ConstructorDescriptor::new(
        vec![
            ParamDescriptor::new("url", "String").marker(MarkerUse::property("db.url")),
            ParamDescriptor::new("size", "u32").marker(MarkerUse::property("db.pool")),
        ],
        |args| {
            Ok(value(Pool {
                url: arg::<String>(args, 0)?.as_str().to_owned(),
                size: *arg::<u32>(args, 1)?,
            }))
        },
    ))
}

fn config_with(properties: &[(&str, &str)]) -> ContainerConfig {
    ContainerConfig {
        properties: properties
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..ContainerConfig::default()
    }
}

#[test]
fn properties_are_converted_to_the_declared_type() {
    let container = ContainerBuilder::new()
        .config(config_with(&[("db.url", "postgres://db/app"), ("db.pool", " 8 ")]))
        .descriptor(pool_descriptor())
        .build()
        .unwrap();

    assert_eq!(
        *container.get::<Pool>("Pool").unwrap(),
        Pool {
            url: "postgres://db/app".into(),
            size: 8,
        }
    );
    assert_eq!(container.property("db.pool").unwrap().as_deref(), Some(" 8 "));
}

#[test]
fn code_sources_take_precedence_over_config() {
    let container = ContainerBuilder::new()
        .config(config_with(&[("db.url", "from-config"), ("db.pool", "4")]))
        .property_source(Arc::new(MapPropertySource::new().with("db.url", "from-code")))
        .descriptor(pool_descriptor())
        .build()
        .unwrap();

    let pool = container.get::<Pool>("Pool").unwrap();
    assert_eq!(pool.url, "from-code");
    assert_eq!(pool.size, 4);
}

#[test]
fn missing_property_fails_validation() {
    let err = ContainerBuilder::new()
        .config(config_with(&[("db.url", "postgres://db/app")]))
        .descriptor(pool_descriptor())
        .build()
        .unwrap_err();

    let BootstrapError::Validation(err) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(err.issues.len(), 1);
    assert_eq!(err.issues[0].code, IOC_UNRESOLVED);
    assert_eq!(
        err.issues[0].implicated,
        vec!["Pool.new(String, u32)".to_string(), "${db.pool}".to_string()]
    );
}

#[test]
fn malformed_property_reports_conversion_failure() {
    let err = ContainerBuilder::new()
        .config(config_with(&[("db.url", "x"), ("db.pool", "many")]))
        .descriptor(pool_descriptor())
        .build()
        .unwrap_err();

    match err {
        BootstrapError::Resolve(ResolveError::Conversion {
            property, target, ..
        }) => {
            assert_eq!(property, "db.pool");
            assert_eq!(target, "u32");
        }
        other => panic!("expected a conversion error, got {other:?}"),
    }
}

fn timeout_descriptor() -> TypeDescriptor {
    TypeDescriptor::class("Timeouts").constructor(ConstructorDescriptor::new(
        vec![ParamDescriptor::new("read", "Duration").marker(MarkerUse::property("http.read"))],
        |args| Ok(value(*arg::<Duration>(args, 0)?)),
    ))
}

#[test]
fn unknown_target_type_has_no_converter() {
    let err = ContainerBuilder::new()
        .config(config_with(&[("http.read", "5s")]))
        .descriptor(timeout_descriptor())
        .build()
        .unwrap_err();

    assert!(
        matches!(
            err,
            BootstrapError::Resolve(ResolveError::NoConverter { ref target, .. }) if target == "Duration"
        ),
        "{err:?}"
    );
}

/// Parses `<n>s` into a [`Duration`].
struct SecondsConverter;

impl Converter for SecondsConverter {
    fn accepts(&self, target: &Type) -> bool {
        target.raw_name() == Some("Duration")
    }

    fn convert(&self, raw: &str, _target: &Type) -> anyhow::Result<Value> {
        let secs: u64 = raw
            .trim()
            .strip_suffix('s')
            .context("expected a value like `5s`")?
            .parse()?;
        Ok(value(Duration::from_secs(secs)))
    }
}

#[test]
fn converter_components_extend_conversion() {
    let converter = TypeDescriptor::class("SecondsConverter")
        .marker(MarkerUse::new(builtin::CONVERTER))
        .constructor(ctor(&[], |_| {
            let converter: SharedConverter = Arc::new(SecondsConverter);
            Ok(value(converter))
        }));

    // Declared after its consumer; converters are created before ordinary components.
    let container = ContainerBuilder::new()
        .config(config_with(&[("http.read", "5s")]))
        .descriptor(timeout_descriptor())
        .descriptor(converter)
        .build()
        .unwrap();

    assert_eq!(
        *container.get::<Duration>("Timeouts").unwrap(),
        Duration::from_secs(5)
    );
}

#[test]
fn converters_supplied_in_code_are_used() {
    let container = ContainerBuilder::new()
        .config(config_with(&[("http.read", "2s")]))
        .converter(Arc::new(SecondsConverter))
        .descriptor(timeout_descriptor())
        .build()
        .unwrap();

    assert_eq!(
        *container.get::<Duration>("Timeouts").unwrap(),
        Duration::from_secs(2)
    );
}

/// Serves `secret.*` properties from a vault that is always sealed.
struct SealedVault;

impl CustomResolver for SealedVault {
    fn supports(&self, key: &TypeKey) -> bool {
        matches!(key, TypeKey::Property(property) if property.name().starts_with("secret."))
    }

    fn resolve(&self, _key: &TypeKey, _container: &Container) -> anyhow::Result<Value> {
        anyhow::bail!("vault is sealed")
    }
}

#[test]
fn property_lookup_surfaces_resolver_failures() {
    let container = ContainerBuilder::new()
        .resolver(Arc::new(SealedVault))
        .build()
        .unwrap();

    assert_eq!(container.property("db.url").unwrap(), None);
    let err = container.property("secret.token").unwrap_err();
    assert!(matches!(err, ResolveError::Invocation { .. }), "{err:?}");
}
