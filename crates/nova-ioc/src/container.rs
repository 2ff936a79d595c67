use std::any::Any;
use std::cell::RefCell;
use std::sync::Arc;

use nova_ioc_metadata::{
    MarkerTable, MemberId, MemberInvoker, MemberKind, MetadataRegistry,
    RegistryConfig, Scanner, Scope, TypeDescriptor, Value,
};
use nova_ioc_types::{generic_supertypes, key_matches, parse_type, Type, TypeKey, TypeStore};
use parking_lot::{ReentrantMutex, RwLock};

use crate::convert::SharedConverter;
use crate::ordering::OrderingService;
use crate::properties::{LayeredPropertySource, MapPropertySource, PropertySource};
use crate::repository::{Entry, Repository, Source};
use crate::resolver::{
    ConstructorResolver, MemberResolver, ProviderMethodResolver, ResolutionState, SharedResolver,
};
use crate::validation::{instantiated_early, ValidationContext, ValidationPhase, ValidationService};
use crate::{BootstrapError, ContainerConfig, ResolveError};

/// A bootstrapped object graph.
///
/// Resolution is serialized by a re-entrant lock, so a singleton provider runs
/// at most once even when the container is shared between threads.
pub struct Container {
    pub(crate) registry: MetadataRegistry,
    pub(crate) properties: Arc<dyn PropertySource>,
    pub(crate) repository: RwLock<Repository>,
    pub(crate) state: ReentrantMutex<RefCell<ResolutionState>>,
    pub(crate) member_resolvers: Vec<Box<dyn MemberResolver>>,
    order: Vec<MemberId>,
    config: ContainerConfig,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("classes", &self.registry.classes().len())
            .field("members", &self.registry.members().len())
            .field("rows", &self.repository.read().len())
            .finish_non_exhaustive()
    }
}

fn parse(text: &str) -> Result<Type, ResolveError> {
    parse_type(text).map_err(|source| ResolveError::Type {
        text: text.to_string(),
        source,
    })
}

/// Keys a manually registered value answers to: its type and every supertype.
fn manual_keys(store: &TypeStore, ty: &Type) -> Vec<TypeKey> {
    generic_supertypes(store, ty)
        .into_iter()
        .filter(|sup| !sup.is_top())
        .map(|sup| TypeKey::provided(sup, None))
        .collect()
}

impl Container {
    /// Scan `config.packages`, validate, order and (optionally) eagerly
    /// instantiate every singleton.
    pub fn bootstrap(config: ContainerConfig, scanner: &dyn Scanner) -> Result<Self, BootstrapError> {
        ContainerBuilder::new().config(config).scan(scanner)?.build()
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Member initialization order computed at bootstrap.
    pub fn order(&self) -> &[MemberId] {
        &self.order
    }

    /// Resolve any key through the resolver chain.
    pub fn resolve(&self, key: &TypeKey) -> Result<Value, ResolveError> {
        self.resolve_key(key, None)
    }

    pub fn get_instance(&self, ty: &str) -> Result<Value, ResolveError> {
        let key = TypeKey::required(self.registry.store(), parse(ty)?, None);
        self.resolve(&key)
    }

    pub fn get_instance_named(&self, ty: &str, qualifier: &str) -> Result<Value, ResolveError> {
        let key = TypeKey::required(self.registry.store(), parse(ty)?, Some(qualifier.into()));
        self.resolve(&key)
    }

    /// Resolve `ty` and downcast it to `T`.
    pub fn get<T: Any + Send + Sync>(&self, ty: &str) -> Result<Arc<T>, ResolveError> {
        let key = TypeKey::required(self.registry.store(), parse(ty)?, None);
        self.resolve(&key)?
            .downcast::<T>()
            .map_err(|_| ResolveError::Downcast {
                key,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Every value for `ty`, whatever its qualifier: cached singletons plus a
    /// fresh value from each prototype provider.
    pub fn get_instances(&self, ty: &str) -> Result<Vec<Value>, ResolveError> {
        let element = parse(ty)?;
        let key = TypeKey::required(
            self.registry.store(),
            Type::class("List", vec![element]),
            None,
        );
        let value = self.resolve(&key)?;
        value
            .downcast_ref::<Vec<Value>>()
            .cloned()
            .ok_or(ResolveError::Downcast {
                key,
                expected: std::any::type_name::<Vec<Value>>(),
            })
    }

    /// Register an externally built value under `ty` and its supertypes.
    pub fn add_bean_to_context(&self, ty: &str, value: Value, primary: bool) -> Result<(), ResolveError> {
        let ty = parse(ty)?;
        let _guard = self.state.lock();
        let keys = manual_keys(self.registry.store(), &ty);
        let mut repository = self.repository.write();
        for key in keys {
            repository.insert(
                key,
                Entry {
                    value: value.clone(),
                    source: Source::Manual,
                    primary,
                },
            );
        }
        tracing::debug!(target = "nova.ioc", ty = %ty, primary, "added bean to context");
        Ok(())
    }

    /// Re-run field injection and wirer methods against an instance of the
    /// singleton component `ty` built outside the container.
    pub fn refresh(&self, ty: &str, instance: &Value) -> Result<(), ResolveError> {
        let ty = parse(ty)?;
        let class = ty
            .raw_name()
            .and_then(|name| self.registry.class_by_name(name))
            .ok_or_else(|| ResolveError::UnknownComponent {
                name: ty.to_string(),
            })?;
        if class.scope() != Scope::Singleton {
            return Err(ResolveError::NotSingleton {
                class: class.name().to_string(),
            });
        }
        let _guard = self.state.lock();
        self.wire(class.id(), instance)
    }

    /// A property value, read through the repository like any other key.
    ///
    /// `Ok(None)` when no source defines `name`; failures of custom resolvers
    /// are returned as errors.
    pub fn property(&self, name: &str) -> Result<Option<String>, ResolveError> {
        let key = TypeKey::property(name);
        let value = match self.resolve(&key) {
            Ok(value) => value,
            Err(ResolveError::Unresolved { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        match value.downcast_ref::<String>() {
            Some(raw) => Ok(Some(raw.clone())),
            None => Err(ResolveError::Downcast {
                key,
                expected: std::any::type_name::<String>(),
            }),
        }
    }

    /// Invoke every handler whose marker implies `marker` and whose single
    /// parameter accepts `event_type`. Returns the number of handlers run.
    pub fn dispatch(&self, marker: &str, event_type: &str, event: Value) -> Result<usize, ResolveError> {
        let event_key = TypeKey::provided(parse(event_type)?, None);
        let store = self.registry.store();
        let markers = self.registry.markers();
        let _guard = self.state.lock();

        let mut invoked = 0;
        for member in self.registry.members() {
            let Some(handler) = member.handler_key() else {
                continue;
            };
            let accepts = matches!(handler.params(), [param] if key_matches(store, param, &event_key));
            if !markers.implies(handler.marker(), marker) || !accepts {
                continue;
            }
            let MemberInvoker::Method(invoker) = member.invoker() else {
                continue;
            };
            let receiver = if member.flags().is_static {
                None
            } else {
                Some(self.produce(self.registry.class(member.owner()).constructor())?)
            };
            invoker
                .call(receiver.as_ref(), std::slice::from_ref(&event))
                .map_err(|source| ResolveError::Invocation {
                    member: member.to_string(),
                    source,
                })?;
            invoked += 1;
        }
        tracing::debug!(target = "nova.ioc", marker, event_type, invoked, "dispatched event");
        Ok(invoked)
    }

    /// Instantiate resolver and converter components so they take part in
    /// resolution before anything else is requested.
    fn initialize_infrastructure(&self) -> Result<(), ResolveError> {
        for id in &self.order {
            let member = self.registry.member(*id);
            if member.is_constructor() && instantiated_early(self.registry.owner_of(*id)) {
                self.produce(*id)?;
            }
        }
        Ok(())
    }

    /// Instantiate every singleton constructor and provider method in order.
    fn initialize(&self) -> Result<(), ResolveError> {
        for id in &self.order {
            let member = self.registry.member(*id);
            let eager = member.scope() == Scope::Singleton
                && match member.kind() {
                    MemberKind::Constructor => true,
                    MemberKind::Method => member.flags().provider,
                    MemberKind::Field => false,
                };
            if eager {
                self.produce(*id)?;
            }
        }
        Ok(())
    }
}

/// Assembles a [`Container`] from descriptors and code-level collaborators.
pub struct ContainerBuilder {
    config: ContainerConfig,
    store: TypeStore,
    markers: MarkerTable,
    descriptors: Vec<TypeDescriptor>,
    properties: Vec<Arc<dyn PropertySource>>,
    resolvers: Vec<SharedResolver>,
    member_resolvers: Vec<Box<dyn MemberResolver>>,
    converters: Vec<SharedConverter>,
    beans: Vec<(String, Value, bool)>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self {
            config: ContainerConfig::default(),
            store: TypeStore::new(),
            markers: MarkerTable::new(),
            descriptors: Vec::new(),
            properties: Vec::new(),
            resolvers: Vec::new(),
            member_resolvers: Vec::new(),
            converters: Vec::new(),
            beans: Vec::new(),
        }
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Base type hierarchy, for library types the components extend.
    pub fn store(mut self, store: TypeStore) -> Self {
        self.store = store;
        self
    }

    pub fn markers(mut self, markers: MarkerTable) -> Self {
        self.markers = markers;
        self
    }

    pub fn descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn descriptors(mut self, descriptors: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        self.descriptors.extend(descriptors);
        self
    }

    /// Add everything `scanner` finds in the configured packages.
    pub fn scan(mut self, scanner: &dyn Scanner) -> Result<Self, BootstrapError> {
        let found = scanner
            .scan(&self.config.packages)
            .map_err(BootstrapError::Scan)?;
        tracing::debug!(target = "nova.ioc", types = found.len(), "scanned descriptors");
        self.descriptors.extend(found);
        Ok(self)
    }

    /// Property source consulted before the config's inline properties.
    pub fn property_source(mut self, source: Arc<dyn PropertySource>) -> Self {
        self.properties.push(source);
        self
    }

    pub fn resolver(mut self, resolver: SharedResolver) -> Self {
        self.resolvers.push(resolver);
        self
    }

    pub fn member_resolver(mut self, resolver: Box<dyn MemberResolver>) -> Self {
        self.member_resolvers.push(resolver);
        self
    }

    pub fn converter(mut self, converter: SharedConverter) -> Self {
        self.converters.push(converter);
        self
    }

    /// A value registered before bootstrap, visible to validation.
    pub fn bean(mut self, ty: impl Into<String>, value: Value, primary: bool) -> Self {
        self.beans.push((ty.into(), value, primary));
        self
    }

    pub fn build(self) -> Result<Container, BootstrapError> {
        let ContainerBuilder {
            config,
            store,
            markers,
            descriptors,
            properties,
            resolvers,
            member_resolvers,
            converters,
            beans,
        } = self;

        let registry = MetadataRegistry::build(RegistryConfig {
            store,
            markers,
            descriptors,
        })?;

        let mut layered = LayeredPropertySource::new();
        for source in properties {
            layered.push(source);
        }
        layered.push(Arc::new(MapPropertySource::from(config.properties.clone())));

        let mut manual = Vec::with_capacity(beans.len());
        for (ty, value, primary) in beans {
            let ty = parse(&ty)?;
            manual.push((manual_keys(registry.store(), &ty), value, primary));
        }
        let known_keys: Vec<TypeKey> = manual
            .iter()
            .flat_map(|(keys, _, _)| keys.iter().cloned())
            .collect();

        let validation = ValidationService::from_config(&config.validation);
        validation.validate(&ValidationContext {
            registry: &registry,
            properties: &layered,
            manual_keys: &known_keys,
            resolvers: &resolvers,
            phase: ValidationPhase::Structure,
        })?;

        let order = OrderingService::new(&registry).member_order()?;

        let mut repository = Repository::new();
        for (keys, value, primary) in manual {
            for key in keys {
                repository.insert(
                    key,
                    Entry {
                        value: value.clone(),
                        source: Source::Manual,
                        primary,
                    },
                );
            }
        }

        let mut all_member_resolvers: Vec<Box<dyn MemberResolver>> =
            vec![Box::new(ConstructorResolver), Box::new(ProviderMethodResolver)];
        all_member_resolvers.extend(member_resolvers);

        let container = Container {
            registry,
            properties: Arc::new(layered),
            repository: RwLock::new(repository),
            state: ReentrantMutex::new(RefCell::new(ResolutionState::new(resolvers, converters))),
            member_resolvers: all_member_resolvers,
            order,
            config,
        };

        container.initialize_infrastructure()?;
        validation.validate(&ValidationContext {
            registry: &container.registry,
            properties: container.properties.as_ref(),
            manual_keys: &known_keys,
            resolvers: &container.active_resolvers(),
            phase: ValidationPhase::Components,
        })?;
        if container.config.eager_singletons {
            container.initialize()?;
        }

        tracing::info!(
            target = "nova.ioc",
            classes = container.registry.classes().len(),
            members = container.registry.members().len(),
            "container ready"
        );
        Ok(container)
    }
}
