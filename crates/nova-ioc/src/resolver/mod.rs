//! Runtime resolution.
//!
//! A request for a key walks the shape chain (custom resolvers, then property,
//! array, collection and scalar) and the first applicable resolver handles it.
//! Scalar and collection resolution pick provider members, and each member is
//! run through exactly one [`MemberResolver`].

mod member;

use std::sync::Arc;

use nova_ioc_metadata::{
    ClassId, Dependency, DependencyNode, DependencyRole, InfraRole, MemberId, MemberInvoker,
    MemberMetadata, Scope, Value,
};
use nova_ioc_types::{CollectionKind, Shape, TypeKey};

pub use member::{ConstructorResolver, Invocation, MemberResolver, ProviderMethodResolver};

use crate::convert::{ConverterRegistry, SharedConverter};
use crate::repository::{Entry, Source};
use crate::{Container, ResolveError};

/// Resolves keys the built-in chain does not know about.
pub trait CustomResolver: Send + Sync {
    fn supports(&self, key: &TypeKey) -> bool;
    fn resolve(&self, key: &TypeKey, container: &Container) -> anyhow::Result<Value>;
}

/// What a `Resolver`-marked component's constructor returns.
pub type SharedResolver = Arc<dyn CustomResolver>;

/// Passed for optional parameters that could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Absent;

/// Mutable resolution state, guarded by the container's re-entrant lock.
#[derive(Default)]
pub(crate) struct ResolutionState {
    stack: Vec<MemberId>,
    resolvers: Vec<SharedResolver>,
    converters: ConverterRegistry,
}

impl ResolutionState {
    pub(crate) fn new(resolvers: Vec<SharedResolver>, converters: Vec<SharedConverter>) -> Self {
        let mut registry = ConverterRegistry::new();
        for converter in converters {
            registry.register(converter);
        }
        Self {
            stack: Vec::new(),
            resolvers,
            converters: registry,
        }
    }
}

enum ShapeResolver {
    Custom(SharedResolver),
    Property,
    Array,
    Collection,
    Scalar,
}

impl ShapeResolver {
    fn applies(&self, key: &TypeKey) -> bool {
        match self {
            ShapeResolver::Custom(resolver) => resolver.supports(key),
            ShapeResolver::Property => matches!(key, TypeKey::Property(_)),
            ShapeResolver::Array => key.as_bean().is_some_and(|k| k.shape() == Shape::Array),
            ShapeResolver::Collection => key
                .as_bean()
                .is_some_and(|k| matches!(k.shape(), Shape::Collection(_))),
            ShapeResolver::Scalar => key.as_bean().is_some_and(|k| k.shape() == Shape::Scalar),
        }
    }
}

fn absent_args(member: &MemberMetadata) -> Vec<Value> {
    let absent: Value = Arc::new(Absent);
    vec![absent; member.signature().params.len()]
}

/// The member asking for a key, used to filter out providers it may not use.
type Requester<'a> = Option<(&'a MemberMetadata, &'a Dependency)>;

impl Container {
    fn with_state<R>(&self, f: impl FnOnce(&mut ResolutionState) -> R) -> R {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }

    /// Code-supplied resolvers followed by any registered by components.
    pub(crate) fn active_resolvers(&self) -> Vec<SharedResolver> {
        self.with_state(|state| state.resolvers.clone())
    }

    pub(crate) fn resolve_key(&self, key: &TypeKey, requester: Requester<'_>) -> Result<Value, ResolveError> {
        let _guard = self.state.lock();

        let custom = self.with_state(|state| state.resolvers.clone());
        let chain = custom
            .into_iter()
            .map(ShapeResolver::Custom)
            .chain([
                ShapeResolver::Property,
                ShapeResolver::Array,
                ShapeResolver::Collection,
                ShapeResolver::Scalar,
            ]);

        for resolver in chain {
            if !resolver.applies(key) {
                continue;
            }
            return match resolver {
                ShapeResolver::Custom(custom) => {
                    custom
                        .resolve(key, self)
                        .map_err(|source| ResolveError::Invocation {
                            member: format!("custom resolver for `{key}`"),
                            source,
                        })
                }
                ShapeResolver::Property => self.resolve_property(key),
                ShapeResolver::Array => {
                    let values: Value = Arc::new(self.resolve_all(key, requester)?.into_boxed_slice());
                    Ok(values)
                }
                ShapeResolver::Collection => {
                    let values: Value = Arc::new(self.resolve_all(key, requester)?);
                    Ok(values)
                }
                ShapeResolver::Scalar => self.resolve_scalar(key, requester),
            };
        }
        Err(ResolveError::NoResolver { key: key.clone() })
    }

    fn resolve_property(&self, key: &TypeKey) -> Result<Value, ResolveError> {
        let TypeKey::Property(property) = key else {
            return Err(ResolveError::NoResolver { key: key.clone() });
        };
        if let Some(entry) = self.repository.read().get(key).first() {
            return Ok(entry.value.clone());
        }
        let Some(raw) = self.properties.property(property.name()) else {
            return Err(ResolveError::Unresolved { key: key.clone() });
        };
        let value: Value = Arc::new(raw);
        self.repository.write().insert(
            key.clone(),
            Entry {
                value: value.clone(),
                source: Source::Property,
                primary: false,
            },
        );
        Ok(value)
    }

    fn candidate_members(&self, key: &TypeKey, requester: Requester<'_>) -> Vec<MemberId> {
        self.registry
            .providers_of(key)
            .into_iter()
            .filter(|id| match requester {
                Some((member, dep)) => member.accepts_provider(dep, self.registry.member(*id)),
                None => true,
            })
            .collect()
    }

    /// Manually added beans matching `key`. A bean is stored under each of its
    /// supertypes, so one value can match through several rows.
    fn manual_rows(&self, key: &TypeKey) -> Vec<Entry> {
        let repository = self.repository.read();
        let mut rows: Vec<Entry> = Vec::new();
        for entry in repository.matching(self.registry.store(), key, |source| source == Source::Manual) {
            if !rows.iter().any(|seen| Arc::ptr_eq(&seen.value, &entry.value)) {
                rows.push(entry.clone());
            }
        }
        rows
    }

    fn resolve_scalar(&self, key: &TypeKey, requester: Requester<'_>) -> Result<Value, ResolveError> {
        enum Candidate {
            Member(MemberId),
            Row(Entry),
        }

        let mut candidates: Vec<Candidate> = self
            .candidate_members(key, requester)
            .into_iter()
            .map(Candidate::Member)
            .collect();
        candidates.extend(self.manual_rows(key).into_iter().map(Candidate::Row));

        let describe = |candidate: &Candidate| match candidate {
            Candidate::Member(id) => self.registry.member(*id).to_string(),
            Candidate::Row(_) => "bean added to context".to_string(),
        };
        let is_primary = |candidate: &Candidate| match candidate {
            Candidate::Member(id) => self.registry.member(*id).is_primary(),
            Candidate::Row(entry) => entry.primary,
        };

        let chosen = match candidates.len() {
            0 => return Err(ResolveError::Unresolved { key: key.clone() }),
            1 => candidates.swap_remove(0),
            _ => {
                let primaries: Vec<usize> = (0..candidates.len())
                    .filter(|idx| is_primary(&candidates[*idx]))
                    .collect();
                match primaries.as_slice() {
                    [one] => candidates.swap_remove(*one),
                    [] => {
                        return Err(ResolveError::Ambiguous {
                            key: key.clone(),
                            candidates: candidates.iter().map(describe).collect(),
                        })
                    }
                    many => {
                        return Err(ResolveError::OverSpecified {
                            key: key.clone(),
                            primaries: many.iter().map(|idx| describe(&candidates[*idx])).collect(),
                        })
                    }
                }
            }
        };

        match chosen {
            Candidate::Member(id) => self.produce(id),
            Candidate::Row(entry) => Ok(entry.value),
        }
    }

    /// Every value for an array or collection key: singleton providers
    /// (cached), a fresh value from each prototype provider, then manual beans.
    fn resolve_all(&self, key: &TypeKey, requester: Requester<'_>) -> Result<Vec<Value>, ResolveError> {
        let mut values = Vec::new();
        for id in self.candidate_members(key, requester) {
            values.push(self.produce(id)?);
        }
        values.extend(self.manual_rows(key).into_iter().map(|entry| entry.value));

        if key.shape() == Shape::Collection(CollectionKind::Set) {
            let mut unique: Vec<Value> = Vec::with_capacity(values.len());
            for value in values {
                if !unique.iter().any(|seen| Arc::ptr_eq(seen, &value)) {
                    unique.push(value);
                }
            }
            values = unique;
        }
        tracing::trace!(target = "nova.ioc", key = %key, count = values.len(), "resolved collection");
        Ok(values)
    }

    /// Run a provider member, honouring its scope.
    pub(crate) fn produce(&self, id: MemberId) -> Result<Value, ResolveError> {
        let _guard = self.state.lock();
        let member = self.registry.member(id);
        let singleton = member.scope() == Scope::Singleton;

        if singleton {
            if let Some(value) = self.repository.read().executed(id) {
                return Ok(value.clone());
            }
        }

        let entered = self.with_state(|state| {
            if let Some(pos) = state.stack.iter().position(|m| *m == id) {
                let mut path: Vec<String> = state.stack[pos..]
                    .iter()
                    .map(|m| self.registry.member(*m).to_string())
                    .collect();
                path.push(member.to_string());
                return Err(ResolveError::CyclicResolution { path });
            }
            state.stack.push(id);
            Ok(())
        });
        entered?;

        tracing::trace!(target = "nova.ioc", member = %member, "invoking provider");
        // A persisted singleton may be reached again from its own fields. Any
        // other result stays on the stack until it is wired, so a prototype
        // that injects itself fails instead of recursing forever.
        let value = match self.invoke_member(member) {
            Ok(value) if singleton => {
                self.with_state(|state| state.stack.pop());
                self.repository.write().persist(
                    id,
                    member.provided_type_keys(),
                    value,
                    member.is_primary(),
                )
            }
            Ok(value) => value,
            Err(err) => {
                self.with_state(|state| state.stack.pop());
                return Err(err);
            }
        };

        let wired = if member.is_constructor() {
            self.wire(member.owner(), &value)
        } else {
            Ok(())
        };
        if !singleton {
            self.with_state(|state| state.stack.pop());
        }
        wired?;

        if member.is_constructor() {
            self.register_infrastructure(member.owner(), &value);
        }
        Ok(value)
    }

    fn member_resolver(&self, member: &MemberMetadata) -> Result<&dyn MemberResolver, ResolveError> {
        let applicable: Vec<&dyn MemberResolver> = self
            .member_resolvers
            .iter()
            .map(Box::as_ref)
            .filter(|resolver| resolver.applies(member))
            .collect();
        match applicable.as_slice() {
            [one] => Ok(*one),
            [] => Err(ResolveError::NoMemberResolver {
                member: member.to_string(),
            }),
            many => Err(ResolveError::TooManyResolvers {
                member: member.to_string(),
                resolvers: many.iter().map(|r| r.name().to_string()).collect(),
            }),
        }
    }

    fn invoke_member(&self, member: &MemberMetadata) -> Result<Value, ResolveError> {
        let resolver = self.member_resolver(member)?;

        let mut receiver = None;
        let mut args = absent_args(member);
        for dep in member.dependencies() {
            let value = self.resolve_dependency(member, dep)?;
            match dep.role {
                DependencyRole::Receiver => receiver = value,
                DependencyRole::Param(idx) => {
                    if let (Some(slot), Some(value)) = (args.get_mut(idx), value) {
                        *slot = value;
                    }
                }
                DependencyRole::Field => {}
            }
        }

        resolver
            .invoke(Invocation {
                member,
                receiver,
                args,
            })
            .map_err(|source| ResolveError::Invocation {
                member: member.to_string(),
                source,
            })
    }

    /// `None` when an optional dependency has no provider.
    fn resolve_dependency(
        &self,
        member: &MemberMetadata,
        dep: &Dependency,
    ) -> Result<Option<Value>, ResolveError> {
        let result = match dep.role {
            DependencyRole::Receiver => {
                let owner = self.registry.class(member.owner());
                self.produce(owner.constructor())
            }
            DependencyRole::Param(_) | DependencyRole::Field => {
                self.resolve_key(&dep.key, Some((member, dep)))
                    .and_then(|value| self.convert_property(dep, value))
            }
        };
        match result {
            Ok(value) => Ok(Some(value)),
            Err(ResolveError::Unresolved { .. }) if dep.optional => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Convert a raw property string to the declared type at the injection site.
    fn convert_property(&self, dep: &Dependency, value: Value) -> Result<Value, ResolveError> {
        let TypeKey::Property(property) = &dep.key else {
            return Ok(value);
        };
        if dep.ty.raw_name() == Some("String") && !dep.ty.is_parameterized() {
            return Ok(value);
        }
        let Some(raw) = value.downcast_ref::<String>() else {
            return Ok(value);
        };
        let converter = self
            .with_state(|state| state.converters.find(&dep.ty))
            .ok_or_else(|| ResolveError::NoConverter {
                property: property.name().into(),
                target: dep.ty.to_string(),
            })?;
        converter
            .convert(raw, &dep.ty)
            .map_err(|source| ResolveError::Conversion {
                property: property.name().into(),
                target: dep.ty.to_string(),
                source,
            })
    }

    /// Inject fields, then run wirer methods, on a fresh or external instance.
    pub(crate) fn wire(&self, class: ClassId, instance: &Value) -> Result<(), ResolveError> {
        let class = self.registry.class(class);

        for id in class.fields() {
            let member = self.registry.member(*id);
            let MemberInvoker::Field(injector) = member.invoker() else {
                continue;
            };
            for dep in member.dependencies() {
                if dep.role != DependencyRole::Field {
                    continue;
                }
                if let Some(value) = self.resolve_dependency(member, dep)? {
                    injector
                        .call(instance, value)
                        .map_err(|source| ResolveError::Invocation {
                            member: member.to_string(),
                            source,
                        })?;
                }
            }
        }

        for id in class.methods() {
            let member = self.registry.member(*id);
            if !member.flags().wirer {
                continue;
            }
            let MemberInvoker::Method(invoker) = member.invoker() else {
                continue;
            };
            let mut args = absent_args(member);
            for dep in member.dependencies() {
                let DependencyRole::Param(idx) = dep.role else {
                    continue;
                };
                if let (Some(slot), Some(value)) = (args.get_mut(idx), self.resolve_dependency(member, dep)?) {
                    *slot = value;
                }
            }
            let receiver = (!member.flags().is_static).then_some(instance);
            invoker
                .call(receiver, &args)
                .map_err(|source| ResolveError::Invocation {
                    member: member.to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn register_infrastructure(&self, class: ClassId, instance: &Value) {
        let class = self.registry.class(class);
        match class.role() {
            Some(InfraRole::Resolver) => match instance.downcast_ref::<SharedResolver>() {
                Some(resolver) => {
                    let resolver = Arc::clone(resolver);
                    self.with_state(|state| state.resolvers.push(resolver));
                    tracing::debug!(target = "nova.ioc", class = class.name(), "registered custom resolver");
                }
                None => tracing::warn!(
                    target = "nova.ioc",
                    class = class.name(),
                    "resolver component does not produce a SharedResolver"
                ),
            },
            Some(InfraRole::Converter) => match instance.downcast_ref::<SharedConverter>() {
                Some(converter) => {
                    let converter = Arc::clone(converter);
                    self.with_state(|state| state.converters.register(converter));
                    tracing::debug!(target = "nova.ioc", class = class.name(), "registered converter");
                }
                None => tracing::warn!(
                    target = "nova.ioc",
                    class = class.name(),
                    "converter component does not produce a SharedConverter"
                ),
            },
            _ => {}
        }
    }
}
