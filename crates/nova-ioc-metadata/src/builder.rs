//! Descriptor to metadata conversion.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use nova_ioc_types::{
    generic_supertypes, parse_type_with_vars, substitute, type_bindings, HandlerKey, Type,
    TypeEnv, TypeKey, TypeStore,
};
use smol_str::SmolStr;

use crate::marker::builtin;
use crate::{
    ClassId, ClassMetadata, ConstructorDescriptor, Dependency, DependencyRole, FieldDescriptor,
    InfraRole, MarkerTable, MarkerUse, MemberFlags, MemberId, MemberInvoker, MemberKind,
    MemberMetadata, MemberSignature, MetadataError, MethodDescriptor, ParamDescriptor, Result,
    Scope, TypeDescriptor,
};

pub(crate) const CONSTRUCTOR_NAME: &str = "new";

/// Parse a descriptor's signatures against its own type parameters.
pub(crate) fn parse_in(owner: &TypeDescriptor, signature: &str) -> Result<Type> {
    let vars: Vec<&str> = owner.type_params.iter().map(SmolStr::as_str).collect();
    parse_type_with_vars(signature, &vars).map_err(|source| MetadataError::Type {
        owner: owner.name.clone(),
        signature: signature.into(),
        source,
    })
}

/// Class attributes shared by every member of one class.
struct ClassAttrs {
    id: ClassId,
    name: SmolStr,
    root_type: Type,
    scope: Scope,
    primary: bool,
    qualifier: Option<SmolStr>,
}

pub(crate) struct MetadataBuilder<'a> {
    store: &'a TypeStore,
    markers: &'a MarkerTable,
    descriptors: &'a IndexMap<SmolStr, TypeDescriptor>,
}

impl<'a> MetadataBuilder<'a> {
    pub(crate) fn new(
        store: &'a TypeStore,
        markers: &'a MarkerTable,
        descriptors: &'a IndexMap<SmolStr, TypeDescriptor>,
    ) -> Self {
        Self {
            store,
            markers,
            descriptors,
        }
    }

    /// Build metadata for the concrete class `desc`, pushing its members onto `arena`.
    pub(crate) fn build_class(
        &self,
        id: ClassId,
        desc: &TypeDescriptor,
        arena: &mut Vec<MemberMetadata>,
    ) -> Result<ClassMetadata> {
        let singleton = self.markers.is_marked_by(&desc.markers, builtin::SINGLETON);
        let prototype = self.markers.is_marked_by(&desc.markers, builtin::PROTOTYPE);
        if singleton && prototype {
            return Err(MetadataError::ConflictingScope {
                class: desc.name.clone(),
            });
        }

        let attrs = ClassAttrs {
            id,
            name: desc.name.clone(),
            root_type: Type::class(
                desc.name.clone(),
                desc.type_params.iter().cloned().map(Type::TypeVar).collect(),
            ),
            scope: if prototype {
                Scope::Prototype
            } else {
                Scope::Singleton
            },
            primary: self.markers.is_marked_by(&desc.markers, builtin::PRIMARY),
            qualifier: self.markers.value(&desc.markers, builtin::NAMED).cloned(),
        };

        let constructor = self.choose_constructor(desc)?;
        let constructor = self.constructor_member(&attrs, desc, constructor, arena)?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        let mut seen_fields: HashSet<SmolStr> = HashSet::new();
        let mut seen_methods: HashSet<(SmolStr, Vec<Type>)> = HashSet::new();

        // Most-derived first, so the first declaration of a signature wins.
        for sup in generic_supertypes(self.store, &attrs.root_type) {
            let Type::Class(class) = &sup else {
                continue;
            };
            let (Some(declaring), Some(def)) = (
                self.descriptors.get(&class.name),
                self.store.class(&class.name),
            ) else {
                continue;
            };
            let bindings = type_bindings(def, &class.args);

            for field in &declaring.fields {
                if field.is_synthetic || !seen_fields.insert(field.name.clone()) {
                    continue;
                }
                if !self.markers.is_marked_by(&field.markers, builtin::INJECT)
                    && !self.markers.is_marked_by(&field.markers, builtin::PROPERTY)
                {
                    continue;
                }
                let ty = substitute(&parse_in(declaring, &field.ty)?, &bindings);
                fields.push(self.field_member(&attrs, declaring, field, ty, arena));
            }

            for method in &declaring.methods {
                if method.is_synthetic {
                    continue;
                }
                let params = method
                    .params
                    .iter()
                    .map(|p| Ok(substitute(&parse_in(declaring, &p.ty)?, &bindings)))
                    .collect::<Result<Vec<_>>>()?;
                if !seen_methods.insert((method.name.clone(), params.clone())) {
                    continue;
                }
                let is_member = [builtin::INJECT, builtin::PROVIDES, builtin::HANDLER]
                    .iter()
                    .any(|marker| self.markers.is_marked_by(&method.markers, marker));
                if !is_member {
                    continue;
                }
                let return_type = match &method.return_type {
                    Some(text) => Some(substitute(&parse_in(declaring, text)?, &bindings)),
                    None => None,
                };
                methods.push(self.method_member(
                    &attrs,
                    declaring,
                    method,
                    params,
                    return_type,
                    arena,
                )?);
            }
        }

        let mut provided: IndexSet<TypeKey> = IndexSet::new();
        let mut dependencies: IndexMap<TypeKey, Dependency> = IndexMap::new();
        for member_id in std::iter::once(constructor)
            .chain(fields.iter().copied())
            .chain(methods.iter().copied())
        {
            let member = &arena[member_id.index()];
            provided.extend(member.provided.iter().cloned());
            for dep in &member.dependencies {
                if dep.role != DependencyRole::Receiver {
                    dependencies
                        .entry(dep.key.clone())
                        .or_insert_with(|| dep.clone());
                }
            }
        }

        tracing::trace!(
            target = "nova.ioc",
            class = %attrs.name,
            fields = fields.len(),
            methods = methods.len(),
            "built class metadata"
        );

        Ok(ClassMetadata {
            id,
            name: attrs.name,
            root_type: attrs.root_type,
            scope: attrs.scope,
            primary: attrs.primary,
            qualifier: attrs.qualifier,
            role: self.role(&desc.markers),
            constructor,
            fields,
            methods,
            provided: provided.into_iter().collect(),
            dependencies: dependencies.into_values().collect(),
        })
    }

    fn role(&self, markers: &[MarkerUse]) -> Option<InfraRole> {
        [
            (builtin::RESOLVER, InfraRole::Resolver),
            (builtin::CONVERTER, InfraRole::Converter),
            (builtin::FACTORY, InfraRole::Factory),
            (builtin::SERVICE, InfraRole::Service),
        ]
        .into_iter()
        .find(|(marker, _)| self.markers.is_marked_by(markers, marker))
        .map(|(_, role)| role)
    }

    fn choose_constructor<'d>(&self, desc: &'d TypeDescriptor) -> Result<&'d ConstructorDescriptor> {
        match desc.constructors.as_slice() {
            [] => Err(MetadataError::MissingConstructor {
                class: desc.name.clone(),
            }),
            [only] => Ok(only),
            all => {
                let mut marked = all
                    .iter()
                    .filter(|ctor| self.markers.is_marked_by(&ctor.markers, builtin::INJECT));
                match (marked.next(), marked.next()) {
                    (Some(ctor), None) => Ok(ctor),
                    _ => Err(MetadataError::AmbiguousConstructor {
                        class: desc.name.clone(),
                        count: all.len(),
                    }),
                }
            }
        }
    }

    /// Key for a parameter or field: a property key when marked `Property`,
    /// otherwise a bean key qualified by `Named`.
    fn requirement_key(&self, markers: &[MarkerUse], name: &str, ty: Type) -> TypeKey {
        if let Some(property) = self.markers.find(markers, builtin::PROPERTY) {
            return TypeKey::property(property.value.clone().unwrap_or_else(|| name.into()));
        }
        let qualifier = self.markers.value(markers, builtin::NAMED).cloned();
        TypeKey::required(self.store, ty, qualifier)
    }

    fn param_dependencies(
        &self,
        params: &[ParamDescriptor],
        types: Vec<Type>,
    ) -> Vec<Dependency> {
        params
            .iter()
            .zip(types)
            .enumerate()
            .map(|(idx, (param, ty))| Dependency {
                key: self.requirement_key(&param.markers, &param.name, ty.clone()),
                ty,
                role: DependencyRole::Param(idx),
                optional: self.markers.is_marked_by(&param.markers, builtin::OPTIONAL),
            })
            .collect()
    }

    fn receiver(&self, attrs: &ClassAttrs) -> Dependency {
        Dependency {
            key: TypeKey::required(self.store, attrs.root_type.clone(), attrs.qualifier.clone()),
            ty: attrs.root_type.clone(),
            role: DependencyRole::Receiver,
            optional: false,
        }
    }

    fn constructor_member(
        &self,
        attrs: &ClassAttrs,
        desc: &TypeDescriptor,
        ctor: &ConstructorDescriptor,
        arena: &mut Vec<MemberMetadata>,
    ) -> Result<MemberId> {
        let types = ctor
            .params
            .iter()
            .map(|p| parse_in(desc, &p.ty))
            .collect::<Result<Vec<_>>>()?;

        let provided = generic_supertypes(self.store, &attrs.root_type)
            .into_iter()
            .filter(|ty| !ty.is_top())
            .map(|ty| TypeKey::provided(ty, attrs.qualifier.clone()))
            .collect();

        Ok(push(
            arena,
            MemberMetadata {
                id: MemberId(0),
                owner: attrs.id,
                signature: MemberSignature {
                    owner: attrs.name.clone(),
                    kind: MemberKind::Constructor,
                    name: CONSTRUCTOR_NAME.into(),
                    params: types.clone(),
                },
                declared_in: desc.name.clone(),
                scope: attrs.scope,
                flags: MemberFlags {
                    provider: true,
                    optional: self.markers.is_marked_by(&ctor.markers, builtin::OPTIONAL),
                    primary: attrs.primary,
                    ..MemberFlags::default()
                },
                provided,
                dependencies: self.param_dependencies(&ctor.params, types),
                handler: None,
                invoker: MemberInvoker::Constructor(ctor.invoker.clone()),
            },
        ))
    }

    fn field_member(
        &self,
        attrs: &ClassAttrs,
        declaring: &TypeDescriptor,
        field: &FieldDescriptor,
        ty: Type,
        arena: &mut Vec<MemberMetadata>,
    ) -> MemberId {
        let mut dependencies = Vec::with_capacity(2);
        if !field.is_static {
            dependencies.push(self.receiver(attrs));
        }
        dependencies.push(Dependency {
            key: self.requirement_key(&field.markers, &field.name, ty.clone()),
            ty,
            role: DependencyRole::Field,
            optional: self.markers.is_marked_by(&field.markers, builtin::OPTIONAL),
        });

        push(
            arena,
            MemberMetadata {
                id: MemberId(0),
                owner: attrs.id,
                signature: MemberSignature {
                    owner: attrs.name.clone(),
                    kind: MemberKind::Field,
                    name: field.name.clone(),
                    params: Vec::new(),
                },
                declared_in: declaring.name.clone(),
                scope: attrs.scope,
                flags: MemberFlags {
                    injected: true,
                    optional: self.markers.is_marked_by(&field.markers, builtin::OPTIONAL),
                    is_static: field.is_static,
                    ..MemberFlags::default()
                },
                provided: Vec::new(),
                dependencies,
                handler: None,
                invoker: MemberInvoker::Field(field.injector.clone()),
            },
        )
    }

    fn method_member(
        &self,
        attrs: &ClassAttrs,
        declaring: &TypeDescriptor,
        method: &MethodDescriptor,
        params: Vec<Type>,
        return_type: Option<Type>,
        arena: &mut Vec<MemberMetadata>,
    ) -> Result<MemberId> {
        let markers = &method.markers;
        let provider = self.markers.is_marked_by(markers, builtin::PROVIDES);
        let handler_marker = self.markers.find(markers, builtin::HANDLER);
        let unsupported = |reason| MetadataError::UnsupportedMember {
            class: attrs.name.clone(),
            member: method.name.clone(),
            reason,
        };
        if provider && handler_marker.is_some() {
            return Err(unsupported("a provider method cannot also be a handler"));
        }

        let mut provided = Vec::new();
        if provider {
            let Some(return_type) = return_type else {
                return Err(unsupported("provider method returns nothing"));
            };
            let qualifier = self.markers.value(markers, builtin::NAMED).cloned();
            provided.push(TypeKey::provided(return_type, qualifier));
        }
        let wirer = !provider && self.markers.is_marked_by(markers, builtin::INJECT);

        let handler = handler_marker.map(|used| {
            HandlerKey::new(
                used.name.clone(),
                params
                    .iter()
                    .map(|ty| TypeKey::required(self.store, ty.clone(), None))
                    .collect(),
            )
        });

        let mut dependencies = Vec::new();
        if provider || wirer {
            if !method.is_static {
                dependencies.push(self.receiver(attrs));
            }
            dependencies.extend(self.param_dependencies(&method.params, params.clone()));
        }

        Ok(push(
            arena,
            MemberMetadata {
                id: MemberId(0),
                owner: attrs.id,
                signature: MemberSignature {
                    owner: attrs.name.clone(),
                    kind: MemberKind::Method,
                    name: method.name.clone(),
                    params,
                },
                declared_in: declaring.name.clone(),
                scope: attrs.scope,
                flags: MemberFlags {
                    provider,
                    wirer,
                    taskable: handler.is_some(),
                    injected: false,
                    optional: self.markers.is_marked_by(markers, builtin::OPTIONAL),
                    primary: attrs.primary || self.markers.is_marked_by(markers, builtin::PRIMARY),
                    is_static: method.is_static,
                },
                provided,
                dependencies,
                handler,
                invoker: MemberInvoker::Method(method.invoker.clone()),
            },
        ))
    }
}

fn push(arena: &mut Vec<MemberMetadata>, mut member: MemberMetadata) -> MemberId {
    let id = MemberId(arena.len() as u32);
    member.id = id;
    arena.push(member);
    id
}

/// Build the type store from the descriptors' declared hierarchy.
pub(crate) fn build_store(
    mut store: TypeStore,
    descriptors: &IndexMap<SmolStr, TypeDescriptor>,
) -> Result<TypeStore> {
    for desc in descriptors.values() {
        let mut def = nova_ioc_types::ClassDef::new(desc.name.clone(), desc.kind);
        def.type_params = desc.type_params.clone();
        def.super_class = desc
            .super_class
            .as_deref()
            .map(|text| parse_in(desc, text))
            .transpose()?;
        def.interfaces = desc
            .interfaces
            .iter()
            .map(|text| parse_in(desc, text))
            .collect::<Result<_>>()?;
        store.add_class(def);
    }
    Ok(store)
}

/// Index descriptors by name, rejecting duplicates.
pub(crate) fn index_descriptors(
    descriptors: Vec<TypeDescriptor>,
) -> Result<IndexMap<SmolStr, TypeDescriptor>> {
    let mut out = IndexMap::with_capacity(descriptors.len());
    for desc in descriptors {
        if out.contains_key(&desc.name) {
            return Err(MetadataError::DuplicateType { name: desc.name });
        }
        out.insert(desc.name.clone(), desc);
    }
    Ok(out)
}
