use nova_ioc_types::{Type, TypeKey};
use smol_str::SmolStr;

use crate::{Dependency, MemberId, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

impl ClassId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Infrastructure classes are scheduled ahead of ordinary components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfraRole {
    Service,
    Factory,
    Converter,
    Resolver,
}

#[derive(Debug, Clone)]
pub struct ClassMetadata {
    pub(crate) id: ClassId,
    pub(crate) name: SmolStr,
    pub(crate) root_type: Type,
    pub(crate) scope: Scope,
    pub(crate) primary: bool,
    pub(crate) qualifier: Option<SmolStr>,
    pub(crate) role: Option<InfraRole>,
    pub(crate) constructor: MemberId,
    pub(crate) fields: Vec<MemberId>,
    pub(crate) methods: Vec<MemberId>,
    pub(crate) provided: Vec<TypeKey>,
    pub(crate) dependencies: Vec<Dependency>,
}

impl ClassMetadata {
    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_type(&self) -> &Type {
        &self.root_type
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn role(&self) -> Option<InfraRole> {
        self.role
    }

    pub fn is_infrastructure(&self) -> bool {
        self.role.is_some()
    }

    pub fn constructor(&self) -> MemberId {
        self.constructor
    }

    pub fn fields(&self) -> &[MemberId] {
        &self.fields
    }

    pub fn methods(&self) -> &[MemberId] {
        &self.methods
    }

    /// All members, constructor first.
    pub fn members(&self) -> impl Iterator<Item = MemberId> + '_ {
        std::iter::once(self.constructor)
            .chain(self.fields.iter().copied())
            .chain(self.methods.iter().copied())
    }

    /// Union of the members' provided keys.
    pub fn provided_types(&self) -> &[TypeKey] {
        &self.provided
    }

    /// Union of the members' requirements, excluding the class's own instance.
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn required_types(&self) -> impl Iterator<Item = &TypeKey> {
        self.dependencies.iter().map(|dep| &dep.key)
    }
}
