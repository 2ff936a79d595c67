use std::fmt;

use nova_ioc_types::{HandlerKey, Type, TypeKey};
use smol_str::SmolStr;

use crate::{ClassId, ConstructorFn, FieldFn, Invoker, MethodFn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub u32);

impl MemberId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Constructor,
    Field,
    Method,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    #[default]
    Singleton,
    Prototype,
}

/// Where a resolved dependency goes when the member is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyRole {
    /// The owning instance of a non-static field or method.
    Receiver,
    Param(usize),
    /// The value assigned to an injected field.
    Field,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub key: TypeKey,
    /// Declared type at the injection site; property values are converted to it.
    pub ty: Type,
    pub role: DependencyRole,
    pub optional: bool,
}

/// Identity of a member: owner, kind, name and (substituted) parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberSignature {
    pub owner: SmolStr,
    pub kind: MemberKind,
    pub name: SmolStr,
    pub params: Vec<Type>,
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MemberKind::Field => return write!(f, "{}.{}", self.owner, self.name),
            MemberKind::Constructor | MemberKind::Method => {
                write!(f, "{}.{}(", self.owner, self.name)?
            }
        }
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone)]
pub enum MemberInvoker {
    Constructor(Invoker<ConstructorFn>),
    Field(Invoker<FieldFn>),
    Method(Invoker<MethodFn>),
}

/// Member flags derived from markers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberFlags {
    /// Supplies values (`Provides` methods, constructors).
    pub provider: bool,
    /// `Inject`-marked method run after construction.
    pub wirer: bool,
    /// Handler-dispatch member, never used for ordinary injection.
    pub taskable: bool,
    pub injected: bool,
    pub optional: bool,
    pub primary: bool,
    pub is_static: bool,
}

#[derive(Debug, Clone)]
pub struct MemberMetadata {
    pub(crate) id: MemberId,
    pub(crate) owner: ClassId,
    pub(crate) signature: MemberSignature,
    /// Declaring type, which differs from the owner for inherited members.
    pub(crate) declared_in: SmolStr,
    pub(crate) scope: Scope,
    pub(crate) flags: MemberFlags,
    pub(crate) provided: Vec<TypeKey>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) handler: Option<HandlerKey>,
    pub(crate) invoker: MemberInvoker,
}

impl MemberMetadata {
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Owning concrete class; a non-owning back reference into the registry.
    pub fn owner(&self) -> ClassId {
        self.owner
    }

    pub fn kind(&self) -> MemberKind {
        self.signature.kind
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    pub fn signature(&self) -> &MemberSignature {
        &self.signature
    }

    pub fn declared_in(&self) -> &str {
        &self.declared_in
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn flags(&self) -> MemberFlags {
        self.flags
    }

    pub fn is_optional(&self) -> bool {
        self.flags.optional
    }

    pub fn is_primary(&self) -> bool {
        self.flags.primary
    }

    pub fn is_taskable(&self) -> bool {
        self.flags.taskable
    }

    pub fn is_constructor(&self) -> bool {
        self.kind() == MemberKind::Constructor
    }

    pub fn provided_type_keys(&self) -> &[TypeKey] {
        &self.provided
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Distinct required keys in declaration order.
    pub fn required_type_keys(&self) -> Vec<&TypeKey> {
        let mut out: Vec<&TypeKey> = Vec::with_capacity(self.dependencies.len());
        for dep in &self.dependencies {
            if !out.contains(&&dep.key) {
                out.push(&dep.key);
            }
        }
        out
    }

    pub fn handler_key(&self) -> Option<&HandlerKey> {
        self.handler.as_ref()
    }

    pub fn invoker(&self) -> &MemberInvoker {
        &self.invoker
    }
}

impl PartialEq for MemberMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature
    }
}

impl Eq for MemberMetadata {}

impl fmt::Display for MemberMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.signature.fmt(f)
    }
}
