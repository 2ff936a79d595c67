//! Class and member metadata for the Nova IoC container.
//!
//! A [`Scanner`] yields [`TypeDescriptor`]s; [`MetadataRegistry::build`] turns
//! them into [`ClassMetadata`] and [`MemberMetadata`] (what every constructor,
//! field and method provides and requires) and builds the member- and
//! class-level [`DependencyGraph`]s used for cycle detection and ordering.

mod builder;
mod class;
mod descriptor;
mod error;
mod graph;
pub mod marker;
mod member;
mod registry;

pub use class::{ClassId, ClassMetadata, InfraRole};
pub use descriptor::{
    ConstructorDescriptor, ConstructorFn, FieldDescriptor, FieldFn, Invoker, MethodDescriptor,
    MethodFn, ParamDescriptor, Scanner, StaticScanner, TypeDescriptor, Value,
};
pub use error::{MetadataError, Result};
pub use graph::{DependencyGraph, DependencyNode};
pub use marker::{MarkerTable, MarkerUse};
pub use member::{
    Dependency, DependencyRole, MemberFlags, MemberId, MemberInvoker, MemberKind,
    MemberMetadata, MemberSignature, Scope,
};
pub use registry::{MetadataRegistry, RegistryConfig};
