use std::collections::HashMap;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{CollectionKind, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Abstract,
    Interface,
}

impl ClassKind {
    /// Only concrete classes can be instantiated through a constructor.
    pub fn is_concrete(self) -> bool {
        matches!(self, ClassKind::Class)
    }
}

/// Declared shape of a type in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: SmolStr,
    pub kind: ClassKind,
    pub type_params: Vec<SmolStr>,
    /// Superclass reference, possibly parameterized with this class's type variables.
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
}

impl ClassDef {
    pub fn new(name: impl Into<SmolStr>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
        }
    }

    /// The type this definition declares, with its own type variables as arguments.
    pub fn declared_type(&self) -> Type {
        Type::class(
            self.name.clone(),
            self.type_params.iter().cloned().map(Type::TypeVar).collect(),
        )
    }
}

/// Read-only view of the type hierarchy.
pub trait TypeEnv {
    fn class(&self, name: &str) -> Option<&ClassDef>;

    /// Collection kind for raw names that are treated as injectable collections.
    fn collection_kind(&self, name: &str) -> Option<CollectionKind>;
}

/// In-memory type hierarchy keyed by class name.
#[derive(Debug, Clone)]
pub struct TypeStore {
    classes: IndexMap<SmolStr, ClassDef>,
    collections: HashMap<SmolStr, CollectionKind>,
}

impl Default for TypeStore {
    fn default() -> Self {
        let mut collections = HashMap::new();
        collections.insert(SmolStr::new("List"), CollectionKind::List);
        collections.insert(SmolStr::new("Collection"), CollectionKind::List);
        collections.insert(SmolStr::new("Set"), CollectionKind::Set);
        Self {
            classes: IndexMap::new(),
            collections,
        }
    }
}

impl TypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a class definition, returning the previous one.
    pub fn add_class(&mut self, def: ClassDef) -> Option<ClassDef> {
        self.classes.insert(def.name.clone(), def)
    }

    /// Treat `name<T>` as an injectable collection of `T`.
    pub fn register_collection(&mut self, name: impl Into<SmolStr>, kind: CollectionKind) {
        self.collections.insert(name.into(), kind);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    fn collection_kind(&self, name: &str) -> Option<CollectionKind> {
        self.collections.get(name).copied()
    }
}
