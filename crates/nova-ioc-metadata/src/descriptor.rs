//! The manifest a scanner hands to the metadata builder.
//!
//! Descriptors are plain data plus shared invokers. Type signatures are kept
//! as text and parsed against the declaring type's parameters when metadata is
//! built, so a scanner never has to understand the type grammar.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use nova_ioc_types::ClassKind;
use smol_str::SmolStr;

use crate::MarkerUse;

/// A resolved component, property or event value.
pub type Value = Arc<dyn Any + Send + Sync>;

pub type ConstructorFn = dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync;
/// Receives the instance (absent for static methods) and the resolved arguments.
pub type MethodFn = dyn Fn(Option<&Value>, &[Value]) -> anyhow::Result<Option<Value>> + Send + Sync;
pub type FieldFn = dyn Fn(&Value, Value) -> anyhow::Result<()> + Send + Sync;

/// Shared, cheaply clonable callable.
pub struct Invoker<F: ?Sized>(Arc<F>);

impl<F: ?Sized> Clone for Invoker<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Invoker<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invoker(..)")
    }
}

impl Invoker<ConstructorFn> {
    pub fn constructor(
        f: impl Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.0)(args)
    }
}

impl Invoker<MethodFn> {
    pub fn method(
        f: impl Fn(Option<&Value>, &[Value]) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, receiver: Option<&Value>, args: &[Value]) -> anyhow::Result<Option<Value>> {
        (self.0)(receiver, args)
    }
}

impl Invoker<FieldFn> {
    pub fn field(f: impl Fn(&Value, Value) -> anyhow::Result<()> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, instance: &Value, value: Value) -> anyhow::Result<()> {
        (self.0)(instance, value)
    }
}

#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    pub name: SmolStr,
    pub ty: SmolStr,
    pub markers: Vec<MarkerUse>,
}

impl ParamDescriptor {
    pub fn new(name: impl Into<SmolStr>, ty: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            markers: Vec::new(),
        }
    }

    pub fn marker(mut self, marker: MarkerUse) -> Self {
        self.markers.push(marker);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ConstructorDescriptor {
    pub params: Vec<ParamDescriptor>,
    pub markers: Vec<MarkerUse>,
    pub invoker: Invoker<ConstructorFn>,
}

impl ConstructorDescriptor {
    pub fn new(
        params: Vec<ParamDescriptor>,
        f: impl Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            params,
            markers: Vec::new(),
            invoker: Invoker::constructor(f),
        }
    }

    pub fn marker(mut self, marker: MarkerUse) -> Self {
        self.markers.push(marker);
        self
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: SmolStr,
    pub ty: SmolStr,
    pub is_static: bool,
    pub is_synthetic: bool,
    pub markers: Vec<MarkerUse>,
    pub injector: Invoker<FieldFn>,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<SmolStr>,
        ty: impl Into<SmolStr>,
        f: impl Fn(&Value, Value) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            is_static: false,
            is_synthetic: false,
            markers: Vec::new(),
            injector: Invoker::field(f),
        }
    }

    pub fn marker(mut self, marker: MarkerUse) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.is_synthetic = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    pub name: SmolStr,
    pub params: Vec<ParamDescriptor>,
    /// `None` for methods that return nothing.
    pub return_type: Option<SmolStr>,
    pub is_static: bool,
    pub is_synthetic: bool,
    pub markers: Vec<MarkerUse>,
    pub invoker: Invoker<MethodFn>,
}

impl MethodDescriptor {
    pub fn new(
        name: impl Into<SmolStr>,
        params: Vec<ParamDescriptor>,
        return_type: Option<&str>,
        f: impl Fn(Option<&Value>, &[Value]) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            return_type: return_type.map(SmolStr::new),
            is_static: false,
            is_synthetic: false,
            markers: Vec::new(),
            invoker: Invoker::method(f),
        }
    }

    pub fn marker(mut self, marker: MarkerUse) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn synthetic(mut self) -> Self {
        self.is_synthetic = true;
        self
    }
}

/// Everything the container needs to know about one scanned type.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: SmolStr,
    pub kind: ClassKind,
    pub type_params: Vec<SmolStr>,
    pub super_class: Option<SmolStr>,
    pub interfaces: Vec<SmolStr>,
    pub markers: Vec<MarkerUse>,
    pub constructors: Vec<ConstructorDescriptor>,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<SmolStr>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            type_params: Vec::new(),
            super_class: None,
            interfaces: Vec::new(),
            markers: Vec::new(),
            constructors: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn class(name: impl Into<SmolStr>) -> Self {
        Self::new(name, ClassKind::Class)
    }

    pub fn interface(name: impl Into<SmolStr>) -> Self {
        Self::new(name, ClassKind::Interface)
    }

    pub fn type_params(mut self, params: &[&str]) -> Self {
        self.type_params = params.iter().map(|p| SmolStr::new(p)).collect();
        self
    }

    pub fn extends(mut self, super_class: impl Into<SmolStr>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<SmolStr>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn marker(mut self, marker: MarkerUse) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Package part of a dotted or `::`-separated name (empty for bare names).
    pub fn package(&self) -> &str {
        let cut = match (self.name.rfind("::"), self.name.rfind('.')) {
            (Some(colons), Some(dot)) if dot > colons => dot,
            (Some(colons), _) => colons,
            (None, Some(dot)) => dot,
            (None, None) => return "",
        };
        &self.name[..cut]
    }
}

/// Source of type descriptors for a set of packages.
pub trait Scanner {
    fn scan(&self, packages: &[String]) -> anyhow::Result<Vec<TypeDescriptor>>;
}

/// Scanner over a fixed descriptor list, typically generated at build time.
#[derive(Debug, Clone, Default)]
pub struct StaticScanner {
    descriptors: Vec<TypeDescriptor>,
}

impl StaticScanner {
    pub fn new(descriptors: Vec<TypeDescriptor>) -> Self {
        Self { descriptors }
    }
}

impl Scanner for StaticScanner {
    /// Descriptors whose package is one of `packages` or nested under one. An
    /// empty package list selects everything.
    fn scan(&self, packages: &[String]) -> anyhow::Result<Vec<TypeDescriptor>> {
        Ok(self
            .descriptors
            .iter()
            .filter(|desc| {
                packages.is_empty()
                    || packages.iter().any(|pkg| {
                        let own = desc.package();
                        own == pkg
                            || own
                                .strip_prefix(pkg.as_str())
                                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with("::"))
                    })
            })
            .cloned()
            .collect())
    }
}
