use std::fmt;

use smol_str::SmolStr;

use crate::{Type, TypeEnv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    List,
    Set,
}

/// How many values a requirement asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Array,
    Collection(CollectionKind),
}

/// A typed, optionally qualified bean identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BeanKey {
    ty: Type,
    qualifier: Option<SmolStr>,
    shape: Shape,
}

impl BeanKey {
    /// Key for something a member needs; the shape follows from the type
    /// (`T[]` is an array, `List<T>`/`Set<T>` are collections).
    pub fn required(env: &dyn TypeEnv, ty: Type, qualifier: Option<SmolStr>) -> Self {
        let shape = match &ty {
            Type::Array(_) => Shape::Array,
            Type::Class(class) if class.args.len() == 1 => env
                .collection_kind(&class.name)
                .map_or(Shape::Scalar, Shape::Collection),
            _ => Shape::Scalar,
        };
        Self {
            ty,
            qualifier,
            shape,
        }
    }

    /// Key for something a member supplies. A provider always supplies a single value.
    pub fn provided(ty: Type, qualifier: Option<SmolStr>) -> Self {
        Self {
            ty,
            qualifier,
            shape: Shape::Scalar,
        }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Scalar key for one element of an array or collection key.
    ///
    /// Scalar keys return themselves.
    pub fn element(&self) -> BeanKey {
        let element = match (&self.shape, &self.ty) {
            (Shape::Array, Type::Array(component)) => (**component).clone(),
            (Shape::Collection(_), Type::Class(class)) if class.args.len() == 1 => {
                class.args[0].clone()
            }
            _ => return self.clone(),
        };
        BeanKey {
            ty: element,
            qualifier: self.qualifier.clone(),
            shape: Shape::Scalar,
        }
    }
}

/// A named configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKey(SmolStr);

impl PropertyKey {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Dispatch identity of a handler member: its handler marker and the ordered
/// parameter keys it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    marker: SmolStr,
    params: Vec<TypeKey>,
}

impl HandlerKey {
    pub fn new(marker: impl Into<SmolStr>, params: Vec<TypeKey>) -> Self {
        Self {
            marker: marker.into(),
            params,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn params(&self) -> &[TypeKey] {
        &self.params
    }
}

/// Identity of a resolvable capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Bean(BeanKey),
    Property(PropertyKey),
    Handler(HandlerKey),
}

impl TypeKey {
    pub fn required(env: &dyn TypeEnv, ty: Type, qualifier: Option<SmolStr>) -> Self {
        TypeKey::Bean(BeanKey::required(env, ty, qualifier))
    }

    pub fn provided(ty: Type, qualifier: Option<SmolStr>) -> Self {
        TypeKey::Bean(BeanKey::provided(ty, qualifier))
    }

    pub fn property(name: impl Into<SmolStr>) -> Self {
        TypeKey::Property(PropertyKey::new(name))
    }

    pub fn handler(marker: impl Into<SmolStr>, params: Vec<TypeKey>) -> Self {
        TypeKey::Handler(HandlerKey::new(marker, params))
    }

    pub fn as_bean(&self) -> Option<&BeanKey> {
        match self {
            TypeKey::Bean(key) => Some(key),
            _ => None,
        }
    }

    pub fn ty(&self) -> Option<&Type> {
        self.as_bean().map(BeanKey::ty)
    }

    pub fn shape(&self) -> Shape {
        self.as_bean().map_or(Shape::Scalar, BeanKey::shape)
    }
}

impl fmt::Display for BeanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{} @{}", self.ty, qualifier),
            None => write!(f, "{}", self.ty),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKey::Bean(key) => write!(f, "{key}"),
            TypeKey::Property(key) => write!(f, "${{{}}}", key.name()),
            TypeKey::Handler(key) => {
                write!(f, "@{}(", key.marker)?;
                for (idx, param) in key.params.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                f.write_str(")")
            }
        }
    }
}
