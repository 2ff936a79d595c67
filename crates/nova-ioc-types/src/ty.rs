use std::fmt;

use smol_str::SmolStr;

/// Name of the well-known top type. Every class and array type is a subtype of it.
pub const TOP_TYPE: &str = "Object";

/// A structural type signature.
///
/// Equality is structural: two `List<String>` values compare equal regardless of
/// where they were built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Class(ClassType),
    /// A type variable that has not been substituted (e.g. `T` in `Box<T>`).
    TypeVar(SmolStr),
    /// Only meaningful as a type argument.
    Wildcard(WildcardBound),
    Array(Box<Type>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub name: SmolStr,
    pub args: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

impl Type {
    pub fn class(name: impl Into<SmolStr>, args: Vec<Type>) -> Self {
        Type::Class(ClassType {
            name: name.into(),
            args,
        })
    }

    /// A class type without type arguments.
    pub fn named(name: impl Into<SmolStr>) -> Self {
        Type::class(name, Vec::new())
    }

    pub fn array(component: Type) -> Self {
        Type::Array(Box::new(component))
    }

    pub fn type_var(name: impl Into<SmolStr>) -> Self {
        Type::TypeVar(name.into())
    }

    pub fn top() -> Self {
        Type::named(TOP_TYPE)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Type::Class(ClassType { name, args }) if name == TOP_TYPE && args.is_empty())
    }

    /// Raw class name for class types.
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            Type::Class(class) => Some(class.name.as_str()),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Type] {
        match self {
            Type::Class(class) => &class.args,
            _ => &[],
        }
    }

    pub fn is_parameterized(&self) -> bool {
        !self.args().is_empty()
    }

    /// Drop all type arguments. Type variables and wildcards erase to their
    /// upper bound, or the top type when unbounded.
    pub fn erasure(&self) -> Type {
        match self {
            Type::Class(class) => Type::named(class.name.clone()),
            Type::Array(component) => Type::array(component.erasure()),
            Type::Wildcard(WildcardBound::Extends(bound)) => bound.erasure(),
            Type::TypeVar(_) | Type::Wildcard(_) => Type::top(),
        }
    }

    pub fn contains_type_vars(&self) -> bool {
        match self {
            Type::TypeVar(_) => true,
            Type::Class(class) => class.args.iter().any(Type::contains_type_vars),
            Type::Array(component) => component.contains_type_vars(),
            Type::Wildcard(WildcardBound::Unbounded) => false,
            Type::Wildcard(WildcardBound::Extends(bound) | WildcardBound::Super(bound)) => {
                bound.contains_type_vars()
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Class(class) => fmt::Display::fmt(class, f),
            Type::TypeVar(name) => f.write_str(name),
            Type::Wildcard(WildcardBound::Unbounded) => f.write_str("?"),
            Type::Wildcard(WildcardBound::Extends(bound)) => write!(f, "? extends {bound}"),
            Type::Wildcard(WildcardBound::Super(bound)) => write!(f, "? super {bound}"),
            Type::Array(component) => write!(f, "{component}[]"),
        }
    }
}

impl fmt::Display for ClassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.args.is_empty() {
            return Ok(());
        }
        f.write_str("<")?;
        for (idx, arg) in self.args.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(">")
    }
}
