use std::collections::{HashMap, HashSet, VecDeque};

use smol_str::SmolStr;

use crate::{ClassDef, ClassType, Type, TypeEnv, WildcardBound, TOP_TYPE};

/// Bind `def`'s type parameters to `args`.
///
/// Raw references (no arguments, or an arity mismatch) bind nothing, leaving the
/// declared type variables in place.
pub fn type_bindings(def: &ClassDef, args: &[Type]) -> HashMap<SmolStr, Type> {
    if args.len() != def.type_params.len() {
        return HashMap::new();
    }
    def.type_params
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect()
}

/// Replace type variables in `ty` according to `bindings`.
pub fn substitute(ty: &Type, bindings: &HashMap<SmolStr, Type>) -> Type {
    if bindings.is_empty() {
        return ty.clone();
    }
    match ty {
        Type::TypeVar(name) => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        Type::Class(class) => Type::class(
            class.name.clone(),
            class.args.iter().map(|arg| substitute(arg, bindings)).collect(),
        ),
        Type::Array(component) => Type::array(substitute(component, bindings)),
        Type::Wildcard(WildcardBound::Unbounded) => ty.clone(),
        Type::Wildcard(WildcardBound::Extends(bound)) => Type::Wildcard(WildcardBound::Extends(
            Box::new(substitute(bound, bindings)),
        )),
        Type::Wildcard(WildcardBound::Super(bound)) => {
            Type::Wildcard(WildcardBound::Super(Box::new(substitute(bound, bindings))))
        }
    }
}

fn direct_supertypes(env: &dyn TypeEnv, class: &ClassType) -> Vec<Type> {
    let Some(def) = env.class(&class.name) else {
        return Vec::new();
    };
    let bindings = type_bindings(def, &class.args);
    def.super_class
        .iter()
        .chain(def.interfaces.iter())
        .map(|sup| substitute(sup, &bindings))
        .collect()
}

/// Every supertype of `ty` (itself included), with type arguments substituted
/// through the inheritance chain.
///
/// The walk is breadth-first, so nearer supertypes come first; the top type is
/// always last for class and array types. Example: with
/// `class IntBox extends Box<Integer>` and `class Box<T> implements Supplier<T>`,
/// `IntBox` expands to `[IntBox, Box<Integer>, Supplier<Integer>, Object]`.
pub fn generic_supertypes(env: &dyn TypeEnv, ty: &Type) -> Vec<Type> {
    let mut out = Vec::new();
    match ty {
        Type::Class(_) => {}
        Type::Array(_) => {
            out.push(ty.clone());
            if !ty.is_top() {
                out.push(Type::top());
            }
            return out;
        }
        Type::TypeVar(_) | Type::Wildcard(_) => {
            out.push(ty.clone());
            return out;
        }
    }

    let mut seen: HashSet<Type> = HashSet::new();
    let mut queue: VecDeque<Type> = VecDeque::new();
    queue.push_back(ty.clone());

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current.clone()) {
            continue;
        }
        if let Type::Class(class) = &current {
            for sup in direct_supertypes(env, class) {
                if !seen.contains(&sup) {
                    queue.push_back(sup);
                }
            }
        }
        if !current.is_top() {
            out.push(current);
        }
    }

    out.push(Type::top());
    out
}

/// Raw-name subclass check: `sub` equals `sup` or inherits from it.
pub fn is_subclass(env: &dyn TypeEnv, sub: &str, sup: &str) -> bool {
    if sub == sup || sup == TOP_TYPE {
        return true;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(sub);

    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        if current == sup {
            return true;
        }
        let Some(def) = env.class(current) else {
            continue;
        };
        for parent in def.super_class.iter().chain(def.interfaces.iter()) {
            if let Some(name) = parent.raw_name() {
                queue.push_back(name);
            }
        }
    }

    false
}
