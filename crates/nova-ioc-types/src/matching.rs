//! Structural compatibility between required and provided keys.
//!
//! A false positive here wires the wrong bean and a false negative blocks a
//! valid application, so the rules are deliberately small:
//!
//! 1. plain required type: the provided raw class must be a subclass of it;
//! 2. parameterized required type: some generic supertype of the provided
//!    type must be structurally equal to it. Type arguments are invariant, so
//!    `List<Number>` does not accept `ArrayList<Integer>`; wildcard arguments
//!    in the required type are checked with rule 3;
//! 3. wildcard required type: the provided type must satisfy the upper bound and
//!    be a supertype of the lower bound;
//! 4. anything else: structural equality.

use crate::{
    generic_supertypes, is_subclass, BeanKey, Shape, Type, TypeEnv, TypeKey, WildcardBound,
};

/// Whether a value of type `provided` can be injected where `required` is declared.
pub fn type_matches(env: &dyn TypeEnv, required: &Type, provided: &Type) -> bool {
    match (required, provided) {
        (Type::Wildcard(bound), _) => wildcard_accepts(env, bound, provided),
        // An unsubstituted variable erases to the top type.
        (Type::TypeVar(_), Type::Class(_) | Type::Array(_)) => true,
        (Type::Class(_), Type::Class(_) | Type::Array(_)) if required.is_top() => true,
        (Type::Array(req), Type::Array(prov)) => type_matches(env, req, prov),
        (Type::Class(req), Type::Class(prov)) => {
            if req.args.is_empty() {
                is_subclass(env, &prov.name, &req.name)
            } else {
                generic_supertypes(env, provided)
                    .iter()
                    .any(|sup| structurally_equal(env, required, sup))
            }
        }
        _ => required == provided,
    }
}

fn wildcard_accepts(env: &dyn TypeEnv, bound: &WildcardBound, provided: &Type) -> bool {
    match bound {
        WildcardBound::Unbounded => true,
        WildcardBound::Extends(upper) => type_matches(env, upper, provided),
        WildcardBound::Super(lower) => type_matches(env, provided, lower),
    }
}

fn structurally_equal(env: &dyn TypeEnv, required: &Type, candidate: &Type) -> bool {
    match (required, candidate) {
        (Type::Wildcard(bound), _) => wildcard_accepts(env, bound, candidate),
        (Type::Class(req), Type::Class(cand)) => {
            req.name == cand.name
                && req.args.len() == cand.args.len()
                && req
                    .args
                    .iter()
                    .zip(cand.args.iter())
                    .all(|(r, c)| structurally_equal(env, r, c))
        }
        (Type::Array(req), Type::Array(cand)) => structurally_equal(env, req, cand),
        _ => required == candidate,
    }
}

fn qualifier_accepts(required: Option<&str>, provided: Option<&str>, wildcard: bool) -> bool {
    match required {
        None if wildcard => true,
        _ => required == provided,
    }
}

fn bean_key_matches(env: &dyn TypeEnv, required: &BeanKey, provided: &BeanKey) -> bool {
    match required.shape() {
        Shape::Scalar => {
            qualifier_accepts(required.qualifier(), provided.qualifier(), false)
                && type_matches(env, required.ty(), provided.ty())
        }
        Shape::Array | Shape::Collection(_) => {
            let element = required.element();
            qualifier_accepts(element.qualifier(), provided.qualifier(), true)
                && type_matches(env, element.ty(), provided.ty())
        }
    }
}

/// Whether the `provided` key satisfies the `required` key.
///
/// Scalar requirements need an exact qualifier match (an unqualified requirement
/// only accepts unqualified providers). Array and collection requirements are
/// matched element-wise, and an unqualified element accepts any qualifier.
pub fn key_matches(env: &dyn TypeEnv, required: &TypeKey, provided: &TypeKey) -> bool {
    match (required, provided) {
        (TypeKey::Bean(req), TypeKey::Bean(prov)) => bean_key_matches(env, req, prov),
        (TypeKey::Property(req), TypeKey::Property(prov)) => req == prov,
        (TypeKey::Handler(req), TypeKey::Handler(prov)) => {
            req.marker() == prov.marker()
                && req.params().len() == prov.params().len()
                && req
                    .params()
                    .iter()
                    .zip(prov.params())
                    .all(|(r, p)| key_matches(env, r, p))
        }
        _ => false,
    }
}

/// Whether at least one of `provided` satisfies `required`.
pub fn is_match_by_type_or_generic_type<'a>(
    env: &dyn TypeEnv,
    required: &TypeKey,
    provided: impl IntoIterator<Item = &'a TypeKey>,
) -> bool {
    provided
        .into_iter()
        .any(|candidate| key_matches(env, required, candidate))
}
