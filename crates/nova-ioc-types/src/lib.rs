//! Type identities for the Nova IoC runtime.
//!
//! Components are described by structural type signatures (`Repository<User>`,
//! `Handler[]`, `List<? extends Listener>`) rather than by language-level
//! reflection. This crate owns that signature model, the declared type
//! hierarchy used to expand generic supertypes, and the [`TypeKey`] value that
//! names "a thing that can be provided or required".
//!
//! Matching a required key against provided keys lives in [`matching`]; it is
//! the piece every other layer (graph construction, validation, runtime
//! resolution) funnels through.

mod hierarchy;
mod key;
pub mod matching;
mod parse;
mod store;
mod ty;

pub use hierarchy::{generic_supertypes, is_subclass, substitute, type_bindings};
pub use key::{BeanKey, CollectionKind, HandlerKey, PropertyKey, Shape, TypeKey};
pub use matching::{is_match_by_type_or_generic_type, key_matches, type_matches};
pub use parse::{parse_type, parse_type_with_vars, TypeParseError};
pub use store::{ClassDef, ClassKind, TypeEnv, TypeStore};
pub use ty::{ClassType, Type, WildcardBound, TOP_TYPE};
