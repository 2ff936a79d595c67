use nova_ioc_types::TypeParseError;
use smol_str::SmolStr;
use thiserror::Error;

pub type Result<T, E = MetadataError> = std::result::Result<T, E>;

/// Failures while turning descriptors into metadata. All of them are fatal and
/// raised before any graph work starts.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("invalid type signature `{signature}` in `{owner}`")]
    Type {
        owner: SmolStr,
        signature: SmolStr,
        #[source]
        source: TypeParseError,
    },

    #[error("type `{name}` is described more than once")]
    DuplicateType { name: SmolStr },

    #[error("concrete class `{class}` declares no constructor")]
    MissingConstructor { class: SmolStr },

    #[error(
        "concrete class `{class}` has {count} constructors; exactly one must be declared or marked `Inject`"
    )]
    AmbiguousConstructor { class: SmolStr, count: usize },

    #[error("class `{class}` is marked both singleton and prototype")]
    ConflictingScope { class: SmolStr },

    #[error("unsupported member `{member}` in `{class}`: {reason}")]
    UnsupportedMember {
        class: SmolStr,
        member: SmolStr,
        reason: &'static str,
    },

    #[error("`{name}` is a built-in marker and cannot carry meta-markers")]
    BuiltinMarker { name: SmolStr },
}
