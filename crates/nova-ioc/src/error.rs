use nova_ioc_metadata::MetadataError;
use nova_ioc_types::{TypeKey, TypeParseError};
use smol_str::SmolStr;
use thiserror::Error;

use crate::validation::ValidationIssue;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_owned())
    }
}

#[derive(Debug, Error)]
pub enum OrderingError {
    #[error("cannot order a cyclic graph; nodes on a cycle: {}", .nodes.join(", "))]
    Cyclic { nodes: Vec<String> },
}

/// Every structural problem found before instantiation, reported at once.
#[derive(Debug, Error)]
#[error("{}", format_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    let mut out = format!("container validation failed with {} issue(s)", issues.len());
    for issue in issues {
        out.push_str("\n  ");
        out.push_str(&issue.to_string());
    }
    out
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid type `{text}`")]
    Type {
        text: String,
        #[source]
        source: TypeParseError,
    },

    #[error("no provider for `{key}`")]
    Unresolved { key: TypeKey },

    #[error("`{key}` is provided by several candidates and none is primary: {}", .candidates.join(", "))]
    Ambiguous {
        key: TypeKey,
        candidates: Vec<String>,
    },

    #[error("`{key}` has more than one primary provider: {}", .primaries.join(", "))]
    OverSpecified { key: TypeKey, primaries: Vec<String> },

    #[error("no resolver can handle `{key}`")]
    NoResolver { key: TypeKey },

    #[error("member `{member}` is claimed by several resolvers: {}", .resolvers.join(", "))]
    TooManyResolvers {
        member: String,
        resolvers: Vec<String>,
    },

    #[error("no resolver can invoke member `{member}`")]
    NoMemberResolver { member: String },

    #[error("cyclic resolution: {}", .path.join(" -> "))]
    CyclicResolution { path: Vec<String> },

    #[error("`{member}` failed")]
    Invocation {
        member: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no converter from property `{property}` to `{target}`")]
    NoConverter { property: SmolStr, target: String },

    #[error("cannot convert property `{property}` to `{target}`")]
    Conversion {
        property: SmolStr,
        target: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("value for `{key}` is not a `{expected}`")]
    Downcast { key: TypeKey, expected: &'static str },

    #[error("`{name}` is not a component")]
    UnknownComponent { name: String },

    #[error("`{class}` is not singleton-scoped")]
    NotSingleton { class: String },
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("scanning failed")]
    Scan(#[source] anyhow::Error),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Ordering(#[from] OrderingError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
