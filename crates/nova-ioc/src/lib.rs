//! Nova's dependency-injection container.
//!
//! Bootstrap runs in a fixed sequence: scan descriptors, build metadata and
//! dependency graphs, validate, compute the initialization order, then resolve.
//! Any failure aborts bootstrap; there is no partially initialized container.
//!
//! ```no_run
//! # use nova_ioc::{Container, ContainerConfig};
//! # use nova_ioc_metadata::StaticScanner;
//! let config = ContainerConfig::load_from_path("nova-ioc.toml")?;
//! nova_ioc::init_tracing(&config.logging);
//! let container = Container::bootstrap(config, &StaticScanner::default())?;
//! let clock = container.get_instance("app.Clock")?;
//! # let _ = clock;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
mod container;
pub mod convert;
mod error;
pub mod ordering;
pub mod properties;
pub mod repository;
pub mod resolver;
pub mod validation;

pub use config::{init_tracing, ContainerConfig, LoggingConfig, ValidationConfig};
pub use container::{Container, ContainerBuilder};
pub use convert::{Converter, ConverterRegistry, SharedConverter};
pub use error::{BootstrapError, ConfigError, OrderingError, ResolveError, ValidationError};
pub use ordering::OrderingService;
pub use properties::{LayeredPropertySource, MapPropertySource, PropertySource};
pub use resolver::{Absent, CustomResolver, Invocation, MemberResolver, SharedResolver};
pub use validation::{ValidationIssue, ValidationPhase, ValidationService, Validator};
