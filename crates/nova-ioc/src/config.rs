//! Container configuration and logging setup.
//!
//! ```toml
//! packages = ["app"]
//! eager_singletons = true
//!
//! [validation]
//! handler_params = false
//!
//! [logging]
//! level = "nova.ioc=debug"
//!
//! [properties]
//! "db.url" = "postgres://localhost/app"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    /// Packages handed to the scanner; empty means everything it knows.
    #[serde(default)]
    pub packages: Vec<String>,

    /// Instantiate every singleton provider during bootstrap.
    #[serde(default = "ContainerConfig::default_eager_singletons")]
    pub eager_singletons: bool,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Inline property values, consulted after any sources added in code.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ContainerConfig {
    fn default_eager_singletons() -> bool {
        true
    }

    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            eager_singletons: Self::default_eager_singletons(),
            validation: ValidationConfig::default(),
            logging: LoggingConfig::default(),
            properties: BTreeMap::new(),
        }
    }
}

/// Toggles for the bootstrap validators. All are on by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    #[serde(default = "enabled")]
    pub cycles: bool,
    #[serde(default = "enabled")]
    pub resolvability: bool,
    #[serde(default = "enabled")]
    pub handler_params: bool,
}

fn enabled() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            cycles: true,
            resolvability: true,
            handler_params: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A simple level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,

    /// Write to stderr instead of stdout.
    #[serde(default = "LoggingConfig::default_stderr")]
    pub stderr: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    fn default_stderr() -> bool {
        true
    }

    /// The configured level as a directive, with `warning` accepted for `warn`.
    fn level_directive(&self) -> String {
        let level = self.level.trim();
        match level.to_ascii_lowercase().as_str() {
            "" => Self::default_level(),
            "warning" => "warn".to_owned(),
            simple @ ("off" | "trace" | "debug" | "info" | "warn" | "error") => simple.to_owned(),
            _ => level.to_owned(),
        }
    }

    /// The effective filter: the configured level, then `RUST_LOG` when set.
    /// Directives that do not parse fall back to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        let mut directives = self.level_directive();
        if let Ok(env) = std::env::var("RUST_LOG") {
            if !env.trim().is_empty() {
                directives = format!("{directives},{}", env.trim());
            }
        }
        EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(Self::default_level()))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
            stderr: Self::default_stderr(),
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Install a global `tracing` subscriber.
///
/// Safe to call more than once; only the first call installs anything, and an
/// already-installed subscriber from elsewhere is left alone.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let builder = tracing_subscriber::fmt().with_env_filter(config.env_filter());
        let result = match (config.json, config.stderr) {
            (true, true) => builder.json().with_writer(std::io::stderr).try_init(),
            (true, false) => builder.json().try_init(),
            (false, true) => builder.with_writer(std::io::stderr).try_init(),
            (false, false) => builder.try_init(),
        };
        if result.is_ok() {
            tracing::debug!(target = "nova.ioc", level = %config.level, "tracing initialized");
        }
    });
}
