//! Configuration for embedders and hosts.
//!
//! Hosts answer the delegate's configuration queries from a [`HostOptions`]
//! value; applications that want file-driven defaults load an
//! [`EmbedderConfig`] from TOML and hand the relevant pieces to their hosts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::{LogConfig, LogLevel};

/// How the rendering surface is backed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// A dedicated platform surface (the default; best performance).
    #[default]
    Surface,
    /// A texture composited into the host's own view hierarchy.
    Texture,
}

/// Whether the rendering surface composes over the host content behind it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransparencyMode {
    /// Opaque background (the default).
    #[default]
    Opaque,
    /// Transparent background. Honored only on platforms that report
    /// transparent-surface support; downgraded to opaque otherwise.
    Transparent,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-friendly output for interactive use.
    #[default]
    Pretty,
    /// JSON lines for CI and ops tooling.
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Per-host configuration answered through the host capability contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostOptions {
    /// Rendering surface backing.
    pub render_mode: RenderMode,

    /// Surface transparency request.
    pub transparency_mode: TransparencyMode,

    /// Identifier of a cached engine to reuse instead of creating one.
    /// When set, engine acquisition is deferred to the view-build step and
    /// the engine is owned by the cache, never by the delegate.
    pub cached_engine_id: Option<String>,

    /// Register the stock plugin set on the engine after acquisition.
    pub auto_register_plugins: bool,

    /// Attach the engine's host-control surface to the host window and keep
    /// a delegate-constructed engine alive past `on_destroy`. Off by
    /// default: a host that wants the engine to outlive this delegate must
    /// opt in.
    pub attach_engine_to_host: bool,

    /// Route the engine navigates to when the delegate constructs it.
    pub initial_route: Option<String>,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Surface,
            transparency_mode: TransparencyMode::Opaque,
            cached_engine_id: None,
            auto_register_plugins: true,
            attach_engine_to_host: false,
            initial_route: None,
        }
    }
}

impl HostOptions {
    /// Validate option values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(id) = &self.cached_engine_id {
            if id.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "cached_engine_id must not be empty".to_string(),
                ));
            }
        }
        if let Some(route) = &self.initial_route {
            if !route.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "initial_route must start with '/': {route}"
                )));
            }
        }
        Ok(())
    }
}

/// Top-level embedder configuration, loadable from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// Logging configuration.
    pub log: LogConfig,

    /// Default host options.
    pub host: HostOptions,
}

impl EmbedderConfig {
    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Validate the full configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log
            .level
            .parse::<LogLevel>()
            .map_err(ConfigError::Invalid)?;
        self.host.validate()
    }
}
