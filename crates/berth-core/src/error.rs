//! Error types for berth-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for berth-core
#[derive(Error, Debug)]
pub enum Error {
    /// Attachment errors (surface, host control, platform plugin)
    #[error("attach error: {0}")]
    Attach(#[from] AttachError),

    /// Engine errors
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration errors
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while wiring a view, plugin, or host control to an engine.
#[derive(Error, Debug)]
pub enum AttachError {
    /// The engine already drives a surface for some host. A second surface
    /// is rejected rather than silently displacing the first.
    #[error(
        "engine {engine_id} already drives surface {attached}; rejected surface {rejected}"
    )]
    SurfaceBusy {
        engine_id: u64,
        attached: u64,
        rejected: u64,
    },

    /// The engine's host-control slot is held by another window.
    #[error(
        "engine {engine_id} host control is held by window {attached}; rejected window {rejected}"
    )]
    HostControlBusy {
        engine_id: u64,
        attached: u64,
        rejected: u64,
    },

    /// The engine has been destroyed and can no longer accept attachments.
    #[error("engine {engine_id} is destroyed")]
    EngineDestroyed { engine_id: u64 },

    /// The host exposes no window to bind the platform plugin to.
    #[error("host has no window to bind the platform plugin to")]
    HostWindowUnavailable,
}

/// Errors raised by engine construction and destruction.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The host context reports no embeddable runtime on this platform.
    #[error("host platform reports no embeddable runtime")]
    RuntimeUnavailable,

    /// The engine was destroyed twice. Only the delegate that owns an
    /// engine may destroy it, and it does so at most once.
    #[error("engine {engine_id} was already destroyed")]
    AlreadyDestroyed { engine_id: u64 },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read a config file from disk.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A parsed value failed validation.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_error_converts_to_crate_error() {
        let err: Error = AttachError::HostWindowUnavailable.into();
        assert!(matches!(err, Error::Attach(_)));
    }

    #[test]
    fn surface_busy_message_names_both_surfaces() {
        let err = AttachError::SurfaceBusy {
            engine_id: 7,
            attached: 1,
            rejected: 2,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("engine 7"));
        assert!(rendered.contains("surface 1"));
        assert!(rendered.contains("surface 2"));
    }

    #[test]
    fn config_read_error_names_path() {
        let err = ConfigError::Read {
            path: PathBuf::from("/tmp/berth.toml"),
            source: std::io::Error::other("denied"),
        };
        assert!(err.to_string().contains("/tmp/berth.toml"));
    }
}
