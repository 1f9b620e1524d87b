//! berth-core: Core library for Berth
//!
//! Berth attaches an embeddable UI runtime (the engine) to a host
//! application component — a screen-like container with a create →
//! build-view → start → resume → pause → stop → destroy-view → destroy
//! lifecycle. This crate owns the hard part: reconciling the host's
//! externally-driven, re-entrant callbacks with the engine's own
//! lifecycle, across three engine ownership modes, without leaking or
//! double-releasing anything.
//!
//! # Architecture
//!
//! ```text
//! Host callback → LifecycleDelegate ─┬─▶ Engine (owned / host / cached)
//!                                    ├─▶ RenderSurface
//!                                    ├─▶ PlatformPlugin
//!                                    └─▶ SplashController
//! ```
//!
//! # Modules
//!
//! - `delegate`: the lifecycle delegate state machine (the core)
//! - `host`: host capability contract and the two stock host variants
//! - `engine`: the embeddable runtime engine handle
//! - `engine_cache`: engine group and identifier-keyed engine cache
//! - `surface`: rendering surface bound to one engine at a time
//! - `platform_plugin`: host-OS bridge, alive only while a view exists
//! - `splash`: splash overlay shown until the first frame
//! - `config`: host options and file-driven embedder configuration
//! - `logging`: structured logging setup
//! - `error`: error taxonomy
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod config;
pub mod delegate;
pub mod engine;
pub mod engine_cache;
pub mod error;
pub mod host;
pub mod logging;
pub mod platform_plugin;
pub mod splash;
pub mod surface;

pub use config::{EmbedderConfig, HostOptions, LogFormat, RenderMode, TransparencyMode};
pub use delegate::{DelegatePhase, EngineProvenance, LifecycleDelegate};
pub use engine::{AppLifecycle, DEFAULT_PLUGINS, Engine, EngineSnapshot};
pub use engine_cache::{EngineCache, EngineGroup};
pub use error::{AttachError, ConfigError, EngineError, Error, Result};
pub use host::{
    EngineConfigurator, Host, HostContext, HostWindow, PlatformCapabilities, RegionHost,
    ViewContainer, WindowHost,
};
pub use platform_plugin::{PLATFORM_PLUGIN_NAME, PlatformPlugin};
pub use splash::{SharedSplash, SolidColorSplash, SplashController, SplashScreen, SplashState};
pub use surface::RenderSurface;
