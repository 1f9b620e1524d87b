//! Host capability contract.
//!
//! A host is the platform container (a full-screen window, or a region
//! embedded in one) whose lifecycle drives a
//! [`LifecycleDelegate`](crate::delegate::LifecycleDelegate). The [`Host`]
//! trait is the complete capability set the delegate consumes; two stock
//! variants — [`WindowHost`] and [`RegionHost`] — share the one delegate
//! implementation.
//!
//! The factory hooks (`provide_engine`, `provide_engine_configurator`,
//! `provide_splash_screen`) are called by the delegate at most once per
//! engine lifetime; hosts must keep them pure with respect to delegate
//! state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::{HostOptions, RenderMode, TransparencyMode};
use crate::engine::Engine;
use crate::splash::SplashScreen;

static NEXT_HOST_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_WINDOW_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// What the host platform is capable of.
///
/// The delegate consults these to decide which cosmetic and rendering
/// features it may request; none of them affect lifecycle correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformCapabilities {
    /// The embeddable runtime is present on this platform. When false,
    /// delegate-side engine construction fails and the delegate runs in a
    /// degraded, viewless state.
    pub runtime_available: bool,
    /// Surfaces may have a transparent background.
    pub transparent_surfaces: bool,
    /// System bars may be styled translucent.
    pub translucent_system_bars: bool,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self {
            runtime_available: true,
            transparent_surfaces: true,
            translucent_system_bars: true,
        }
    }
}

/// Identity and capabilities of the platform context a host runs in.
#[derive(Debug, Clone, Copy)]
pub struct HostContext {
    host_id: u64,
    capabilities: PlatformCapabilities,
}

impl HostContext {
    /// Create a context with the given capabilities.
    #[must_use]
    pub fn new(capabilities: PlatformCapabilities) -> Self {
        Self {
            host_id: NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed),
            capabilities,
        }
    }

    #[must_use]
    pub fn host_id(&self) -> u64 {
        self.host_id
    }

    #[must_use]
    pub fn capabilities(&self) -> &PlatformCapabilities {
        &self.capabilities
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::new(PlatformCapabilities::default())
    }
}

/// The host's top-level window.
///
/// Records the cosmetic chrome requests made against it so hosts and tests
/// can observe them.
#[derive(Debug)]
pub struct HostWindow {
    id: u64,
    translucent_system_bars: AtomicBool,
}

impl HostWindow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed),
            translucent_system_bars: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request translucent system bars. Purely cosmetic.
    pub fn request_translucent_system_bars(&self) {
        self.translucent_system_bars.store(true, Ordering::Relaxed);
    }

    /// Whether translucent system bars were requested on this window.
    #[must_use]
    pub fn translucent_system_bars_requested(&self) -> bool {
        self.translucent_system_bars.load(Ordering::Relaxed)
    }
}

impl Default for HostWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// The view slot a rendering surface mounts into.
#[derive(Debug, Clone, Copy)]
pub struct ViewContainer {
    id: u64,
}

impl ViewContainer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Default for ViewContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// Hook for configuring an engine right after the delegate acquires it.
///
/// `configure` runs exactly once per engine lifetime inside a delegate;
/// `cleanup` runs when the delegate releases the engine.
pub trait EngineConfigurator {
    fn configure(&self, engine: &Engine);

    fn cleanup(&self, engine: &Engine) {
        let _ = engine;
    }
}

/// The capability set a host exposes to its lifecycle delegate.
pub trait Host {
    /// Platform context the host runs in.
    fn context(&self) -> HostContext;

    /// The host's window, if it has one. Region hosts may be windowless,
    /// in which case view builds fail at platform-plugin construction.
    fn window(&self) -> Option<Arc<HostWindow>>;

    /// Identifier of a cached engine to reuse, if any.
    fn cached_engine_id(&self) -> Option<String>;

    /// Attach the engine's host control to the window and keep a
    /// delegate-constructed engine alive past `on_destroy`.
    fn should_attach_engine_to_host(&self) -> bool;

    /// Register the stock plugin set on the engine after acquisition.
    fn should_auto_register_plugins(&self) -> bool;

    fn render_mode(&self) -> RenderMode;

    fn transparency_mode(&self) -> TransparencyMode;

    /// Route the engine navigates to when the delegate constructs it.
    fn initial_route(&self) -> Option<String> {
        None
    }

    /// Supply an engine instead of letting the delegate construct one.
    /// Engines supplied here are owned by the host and never destroyed by
    /// the delegate.
    fn provide_engine(&self, context: &HostContext) -> Option<Arc<Engine>> {
        let _ = context;
        None
    }

    /// Supply a configurator to run against the acquired engine.
    fn provide_engine_configurator(&self) -> Option<Box<dyn EngineConfigurator>> {
        None
    }

    /// Supply a splash screen to overlay until the first frame renders.
    fn provide_splash_screen(&self) -> Option<Box<dyn SplashScreen>> {
        None
    }
}

/// Full-screen host: one window, the whole screen is the view container.
#[derive(Debug)]
pub struct WindowHost {
    context: HostContext,
    window: Arc<HostWindow>,
    options: HostOptions,
}

impl WindowHost {
    #[must_use]
    pub fn new(options: HostOptions) -> Self {
        Self::with_capabilities(options, PlatformCapabilities::default())
    }

    #[must_use]
    pub fn with_capabilities(options: HostOptions, capabilities: PlatformCapabilities) -> Self {
        Self {
            context: HostContext::new(capabilities),
            window: Arc::new(HostWindow::new()),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &HostOptions {
        &self.options
    }
}

impl Host for WindowHost {
    fn context(&self) -> HostContext {
        self.context
    }

    fn window(&self) -> Option<Arc<HostWindow>> {
        Some(Arc::clone(&self.window))
    }

    fn cached_engine_id(&self) -> Option<String> {
        self.options.cached_engine_id.clone()
    }

    fn should_attach_engine_to_host(&self) -> bool {
        self.options.attach_engine_to_host
    }

    fn should_auto_register_plugins(&self) -> bool {
        self.options.auto_register_plugins
    }

    fn render_mode(&self) -> RenderMode {
        self.options.render_mode
    }

    fn transparency_mode(&self) -> TransparencyMode {
        self.options.transparency_mode
    }

    fn initial_route(&self) -> Option<String> {
        self.options.initial_route.clone()
    }
}

/// Embeddable-region host: a view region inside someone else's window.
///
/// The window is optional; a windowless region can still drive engine
/// lifecycle but cannot complete a view build (the platform plugin needs a
/// window to bind to).
#[derive(Debug)]
pub struct RegionHost {
    context: HostContext,
    window: Option<Arc<HostWindow>>,
    options: HostOptions,
}

impl RegionHost {
    /// A region host with no window of its own.
    #[must_use]
    pub fn new(options: HostOptions) -> Self {
        Self {
            context: HostContext::default(),
            window: None,
            options,
        }
    }

    /// A region host embedded in an existing window.
    #[must_use]
    pub fn with_window(options: HostOptions, window: Arc<HostWindow>) -> Self {
        Self {
            context: HostContext::default(),
            window: Some(window),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &HostOptions {
        &self.options
    }
}

impl Host for RegionHost {
    fn context(&self) -> HostContext {
        self.context
    }

    fn window(&self) -> Option<Arc<HostWindow>> {
        self.window.as_ref().map(Arc::clone)
    }

    fn cached_engine_id(&self) -> Option<String> {
        self.options.cached_engine_id.clone()
    }

    fn should_attach_engine_to_host(&self) -> bool {
        self.options.attach_engine_to_host
    }

    fn should_auto_register_plugins(&self) -> bool {
        self.options.auto_register_plugins
    }

    fn render_mode(&self) -> RenderMode {
        self.options.render_mode
    }

    fn transparency_mode(&self) -> TransparencyMode {
        self.options.transparency_mode
    }

    fn initial_route(&self) -> Option<String> {
        self.options.initial_route.clone()
    }
}
