//! Shared test infrastructure for berth-core integration tests.
//!
//! Import from integration test files with:
//! ```ignore
//! mod common;
//! use common::RecordingHost;
//! ```
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use berth_core::{
    Engine, EngineConfigurator, Host, HostContext, HostOptions, HostWindow, PlatformCapabilities,
    RenderMode, SplashScreen, TransparencyMode,
};

/// Configurator double that counts its invocations.
pub struct CountingConfigurator {
    configure_calls: Arc<AtomicUsize>,
    cleanup_calls: Arc<AtomicUsize>,
}

impl EngineConfigurator for CountingConfigurator {
    fn configure(&self, _engine: &Engine) {
        self.configure_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn cleanup(&self, _engine: &Engine) {
        self.cleanup_calls.fetch_add(1, Ordering::Relaxed);
    }
}

/// Splash double that counts its visibility transitions.
pub struct CountingSplash {
    shown: Arc<AtomicUsize>,
    dismissed: Arc<AtomicUsize>,
}

impl SplashScreen for CountingSplash {
    fn name(&self) -> &str {
        "counting"
    }

    fn on_shown(&mut self) {
        self.shown.fetch_add(1, Ordering::Relaxed);
    }

    fn on_dismissed(&mut self) {
        self.dismissed.fetch_add(1, Ordering::Relaxed);
    }
}

/// A scriptable host that records every factory-hook invocation.
pub struct RecordingHost {
    context: HostContext,
    window: Option<Arc<HostWindow>>,
    options: HostOptions,
    supplied_engine: Option<Arc<Engine>>,
    use_configurator: bool,
    use_splash: bool,
    pub provide_engine_calls: Arc<AtomicUsize>,
    pub configurator_requests: Arc<AtomicUsize>,
    pub configure_calls: Arc<AtomicUsize>,
    pub cleanup_calls: Arc<AtomicUsize>,
    pub splash_shown: Arc<AtomicUsize>,
    pub splash_dismissed: Arc<AtomicUsize>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            context: HostContext::default(),
            window: Some(Arc::new(HostWindow::new())),
            options: HostOptions::default(),
            supplied_engine: None,
            use_configurator: false,
            use_splash: false,
            provide_engine_calls: Arc::new(AtomicUsize::new(0)),
            configurator_requests: Arc::new(AtomicUsize::new(0)),
            configure_calls: Arc::new(AtomicUsize::new(0)),
            cleanup_calls: Arc::new(AtomicUsize::new(0)),
            splash_shown: Arc::new(AtomicUsize::new(0)),
            splash_dismissed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Host whose platform has no embeddable runtime.
    pub fn without_runtime(mut self) -> Self {
        self.context = HostContext::new(PlatformCapabilities {
            runtime_available: false,
            ..PlatformCapabilities::default()
        });
        self
    }

    pub fn with_capabilities(mut self, capabilities: PlatformCapabilities) -> Self {
        self.context = HostContext::new(capabilities);
        self
    }

    pub fn windowless(mut self) -> Self {
        self.window = None;
        self
    }

    pub fn cached(mut self, id: &str) -> Self {
        self.options.cached_engine_id = Some(id.to_string());
        self
    }

    pub fn with_supplied_engine(mut self, engine: Arc<Engine>) -> Self {
        self.supplied_engine = Some(engine);
        self
    }

    pub fn with_configurator(mut self) -> Self {
        self.use_configurator = true;
        self
    }

    pub fn with_splash(mut self) -> Self {
        self.use_splash = true;
        self
    }

    /// Opt in to host-level engine control (engine outlives the delegate).
    pub fn keep_engine_alive(mut self) -> Self {
        self.options.attach_engine_to_host = true;
        self
    }

    pub fn without_auto_plugins(mut self) -> Self {
        self.options.auto_register_plugins = false;
        self
    }

    pub fn with_options(mut self, options: HostOptions) -> Self {
        self.options = options;
        self
    }

    pub fn window_handle(&self) -> Option<Arc<HostWindow>> {
        self.window.as_ref().map(Arc::clone)
    }

    pub fn configure_count(&self) -> usize {
        self.configure_calls.load(Ordering::Relaxed)
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanup_calls.load(Ordering::Relaxed)
    }

    pub fn provide_engine_count(&self) -> usize {
        self.provide_engine_calls.load(Ordering::Relaxed)
    }
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for RecordingHost {
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

    fn provide_engine(&self, _context: &HostContext) -> Option<Arc<Engine>> {
        self.provide_engine_calls.fetch_add(1, Ordering::Relaxed);
        self.supplied_engine.as_ref().map(Arc::clone)
    }

    fn provide_engine_configurator(&self) -> Option<Box<dyn EngineConfigurator>> {
        self.configurator_requests.fetch_add(1, Ordering::Relaxed);
        if !self.use_configurator {
            return None;
        }
        Some(Box::new(CountingConfigurator {
            configure_calls: Arc::clone(&self.configure_calls),
            cleanup_calls: Arc::clone(&self.cleanup_calls),
        }))
    }

    fn provide_splash_screen(&self) -> Option<Box<dyn SplashScreen>> {
        if !self.use_splash {
            return None;
        }
        Some(Box::new(CountingSplash {
            shown: Arc::clone(&self.splash_shown),
            dismissed: Arc::clone(&self.splash_dismissed),
        }))
    }
}
