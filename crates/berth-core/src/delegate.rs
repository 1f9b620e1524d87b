//! The lifecycle delegate — the coordinator that attaches an embeddable
//! runtime engine to a host container.
//!
//! A delegate is bound to exactly one [`Host`] and translates the host's
//! externally-driven lifecycle callbacks (`on_create` → `on_create_view` →
//! `on_start` → `on_resume` → `on_pause` → `on_stop` → `on_destroy_view` →
//! `on_destroy`) into engine, surface, and plugin transitions.
//!
//! # Phase machine
//!
//! ```text
//! Detached ── on_create ──▶ Created ── on_create_view ──▶ ViewAttached
//!     ▲                        │  ▲                            │
//!     │                        │  └───── on_create_view ───────┤
//!     └─────── on_destroy ─────┘        (rebuild)              │
//!                 ▲                                            │
//!                 └──────────── ViewDetached ◀── on_destroy_view
//! ```
//!
//! Host platforms are known to deliver duplicate callbacks during rapid
//! lifecycle churn (configuration changes, abandoned creation). Every
//! transition is therefore guarded by "already done?" checks: a duplicate
//! delivery is a logged no-op, never a double construction, a double
//! registration, or a double release.
//!
//! # Ownership
//!
//! The delegate destroys an engine only when it constructed that engine
//! itself. Engines supplied by the host or resolved through the cache /
//! engine group belong to their provider; the delegate records provenance
//! explicitly ([`EngineProvenance`]) at acquisition time so the rule is
//! mechanically checkable.
//!
//! # Threading
//!
//! Every callback runs synchronously on the host's main thread; the
//! delegate takes `&mut self` and performs no locking of its own. Mutual
//! exclusion between transitions is structural, guaranteed by the host
//! platform's single-threaded callback dispatch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::engine::Engine;
use crate::engine_cache::{EngineCache, EngineGroup};
use crate::error::{AttachError, Result};
use crate::host::{EngineConfigurator, Host, ViewContainer};
use crate::platform_plugin::PlatformPlugin;
use crate::splash::{self, SharedSplash, SplashController};
use crate::surface::RenderSurface;

/// Where a delegate is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegatePhase {
    /// Not created, or fully destroyed.
    Detached,
    /// Created; no view yet. The engine may still be deferred (cached id).
    Created,
    /// A rendering surface and platform plugin are live.
    ViewAttached,
    /// The view was torn down; the engine survives for a possible rebuild.
    ViewDetached,
}

impl DelegatePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Detached => "detached",
            Self::Created => "created",
            Self::ViewAttached => "view_attached",
            Self::ViewDetached => "view_detached",
        }
    }
}

/// How the delegate's engine was obtained. Decides who destroys it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineProvenance {
    /// Constructed by the delegate; destroyed by the delegate.
    DelegateOwned,
    /// Supplied by the host factory hook; the host owns it.
    HostProvided,
    /// Resolved through the cache / engine group; the cache owns it.
    Cached,
}

impl EngineProvenance {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DelegateOwned => "delegate_owned",
            Self::HostProvided => "host_provided",
            Self::Cached => "cached",
        }
    }

    /// Whether the delegate is responsible for destroying the engine.
    #[must_use]
    pub const fn is_owned(self) -> bool {
        matches!(self, Self::DelegateOwned)
    }
}

#[derive(Debug)]
struct EngineSlot {
    engine: Arc<Engine>,
    provenance: EngineProvenance,
}

/// Coordinates engine, surface, and plugin lifecycles for one host.
pub struct LifecycleDelegate<H: Host> {
    host: H,
    cache: Arc<EngineCache>,
    group: Arc<EngineGroup>,
    phase: DelegatePhase,
    engine: Option<EngineSlot>,
    configurator: Option<Box<dyn EngineConfigurator>>,
    engine_configured: bool,
    plugins_registered: bool,
    host_control_attached: bool,
    surface: Option<Arc<RenderSurface>>,
    plugin: Option<PlatformPlugin>,
    splash: Option<SharedSplash>,
}

impl<H: Host> LifecycleDelegate<H> {
    /// Bind a delegate to a host with a private cache and engine group.
    ///
    /// Suitable for standalone hosts. Hosts that share cached engines must
    /// use [`with_runtime`](Self::with_runtime) so they resolve identifiers
    /// against the same registry.
    #[must_use]
    pub fn new(host: H) -> Self {
        Self::with_runtime(
            host,
            Arc::new(EngineCache::new()),
            Arc::new(EngineGroup::new()),
        )
    }

    /// Bind a delegate to a host, resolving cached engines through shared
    /// registries.
    #[must_use]
    pub fn with_runtime(host: H, cache: Arc<EngineCache>, group: Arc<EngineGroup>) -> Self {
        Self {
            host,
            cache,
            group,
            phase: DelegatePhase::Detached,
            engine: None,
            configurator: None,
            engine_configured: false,
            plugins_registered: false,
            host_control_attached: false,
            surface: None,
            plugin: None,
            splash: None,
        }
    }

    // ========================================================================
    // Host callbacks
    // ========================================================================

    /// The host was created.
    ///
    /// Acquires an engine eagerly unless the host names a cached engine, in
    /// which case acquisition is deferred to [`on_create_view`]
    /// (or to whoever populates the cache first). An unavailable engine is
    /// tolerated: the delegate enters `Created` in a degraded, viewless
    /// state and the host decides what to surface.
    ///
    /// [`on_create_view`]: Self::on_create_view
    pub fn on_create(&mut self, saved_state: Option<&[u8]>) {
        if self.phase != DelegatePhase::Detached {
            warn!(
                delegate_phase = self.phase.as_str(),
                "duplicate on_create ignored"
            );
            return;
        }

        let context = self.host.context();
        if context.capabilities().translucent_system_bars {
            if let Some(window) = self.host.window() {
                window.request_translucent_system_bars();
            }
        }

        match self.host.cached_engine_id() {
            Some(cache_id) => {
                debug!(
                    cache_id = %cache_id,
                    host_id = context.host_id(),
                    "engine acquisition deferred to view build"
                );
            }
            None => {
                self.acquire_uncached_engine();
                self.finish_engine_setup(saved_state);
            }
        }

        self.phase = DelegatePhase::Created;
        info!(
            host_id = context.host_id(),
            engine_id = self.engine.as_ref().map(|slot| slot.engine.id()),
            "delegate created"
        );
    }

    /// The host wants its view built.
    ///
    /// Resolves a deferred engine if necessary, then builds the rendering
    /// surface, the platform plugin, and (when supplied) the splash
    /// overlay. Returns `Ok(None)` when no engine is available or when the
    /// engine already drives another host's view; a mid-build failure rolls
    /// back the partial attachment and propagates.
    pub fn on_create_view(
        &mut self,
        container: &ViewContainer,
        saved_state: Option<&[u8]>,
    ) -> Result<Option<Arc<RenderSurface>>> {
        match self.phase {
            DelegatePhase::ViewAttached => {
                warn!("view already attached; returning the existing surface");
                return Ok(self.surface.clone());
            }
            DelegatePhase::Detached => {
                warn!("on_create_view before on_create; ignoring");
                return Ok(None);
            }
            DelegatePhase::Created | DelegatePhase::ViewDetached => {}
        }

        if self.engine.is_none() {
            match self.host.cached_engine_id() {
                Some(cache_id) => self.acquire_cached_engine(&cache_id),
                None => self.acquire_uncached_engine(),
            }
        }
        self.finish_engine_setup(saved_state);

        let Some(engine) = self.current_engine() else {
            info!("no engine available; reporting no surface");
            return Ok(None);
        };

        let context = self.host.context();
        let surface = Arc::new(RenderSurface::new(
            self.host.render_mode(),
            self.host.transparency_mode(),
            context.capabilities(),
            container.id(),
        ));

        if let Err(err) = surface.attach_to_engine(&engine) {
            return match err {
                AttachError::SurfaceBusy { .. } => {
                    warn!(
                        engine_id = engine.id(),
                        error = %err,
                        "engine already drives another view; refusing second attachment"
                    );
                    Ok(None)
                }
                other => Err(other.into()),
            };
        }

        let Some(window) = self.host.window() else {
            surface.detach_from_engine();
            return Err(AttachError::HostWindowUnavailable.into());
        };
        let plugin = match PlatformPlugin::attach(&engine, &window) {
            Ok(plugin) => plugin,
            Err(err) => {
                surface.detach_from_engine();
                return Err(err.into());
            }
        };

        if let Some(screen) = self.host.provide_splash_screen() {
            let controller = SplashController::shared(screen);
            splash::lock(&controller).show();
            surface.install_splash(Arc::clone(&controller));
            self.splash = Some(controller);
        }

        self.surface = Some(Arc::clone(&surface));
        self.plugin = Some(plugin);
        self.phase = DelegatePhase::ViewAttached;
        info!(
            surface_id = surface.id(),
            engine_id = engine.id(),
            container_id = container.id(),
            "view attached"
        );
        Ok(Some(surface))
    }

    /// The host became visible.
    pub fn on_start(&self) {
        self.forward_lifecycle("on_start", Engine::notify_started);
    }

    /// The host gained focus.
    pub fn on_resume(&self) {
        self.forward_lifecycle("on_resume", Engine::notify_resumed);
    }

    /// The host lost focus.
    pub fn on_pause(&self) {
        self.forward_lifecycle("on_pause", Engine::notify_paused);
    }

    /// The host is no longer visible.
    pub fn on_stop(&self) {
        self.forward_lifecycle("on_stop", Engine::notify_stopped);
    }

    /// The host's view is going away.
    ///
    /// Releases in strict order: splash → platform plugin → surface. The
    /// engine survives, so a later [`on_create_view`](Self::on_create_view)
    /// can rebuild against it (configuration-change teardown).
    pub fn on_destroy_view(&mut self) {
        if self.phase != DelegatePhase::ViewAttached {
            warn!(
                delegate_phase = self.phase.as_str(),
                "on_destroy_view without an attached view; ignoring"
            );
            return;
        }

        if let Some(controller) = self.splash.take() {
            splash::lock(&controller).dismiss();
        }
        if let Some(mut plugin) = self.plugin.take() {
            plugin.detach();
        }
        if let Some(surface) = self.surface.take() {
            surface.detach_from_engine();
        }

        self.phase = DelegatePhase::ViewDetached;
        info!("view detached");
    }

    /// The host is going away for good.
    ///
    /// A still-attached view is torn down first. The engine is destroyed
    /// only when the delegate owns it and the host has not asked for the
    /// engine to outlive the host.
    pub fn on_destroy(&mut self) {
        match self.phase {
            DelegatePhase::Detached => {
                warn!("duplicate on_destroy ignored");
                return;
            }
            DelegatePhase::ViewAttached => {
                warn!("on_destroy with a live view; forcing view teardown first");
                self.on_destroy_view();
            }
            DelegatePhase::Created | DelegatePhase::ViewDetached => {}
        }

        if let Some(slot) = self.engine.take() {
            if self.host_control_attached {
                slot.engine.detach_host_control();
                self.host_control_attached = false;
            }
            if let Some(configurator) = &self.configurator {
                configurator.cleanup(&slot.engine);
            }
            match slot.provenance {
                EngineProvenance::DelegateOwned => {
                    if self.host.should_attach_engine_to_host() {
                        debug!(
                            engine_id = slot.engine.id(),
                            "owned engine kept alive for host-level control"
                        );
                    } else if let Err(err) = slot.engine.destroy() {
                        debug_assert!(false, "owned engine destroyed twice: {err}");
                        error!(
                            engine_id = slot.engine.id(),
                            error = %err,
                            "owned engine was already destroyed"
                        );
                    }
                }
                EngineProvenance::HostProvided | EngineProvenance::Cached => {
                    debug!(
                        engine_id = slot.engine.id(),
                        provenance = slot.provenance.as_str(),
                        "engine not owned by delegate; leaving it running"
                    );
                }
            }
        }

        self.configurator = None;
        self.engine_configured = false;
        self.plugins_registered = false;
        self.phase = DelegatePhase::Detached;
        info!("delegate detached");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn phase(&self) -> DelegatePhase {
        self.phase
    }

    #[must_use]
    pub fn engine(&self) -> Option<Arc<Engine>> {
        self.current_engine()
    }

    #[must_use]
    pub fn engine_provenance(&self) -> Option<EngineProvenance> {
        self.engine.as_ref().map(|slot| slot.provenance)
    }

    #[must_use]
    pub fn surface(&self) -> Option<Arc<RenderSurface>> {
        self.surface.clone()
    }

    #[must_use]
    pub fn platform_plugin(&self) -> Option<&PlatformPlugin> {
        self.plugin.as_ref()
    }

    #[must_use]
    pub fn splash(&self) -> Option<SharedSplash> {
        self.splash.clone()
    }

    #[must_use]
    pub fn configurator(&self) -> Option<&dyn EngineConfigurator> {
        self.configurator.as_deref()
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[must_use]
    pub fn engine_cache(&self) -> &Arc<EngineCache> {
        &self.cache
    }

    #[must_use]
    pub fn engine_group(&self) -> &Arc<EngineGroup> {
        &self.group
    }

    // ========================================================================
    // Internal
    // ========================================================================

    fn current_engine(&self) -> Option<Arc<Engine>> {
        self.engine.as_ref().map(|slot| Arc::clone(&slot.engine))
    }

    /// Acquire an engine for a host with no cached identifier: the host's
    /// factory hook first, delegate-side construction as the fallback.
    fn acquire_uncached_engine(&mut self) {
        let context = self.host.context();
        if let Some(engine) = self.host.provide_engine(&context) {
            info!(
                engine_id = engine.id(),
                host_id = context.host_id(),
                "using host-provided engine"
            );
            self.engine = Some(EngineSlot {
                engine,
                provenance: EngineProvenance::HostProvided,
            });
            return;
        }

        match Engine::create(&context) {
            Ok(engine) => {
                if let Some(route) = self.host.initial_route() {
                    engine.set_initial_route(route);
                }
                self.engine = Some(EngineSlot {
                    engine,
                    provenance: EngineProvenance::DelegateOwned,
                });
            }
            Err(err) => {
                warn!(
                    host_id = context.host_id(),
                    error = %err,
                    "engine unavailable; delegate continues without one"
                );
            }
        }
    }

    /// Resolve a cached engine: reuse a live cache entry, otherwise create
    /// one through the engine group and cache it under the identifier.
    /// Either way the engine belongs to the cache, not to this delegate.
    fn acquire_cached_engine(&mut self, cache_id: &str) {
        if let Some(engine) = self.cache.get(cache_id) {
            if engine.is_destroyed() {
                warn!(
                    cache_id = %cache_id,
                    engine_id = engine.id(),
                    "cached engine is destroyed; replacing it"
                );
            } else {
                info!(
                    cache_id = %cache_id,
                    engine_id = engine.id(),
                    "reusing cached engine"
                );
                self.engine = Some(EngineSlot {
                    engine,
                    provenance: EngineProvenance::Cached,
                });
                return;
            }
        }

        let context = self.host.context();
        match self.group.create_and_run_engine(&context) {
            Ok(engine) => {
                self.cache.put(cache_id, Arc::clone(&engine));
                self.engine = Some(EngineSlot {
                    engine,
                    provenance: EngineProvenance::Cached,
                });
            }
            Err(err) => {
                warn!(
                    cache_id = %cache_id,
                    error = %err,
                    "engine group could not create an engine"
                );
            }
        }
    }

    /// One-time engine setup after acquisition. Safe to call repeatedly:
    /// every step is guarded so re-entrant host callbacks cannot configure
    /// the engine or register plugins twice.
    fn finish_engine_setup(&mut self, saved_state: Option<&[u8]>) {
        let Some(engine) = self.current_engine() else {
            return;
        };

        if !self.engine_configured {
            self.configurator = self.host.provide_engine_configurator();
            if let Some(configurator) = &self.configurator {
                configurator.configure(&engine);
            }
            self.engine_configured = true;
        }

        if !self.plugins_registered {
            if self.host.should_auto_register_plugins() {
                let added = engine.register_default_plugins();
                debug!(
                    engine_id = engine.id(),
                    added, "default plugins registered"
                );
            }
            self.plugins_registered = true;
        }

        if let Some(data) = saved_state {
            if engine.restoration_data().is_none() {
                engine.set_restoration_data(data);
            }
        }

        if self.host.should_attach_engine_to_host() && !self.host_control_attached {
            if let Some(window) = self.host.window() {
                match engine.attach_host_control(window.id()) {
                    Ok(()) => self.host_control_attached = true,
                    Err(err) => {
                        warn!(
                            engine_id = engine.id(),
                            window_id = window.id(),
                            error = %err,
                            "host control unavailable; continuing without it"
                        );
                    }
                }
            }
        }
    }

    fn forward_lifecycle(&self, event: &str, notify: fn(&Engine)) {
        match &self.engine {
            Some(slot) => notify(&slot.engine),
            None => debug!(event, "lifecycle callback with no engine"),
        }
    }
}

impl<H: Host> std::fmt::Debug for LifecycleDelegate<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleDelegate")
            .field("phase", &self.phase)
            .field(
                "engine",
                &self.engine.as_ref().map(|slot| slot.engine.id()),
            )
            .field("provenance", &self.engine_provenance())
            .field("surface", &self.surface.as_ref().map(|s| s.id()))
            .field("plugin", &self.plugin.is_some())
            .finish()
    }
}
