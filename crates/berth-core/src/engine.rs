//! The embeddable runtime engine, seen from the host side.
//!
//! An [`Engine`] is a shared handle (`Arc<Engine>`) to one runtime
//! instance. The delegate, the rendering surface, the platform plugin, and
//! the engine cache all hold clones of the same handle; interior state sits
//! behind a mutex so the handle stays shareable.
//!
//! The engine enforces the single-view rule itself: it carries exactly one
//! surface slot, and a second attachment — from this host or any other — is
//! rejected rather than displacing the first.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AttachError, EngineError};
use crate::host::HostContext;

static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

/// Plugins registered on every engine when auto-registration is on.
pub const DEFAULT_PLUGINS: &[&str] = &[
    "navigation",
    "text_input",
    "platform_views",
    "system_sound",
];

/// Application lifecycle state as reported through the engine's lifecycle
/// channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppLifecycle {
    /// No host is driving the engine.
    Detached,
    /// Host is visible but not focused.
    Inactive,
    /// Host is visible and focused.
    Resumed,
    /// Host is not visible.
    Paused,
}

#[derive(Debug)]
struct EngineInner {
    destroyed: bool,
    lifecycle: AppLifecycle,
    attached_surface: Option<u64>,
    host_control: Option<u64>,
    plugins: BTreeSet<String>,
    initial_route: Option<String>,
    restoration_data: Option<Vec<u8>>,
}

/// One embeddable runtime instance.
#[derive(Debug)]
pub struct Engine {
    id: u64,
    group_id: Option<u64>,
    inner: Mutex<EngineInner>,
}

/// Reportable snapshot of an engine's state.
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub id: u64,
    pub group_id: Option<u64>,
    pub destroyed: bool,
    pub lifecycle: AppLifecycle,
    pub attached_surface: Option<u64>,
    pub host_control: Option<u64>,
    pub plugins: Vec<String>,
}

impl Engine {
    /// Construct and run a standalone engine for the given host context.
    ///
    /// Fails when the platform reports no embeddable runtime; the caller is
    /// expected to degrade rather than abort.
    pub fn create(context: &HostContext) -> Result<Arc<Self>, EngineError> {
        Self::create_internal(context, None)
    }

    pub(crate) fn create_internal(
        context: &HostContext,
        group_id: Option<u64>,
    ) -> Result<Arc<Self>, EngineError> {
        if !context.capabilities().runtime_available {
            return Err(EngineError::RuntimeUnavailable);
        }
        let engine = Arc::new(Self {
            id: NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed),
            group_id,
            inner: Mutex::new(EngineInner {
                destroyed: false,
                lifecycle: AppLifecycle::Detached,
                attached_surface: None,
                host_control: None,
                plugins: BTreeSet::new(),
                initial_route: None,
                restoration_data: None,
            }),
        });
        info!(
            engine_id = engine.id,
            group_id = ?group_id,
            host_id = context.host_id(),
            "engine created"
        );
        Ok(engine)
    }

    fn lock_inner(&self) -> MutexGuard<'_, EngineInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Group this engine was spawned in, if any.
    #[must_use]
    pub fn group_id(&self) -> Option<u64> {
        self.group_id
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.lock_inner().destroyed
    }

    #[must_use]
    pub fn lifecycle(&self) -> AppLifecycle {
        self.lock_inner().lifecycle
    }

    /// Surface currently attached to this engine, if any.
    #[must_use]
    pub fn attached_surface(&self) -> Option<u64> {
        self.lock_inner().attached_surface
    }

    /// Window holding this engine's host control, if any.
    #[must_use]
    pub fn host_control(&self) -> Option<u64> {
        self.lock_inner().host_control
    }

    #[must_use]
    pub fn has_plugin(&self, name: &str) -> bool {
        self.lock_inner().plugins.contains(name)
    }

    #[must_use]
    pub fn plugin_count(&self) -> usize {
        self.lock_inner().plugins.len()
    }

    /// Register a plugin by name. Returns `false` if it was already
    /// registered (registration is idempotent).
    pub fn register_plugin(&self, name: &str) -> bool {
        let mut inner = self.lock_inner();
        if inner.destroyed {
            warn!(engine_id = self.id, plugin = name, "plugin registration on destroyed engine");
            return false;
        }
        let newly = inner.plugins.insert(name.to_string());
        if newly {
            debug!(engine_id = self.id, plugin = name, "plugin registered");
        }
        newly
    }

    /// Remove a plugin registration. Returns `false` if it was not present.
    pub fn unregister_plugin(&self, name: &str) -> bool {
        let mut inner = self.lock_inner();
        let removed = inner.plugins.remove(name);
        if removed {
            debug!(engine_id = self.id, plugin = name, "plugin unregistered");
        }
        removed
    }

    /// Register the stock plugin set. Returns how many were newly added.
    pub fn register_default_plugins(&self) -> usize {
        DEFAULT_PLUGINS
            .iter()
            .filter(|name| self.register_plugin(name))
            .count()
    }

    pub fn set_initial_route(&self, route: impl Into<String>) {
        self.lock_inner().initial_route = Some(route.into());
    }

    #[must_use]
    pub fn initial_route(&self) -> Option<String> {
        self.lock_inner().initial_route.clone()
    }

    /// Hand the engine opaque instance-state bytes from the host platform.
    pub fn set_restoration_data(&self, data: &[u8]) {
        self.lock_inner().restoration_data = Some(data.to_vec());
    }

    #[must_use]
    pub fn restoration_data(&self) -> Option<Vec<u8>> {
        self.lock_inner().restoration_data.clone()
    }

    /// Claim the engine's single surface slot.
    ///
    /// Re-attaching the surface that already holds the slot is a no-op;
    /// any other surface is rejected while the slot is held.
    pub fn attach_surface(&self, surface_id: u64) -> Result<(), AttachError> {
        let mut inner = self.lock_inner();
        if inner.destroyed {
            return Err(AttachError::EngineDestroyed { engine_id: self.id });
        }
        if let Some(attached) = inner.attached_surface {
            if attached == surface_id {
                return Ok(());
            }
            return Err(AttachError::SurfaceBusy {
                engine_id: self.id,
                attached,
                rejected: surface_id,
            });
        }
        inner.attached_surface = Some(surface_id);
        debug!(engine_id = self.id, surface_id, "surface attached to engine");
        Ok(())
    }

    /// Release the surface slot. A mismatched id is logged and ignored.
    pub fn detach_surface(&self, surface_id: u64) {
        let mut inner = self.lock_inner();
        match inner.attached_surface {
            Some(attached) if attached == surface_id => {
                inner.attached_surface = None;
                debug!(engine_id = self.id, surface_id, "surface detached from engine");
            }
            Some(attached) => {
                warn!(
                    engine_id = self.id,
                    attached, surface_id, "surface detach id mismatch; ignoring"
                );
            }
            None => {
                debug!(engine_id = self.id, surface_id, "surface detach with empty slot");
            }
        }
    }

    /// Claim the engine's host-control slot for a window.
    pub fn attach_host_control(&self, window_id: u64) -> Result<(), AttachError> {
        let mut inner = self.lock_inner();
        if inner.destroyed {
            return Err(AttachError::EngineDestroyed { engine_id: self.id });
        }
        if let Some(attached) = inner.host_control {
            if attached == window_id {
                return Ok(());
            }
            return Err(AttachError::HostControlBusy {
                engine_id: self.id,
                attached,
                rejected: window_id,
            });
        }
        inner.host_control = Some(window_id);
        debug!(engine_id = self.id, window_id, "host control attached");
        Ok(())
    }

    /// Release the host-control slot.
    pub fn detach_host_control(&self) {
        let mut inner = self.lock_inner();
        if inner.host_control.take().is_some() {
            debug!(engine_id = self.id, "host control detached");
        }
    }

    /// Host became visible but not yet focused.
    pub fn notify_started(&self) {
        self.set_lifecycle(AppLifecycle::Inactive, "started");
    }

    /// Host gained focus.
    pub fn notify_resumed(&self) {
        self.set_lifecycle(AppLifecycle::Resumed, "resumed");
    }

    /// Host lost focus but stays visible.
    pub fn notify_paused(&self) {
        self.set_lifecycle(AppLifecycle::Inactive, "paused");
    }

    /// Host is no longer visible.
    pub fn notify_stopped(&self) {
        self.set_lifecycle(AppLifecycle::Paused, "stopped");
    }

    fn set_lifecycle(&self, lifecycle: AppLifecycle, event: &str) {
        let mut inner = self.lock_inner();
        if inner.destroyed {
            warn!(engine_id = self.id, event, "lifecycle notification on destroyed engine");
            return;
        }
        inner.lifecycle = lifecycle;
        debug!(engine_id = self.id, lifecycle = ?lifecycle, event, "lifecycle updated");
    }

    /// Shut the engine down and release everything attached to it.
    ///
    /// Only the owner may call this, and at most once; a second destroy is
    /// a contract violation and returns an error.
    pub fn destroy(&self) -> Result<(), EngineError> {
        let mut inner = self.lock_inner();
        if inner.destroyed {
            return Err(EngineError::AlreadyDestroyed { engine_id: self.id });
        }
        inner.destroyed = true;
        inner.lifecycle = AppLifecycle::Detached;
        inner.attached_surface = None;
        inner.host_control = None;
        inner.plugins.clear();
        info!(engine_id = self.id, "engine destroyed");
        Ok(())
    }

    /// Snapshot of the engine state for reporting.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        let inner = self.lock_inner();
        EngineSnapshot {
            id: self.id,
            group_id: self.group_id,
            destroyed: inner.destroyed,
            lifecycle: inner.lifecycle,
            attached_surface: inner.attached_surface,
            host_control: inner.host_control,
            plugins: inner.plugins.iter().cloned().collect(),
        }
    }
}
