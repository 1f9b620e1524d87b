//! The rendering surface: the drawable object bound to one engine at a
//! time, displaying its output inside a host view container.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info, warn};

use crate::config::{RenderMode, TransparencyMode};
use crate::engine::Engine;
use crate::error::AttachError;
use crate::host::PlatformCapabilities;
use crate::splash::{self, SharedSplash};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Default)]
struct SurfaceInner {
    engine: Option<Weak<Engine>>,
    first_frame: bool,
    splash: Option<SharedSplash>,
}

/// A drawable surface for one engine's output.
#[derive(Debug)]
pub struct RenderSurface {
    id: u64,
    container_id: u64,
    render_mode: RenderMode,
    transparent: bool,
    inner: Mutex<SurfaceInner>,
}

impl RenderSurface {
    /// Build a surface for a view container.
    ///
    /// A transparency request is honored only when the platform supports
    /// transparent surfaces; otherwise the surface is opaque.
    #[must_use]
    pub fn new(
        render_mode: RenderMode,
        transparency: TransparencyMode,
        capabilities: &PlatformCapabilities,
        container_id: u64,
    ) -> Self {
        let transparent = match transparency {
            TransparencyMode::Opaque => false,
            TransparencyMode::Transparent => {
                if capabilities.transparent_surfaces {
                    true
                } else {
                    warn!(
                        container_id,
                        "platform lacks transparent surfaces; rendering opaque"
                    );
                    false
                }
            }
        };
        Self {
            id: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            container_id,
            render_mode,
            transparent,
            inner: Mutex::new(SurfaceInner::default()),
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, SurfaceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn container_id(&self) -> u64 {
        self.container_id
    }

    #[must_use]
    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Bind this surface to an engine. The engine's surface slot enforces
    /// exclusivity; a rejection leaves both sides untouched.
    pub fn attach_to_engine(&self, engine: &Arc<Engine>) -> Result<(), AttachError> {
        engine.attach_surface(self.id)?;
        self.lock_inner().engine = Some(Arc::downgrade(engine));
        info!(
            surface_id = self.id,
            engine_id = engine.id(),
            container_id = self.container_id,
            "surface bound to engine"
        );
        Ok(())
    }

    /// Release the engine binding. Idempotent.
    pub fn detach_from_engine(&self) {
        let (engine, splash) = {
            let mut inner = self.lock_inner();
            (inner.engine.take(), inner.splash.take())
        };
        if let Some(weak) = engine {
            if let Some(engine) = weak.upgrade() {
                engine.detach_surface(self.id);
            }
            info!(surface_id = self.id, "surface unbound from engine");
        }
        drop(splash);
    }

    /// Engine this surface is currently bound to, if it is still alive.
    #[must_use]
    pub fn attached_engine(&self) -> Option<Arc<Engine>> {
        self.lock_inner().engine.as_ref().and_then(Weak::upgrade)
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached_engine().is_some()
    }

    /// Install the splash overlay to dismiss on the first frame.
    pub fn install_splash(&self, controller: SharedSplash) {
        self.lock_inner().splash = Some(controller);
    }

    /// The engine produced its first frame on this surface.
    pub fn notify_first_frame(&self) {
        let splash = {
            let mut inner = self.lock_inner();
            if inner.first_frame {
                return;
            }
            inner.first_frame = true;
            inner.splash.take()
        };
        debug!(surface_id = self.id, "first frame rendered");
        if let Some(controller) = splash {
            splash::lock(&controller).dismiss();
        }
    }

    #[must_use]
    pub fn has_rendered_first_frame(&self) -> bool {
        self.lock_inner().first_frame
    }
}
