//! Platform integration plugin.
//!
//! Bridges host-OS affordances (system chrome, back navigation) to the
//! engine. It exists only while a rendering surface is attached and is
//! always bound to a (engine, window) pair.

use std::sync::{Arc, Weak};

use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::AttachError;
use crate::host::HostWindow;

/// Name the plugin registers under on the engine.
pub const PLATFORM_PLUGIN_NAME: &str = "platform";

/// Bridge between the host window and the engine.
#[derive(Debug)]
pub struct PlatformPlugin {
    engine: Weak<Engine>,
    engine_id: u64,
    window_id: u64,
    attached: bool,
}

impl PlatformPlugin {
    /// Bind the plugin to an engine and a host window.
    pub fn attach(engine: &Arc<Engine>, window: &Arc<HostWindow>) -> Result<Self, AttachError> {
        if engine.is_destroyed() {
            return Err(AttachError::EngineDestroyed {
                engine_id: engine.id(),
            });
        }
        engine.register_plugin(PLATFORM_PLUGIN_NAME);
        info!(
            engine_id = engine.id(),
            window_id = window.id(),
            "platform plugin attached"
        );
        Ok(Self {
            engine: Arc::downgrade(engine),
            engine_id: engine.id(),
            window_id: window.id(),
            attached: true,
        })
    }

    /// Release the binding. Idempotent.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        if let Some(engine) = self.engine.upgrade() {
            engine.unregister_plugin(PLATFORM_PLUGIN_NAME);
        }
        debug!(
            engine_id = self.engine_id,
            window_id = self.window_id,
            "platform plugin detached"
        );
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    #[must_use]
    pub fn engine_id(&self) -> u64 {
        self.engine_id
    }

    #[must_use]
    pub fn window_id(&self) -> u64 {
        self.window_id
    }

    /// Whether back-navigation events can currently be forwarded.
    #[must_use]
    pub fn handles_back_navigation(&self) -> bool {
        self.attached
            && self
                .engine
                .upgrade()
                .is_some_and(|engine| !engine.is_destroyed())
    }
}

impl Drop for PlatformPlugin {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostContext;

    fn engine() -> Arc<Engine> {
        Engine::create(&HostContext::default()).unwrap()
    }

    #[test]
    fn attach_registers_on_engine() {
        let engine = engine();
        let window = Arc::new(HostWindow::new());
        let plugin = PlatformPlugin::attach(&engine, &window).unwrap();

        assert!(plugin.is_attached());
        assert_eq!(plugin.engine_id(), engine.id());
        assert_eq!(plugin.window_id(), window.id());
        assert!(engine.has_plugin(PLATFORM_PLUGIN_NAME));
        assert!(plugin.handles_back_navigation());
    }

    #[test]
    fn detach_unregisters_and_is_idempotent() {
        let engine = engine();
        let window = Arc::new(HostWindow::new());
        let mut plugin = PlatformPlugin::attach(&engine, &window).unwrap();

        plugin.detach();
        assert!(!plugin.is_attached());
        assert!(!engine.has_plugin(PLATFORM_PLUGIN_NAME));
        plugin.detach();
    }

    #[test]
    fn attach_fails_on_destroyed_engine() {
        let engine = engine();
        engine.destroy().unwrap();
        let window = Arc::new(HostWindow::new());
        assert!(matches!(
            PlatformPlugin::attach(&engine, &window),
            Err(AttachError::EngineDestroyed { .. })
        ));
    }

    #[test]
    fn drop_detaches() {
        let engine = engine();
        let window = Arc::new(HostWindow::new());
        {
            let _plugin = PlatformPlugin::attach(&engine, &window).unwrap();
            assert!(engine.has_plugin(PLATFORM_PLUGIN_NAME));
        }
        assert!(!engine.has_plugin(PLATFORM_PLUGIN_NAME));
    }

    #[test]
    fn back_navigation_stops_after_engine_destroy() {
        let engine = engine();
        let window = Arc::new(HostWindow::new());
        let plugin = PlatformPlugin::attach(&engine, &window).unwrap();
        engine.destroy().unwrap();
        assert!(!plugin.handles_back_navigation());
    }
}
