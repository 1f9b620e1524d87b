//! Splash screen shown over the rendering surface until the first frame.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A host-supplied overlay displayed while the engine warms up.
pub trait SplashScreen: Send {
    /// Stable name for diagnostics.
    fn name(&self) -> &str;

    /// The overlay became visible.
    fn on_shown(&mut self) {}

    /// The overlay was removed.
    fn on_dismissed(&mut self) {}
}

/// Where the splash overlay is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplashState {
    Pending,
    Shown,
    Dismissed,
}

/// Drives a [`SplashScreen`] through `Pending → Shown → Dismissed`.
///
/// Owned by the delegate; shared with the surface so the first rendered
/// frame can dismiss the overlay.
pub struct SplashController {
    screen: Box<dyn SplashScreen>,
    state: SplashState,
}

/// Handle shared between the delegate and the rendering surface.
pub type SharedSplash = Arc<Mutex<SplashController>>;

/// Lock a shared splash controller, recovering from poisoning.
pub fn lock(controller: &SharedSplash) -> MutexGuard<'_, SplashController> {
    controller.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SplashController {
    #[must_use]
    pub fn new(screen: Box<dyn SplashScreen>) -> Self {
        Self {
            screen,
            state: SplashState::Pending,
        }
    }

    /// Wrap a screen in a shareable controller.
    #[must_use]
    pub fn shared(screen: Box<dyn SplashScreen>) -> SharedSplash {
        Arc::new(Mutex::new(Self::new(screen)))
    }

    /// Show the overlay. Only a pending overlay becomes visible.
    pub fn show(&mut self) {
        if self.state == SplashState::Pending {
            self.screen.on_shown();
            self.state = SplashState::Shown;
            debug!(splash = self.screen.name(), "splash shown");
        }
    }

    /// Remove the overlay. Idempotent; a never-shown overlay is skipped
    /// straight to dismissed without its visibility hooks firing.
    pub fn dismiss(&mut self) {
        match self.state {
            SplashState::Shown => {
                self.screen.on_dismissed();
                self.state = SplashState::Dismissed;
                debug!(splash = self.screen.name(), "splash dismissed");
            }
            SplashState::Pending => {
                self.state = SplashState::Dismissed;
            }
            SplashState::Dismissed => {}
        }
    }

    #[must_use]
    pub fn state(&self) -> SplashState {
        self.state
    }

    #[must_use]
    pub fn is_showing(&self) -> bool {
        self.state == SplashState::Shown
    }

    #[must_use]
    pub fn is_dismissed(&self) -> bool {
        self.state == SplashState::Dismissed
    }

    #[must_use]
    pub fn screen_name(&self) -> &str {
        self.screen.name()
    }
}

impl std::fmt::Debug for SplashController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplashController")
            .field("screen", &self.screen.name())
            .field("state", &self.state)
            .finish()
    }
}

/// Stock splash: a solid color fill.
#[derive(Debug, Clone, Copy)]
pub struct SolidColorSplash {
    color: u32,
}

impl SolidColorSplash {
    #[must_use]
    pub fn new(color: u32) -> Self {
        Self { color }
    }

    #[must_use]
    pub fn color(&self) -> u32 {
        self.color
    }
}

impl SplashScreen for SolidColorSplash {
    fn name(&self) -> &str {
        "solid_color"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSplash {
        shown: usize,
        dismissed: usize,
    }

    impl SplashScreen for CountingSplash {
        fn name(&self) -> &str {
            "counting"
        }

        fn on_shown(&mut self) {
            self.shown += 1;
        }

        fn on_dismissed(&mut self) {
            self.dismissed += 1;
        }
    }

    fn counting() -> SplashController {
        SplashController::new(Box::new(CountingSplash {
            shown: 0,
            dismissed: 0,
        }))
    }

    #[test]
    fn show_then_dismiss() {
        let mut controller = counting();
        assert_eq!(controller.state(), SplashState::Pending);
        controller.show();
        assert!(controller.is_showing());
        controller.dismiss();
        assert!(controller.is_dismissed());
    }

    #[test]
    fn show_is_idempotent() {
        let mut controller = counting();
        controller.show();
        controller.show();
        assert_eq!(controller.state(), SplashState::Shown);
    }

    #[test]
    fn dismiss_is_idempotent() {
        let mut controller = counting();
        controller.show();
        controller.dismiss();
        controller.dismiss();
        assert!(controller.is_dismissed());
    }

    #[test]
    fn dismissing_pending_overlay_skips_hooks() {
        let mut controller = counting();
        controller.dismiss();
        assert!(controller.is_dismissed());
        // A dismissed overlay can no longer be shown.
        controller.show();
        assert!(controller.is_dismissed());
    }

    #[test]
    fn solid_color_splash_reports_name_and_color() {
        let splash = SolidColorSplash::new(0x00FF_00FF);
        assert_eq!(splash.name(), "solid_color");
        assert_eq!(splash.color(), 0x00FF_00FF);
    }
}
