//! Pilot: programmatic interaction with a headless App.
//!
//! The `Pilot` owns an [`App`] together with a [`ScriptedDevice`], a
//! [`RecordingSurface`] and a virtual clock, so a test can queue input, run a
//! frame and inspect what was drawn without any terminal or wall-clock time.

use std::time::{Duration, Instant};

use super::device::ScriptedDevice;
use super::surface::{render_log, DrawCommand, RecordingSurface};
use crate::app::{App, AppConfig, TickReport};
use crate::error::Result;
use crate::geometry::Size;
use crate::input::Key;
use crate::screen::Screen;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless app driver for testing.
///
/// # Examples
///
/// ```ignore
/// use tessera::testing::Pilot;
///
/// let mut pilot = Pilot::new(100, 100);
/// pilot.click(10, 10).unwrap();
/// assert!(pilot.is_running());
/// ```
pub struct Pilot {
    app: App,
    device: ScriptedDevice,
    surface: RecordingSurface,
    now: Instant,
}

impl Pilot {
    /// Create a headless app with the given viewport.
    pub fn new(width: i32, height: i32) -> Self {
        Self::with_config(AppConfig::new().with_viewport(Size::new(width, height)))
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            app: App::new(config),
            device: ScriptedDevice::new(),
            surface: RecordingSurface::new(),
            now: Instant::now(),
        }
    }

    // ── Input simulation ─────────────────────────────────────────────

    /// Press and release the left button at `(x, y)`, then run a frame.
    pub fn click(&mut self, x: i32, y: i32) -> Result<TickReport> {
        self.device.click(x, y);
        self.tick()
    }

    /// Move the pointer to `(x, y)`, then run a frame.
    pub fn hover(&mut self, x: i32, y: i32) -> Result<TickReport> {
        self.device.move_to(x, y);
        self.tick()
    }

    /// Tap `key`, then run a frame.
    pub fn press_key(&mut self, key: Key) -> Result<TickReport> {
        self.device.tap(key);
        self.tick()
    }

    /// Tap every character of `text` within a single frame.
    pub fn type_text(&mut self, text: &str) -> Result<TickReport> {
        self.device.type_text(text);
        self.tick()
    }

    /// Change the viewport, then run a frame.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<TickReport> {
        self.device.resize(Size::new(width, height));
        self.tick()
    }

    // ── Processing ───────────────────────────────────────────────────

    /// Run one frame at the current virtual time.
    pub fn tick(&mut self) -> Result<TickReport> {
        self.app.tick(&mut self.device, &mut self.surface, self.now)
    }

    /// Move the virtual clock forward without running a frame.
    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    // ── Query ────────────────────────────────────────────────────────

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn screen(&self) -> &Screen {
        &self.app.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.app.screen
    }

    /// Queue input for the next frame without running it.
    pub fn device_mut(&mut self) -> &mut ScriptedDevice {
        &mut self.device
    }

    /// Whether no handler has asked the app to quit.
    pub fn is_running(&self) -> bool {
        !self.app.screen.quit_requested()
    }

    // ── Draw log ─────────────────────────────────────────────────────

    /// Draw calls recorded since the last call, which are then forgotten.
    pub fn take_draws(&mut self) -> Vec<DrawCommand> {
        self.surface.take()
    }

    /// [`take_draws`](Self::take_draws) rendered one command per line.
    pub fn draw_log(&mut self) -> String {
        render_log(&self.take_draws())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
