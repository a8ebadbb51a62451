//! App struct: frame loop over a [`Screen`], a [`Device`] and a [`Surface`].
//!
//! [`App::tick`] runs one frame synchronously, which is what tests drive.
//! [`App::run`] repeats it at the configured frame rate until a handler asks
//! the screen to quit.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::Result;
use crate::geometry::Size;
use crate::input::{Device, KeyEdge};
use crate::render::Surface;
use crate::screen::{Screen, DEFAULT_DOUBLE_CLICK};

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Target frames per second for the frame loop.
    pub fps: u32,
    /// Longest gap between two releases that still counts as a double click.
    pub double_click: Duration,
    /// Initial viewport size.
    pub viewport: Size,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            double_click: DEFAULT_DOUBLE_CLICK,
            viewport: Size::new(800, 600),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target FPS (builder).
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_double_click(mut self, window: Duration) -> Self {
        self.double_click = window;
        self
    }

    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    /// Time budget of one frame. A zero FPS is treated as one.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// What one [`App::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Input handlers invoked.
    pub handlers: usize,
    /// Widgets whose bounds changed during layout.
    pub moved: usize,
    /// Widgets drawn by the scheduler.
    pub drawn: usize,
    /// Key edges read from the device.
    pub key_edges: usize,
}

impl TickReport {
    /// Nothing happened this frame.
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The main application struct.
#[derive(Debug)]
pub struct App {
    /// Widget tree plus the engines that act on it.
    pub screen: Screen,
    pub config: AppConfig,
    ticks: u64,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            screen: Screen::with_double_click(config.viewport, config.double_click),
            config,
            ticks: 0,
        }
    }

    /// Frames run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one frame: poll input, dispatch it, lay out, then draw the
    /// scheduled widgets.
    pub fn tick(&mut self, device: &mut dyn Device, surface: &mut dyn Surface, now: Instant) -> Result<TickReport> {
        device.poll()?;
        if let Some(size) = device.take_resize() {
            self.screen.resize(size);
        }
        let pointer = device.pointer();
        let edges: Vec<KeyEdge> = std::iter::from_fn(|| device.next_key_edge()).collect();

        let handlers = self.screen.dispatch_input(&pointer, &edges, now)?;
        let moved = self.screen.layout()?;
        let drawn = self.screen.render(surface)?;
        self.ticks += 1;

        let report = TickReport {
            handlers,
            moved,
            drawn,
            key_edges: edges.len(),
        };
        if !report.is_idle() {
            debug!(tick = self.ticks, ?report, "frame");
        }
        Ok(report)
    }

    /// Run frames until [`Screen::request_quit`] is called, sleeping out the
    /// remainder of each frame. Returns the number of frames run.
    pub async fn run(&mut self, device: &mut dyn Device, surface: &mut dyn Surface) -> Result<u64> {
        let frame = self.config.frame_duration();
        info!(fps = self.config.fps, "frame loop started");
        let first = self.ticks;
        while !self.screen.quit_requested() {
            let started = tokio::time::Instant::now();
            self.tick(device, surface, started.into_std())?;
            if self.screen.quit_requested() {
                break;
            }
            let left = remaining_frame(started.into_std(), Instant::now(), frame);
            if !left.is_zero() {
                tokio::time::sleep(left).await;
            }
        }
        let ran = self.ticks - first;
        info!(frames = ran, "frame loop stopped");
        Ok(ran)
    }
}

/// Time left in a frame that began at `started`, or zero when it overran.
pub fn remaining_frame(started: Instant, now: Instant, frame: Duration) -> Duration {
    frame.saturating_sub(now.saturating_duration_since(started))
}

// ===========================================================================
// Tests
// ===========================================================================
