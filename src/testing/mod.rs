//! Headless testing framework: Pilot, scripted input, recorded drawing.
//!
//! Use the [`Pilot`] to drive an [`App`](crate::app::App) frame by frame
//! without a terminal. [`RecordingSurface`] and [`render_log`] turn what was
//! drawn into plain text for snapshot-style assertions.

pub mod device;
pub mod pilot;
pub mod surface;

pub use device::ScriptedDevice;
pub use pilot::Pilot;
pub use surface::{render_log, DrawCommand, RecordingSurface};
