//! Rendering: the surface abstraction and the z-ordered redraw scheduler.

pub mod scheduler;
pub mod surface;

pub use scheduler::RenderScheduler;
pub use surface::{Color, DrawContext, ImageId, Surface};
