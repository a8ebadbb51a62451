//! Layout: two-pass measure/arrange over the widget tree.
//!
//! [`measure`] computes each widget's desired size bottom-up against the space
//! its parent could offer; [`arrange`] then assigns final bounds top-down,
//! resolving alignment, margin and padding at every container boundary.

pub mod align;
pub mod engine;

pub use align::{HorizontalAlignment, Orientation, VerticalAlignment};
pub use engine::{arrange, measure, LayoutEngine};
