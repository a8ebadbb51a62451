//! Widget arena: slotmap-backed composition tree with parent back-references.

pub mod node;
pub mod arena;

pub use node::{WidgetId, WidgetNode};
pub use arena::WidgetTree;
