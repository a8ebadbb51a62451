//! Built-in widgets: Panel, StackPanel, DockPanel, Block.

pub mod block;
pub mod containers;

pub use block::Block;
pub use containers::{DockPanel, Panel, StackPanel};
