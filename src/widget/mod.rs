//! Widget system: the capability trait, layout shapes and well-known property names.

pub mod props;
pub mod traits;

pub use traits::{Container, Widget};
