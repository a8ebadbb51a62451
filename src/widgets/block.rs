//! Block: a plain leaf with a declared size.

use std::any::Any;

use crate::widget::Widget;

/// A leaf that draws its background over its bounds.
///
/// Blocks have no natural size; give them one through the `Size` property or an
/// alignment of `Stretch`. Focusable blocks take part in focus traversal.
#[derive(Debug, Default)]
pub struct Block {
    focusable: bool,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// A block that can receive focus.
    pub fn focusable() -> Self {
        Self { focusable: true }
    }
}

impl Widget for Block {
    fn widget_type(&self) -> &str {
        "Block"
    }

    fn can_focus(&self) -> bool {
        self.focusable
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Container;

    #[test]
    fn block_is_a_leaf() {
        assert_eq!(Block::new().container(), Container::Leaf);
        assert!(!Block::new().can_focus());
        assert!(Block::focusable().can_focus());
    }
}
