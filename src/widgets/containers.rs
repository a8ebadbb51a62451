//! Container widgets: Panel, StackPanel, DockPanel.
//!
//! None of them draw anything beyond the default background. Their behavior is
//! entirely the [`Container`] shape they report to the layout engine.

use std::any::Any;

use crate::layout::Orientation;
use crate::tree::WidgetNode;
use crate::widget::{props, Container, Widget};

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

/// Holds at most one child, set through the `Content` property.
#[derive(Debug, Default)]
pub struct Panel;

impl Panel {
    pub fn new() -> Self {
        Self
    }
}

impl Widget for Panel {
    fn widget_type(&self) -> &str {
        "Panel"
    }

    fn container(&self) -> Container {
        Container::Single
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// StackPanel
// ---------------------------------------------------------------------------

/// Places children one after another along its `Orientation` (vertical by default).
#[derive(Debug, Default)]
pub struct StackPanel;

impl StackPanel {
    pub fn new() -> Self {
        Self
    }

    /// A node for a left-to-right stack.
    pub fn horizontal() -> WidgetNode {
        WidgetNode::new(Self).with(props::ORIENTATION, Orientation::Horizontal)
    }

    /// A node for a top-to-bottom stack.
    pub fn vertical() -> WidgetNode {
        WidgetNode::new(Self).with(props::ORIENTATION, Orientation::Vertical)
    }
}

impl Widget for StackPanel {
    fn widget_type(&self) -> &str {
        "StackPanel"
    }

    fn container(&self) -> Container {
        Container::Stack
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// DockPanel
// ---------------------------------------------------------------------------

/// Layers children over the same area; each child's alignment docks it to an
/// edge, a corner, the center, or the whole area.
#[derive(Debug, Default)]
pub struct DockPanel;

impl DockPanel {
    pub fn new() -> Self {
        Self
    }
}

impl Widget for DockPanel {
    fn widget_type(&self) -> &str {
        "DockPanel"
    }

    fn container(&self) -> Container {
        Container::Overlay
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
