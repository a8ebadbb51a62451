//! Node types: WidgetId, WidgetNode.

use std::fmt;

use slotmap::new_key_type;

use crate::error::Result;
use crate::geometry::{Region, Size};
use crate::reactive::{BindingId, ChangeChannel, PropertyMap, PropertyType, Value};
use crate::widget::{props, Container, Widget};

new_key_type! {
    /// Handle to a widget in the arena. Copy, lightweight, never owning.
    pub struct WidgetId;
}

/// Everything the engine keeps for one widget.
pub struct WidgetNode {
    /// Taken out while one of the widget's own hooks runs.
    pub(crate) widget: Option<Box<dyn Widget>>,
    pub(crate) container: Container,
    pub(crate) props: PropertyMap,
    pub(crate) channel: ChangeChannel,
    /// Bindings in which this widget is the source or the target.
    pub(crate) bindings: Vec<BindingId>,
    /// Result of the last measure pass, margin excluded.
    pub(crate) desired: Size,
    /// Result of the last arrange pass, in surface pixels.
    pub(crate) bounds: Region,
    /// Where the widget was drawn last. Erased before the next draw.
    pub(crate) last_drawn: Option<Region>,
    pub(crate) dirty: bool,
    pub(crate) needs_layout: bool,
}

impl WidgetNode {
    pub fn new(widget: impl Widget + 'static) -> Self {
        Self::from_boxed(Box::new(widget))
    }

    pub fn from_boxed(widget: Box<dyn Widget>) -> Self {
        let props = PropertyMap::new(widget.widget_type());
        let container = widget.container();
        Self {
            widget: Some(widget),
            container,
            props,
            channel: ChangeChannel::new(),
            bindings: Vec::new(),
            desired: Size::ZERO,
            bounds: Region::EMPTY,
            last_drawn: None,
            dirty: false,
            needs_layout: true,
        }
    }

    /// Seed a property value (builder). No notification, no dirtiness.
    pub fn with<T: PropertyType>(mut self, name: &str, value: T) -> Self {
        self.props.insert_initial(name, value);
        self
    }

    pub fn widget_type(&self) -> &str {
        self.props.owner()
    }

    pub fn container(&self) -> Container {
        self.container
    }

    pub fn props(&self) -> &PropertyMap {
        &self.props
    }

    pub fn desired_size(&self) -> Size {
        self.desired
    }

    pub fn bounds(&self) -> Region {
        self.bounds
    }

    pub fn last_drawn(&self) -> Option<Region> {
        self.last_drawn
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    /// Borrow the widget as a concrete type.
    pub fn widget<W: Widget>(&self) -> Option<&W> {
        self.widget.as_deref().and_then(|w| w.as_any().downcast_ref::<W>())
    }

    pub fn widget_mut<W: Widget>(&mut self) -> Option<&mut W> {
        self.widget.as_deref_mut().and_then(|w| w.as_any_mut().downcast_mut::<W>())
    }

    pub fn is_visible(&self) -> Result<bool> {
        self.props.value_or(props::IS_VISIBLE, true)
    }

    pub fn z_index(&self) -> Result<i32> {
        self.props.value_or(props::Z_INDEX, 0)
    }

    /// Single content child as recorded in the `Content` property.
    pub(crate) fn content(&self) -> Option<WidgetId> {
        self.props.raw(props::CONTENT).and_then(Value::as_widget)
    }
}

impl fmt::Debug for WidgetNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetNode")
            .field("widget_type", &self.widget_type())
            .field("container", &self.container)
            .field("bounds", &self.bounds)
            .field("dirty", &self.dirty)
            .finish()
    }
}
