//! The widget capability trait.
//!
//! Layout shape is a closed set ([`Container`]); everything else a widget can
//! customize is a method on [`Widget`] with a sensible default, so a plain
//! colored box only has to name itself.

use std::any::Any;

use super::props;
use crate::error::Result;
use crate::geometry::{Offset, Region, Size};
use crate::reactive::PropertyMap;
use crate::render::{Color, DrawContext, Surface};
use crate::screen::Screen;
use crate::tree::WidgetId;

/// How a widget lays out its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Container {
    /// No content; measured from its natural size.
    #[default]
    Leaf,
    /// Exactly one optional child, set through the `Content` property.
    Single,
    /// Children placed one after another along the `Orientation` axis.
    Stack,
    /// Children placed on top of each other, each aligned within the whole area.
    Overlay,
}

impl Container {
    /// Whether `add_content` applies.
    pub fn is_multi(self) -> bool {
        matches!(self, Container::Stack | Container::Overlay)
    }
}

/// Behavior of one widget.
///
/// Widgets are stored boxed in the tree. Hooks receive the [`Screen`] so they
/// can read and write properties, register input and move focus; while a hook
/// runs the widget is temporarily taken out of the tree, so it is skipped by any
/// nested draw or hook call aimed at itself.
pub trait Widget: Any {
    /// Type name used in diagnostics and cast errors.
    fn widget_type(&self) -> &str;

    fn container(&self) -> Container {
        Container::Leaf
    }

    /// Whether focus traversal may land on this widget.
    fn can_focus(&self) -> bool {
        false
    }

    /// Intrinsic content size of a leaf, excluding padding.
    ///
    /// Axes with a non-zero declared `Size` ignore this.
    fn natural_size(&self, _props: &PropertyMap) -> Result<Size> {
        Ok(Size::ZERO)
    }

    /// Draw at `ctx.bounds`. Children are drawn afterwards by the scheduler.
    ///
    /// The default fills the background color, rounded when `CornerRadius` is set.
    fn draw(&self, ctx: &DrawContext<'_>, surface: &mut dyn Surface) -> Result<()> {
        let color = ctx.prop_or(props::BACKGROUND_COLOR, Color::TRANSPARENT)?;
        if color.is_transparent() {
            return Ok(());
        }
        match ctx.prop_or(props::CORNER_RADIUS, 0i32)? {
            0 => surface.draw_rect(ctx.bounds, color),
            radius => surface.draw_rounded_rect(ctx.bounds, radius, color),
        }
        Ok(())
    }

    /// Whether `point` hits this widget when arranged at `bounds`.
    fn hit_test(&self, bounds: Region, point: Offset) -> bool {
        bounds.contains(point)
    }

    /// Called after the widget is placed under a parent.
    fn on_attach(&mut self, _id: WidgetId, _screen: &mut Screen) -> Result<()> {
        Ok(())
    }

    /// Called before the widget leaves its parent.
    fn on_detach(&mut self, _id: WidgetId, _screen: &mut Screen) -> Result<()> {
        Ok(())
    }

    fn on_focus(&mut self, _id: WidgetId, _screen: &mut Screen) -> Result<()> {
        Ok(())
    }

    fn on_unfocus(&mut self, _id: WidgetId, _screen: &mut Screen) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DrawCommand, RecordingSurface};

    struct Plain;

    impl Widget for Plain {
        fn widget_type(&self) -> &str {
            "Plain"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn draw_with(props: &PropertyMap) -> Vec<DrawCommand> {
        let mut surface = RecordingSurface::new();
        let ctx = DrawContext {
            id: WidgetId::default(),
            bounds: Region::new(1, 2, 3, 4),
            props,
        };
        Plain.draw(&ctx, &mut surface).unwrap();
        surface.take()
    }

    #[test]
    fn defaults() {
        let w = Plain;
        assert_eq!(w.container(), Container::Leaf);
        assert!(!w.can_focus());
        assert_eq!(w.natural_size(&PropertyMap::new("Plain")).unwrap(), Size::ZERO);
        assert!(w.hit_test(Region::new(0, 0, 5, 5), Offset::new(4, 4)));
        assert!(!w.hit_test(Region::new(0, 0, 5, 5), Offset::new(5, 4)));
    }

    #[test]
    fn default_draw_skips_transparent_background() {
        assert!(draw_with(&PropertyMap::new("Plain")).is_empty());
    }

    #[test]
    fn default_draw_fills_background() {
        let mut props = PropertyMap::new("Plain");
        props.insert_initial(props::BACKGROUND_COLOR, Color::WHITE);
        assert_eq!(
            draw_with(&props),
            vec![DrawCommand::Rect { rect: Region::new(1, 2, 3, 4), color: Color::WHITE }]
        );

        props.insert_initial(props::CORNER_RADIUS, 2i32);
        assert_eq!(
            draw_with(&props),
            vec![DrawCommand::RoundedRect {
                rect: Region::new(1, 2, 3, 4),
                radius: 2,
                color: Color::WHITE,
            }]
        );
    }

    #[test]
    fn container_multi() {
        assert!(Container::Stack.is_multi());
        assert!(Container::Overlay.is_multi());
        assert!(!Container::Single.is_multi());
        assert!(!Container::Leaf.is_multi());
    }
}
