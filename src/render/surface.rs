//! The drawing capability the engine renders through.
//!
//! The engine never touches pixels itself. Everything it draws goes through a
//! [`Surface`], which a backend implements over its own canvas. All coordinates
//! are absolute surface pixels.

use crate::geometry::{Offset, Region};
use crate::reactive::{PropertyMap, PropertyType};
use crate::tree::WidgetId;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Whether drawing with this color would leave the surface untouched.
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }
}

/// Handle to an image owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(pub u32);

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Pixel-drawing primitives supplied by the rendering backend.
pub trait Surface {
    fn draw_rect(&mut self, rect: Region, color: Color);

    fn draw_rounded_rect(&mut self, rect: Region, radius: i32, color: Color);

    /// Draw `text` with its top-left corner at `origin`.
    fn draw_text(&mut self, origin: Offset, text: &str, color: Color);

    fn draw_image(&mut self, rect: Region, image: ImageId);

    /// Paint the background over `rect`, removing whatever was drawn there.
    fn clear_rect(&mut self, rect: Region);
}

// ---------------------------------------------------------------------------
// DrawContext
// ---------------------------------------------------------------------------

/// What a widget sees while drawing: its identity, its arranged bounds and a
/// read-only view of its properties.
pub struct DrawContext<'a> {
    pub id: WidgetId,
    pub bounds: Region,
    pub props: &'a PropertyMap,
}

impl<'a> DrawContext<'a> {
    /// Read a property, falling back to `default` when it was never set.
    pub fn prop_or<T: PropertyType>(&self, name: &str, default: T) -> Result<T> {
        self.props.value_or(name, default)
    }
}
