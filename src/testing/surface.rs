//! A surface that records draw calls instead of painting.

use std::fmt;

use crate::geometry::{Offset, Region};
use crate::render::{Color, ImageId, Surface};

/// One recorded [`Surface`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    Rect { rect: Region, color: Color },
    RoundedRect { rect: Region, radius: i32, color: Color },
    Text { origin: Offset, text: String, color: Color },
    Image { rect: Region, image: ImageId },
    Clear { rect: Region },
}

struct Hex(Color);

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Color { r, g, b, a } = self.0;
        if a == 255 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

struct Rect(Region);

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        write!(f, "{},{} {}x{}", r.x, r.y, r.width, r.height)
    }
}

impl fmt::Display for DrawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawCommand::Rect { rect, color } => write!(f, "rect {} {}", Rect(*rect), Hex(*color)),
            DrawCommand::RoundedRect { rect, radius, color } => {
                write!(f, "rounded {} r{radius} {}", Rect(*rect), Hex(*color))
            }
            DrawCommand::Text { origin, text, color } => {
                write!(f, "text {},{} {text:?} {}", origin.x, origin.y, Hex(*color))
            }
            DrawCommand::Image { rect, image } => write!(f, "image {} #{}", Rect(*rect), image.0),
            DrawCommand::Clear { rect } => write!(f, "clear {}", Rect(*rect)),
        }
    }
}

/// One command per line, in call order.
pub fn render_log(commands: &[DrawCommand]) -> String {
    commands.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

/// Headless [`Surface`] that keeps every call for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Hand back everything recorded so far and start over.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// [`render_log`] of the recorded commands, which are then cleared.
    pub fn take_log(&mut self) -> String {
        render_log(&self.take())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Surface for RecordingSurface {
    fn draw_rect(&mut self, rect: Region, color: Color) {
        self.commands.push(DrawCommand::Rect { rect, color });
    }

    fn draw_rounded_rect(&mut self, rect: Region, radius: i32, color: Color) {
        self.commands.push(DrawCommand::RoundedRect { rect, radius, color });
    }

    fn draw_text(&mut self, origin: Offset, text: &str, color: Color) {
        self.commands.push(DrawCommand::Text { origin, text: text.to_owned(), color });
    }

    fn draw_image(&mut self, rect: Region, image: ImageId) {
        self.commands.push(DrawCommand::Image { rect, image });
    }

    fn clear_rect(&mut self, rect: Region) {
        self.commands.push(DrawCommand::Clear { rect });
    }
}
