//! Drawing surface abstraction
//!
//! Coordinates are screen pixels, origin top-left, y down.

use glam::Vec2;

use super::vertex::Color;

/// The primitives the game draws with
pub trait Canvas {
    fn clear(&mut self, color: Color);
    fn pixel(&mut self, at: Vec2, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color);
    fn line(&mut self, from: Vec2, to: Vec2, color: Color);
    /// 8x8 monospace text, `at` is the top-left corner of the first glyph
    fn text(&mut self, at: Vec2, text: &str, color: Color);
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Pixel(Vec2, Color),
    FillCircle { center: Vec2, radius: f32, color: Color },
    StrokeCircle { center: Vec2, radius: f32, color: Color },
    Line { from: Vec2, to: Vec2, color: Color },
    Text { at: Vec2, text: String, color: Color },
}

/// Canvas that records commands instead of drawing
#[derive(Debug, Clone, Default)]
pub struct CommandList {
    pub commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn filled_circles(&self) -> impl Iterator<Item = (Vec2, f32, Color)> + '_ {
        self.commands.iter().filter_map(|c| match *c {
            DrawCommand::FillCircle {
                center,
                radius,
                color,
            } => Some((center, radius, color)),
            _ => None,
        })
    }
}

impl Canvas for CommandList {
    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn pixel(&mut self, at: Vec2, color: Color) {
        self.commands.push(DrawCommand::Pixel(at, color));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::FillCircle {
            center,
            radius,
            color,
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::StrokeCircle {
            center,
            radius,
            color,
        });
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn text(&mut self, at: Vec2, text: &str, color: Color) {
        self.commands.push(DrawCommand::Text {
            at,
            text: text.to_string(),
            color,
        });
    }
}
