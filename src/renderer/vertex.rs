//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// RGBA color, components in 0..=1
pub type Color = [f32; 4];

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: Color,
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: Color) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }
}

/// Opaque color from a `0xRRGGBB` value
pub const fn rgb(hex: u32) -> Color {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Colors for game elements
pub mod colors {
    use super::{Color, rgb};

    pub const BACKGROUND: Color = rgb(0xcccccc);
    pub const GRID: Color = rgb(0x777777);
    pub const OUTLINE: Color = rgb(0x000000);
    pub const TEXT: Color = rgb(0x000000);
    pub const PLAYER: Color = rgb(0x5555cc);
    pub const ENEMY: Color = rgb(0xcc5555);
    pub const ALLY: Color = rgb(0x55cc55);
    /// Bullets, scrap and anything else
    pub const OTHER: Color = rgb(0x555555);
}
