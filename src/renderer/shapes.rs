//! Shape generation for 2D primitives, and a canvas that tessellates into
//! triangle lists

use glam::Vec2;
use std::f32::consts::PI;

use super::canvas::Canvas;
use super::vertex::{Color, Vertex};

/// Segments used for circles and rings
pub const CIRCLE_SEGMENTS: u32 = 16;
/// Width of outlines and lines in pixels
pub const STROKE_WIDTH: f32 = 1.0;

fn on_circle(center: Vec2, radius: f32, theta: f32) -> Vec2 {
    center + Vec2::new(theta.cos(), theta.sin()) * radius
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: Color, segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;
        let a = on_circle(center, radius, theta1);
        let b = on_circle(center, radius, theta2);

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(a.x, a.y, color));
        vertices.push(Vertex::new(b.x, b.y, color));
    }

    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: Color,
    segments: u32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        let inner1 = on_circle(center, inner_radius, theta1);
        let outer1 = on_circle(center, outer_radius, theta1);
        let inner2 = on_circle(center, inner_radius, theta2);
        let outer2 = on_circle(center, outer_radius, theta2);

        quad(&mut vertices, [inner1, outer1, inner2, outer2], color);
    }

    vertices
}

/// Generate vertices for a line of the given width
pub fn line(from: Vec2, to: Vec2, width: f32, color: Color) -> Vec<Vertex> {
    let dir = (to - from).normalize_or_zero();
    let side = Vec2::new(-dir.y, dir.x) * (width * 0.5);
    let mut vertices = Vec::with_capacity(6);
    quad(
        &mut vertices,
        [from + side, from - side, to + side, to - side],
        color,
    );
    vertices
}

/// Axis-aligned square, used for single pixels
pub fn square(top_left: Vec2, size: f32, color: Color) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(6);
    quad(
        &mut vertices,
        [
            top_left,
            top_left + Vec2::new(0.0, size),
            top_left + Vec2::new(size, 0.0),
            top_left + Vec2::splat(size),
        ],
        color,
    );
    vertices
}

/// Two triangles over corners ordered `a1, b1, a2, b2`
fn quad(vertices: &mut Vec<Vertex>, [a1, b1, a2, b2]: [Vec2; 4], color: Color) {
    vertices.push(Vertex::new(a1.x, a1.y, color));
    vertices.push(Vertex::new(b1.x, b1.y, color));
    vertices.push(Vertex::new(a2.x, a2.y, color));

    vertices.push(Vertex::new(a2.x, a2.y, color));
    vertices.push(Vertex::new(b1.x, b1.y, color));
    vertices.push(Vertex::new(b2.x, b2.y, color));
}

/// Text left for an external glyph renderer
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub at: Vec2,
    pub text: String,
    pub color: Color,
}

/// Canvas that tessellates everything into one triangle list
#[derive(Debug, Clone, Default)]
pub struct VertexCanvas {
    pub clear_color: Option<Color>,
    pub vertices: Vec<Vertex>,
    pub text_runs: Vec<TextRun>,
}

impl VertexCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Vertex data ready for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

impl Canvas for VertexCanvas {
    fn clear(&mut self, color: Color) {
        self.clear_color = Some(color);
        self.vertices.clear();
        self.text_runs.clear();
    }

    fn pixel(&mut self, at: Vec2, color: Color) {
        self.vertices.extend(square(at, 1.0, color));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.vertices
            .extend(circle(center, radius, color, CIRCLE_SEGMENTS));
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let inner = (radius - STROKE_WIDTH * 0.5).max(0.0);
        let outer = radius + STROKE_WIDTH * 0.5;
        self.vertices
            .extend(ring(center, inner, outer, color, CIRCLE_SEGMENTS));
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color) {
        self.vertices.extend(line(from, to, STROKE_WIDTH, color));
    }

    fn text(&mut self, at: Vec2, text: &str, color: Color) {
        self.text_runs.push(TextRun {
            at,
            text: text.to_string(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::vertex::colors;

    #[test]
    fn test_circle_vertices_on_rim() {
        let center = Vec2::new(5.0, 5.0);
        let vertices = circle(center, 3.0, colors::PLAYER, 8);
        assert_eq!(vertices.len(), 24);
        for tri in vertices.chunks(3) {
            assert_eq!(tri[0].position, [5.0, 5.0]);
            let rim = Vec2::from(tri[1].position);
            assert!(((rim - center).length() - 3.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_ring_vertex_count() {
        assert_eq!(ring(Vec2::ZERO, 2.0, 3.0, colors::OUTLINE, 10).len(), 60);
    }

    #[test]
    fn test_line_has_width() {
        let vertices = line(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0, colors::OUTLINE);
        assert_eq!(vertices.len(), 6);
        let ys: Vec<f32> = vertices.iter().map(|v| v.position[1]).collect();
        assert!(ys.iter().all(|y| (y.abs() - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_vertex_canvas_collects_geometry_and_text() {
        let mut canvas = VertexCanvas::new();
        canvas.clear(colors::BACKGROUND);
        canvas.fill_circle(Vec2::new(10.0, 10.0), 4.0, colors::ENEMY);
        canvas.pixel(Vec2::new(1.0, 1.0), colors::GRID);
        canvas.text(Vec2::new(0.0, 0.0), "00:00", colors::TEXT);

        assert_eq!(canvas.clear_color, Some(colors::BACKGROUND));
        assert_eq!(canvas.triangle_count(), CIRCLE_SEGMENTS as usize + 2);
        assert_eq!(canvas.text_runs[0].text, "00:00");
        assert_eq!(
            canvas.as_bytes().len(),
            canvas.vertices.len() * std::mem::size_of::<Vertex>()
        );

        canvas.clear(colors::BACKGROUND);
        assert!(canvas.vertices.is_empty());
        assert!(canvas.text_runs.is_empty());
    }
}
