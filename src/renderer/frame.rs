//! Frame composition
//!
//! The camera follows the player: world positions are shifted so the player
//! sits at the center of the view. Screen y grows downward, same as world y.

use glam::Vec2;

use super::canvas::Canvas;
use super::vertex::{Color, colors};
use crate::config::ViewConfig;
use crate::consts::GRID_SPACING;
use crate::physics::BodyExt;
use crate::sim::{EntityId, EntityKind, Session, SessionClock, Team, format_mm_ss};

/// Width of one HUD glyph in pixels
const GLYPH_SIZE: f32 = 8.0;
/// Heading tick length relative to the body radius
const HEADING_TICK: f32 = 1.5;

/// What the renderer needs to know about one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderItem {
    pub id: EntityId,
    pub kind: EntityKind,
    pub team: Team,
    pub position: Vec2,
    pub radius: f32,
    pub forward: Vec2,
}

/// Snapshot every live entity in id order
pub fn collect_items(session: &Session) -> Vec<RenderItem> {
    let mut items = Vec::with_capacity(session.entity_count());
    session.for_each(|id, entity, body| {
        items.push(RenderItem {
            id,
            kind: entity.kind,
            team: entity.team,
            position: body.center(),
            radius: session.world().radius(entity.body).unwrap_or(0.0),
            forward: body.forward(),
        });
    });
    items
}

/// Fill color of an entity
pub fn item_color(kind: EntityKind, team: Team) -> Color {
    match (kind, team) {
        (EntityKind::Tank, Team::Player) => colors::PLAYER,
        (EntityKind::Tank, Team::Enemy) => colors::ENEMY,
        (EntityKind::Tank, Team::Ally) => colors::ALLY,
        _ => colors::OTHER,
    }
}

/// Player-centered view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World position shown at the center of the screen
    pub center: Vec2,
    pub size: Vec2,
}

impl Camera {
    pub fn new(center: Vec2, view: &ViewConfig) -> Self {
        Self {
            center,
            size: Vec2::new(view.width, view.height),
        }
    }

    /// World position of the screen's top-left corner
    pub fn origin(&self) -> Vec2 {
        self.center - self.size * 0.5
    }

    pub fn to_screen(&self, world: Vec2) -> Vec2 {
        world - self.origin()
    }

    pub fn contains(&self, screen: Vec2) -> bool {
        screen.x >= 0.0 && screen.y >= 0.0 && screen.x < self.size.x && screen.y < self.size.y
    }

    /// Where an off-screen point is marked: the intersection of the ray from
    /// the screen center toward it with the screen border. `None` if the
    /// point is visible.
    pub fn edge_marker(&self, screen: Vec2) -> Option<Vec2> {
        if self.contains(screen) {
            return None;
        }
        let half = self.size * 0.5;
        let dir = screen - half;
        let mut scale = 1.0f32;
        if dir.x.abs() > half.x {
            scale = scale.min(half.x / dir.x.abs());
        }
        if dir.y.abs() > half.y {
            scale = scale.min(half.y / dir.y.abs());
        }
        let edge = half + dir * scale;
        Some(edge.clamp(Vec2::ZERO, self.size - Vec2::ONE))
    }
}

/// Top-left corner of the first grid dot on each axis
pub fn grid_phase(camera: &Camera) -> (i32, i32) {
    let origin = camera.origin();
    let phase = |c: f32| (GRID_SPACING - c as i32).rem_euclid(GRID_SPACING);
    (phase(origin.x), phase(origin.y))
}

/// HUD text lines as (text, row from the bottom)
pub fn hud_lines(clock: &SessionClock, blink_ms: u32) -> Vec<(String, u32)> {
    if !clock.started {
        let visible = (clock.elapsed_ms / blink_ms.max(1)) & 1 == 0;
        return if visible {
            vec![("PRESS START".to_string(), 2)]
        } else {
            Vec::new()
        };
    }
    match clock.game_over_at_ms {
        Some(at) => vec![(format_mm_ss(at), 2), ("GAME OVER".to_string(), 1)],
        None => vec![(format_mm_ss(clock.elapsed_ms), 2)],
    }
}

fn draw_item(canvas: &mut dyn Canvas, camera: &Camera, item: &RenderItem, marker_radius: f32) {
    let color = item_color(item.kind, item.team);
    let at = camera.to_screen(item.position);

    if matches!(item.team, Team::Enemy | Team::Scrap) {
        if let Some(edge) = camera.edge_marker(at) {
            canvas.fill_circle(edge, marker_radius, color);
            canvas.stroke_circle(edge, marker_radius, colors::OUTLINE);
            return;
        }
    }

    canvas.fill_circle(at, item.radius, color);
    canvas.stroke_circle(at, item.radius, colors::OUTLINE);

    if item.kind == EntityKind::Tank && item.team != Team::Ally {
        let tip = at + item.forward * (HEADING_TICK * item.radius);
        canvas.line(at, tip, colors::OUTLINE);
    }
}

/// Draw one frame of the session
pub fn draw_frame(canvas: &mut dyn Canvas, session: &Session) {
    let view = &session.config().view;
    let center = session
        .player_body()
        .map_or(Vec2::ZERO, |body| body.center());
    let camera = Camera::new(center, view);

    canvas.clear(colors::BACKGROUND);

    let (x0, y0) = grid_phase(&camera);
    let mut y = y0;
    while (y as f32) < camera.size.y {
        let mut x = x0;
        while (x as f32) < camera.size.x {
            canvas.pixel(Vec2::new(x as f32, y as f32), colors::GRID);
            x += GRID_SPACING;
        }
        y += GRID_SPACING;
    }

    for item in collect_items(session) {
        draw_item(canvas, &camera, &item, view.marker_radius);
    }

    for (text, row) in hud_lines(session.clock(), view.blink_ms) {
        let at = Vec2::new(
            view.width * 0.5 - text.len() as f32 * GLYPH_SIZE * 0.5,
            view.height - row as f32 * GLYPH_SIZE,
        );
        canvas.text(at, &text, colors::TEXT);
    }
}
