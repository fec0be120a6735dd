//! Point queries through rapier's query pipeline

use glam::Vec2;
use rapier2d::prelude::*;

use super::body::to_vec2;
use super::{BodyHandle, BodyKey, PhysicsWorld};

/// Which team categories a query may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFilter {
    pub mask: u32,
}

impl QueryFilter {
    pub const fn categories(mask: u32) -> Self {
        Self { mask }
    }

    fn groups(self) -> InteractionGroups {
        InteractionGroups::new(Group::ALL, Group::from_bits_truncate(self.mask))
    }
}

/// One shape found by a point query
#[derive(Debug, Clone, Copy)]
pub struct PointQueryInfo<K> {
    pub handle: BodyHandle,
    pub key: K,
    /// Closest point on the shape surface
    pub point: Vec2,
    /// Signed distance to the surface (negative inside the shape)
    pub distance: f32,
    /// Unit vector from the shape center toward the query point
    pub gradient: Vec2,
}

impl<K: BodyKey> PhysicsWorld<K> {
    /// Bring the query pipeline up to date with spawns, removals and moves
    /// made since the last step
    pub fn update_queries(&mut self) {
        for (_, body) in self.bodies.iter() {
            for &handle in body.colliders() {
                if let Some(collider) = self.colliders.get_mut(handle) {
                    collider.set_position(*body.position());
                }
            }
        }
        self.query_pipeline.update(&self.colliders);
    }

    /// Every shape whose surface lies within `max_distance` of `point`,
    /// ordered by key
    pub fn point_query(
        &self,
        point: Vec2,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Vec<PointQueryInfo<K>> {
        let reach = Ball::new(max_distance.max(f32::EPSILON));
        let at = Isometry::translation(point.x, point.y);
        let query = rapier2d::pipeline::QueryFilter::default().groups(filter.groups());

        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.bodies,
            &self.colliders,
            &at,
            &reach,
            query,
            |collider| {
                if let Some(hit) = self.describe_hit(collider, point) {
                    hits.push(hit);
                }
                true
            },
        );
        hits.sort_by_key(|hit| hit.key);
        hits
    }

    /// The closest shape within `max_distance` of `point`, if any
    pub fn point_query_nearest(
        &self,
        point: Vec2,
        max_distance: f32,
        filter: QueryFilter,
    ) -> Option<PointQueryInfo<K>> {
        self.point_query(point, max_distance, filter)
            .into_iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn describe_hit(&self, handle: ColliderHandle, point: Vec2) -> Option<PointQueryInfo<K>> {
        let collider = self.colliders.get(handle)?;
        let body = collider.parent()?;
        let radius = collider.shape().as_ball()?.radius;
        let center = to_vec2(collider.translation());

        let delta = point - center;
        let len = delta.length();
        let gradient = if len > f32::EPSILON { delta / len } else { Vec2::X };
        Some(PointQueryInfo {
            handle: body,
            key: self.key(body)?,
            point: center + gradient * radius,
            distance: len - radius,
            gradient,
        })
    }
}
