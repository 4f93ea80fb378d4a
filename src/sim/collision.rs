//! Proximity tests between the player and road entities
//!
//! Everything here works in the ground plane: `x` is the lateral offset and
//! `y` the forward distance. Heights are cosmetic and never collide.
//! All tests are strict, so touching exactly at the boundary is a miss.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::EntityKind;

/// Collision geometry used for both obstacle hits and collectible pickups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum CollisionShape {
    /// Hit when the centre distance is below `radius`
    Radius { radius: f32 },
    /// Hit when axis-aligned boxes overlap, tested only for entities whose
    /// forward distance is within `window` of the player
    Boxes {
        player: Vec2,
        obstacle: Vec2,
        collectible: Vec2,
        window: f32,
    },
}

impl CollisionShape {
    /// Does an entity of `kind` at `other` touch the player at `player`?
    ///
    /// Scenery never collides.
    pub fn hits(&self, kind: EntityKind, player: Vec2, other: Vec2) -> bool {
        let other_size = match (self, kind) {
            (_, EntityKind::Scenery(_)) => return false,
            (CollisionShape::Radius { radius }, _) => {
                return within_radius(player, other, *radius);
            }
            (CollisionShape::Boxes { obstacle, .. }, EntityKind::Obstacle) => *obstacle,
            (CollisionShape::Boxes { collectible, .. }, EntityKind::Collectible) => *collectible,
        };

        let CollisionShape::Boxes { player: size, window, .. } = *self else {
            return false;
        };
        in_window(player.y, other.y, window) && boxes_overlap(player, size, other, other_size)
    }
}

/// Euclidean distance strictly below `radius`
#[inline]
pub fn within_radius(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance(b) < radius
}

/// Axis-aligned boxes (given by centre and full size) overlap with positive area
#[inline]
pub fn boxes_overlap(a_center: Vec2, a_size: Vec2, b_center: Vec2, b_size: Vec2) -> bool {
    let gap = (a_center - b_center).abs();
    let reach = (a_size + b_size) * 0.5;
    gap.x < reach.x && gap.y < reach.y
}

/// Forward distance strictly inside the test window around the player
#[inline]
pub fn in_window(player_forward: f32, forward: f32, window: f32) -> bool {
    (forward - player_forward).abs() < window
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SceneryKind;

    #[test]
    fn test_radius_boundary_is_a_miss() {
        let player = Vec2::new(0.0, 5.0);
        assert!(!within_radius(player, Vec2::new(0.0, 3.5), 1.5));
        assert!(within_radius(player, Vec2::new(0.0, 3.51), 1.5));
        assert!(!within_radius(player, Vec2::new(1.5, 5.0), 1.5));
    }

    #[test]
    fn test_radius_is_symmetric() {
        let a = Vec2::new(0.3, 5.0);
        let b = Vec2::new(-0.4, 4.1);
        assert_eq!(within_radius(a, b, 1.5), within_radius(b, a, 1.5));
    }

    #[test]
    fn test_boxes_touching_edges_do_not_overlap() {
        let size = Vec2::new(40.0, 40.0);
        assert!(!boxes_overlap(Vec2::ZERO, size, Vec2::new(40.0, 0.0), size));
        assert!(boxes_overlap(Vec2::ZERO, size, Vec2::new(39.0, 0.0), size));
        assert!(!boxes_overlap(Vec2::ZERO, size, Vec2::new(39.0, 40.0), size));
    }

    #[test]
    fn test_boxes_shape_respects_window() {
        let shape = CollisionShape::Boxes {
            player: Vec2::new(40.0, 70.0),
            obstacle: Vec2::new(40.0, 40.0),
            collectible: Vec2::new(30.0, 30.0),
            window: 50.0,
        };
        let player = Vec2::ZERO;
        // Overlapping boxes but outside the forward window
        assert!(!shape.hits(EntityKind::Obstacle, player, Vec2::new(0.0, -50.0)));
        assert!(shape.hits(EntityKind::Obstacle, player, Vec2::new(0.0, -49.0)));
        // Collectible box is smaller: 35 + 15 = 50 lateral reach
        assert!(!shape.hits(EntityKind::Collectible, player, Vec2::new(35.0, 0.0)));
        assert!(shape.hits(EntityKind::Collectible, player, Vec2::new(34.0, 0.0)));
    }

    #[test]
    fn test_scenery_never_hits() {
        let shape = CollisionShape::Radius { radius: 1.5 };
        assert!(!shape.hits(
            EntityKind::Scenery(SceneryKind::Tree),
            Vec2::ZERO,
            Vec2::ZERO
        ));
    }
}
