// Obstacle model: typed polygons handed over by the scene.
//
// `Polyline` rings bound the traversable area (usually the outer border of
// the level); `ConvexHull` obstacles are solid blockers that carve holes.

use serde::{Deserialize, Serialize};

use super::geometry::{Vector2, convex_hull, has_self_intersections, is_convex};

/// How the navmesh builder interprets an obstacle's ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Boundary ring. Space covered by an odd number of polyline rings is
    /// walkable; everything else is carved out.
    #[serde(rename = "polyline", alias = "polyligne")]
    Polyline,
    /// Convex blocker. Its interior is excised from the mesh.
    #[serde(rename = "convexHull", alias = "convex_hull")]
    ConvexHull,
}

/// A closed polygon placed in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    #[serde(rename = "type")]
    pub kind: ObstacleKind,
    /// Ring vertices in local space; the closing edge is implicit.
    pub shape: Vec<Vector2>,
    /// Offset applied to every vertex (the fixed body's translation).
    #[serde(default)]
    pub translation: Vector2,
}

impl Obstacle {
    pub fn polyline(shape: Vec<Vector2>) -> Self {
        Self {
            kind: ObstacleKind::Polyline,
            shape,
            translation: Vector2::ZERO,
        }
    }

    pub fn convex_hull(shape: Vec<Vector2>) -> Self {
        Self {
            kind: ObstacleKind::ConvexHull,
            shape,
            translation: Vector2::ZERO,
        }
    }

    /// Axis-aligned rectangular blocker centred on `center`.
    pub fn rectangle(center: Vector2, width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self::convex_hull(vec![
            Vector2::new(-hw, -hh),
            Vector2::new(hw, -hh),
            Vector2::new(hw, hh),
            Vector2::new(-hw, hh),
        ])
        .with_translation(center)
    }

    pub fn with_translation(mut self, translation: Vector2) -> Self {
        self.translation = translation;
        self
    }

    /// Ring vertices in world space.
    pub fn world_shape(&self) -> Vec<Vector2> {
        self.shape.iter().map(|&p| p + self.translation).collect()
    }

    /// The ring the builder should carve with.
    ///
    /// Convex hulls are rebuilt from their points the way a physics convex
    /// collider would be, so a sloppy or non-convex input still yields a
    /// valid blocker.
    pub fn effective_ring(&self) -> Vec<Vector2> {
        let world = self.world_shape();
        match self.kind {
            ObstacleKind::Polyline => world,
            ObstacleKind::ConvexHull => convex_hull(&world),
        }
    }

    /// Describes what is wrong with the raw shape, if anything.
    ///
    /// The builder still uses flagged obstacles on a best-effort basis.
    pub fn shape_issue(&self) -> Option<ShapeIssue> {
        let world = self.world_shape();
        if world.iter().any(|p| !p.is_finite()) {
            return Some(ShapeIssue::NonFinite);
        }
        if world.len() < 3 {
            return Some(ShapeIssue::TooFewPoints(world.len()));
        }
        match self.kind {
            ObstacleKind::Polyline if has_self_intersections(&world) => {
                Some(ShapeIssue::SelfIntersecting)
            }
            ObstacleKind::ConvexHull => {
                let mut ring = world;
                super::geometry::make_counter_clockwise(&mut ring);
                if is_convex(&ring) && !has_self_intersections(&ring) {
                    None
                } else {
                    Some(ShapeIssue::NotConvex)
                }
            }
            ObstacleKind::Polyline => None,
        }
    }
}

/// Problems detected in an obstacle's raw shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeIssue {
    NonFinite,
    TooFewPoints(usize),
    SelfIntersecting,
    NotConvex,
}

impl std::fmt::Display for ShapeIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeIssue::NonFinite => write!(f, "contains non-finite coordinates"),
            ShapeIssue::TooFewPoints(n) => write!(f, "has {n} points, need at least 3"),
            ShapeIssue::SelfIntersecting => write!(f, "ring crosses itself"),
            ShapeIssue::NotConvex => write!(f, "points do not describe a convex polygon"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_is_translated() {
        let obstacle = Obstacle::rectangle(Vector2::new(1000.0, 1000.0), 100.0, 100.0);
        let ring = obstacle.world_shape();
        assert_eq!(ring[0], Vector2::new(950.0, 950.0));
        assert_eq!(ring[2], Vector2::new(1050.0, 1050.0));
        assert_eq!(obstacle.shape_issue(), None);
    }

    #[test]
    fn non_convex_hull_is_flagged_and_rebuilt() {
        // Arrow head: the notch at (5, 3) makes it concave.
        let obstacle = Obstacle::convex_hull(vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(5.0, 3.0),
            Vector2::new(10.0, 0.0),
            Vector2::new(5.0, 10.0),
        ]);
        assert_eq!(obstacle.shape_issue(), Some(ShapeIssue::NotConvex));
        assert_eq!(obstacle.effective_ring().len(), 3);
    }

    #[test]
    fn clockwise_convex_hull_is_accepted() {
        let obstacle = Obstacle::convex_hull(vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(0.0, 10.0),
            Vector2::new(10.0, 10.0),
            Vector2::new(10.0, 0.0),
        ]);
        assert_eq!(obstacle.shape_issue(), None);
    }

    #[test]
    fn short_ring_is_flagged() {
        let obstacle = Obstacle::polyline(vec![Vector2::ZERO, Vector2::new(1.0, 1.0)]);
        assert_eq!(obstacle.shape_issue(), Some(ShapeIssue::TooFewPoints(2)));
    }
}
