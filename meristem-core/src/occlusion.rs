//! Occlusion predicates in the (angle, height, radius) pseudo-space.
//!
//! The visibility graph decides whether one bud hides another behind it
//! with two constructions: a finite cone anchored where the inner
//! tangents of the viewer and the occluder cross, and, when the two
//! circles overlap and no clean cone exists, a separating plane through
//! the occluder. Both are small value objects capturing the geometry
//! once, so each test is a couple of dot products.

use glam::Vec3;

use crate::bud::Bud;
use crate::geometry::norm_angle;

/// Direction vector from `b2` to `b1`, the angle axis wrapped.
pub fn dir_vector(b1: &Bud, b2: &Bud) -> Vec3 {
    Vec3::new(
        norm_angle(b1.angle - b2.angle),
        b1.height - b2.height,
        b1.radius - b2.radius,
    )
}

/// Offset of the bud's coordinates from `origin`, the angle axis wrapped.
fn wrapped_diff(bud: &Bud, origin: Vec3) -> Vec3 {
    Vec3::new(
        norm_angle(bud.angle - origin.x),
        bud.height - origin.y,
        bud.radius - origin.z,
    )
}

/// The approximate crossing point of the inner tangents between the two
/// buds: the point on the b1→b2 axis dividing it by the buds' scales.
pub fn middle_point(b1: &Bud, b2: &Bud) -> Vec3 {
    let dir = dir_vector(b2, b1);
    let line_len = dir.length();
    let normed = dir / line_len;
    let d1 = (b1.scale * line_len) / (b1.scale + b2.scale);
    Vec3::new(
        norm_angle(b1.angle + d1 * normed.x),
        b1.height + d1 * normed.y,
        b1.radius + d1 * normed.z,
    )
}

/// A finite right circular cone anchored at `tip`, oriented along `dir`,
/// with radius `radius` at axial distance `height`.
///
/// The sample base only fixes the opening: the cone itself extends
/// without bound past it. `dir` is used exactly as constructed, without
/// normalization.
#[derive(Debug, Clone, Copy)]
pub struct ConeChecker {
    pub tip: Vec3,
    pub dir: Vec3,
    pub radius: f32,
    pub height: f32,
}

impl ConeChecker {
    pub fn new(tip: Vec3, dir: Vec3, radius: f32, height: f32) -> Self {
        Self {
            tip,
            dir,
            radius,
            height,
        }
    }

    /// Whether the bud's center lies strictly inside the cone.
    pub fn contains(&self, bud: &Bud) -> bool {
        let diff = wrapped_diff(bud, self.tip);
        let cone_dist = diff.dot(self.dir);
        if cone_dist < 0.0 {
            return false;
        }
        let radius_at = self.radius * cone_dist / self.height;
        let orth_dist = (diff - self.dir * cone_dist).length();
        orth_dist < radius_at
    }
}

/// The cone behind `b2` as seen from `b1`: buds fully inside it cannot
/// be reached from `b1` without crossing `b2`.
pub fn occlusion_cone(b1: &Bud, b2: &Bud) -> ConeChecker {
    let dir = dir_vector(b2, b1);
    let apex = middle_point(b1, b2);
    let height = Vec3::new(
        norm_angle(b2.angle - apex.x),
        b2.height - apex.y,
        b2.radius - apex.z,
    )
    .length();
    ConeChecker::new(apex, dir, b2.scale, height)
}

/// Half-space test against the plane through `b2` perpendicular to the
/// direction from `b1` to `b2`.
///
/// Used when the two circles overlap and an occlusion cone would be
/// degenerate: everything behind the plane is treated as hidden.
#[derive(Debug, Clone, Copy)]
pub struct PlaneChecker {
    normal: Vec3,
    origin: Vec3,
}

impl PlaneChecker {
    /// The plane through `b2`, facing back toward `b1`.
    pub fn new(b1: &Bud, b2: &Bud) -> Self {
        Self {
            normal: dir_vector(b1, b2),
            origin: Vec3::new(b2.angle, b2.height, b2.radius),
        }
    }

    /// Whether the bud lies on `b1`'s side of the plane.
    pub fn in_front(&self, bud: &Bud) -> bool {
        self.normal.dot(wrapped_diff(bud, self.origin)) >= 0.0
    }
}

/// Distance from the line through two buds, in the pseudo-space.
///
/// Degenerates gracefully: two buds at the same angle give a vertical
/// line, and the distance is still well defined.
#[derive(Debug, Clone, Copy)]
pub struct LineChecker {
    origin: Vec3,
    dir: Vec3,
}

impl LineChecker {
    pub fn new(b1: &Bud, b2: &Bud) -> Self {
        Self {
            origin: Vec3::new(b1.angle, b1.height, b1.radius),
            dir: dir_vector(b1, b2),
        }
    }

    /// Orthogonal distance from the bud's center to the line.
    pub fn distance(&self, bud: &Bud) -> f32 {
        let diff = wrapped_diff(bud, self.origin);
        diff.cross(self.dir).length() / self.dir.length()
    }

    /// Whether the bud's own circle touches the line.
    pub fn on_line(&self, bud: &Bud) -> bool {
        self.distance(bud) < bud.scale
    }
}
