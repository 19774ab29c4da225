use crate::geometry::norm_angle;
use glam::Vec3;

/// A primordium on the cylindrical stem surface, in cylindrical coords.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bud {
    /// Rotation around the cylinder, normalized to [-π, π).
    pub angle: f32,
    /// Height along the cylinder axis.
    pub height: f32,
    /// Distance of the bud's center from the cylinder axis.
    pub radius: f32,
    /// The bud's own circle radius in the (angle·radius, height) plane.
    pub scale: f32,
}

impl Bud {
    pub fn new(angle: f32, height: f32, radius: f32, scale: f32) -> Self {
        Self {
            angle: norm_angle(angle),
            height,
            radius,
            scale,
        }
    }

    /// Convert a cylindrical point to a cartesian one.
    pub fn cyl_to_cart(angle: f32, height: f32, radius: f32) -> Vec3 {
        Vec3::new(angle.sin() * radius, height, angle.cos() * radius)
    }

    /// The bud's cartesian offset from the stem origin.
    ///
    /// The bud sits on a simple circle in the XZ plane, so simple
    /// trigonometry does the trick.
    pub fn offset(&self) -> Vec3 {
        Self::cyl_to_cart(self.angle, self.height, self.radius)
    }

    /// Project the given angle into the pseudo-2D plane.
    ///
    /// In that plane x is the bud's angle and y is its height. The angle
    /// has to be scaled by the radius: otherwise two buds at different
    /// radii but the same angle would come out identical, and there
    /// would be no way to tell e.g. which one is wider.
    pub fn angle2x(&self, angle: f32) -> f32 {
        norm_angle(angle) * self.radius
    }

    /// Distance to the other bud in the pseudo-2D plane.
    pub fn distance(&self, other: &Bud) -> f32 {
        let dx = self.angle2x(self.angle - other.angle);
        let dy = self.height - other.height;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether `b1` and `b2` sit on opposite sides of this bud, to a
    /// precision of 1% of the cylinder radius.
    pub fn opposite(&self, b1: &Bud, b2: &Bud) -> bool {
        let angles_diff =
            (self.angle2x(b1.angle - self.angle) + self.angle2x(b2.angle - self.angle)).abs();
        let height_diff = ((b1.height + b2.height).abs() / 2.0 - self.height.abs()).abs();
        angles_diff < self.radius / 100.0 && height_diff < self.radius / 100.0
    }
}
