//! Helices through pairs of buds on the cylinder surface.
//!
//! An axis through a bud and a pair of its opposite neighbours is a
//! helix with a constant angle/height slope. Pairs sharing a height
//! degenerate into a circle, pairs sharing an angle into a vertical
//! line; both are represented explicitly instead of dividing by zero.

use std::f32::consts::PI;

use glam::Vec3;

use crate::bud::Bud;
use crate::geometry::norm_angle;

/// Height or angle differences below this count as degenerate.
const FLAT_EPS: f32 = 0.001;

/// Angular sampling step for generated points (5 degrees).
const STEP: f32 = PI / 36.0;

/// The unique helix through two buds, or its degenerate forms.
///
/// `origin` is the lower of the two defining buds; sampled points are
/// pushed out to its surface (`radius + scale`) so drawn lines clear
/// the buds they thread through.
#[derive(Debug, Clone, Copy)]
pub enum Helix {
    /// Both buds at (nearly) the same height.
    Circle { origin: Bud },
    /// Both buds at (nearly) the same angle.
    Vertical { origin: Bud },
    /// A proper coil with slope Δangle/Δheight.
    Coil { origin: Bud, slope: f32 },
}

impl Helix {
    /// Derive the helix passing through the two given buds.
    pub fn through(b1: &Bud, b2: &Bud) -> Self {
        let mut hdiff = b2.height - b1.height;
        let mut adiff = norm_angle(b2.angle - b1.angle);
        if b2.height < b1.height {
            hdiff = -hdiff;
            adiff = -adiff;
        }

        if hdiff.abs() < FLAT_EPS {
            Helix::Circle { origin: *b1 }
        } else if adiff.abs() < FLAT_EPS {
            Helix::Vertical { origin: *b1 }
        } else {
            Helix::Coil {
                origin: *b1,
                slope: adiff / hdiff,
            }
        }
    }

    /// Whether the bud sits on the helix, within its own scale.
    pub fn contains(&self, bud: &Bud) -> bool {
        match self {
            Helix::Circle { origin } => (bud.height - origin.height).abs() < FLAT_EPS,
            Helix::Vertical { origin } => norm_angle(bud.angle - origin.angle).abs() < FLAT_EPS,
            Helix::Coil { origin, slope } => {
                let angle_diff = norm_angle(bud.angle - origin.angle);
                let height_diff = norm_angle(slope * (bud.height - origin.height));
                (angle_diff - height_diff).abs() < slope.abs().min(1.0) * bud.scale
            }
        }
    }

    /// Cartesian points along the helix, one sample per 5° of arc.
    ///
    /// The circle form ignores `max_height` and yields one revolution at
    /// its own height; the other forms run from the ground up to
    /// `max_height`.
    pub fn sample(&self, max_height: f32) -> Vec<Vec3> {
        match self {
            Helix::Circle { origin } => (0..72)
                .map(|i| {
                    Bud::cyl_to_cart(
                        i as f32 * STEP,
                        origin.height,
                        origin.radius + origin.scale,
                    )
                })
                .collect(),
            Helix::Vertical { origin } => {
                let steps = max_height.max(0.0).round() as i32;
                (0..steps)
                    .map(|h| {
                        Bud::cyl_to_cart(origin.angle, h as f32, origin.radius + origin.scale)
                    })
                    .collect()
            }
            Helix::Coil { origin, slope } => {
                // height along the angular parameter t
                let h_slope = 1.0 / slope;
                let i0 = (-origin.height / (h_slope * STEP)).round() as i32;
                let iend = ((max_height - origin.height) / (h_slope * STEP)).round() as i32;
                (i0.min(iend)..i0.max(iend))
                    .map(|i| {
                        let t = i as f32 * STEP;
                        Bud::cyl_to_cart(
                            norm_angle(t + origin.angle),
                            h_slope * t + origin.height,
                            origin.radius + origin.scale,
                        )
                    })
                    .collect()
            }
        }
    }
}
