//! Incremental placement algorithms for new buds.
//!
//! A positioner is a small state machine: each call to
//! [`Positioner::next_position`] advances the cursor and returns the
//! placement for one new bud. The caller owns the bud records and the
//! collection they accumulate in; the positioner only hands out
//! coordinates.

use std::f32::consts::PI;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::bud::Bud;
use crate::geometry::{self, norm_angle};

/// Default distance of bud centers from the cylinder axis.
pub const BASE_RADIUS: f32 = 3.0;

/// Sizes never shrink below this, whatever the decay settings.
const MIN_SCALE: f32 = 0.001;

/// One placement step: the tuple applied to a caller-owned bud record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub angle: f32,
    pub height: f32,
    pub radius: f32,
    pub scale: f32,
}

impl From<Placement> for Bud {
    fn from(p: Placement) -> Self {
        Bud::new(p.angle, p.height, p.radius, p.scale)
    }
}

pub trait Positioner {
    /// Advance the cursor and return the next bud's placement.
    fn next_position(&mut self) -> Placement;

    /// Return the cursor to its start values.
    fn reset(&mut self);

    /// The next `n` placements.
    fn positions(&mut self, n: usize) -> Vec<Placement> {
        (0..n).map(|_| self.next_position()).collect()
    }
}

/// Placement request parameters, as supplied by the consuming layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionerKind {
    Ring {
        angle: f32,
        per_ring: u32,
        height: Option<f32>,
    },
    ChangingRing {
        angle: f32,
        per_ring: u32,
        shrink: f32,
        shrink_radius: bool,
    },
    LowestAvailable {
        start_size: f32,
        decay: f32,
        jitter: f32,
    },
}

impl PositionerKind {
    /// Build the positioner this request describes. The seed feeds the
    /// jittered packer, keeping runs reproducible.
    pub fn build(self, seed: u64) -> Box<dyn Positioner> {
        match self {
            PositionerKind::Ring {
                angle,
                per_ring,
                height,
            } => Box::new(RingPositioner::with_height(angle, per_ring, height)),
            PositionerKind::ChangingRing {
                angle,
                per_ring,
                shrink,
                shrink_radius,
            } => Box::new(ChangingRingPositioner::new(
                angle,
                per_ring,
                shrink,
                shrink_radius,
            )),
            PositionerKind::LowestAvailable {
                start_size,
                decay,
                jitter,
            } => Box::new(LowestAvailablePositioner::seeded(
                start_size, decay, jitter, seed,
            )),
        }
    }
}

/// Places `per_ring` evenly spaced buds per ring, each ring rotated by
/// a fixed offset against the previous one and raised so consecutive
/// rings sit tangent.
#[derive(Debug, Clone)]
pub struct RingPositioner {
    /// Rotation offset applied to each successive ring.
    angle: f32,
    per_ring: u32,
    angle_step: f32,
    bud_radius: f32,
    radius: f32,
    height_override: Option<f32>,
    start_angle: f32,
    start_height: f32,
    current_angle: f32,
    current_height: f32,
    ring: u32,
    ring_place: u32,
}

impl RingPositioner {
    pub fn new(angle: f32, per_ring: u32) -> Self {
        Self::with_height(angle, per_ring, None)
    }

    /// `height` overrides the ring spacing; without it consecutive
    /// rings are placed touching each other.
    pub fn with_height(angle: f32, per_ring: u32, height: Option<f32>) -> Self {
        debug_assert!(per_ring > 0);
        let bud_radius = PI * BASE_RADIUS / per_ring as f32;
        let start_height = bud_radius;
        Self {
            angle,
            per_ring,
            angle_step: 2.0 * PI / per_ring as f32,
            bud_radius,
            radius: BASE_RADIUS,
            height_override: height,
            start_angle: 0.0,
            start_height,
            current_angle: 0.0,
            current_height: start_height,
            ring: 0,
            ring_place: 0,
        }
    }

    /// Vertical distance between consecutive rings.
    ///
    /// The rotation offset is folded into half the angular step, scaled
    /// into the bud plane, and the tangency distance `2·bud_radius` is
    /// decomposed into that lateral part and the vertical rest.
    fn ring_height(&self) -> f32 {
        if let Some(h) = self.height_override {
            return h;
        }
        let mut lat = (self.angle % self.angle_step).abs();
        if lat > self.angle_step / 2.0 {
            lat = self.angle_step - lat;
        }
        lat *= self.radius;
        (4.0 * self.bud_radius * self.bud_radius - lat * lat).abs().sqrt()
    }

    fn next_ring(&mut self) {
        self.ring += 1;
        self.ring_place = 1;
        self.current_angle = norm_angle(self.angle * self.ring as f32 + self.start_angle);
        self.current_height += self.ring_height();
    }

    fn step(&mut self) -> Placement {
        if self.ring_place < self.per_ring {
            self.current_angle -= self.angle_step;
            self.ring_place += 1;
        } else {
            self.next_ring();
        }
        Placement {
            angle: self.current_angle,
            height: self.current_height,
            radius: self.radius,
            scale: self.bud_radius,
        }
    }
}

impl Positioner for RingPositioner {
    fn next_position(&mut self) -> Placement {
        self.step()
    }

    fn reset(&mut self) {
        self.current_angle = self.start_angle;
        self.current_height = self.start_height;
        self.ring = 0;
        self.ring_place = 0;
    }
}

/// A ring positioner whose buds shrink with every new ring.
#[derive(Debug, Clone)]
pub struct ChangingRingPositioner {
    ring: RingPositioner,
    /// Percentage of the starting bud radius shed per ring.
    shrink: f32,
    shrink_radius: bool,
    base_bud_radius: f32,
    base_radius: f32,
}

impl ChangingRingPositioner {
    pub fn new(angle: f32, per_ring: u32, shrink: f32, shrink_radius: bool) -> Self {
        let ring = RingPositioner::new(angle, per_ring);
        let base_bud_radius = ring.bud_radius;
        let base_radius = ring.radius;
        Self {
            ring,
            shrink,
            shrink_radius,
            base_bud_radius,
            base_radius,
        }
    }
}

impl Positioner for ChangingRingPositioner {
    fn next_position(&mut self) -> Placement {
        if self.ring.ring_place >= self.ring.per_ring {
            // the ring is full; the next placement opens a smaller one
            let step = self.base_bud_radius * self.shrink / 100.0;
            self.ring.bud_radius = (self.ring.bud_radius - step).max(MIN_SCALE);
            if self.shrink_radius {
                let step = self.base_radius * self.shrink / 100.0;
                self.ring.radius = (self.ring.radius - step).max(MIN_SCALE);
            }
        }
        self.ring.step()
    }

    fn reset(&mut self) {
        self.ring.reset();
        self.ring.bud_radius = self.base_bud_radius;
        self.ring.radius = self.base_radius;
    }
}

/// Physically motivated close packing: every new bud falls into the
/// lowest pocket the already placed buds leave open.
///
/// Grows through three stages, never returning to an earlier one:
/// the first two buds bootstrap the ground ring diametrically opposite
/// each other, the ground ring fills through [`geometry::first_gap`],
/// and from then on new buds drop onto the front, tangent to a
/// consecutive pair of its members.
#[derive(Debug, Clone)]
pub struct LowestAvailablePositioner<R: Rng> {
    start_angle: f32,
    start_height: f32,
    radius: f32,
    start_size: f32,
    bud_size: f32,
    /// Percentage of the current size shed per placement.
    decay: f32,
    /// Jitter bound, as a percentage of the decay step.
    jitter: f32,
    placed: Vec<Bud>,
    rng: R,
}

impl LowestAvailablePositioner<StdRng> {
    /// Seeded constructor; identical seeds reproduce identical packings.
    pub fn seeded(start_size: f32, decay: f32, jitter: f32, seed: u64) -> Self {
        Self::new(start_size, decay, jitter, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> LowestAvailablePositioner<R> {
    pub fn new(start_size: f32, decay: f32, jitter: f32, rng: R) -> Self {
        Self {
            start_angle: 0.0,
            start_height: start_size,
            radius: BASE_RADIUS,
            start_size,
            bud_size: start_size,
            decay,
            jitter,
            placed: Vec::new(),
            rng,
        }
    }

    /// The circles placed so far, in placement order.
    pub fn placed(&self) -> &[Bud] {
        &self.placed
    }

    /// Current size, then shrink it for the following placement.
    fn next_size(&mut self) -> f32 {
        let size = self.bud_size;
        if self.decay > 0.0 {
            let mut step = self.bud_size * self.decay / 100.0;
            if self.jitter > 0.0 {
                let bound = step * self.jitter / 100.0;
                step += self.rng.random_range(-bound..=bound);
            }
            self.bud_size = (self.bud_size - step).max(MIN_SCALE);
        }
        size
    }

    fn at_ground(&self, bud: &Bud) -> bool {
        geometry::approx_equal(bud.height, self.start_height, 0.001)
    }

    fn next_bud(&mut self) -> Bud {
        let size = self.next_size();
        match self.placed.len() {
            0 => Bud::new(
                self.start_angle + PI,
                self.start_height,
                self.radius,
                size,
            ),
            1 => {
                // diametrically opposite the first, closing the other
                // side of the ground ring
                let first = self.placed[0];
                Bud::new(first.angle + PI, first.height, self.radius, size)
            }
            _ => {
                let last = self.placed[self.placed.len() - 1];
                if self.at_ground(&last) {
                    let ground: Vec<Bud> = self
                        .placed
                        .iter()
                        .filter(|b| self.at_ground(b))
                        .copied()
                        .collect();
                    if let Some(angle) = geometry::first_gap(&ground, size) {
                        return Bud::new(angle, self.start_height, self.radius, size);
                    }
                }
                self.pack_on_front(size)
            }
        }
    }

    /// The steady state: drop the new circle into the lowest pocket
    /// formed by consecutive front members.
    fn pack_on_front(&mut self, size: f32) -> Bud {
        let ring = self.packing_ring();

        // pockets between consecutive members, repeated over rotated
        // copies of the ring so the wrap pair gets contiguous angles
        let mut candidates: Vec<Bud> = Vec::new();
        for n in 0..3 {
            let rotated = geometry::cycle_ring(&ring, n);
            for pair in rotated.windows(2) {
                if let Some(c) = geometry::closest_circle(&pair[0], &pair[1], size) {
                    candidates.push(c);
                }
            }
        }

        // only the most recent placements can still be reached; older
        // circles are buried below the front
        let recent_from = self.placed.len().saturating_sub(2 * ring.len());
        let recent = &self.placed[recent_from..];
        candidates.retain(|c| !geometry::check_collisions(c, recent));

        match candidates
            .into_iter()
            .min_by(|a, b| a.height.total_cmp(&b.height))
        {
            Some(bud) => bud,
            None => {
                // every pocket collides; stack on top of the last bud
                debug!("no collision-free pocket, stacking above the last bud");
                let last = self.placed[self.placed.len() - 1];
                Bud::new(
                    last.angle,
                    last.height + last.scale + size,
                    self.radius,
                    size,
                )
            }
        }
    }

    /// The front as an ascending-angle ring, or every placed circle
    /// when no valid front exists.
    fn packing_ring(&self) -> Vec<Bud> {
        let mut ring: Vec<Bud> = match geometry::front(&self.placed) {
            Ok(ids) => ids.into_iter().map(|i| self.placed[i]).collect(),
            Err(_) => {
                debug!("no valid front, falling back to a raw circle scan");
                self.placed.clone()
            }
        };
        ring.sort_by(|a, b| a.angle.total_cmp(&b.angle));
        ring
    }
}

impl<R: Rng> Positioner for LowestAvailablePositioner<R> {
    fn next_position(&mut self) -> Placement {
        let bud = self.next_bud();
        self.placed.push(bud);
        Placement {
            angle: bud.angle,
            height: bud.height,
            radius: bud.radius,
            scale: bud.scale,
        }
    }

    fn reset(&mut self) {
        self.placed.clear();
        self.bud_size = self.start_size;
    }
}
