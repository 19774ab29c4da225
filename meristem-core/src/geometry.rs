//! Pure geometry over circles on the wrapped cylindrical surface.
//!
//! Everything here is stateless: angle normalization on the periodic
//! domain, circle intersection and collision predicates, gap scanning,
//! and the front (growth ring) extraction the packing positioner is
//! built on. Angles live in radians; distances mix the angular and
//! height axes through the scaled plane described on
//! [`Bud::angle2x`](crate::bud::Bud::angle2x).

use std::f32::consts::PI;

use glam::Vec2;

use crate::bud::Bud;
use crate::error::GeometryError;

/// Two circles closer than this (in the scaled plane) count as touching
/// for front construction.
const TOUCH_PRECISION: f32 = 0.1;

/// Wrap the given angle into [-π, π).
///
/// Idempotent and 2π-periodic: `norm_angle(a + 2πk) == norm_angle(a)`.
pub fn norm_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Check whether the two values are appropriately equal.
pub fn approx_equal(a: f32, b: f32, diff: f32) -> bool {
    (a - b).abs() < diff
}

/// Distance between two (angle, height) points, the angle axis wrapped.
///
/// Not scaled by any radius; callers scale separately where
/// radius-sensitivity matters.
pub fn cylin_distance(p1: Vec2, p2: Vec2) -> f32 {
    Vec2::new(norm_angle(p1.x - p2.x), p1.y - p2.y).length()
}

/// Solve `a·x² + b·x + c = 0`.
///
/// Returns the real roots in descending order, `Ok(None)` when the
/// discriminant is negative, and [`GeometryError::Math`] when `a` is
/// zero and the equation is not quadratic at all. Uses the sign-aware
/// `q` form to avoid cancellation on close roots.
pub fn solve_quadratic(a: f32, b: f32, c: f32) -> Result<Option<(f32, f32)>, GeometryError> {
    if a == 0.0 {
        return Err(GeometryError::Math);
    }
    let discr = b * b - 4.0 * a * c;
    if discr < 0.0 {
        return Ok(None);
    }
    if discr == 0.0 {
        let x = -0.5 * b / a;
        return Ok(Some((x, x)));
    }
    let q = if b > 0.0 {
        -0.5 * (b + discr.sqrt())
    } else {
        -0.5 * (b - discr.sqrt())
    };
    let (x0, x1) = (q / a, c / q);
    Ok(Some(if x0 > x1 { (x0, x1) } else { (x1, x0) }))
}

/// The given circles sorted by height, highest first.
pub fn by_height(circles: &[Bud]) -> Vec<Bud> {
    let mut sorted = circles.to_vec();
    sorted.sort_by(|a, b| b.height.total_cmp(&a.height));
    sorted
}

/// The given circles sorted by angle, largest first.
pub fn by_angle(circles: &[Bud]) -> Vec<Bud> {
    let mut sorted = circles.to_vec();
    sorted.sort_by(|a, b| b.angle.total_cmp(&a.angle));
    sorted
}

/// Whether the two circles overlap (touching does not count).
pub fn are_intersecting(c1: &Bud, c2: &Bud) -> bool {
    c1.distance(c2) < c1.scale + c2.scale - 1e-7
}

/// Whether the circle overlaps any circle in the provided list.
pub fn check_collisions(circle: &Bud, to_check: &[Bud]) -> bool {
    to_check.iter().any(|c| are_intersecting(circle, c))
}

/// Indices of all circles touching the given one.
pub fn touching(circle: &Bud, circles: &[Bud], precision: f32) -> Vec<usize> {
    circles
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            !std::ptr::eq(*c, circle) && circle.distance(c) < circle.scale + c.scale + precision
        })
        .map(|(i, _)| i)
        .collect()
}

/// Position a third circle of `radius` tangent to both given circles,
/// keeping the higher of the two solutions (buds grow upward).
///
/// This is the intersection of two circles centered at `b1` and `b2`
/// with radii `b1.scale + radius` and `b2.scale + radius`, carried out
/// in the scaled (angle·radius, height) plane so the tangency holds for
/// any cylinder radius. Returns `None` when the inputs coincide. When
/// the expanded circles are too far apart to intersect, the half-chord
/// collapses to zero and the result degrades to the point between them
/// on the b1→b2 axis.
pub fn closest_circle(b1: &Bud, b2: &Bud, radius: f32) -> Option<Bud> {
    let n1 = b1.scale + radius;
    let n2 = b2.scale + radius;
    let d = b1.distance(b2);
    if approx_equal(d, 0.0, 0.001) {
        return None;
    }

    // b1 sits at the origin of the scaled plane
    let dx = b1.angle2x(b2.angle - b1.angle);
    let dy = b2.height - b1.height;

    let a = (n1 * n1 - n2 * n2 + d * d) / (2.0 * d);
    let h = if n1 < a.abs() {
        0.0
    } else {
        (n1 * n1 - a * a).sqrt()
    };

    let mid_x = a * dx / d;
    let mid_y = a * dy / d;

    let (x, y) = {
        let (x1, y1) = (mid_x + h * dy / d, mid_y - h * dx / d);
        let (x2, y2) = (mid_x - h * dy / d, mid_y + h * dx / d);
        if y1 > y2 { (x1, y1) } else { (x2, y2) }
    };

    Some(Bud::new(
        b1.angle + x / b1.radius,
        b1.height + y,
        b1.radius,
        radius,
    ))
}

/// The first angular gap wide enough to admit a circle of `radius`.
///
/// Scans consecutive circles sorted by angle, cyclically, and returns
/// the midpoint angle of the first gap wider (in the scaled plane) than
/// the two flanking scales plus the new diameter. `None` when every gap
/// is too narrow, including the single-circle case whose only cyclic
/// pair has zero separation.
pub fn first_gap(circles: &[Bud], radius: f32) -> Option<f32> {
    if circles.is_empty() {
        return None;
    }
    let sorted = by_angle(circles);
    for i in 0..sorted.len() {
        let c1 = &sorted[i];
        let c2 = &sorted[(i + 1) % sorted.len()];
        let gap = norm_angle(c1.angle - c2.angle).abs();
        if c1.scale + c2.scale + 2.0 * radius < c1.angle2x(gap).abs() {
            return Some(norm_angle(c1.angle - gap / 2.0));
        }
    }
    None
}

/// Extract the current front of the given circles.
///
/// A front is a zigzagging ring of primordia encircling the cylinder,
/// each primordium tangent to one on its left and one on its right, and
/// any primordium above the front higher than every primordium of the
/// front. Returns indices into `circles`, starting from the highest one
/// and walking leftward; revisiting a circle closes the ring. A circle
/// with no touching left neighbour makes the whole construction fail
/// with [`GeometryError::NoFront`].
pub fn front(circles: &[Bud]) -> Result<Vec<usize>, GeometryError> {
    if circles.is_empty() {
        return Ok(Vec::new());
    }
    if circles.len() == 1 {
        return Ok(vec![0]);
    }

    let mut order: Vec<usize> = (0..circles.len()).collect();
    order.sort_by(|&a, &b| circles[b].height.total_cmp(&circles[a].height));
    let highest = order[0];

    let mut chain = vec![highest];
    let mut seen = vec![false; circles.len()];
    let mut checked = highest;
    loop {
        let next = highest_left(circles, &order, checked)?;
        if next == highest || seen[next] {
            break;
        }
        seen[next] = true;
        chain.push(next);
        checked = next;
    }
    Ok(chain)
}

/// The highest circle touching `checked` on its angular left.
fn highest_left(
    circles: &[Bud],
    order: &[usize],
    checked: usize,
) -> Result<usize, GeometryError> {
    let c = &circles[checked];
    for &i in order {
        if i == checked {
            continue;
        }
        let other = &circles[i];
        if c.distance(other) < c.scale + other.scale + TOUCH_PRECISION
            && norm_angle(other.angle - c.angle) > 0.0
        {
            return Ok(i);
        }
    }
    Err(GeometryError::NoFront)
}

/// Rotate the given ring of circles by `n` positions.
///
/// Assumes the ring is sorted by ascending angle. A member wrapping
/// past the cyclic discontinuity re-enters with its angle shifted by
/// -2π, deliberately un-normalized, so that consecutive-pair arithmetic
/// over the rotated ring stays contiguous.
pub fn cycle_ring(ring: &[Bud], n: usize) -> Vec<Bud> {
    let mut ring = ring.to_vec();
    if ring.is_empty() {
        return ring;
    }
    for _ in 0..n {
        let first_angle = ring[0].angle;
        let mut last = ring[ring.len() - 1];
        if (last.angle - first_angle).abs() > PI {
            last.angle -= 2.0 * PI;
        }
        ring.rotate_right(1);
        ring[0] = last;
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn circle(angle: f32, height: f32, scale: f32) -> Bud {
        Bud::new(angle, height, 3.0, scale)
    }

    #[test]
    fn norm_angle_wraps_into_the_half_open_range() {
        let cases = [
            (0.0, 0.0),
            (PI - 1e-4, PI - 1e-4),
            (-PI + 1e-4, -PI + 1e-4),
            (PI + 1e-4, -PI + 1e-4),
            (-PI - 1e-4, PI - 1e-4),
            (21.0 * PI, -PI),
            (22.0 * PI, 0.0),
            (19.0 * PI, -PI),
            (-19.0 * PI, -PI),
            (123.0, -2.6637),
        ];
        for (angle, expected) in cases {
            assert_abs_diff_eq!(norm_angle(angle), expected, epsilon = 1e-3);
        }
    }

    #[test]
    fn norm_angle_is_idempotent_and_periodic() {
        for i in -50..50 {
            let a = i as f32 * 0.37;
            let once = norm_angle(a);
            assert_abs_diff_eq!(norm_angle(once), once, epsilon = 1e-5);
            assert_abs_diff_eq!(norm_angle(a + 2.0 * PI), once, epsilon = 1e-3);
        }
    }

    #[test]
    fn cylin_distance_wraps_the_angle_axis() {
        let d = cylin_distance(Vec2::new(PI - 0.1, 0.0), Vec2::new(-PI + 0.1, 0.0));
        assert_abs_diff_eq!(d, 0.2, epsilon = 1e-4);

        let d = cylin_distance(Vec2::new(0.0, 1.0), Vec2::new(0.0, 4.0));
        assert_abs_diff_eq!(d, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn solve_quadratic_orders_roots_descending() {
        let (hi, lo) = solve_quadratic(1.0, 0.0, -1.0).unwrap().unwrap();
        assert_abs_diff_eq!(hi, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(lo, -1.0, epsilon = 1e-5);

        // x² - 3x + 2
        let (hi, lo) = solve_quadratic(1.0, -3.0, 2.0).unwrap().unwrap();
        assert_abs_diff_eq!(hi, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(lo, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn solve_quadratic_reports_degenerate_inputs() {
        assert_eq!(solve_quadratic(1.0, 0.0, 1.0), Ok(None));
        assert_eq!(solve_quadratic(0.0, 2.0, 1.0), Err(GeometryError::Math));
    }

    #[test]
    fn are_intersecting_ignores_tangent_circles() {
        let a = circle(0.0, 0.0, 1.0);
        // tangent: scaled distance is exactly the scale sum
        let b = circle(2.0 / 3.0, 0.0, 1.0);
        assert!(!are_intersecting(&a, &b));

        let c = circle(0.5 / 3.0, 0.0, 1.0);
        assert!(are_intersecting(&a, &c));

        let far = circle(0.0, 20.0, 1.0);
        assert!(!are_intersecting(&a, &far));
    }

    #[test]
    fn are_intersecting_sees_across_the_seam() {
        let a = circle(PI - 0.05, 0.0, 1.0);
        let b = circle(-PI + 0.05, 0.0, 1.0);
        assert!(are_intersecting(&a, &b));
    }

    #[test]
    fn check_collisions_scans_the_whole_list() {
        let probe = circle(0.0, 0.0, 1.0);
        let clear = [circle(0.0, 5.0, 1.0), circle(2.0, 0.0, 1.0)];
        assert!(!check_collisions(&probe, &clear));

        let blocked = [circle(0.0, 5.0, 1.0), circle(0.1, 0.0, 1.0)];
        assert!(check_collisions(&probe, &blocked));
    }

    #[test]
    fn closest_circle_is_tangent_to_both_inputs() {
        let b1 = circle(0.0, 0.0, 1.0);
        let b2 = circle(2.0 / 3.0, 0.0, 1.0);
        let result = closest_circle(&b1, &b2, 1.0).unwrap();

        assert_abs_diff_eq!(result.distance(&b1), b1.scale + 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.distance(&b2), b2.scale + 1.0, epsilon = 1e-3);
        // buds grow upward: of the two intersections, the higher one wins
        assert!(result.height > b1.height);
    }

    #[test]
    fn closest_circle_keeps_the_higher_root_with_unequal_scales() {
        let b1 = circle(0.0, 0.0, 1.5);
        let b2 = circle(1.0, 0.3, 0.8);
        let result = closest_circle(&b1, &b2, 0.6).unwrap();

        assert_abs_diff_eq!(result.distance(&b1), b1.scale + 0.6, epsilon = 1e-3);
        assert_abs_diff_eq!(result.distance(&b2), b2.scale + 0.6, epsilon = 1e-3);
        assert!(result.height >= b1.height.min(b2.height));
    }

    #[test]
    fn closest_circle_rejects_coincident_inputs() {
        let b1 = circle(0.0, 0.0, 1.0);
        assert_eq!(closest_circle(&b1, &b1, 1.0), None);
    }

    #[test]
    fn first_gap_skips_a_tightly_packed_ring() {
        // three tangent circles spread evenly around the cylinder
        let step = 2.0 * PI / 3.0;
        let ring = [
            circle(0.0, 0.0, PI),
            circle(step, 0.0, PI),
            circle(2.0 * step, 0.0, PI),
        ];
        assert_eq!(first_gap(&ring, 0.2), None);
    }

    #[test]
    fn first_gap_finds_the_midpoint_of_an_open_gap() {
        let step = 2.0 * PI / 3.0;
        let ring = [circle(0.0, 0.0, 0.3), circle(step, 0.0, 0.3)];
        let gap = first_gap(&ring, 0.3).unwrap();
        assert_abs_diff_eq!(gap, step / 2.0, epsilon = 1e-4);
    }

    #[test]
    fn first_gap_ignores_a_single_circle() {
        // the only cyclic pair has zero separation
        assert_eq!(first_gap(&[circle(0.0, 0.0, 0.5)], 0.5), None);
        assert_eq!(first_gap(&[], 0.5), None);
    }

    #[test]
    fn front_of_nothing_is_empty() {
        assert_eq!(front(&[]), Ok(Vec::new()));
    }

    #[test]
    fn front_of_a_single_circle_is_that_circle() {
        assert_eq!(front(&[circle(1.0, 0.0, 1.0)]), Ok(vec![0]));
    }

    #[test]
    fn front_walks_a_tangent_ring_leftward() {
        // six tangent circles around the cylinder at the same height
        let step = 2.0 * PI / 6.0;
        let scale = step * 3.0 / 2.0;
        let ring: Vec<Bud> = (0..6).map(|i| circle(i as f32 * step, 0.0, scale)).collect();

        let result = front(&ring).unwrap();
        assert_eq!(result.len(), 6);

        // every consecutive pair of the front is touching
        for pair in result.windows(2) {
            let (a, b) = (&ring[pair[0]], &ring[pair[1]]);
            assert!(a.distance(b) <= a.scale + b.scale + TOUCH_PRECISION);
        }
    }

    #[test]
    fn front_fails_without_a_left_neighbour() {
        // two circles too far apart to touch
        let circles = [circle(0.0, 1.0, 0.2), circle(2.0, 0.0, 0.2)];
        assert_eq!(front(&circles), Err(GeometryError::NoFront));
    }

    #[test]
    fn cycle_ring_rotates_and_shifts_wrapped_angles() {
        let ring: Vec<Bud> = [0.0, 1.0, 2.0, 3.0]
            .iter()
            .map(|&a| circle(a, 0.0, 1.0))
            .collect();

        // 3.0 is still within π of 0.0, so no shift happens
        let once = cycle_ring(&ring, 1);
        let angles: Vec<f32> = once.iter().map(|c| c.angle).collect();
        assert_eq!(angles, vec![3.0, 0.0, 1.0, 2.0]);

        // rotating past the length keeps cycling
        let five = cycle_ring(&ring, 5);
        let angles: Vec<f32> = five.iter().map(|c| c.angle).collect();
        assert_eq!(angles, vec![3.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn cycle_ring_unwraps_across_the_seam() {
        // the ring arrives with a raw contiguous angle past π, as the
        // packer's rotations can produce
        let mut ring: Vec<Bud> = [0.0, 1.0, 2.0]
            .iter()
            .map(|&a| circle(a, 0.0, 1.0))
            .collect();
        let mut wrapped = circle(0.0, 0.0, 1.0);
        wrapped.angle = PI + 1.0;
        ring.push(wrapped);

        let cycled = cycle_ring(&ring, 1);
        assert_abs_diff_eq!(cycled[0].angle, -PI + 1.0, epsilon = 1e-5);
    }

    #[test]
    fn cycle_ring_round_trips() {
        let ring: Vec<Bud> = [-2.0, -1.0, 0.5, 2.0]
            .iter()
            .map(|&a| circle(a, 0.0, 1.0))
            .collect();
        let cycled = cycle_ring(&cycle_ring(&ring, 1), ring.len() - 1);
        for (orig, back) in ring.iter().zip(&cycled) {
            assert_abs_diff_eq!(norm_angle(orig.angle), norm_angle(back.angle), epsilon = 1e-4);
            assert_abs_diff_eq!(orig.height, back.height, epsilon = 1e-5);
        }
    }

    #[test]
    fn sort_helpers_order_descending() {
        let circles = [
            circle(0.5, 1.0, 1.0),
            circle(-1.0, 3.0, 1.0),
            circle(2.0, 2.0, 1.0),
        ];

        let heights: Vec<f32> = by_height(&circles).iter().map(|c| c.height).collect();
        assert_eq!(heights, vec![3.0, 2.0, 1.0]);

        let angles: Vec<f32> = by_angle(&circles).iter().map(|c| c.angle).collect();
        assert_eq!(angles, vec![2.0, 0.5, -1.0]);
    }

    #[test]
    fn touching_reports_indices_of_adjacent_circles() {
        let probe = circle(0.0, 0.0, 1.0);
        let circles = [
            circle(0.6 / 3.0, 0.0, 1.0), // overlapping
            circle(2.0 / 3.0, 0.0, 1.0), // tangent
            circle(0.0, 10.0, 1.0),      // far away
        ];
        assert_eq!(touching(&probe, &circles, TOUCH_PRECISION), vec![0, 1]);
    }
}
