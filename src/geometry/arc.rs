//! Curve flattening
//!
//! Arcs, circles and cubic beziers are converted to straight segments before
//! any exact distance test. Segment counts depend only on the input geometry,
//! so the same board always flattens to the same points.

use super::{Coord, Point};

/// Maximum chordal error for flattened curves (0.005 mm)
pub const ARC_HIGH_DEF: Coord = 5_000;

const MIN_SEGCOUNT_FOR_CIRCLE: f64 = 8.0;

/// Number of segments needed to approximate an arc of `radius` sweeping
/// `arc_angle_deg` with a chordal error below `max_error`
pub fn arc_segment_count(radius: Coord, max_error: Coord, arc_angle_deg: f64) -> usize {
    let max_error = max_error.max(1) as f64;
    let radius = radius.max(1) as f64;
    let rel_error = (max_error / radius).min(1.0);
    let arc_increment = (1.0 - rel_error).acos().to_degrees() * 2.0;
    let arc_increment = arc_increment.min(360.0 / MIN_SEGCOUNT_FOR_CIRCLE).max(f64::EPSILON);
    let count = (arc_angle_deg.abs() / arc_increment).round() as usize;
    count.max(2)
}

/// Points along an arc starting at `start`, rotating `angle_deg` around `center`
/// (counter-clockwise for positive angles). Includes both end points.
pub fn flatten_arc(center: Point, start: Point, angle_deg: f64, max_error: Coord) -> Vec<Point> {
    let radius = center.distance(start).round() as Coord;
    let count = arc_segment_count(radius, max_error, angle_deg);
    let mut points = Vec::with_capacity(count + 1);
    points.push(start);
    for i in 1..count {
        let a = angle_deg * i as f64 / count as f64;
        points.push(start.rotated_about(center, a));
    }
    points.push(start.rotated_about(center, angle_deg));
    points
}

/// Closed ring approximating a circle; vertices lie on the circle
pub fn flatten_circle(center: Point, radius: Coord, max_error: Coord) -> Vec<Point> {
    let count = arc_segment_count(radius, max_error, 360.0).max(MIN_SEGCOUNT_FOR_CIRCLE as usize);
    let start = Point::new(center.x + radius, center.y);
    (0..count)
        .map(|i| start.rotated_about(center, 360.0 * i as f64 / count as f64))
        .collect()
}

/// Cubic bezier approximated by straight segments no shorter than `min_seg_len`
/// (and at most 128 of them)
pub fn flatten_bezier(p0: Point, p1: Point, p2: Point, p3: Point, min_seg_len: Coord) -> Vec<Point> {
    let control_len = p0.distance(p1) + p1.distance(p2) + p2.distance(p3);
    let steps = ((control_len / min_seg_len.max(1) as f64).ceil() as usize).clamp(1, 128);
    let mut points = Vec::with_capacity(steps + 1);
    points.push(p0);
    for i in 1..steps {
        let t = i as f64 / steps as f64;
        let mt = 1.0 - t;
        let w0 = mt * mt * mt;
        let w1 = 3.0 * mt * mt * t;
        let w2 = 3.0 * mt * t * t;
        let w3 = t * t * t;
        let x = w0 * p0.x as f64 + w1 * p1.x as f64 + w2 * p2.x as f64 + w3 * p3.x as f64;
        let y = w0 * p0.y as f64 + w1 * p1.y as f64 + w2 * p2.y as f64 + w3 * p3.y as f64;
        points.push(Point::new(x.round() as Coord, y.round() as Coord));
    }
    points.push(p3);
    points.dedup();
    points
}

/// Corners of a `width` x `height` rectangle centred on `center`, rotated by `angle_deg`
pub fn rect_outline(center: Point, width: Coord, height: Coord, angle_deg: f64) -> Vec<Point> {
    let hw = width / 2;
    let hh = height / 2;
    [
        Point::new(-hw, -hh),
        Point::new(hw, -hh),
        Point::new(hw, hh),
        Point::new(-hw, hh),
    ]
    .into_iter()
    .map(|p| p.rotated(angle_deg) + center)
    .collect()
}
