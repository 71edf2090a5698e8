//! Marker placement along a track
//!
//! A violation against an area or another segment is drawn at a single
//! point on the offending track, found by bisecting the track toward the
//! conflict.

use crate::board::{Track, Zone};
use crate::geometry::{Coord, Ecoord, Point, PolySet, Seg};

/// Bisection stops once the endpoints are this close (5 mils)
pub const MARKER_EPSILON: Coord = 127_000;

/// Upper bound on halvings; a 2^64 unit track would still finish
const MAX_BISECT_STEPS: usize = 64;

/// Shrink `pt1..pt2` toward the end closer to the conflict
///
/// Each step moves the endpoint with the larger distance to the midpoint,
/// so the interval halves until it is shorter than `MARKER_EPSILON`.
fn bisect<F>(mut pt1: Point, mut pt2: Point, distance: F) -> Point
where
    F: Fn(Point) -> Ecoord,
{
    let eps = MARKER_EPSILON as Ecoord;
    let mut steps = 0;
    while pt1.squared_distance(pt2) > eps * eps && steps < MAX_BISECT_STEPS {
        let mid = pt1.midpoint(pt2);
        if distance(pt1) < distance(pt2) {
            pt2 = mid;
        } else {
            pt1 = mid;
        }
        steps += 1;
    }
    pt1
}

/// Location of a track conflicting with a zone's area
pub fn location_in_zone(track: &Track, zone: &Zone) -> Point {
    location_in_area(track, zone.conflict_outline())
}

pub fn location_in_area(track: &Track, area: &PolySet) -> Point {
    let center = track.seg().center();
    if area.contains(center) {
        return center;
    }
    bisect(track.start, track.end, |p| area.squared_distance_point(p))
}

/// Location of a track conflicting with a segment
pub fn location_near_seg(track: &Track, conflict: &Seg) -> Point {
    bisect(track.start, track.end, |p| conflict.squared_distance_point(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{LayerId, LayerSet};

    #[test]
    fn test_midpoint_inside_area() {
        let zone = Zone::new(
            1,
            LayerSet::single(LayerId::F_CU),
            vec![
                Point::new(-1000, -1000),
                Point::new(1000, -1000),
                Point::new(1000, 1000),
                Point::new(-1000, 1000),
            ],
            0,
        );
        let track = Track::segment(2, Point::new(-5000, 0), Point::new(5000, 0), 100, LayerId::F_CU, 1);
        assert_eq!(location_in_zone(&track, &zone), Point::new(0, 0));
    }

    #[test]
    fn test_bisection_converges_near_boundary() {
        let size = 1_000_000;
        let zone = Zone::new(
            1,
            LayerSet::single(LayerId::F_CU),
            vec![Point::new(0, 0), Point::new(size, 0), Point::new(size, size), Point::new(0, size)],
            0,
        );
        // Track enters the zone by 50 units at its far end
        let track = Track::segment(
            2,
            Point::new(-20_000_000, 500_000),
            Point::new(50, 500_000),
            100,
            LayerId::F_CU,
            1,
        );
        let loc = location_in_zone(&track, &zone);
        let d2 = zone.outline.squared_distance_point(loc);
        assert!(
            d2 <= (MARKER_EPSILON as Ecoord).pow(2),
            "marker {:?} should be within epsilon of the outline",
            loc
        );
    }

    #[test]
    fn test_near_segment() {
        let track = Track::segment(1, Point::new(0, 0), Point::new(10_000_000, 0), 100, LayerId::F_CU, 1);
        let other = Seg::new(Point::new(10_000_000, 100), Point::new(10_000_000, 5_000_000));
        let loc = location_near_seg(&track, &other);
        assert!(loc.x >= 10_000_000 - MARKER_EPSILON);
    }
}
