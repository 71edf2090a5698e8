//! Inflated clearance shapes
//!
//! Every copper item reduces to a core (point, segment, segment chain or
//! filled area) plus a radius. Clearance between two shapes is the core to
//! core distance minus both radii.

use super::{flatten_circle, BBox, Coord, Ecoord, Point, PolySet, Polygon, Seg};

#[derive(Debug, Clone)]
pub enum Core {
    Point(Point),
    Segment(Seg),
    Chain(Vec<Seg>),
    Area(PolySet),
}

#[derive(Debug, Clone)]
pub struct Shape {
    pub core: Core,
    pub radius: Coord,
}

fn min_over<I: Iterator<Item = Ecoord>>(iter: I) -> Ecoord {
    iter.min().unwrap_or(Ecoord::MAX)
}

impl Shape {
    pub fn circle(center: Point, radius: Coord) -> Self {
        Self { core: Core::Point(center), radius }
    }

    /// Segment of the given full width (round ends)
    pub fn segment(seg: Seg, width: Coord) -> Self {
        Self { core: Core::Segment(seg), radius: width / 2 }
    }

    pub fn chain(segs: Vec<Seg>, width: Coord) -> Self {
        Self { core: Core::Chain(segs), radius: width / 2 }
    }

    pub fn area(polys: PolySet, radius: Coord) -> Self {
        Self { core: Core::Area(polys), radius }
    }

    pub fn bbox(&self) -> BBox {
        let core = match &self.core {
            Core::Point(p) => BBox::from_point(*p),
            Core::Segment(s) => s.bbox(),
            Core::Chain(segs) => {
                BBox::from_points(segs.iter().flat_map(|s| [s.a, s.b])).unwrap_or(BBox::from_point(Point::default()))
            }
            Core::Area(polys) => polys.bbox().unwrap_or(BBox::from_point(Point::default())),
        };
        core.inflated(self.radius)
    }

    /// Exact squared distance between the two cores
    pub fn squared_core_distance(&self, other: &Shape) -> Ecoord {
        use Core::*;
        match (&self.core, &other.core) {
            (Point(a), Point(b)) => a.squared_distance(*b),
            (Point(p), Segment(s)) | (Segment(s), Point(p)) => s.squared_distance_point(*p),
            (Point(p), Chain(c)) | (Chain(c), Point(p)) => {
                min_over(c.iter().map(|s| s.squared_distance_point(*p)))
            }
            (Point(p), Area(a)) | (Area(a), Point(p)) => a.squared_distance_point(*p),
            (Segment(s), Segment(t)) => s.squared_distance(t),
            (Segment(s), Chain(c)) | (Chain(c), Segment(s)) => {
                min_over(c.iter().map(|t| s.squared_distance(t)))
            }
            (Segment(s), Area(a)) | (Area(a), Segment(s)) => a.squared_distance_seg(s),
            (Chain(c), Chain(d)) => {
                min_over(c.iter().flat_map(|s| d.iter().map(move |t| s.squared_distance(t))))
            }
            (Chain(c), Area(a)) | (Area(a), Chain(c)) => {
                min_over(c.iter().map(|s| a.squared_distance_seg(s)))
            }
            (Area(a), Area(b)) => a.squared_distance_polyset(b),
        }
    }

    /// Returns the actual clearance when it is below `min_clearance`
    ///
    /// A pair violates iff `d² < (min + rA + rB)²`; touching at exactly the
    /// allowed distance is legal. The actual clearance is
    /// `max(0, d - rA - rB)` truncated to board units.
    pub fn check_clearance(&self, other: &Shape, min_clearance: Coord) -> Option<Coord> {
        let radii = self.radius + other.radius;
        let allowed = (min_clearance + radii) as Ecoord;
        if allowed <= 0 {
            return None;
        }
        let d2 = self.squared_core_distance(other);
        if d2 >= allowed * allowed {
            return None;
        }
        let actual = (d2 as f64).sqrt() - radii as f64;
        Some(actual.max(0.0) as Coord)
    }

    /// Polygonal outline of the inflated shape
    pub fn to_polygon(&self, max_error: Coord) -> PolySet {
        match &self.core {
            Core::Point(p) => PolySet::from_outline(flatten_circle(*p, self.radius, max_error)),
            Core::Segment(s) => PolySet::from_outline(stadium(s, self.radius, max_error)),
            Core::Chain(segs) => PolySet::new(
                segs.iter()
                    .map(|s| Polygon::new(stadium(s, self.radius, max_error)))
                    .collect(),
            ),
            Core::Area(polys) if self.radius == 0 => polys.clone(),
            Core::Area(polys) => PolySet::new(
                polys
                    .polygons
                    .iter()
                    .map(|p| Polygon::new(inflate_convex(&p.outline.points, self.radius, max_error)))
                    .collect(),
            ),
        }
    }
}

/// Round-ended outline around a segment
fn stadium(seg: &Seg, radius: Coord, max_error: Coord) -> Vec<Point> {
    if seg.a == seg.b {
        return flatten_circle(seg.a, radius, max_error);
    }
    let dx = (seg.b.x - seg.a.x) as f64;
    let dy = (seg.b.y - seg.a.y) as f64;
    let base = dy.atan2(dx).to_degrees();
    let half = super::arc_segment_count(radius, max_error, 180.0);
    let mut points = Vec::with_capacity(2 * half + 2);
    for (center, start) in [(seg.b, base - 90.0), (seg.a, base + 90.0)] {
        for i in 0..=half {
            let a = (start + 180.0 * i as f64 / half as f64).to_radians();
            points.push(Point::new(
                center.x + (radius as f64 * a.cos()).round() as Coord,
                center.y + (radius as f64 * a.sin()).round() as Coord,
            ));
        }
    }
    points.dedup();
    points
}

/// Outward offset of a convex ring with rounded corners
fn inflate_convex(ring: &[Point], radius: Coord, max_error: Coord) -> Vec<Point> {
    let n = ring.len();
    if n == 0 {
        return Vec::new();
    }
    let mut distinct: Vec<Point> = ring.to_vec();
    distinct.dedup();
    if distinct.len() == 1 {
        return flatten_circle(distinct[0], radius, max_error);
    }
    if distinct.len() == 2 {
        return stadium(&Seg::new(distinct[0], distinct[1]), radius, max_error);
    }
    let area2: Ecoord = (0..distinct.len())
        .map(|i| distinct[i].cross(distinct[(i + 1) % distinct.len()]))
        .sum();
    if area2 < 0 {
        distinct.reverse();
    }
    let n = distinct.len();
    let r = radius as f64;
    let mut points = Vec::new();
    for i in 0..n {
        let prev = distinct[(i + n - 1) % n];
        let corner = distinct[i];
        let next = distinct[(i + 1) % n];
        // Outward normals of the incoming and outgoing edges (ccw ring)
        let n_in = edge_normal(prev, corner);
        let n_out = edge_normal(corner, next);
        let a0 = n_in.1.atan2(n_in.0);
        let mut a1 = n_out.1.atan2(n_out.0);
        while a1 < a0 {
            a1 += 2.0 * std::f64::consts::PI;
        }
        let sweep = a1 - a0;
        let count = super::arc_segment_count(radius, max_error, sweep.to_degrees()).max(1);
        for k in 0..=count {
            let a = a0 + sweep * k as f64 / count as f64;
            points.push(Point::new(
                corner.x + (r * a.cos()).round() as Coord,
                corner.y + (r * a.sin()).round() as Coord,
            ));
        }
    }
    points.dedup();
    points
}

fn edge_normal(a: Point, b: Point) -> (f64, f64) {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let len = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
    (dy / len, -dx / len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_tracks_actual_clearance() {
        // Width 10, centre lines 14 apart: 4 units of copper gap
        let a = Shape::segment(Seg::new(Point::new(0, 0), Point::new(100, 0)), 10);
        let b = Shape::segment(Seg::new(Point::new(0, 14), Point::new(100, 14)), 10);
        assert_eq!(a.check_clearance(&b, 5), Some(4));
        assert_eq!(a.check_clearance(&b, 4), None, "equality is legal");
    }

    #[test]
    fn test_circle_inside_area() {
        let area = Shape::area(
            PolySet::from_outline(vec![
                Point::new(0, 0),
                Point::new(100, 0),
                Point::new(100, 100),
                Point::new(0, 100),
            ]),
            0,
        );
        let via = Shape::circle(Point::new(50, 50), 5);
        assert_eq!(area.check_clearance(&via, 1), Some(0));
    }

    #[test]
    fn test_zero_allowed_never_violates() {
        let a = Shape::circle(Point::new(0, 0), 0);
        let b = Shape::circle(Point::new(0, 0), 0);
        assert_eq!(a.check_clearance(&b, 0), None);
    }

    #[test]
    fn test_inflated_rect_polygon_covers_radius() {
        let rect = Shape::area(
            PolySet::from_outline(vec![
                Point::new(-100_000, -50_000),
                Point::new(100_000, -50_000),
                Point::new(100_000, 50_000),
                Point::new(-100_000, 50_000),
            ]),
            20_000,
        );
        let poly = rect.to_polygon(1_000);
        let bbox = poly.bbox().unwrap();
        assert_eq!(bbox.max.x, 120_000);
        assert_eq!(bbox.min.y, -70_000);
    }
}
