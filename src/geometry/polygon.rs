//! Closed outlines, polygons with holes and polygon sets

use serde::{Deserialize, Serialize};

use super::{arc_segment_count, BBox, Coord, Ecoord, Point, Seg};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Containment {
    Inside,
    OnEdge,
    Outside,
}

/// Closed ring of points; the last point joins back to the first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineChain {
    pub points: Vec<Point>,
}

impl LineChain {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n => n,
        }
    }

    pub fn segment(&self, index: usize) -> Seg {
        let n = self.points.len();
        Seg::new(self.points[index], self.points[(index + 1) % n])
    }

    pub fn segments(&self) -> impl Iterator<Item = Seg> + '_ {
        (0..self.segment_count()).map(move |i| self.segment(i))
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(self.points.iter().copied())
    }

    /// Twice the signed area; positive for counter-clockwise rings
    pub fn signed_area2(&self) -> Ecoord {
        let n = self.points.len();
        (0..n)
            .map(|i| self.points[i].cross(self.points[(i + 1) % n]))
            .sum()
    }

    fn classify(&self, p: Point) -> Containment {
        if self.points.is_empty() {
            return Containment::Outside;
        }
        if self.segments().any(|s| s.contains_point(p)) || self.points.len() == 1 && self.points[0] == p {
            return Containment::OnEdge;
        }
        let mut inside = false;
        for s in self.segments() {
            let (a, b) = (s.a, s.b);
            if (a.y > p.y) != (b.y > p.y) {
                let t = (p.y - a.y) as Ecoord * (b.x - a.x) as Ecoord;
                let dy = (b.y - a.y) as Ecoord;
                let lhs = (p.x - a.x) as Ecoord * dy;
                let crosses = if dy > 0 { lhs < t } else { lhs > t };
                if crosses {
                    inside = !inside;
                }
            }
        }
        if inside {
            Containment::Inside
        } else {
            Containment::Outside
        }
    }

    /// Inside or on the boundary
    pub fn contains(&self, p: Point) -> bool {
        self.classify(p) != Containment::Outside
    }

    /// Strictly inside, boundary excluded
    pub fn strictly_contains(&self, p: Point) -> bool {
        self.classify(p) == Containment::Inside
    }

    /// Cut every convex corner by `distance` along both edges
    pub fn chamfered(&self, distance: Coord) -> LineChain {
        self.smoothed(|prev, corner, next, out| {
            let d1 = corner.distance(prev);
            let d2 = corner.distance(next);
            let d = (distance as f64).min(d1 / 2.0).min(d2 / 2.0);
            out.push(towards(corner, prev, d / d1));
            out.push(towards(corner, next, d / d2));
        })
    }

    /// Replace every corner by a tangent arc of `radius`
    pub fn filleted(&self, radius: Coord, max_error: Coord) -> LineChain {
        self.smoothed(|prev, corner, next, out| {
            let d1 = corner.distance(prev);
            let d2 = corner.distance(next);
            let u1 = ((prev.x - corner.x) as f64 / d1, (prev.y - corner.y) as f64 / d1);
            let u2 = ((next.x - corner.x) as f64 / d2, (next.y - corner.y) as f64 / d2);
            let cos_theta = (u1.0 * u2.0 + u1.1 * u2.1).clamp(-1.0, 1.0);
            let theta = cos_theta.acos();
            let half = theta / 2.0;
            if half.tan().abs() < f64::EPSILON {
                out.push(corner);
                return;
            }
            // Shrink the radius when the edges are too short for the tangent points
            let mut r = radius as f64;
            let mut tangent = r / half.tan();
            let limit = (d1 / 2.0).min(d2 / 2.0);
            if tangent > limit {
                tangent = limit;
                r = tangent * half.tan();
            }
            let center_dist = r / half.sin();
            let bis = (u1.0 + u2.0, u1.1 + u2.1);
            let bis_len = (bis.0 * bis.0 + bis.1 * bis.1).sqrt();
            if bis_len < f64::EPSILON {
                out.push(corner);
                return;
            }
            let center = (
                corner.x as f64 + bis.0 / bis_len * center_dist,
                corner.y as f64 + bis.1 / bis_len * center_dist,
            );
            let t1 = (corner.x as f64 + u1.0 * tangent, corner.y as f64 + u1.1 * tangent);
            let t2 = (corner.x as f64 + u2.0 * tangent, corner.y as f64 + u2.1 * tangent);
            let a1 = (t1.1 - center.1).atan2(t1.0 - center.0);
            let a2 = (t2.1 - center.1).atan2(t2.0 - center.0);
            let mut sweep = a2 - a1;
            while sweep > std::f64::consts::PI {
                sweep -= 2.0 * std::f64::consts::PI;
            }
            while sweep < -std::f64::consts::PI {
                sweep += 2.0 * std::f64::consts::PI;
            }
            let count = arc_segment_count(r.round() as Coord, max_error, sweep.to_degrees()).max(1);
            for i in 0..=count {
                let a = a1 + sweep * i as f64 / count as f64;
                out.push(Point::new(
                    (center.0 + r * a.cos()).round() as Coord,
                    (center.1 + r * a.sin()).round() as Coord,
                ));
            }
        })
    }

    fn smoothed<F>(&self, mut corner_fn: F) -> LineChain
    where
        F: FnMut(Point, Point, Point, &mut Vec<Point>),
    {
        let n = self.points.len();
        if n < 3 {
            return self.clone();
        }
        let mut out = Vec::with_capacity(n * 2);
        for i in 0..n {
            let prev = self.points[(i + n - 1) % n];
            let corner = self.points[i];
            let next = self.points[(i + 1) % n];
            if prev == corner || next == corner || (prev - corner).cross(next - corner) == 0 {
                out.push(corner);
                continue;
            }
            corner_fn(prev, corner, next, &mut out);
        }
        out.dedup();
        LineChain::new(out)
    }
}

fn towards(from: Point, to: Point, t: f64) -> Point {
    Point::new(
        from.x + ((to.x - from.x) as f64 * t).round() as Coord,
        from.y + ((to.y - from.y) as f64 * t).round() as Coord,
    )
}

/// Outline with optional holes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub outline: LineChain,
    #[serde(default)]
    pub holes: Vec<LineChain>,
}

impl Polygon {
    pub fn new(outline: Vec<Point>) -> Self {
        Self { outline: LineChain::new(outline), holes: Vec::new() }
    }

    pub fn with_holes(outline: LineChain, holes: Vec<LineChain>) -> Self {
        Self { outline, holes }
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.outline.bbox()
    }

    /// Inside the outline and not strictly inside any hole (boundaries count as inside)
    pub fn contains(&self, p: Point) -> bool {
        self.outline.contains(p) && !self.holes.iter().any(|h| h.strictly_contains(p))
    }

    pub fn strictly_contains(&self, p: Point) -> bool {
        self.outline.strictly_contains(p) && !self.holes.iter().any(|h| h.contains(p))
    }

    /// Every edge, outline first, then each hole
    pub fn segments(&self) -> impl Iterator<Item = Seg> + '_ {
        self.outline
            .segments()
            .chain(self.holes.iter().flat_map(|h| h.segments()))
    }

    pub fn vertices(&self) -> impl Iterator<Item = Point> + '_ {
        self.outline
            .points
            .iter()
            .copied()
            .chain(self.holes.iter().flat_map(|h| h.points.iter().copied()))
    }
}

/// A set of polygons, e.g. the filled area of a zone
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolySet {
    pub polygons: Vec<Polygon>,
}

impl PolySet {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn from_outline(points: Vec<Point>) -> Self {
        Self { polygons: vec![Polygon::new(points)] }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.iter().all(|p| p.outline.is_empty())
    }

    pub fn outline_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(self.vertices())
    }

    pub fn contains(&self, p: Point) -> bool {
        self.polygons.iter().any(|poly| poly.contains(p))
    }

    pub fn strictly_contains(&self, p: Point) -> bool {
        self.polygons.iter().any(|poly| poly.strictly_contains(p))
    }

    pub fn segments(&self) -> impl Iterator<Item = Seg> + '_ {
        self.polygons.iter().flat_map(|p| p.segments())
    }

    pub fn vertices(&self) -> impl Iterator<Item = Point> + '_ {
        self.polygons.iter().flat_map(|p| p.vertices())
    }

    /// Squared distance from a point to the filled area (0 inside)
    pub fn squared_distance_point(&self, p: Point) -> Ecoord {
        if self.contains(p) {
            return 0;
        }
        self.segments()
            .map(|s| s.squared_distance_point(p))
            .min()
            .unwrap_or(Ecoord::MAX)
    }

    /// Squared distance from a segment to the filled area (0 when touching or inside)
    pub fn squared_distance_seg(&self, seg: &Seg) -> Ecoord {
        if self.contains(seg.a) || self.contains(seg.b) {
            return 0;
        }
        self.segments()
            .map(|s| s.squared_distance(seg))
            .min()
            .unwrap_or(Ecoord::MAX)
    }

    /// Squared distance between two filled areas (0 when they overlap)
    pub fn squared_distance_polyset(&self, other: &PolySet) -> Ecoord {
        if other.vertices().any(|v| self.contains(v)) || self.vertices().any(|v| other.contains(v)) {
            return 0;
        }
        let mut best = Ecoord::MAX;
        for a in self.segments() {
            for b in other.segments() {
                best = best.min(a.squared_distance(&b));
                if best == 0 {
                    return 0;
                }
            }
        }
        best
    }

    /// A representative point where the two areas overlap, if they do
    ///
    /// Looks for proper edge crossings first, then vertices strictly inside
    /// the other area, then a shared interior point for coincident outlines.
    /// Outlines that only touch along their boundary do not overlap.
    pub fn intersection_point(&self, other: &PolySet) -> Option<Point> {
        let other_bbox = other.bbox()?;
        let self_bbox = self.bbox()?;
        if !self_bbox.intersects(&other_bbox) {
            return None;
        }
        for a in self.segments() {
            for b in other.segments() {
                if let Some(p) = a.proper_crossing(&b) {
                    return Some(p);
                }
            }
        }
        if let Some(v) = self.vertices().find(|v| other.strictly_contains(*v)) {
            return Some(v);
        }
        if let Some(v) = other.vertices().find(|v| self.strictly_contains(*v)) {
            return Some(v);
        }
        self.polygons
            .iter()
            .filter_map(|poly| poly.bbox())
            .map(|b| b.center())
            .find(|c| self.strictly_contains(*c) && other.strictly_contains(*c))
    }

    pub fn chamfered(&self, distance: Coord) -> PolySet {
        self.map_rings(|ring| ring.chamfered(distance))
    }

    pub fn filleted(&self, radius: Coord, max_error: Coord) -> PolySet {
        self.map_rings(|ring| ring.filleted(radius, max_error))
    }

    fn map_rings<F: Fn(&LineChain) -> LineChain>(&self, f: F) -> PolySet {
        PolySet {
            polygons: self
                .polygons
                .iter()
                .map(|p| Polygon {
                    outline: f(&p.outline),
                    holes: p.holes.iter().map(&f).collect(),
                })
                .collect(),
        }
    }
}
