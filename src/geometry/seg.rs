//! Line segments and exact integer distance queries

use serde::{Deserialize, Serialize};

use super::{BBox, Coord, Ecoord, Point};

/// A straight segment from `a` to `b`. Degenerate segments (a == b) behave as points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seg {
    pub a: Point,
    pub b: Point,
}

/// Sign of the turn a -> b -> c
fn orientation(a: Point, b: Point, c: Point) -> i32 {
    let v = (b - a).cross(c - a);
    v.signum() as i32
}

/// c lies within the bounding box of a..b (used for collinear cases)
fn within_span(a: Point, b: Point, c: Point) -> bool {
    c.x >= a.x.min(b.x) && c.x <= a.x.max(b.x) && c.y >= a.y.min(b.y) && c.y <= a.y.max(b.y)
}

/// `value * num / den` rounded to nearest, for |num| <= den
fn rescale(value: Coord, num: Ecoord, den: Ecoord) -> Coord {
    let prod = value as Ecoord * num;
    let half = den / 2;
    let r = if (prod < 0) != (den < 0) {
        (prod - half) / den
    } else {
        (prod + half) / den
    };
    r as Coord
}

impl Seg {
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    pub fn squared_length(&self) -> Ecoord {
        self.a.squared_distance(self.b)
    }

    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    pub fn center(&self) -> Point {
        self.a.midpoint(self.b)
    }

    pub fn bbox(&self) -> BBox {
        let mut bbox = BBox::from_point(self.a);
        bbox.merge_point(self.b);
        bbox
    }

    /// Closest point on the segment to `p`
    pub fn nearest_point(&self, p: Point) -> Point {
        let d = self.b - self.a;
        let l2 = d.squared_norm();
        if l2 == 0 {
            return self.a;
        }
        let t = (p - self.a).dot(d);
        if t <= 0 {
            return self.a;
        }
        if t >= l2 {
            return self.b;
        }
        Point::new(
            self.a.x + rescale(d.x, t, l2),
            self.a.y + rescale(d.y, t, l2),
        )
    }

    /// Squared distance from `p` to the segment, floored to an integer
    ///
    /// Computed from the perpendicular cross product rather than the rounded
    /// nearest point.
    pub fn squared_distance_point(&self, p: Point) -> Ecoord {
        let d = self.b - self.a;
        let l2 = d.squared_norm();
        if l2 == 0 {
            return self.a.squared_distance(p);
        }
        let t = (p - self.a).dot(d);
        if t <= 0 {
            return self.a.squared_distance(p);
        }
        if t >= l2 {
            return self.b.squared_distance(p);
        }
        let c = d.cross(p - self.a);
        // floor(c² / l2) < n² exactly when the true distance is below n
        (c * c) / l2
    }

    pub fn contains_point(&self, p: Point) -> bool {
        orientation(self.a, self.b, p) == 0 && within_span(self.a, self.b, p)
    }

    /// True when the two segments share at least one point
    pub fn intersects(&self, other: &Seg) -> bool {
        let o1 = orientation(self.a, self.b, other.a);
        let o2 = orientation(self.a, self.b, other.b);
        let o3 = orientation(other.a, other.b, self.a);
        let o4 = orientation(other.a, other.b, self.b);

        if o1 != o2 && o3 != o4 && o1 * o2 <= 0 && o3 * o4 <= 0 {
            return true;
        }
        (o1 == 0 && within_span(self.a, self.b, other.a))
            || (o2 == 0 && within_span(self.a, self.b, other.b))
            || (o3 == 0 && within_span(other.a, other.b, self.a))
            || (o4 == 0 && within_span(other.a, other.b, self.b))
    }

    /// A point common to both segments, if any
    pub fn intersection(&self, other: &Seg) -> Option<Point> {
        if !self.intersects(other) {
            return None;
        }
        for p in [other.a, other.b] {
            if self.contains_point(p) {
                return Some(p);
            }
        }
        for p in [self.a, self.b] {
            if other.contains_point(p) {
                return Some(p);
            }
        }
        Some(self.line_crossing(other))
    }

    /// Crossing point where neither segment ends on the other
    pub fn proper_crossing(&self, other: &Seg) -> Option<Point> {
        let o1 = orientation(self.a, self.b, other.a);
        let o2 = orientation(self.a, self.b, other.b);
        let o3 = orientation(other.a, other.b, self.a);
        let o4 = orientation(other.a, other.b, self.b);
        if o1 * o2 < 0 && o3 * o4 < 0 {
            Some(self.line_crossing(other))
        } else {
            None
        }
    }

    fn line_crossing(&self, other: &Seg) -> Point {
        let r = self.b - self.a;
        let s = other.b - other.a;
        let denom = r.cross(s);
        if denom == 0 {
            return self.a;
        }
        let t = (other.a - self.a).cross(s);
        Point::new(
            self.a.x + rescale(r.x, t, denom),
            self.a.y + rescale(r.y, t, denom),
        )
    }

    /// Exact squared distance between two segments (0 when they touch or cross)
    pub fn squared_distance(&self, other: &Seg) -> Ecoord {
        if self.intersects(other) {
            return 0;
        }
        self.squared_distance_point(other.a)
            .min(self.squared_distance_point(other.b))
            .min(other.squared_distance_point(self.a))
            .min(other.squared_distance_point(self.b))
    }

    /// Squared distance plus a representative contact point
    ///
    /// The contact point is the crossing point when the segments intersect,
    /// otherwise the midpoint of the closest pair of points.
    pub fn closest_approach(&self, other: &Seg) -> (Ecoord, Point) {
        if let Some(p) = self.intersection(other) {
            return (0, p);
        }
        let candidates = [
            (self.squared_distance_point(other.a), self.nearest_point(other.a), other.a),
            (self.squared_distance_point(other.b), self.nearest_point(other.b), other.b),
            (other.squared_distance_point(self.a), self.a, other.nearest_point(self.a)),
            (other.squared_distance_point(self.b), self.b, other.nearest_point(self.b)),
        ];
        let mut best = candidates[0];
        for c in &candidates[1..] {
            if c.0 < best.0 {
                best = *c;
            }
        }
        (best.0, best.1.midpoint(best.2))
    }
}
