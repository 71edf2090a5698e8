//! Integer points and axis-aligned bounding boxes

use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};

/// Board coordinate, 1 unit = 1 nm
pub type Coord = i64;

/// Widened type for squared distances and cross products
pub type Ecoord = i128;

pub const IU_PER_MM: f64 = 1_000_000.0;
pub const IU_PER_MIL: f64 = 25_400.0;

pub fn mm_to_iu(mm: f64) -> Coord {
    (mm * IU_PER_MM).round() as Coord
}

pub fn mils_to_iu(mils: f64) -> Coord {
    (mils * IU_PER_MIL).round() as Coord
}

/// A 2D point in board units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Integer midpoint, truncating toward zero like the board's native point math
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2, (self.y + other.y) / 2)
    }

    pub fn squared_norm(self) -> Ecoord {
        let x = self.x as Ecoord;
        let y = self.y as Ecoord;
        x * x + y * y
    }

    pub fn squared_distance(self, other: Point) -> Ecoord {
        (other - self).squared_norm()
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.squared_distance(other) as f64).sqrt()
    }

    pub fn dot(self, other: Point) -> Ecoord {
        self.x as Ecoord * other.x as Ecoord + self.y as Ecoord * other.y as Ecoord
    }

    pub fn cross(self, other: Point) -> Ecoord {
        self.x as Ecoord * other.y as Ecoord - self.y as Ecoord * other.x as Ecoord
    }

    /// Rotate around the origin (counter-clockwise, degrees), rounding to the grid
    pub fn rotated(self, angle_deg: f64) -> Point {
        if angle_deg == 0.0 {
            return self;
        }
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let x = self.x as f64;
        let y = self.y as f64;
        Point::new(
            (x * cos - y * sin).round() as Coord,
            (x * sin + y * cos).round() as Coord,
        )
    }

    pub fn rotated_about(self, center: Point, angle_deg: f64) -> Point {
        (self - center).rotated(angle_deg) + center
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Axis-aligned bounding box (inclusive on all sides)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn from_point(p: Point) -> Self {
        Self { min: p, max: p }
    }

    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = BBox::from_point(first);
        for p in iter {
            bbox.merge_point(p);
        }
        Some(bbox)
    }

    pub fn merge_point(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn merge(&mut self, other: &BBox) {
        self.merge_point(other.min);
        self.merge_point(other.max);
    }

    pub fn inflated(self, d: Coord) -> BBox {
        BBox {
            min: Point::new(self.min.x - d, self.min.y - d),
            max: Point::new(self.max.x + d, self.max.y + d),
        }
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(self.max)
    }

    pub fn width(&self) -> Coord {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> Coord {
        self.max.y - self.min.y
    }

    /// Corners in counter-clockwise order starting at `min`
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ]
    }

    /// Squared distance from the filled box to a segment (0 when touching or inside)
    pub fn squared_distance_seg(&self, seg: &super::Seg) -> Ecoord {
        if self.contains(seg.a) || self.contains(seg.b) {
            return 0;
        }
        let c = self.corners();
        (0..4)
            .map(|i| super::Seg::new(c[i], c[(i + 1) % 4]).squared_distance(seg))
            .min()
            .unwrap_or(0)
    }

    /// True when the segment comes within `clearance` of the box
    pub fn collides_seg(&self, seg: &super::Seg, clearance: Coord) -> bool {
        let c = clearance.max(0) as Ecoord;
        self.squared_distance_seg(seg) <= c * c
    }
}
