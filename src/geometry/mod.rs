//! Geometry primitives for clearance checking
//!
//! All coordinates are integer board units (1 unit = 1 nm). Distance queries
//! return squared distances in a widened integer type so that comparisons
//! against `(clearance + half widths)²` never need a square root.
//!
//! # Submodules
//! - `point` - Points, bounding boxes, unit conversion
//! - `seg` - Segments and segment/segment distance
//! - `polygon` - Closed outlines with holes, containment and distance
//! - `shape` - Inflated clearance shapes (point / segment / chain / area + radius)
//! - `arc` - Arc, circle and bezier flattening
//! - `contours` - Chaining loose outline segments into closed polygons

mod point;
mod seg;
mod polygon;
mod shape;
mod arc;
mod contours;

pub use point::{
    Coord, Ecoord, Point, BBox,
    IU_PER_MM, IU_PER_MIL, mm_to_iu, mils_to_iu,
};

pub use seg::Seg;

pub use polygon::{LineChain, Polygon, PolySet};

pub use shape::{Core, Shape};

pub use arc::{
    ARC_HIGH_DEF,
    arc_segment_count,
    flatten_arc,
    flatten_circle,
    flatten_bezier,
    rect_outline,
};

pub use contours::{CHAINING_EPSILON, build_closed_contours};
