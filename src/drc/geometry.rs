//! Geometry extraction for DRC
//!
//! Converts board items into clearance shapes (core + radius) so every
//! tester shares one distance primitive.

use crate::board::{DrillShape, Graphic, Pad, PadShape, Text, Track};
use crate::geometry::{rect_outline, Coord, Core, Point, PolySet, Seg, Shape, ARC_HIGH_DEF};

/// Track: segment of its width. Via: circle of its diameter.
pub fn get_track_shape(track: &Track) -> Shape {
    if track.is_via() {
        Shape::circle(track.start, track.width / 2)
    } else {
        Shape::segment(track.seg(), track.width)
    }
}

/// Round-ended segment of `size` centred on `center`, long axis rotated by `angle`
fn oval_shape(center: Point, width: Coord, height: Coord, angle: f64) -> Shape {
    if width == height {
        return Shape::circle(center, width / 2);
    }
    let (half_len, radius, axis) = if width > height {
        ((width - height) / 2, height / 2, Point::new(1, 0))
    } else {
        ((height - width) / 2, width / 2, Point::new(0, 1))
    };
    let delta = Point::new(axis.x * half_len, axis.y * half_len).rotated(angle);
    Shape {
        core: Core::Segment(Seg::new(center - delta, center + delta)),
        radius,
    }
}

/// Copper shape of a pad
pub fn get_pad_shape(pad: &Pad) -> Shape {
    let center = pad.shape_position();
    let (w, h) = (pad.size.width, pad.size.height);
    match &pad.shape {
        PadShape::Circle => Shape::circle(center, w / 2),
        PadShape::Oval => oval_shape(center, w, h, pad.orientation),
        PadShape::Rect => Shape::area(
            PolySet::from_outline(rect_outline(center, w, h, pad.orientation)),
            0,
        ),
        PadShape::RoundRect { radius_ratio } => {
            let r = ((w.min(h) as f64) * radius_ratio.clamp(0.0, 0.5)).round() as Coord;
            let inner = rect_outline(center, w - 2 * r, h - 2 * r, pad.orientation);
            Shape::area(PolySet::from_outline(inner), r)
        }
        PadShape::Custom { outline } => Shape::area(
            PolySet::from_outline(
                outline
                    .iter()
                    .map(|p| p.rotated(pad.orientation) + center)
                    .collect(),
            ),
            0,
        ),
    }
}

/// Synthetic pad shaped like the pad's drill hole
pub fn get_hole_shape(pad: &Pad) -> Option<Shape> {
    if !pad.has_hole() {
        return None;
    }
    let shape = match pad.drill_shape {
        DrillShape::Circle => Shape::circle(pad.position, pad.drill.width / 2),
        DrillShape::Oval => {
            let h = if pad.drill.height > 0 { pad.drill.height } else { pad.drill.width };
            oval_shape(pad.position, pad.drill.width, h, pad.orientation)
        }
    };
    Some(shape)
}

/// Pad outline as polygons (arcs flattened)
pub fn get_pad_polygon(pad: &Pad) -> PolySet {
    get_pad_shape(pad).to_polygon(ARC_HIGH_DEF)
}

/// Radius of the smallest circle around the pad position containing the pad
pub fn get_pad_bounding_radius(pad: &Pad) -> Coord {
    let shape = get_pad_shape(pad);
    let pos = pad.position;
    let far = |p: Point| pos.distance(p).ceil() as Coord;
    let core_radius = match &shape.core {
        Core::Point(p) => far(*p),
        Core::Segment(s) => far(s.a).max(far(s.b)),
        Core::Chain(segs) => segs.iter().map(|s| far(s.a).max(far(s.b))).max().unwrap_or(0),
        Core::Area(polys) => polys.vertices().map(far).max().unwrap_or(0),
    };
    core_radius + shape.radius
}

pub fn get_graphic_shape(graphic: &Graphic) -> Shape {
    Shape::chain(graphic.segments(), graphic.width)
}

pub fn get_text_shape(text: &Text) -> Shape {
    let strokes = if text.strokes.is_empty() {
        vec![Seg::new(text.position, text.position)]
    } else {
        text.strokes.clone()
    };
    Shape::chain(strokes, text.pen_width)
}
