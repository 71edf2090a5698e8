//! Copper graphics and texts
//!
//! Lines, arcs, polygons and stroked texts drawn on copper layers are
//! conductors too. Tracks, vias and pads on the same layer must keep their
//! clearance from them.

use std::time::Instant;

use crate::board::{BoardItem, Drawing, Footprint, Graphic, ItemId, LayerId, Text};
use crate::geometry::{BBox, Seg, Shape};
use tracing::info;

use super::geometry::{get_graphic_shape, get_pad_shape, get_text_shape, get_track_shape};
use super::location::location_near_seg;
use super::{DrcContext, DrcErrorCode, DrcItem};

/// A graphic or text on a copper layer, reduced to stroked segments
struct CopperItem {
    id: ItemId,
    parent: Option<ItemId>,
    layer: LayerId,
    shape: Shape,
    segs: Vec<Seg>,
    bbox: BBox,
}

impl CopperItem {
    fn from_graphic(graphic: &Graphic) -> Self {
        let shape = get_graphic_shape(graphic);
        Self {
            id: graphic.id,
            parent: graphic.parent,
            layer: graphic.layer,
            segs: graphic.segments(),
            bbox: shape.bbox(),
            shape,
        }
    }

    fn from_text(text: &Text) -> Self {
        let shape = get_text_shape(text);
        let segs = match &shape.core {
            crate::geometry::Core::Chain(segs) => segs.clone(),
            _ => Vec::new(),
        };
        Self { id: text.id, parent: text.parent, layer: text.layer, segs, bbox: shape.bbox(), shape }
    }

    /// Item segment closest to `seg`, for marker placement
    fn closest_seg(&self, seg: &Seg) -> Option<&Seg> {
        self.segs.iter().min_by_key(|s| s.squared_distance(seg))
    }
}

fn copper_text(text: &Text) -> Option<CopperItem> {
    (text.visible && text.layer.is_copper()).then(|| CopperItem::from_text(text))
}

fn copper_graphic(graphic: &Graphic) -> Option<CopperItem> {
    graphic.layer.is_copper().then(|| CopperItem::from_graphic(graphic))
}

/// Reference and value always count; the other children of a net-tie
/// footprint are allowed to touch its pads
fn footprint_items(fp: &Footprint, out: &mut Vec<CopperItem>) {
    out.extend(copper_text(&fp.reference));
    out.extend(copper_text(&fp.value));
    if fp.net_tie {
        return;
    }
    out.extend(fp.texts.iter().filter_map(copper_text));
    out.extend(fp.graphics.iter().filter_map(copper_graphic));
}

fn collect_copper_items(ctx: &DrcContext) -> Vec<CopperItem> {
    let board = ctx.board;
    let mut items: Vec<CopperItem> = board
        .drawings
        .iter()
        .filter_map(|d| match d {
            Drawing::Graphic(g) => copper_graphic(g),
            Drawing::Text(t) => copper_text(t),
        })
        .collect();
    for fp in &board.footprints {
        footprint_items(fp, &mut items);
    }
    items
}

pub fn test_copper_graphics(ctx: &mut DrcContext) {
    let start = Instant::now();
    let before = ctx.marker_count();
    let items = collect_copper_items(ctx);

    for item in &items {
        test_copper_item_tracks(ctx, item);
        test_copper_item_pads(ctx, item);
    }

    info!(
        "[DRC] Copper graphics: {} items, {} violations in {:.2?}",
        items.len(),
        ctx.marker_count() - before,
        start.elapsed()
    );
}

fn test_copper_item_tracks(ctx: &mut DrcContext, item: &CopperItem) {
    let board = ctx.board;
    for track in board.tracks.iter().filter(|t| t.layers().contains(item.layer)) {
        let (clearance, source) = ctx.resolver.clearance(track, None);
        if !track.bbox().intersects(&item.bbox.inflated(clearance)) {
            continue;
        }
        let Some(actual) = get_track_shape(track).check_clearance(&item.shape, clearance) else {
            continue;
        };
        let code = if track.is_via() {
            DrcErrorCode::ViaNearCopper
        } else {
            DrcErrorCode::TrackNearCopper
        };
        let position = match item.closest_seg(&track.seg()) {
            Some(seg) => location_near_seg(track, seg),
            None => track.position(),
        };
        let message = ctx.clearance_message(code, &source, clearance, actual);
        ctx.emit(DrcItem::new(code).with_message(message).with_items(track.id, item.id), position);
    }
}

fn test_copper_item_pads(ctx: &mut DrcContext, item: &CopperItem) {
    let board = ctx.board;
    for pad_ref in board.pads() {
        let pad = pad_ref.pad;
        if !pad.layers.contains(item.layer) {
            continue;
        }
        // Footprint graphics are allowed to overlap their own pads
        if item.parent.is_some() && item.parent == pad.parent {
            continue;
        }
        let (clearance, source) = ctx.resolver.clearance(pad, None);
        let pad_shape = get_pad_shape(pad);
        if !pad_shape.bbox().intersects(&item.bbox.inflated(clearance)) {
            continue;
        }
        let Some(actual) = pad_shape.check_clearance(&item.shape, clearance) else {
            continue;
        };
        let code = DrcErrorCode::PadNearCopper;
        let message = ctx.clearance_message(code, &source, clearance, actual);
        ctx.emit(DrcItem::new(code).with_message(message).with_items(pad.id, item.id), pad.position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, GraphicShape, LayerSet, Pad, PadShape, Size, Track};
    use crate::drc::{Marker, RuleSet};
    use crate::geometry::{mm_to_iu, Point};
    use crate::units::EdaUnits;

    fn run(board: &Board) -> Vec<Marker> {
        let rules = RuleSet::default();
        let mut ctx = DrcContext::new(board, &rules, EdaUnits::Millimetres);
        test_copper_graphics(&mut ctx);
        ctx.take_markers()
    }

    fn copper_line(id: u64, layer: LayerId) -> Graphic {
        Graphic::new(
            id,
            layer,
            mm_to_iu(0.2),
            GraphicShape::Segment { start: Point::new(0, 0), end: Point::new(mm_to_iu(10.0), 0) },
        )
    }

    fn track_at(id: u64, y_mm: f64) -> Track {
        let y = mm_to_iu(y_mm);
        Track::segment(id, Point::new(0, y), Point::new(mm_to_iu(10.0), y), mm_to_iu(0.2), LayerId::F_CU, 1)
    }

    #[test]
    fn test_track_near_copper_line() {
        let mut board = Board::new();
        board.drawings.push(Drawing::Graphic(copper_line(1, LayerId::F_CU)));
        board.tracks = vec![track_at(2, 0.35), track_at(3, -0.5)];
        let markers = run(&board);
        assert_eq!(markers.len(), 1, "only the track 0.15 mm from the line is too close");
        assert_eq!(markers[0].code(), DrcErrorCode::TrackNearCopper);
        assert_eq!(
            markers[0].item.message,
            "Track too close to copper graphic or text ('Default' netclass clearance 0.2000 mm; actual 0.1500 mm)"
        );
        assert_eq!(markers[0].position.y, mm_to_iu(0.35));
    }

    #[test]
    fn test_non_copper_graphics_ignored() {
        let mut board = Board::new();
        board.drawings.push(Drawing::Graphic(copper_line(1, LayerId::F_SILKS)));
        board.tracks = vec![track_at(2, 0.0)];
        assert!(run(&board).is_empty());
    }

    #[test]
    fn test_via_near_copper_text() {
        let mut board = Board::new();
        let mut text = Text::new(1, "GND", Point::new(0, 0), LayerId::B_CU);
        text.pen_width = mm_to_iu(0.15);
        text.strokes = vec![Seg::new(Point::new(0, 0), Point::new(mm_to_iu(1.0), 0))];
        let mut hidden = text.clone();
        hidden.id = ItemId(2);
        hidden.visible = false;
        board.drawings.push(Drawing::Text(text));
        board.drawings.push(Drawing::Text(hidden));
        board.tracks = vec![Track::new_via(
            3,
            Point::new(mm_to_iu(0.5), mm_to_iu(0.5)),
            mm_to_iu(0.6),
            mm_to_iu(0.3),
            LayerId::F_CU,
            LayerId::B_CU,
            1,
        )];
        let markers = run(&board);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].code(), DrcErrorCode::ViaNearCopper);
        assert_eq!(markers[0].item.aux_item, Some(ItemId(1)));
    }

    fn footprint_with_pad_and_line(net_tie: bool) -> Footprint {
        let mut fp = Footprint::new(
            10,
            Text::new(11, "R1", Point::new(0, 0), LayerId::F_SILKS),
            Text::new(12, "10k", Point::new(0, 0), LayerId::F_FAB),
            Point::new(0, 0),
        );
        fp.net_tie = net_tie;
        fp.add_pad(Pad::new(
            13,
            "1",
            Point::new(0, mm_to_iu(0.5)),
            PadShape::Circle,
            Size::new(mm_to_iu(0.6), mm_to_iu(0.6)),
            LayerSet::single(LayerId::F_CU),
        ));
        fp.add_graphic(copper_line(14, LayerId::F_CU));
        fp
    }

    #[test]
    fn test_pad_near_graphic_of_other_footprint() {
        let mut board = Board::new();
        board.add_footprint(footprint_with_pad_and_line(false));
        assert!(run(&board).is_empty(), "a footprint's own graphic may touch its pads");

        board.drawings.push(Drawing::Graphic(copper_line(20, LayerId::F_CU)));
        let markers = run(&board);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].code(), DrcErrorCode::PadNearCopper);
        assert_eq!(markers[0].position, Point::new(0, mm_to_iu(0.5)));
    }

    #[test]
    fn test_net_tie_graphics_skipped() {
        let mut board = Board::new();
        board.add_footprint(footprint_with_pad_and_line(true));
        board.tracks = vec![track_at(2, 0.3)];
        let markers = run(&board);
        assert!(markers.iter().all(|m| m.code() != DrcErrorCode::TrackNearCopper));
    }
}
