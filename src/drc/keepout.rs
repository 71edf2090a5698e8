//! Keepout areas
//!
//! Every keepout, on the board or inside a footprint, is tested against the
//! item kinds it forbids. Touching a keepout counts as being inside it.

use std::time::Instant;

use crate::board::{BoardSide, Footprint, LayerSet, Zone};
use crate::geometry::{BBox, Ecoord};
use tracing::info;

use super::geometry::{get_pad_bounding_radius, get_pad_polygon};
use super::location::location_in_zone;
use super::{DrcContext, DrcErrorCode, DrcItem};

pub fn test_keepout_areas(ctx: &mut DrcContext) {
    let start = Instant::now();
    let before = ctx.marker_count();
    let board = ctx.board;
    let mut areas = 0;

    for area in board.all_zones().filter(|z| z.is_keepout()) {
        areas += 1;
        test_keepout_tracks(ctx, area);
        test_keepout_footprints(ctx, area);
    }

    info!(
        "[DRC] Keepouts: {} areas, {} violations in {:.2?}",
        areas,
        ctx.marker_count() - before,
        start.elapsed()
    );
}

fn test_keepout_tracks(ctx: &mut DrcContext, area: &Zone) {
    let rules = area.keepout_rules();
    let board = ctx.board;

    for track in &board.tracks {
        let radius = (track.width / 2) as Ecoord;
        match &track.via {
            None => {
                if !rules.no_tracks || !area.layers.contains(track.layer) {
                    continue;
                }
                if area.outline.squared_distance_seg(&track.seg()) <= radius * radius {
                    let item = DrcItem::new(DrcErrorCode::TrackInsideKeepout).with_items(track.id, area.id);
                    ctx.emit(item, location_in_zone(track, area));
                }
            }
            Some(via) => {
                let via_layers = LayerSet::copper_span(track.layer, via.bottom_layer);
                if !rules.no_vias || !area.layers.intersects(&via_layers) {
                    continue;
                }
                if area.outline.squared_distance_point(track.start) <= radius * radius {
                    let item = DrcItem::new(DrcErrorCode::ViaInsideKeepout).with_items(track.id, area.id);
                    ctx.emit(item, location_in_zone(track, area));
                }
            }
        }
    }
}

fn test_keepout_footprints(ctx: &mut DrcContext, area: &Zone) {
    let rules = area.keepout_rules();
    if !rules.no_pads && !rules.no_footprints {
        return;
    }
    let board = ctx.board;
    let Some(area_bbox) = area.outline.bbox() else {
        return;
    };
    let check_front = area.layers.intersects(&LayerSet::front_mask());
    let check_back = area.layers.intersects(&LayerSet::back_mask());

    for fp in &board.footprints {
        // A footprint's own keepouts constrain the rest of the board, not itself
        if area.parent == Some(fp.id) {
            continue;
        }

        let side_checked = if fp.flipped { check_back } else { check_front };
        if rules.no_footprints && side_checked && area_bbox.intersects(&fp.bbox()) {
            test_footprint_inside(ctx, area, fp);
        }

        if rules.no_pads {
            for pad in &fp.pads {
                if !area.layers.intersects(&pad.layers) {
                    continue;
                }
                let pad_bbox = BBox::from_point(pad.shape_position()).inflated(get_pad_bounding_radius(pad));
                if !area_bbox.intersects(&pad_bbox) {
                    continue;
                }
                if let Some(pt) = get_pad_polygon(pad).intersection_point(&area.outline) {
                    let item = DrcItem::new(DrcErrorCode::PadInsideKeepout).with_items(pad.id, area.id);
                    ctx.emit(item, pt);
                }
            }
        }
    }
}

/// Courtyard of the footprint's side, or its bounding box when it has none
fn test_footprint_inside(ctx: &mut DrcContext, area: &Zone, fp: &Footprint) {
    let side = if fp.flipped { BoardSide::Back } else { BoardSide::Front };
    let outline = match fp.courtyard(side) {
        Ok(courtyard) if !courtyard.is_empty() => courtyard,
        _ => fp.bounding_poly(),
    };
    if let Some(pt) = outline.intersection_point(&area.outline) {
        let item = DrcItem::new(DrcErrorCode::FootprintInsideKeepout).with_items(fp.id, area.id);
        ctx.emit(item, pt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, KeepoutRules, LayerId, Pad, PadShape, Size, Text, Track};
    use crate::drc::{Marker, RuleSet};
    use crate::geometry::{Coord, Point};
    use crate::units::EdaUnits;

    fn keepout(rules: KeepoutRules) -> Zone {
        Zone::new_keepout(
            100,
            LayerSet::all_copper(),
            vec![Point::new(0, 0), Point::new(1_000, 0), Point::new(1_000, 1_000), Point::new(0, 1_000)],
            rules,
        )
    }

    fn run(board: &Board) -> Vec<Marker> {
        let rules = RuleSet::default();
        let mut ctx = DrcContext::new(board, &rules, EdaUnits::Millimetres);
        test_keepout_areas(&mut ctx);
        ctx.take_markers()
    }

    fn via(id: u64, x: Coord) -> Track {
        Track::new_via(id, Point::new(x, 500), 10, 4, LayerId::F_CU, LayerId::B_CU, 1)
    }

    #[test]
    fn test_via_inside_keepout() {
        let mut board = Board::new();
        board.zones.push(keepout(KeepoutRules { no_vias: true, ..Default::default() }));
        // 2 units inside the left edge, 3 units outside, 6 units outside
        board.tracks = vec![via(1, 2), via(2, -3), via(3, -6)];
        let markers = run(&board);
        assert_eq!(markers.len(), 2);
        assert!(markers.iter().all(|m| m.code() == DrcErrorCode::ViaInsideKeepout));
        assert_eq!(markers[0].item.main_item, Some(crate::board::ItemId(1)));
        assert_eq!(markers[0].position, Point::new(2, 500));
    }

    #[test]
    fn test_track_rule_and_layer() {
        let mut board = Board::new();
        let mut area = keepout(KeepoutRules { no_tracks: true, ..Default::default() });
        area.layers = LayerSet::single(LayerId::B_CU);
        board.zones.push(area);
        let crossing = Track::segment(1, Point::new(-500, 500), Point::new(1_500, 500), 10, LayerId::F_CU, 1);
        let mut back = crossing.clone();
        back.id = crate::board::ItemId(2);
        back.layer = LayerId::B_CU;
        board.tracks = vec![crossing, back];
        let markers = run(&board);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].code(), DrcErrorCode::TrackInsideKeepout);
        assert_eq!(markers[0].item.main_item, Some(crate::board::ItemId(2)));
        assert_eq!(markers[0].position, Point::new(500, 500));
    }

    #[test]
    fn test_pads_and_footprints() {
        let mut board = Board::new();
        board.zones.push(keepout(KeepoutRules { no_pads: true, no_footprints: true, ..Default::default() }));
        let mut fp = Footprint::new(
            1,
            Text::new(2, "U1", Point::new(900, 900), LayerId::F_SILKS),
            Text::new(3, "MCU", Point::new(900, 900), LayerId::F_FAB),
            Point::new(1_100, 1_100),
        );
        fp.add_pad(Pad::new(4, "1", Point::new(1_000, 1_000), PadShape::Rect, Size::new(200, 200), LayerSet::single(LayerId::F_CU)));
        board.add_footprint(fp);
        let codes: Vec<DrcErrorCode> = run(&board).iter().map(|m| m.code()).collect();
        assert_eq!(codes, vec![DrcErrorCode::FootprintInsideKeepout, DrcErrorCode::PadInsideKeepout]);
    }

    #[test]
    fn test_footprint_keepout_skips_own_footprint() {
        let mut board = Board::new();
        let mut fp = Footprint::new(
            1,
            Text::new(2, "U1", Point::new(0, 0), LayerId::F_SILKS),
            Text::new(3, "MCU", Point::new(0, 0), LayerId::F_FAB),
            Point::new(500, 500),
        );
        fp.add_pad(Pad::new(4, "1", Point::new(500, 500), PadShape::Rect, Size::new(200, 200), LayerSet::single(LayerId::F_CU)));
        fp.add_zone(keepout(KeepoutRules { no_pads: true, no_footprints: true, ..Default::default() }));
        board.add_footprint(fp);
        assert!(run(&board).is_empty());
    }
}
