//! Pad to pad clearance
//!
//! Pads are sorted by X then Y. Each reference pad is compared only with
//! the pads after it whose X lies within reach of the largest clearance and
//! the largest pad on the board.

use std::time::Instant;

use crate::board::{LayerSet, PadRef};
use crate::geometry::{Coord, Shape};
use tracing::info;

use super::geometry::{get_hole_shape, get_pad_bounding_radius, get_pad_shape};
use super::{DrcContext, DrcErrorCode, DrcItem, Marker};

struct SortedPad<'a> {
    pad: PadRef<'a>,
    shape: Shape,
    hole: Option<Shape>,
    bounding_radius: Coord,
}

pub fn test_pad_to_pad(ctx: &mut DrcContext) {
    let start = Instant::now();
    let board = ctx.board;

    let mut pads: Vec<SortedPad> = board
        .pads()
        .map(|pad| SortedPad {
            shape: get_pad_shape(pad.pad),
            hole: get_hole_shape(pad.pad),
            bounding_radius: get_pad_bounding_radius(pad.pad),
            pad,
        })
        .collect();
    pads.sort_by_key(|p| (p.pad.pad.position.x, p.pad.pad.position.y));

    if pads.is_empty() {
        return;
    }

    let max_size = pads.iter().map(|p| p.bounding_radius).max().unwrap_or(0);
    // The pair clearance can exceed the reference pad's own, so reach by the board maximum
    let reach = ctx.max_clearance();
    let before = ctx.marker_count();

    for i in 0..pads.len() {
        let reference = &pads[i];
        let x_limit = reference.pad.pad.position.x + reach + reference.bounding_radius + max_size;
        if let Some(marker) = check_pad_against_following(ctx, &pads, i, x_limit) {
            ctx.report(marker);
        }
    }

    info!(
        "[DRC] Pad clearances: {} pads, {} violations in {:.2?}",
        pads.len(),
        ctx.marker_count() - before,
        start.elapsed()
    );
}

/// Test `pads[index]` against later pads up to `x_limit`; stops at the first violation
fn check_pad_against_following(
    ctx: &DrcContext,
    pads: &[SortedPad],
    index: usize,
    x_limit: Coord,
) -> Option<Marker> {
    let all_cu = LayerSet::all_copper();
    let reference = &pads[index];
    let ref_pad = reference.pad.pad;
    let layer_mask = ref_pad.layers.intersection(&all_cu);

    for other in &pads[index + 1..] {
        let pad = other.pad.pad;
        if pad.position.x > x_limit {
            break;
        }
        if pad.net != 0 && pad.net == ref_pad.net {
            continue;
        }
        if pad.parent == ref_pad.parent && pad.name == ref_pad.name {
            continue;
        }

        let pad_cu = pad.layers.intersection(&all_cu);
        if !pad_cu.intersects(&layer_mask) && !pad_cu.is_empty() && !layer_mask.is_empty() {
            // Copper on different layers; only the holes can collide
            if pad.position == ref_pad.position
                && pad.drill == ref_pad.drill
                && pad.drill_shape == ref_pad.drill_shape
            {
                if ref_pad.drill_shape == crate::board::DrillShape::Circle {
                    continue;
                }
                if pad.orientation == ref_pad.orientation {
                    continue;
                }
            }
            if let Some(hole) = &other.hole {
                let (min, source) = ctx.resolver.clearance(ref_pad, Some(pad));
                if let Some(actual) = reference.shape.check_clearance(hole, min) {
                    let code = DrcErrorCode::HoleNearPad;
                    let item = DrcItem::new(code)
                        .with_message(ctx.clearance_message(code, &source, min, actual))
                        .with_items(pad.id, ref_pad.id);
                    return Some(Marker::new(item, pad.position));
                }
            }
            if let Some(hole) = &reference.hole {
                let (min, source) = ctx.resolver.clearance(pad, Some(ref_pad));
                if let Some(actual) = other.shape.check_clearance(hole, min) {
                    let code = DrcErrorCode::HoleNearPad;
                    let item = DrcItem::new(code)
                        .with_message(ctx.clearance_message(code, &source, min, actual))
                        .with_items(ref_pad.id, pad.id);
                    return Some(Marker::new(item, ref_pad.position));
                }
            }
            continue;
        }

        // Technical-layer-only pads without a hole never touch copper
        if (!pad.layers.intersects(&layer_mask) && !pad.has_hole())
            || (!ref_pad.layers.intersects(&layer_mask) && !ref_pad.has_hole())
        {
            continue;
        }

        let (min, source) = ctx.resolver.clearance(ref_pad, Some(pad));
        if let Some(actual) = reference.shape.check_clearance(&other.shape, min) {
            let code = DrcErrorCode::PadTooClose;
            let item = DrcItem::new(code)
                .with_message(ctx.clearance_message(code, &source, min, actual))
                .with_items(ref_pad.id, pad.id);
            return Some(Marker::new(item, ref_pad.position));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, DesignSettings, Footprint, LayerId, NetClass, Pad, PadShape, Size, Text};
    use crate::drc::RuleSet;
    use crate::geometry::Point;
    use crate::units::EdaUnits;

    fn footprint(id: u64, pads: Vec<Pad>) -> Footprint {
        let mut fp = Footprint::new(
            id,
            Text::new(id + 1000, &format!("U{}", id), Point::new(0, 0), LayerId::F_SILKS),
            Text::new(id + 2000, "X", Point::new(0, 0), LayerId::F_FAB),
            Point::new(0, 0),
        );
        for p in pads {
            fp.add_pad(p);
        }
        fp
    }

    fn smd(id: u64, name: &str, x: Coord, net: i32) -> Pad {
        let mut pad = Pad::new(id, name, Point::new(x, 0), PadShape::Circle, Size::new(10, 10), LayerSet::single(LayerId::F_CU));
        pad.net = net;
        pad
    }

    fn board_with(fps: Vec<Footprint>) -> Board {
        let mut board = Board::new();
        board.design_settings = DesignSettings::without_floors();
        board.design_settings.net_classes.default.clearance = 5;
        for fp in fps {
            board.add_footprint(fp);
        }
        board
    }

    fn run(board: &Board) -> Vec<Marker> {
        let rules = RuleSet::default();
        let mut ctx = DrcContext::new(board, &rules, EdaUnits::Millimetres);
        test_pad_to_pad(&mut ctx);
        ctx.take_markers()
    }

    #[test]
    fn test_close_pads_different_nets() {
        // Edges 4 apart, clearance 5
        let board = board_with(vec![footprint(1, vec![smd(10, "1", 0, 1), smd(11, "2", 14, 2)])]);
        let markers = run(&board);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].code(), DrcErrorCode::PadTooClose);
        assert!(markers[0].item.message.ends_with("actual 0.0000 mm)"));
    }

    #[test]
    fn test_same_net_and_same_name_skipped() {
        let same_net = board_with(vec![footprint(1, vec![smd(10, "1", 0, 3), smd(11, "2", 14, 3)])]);
        assert!(run(&same_net).is_empty());

        let same_name = board_with(vec![footprint(1, vec![smd(10, "1", 0, 1), smd(11, "1", 14, 2)])]);
        assert!(run(&same_name).is_empty());
    }

    #[test]
    fn test_exact_clearance_is_legal() {
        // Edges 5 apart, clearance 5
        let board = board_with(vec![footprint(1, vec![smd(10, "1", 0, 1), smd(11, "2", 15, 2)])]);
        assert!(run(&board).is_empty());
    }

    #[test]
    fn test_hole_near_pad_on_other_layer() {
        let mut top = smd(10, "1", 0, 1);
        top.size = Size::new(100, 100);
        let mut bottom = Pad::new(11, "1", Point::new(57, 0), PadShape::Circle, Size::new(10, 10), LayerSet::single(LayerId::B_CU));
        bottom.drill = Size::new(8, 8);
        bottom.net = 2;
        let board = board_with(vec![footprint(1, vec![top]), footprint(2, vec![bottom])]);
        let markers = run(&board);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].code(), DrcErrorCode::HoleNearPad);
        assert_eq!(markers[0].item.main_item, Some(crate::board::ItemId(11)));
    }

    #[test]
    fn test_stricter_netclass_on_either_side() {
        // Edges 30 apart: legal for Default (5), too close for HV (40)
        for (hv_x, other_x) in [(0, 40), (40, 0)] {
            let mut board = board_with(vec![footprint(1, vec![smd(10, "1", hv_x, 2), smd(11, "2", other_x, 1)])]);
            board.add_net(1, "SIG", None);
            board.add_net(2, "HV", Some("HV"));
            board
                .design_settings
                .net_classes
                .classes
                .insert("HV".to_string(), NetClass { clearance: 40, ..NetClass::default() });
            let markers = run(&board);
            assert_eq!(markers.len(), 1, "HV pad at x = {}", hv_x);
            assert_eq!(markers[0].code(), DrcErrorCode::PadTooClose);
            assert!(markers[0].item.message.contains("'HV' netclass clearance"));
        }
    }

    #[test]
    fn test_far_pads_pruned() {
        let board = board_with(vec![footprint(1, vec![smd(10, "1", 0, 1), smd(11, "2", 1_000, 2)])]);
        assert!(run(&board).is_empty());
    }
}
