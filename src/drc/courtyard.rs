//! Courtyard checks
//!
//! Each footprint may draw a courtyard on the front and back courtyard
//! layers. The outlines must be closed; footprints on the same side must
//! not overlap; plated and unplated holes of other footprints must stay
//! outside. Results go to the caller through an emit callback.

use std::time::Instant;

use crate::board::{BoardSide, Footprint, PadAttribute};
use crate::geometry::{Point, PolySet};
use tracing::info;

use super::{DrcContext, DrcErrorCode, DrcItem, Marker};

/// Courtyards of one footprint; `None` on a side that is malformed
struct Courtyards<'a> {
    footprint: &'a Footprint,
    front: Option<PolySet>,
    back: Option<PolySet>,
}

impl Courtyards<'_> {
    fn side(&self, side: BoardSide) -> Option<&PolySet> {
        match side {
            BoardSide::Front => self.front.as_ref(),
            BoardSide::Back => self.back.as_ref(),
        }
        .filter(|p| !p.is_empty())
    }
}

pub struct CourtyardTester<F: FnMut(Marker)> {
    emit: F,
    count: usize,
}

impl<F: FnMut(Marker)> CourtyardTester<F> {
    pub fn new(emit: F) -> Self {
        Self { emit, count: 0 }
    }

    /// Run all courtyard checks; returns the number of markers emitted
    pub fn run(&mut self, ctx: &DrcContext) -> usize {
        let start = Instant::now();
        self.count = 0;

        let courtyards = self.build_courtyards(ctx);
        if !ctx.is_ignored(DrcErrorCode::OverlappingFootprints) {
            self.check_overlaps(ctx, &courtyards, BoardSide::Front);
            self.check_overlaps(ctx, &courtyards, BoardSide::Back);
        }
        self.check_holes(ctx, &courtyards);

        info!(
            "[DRC] Courtyards: {} footprints, {} violations in {:.2?}",
            courtyards.len(),
            self.count,
            start.elapsed()
        );
        self.count
    }

    fn report(&mut self, ctx: &DrcContext, item: DrcItem, position: Point) {
        if ctx.is_ignored(item.code) {
            return;
        }
        (self.emit)(Marker::new(item, position));
        self.count += 1;
    }

    fn build_courtyards<'a>(&mut self, ctx: &DrcContext<'a>) -> Vec<Courtyards<'a>> {
        let mut out = Vec::with_capacity(ctx.board.footprints.len());
        for fp in &ctx.board.footprints {
            let front = self.courtyard_side(ctx, fp, BoardSide::Front);
            let back = self.courtyard_side(ctx, fp, BoardSide::Back);

            let empty = |c: &Option<PolySet>| c.as_ref().is_some_and(|p| p.is_empty());
            if empty(&front) && empty(&back) {
                let item = DrcItem::new(DrcErrorCode::MissingCourtyard).with_item(fp.id);
                self.report(ctx, item, fp.position);
            }
            out.push(Courtyards { footprint: fp, front, back });
        }
        out
    }

    fn courtyard_side(&mut self, ctx: &DrcContext, fp: &Footprint, side: BoardSide) -> Option<PolySet> {
        match fp.courtyard(side) {
            Ok(polys) => Some(polys),
            Err(at) => {
                let code = DrcErrorCode::MalformedCourtyard;
                let item = DrcItem::new(code)
                    .with_message(format!("{} (not a closed shape)", code.error_text()))
                    .with_item(fp.id);
                self.report(ctx, item, at);
                None
            }
        }
    }

    fn check_overlaps(&mut self, ctx: &DrcContext, courtyards: &[Courtyards], side: BoardSide) {
        for (i, a) in courtyards.iter().enumerate() {
            let Some(poly_a) = a.side(side) else {
                continue;
            };
            for b in &courtyards[i + 1..] {
                let Some(poly_b) = b.side(side) else {
                    continue;
                };
                if let Some(pt) = poly_a.intersection_point(poly_b) {
                    let item = DrcItem::new(DrcErrorCode::OverlappingFootprints)
                        .with_items(a.footprint.id, b.footprint.id);
                    self.report(ctx, item, pt);
                }
            }
        }
    }

    /// Drilled pads of other footprints whose hole centre lies in a courtyard
    fn check_holes(&mut self, ctx: &DrcContext, courtyards: &[Courtyards]) {
        let check_pth = !ctx.is_ignored(DrcErrorCode::PthInsideCourtyard);
        let check_npth = !ctx.is_ignored(DrcErrorCode::NpthInsideCourtyard);
        if !check_pth && !check_npth {
            return;
        }

        for owner in courtyards {
            let sides: Vec<&PolySet> = [BoardSide::Front, BoardSide::Back]
                .into_iter()
                .filter_map(|s| owner.side(s))
                .collect();
            if sides.is_empty() {
                continue;
            }

            for other in ctx.board.footprints.iter().filter(|fp| fp.id != owner.footprint.id) {
                for pad in other.pads.iter().filter(|p| p.has_hole()) {
                    let code = match pad.attribute {
                        PadAttribute::Npth => DrcErrorCode::NpthInsideCourtyard,
                        _ => DrcErrorCode::PthInsideCourtyard,
                    };
                    if sides.iter().any(|poly| poly.contains(pad.position)) {
                        let item = DrcItem::new(code).with_items(pad.id, owner.footprint.id);
                        self.report(ctx, item, pad.position);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Graphic, GraphicShape, LayerId, LayerSet, Pad, PadShape, Size, Text};
    use crate::drc::RuleSet;
    use crate::geometry::{Coord, Point};
    use crate::units::EdaUnits;

    fn run(board: &Board) -> Vec<Marker> {
        let rules = RuleSet::default();
        let ctx = DrcContext::new(board, &rules, EdaUnits::Millimetres);
        let mut found = Vec::new();
        let count = CourtyardTester::new(|m| found.push(m)).run(&ctx);
        assert_eq!(count, found.len());
        found
    }

    fn footprint(id: u64, x: Coord) -> Footprint {
        Footprint::new(
            id,
            Text::new(id + 1, "U", Point::new(x, 0), LayerId::F_SILKS),
            Text::new(id + 2, "V", Point::new(x, 0), LayerId::F_FAB),
            Point::new(x, 0),
        )
    }

    const MM: Coord = 1_000_000;

    /// 1 mm square courtyard centred on `x`, drawn as four lines
    fn with_courtyard(mut fp: Footprint, layer: LayerId, x: Coord) -> Footprint {
        let h = MM / 2;
        let c = [
            Point::new(x - h, -h),
            Point::new(x + h, -h),
            Point::new(x + h, h),
            Point::new(x - h, h),
        ];
        for i in 0..4 {
            let shape = GraphicShape::Segment { start: c[i], end: c[(i + 1) % 4] };
            fp.add_graphic(Graphic::new(fp.id.0 * 100 + i as u64, layer, 50_000, shape));
        }
        fp
    }

    #[test]
    fn test_overlap_on_same_side_only() {
        let mut board = Board::new();
        board.add_footprint(with_courtyard(footprint(10, 0), LayerId::F_CRTYD, 0));
        board.add_footprint(with_courtyard(footprint(20, 800_000), LayerId::F_CRTYD, 800_000));
        board.add_footprint(with_courtyard(footprint(30, 400_000), LayerId::B_CRTYD, 400_000));
        let markers = run(&board);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].code(), DrcErrorCode::OverlappingFootprints);
        assert_eq!(markers[0].item.main_item, Some(crate::board::ItemId(10)));
        assert_eq!(markers[0].item.aux_item, Some(crate::board::ItemId(20)));
    }

    #[test]
    fn test_malformed_and_missing() {
        let mut board = Board::new();
        board.design_settings.unignore(DrcErrorCode::MissingCourtyard);
        let mut open = footprint(10, 0);
        open.add_graphic(Graphic::new(
            11,
            LayerId::F_CRTYD,
            50_000,
            GraphicShape::Segment { start: Point::new(0, 0), end: Point::new(MM, 0) },
        ));
        board.add_footprint(open);
        board.add_footprint(footprint(20, 5 * MM));
        let markers = run(&board);
        let codes: Vec<DrcErrorCode> = markers.iter().map(|m| m.code()).collect();
        assert_eq!(codes, vec![DrcErrorCode::MalformedCourtyard, DrcErrorCode::MissingCourtyard]);
        assert_eq!(markers[0].item.message, "Footprint has malformed courtyard (not a closed shape)");
    }

    #[test]
    fn test_missing_courtyard_ignored_by_default() {
        let mut board = Board::new();
        board.add_footprint(footprint(10, 0));
        assert!(run(&board).is_empty());
    }

    #[test]
    fn test_holes_inside_other_courtyard() {
        let mut board = Board::new();
        board.add_footprint(with_courtyard(footprint(10, 0), LayerId::F_CRTYD, 0));
        let mut other = footprint(20, 5 * MM);
        let mut pth = Pad::new(21, "1", Point::new(100_000, 0), PadShape::Circle, Size::new(200_000, 200_000), LayerSet::all_copper());
        pth.drill = Size::new(100_000, 100_000);
        pth.attribute = PadAttribute::Pth;
        let mut npth = pth.clone();
        npth.id = crate::board::ItemId(22);
        npth.position = Point::new(-100_000, 0);
        npth.attribute = PadAttribute::Npth;
        let smd = Pad::new(23, "3", Point::new(0, 100_000), PadShape::Rect, Size::new(200_000, 200_000), LayerSet::single(LayerId::F_CU));
        other.add_pad(pth);
        other.add_pad(npth);
        other.add_pad(smd);
        board.add_footprint(other);

        let codes: Vec<DrcErrorCode> = run(&board).iter().map(|m| m.code()).collect();
        assert_eq!(codes, vec![DrcErrorCode::PthInsideCourtyard, DrcErrorCode::NpthInsideCourtyard]);
    }
}
