//! Drilled hole checks
//!
//! Collects every pad and via hole, flags holes below the drill floors,
//! then tests hole-to-hole spacing along an X-sorted list. Results go to
//! the caller through an emit callback.

use std::time::Instant;

use crate::board::{Board, ItemId, ViaType};
use crate::geometry::{Coord, Ecoord, Point};
use tracing::info;

use super::{DrcContext, DrcErrorCode, DrcItem, Marker};

#[derive(Clone, Copy, Debug)]
struct DrilledHole {
    location: Point,
    radius: Coord,
    owner: ItemId,
}

pub struct DrilledHoleTester<F: FnMut(Marker)> {
    emit: F,
    holes: Vec<DrilledHole>,
    largest_radius: Coord,
}

impl<F: FnMut(Marker)> DrilledHoleTester<F> {
    pub fn new(emit: F) -> Self {
        Self { emit, holes: Vec::new(), largest_radius: 0 }
    }

    /// Run all hole checks; returns the number of markers emitted
    pub fn run(&mut self, ctx: &DrcContext) -> usize {
        let start = Instant::now();
        let board = ctx.board;
        self.holes.clear();
        self.largest_radius = 0;

        let mut count = self.check_pads(ctx, board);
        count += self.check_vias(ctx, board);

        if !ctx.is_ignored(DrcErrorCode::DrilledHolesTooClose) {
            count += self.check_hole_spacing(ctx, board.design_settings.hole_to_hole_min);
        }

        info!(
            "[DRC] Drilled holes: {} holes, {} violations in {:.2?}",
            self.holes.len(),
            count,
            start.elapsed()
        );
        count
    }

    fn add_hole(&mut self, location: Point, radius: Coord, owner: ItemId) {
        self.largest_radius = self.largest_radius.max(radius);
        self.holes.push(DrilledHole { location, radius, owner });
    }

    fn check_pads(&mut self, ctx: &DrcContext, board: &Board) -> usize {
        let min_drill = board.design_settings.min_through_drill;
        let mut count = 0;
        for pad in board.footprints.iter().flat_map(|fp| fp.pads.iter()) {
            if !pad.has_hole() {
                continue;
            }
            let hole_size = pad.drill_min();
            if hole_size < min_drill && !ctx.is_ignored(DrcErrorCode::TooSmallPadDrill) {
                let code = DrcErrorCode::TooSmallPadDrill;
                let item = DrcItem::new(code)
                    .with_message(ctx.floor_message(code, min_drill, hole_size))
                    .with_item(pad.id);
                (self.emit)(Marker::new(item, pad.position));
                count += 1;
            }
            self.add_hole(pad.position, hole_size / 2, pad.id);
        }
        count
    }

    fn check_vias(&mut self, ctx: &DrcContext, board: &Board) -> usize {
        let ds = &board.design_settings;
        let mut count = 0;
        for track in &board.tracks {
            let Some(via) = &track.via else {
                continue;
            };
            let (code, min_drill) = match via.via_type {
                ViaType::Micro => (DrcErrorCode::TooSmallMicroViaDrill, ds.micro_vias_min_drill),
                _ => (DrcErrorCode::TooSmallViaDrill, ds.min_through_drill),
            };
            if via.drill < min_drill && !ctx.is_ignored(code) {
                let item = DrcItem::new(code)
                    .with_message(ctx.floor_message(code, min_drill, via.drill))
                    .with_item(track.id);
                (self.emit)(Marker::new(item, track.start));
                count += 1;
            }
            self.add_hole(track.start, via.drill / 2, track.id);
        }
        count
    }

    fn check_hole_spacing(&mut self, ctx: &DrcContext, min_spacing: Coord) -> usize {
        self.holes.sort_by_key(|h| (h.location.x, h.location.y));
        let code = DrcErrorCode::DrilledHolesTooClose;
        let mut count = 0;

        for i in 0..self.holes.len() {
            let ref_hole = self.holes[i];
            let x_limit = ref_hole.location.x + ref_hole.radius + min_spacing + self.largest_radius;

            for j in i + 1..self.holes.len() {
                let hole = self.holes[j];
                if hole.location.x > x_limit {
                    break;
                }
                if hole.owner == ref_hole.owner {
                    continue;
                }
                // Stacked holes (a via on a pad) are allowed
                if hole.location == ref_hole.location {
                    continue;
                }
                let reach = (ref_hole.radius + hole.radius + min_spacing) as Ecoord;
                let d2 = ref_hole.location.squared_distance(hole.location);
                if d2 >= reach * reach {
                    continue;
                }
                let actual = ((d2 as f64).sqrt() as Coord - ref_hole.radius - hole.radius).max(0);
                let item = DrcItem::new(code)
                    .with_message(ctx.floor_message(code, min_spacing, actual))
                    .with_items(ref_hole.owner, hole.owner);
                (self.emit)(Marker::new(item, ref_hole.location));
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Footprint, LayerId, LayerSet, Pad, PadShape, Size, Text, Track};
    use crate::drc::RuleSet;
    use crate::units::EdaUnits;

    fn pth(id: u64, x: Coord, drill: Coord) -> Pad {
        let mut pad = Pad::new(id, "1", Point::new(x, 0), PadShape::Circle, Size::new(2 * drill, 2 * drill), LayerSet::all_copper());
        pad.drill = Size::new(drill, drill);
        pad
    }

    fn run(board: &Board) -> Vec<Marker> {
        let rules = RuleSet::default();
        let ctx = DrcContext::new(board, &rules, EdaUnits::Millimetres);
        let mut found = Vec::new();
        let count = DrilledHoleTester::new(|m| found.push(m)).run(&ctx);
        assert_eq!(count, found.len());
        found
    }

    fn board() -> Board {
        let mut board = Board::new();
        board.design_settings.min_through_drill = 300;
        board.design_settings.micro_vias_min_drill = 100;
        board.design_settings.hole_to_hole_min = 250;
        board
    }

    #[test]
    fn test_small_pad_and_via_drills() {
        let mut board = board();
        let mut fp = Footprint::new(
            1,
            Text::new(2, "J1", Point::new(0, 0), LayerId::F_SILKS),
            Text::new(3, "CONN", Point::new(0, 0), LayerId::F_FAB),
            Point::new(0, 0),
        );
        fp.add_pad(pth(4, 0, 200));
        board.add_footprint(fp);
        board.tracks.push(Track::new_via(5, Point::new(100_000, 0), 600, 250, LayerId::F_CU, LayerId::B_CU, 1));
        let mut micro = Track::new_via(6, Point::new(200_000, 0), 300, 80, LayerId::F_CU, LayerId::inner(1).unwrap(), 1);
        if let Some(v) = micro.via.as_mut() {
            v.via_type = ViaType::Micro;
        }
        board.tracks.push(micro);

        let codes: Vec<DrcErrorCode> = run(&board).iter().map(|m| m.code()).collect();
        assert_eq!(
            codes,
            vec![
                DrcErrorCode::TooSmallPadDrill,
                DrcErrorCode::TooSmallViaDrill,
                DrcErrorCode::TooSmallMicroViaDrill
            ]
        );
    }

    #[test]
    fn test_hole_spacing() {
        let mut board = board();
        // Hole edges 200 apart, minimum 250
        board.tracks.push(Track::new_via(1, Point::new(0, 0), 800, 400, LayerId::F_CU, LayerId::B_CU, 1));
        board.tracks.push(Track::new_via(2, Point::new(600, 0), 800, 400, LayerId::F_CU, LayerId::B_CU, 2));
        // Stacked on via 1
        board.tracks.push(Track::new_via(3, Point::new(0, 0), 800, 400, LayerId::F_CU, LayerId::B_CU, 1));
        // Far away
        board.tracks.push(Track::new_via(4, Point::new(10_000, 0), 800, 400, LayerId::F_CU, LayerId::B_CU, 3));

        let markers = run(&board);
        assert_eq!(markers.len(), 2, "via 2 is close to both stacked vias");
        assert!(markers.iter().all(|m| m.code() == DrcErrorCode::DrilledHolesTooClose));
        assert!(markers[0].item.message.contains("actual 0.0002 mm"));
    }

    #[test]
    fn test_suppressed_spacing() {
        let mut board = board();
        board.design_settings.ignore(DrcErrorCode::DrilledHolesTooClose);
        board.tracks.push(Track::new_via(1, Point::new(0, 0), 800, 400, LayerId::F_CU, LayerId::B_CU, 1));
        board.tracks.push(Track::new_via(2, Point::new(500, 0), 800, 400, LayerId::F_CU, LayerId::B_CU, 2));
        assert!(run(&board).is_empty());
    }
}
