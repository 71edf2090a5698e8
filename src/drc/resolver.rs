//! Clearance resolution
//!
//! Finds the minimum clearance that applies to one item, or to a pair of
//! items, and a label saying where the value came from. Order:
//! 1. local overrides on the items (pad, else its footprint; zone)
//! 2. first rule selector matching every given item
//! 3. the stricter netclass of the items, floored by the board minimum

use crate::board::{Board, BoardItem, ItemKind};
use crate::geometry::Coord;

use super::RuleSet;

pub struct ClearanceResolver<'a> {
    board: &'a Board,
    rules: &'a RuleSet,
}

impl<'a> ClearanceResolver<'a> {
    pub fn new(board: &'a Board, rules: &'a RuleSet) -> Self {
        Self { board, rules }
    }

    fn netclass_name(&self, item: &dyn BoardItem) -> Option<&'a str> {
        item.net_code().map(|net| self.board.netclass_for(net).0)
    }

    /// Item override, falling back to the owning footprint for pads
    pub fn local_override(&self, item: &dyn BoardItem) -> Coord {
        let own = item.local_clearance();
        if own > 0 {
            return own;
        }
        if item.kind() == ItemKind::Pad {
            if let Some(fp) = item.parent().and_then(|id| self.board.footprint(id)) {
                return fp.local_clearance.max(0);
            }
        }
        0
    }

    /// Clearance for `a`, or for the pair `a`/`b`, with its provenance label
    pub fn clearance(&self, a: &dyn BoardItem, b: Option<&dyn BoardItem>) -> (Coord, String) {
        let local = self
            .local_override(a)
            .max(b.map(|b| self.local_override(b)).unwrap_or(0));
        if local > 0 {
            return (local, "local override clearance".to_string());
        }

        for sel in &self.rules.selectors {
            let Some(rule) = self.rules.rule(&sel.rule) else {
                continue;
            };
            let Some(value) = rule.clearance else {
                continue;
            };
            let matches = |item: &dyn BoardItem| {
                sel.matches(self.netclass_name(item), item.kind(), &item.layers())
            };
            if matches(a) && b.map_or(true, |b| matches(b)) {
                return (value, format!("'{}' rule clearance", rule.name));
            }
        }

        let mut value = self.board.design_settings.min_clearance;
        let mut source = "board minimum".to_string();
        for item in std::iter::once(a).chain(b) {
            if let Some(net) = item.net_code() {
                let (name, nc) = self.board.netclass_for(net);
                if nc.clearance > value {
                    value = nc.clearance;
                    source = format!("'{}' netclass", name);
                }
            }
        }
        (value, format!("{} clearance", source))
    }

    /// Upper bound on any clearance this resolver can return
    pub fn max_clearance(&self) -> Coord {
        let ds = &self.board.design_settings;
        let netclass_max = ds
            .net_classes
            .iter()
            .map(|(_, nc)| nc.clearance)
            .max()
            .unwrap_or(0);
        let local_max = self
            .board
            .footprints
            .iter()
            .flat_map(|fp| {
                std::iter::once(fp.local_clearance)
                    .chain(fp.pads.iter().map(|p| p.local_clearance))
                    .chain(fp.zones.iter().map(|z| z.local_clearance))
            })
            .chain(self.board.zones.iter().map(|z| z.local_clearance))
            .max()
            .unwrap_or(0);
        ds.min_clearance
            .max(netclass_max)
            .max(self.rules.max_clearance())
            .max(local_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{
        Footprint, LayerId, LayerSet, NetClass, Pad, PadShape, Size, Text, Track,
    };
    use crate::drc::{DrcRule, RuleSelector};
    use crate::geometry::Point;

    fn board() -> Board {
        let mut board = Board::new();
        board.design_settings.min_clearance = 100;
        board.design_settings.net_classes.default.clearance = 150;
        board
            .design_settings
            .net_classes
            .classes
            .insert("HV".to_string(), NetClass { clearance: 400, ..NetClass::default() });
        board.add_net(1, "SIG", None);
        board.add_net(2, "HV+", Some("HV"));
        board
    }

    fn track(id: u64, net: i32) -> Track {
        Track::segment(id, Point::new(0, 0), Point::new(10, 0), 2, LayerId::F_CU, net)
    }

    #[test]
    fn test_stricter_netclass_wins() {
        let board = board();
        let rules = RuleSet::default();
        let resolver = ClearanceResolver::new(&board, &rules);
        let (a, b) = (track(1, 1), track(2, 2));
        assert_eq!(resolver.clearance(&a, None), (150, "'Default' netclass clearance".to_string()));
        assert_eq!(resolver.clearance(&a, Some(&b)), (400, "'HV' netclass clearance".to_string()));
        assert_eq!(resolver.clearance(&b, Some(&a)).0, 400, "resolution is symmetric");
    }

    #[test]
    fn test_board_minimum_floors_netclass() {
        let mut board = board();
        board.design_settings.min_clearance = 1000;
        let rules = RuleSet::default();
        let resolver = ClearanceResolver::new(&board, &rules);
        assert_eq!(
            resolver.clearance(&track(1, 2), None),
            (1000, "board minimum clearance".to_string())
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let board = board();
        let rules = RuleSet {
            rules: vec![
                DrcRule { name: "vias".to_string(), clearance: Some(50) },
                DrcRule { name: "hv".to_string(), clearance: Some(900) },
            ],
            selectors: vec![
                RuleSelector { match_netclasses: vec!["HV".to_string()], rule: "hv".to_string(), ..Default::default() },
                RuleSelector { match_types: vec![ItemKind::Track], rule: "vias".to_string(), ..Default::default() },
            ],
        };
        let resolver = ClearanceResolver::new(&board, &rules);
        assert_eq!(resolver.clearance(&track(1, 2), None).0, 900);
        assert_eq!(resolver.clearance(&track(1, 1), None), (50, "'vias' rule clearance".to_string()));
        // HV selector must match both items of a pair
        assert_eq!(resolver.clearance(&track(1, 2), Some(&track(2, 1))).0, 50);
        assert_eq!(resolver.max_clearance(), 900);
    }

    #[test]
    fn test_pad_inherits_footprint_override() {
        let mut board = board();
        let mut fp = Footprint::new(
            10,
            Text::new(11, "J1", Point::new(0, 0), LayerId::F_SILKS),
            Text::new(12, "CONN", Point::new(0, 0), LayerId::F_FAB),
            Point::new(0, 0),
        );
        fp.local_clearance = 700;
        fp.add_pad(Pad::new(13, "1", Point::new(0, 0), PadShape::Circle, Size::new(10, 10), LayerSet::single(LayerId::F_CU)));
        board.add_footprint(fp);
        let rules = RuleSet::default();
        let resolver = ClearanceResolver::new(&board, &rules);
        let pad = &board.footprints[0].pads[0];
        assert_eq!(resolver.clearance(pad, None), (700, "local override clearance".to_string()));
        assert_eq!(resolver.max_clearance(), 700);
    }
}
