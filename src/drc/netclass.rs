//! Netclass floor checks
//!
//! Every netclass value must be at least the board-wide floor. A failure
//! here makes every later clearance result meaningless, so the caller
//! aborts the run after reporting all of them.

use crate::board::NetClass;
use crate::geometry::{Coord, Point};

use super::{DrcContext, DrcErrorCode, DrcItem};

/// Check the default netclass, then every other netclass in table order.
/// Returns false when any unsuppressed check failed.
pub fn test_netclasses(ctx: &mut DrcContext) -> bool {
    let board = ctx.board;
    let mut ok = true;
    for (name, nc) in board.design_settings.net_classes.iter() {
        if !test_netclass(ctx, name, nc) {
            ok = false;
        }
    }
    ok
}

fn test_netclass(ctx: &mut DrcContext, name: &str, nc: &NetClass) -> bool {
    let ds = &ctx.board.design_settings;
    let annulus = (nc.via_diameter - nc.via_drill).div_euclid(2);

    let checks: [(DrcErrorCode, &str, Coord, Coord); 7] = [
        (DrcErrorCode::NetclassClearance, "board minimum", ds.min_clearance, nc.clearance),
        (DrcErrorCode::NetclassTrackWidth, "board minimum", ds.track_min_width, nc.track_width),
        (DrcErrorCode::NetclassViaSize, "board minimum", ds.vias_min_size, nc.via_diameter),
        (DrcErrorCode::NetclassViaDrill, "board min through hole", ds.min_through_drill, nc.via_drill),
        (DrcErrorCode::NetclassViaAnnulus, "board minimum", ds.vias_min_annulus, annulus),
        (DrcErrorCode::NetclassMicroViaSize, "board minimum", ds.micro_vias_min_size, nc.uvia_diameter),
        (DrcErrorCode::NetclassMicroViaDrill, "board minimum", ds.micro_vias_min_drill, nc.uvia_drill),
    ];

    let mut ok = true;
    for (code, floor_label, floor, value) in checks {
        if value >= floor || ctx.is_ignored(code) {
            continue;
        }
        let msg = format!(
            "{} ({} {}; {} netclass {})",
            code.error_text(),
            floor_label,
            ctx.format_value(floor),
            name,
            ctx.format_value(value)
        );
        ctx.emit(DrcItem::new(code).with_message(msg), Point::default());
        ok = false;
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, DesignSettings};
    use crate::drc::RuleSet;
    use crate::geometry::mm_to_iu;
    use crate::units::EdaUnits;

    #[test]
    fn test_power_netclass_track_width() {
        let mut board = Board::new();
        board.design_settings.track_min_width = mm_to_iu(0.2);
        board.design_settings.net_classes.classes.insert(
            "Power".to_string(),
            NetClass { track_width: mm_to_iu(0.15), ..NetClass::default() },
        );
        let rules = RuleSet::default();
        let mut ctx = DrcContext::new(&board, &rules, EdaUnits::Millimetres);
        assert!(!test_netclasses(&mut ctx));
        let markers = ctx.take_markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].code(), DrcErrorCode::NetclassTrackWidth);
        assert_eq!(
            markers[0].item.message,
            "NetClass track width < board minimum (board minimum 0.2000 mm; Power netclass 0.1500 mm)"
        );
    }

    #[test]
    fn test_annulus_floor_division() {
        let mut board = Board::new();
        board.design_settings = DesignSettings::without_floors();
        board.design_settings.vias_min_annulus = 100;
        board.design_settings.net_classes.default = NetClass {
            via_diameter: 1001,
            via_drill: 800,
            ..NetClass::default()
        };
        let rules = RuleSet::default();
        let mut ctx = DrcContext::new(&board, &rules, EdaUnits::Millimetres);
        assert!(test_netclasses(&mut ctx), "(1001 - 800) / 2 = 100 is not below the floor");

        board.design_settings.net_classes.default.via_diameter = 999;
        let mut ctx = DrcContext::new(&board, &rules, EdaUnits::Millimetres);
        assert!(!test_netclasses(&mut ctx));
        let codes: Vec<DrcErrorCode> = ctx.take_markers().iter().map(|m| m.code()).collect();
        assert!(codes.contains(&DrcErrorCode::NetclassViaAnnulus));
    }

    #[test]
    fn test_suppressed_floor_does_not_fail() {
        let mut board = Board::new();
        board.design_settings.min_clearance = mm_to_iu(1.0);
        board.design_settings.ignore(DrcErrorCode::NetclassClearance);
        let rules = RuleSet::default();
        let mut ctx = DrcContext::new(&board, &rules, EdaUnits::Millimetres);
        assert!(test_netclasses(&mut ctx));
        assert_eq!(ctx.marker_count(), 0);
    }
}
