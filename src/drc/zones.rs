//! Zone checks: net validity and zone to zone clearance
//!
//! Zone pairs are compared on their smoothed outlines. A corner of one zone
//! inside the other is an intersection. Edge pairs closer than the
//! clearance are collected per contact point, bucketed on a 10 mil grid, and
//! the closest distance found in each bucket is reported once.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::board::{Connectivity, Zone};
use crate::geometry::{Coord, Ecoord, Point, PolySet};
use tracing::info;

use super::{DrcContext, DrcErrorCode, DrcItem};

/// Contact points closer than this are treated as the same conflict (10 mils)
pub const CONTACT_GRID: Coord = 254_000;

pub fn test_zones(ctx: &mut DrcContext, connectivity: &dyn Connectivity) {
    let start = Instant::now();
    let before = ctx.marker_count();

    if !ctx.is_ignored(DrcErrorCode::ZoneHasEmptyNet) {
        test_zone_nets(ctx, connectivity);
    }
    let pairs = test_zone_to_zone(ctx);

    info!(
        "[DRC] Zones: {} zones, {} pairs compared, {} violations in {:.2?}",
        ctx.board.zones.len(),
        pairs,
        ctx.marker_count() - before,
        start.elapsed()
    );
}

/// Copper zones must have a valid net with at least one pad, or no net at all
fn test_zone_nets(ctx: &mut DrcContext, connectivity: &dyn Connectivity) {
    let board = ctx.board;
    for zone in board.zones.iter().filter(|z| z.is_on_copper_layer()) {
        let pads_in_net = if zone.net > 0 { connectivity.pad_count(zone.net) } else { 1 };
        if zone.net < 0 || pads_in_net == 0 {
            let item = DrcItem::new(DrcErrorCode::ZoneHasEmptyNet).with_item(zone.id);
            ctx.emit(item, zone.outline.vertices().next().unwrap_or_default());
        }
    }
}

fn zones_comparable(a: &Zone, b: &Zone) -> bool {
    if !a.layers.copper().intersects(&b.layers.copper()) {
        return false;
    }
    // Unconnected (net 0) zones still conflict with each other
    if a.net == b.net && a.net > 0 {
        return false;
    }
    a.priority == b.priority && a.is_keepout() == b.is_keepout()
}

/// Returns the number of zone pairs compared
fn test_zone_to_zone(ctx: &mut DrcContext) -> usize {
    let board = ctx.board;
    let zones = &board.zones;
    let smoothed: Vec<PolySet> = zones.iter().map(|z| z.smoothed_outline()).collect();
    let mut pairs = 0;

    for ia in 0..zones.len() {
        let zone_ref = &zones[ia];
        if !zone_ref.is_on_copper_layer() {
            continue;
        }
        for ib in ia + 1..zones.len() {
            let zone_test = &zones[ib];
            if !zones_comparable(zone_ref, zone_test) {
                continue;
            }
            pairs += 1;

            let (mut clearance, source) = ctx.resolver.clearance(zone_ref, Some(zone_test));
            if zone_ref.is_keepout() {
                clearance = 1;
            }

            let (poly_ref, poly_test) = (&smoothed[ia], &smoothed[ib]);

            for corner in poly_ref.vertices().filter(|v| poly_test.strictly_contains(*v)) {
                let item = DrcItem::new(DrcErrorCode::ZonesIntersect).with_items(zone_ref.id, zone_test.id);
                ctx.emit(item, corner);
            }
            for corner in poly_test.vertices().filter(|v| poly_ref.strictly_contains(*v)) {
                let item = DrcItem::new(DrcErrorCode::ZonesIntersect).with_items(zone_test.id, zone_ref.id);
                ctx.emit(item, corner);
            }

            for (position, actual) in edge_conflicts(poly_ref, poly_test, clearance) {
                let item = if actual <= 0 {
                    DrcItem::new(DrcErrorCode::ZonesIntersect)
                } else {
                    let code = DrcErrorCode::ZonesTooClose;
                    DrcItem::new(code).with_message(ctx.clearance_message(code, &source, clearance, actual))
                };
                ctx.emit(item.with_items(zone_ref.id, zone_test.id), position);
            }
        }
    }
    pairs
}

/// Edge pairs closer than `clearance`, one entry per contact grid cell,
/// keeping the smallest distance and the point where it was found
fn edge_conflicts(a: &PolySet, b: &PolySet, clearance: Coord) -> Vec<(Point, Coord)> {
    let limit = clearance as Ecoord * clearance as Ecoord;
    let mut conflicts: BTreeMap<(Coord, Coord), (Coord, Point)> = BTreeMap::new();

    for seg_a in a.segments() {
        for seg_b in b.segments() {
            let (d2, pt) = seg_a.closest_approach(&seg_b);
            if d2 >= limit {
                continue;
            }
            let d = (d2 as f64).sqrt() as Coord;
            let key = (pt.x.div_euclid(CONTACT_GRID), pt.y.div_euclid(CONTACT_GRID));
            conflicts
                .entry(key)
                .and_modify(|best| {
                    if d < best.0 {
                        *best = (d, pt);
                    }
                })
                .or_insert((d, pt));
        }
    }
    conflicts.into_values().map(|(d, pt)| (pt, d)).collect()
}
