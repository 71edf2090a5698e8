//! Footprints versus the schematic netlist
//!
//! Finds duplicate references on the board, netlist components with no
//! footprint, and footprints with no netlist component. The results are
//! plain items without a board position.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::board::{Board, Footprint, Netlist};
use tracing::info;

use super::{DrcErrorCode, DrcItem};

pub fn test_footprints(board: &Board, netlist: &Netlist) -> Vec<DrcItem> {
    let start = Instant::now();
    let ds = &board.design_settings;
    let mut items = Vec::new();

    // First footprint per reference, compared case-insensitively
    let mut unique: BTreeMap<String, &Footprint> = BTreeMap::new();
    for fp in &board.footprints {
        match unique.entry(fp.reference_str().to_lowercase()) {
            Entry::Occupied(first) => {
                if !ds.is_ignored(DrcErrorCode::DuplicateFootprint) {
                    items.push(DrcItem::new(DrcErrorCode::DuplicateFootprint).with_items(fp.id, first.get().id));
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(fp);
            }
        }
    }

    if !ds.is_ignored(DrcErrorCode::MissingFootprint) {
        for component in &netlist.components {
            if !board.footprints.iter().any(|fp| fp.reference_str() == component.reference) {
                let message = format!("Missing footprint {} ({})", component.reference, component.value);
                items.push(DrcItem::new(DrcErrorCode::MissingFootprint).with_message(message));
            }
        }
    }

    if !ds.is_ignored(DrcErrorCode::ExtraFootprint) {
        for fp in unique.values() {
            if netlist.find_by_reference(fp.reference_str()).is_none() {
                items.push(DrcItem::new(DrcErrorCode::ExtraFootprint).with_item(fp.id));
            }
        }
    }

    info!(
        "[DRC] Footprints: {} on board, {} in netlist, {} problems in {:.2?}",
        board.footprints.len(),
        netlist.components.len(),
        items.len(),
        start.elapsed()
    );
    items
}
