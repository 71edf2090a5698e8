//! Board consistency checks
//!
//! # Checks
//! - `test_disabled_layers` - copper items on layers the board does not enable
//! - `test_text_vars` - texts still showing a `${...}` reference after substitution
//! - `test_board_outline` - Edge.Cuts drawings that do not close into an outline

use std::time::Instant;

use crate::board::{BoardItem, Drawing, Footprint, LayerId, LayerSet, Text};
use crate::geometry::{build_closed_contours, Point, CHAINING_EPSILON};
use tracing::info;

use super::{DrcContext, DrcErrorCode, DrcItem};

fn test_item_layer(ctx: &mut DrcContext, item: &dyn BoardItem, disabled: &LayerSet) {
    let Some(layer) = item.primary_layer() else {
        return;
    };
    if disabled.contains(layer) {
        let code = DrcErrorCode::DisabledLayerItem;
        let drc_item = DrcItem::new(code)
            .with_message(format!("{} (layer {})", code.error_text(), layer.name()))
            .with_item(item.id());
        ctx.emit(drc_item, item.position());
    }
}

/// Tracks, footprint children and zones on disabled copper layers
pub fn test_disabled_layers(ctx: &mut DrcContext) {
    let start = Instant::now();
    let before = ctx.marker_count();
    let board = ctx.board;
    // Copper layers outside the stack count as disabled even when enabled
    let enabled = board.enabled_layers.intersection(&board.copper_layers());
    let disabled = LayerSet::all_copper().difference(&enabled);

    for track in &board.tracks {
        test_item_layer(ctx, track, &disabled);
    }
    for fp in &board.footprints {
        for_each_child(fp, |child| test_item_layer(ctx, child, &disabled));
    }
    for zone in &board.zones {
        test_item_layer(ctx, zone, &disabled);
    }

    info!(
        "[DRC] Disabled layers: {} violations in {:.2?}",
        ctx.marker_count() - before,
        start.elapsed()
    );
}

fn for_each_child<'a>(fp: &'a Footprint, mut f: impl FnMut(&'a dyn BoardItem)) {
    fp.all_texts().for_each(|t| f(t));
    fp.pads.iter().for_each(|p| f(p));
    fp.graphics.iter().for_each(|g| f(g));
    fp.zones.iter().for_each(|z| f(z));
}

fn has_unresolved_var(shown: &str) -> bool {
    shown.find("${").is_some_and(|start| shown[start + 2..].contains('}'))
}

fn flag_unresolved(ctx: &mut DrcContext, text: &Text, shown: &str) {
    if has_unresolved_var(shown) {
        ctx.emit(DrcItem::new(DrcErrorCode::UnresolvedVariable).with_item(text.id), text.position);
    }
}

/// Footprint texts and board texts whose shown text still contains `${...}`
pub fn test_text_vars(ctx: &mut DrcContext) {
    let start = Instant::now();
    let before = ctx.marker_count();
    let board = ctx.board;

    for fp in &board.footprints {
        let layer_name = fp.layers().first().map(LayerId::name).unwrap_or_default();
        let resolve = |name: &str| match name {
            "REFERENCE" => Some(fp.reference_str().to_string()),
            "VALUE" => Some(fp.value_str().to_string()),
            "LAYER" => Some(layer_name.clone()),
            _ => board.resolve_text_var(name),
        };
        for text in fp.all_texts() {
            flag_unresolved(ctx, text, &text.shown_text(&resolve));
        }
    }

    for drawing in &board.drawings {
        if let Drawing::Text(text) = drawing {
            flag_unresolved(ctx, text, &text.shown_text(|name| board.resolve_text_var(name)));
        }
    }

    info!(
        "[DRC] Text variables: {} violations in {:.2?}",
        ctx.marker_count() - before,
        start.elapsed()
    );
}

/// Edge.Cuts graphics of the board and its footprints must chain into closed shapes
pub fn test_board_outline(ctx: &mut DrcContext) {
    let start = Instant::now();
    let board = ctx.board;
    let edges = board
        .drawings
        .iter()
        .filter_map(|d| match d {
            Drawing::Graphic(g) => Some(g),
            Drawing::Text(_) => None,
        })
        .chain(board.footprints.iter().flat_map(|fp| fp.graphics.iter()))
        .filter(|g| g.layer == LayerId::EDGE_CUTS);

    let mut open: Vec<Vec<Point>> = Vec::new();
    let mut closed: Vec<Vec<Point>> = Vec::new();
    let mut count = 0;
    for edge in edges {
        count += 1;
        let (o, c) = edge.outline_pieces();
        open.extend(o);
        closed.extend(c);
    }

    if let Err(at) = build_closed_contours(&open, &closed, CHAINING_EPSILON) {
        let code = DrcErrorCode::InvalidOutline;
        let item = DrcItem::new(code).with_message(format!("{} (not a closed shape)", code.error_text()));
        ctx.emit(item, at);
    }

    info!("[DRC] Board outline: {} edge items in {:.2?}", count, start.elapsed());
}
