//! Track and via pass
//!
//! Each track is checked once, in board order, against:
//! - the board size floors (width, via size, annulus, drill, micro via span)
//! - nearby pads, including holes of pads on other layers
//! - the tracks after it in the list
//! - filled copper zones, when zone testing is enabled
//!
//! Candidates come from R-trees inflated by the largest clearance on the
//! board. The pass reports progress every `track_batch_size` tracks and can
//! be cancelled there; markers found before cancelling are kept.

use std::time::Instant;

use crate::board::{BoardItem, Connectivity, PadRef, SpatialIndex, Track, ViaType, Zone};
use crate::geometry::{Point, Seg, Shape};
use tracing::info;

use super::geometry::{get_hole_shape, get_pad_polygon, get_pad_shape, get_track_shape};
use super::location::{location_in_area, location_in_zone, location_near_seg};
use super::{DrcConfig, DrcContext, DrcErrorCode, DrcItem, Marker, ProgressReporter};

/// Result of one track pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackPassOutcome {
    /// Tracks fully checked
    pub checked: usize,
    pub cancelled: bool,
}

/// Everything built once per pass
struct TrackEnv<'a> {
    track_shapes: Vec<Shape>,
    track_index: SpatialIndex<usize>,
    pads: Vec<PadRef<'a>>,
    pad_shapes: Vec<Shape>,
    pad_index: SpatialIndex<usize>,
    zones: Vec<&'a Zone>,
    zone_shapes: Vec<Shape>,
}

impl<'a> TrackEnv<'a> {
    fn build(ctx: &DrcContext<'a>, test_zones: bool) -> Self {
        let board = ctx.board;
        let track_shapes: Vec<Shape> = board.tracks.iter().map(get_track_shape).collect();
        let track_index = SpatialIndex::new(board.tracks.iter().enumerate().map(|(i, t)| (i, t.bbox())));

        let pads: Vec<PadRef<'a>> = board.pads().collect();
        let pad_shapes: Vec<Shape> = pads.iter().map(|p| get_pad_shape(p.pad)).collect();
        let pad_index = SpatialIndex::new(pad_shapes.iter().enumerate().map(|(i, s)| (i, s.bbox())));

        let zones: Vec<&Zone> = if test_zones {
            board
                .all_zones()
                .filter(|z| z.is_filled && !z.is_keepout() && z.is_on_copper_layer())
                .collect()
        } else {
            Vec::new()
        };
        let zone_shapes = zones.iter().map(|z| Shape::area(z.filled_polys.clone(), 0)).collect();

        Self { track_shapes, track_index, pads, pad_shapes, pad_index, zones, zone_shapes }
    }
}

/// Violations for one reference track
struct Findings<'c, 'a> {
    ctx: &'c DrcContext<'a>,
    markers: Vec<Marker>,
    report_all: bool,
}

impl Findings<'_, '_> {
    /// Record a violation; true once the track needs no further checks
    fn add(&mut self, item: DrcItem, position: Point) -> bool {
        if self.ctx.is_ignored(item.code) {
            return false;
        }
        self.markers.push(Marker::new(item, position));
        !self.report_all
    }
}

pub fn test_tracks(
    ctx: &mut DrcContext,
    config: &DrcConfig,
    connectivity: &dyn Connectivity,
    reporter: &mut dyn ProgressReporter,
) -> TrackPassOutcome {
    let start = Instant::now();
    let board = ctx.board;
    let total = board.tracks.len();
    let env = TrackEnv::build(ctx, config.test_zones);
    let batch = config.track_batch_size.max(1);

    let before = ctx.marker_count();
    let mut flushed = before;
    let mut outcome = TrackPassOutcome::default();

    for (i, track) in board.tracks.iter().enumerate() {
        if i > 0 && i % batch == 0 {
            reporter.markers_added(&ctx.markers()[flushed..]);
            flushed = ctx.marker_count();
            if !reporter.progress(i, total) {
                info!("[DRC] Track clearances cancelled after {}/{} tracks", i, total);
                outcome.cancelled = true;
                break;
            }
        }

        let markers = check_track(ctx, &env, i, config.report_all_track_errors);
        for marker in markers {
            ctx.report(marker);
        }

        let code = if track.is_via() { DrcErrorCode::DanglingVia } else { DrcErrorCode::DanglingTrack };
        if !ctx.is_ignored(code) {
            if let Some(pos) = connectivity.track_endpoint_dangling(track) {
                ctx.emit(DrcItem::new(code).with_item(track.id), pos);
            }
        }
        outcome.checked += 1;
    }
    reporter.markers_added(&ctx.markers()[flushed..]);

    info!(
        "[DRC] Track clearances: {}/{} tracks, {} pads, {} zones, {} violations in {:.2?}",
        outcome.checked,
        total,
        env.pads.len(),
        env.zones.len(),
        ctx.marker_count() - before,
        start.elapsed()
    );
    outcome
}

fn check_track(ctx: &DrcContext, env: &TrackEnv, index: usize, report_all: bool) -> Vec<Marker> {
    let mut found = Findings { ctx, markers: Vec::new(), report_all };
    let track = &ctx.board.tracks[index];

    // Each check returns true when the track is done
    let _ = check_track_sizes(&mut found, track)
        || check_track_pads(&mut found, env, index)
        || check_track_tracks(&mut found, env, index)
        || check_track_zones(&mut found, env, index);
    found.markers
}

// ═══════════════════════════════════════════════════════════════════════════
// SIZE FLOORS
// ═══════════════════════════════════════════════════════════════════════════

fn check_track_sizes(found: &mut Findings, track: &Track) -> bool {
    let ctx = found.ctx;
    let ds = &ctx.board.design_settings;

    let Some(via) = &track.via else {
        if track.width < ds.track_min_width {
            let code = DrcErrorCode::TooSmallTrackWidth;
            let item = DrcItem::new(code)
                .with_message(ctx.floor_message(code, ds.track_min_width, track.width))
                .with_item(track.id);
            return found.add(item, track.seg().center());
        }
        return false;
    };

    let micro = via.via_type == ViaType::Micro;
    let (code, min_size) = if micro {
        (DrcErrorCode::TooSmallMicroVia, ds.micro_vias_min_size)
    } else {
        (DrcErrorCode::TooSmallVia, ds.vias_min_size)
    };
    if track.width < min_size {
        let item = DrcItem::new(code)
            .with_message(ctx.floor_message(code, min_size, track.width))
            .with_item(track.id);
        if found.add(item, track.start) {
            return true;
        }
    }

    if !micro {
        let annulus = (track.width - via.drill).div_euclid(2);
        if annulus < ds.vias_min_annulus {
            let code = DrcErrorCode::ViaAnnulusTooSmall;
            let item = DrcItem::new(code)
                .with_message(ctx.floor_message(code, ds.vias_min_annulus, annulus))
                .with_item(track.id);
            if found.add(item, track.start) {
                return true;
            }
        }
    }

    if via.drill >= track.width {
        let code = DrcErrorCode::ViaHoleBigger;
        let msg = format!(
            "{} (diameter {}; drill {})",
            code.error_text(),
            ctx.format_value(track.width),
            ctx.format_value(via.drill)
        );
        if found.add(DrcItem::new(code).with_message(msg).with_item(track.id), track.start) {
            return true;
        }
    }

    if micro {
        let layers = ds.copper_layer_count;
        let top = track.layer.stack_position(layers);
        let bottom = via.bottom_layer.stack_position(layers);
        if top.abs_diff(bottom) > 1 {
            let code = DrcErrorCode::MicroViaTooManyLayers;
            let msg = format!("{} ({} to {})", code.error_text(), track.layer, via.bottom_layer);
            if found.add(DrcItem::new(code).with_message(msg).with_item(track.id), track.start) {
                return true;
            }
        }
    }
    false
}

// ═══════════════════════════════════════════════════════════════════════════
// PAIRWISE
// ═══════════════════════════════════════════════════════════════════════════

fn check_track_pads(found: &mut Findings, env: &TrackEnv, index: usize) -> bool {
    let ctx = found.ctx;
    let track = &ctx.board.tracks[index];
    let shape = &env.track_shapes[index];
    let track_cu = track.layers().copper();

    for pi in env.pad_index.query(&track.bbox(), ctx.max_clearance()) {
        let pad = env.pads[pi].pad;
        if pad.net != 0 && pad.net == track.net {
            continue;
        }

        if !pad.layers.copper().intersects(&track_cu) {
            // No copper in common; the drill still cuts through the track's layer
            let Some(hole) = get_hole_shape(pad) else {
                continue;
            };
            let (min, source) = ctx.resolver.clearance(track, Some(pad));
            if let Some(actual) = shape.check_clearance(&hole, min) {
                let code = DrcErrorCode::HoleNearTrack;
                let item = DrcItem::new(code)
                    .with_message(ctx.clearance_message(code, &source, min, actual))
                    .with_items(track.id, pad.id);
                let pos = location_near_seg(track, &Seg::new(pad.position, pad.position));
                if found.add(item, pos) {
                    return true;
                }
            }
            continue;
        }

        let (min, source) = ctx.resolver.clearance(track, Some(pad));
        if let Some(actual) = shape.check_clearance(&env.pad_shapes[pi], min) {
            let code = if track.is_via() { DrcErrorCode::ViaNearPad } else { DrcErrorCode::TrackNearPad };
            let item = DrcItem::new(code)
                .with_message(ctx.clearance_message(code, &source, min, actual))
                .with_items(track.id, pad.id);
            let pos = if track.is_via() {
                track.start
            } else {
                location_in_area(track, &get_pad_polygon(pad))
            };
            if found.add(item, pos) {
                return true;
            }
        }
    }
    false
}

fn check_track_tracks(found: &mut Findings, env: &TrackEnv, index: usize) -> bool {
    let ctx = found.ctx;
    let tracks = &ctx.board.tracks;
    let track = &tracks[index];
    let track_cu = track.layers().copper();

    for j in env.track_index.query(&track.bbox(), ctx.max_clearance()) {
        if j <= index {
            continue;
        }
        let other = &tracks[j];
        if other.net == track.net {
            continue;
        }
        if !other.layers().copper().intersects(&track_cu) {
            continue;
        }
        let (min, source) = ctx.resolver.clearance(track, Some(other));
        if let Some(actual) = env.track_shapes[index].check_clearance(&env.track_shapes[j], min) {
            let code = if track.is_via() || other.is_via() {
                DrcErrorCode::ViaTooClose
            } else {
                DrcErrorCode::TrackTooClose
            };
            let item = DrcItem::new(code)
                .with_message(ctx.clearance_message(code, &source, min, actual))
                .with_items(track.id, other.id);
            if found.add(item, location_near_seg(track, &other.seg())) {
                return true;
            }
        }
    }
    false
}

fn check_track_zones(found: &mut Findings, env: &TrackEnv, index: usize) -> bool {
    let ctx = found.ctx;
    let track = &ctx.board.tracks[index];
    let track_cu = track.layers().copper();
    let reach = track.bbox().inflated(ctx.max_clearance());

    for (zi, zone) in env.zones.iter().enumerate() {
        if zone.net == track.net || !zone.layers.intersects(&track_cu) {
            continue;
        }
        if !zone.bbox().intersects(&reach) {
            continue;
        }
        let (min, source) = ctx.resolver.clearance(track, Some(*zone));
        if let Some(actual) = env.track_shapes[index].check_clearance(&env.zone_shapes[zi], min) {
            let code = if track.is_via() { DrcErrorCode::ViaNearZone } else { DrcErrorCode::TrackNearZone };
            let item = DrcItem::new(code)
                .with_message(ctx.clearance_message(code, &source, min, actual))
                .with_items(track.id, zone.id);
            if found.add(item, location_in_zone(track, zone)) {
                return true;
            }
        }
    }
    false
}
