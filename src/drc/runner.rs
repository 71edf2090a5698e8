//! DRC runner
//!
//! `DrcEngine` owns the cached rule set and the results kept off the board
//! (unconnected items, footprint cross-check). `run` walks the phases in
//! order, attaches markers to the board as each phase completes and returns
//! a `RunSummary`.

use std::time::{Instant, SystemTime};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::board::{Board, Connectivity, ItemId, Netlist, ZoneFiller};

use super::board_checks::{test_board_outline, test_disabled_layers, test_text_vars};
use super::copper::test_copper_graphics;
use super::courtyard::CourtyardTester;
use super::footprints::test_footprints;
use super::holes::DrilledHoleTester;
use super::keepout::test_keepout_areas;
use super::netclass::test_netclasses;
use super::pads::test_pad_to_pad;
use super::tracks::test_tracks;
use super::zones::test_zones;
use super::{
    DrcConfig, DrcContext, DrcErrorCode, DrcItem, DrcPhase, Marker, ProgressReporter, RuleSet,
    RuleSource,
};

/// Collaborators a run reads from or drives
pub struct DrcServices<'s> {
    pub connectivity: &'s mut dyn Connectivity,
    pub zone_filler: Option<&'s mut dyn ZoneFiller>,
    /// Schematic netlist; the footprint cross-check is skipped without one
    pub netlist: Option<&'s Netlist>,
    pub reporter: &'s mut dyn ProgressReporter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Finished,
    /// Stopped after the netclass checks failed
    Aborted,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    /// Phases that ran, in order
    pub phases: Vec<DrcPhase>,
    pub track_phase_cancelled: bool,
    pub rule_errors: Vec<String>,
    pub zone_fill_errors: Vec<String>,
    /// Zones whose fill was out of date when fills were only checked
    pub stale_zones: Vec<ItemId>,
    pub marker_count: usize,
    pub unconnected_count: usize,
    pub footprint_item_count: usize,
    pub elapsed_ms: u128,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            status: RunStatus::Finished,
            phases: Vec::new(),
            track_phase_cancelled: false,
            rule_errors: Vec::new(),
            zone_fill_errors: Vec::new(),
            stale_zones: Vec::new(),
            marker_count: 0,
            unconnected_count: 0,
            footprint_item_count: 0,
            elapsed_ms: 0,
        }
    }
}

pub struct DrcEngine {
    config: DrcConfig,
    rule_source: Option<Box<dyn RuleSource>>,
    rules: RuleSet,
    /// Modification time of the rule definition last loaded
    rules_modified: Option<SystemTime>,
    unconnected: Vec<DrcItem>,
    footprint_items: Vec<DrcItem>,
}

impl DrcEngine {
    pub fn new(config: DrcConfig) -> Self {
        Self {
            config,
            rule_source: None,
            rules: RuleSet::default(),
            rules_modified: None,
            unconnected: Vec::new(),
            footprint_items: Vec::new(),
        }
    }

    pub fn with_rule_source(mut self, source: Box<dyn RuleSource>) -> Self {
        self.rule_source = Some(source);
        self.rules_modified = None;
        self
    }

    /// Replace the cached rules; a rule source may still reload them
    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }

    pub fn config(&self) -> &DrcConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DrcConfig {
        &mut self.config
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Unconnected items found by the last run
    pub fn unconnected(&self) -> &[DrcItem] {
        &self.unconnected
    }

    /// Footprint versus netlist problems found by the last run
    pub fn footprint_items(&self) -> &[DrcItem] {
        &self.footprint_items
    }

    /// Reload the rules when the source changed since the last load
    ///
    /// A missing definition keeps the current rules. A definition that fails
    /// to load leaves no rules at all.
    fn reload_rules(&mut self, summary: &mut RunSummary) {
        let Some(source) = &self.rule_source else {
            return;
        };
        let Some(modified) = source.modified() else {
            return;
        };
        if self.rules_modified.is_some_and(|last| modified <= last) {
            return;
        }
        self.rules_modified = Some(modified);

        match source.load() {
            Ok(rules) => {
                info!(
                    "[DRC] Loaded {} rules, {} selectors from {}",
                    rules.rules.len(),
                    rules.selectors.len(),
                    source.describe()
                );
                self.rules = rules;
            }
            Err(e) => {
                error!("[DRC] Rules discarded: {}", e);
                self.rules.clear();
                summary.rule_errors.push(e.to_string());
            }
        }
    }

    /// True when the phase is enabled and at least one of its codes is reported
    fn should_run(&self, board: &Board, phase: DrcPhase) -> bool {
        if !self.config.phase_enabled(phase) {
            return false;
        }
        let codes = phase.codes();
        codes.is_empty() || codes.iter().any(|c| !board.design_settings.is_ignored(*c))
    }

    fn begin(&self, board: &Board, phase: DrcPhase, summary: &mut RunSummary, services: &mut DrcServices) -> bool {
        if !self.should_run(board, phase) {
            return false;
        }
        services.reporter.phase(phase);
        summary.phases.push(phase);
        true
    }

    /// Run a tester that reports into a context and attach its markers
    fn run_context_phase<F>(&self, board: &mut Board, test: F)
    where
        F: FnOnce(&mut DrcContext),
    {
        let markers = {
            let mut ctx = DrcContext::new(board, &self.rules, self.config.units);
            test(&mut ctx);
            ctx.take_markers()
        };
        board.markers.extend(markers);
    }

    pub fn run(&mut self, board: &mut Board, services: &mut DrcServices) -> RunSummary {
        let start = Instant::now();
        let mut summary = RunSummary::new();
        board.markers.clear();
        self.unconnected.clear();
        self.footprint_items.clear();

        if self.begin(board, DrcPhase::ReloadRules, &mut summary, services) {
            self.reload_rules(&mut summary);
        }

        if self.begin(board, DrcPhase::NetClasses, &mut summary, services) {
            let (ok, markers) = {
                let mut ctx = DrcContext::new(board, &self.rules, self.config.units);
                let ok = test_netclasses(&mut ctx);
                (ok, ctx.take_markers())
            };
            board.markers.extend(markers);
            if !ok {
                warn!("[DRC] Netclass values below board minimums, aborting");
                return self.finish(board, summary, RunStatus::Aborted, start);
            }
        }

        if self.begin(board, DrcPhase::PadClearances, &mut summary, services) {
            self.run_context_phase(board, test_pad_to_pad);
        }

        if self.begin(board, DrcPhase::DrillClearances, &mut summary, services) {
            let mut found: Vec<Marker> = Vec::new();
            {
                let ctx = DrcContext::new(board, &self.rules, self.config.units);
                DrilledHoleTester::new(|m| found.push(m)).run(&ctx);
            }
            board.markers.extend(found);
        }

        if self.begin(board, DrcPhase::ZoneFills, &mut summary, services) {
            self.zone_fills(board, services, &mut summary);
        }

        // Refilled zones change connectivity; later phases read the rebuilt graph
        services.connectivity.build(board);

        if self.begin(board, DrcPhase::TrackClearances, &mut summary, services) {
            let (outcome, markers) = {
                let mut ctx = DrcContext::new(board, &self.rules, self.config.units);
                let outcome = test_tracks(&mut ctx, &self.config, &*services.connectivity, &mut *services.reporter);
                (outcome, ctx.take_markers())
            };
            board.markers.extend(markers);
            summary.track_phase_cancelled = outcome.cancelled;
        }

        if self.begin(board, DrcPhase::ZoneClearances, &mut summary, services) {
            let connectivity = &*services.connectivity;
            self.run_context_phase(board, |ctx| test_zones(ctx, connectivity));
        }

        if self.begin(board, DrcPhase::Unconnected, &mut summary, services) {
            self.unconnected_items(board, services);
        }

        if self.begin(board, DrcPhase::Keepouts, &mut summary, services) {
            self.run_context_phase(board, test_keepout_areas);
        }

        if self.begin(board, DrcPhase::CopperGraphics, &mut summary, services) {
            self.run_context_phase(board, test_copper_graphics);
        }

        if self.begin(board, DrcPhase::Courtyards, &mut summary, services) {
            let mut found: Vec<Marker> = Vec::new();
            {
                let ctx = DrcContext::new(board, &self.rules, self.config.units);
                CourtyardTester::new(|m| found.push(m)).run(&ctx);
            }
            board.markers.extend(found);
        }

        if let Some(netlist) = services.netlist {
            if self.begin(board, DrcPhase::Footprints, &mut summary, services) {
                self.footprint_items = test_footprints(board, netlist);
            }
        }

        if self.begin(board, DrcPhase::DisabledLayers, &mut summary, services) {
            self.run_context_phase(board, test_disabled_layers);
        }

        if self.begin(board, DrcPhase::TextVariables, &mut summary, services) {
            self.run_context_phase(board, test_text_vars);
        }

        if self.begin(board, DrcPhase::BoardOutline, &mut summary, services) {
            self.run_context_phase(board, test_board_outline);
        }

        self.finish(board, summary, RunStatus::Finished, start)
    }

    fn zone_fills(&self, board: &mut Board, services: &mut DrcServices, summary: &mut RunSummary) {
        let Some(filler) = services.zone_filler.as_deref_mut() else {
            return;
        };
        if self.config.refill_zones {
            if let Err(e) = filler.fill_all(board) {
                error!("[DRC] Zone fill failed: {:#}", e);
                summary.zone_fill_errors.push(format!("{:#}", e));
            }
        } else {
            let stale = filler.check_all(board);
            if !stale.is_empty() {
                warn!("[DRC] {} zone fills are out of date", stale.len());
            }
            summary.stale_zones = stale;
        }
    }

    fn unconnected_items(&mut self, board: &Board, services: &mut DrcServices) {
        services.connectivity.build(board);
        services.connectivity.recalculate_ratsnest();
        self.unconnected = services
            .connectivity
            .unconnected_edges()
            .into_iter()
            .map(|(a, b)| DrcItem::new(DrcErrorCode::UnconnectedItems).with_items(a, b))
            .collect();
        info!("[DRC] Unconnected: {} items", self.unconnected.len());
    }

    fn finish(&self, board: &Board, mut summary: RunSummary, status: RunStatus, start: Instant) -> RunSummary {
        summary.status = status;
        summary.marker_count = board.markers.len();
        summary.unconnected_count = self.unconnected.len();
        summary.footprint_item_count = self.footprint_items.len();
        summary.elapsed_ms = start.elapsed().as_millis();
        info!(
            "[DRC] {:?}: {} markers, {} unconnected, {} footprint problems in {:.2?}",
            status,
            summary.marker_count,
            summary.unconnected_count,
            summary.footprint_item_count,
            start.elapsed()
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{
        LayerId, NetClass, PrecomputedConnectivity, Track, DesignSettings,
    };
    use crate::drc::NullReporter;
    use crate::geometry::Point;

    fn run(engine: &mut DrcEngine, board: &mut Board) -> RunSummary {
        let mut conn = PrecomputedConnectivity::new(vec![(ItemId(1), ItemId(2))], Vec::new());
        let mut reporter = NullReporter;
        let mut services = DrcServices {
            connectivity: &mut conn,
            zone_filler: None,
            netlist: None,
            reporter: &mut reporter,
        };
        engine.run(board, &mut services)
    }

    #[test]
    fn test_phase_order_and_netlist_skip() {
        let mut board = Board::new();
        let mut engine = DrcEngine::new(DrcConfig { test_footprints: true, ..DrcConfig::default() });
        let summary = run(&mut engine, &mut board);
        assert_eq!(summary.status, RunStatus::Finished);
        assert!(!summary.phases.contains(&DrcPhase::Footprints), "no netlist, no cross-check");
        assert_eq!(summary.phases.first(), Some(&DrcPhase::ReloadRules));
        assert_eq!(summary.phases.last(), Some(&DrcPhase::BoardOutline));
        assert_eq!(engine.unconnected().len(), 1);
        assert_eq!(engine.unconnected()[0].code, DrcErrorCode::UnconnectedItems);
    }

    #[test]
    fn test_netclass_failure_aborts() {
        let mut board = Board::new();
        board.design_settings.net_classes.default = NetClass { track_width: 1, ..NetClass::default() };
        board.tracks.push(Track::segment(1, Point::new(0, 0), Point::new(10, 0), 1, LayerId::F_CU, 1));
        let mut engine = DrcEngine::new(DrcConfig::default());
        let summary = run(&mut engine, &mut board);
        assert_eq!(summary.status, RunStatus::Aborted);
        assert_eq!(summary.phases, vec![DrcPhase::ReloadRules, DrcPhase::NetClasses]);
        assert_eq!(board.markers.len(), 1);
        assert_eq!(board.markers[0].code(), DrcErrorCode::NetclassTrackWidth);
        assert!(engine.unconnected().is_empty());
    }

    struct StubFiller {
        fail: bool,
        filled: usize,
    }

    impl ZoneFiller for StubFiller {
        fn fill_all(&mut self, _board: &mut Board) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("no copper to pour");
            }
            self.filled += 1;
            Ok(())
        }

        fn check_all(&mut self, _board: &Board) -> Vec<ItemId> {
            vec![ItemId(7)]
        }
    }

    fn run_with_filler(config: DrcConfig, filler: &mut StubFiller) -> RunSummary {
        let mut board = Board::new();
        let mut conn = PrecomputedConnectivity::default();
        let mut reporter = NullReporter;
        let mut services = DrcServices {
            connectivity: &mut conn,
            zone_filler: Some(filler as &mut dyn ZoneFiller),
            netlist: None,
            reporter: &mut reporter,
        };
        DrcEngine::new(config).run(&mut board, &mut services)
    }

    #[test]
    fn test_zone_fill_check_and_refill() {
        let mut filler = StubFiller { fail: false, filled: 0 };
        let summary = run_with_filler(DrcConfig::default(), &mut filler);
        assert_eq!(summary.stale_zones, vec![ItemId(7)]);
        assert_eq!(filler.filled, 0);

        let summary = run_with_filler(DrcConfig { refill_zones: true, ..DrcConfig::default() }, &mut filler);
        assert!(summary.stale_zones.is_empty());
        assert_eq!(filler.filled, 1);
    }

    #[test]
    fn test_zone_fill_failure_is_recorded() {
        let mut filler = StubFiller { fail: true, filled: 0 };
        let summary = run_with_filler(DrcConfig { refill_zones: true, ..DrcConfig::default() }, &mut filler);
        assert_eq!(summary.status, RunStatus::Finished);
        assert_eq!(summary.zone_fill_errors, vec!["no copper to pour".to_string()]);
        assert_eq!(summary.phases.last(), Some(&DrcPhase::BoardOutline));
    }

    /// Records calls along with the track count seen on each build
    #[derive(Default)]
    struct RecordingConnectivity {
        calls: Vec<String>,
    }

    impl Connectivity for RecordingConnectivity {
        fn build(&mut self, board: &Board) {
            self.calls.push(format!("build({} tracks)", board.tracks.len()));
        }

        fn recalculate_ratsnest(&mut self) {
            self.calls.push("ratsnest".to_string());
        }

        fn unconnected_edges(&self) -> Vec<(ItemId, ItemId)> {
            Vec::new()
        }

        fn pad_count(&self, _net: i32) -> usize {
            0
        }

        fn track_endpoint_dangling(&self, _track: &Track) -> Option<Point> {
            None
        }
    }

    /// Refill that adds copper the connectivity graph has to see
    struct TrackAddingFiller;

    impl ZoneFiller for TrackAddingFiller {
        fn fill_all(&mut self, board: &mut Board) -> anyhow::Result<()> {
            board.tracks.push(Track::segment(9, Point::new(0, 0), Point::new(1_000_000, 0), 250_000, LayerId::F_CU, 1));
            Ok(())
        }

        fn check_all(&mut self, _board: &Board) -> Vec<ItemId> {
            Vec::new()
        }
    }

    #[test]
    fn test_connectivity_rebuilt_after_refill() {
        let mut board = Board::new();
        let mut conn = RecordingConnectivity::default();
        let mut filler = TrackAddingFiller;
        let mut reporter = NullReporter;
        let mut services = DrcServices {
            connectivity: &mut conn,
            zone_filler: Some(&mut filler as &mut dyn ZoneFiller),
            netlist: None,
            reporter: &mut reporter,
        };
        let summary = DrcEngine::new(DrcConfig { refill_zones: true, ..DrcConfig::default() })
            .run(&mut board, &mut services);
        assert_eq!(summary.status, RunStatus::Finished);
        assert_eq!(conn.calls, vec!["build(1 tracks)", "build(1 tracks)", "ratsnest"]);
    }

    #[test]
    fn test_fully_ignored_phase_skipped() {
        let mut board = Board::new();
        board.design_settings = DesignSettings::without_floors();
        board.design_settings.ignore(DrcErrorCode::InvalidOutline);
        let mut engine = DrcEngine::new(DrcConfig::default());
        let summary = run(&mut engine, &mut board);
        assert!(!summary.phases.contains(&DrcPhase::BoardOutline));
        assert!(summary.phases.contains(&DrcPhase::TextVariables));
    }
}
