use pcb_drc::board::{ItemId, NetClass, Netlist, PrecomputedConnectivity, Component};
use pcb_drc::drc::{CancellationToken, LogReporter, NullReporter, ProgressReporter, RuleFile};
use pcb_drc::{Board, DrcConfig, DrcEngine, DrcErrorCode, DrcServices, RunStatus, RunSummary};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

const BOARD_PATH: &str = "tests/fixtures/keepout_board.json";

fn load_board() -> Board {
    Board::from_json_file(Path::new(BOARD_PATH)).expect("Failed to load board fixture")
}

fn run_with(
    engine: &mut DrcEngine,
    board: &mut Board,
    netlist: Option<&Netlist>,
    reporter: &mut dyn ProgressReporter,
) -> RunSummary {
    let mut connectivity = PrecomputedConnectivity::default();
    let mut services = DrcServices {
        connectivity: &mut connectivity,
        zone_filler: None,
        netlist,
        reporter,
    };
    engine.run(board, &mut services)
}

fn run(engine: &mut DrcEngine, board: &mut Board) -> RunSummary {
    run_with(engine, board, None, &mut NullReporter)
}

fn codes(board: &Board) -> Vec<DrcErrorCode> {
    board.markers.iter().map(|m| m.code()).collect()
}

/// Write a rule file and pin its modification time
fn write_rules(path: &Path, text: &str, secs: u64) {
    let mut file = File::create(path).expect("Failed to create rule file");
    file.write_all(text.as_bytes()).expect("Failed to write rule file");
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .expect("Failed to set rule file time");
}

const RELAXED_RULES: &str = r#"{
    "rules": [{"name": "relaxed", "clearance": 100000}],
    "selectors": [{"match_types": ["track"], "rule": "relaxed"}]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_violations() {
        let mut board = load_board();
        let mut engine = DrcEngine::new(DrcConfig::default());

        let start = Instant::now();
        let summary = run(&mut engine, &mut board);
        println!("DRC run: {} markers in {:.3}ms", summary.marker_count, start.elapsed().as_secs_f64() * 1000.0);

        assert_eq!(summary.status, RunStatus::Finished);
        assert_eq!(codes(&board), vec![DrcErrorCode::TrackTooClose, DrcErrorCode::ViaInsideKeepout]);

        let close = &board.markers[0].item;
        assert_eq!(close.main_item, Some(ItemId(1)));
        assert_eq!(close.aux_item, Some(ItemId(2)));
        assert_eq!(
            close.message,
            "Track too close to track ('Default' netclass clearance 0.2000 mm; actual 0.1500 mm)"
        );

        let keepout = &board.markers[1].item;
        assert_eq!(keepout.main_item, Some(ItemId(3)));
        assert_eq!(keepout.aux_item, Some(ItemId(5)));
    }

    #[test]
    fn test_rerun_gives_same_markers() {
        let mut board = load_board();
        let mut engine = DrcEngine::new(DrcConfig::default());
        run(&mut engine, &mut board);
        let first = board.markers.clone();
        run(&mut engine, &mut board);
        assert_eq!(board.markers, first, "markers are replaced, not accumulated");
    }

    #[test]
    fn test_ignored_codes_produce_no_markers() {
        let mut board = load_board();
        board.design_settings.ignore(DrcErrorCode::TrackTooClose);
        board.design_settings.ignore(DrcErrorCode::ViaInsideKeepout);
        let mut engine = DrcEngine::new(DrcConfig::default());
        let summary = run(&mut engine, &mut board);
        assert_eq!(summary.marker_count, 0);
        assert!(board.markers.is_empty());
    }

    #[test]
    fn test_netclass_failure_stops_before_geometry() {
        let mut board = load_board();
        board.add_net(1, "VCC", Some("Power"));
        board.design_settings.net_classes.classes.insert(
            "Power".to_string(),
            NetClass { track_width: 150_000, ..NetClass::default() },
        );
        let mut engine = DrcEngine::new(DrcConfig::default());
        let summary = run(&mut engine, &mut board);

        assert_eq!(summary.status, RunStatus::Aborted);
        assert_eq!(codes(&board), vec![DrcErrorCode::NetclassTrackWidth]);
        assert_eq!(
            board.markers[0].item.message,
            "NetClass track width < board minimum (board minimum 0.2000 mm; Power netclass 0.1500 mm)"
        );
    }

    #[test]
    fn test_rule_file_reload() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("rules.json");
        write_rules(&path, RELAXED_RULES, 1_000_000);

        let mut board = load_board();
        let mut engine = DrcEngine::new(DrcConfig::default()).with_rule_source(Box::new(RuleFile::new(&path)));

        // A track rule of 0.1 mm allows the 0.15 mm gap
        let summary = run(&mut engine, &mut board);
        assert!(summary.rule_errors.is_empty());
        assert_eq!(engine.rules().rules.len(), 1);
        assert_eq!(codes(&board), vec![DrcErrorCode::ViaInsideKeepout]);

        // A newer file that does not parse leaves no rules
        write_rules(&path, "{ not json", 2_000_000);
        let summary = run(&mut engine, &mut board);
        assert_eq!(summary.rule_errors.len(), 1);
        assert!(engine.rules().rules.is_empty());
        assert_eq!(codes(&board), vec![DrcErrorCode::TrackTooClose, DrcErrorCode::ViaInsideKeepout]);

        // The same broken file is not reloaded; a fixed newer one is
        let summary = run(&mut engine, &mut board);
        assert!(summary.rule_errors.is_empty());
        write_rules(&path, RELAXED_RULES, 3_000_000);
        run(&mut engine, &mut board);
        assert_eq!(codes(&board), vec![DrcErrorCode::ViaInsideKeepout]);

        // Removing the file keeps the rules last loaded
        std::fs::remove_file(&path).expect("Failed to remove rule file");
        run(&mut engine, &mut board);
        assert_eq!(engine.rules().rules.len(), 1);
        assert_eq!(codes(&board), vec![DrcErrorCode::ViaInsideKeepout]);
    }

    #[test]
    fn test_cancel_only_stops_track_pass() {
        let mut board = load_board();
        let token = CancellationToken::new();
        token.cancel();
        let mut reporter = LogReporter::new().with_cancellation(token);
        let mut engine = DrcEngine::new(DrcConfig { track_batch_size: 1, ..DrcConfig::default() });

        let summary = run_with(&mut engine, &mut board, None, &mut reporter);
        assert_eq!(summary.status, RunStatus::Finished);
        assert!(summary.track_phase_cancelled);
        // Track 1 was checked in the first batch; the keepout phase still ran
        assert_eq!(codes(&board), vec![DrcErrorCode::TrackTooClose, DrcErrorCode::ViaInsideKeepout]);
        assert_eq!(reporter.phases(), summary.phases.as_slice());
    }

    #[test]
    fn test_footprints_against_netlist() {
        let mut board = load_board();
        let netlist = Netlist::new(vec![Component { reference: "U1".to_string(), value: "MCU".to_string() }]);
        let mut engine = DrcEngine::new(DrcConfig { test_footprints: true, ..DrcConfig::default() });

        let summary = run_with(&mut engine, &mut board, Some(&netlist), &mut NullReporter);
        assert_eq!(summary.footprint_item_count, 1);
        assert_eq!(engine.footprint_items()[0].code, DrcErrorCode::MissingFootprint);
        assert_eq!(engine.footprint_items()[0].message, "Missing footprint U1 (MCU)");
        assert_eq!(summary.marker_count, 2, "footprint problems are not board markers");
    }

    #[test]
    fn test_summary_serializes() {
        let mut board = load_board();
        let mut engine = DrcEngine::new(DrcConfig::default());
        let summary = run(&mut engine, &mut board);
        let json = serde_json::to_value(&summary).expect("Failed to serialize summary");
        assert_eq!(json["status"], "finished");
        assert_eq!(json["marker_count"], 2);
        assert_eq!(json["phases"][0], "reload_rules");
    }
}
