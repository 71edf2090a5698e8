//! Run a design rule check on a board snapshot
//!
//! Usage:
//!   drc_check <board.json> [--config cfg.json] [--rules rules.json]
//!             [--netlist netlist.json] [--connectivity conn.json]
//!             [--units mm|mils|in] [--output report.json]
//!
//! Exits with 0 when the run finished and 2 when it was aborted by
//! netclass failures. Violations alone do not change the exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use pcb_drc::board::{Netlist, PrecomputedConnectivity};
use pcb_drc::drc::{DrcItem, LogReporter, RuleFile};
use pcb_drc::{Board, DrcConfig, DrcEngine, DrcServices, EdaUnits, Marker, RunStatus, RunSummary};

/// PCB design rule checker
#[derive(Parser)]
#[command(version)]
struct Options {
    /// Board snapshot (JSON)
    board: PathBuf,
    /// Run configuration (JSON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Custom rule file (JSON)
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Schematic netlist (JSON); enables the footprint cross-check
    #[arg(long)]
    netlist: Option<PathBuf>,
    /// Precomputed connectivity results (JSON)
    #[arg(long)]
    connectivity: Option<PathBuf>,
    /// Units for violation messages, overriding the config
    #[arg(long)]
    units: Option<EdaUnits>,
    /// Write the full JSON report here
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a RunSummary,
    markers: &'a [Marker],
    unconnected: &'a [DrcItem],
    footprint_items: &'a [DrcItem],
}

fn run(options: Options) -> Result<RunStatus> {
    let mut board = Board::from_json_file(&options.board)?;

    let mut config = match &options.config {
        Some(path) => DrcConfig::from_json_file(path)?,
        None => DrcConfig::default(),
    };
    if let Some(units) = options.units {
        config.units = units;
    }
    if options.netlist.is_some() {
        config.test_footprints = true;
    }

    let netlist = options.netlist.as_deref().map(Netlist::from_json_file).transpose()?;
    let mut connectivity = match &options.connectivity {
        Some(path) => PrecomputedConnectivity::from_json_file(path)?,
        None => PrecomputedConnectivity::default(),
    };

    let mut engine = DrcEngine::new(config);
    if let Some(path) = options.rules {
        engine = engine.with_rule_source(Box::new(RuleFile::new(path)));
    }

    let mut reporter = LogReporter::new();
    let mut services = DrcServices {
        connectivity: &mut connectivity,
        zone_filler: None,
        netlist: netlist.as_ref(),
        reporter: &mut reporter,
    };
    let summary = engine.run(&mut board, &mut services);

    for marker in &board.markers {
        println!(
            "{:<28} ({:>12}, {:>12})  {}",
            marker.code().key(),
            marker.position.x,
            marker.position.y,
            marker.item.message
        );
    }
    for item in engine.unconnected().iter().chain(engine.footprint_items()) {
        println!("{:<28} {:>28}  {}", item.code.key(), "", item.message);
    }
    println!(
        "{:?}: {} markers, {} unconnected, {} footprint problems",
        summary.status, summary.marker_count, summary.unconnected_count, summary.footprint_item_count
    );

    if let Some(path) = &options.output {
        let report = Report {
            summary: &summary,
            markers: &board.markers,
            unconnected: engine.unconnected(),
            footprint_items: engine.footprint_items(),
        };
        let json = serde_json::to_string_pretty(&report).context("serializing report")?;
        std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    }

    Ok(summary.status)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Options::parse()) {
        Ok(RunStatus::Finished) => ExitCode::SUCCESS,
        Ok(RunStatus::Aborted) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
