//! Design Rule Check engine
//!
//! Runs clearance and consistency testers over a `Board` in a fixed phase
//! order. Candidate pairs come from sorted sweeps or R-tree lookups; exact
//! distances compare squared integers against `(clearance + half widths)²`.
//!
//! # Submodules
//! - `types` - Error codes, violation items, markers
//! - `config` - Run configuration and phase identifiers
//! - `rules` - Rule sets, selectors and rule sources
//! - `resolver` - Clearance resolution with provenance labels
//! - `context` - Per-phase state shared by the testers
//! - `progress` - Progress reporting and cancellation
//! - `geometry` - Clearance shapes for board items
//! - `location` - Marker placement along tracks
//! - `netclass` - Netclass floor checks
//! - `pads` - Pad to pad clearance
//! - `holes` - Drill sizes and hole to hole spacing
//! - `tracks` - Track and via pass
//! - `zones` - Zone nets and zone to zone clearance
//! - `keepout` - Keepout areas
//! - `copper` - Copper graphics and texts
//! - `courtyard` - Courtyard validity, overlap and holes
//! - `footprints` - Footprints versus the schematic netlist
//! - `board_checks` - Disabled layers, text variables, board outline
//! - `runner` - Phase sequencing (`DrcEngine`)

mod types;
mod config;
mod rules;
mod resolver;
mod context;
mod progress;
pub mod geometry;
pub mod location;
mod netclass;
mod pads;
mod holes;
mod tracks;
mod zones;
mod keepout;
mod copper;
mod courtyard;
mod footprints;
mod board_checks;
mod runner;

// Re-export public types
pub use types::{DrcErrorCode, DrcItem, Marker};
pub use config::{DrcConfig, DrcPhase};
pub use rules::{DrcRule, RuleError, RuleFile, RuleSelector, RuleSet, RuleSource};
pub use resolver::ClearanceResolver;
pub use context::DrcContext;
pub use progress::{CancellationToken, LogReporter, NullReporter, ProgressReporter};

// Re-export testers
pub use netclass::test_netclasses;
pub use pads::test_pad_to_pad;
pub use holes::DrilledHoleTester;
pub use tracks::{test_tracks, TrackPassOutcome};
pub use zones::{test_zones, CONTACT_GRID};
pub use keepout::test_keepout_areas;
pub use copper::test_copper_graphics;
pub use courtyard::CourtyardTester;
pub use footprints::test_footprints;
pub use board_checks::{test_board_outline, test_disabled_layers, test_text_vars};
pub use location::MARKER_EPSILON;

pub use runner::{DrcEngine, DrcServices, RunStatus, RunSummary};
