//! Design rule checking for printed circuit boards
//!
//! # Modules
//! - `geometry` - Integer geometry: points, segments, polygons, clearance shapes
//! - `board` - Board model loaded from JSON snapshots
//! - `drc` - Testers, rule resolution and the phase runner
//! - `units` - Unit formatting for violation messages

pub mod geometry;
pub mod board;
pub mod drc;
pub mod units;

pub use board::Board;
pub use drc::{DrcConfig, DrcEngine, DrcErrorCode, DrcServices, Marker, RunStatus, RunSummary};
pub use units::EdaUnits;
