//! Run configuration and phase identifiers

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use super::DrcErrorCode;
use crate::units::EdaUnits;

/// Phases in run order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrcPhase {
    ReloadRules,
    NetClasses,
    PadClearances,
    DrillClearances,
    ZoneFills,
    TrackClearances,
    ZoneClearances,
    Unconnected,
    Keepouts,
    CopperGraphics,
    Courtyards,
    Footprints,
    DisabledLayers,
    TextVariables,
    BoardOutline,
}

impl DrcPhase {
    pub const ALL: [DrcPhase; 15] = [
        DrcPhase::ReloadRules,
        DrcPhase::NetClasses,
        DrcPhase::PadClearances,
        DrcPhase::DrillClearances,
        DrcPhase::ZoneFills,
        DrcPhase::TrackClearances,
        DrcPhase::ZoneClearances,
        DrcPhase::Unconnected,
        DrcPhase::Keepouts,
        DrcPhase::CopperGraphics,
        DrcPhase::Courtyards,
        DrcPhase::Footprints,
        DrcPhase::DisabledLayers,
        DrcPhase::TextVariables,
        DrcPhase::BoardOutline,
    ];

    /// Progress label shown while the phase runs
    pub fn label(self) -> &'static str {
        match self {
            DrcPhase::ReloadRules => "Loading design rules...",
            DrcPhase::NetClasses => "Netclasses...",
            DrcPhase::PadClearances => "Pad clearances...",
            DrcPhase::DrillClearances => "Drill clearances...",
            DrcPhase::ZoneFills => "Zone fills...",
            DrcPhase::TrackClearances => "Track clearances...",
            DrcPhase::ZoneClearances => "Zone to zone clearances...",
            DrcPhase::Unconnected => "Unconnected pads...",
            DrcPhase::Keepouts => "Keepout areas ...",
            DrcPhase::CopperGraphics => "Copper graphics and text...",
            DrcPhase::Courtyards => "Courtyard areas...",
            DrcPhase::Footprints => "Footprints vs schematic...",
            DrcPhase::DisabledLayers => "Items on disabled layers...",
            DrcPhase::TextVariables => "Unresolved text variables...",
            DrcPhase::BoardOutline => "Board outline...",
        }
    }

    /// Codes this phase can emit; empty means the phase always runs
    pub fn codes(self) -> &'static [DrcErrorCode] {
        use DrcErrorCode::*;
        match self {
            DrcPhase::ReloadRules | DrcPhase::NetClasses | DrcPhase::ZoneFills => &[],
            DrcPhase::PadClearances => &[PadTooClose, HoleNearPad],
            DrcPhase::DrillClearances => &[
                TooSmallPadDrill, TooSmallViaDrill, TooSmallMicroViaDrill, DrilledHolesTooClose,
            ],
            DrcPhase::TrackClearances => &[],
            DrcPhase::ZoneClearances => &[ZonesIntersect, ZonesTooClose, ZoneHasEmptyNet],
            DrcPhase::Unconnected => &[UnconnectedItems],
            DrcPhase::Keepouts => &[
                TrackInsideKeepout, ViaInsideKeepout, PadInsideKeepout, FootprintInsideKeepout,
            ],
            DrcPhase::CopperGraphics => &[TrackNearCopper, ViaNearCopper, PadNearCopper],
            DrcPhase::Courtyards => &[
                OverlappingFootprints, MissingCourtyard, MalformedCourtyard,
                PthInsideCourtyard, NpthInsideCourtyard,
            ],
            DrcPhase::Footprints => &[DuplicateFootprint, MissingFootprint, ExtraFootprint],
            DrcPhase::DisabledLayers => &[DisabledLayerItem],
            DrcPhase::TextVariables => &[UnresolvedVariable],
            DrcPhase::BoardOutline => &[InvalidOutline],
        }
    }
}

/// Which tests to run and how to report them
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrcConfig {
    pub test_pad_to_pad: bool,
    pub test_unconnected: bool,
    /// Test tracks against filled copper zones
    pub test_zones: bool,
    pub test_keepouts: bool,
    /// Refill all zones before checking instead of only checking fills are current
    pub refill_zones: bool,
    /// Report every violation per track instead of only the first
    pub report_all_track_errors: bool,
    /// Cross-check footprints against the schematic netlist
    pub test_footprints: bool,
    pub units: EdaUnits,
    /// Tracks checked between progress / cancellation callbacks
    pub track_batch_size: usize,
    pub skip_phases: BTreeSet<DrcPhase>,
}

impl Default for DrcConfig {
    fn default() -> Self {
        Self {
            test_pad_to_pad: true,
            test_unconnected: true,
            test_zones: false,
            test_keepouts: true,
            refill_zones: false,
            report_all_track_errors: false,
            test_footprints: false,
            units: EdaUnits::Millimetres,
            track_batch_size: 500,
            skip_phases: BTreeSet::new(),
        }
    }
}

impl DrcConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading DRC config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing DRC config {}", path.display()))
    }

    /// True unless the phase is skipped or switched off by its toggle
    pub fn phase_enabled(&self, phase: DrcPhase) -> bool {
        if self.skip_phases.contains(&phase) {
            return false;
        }
        match phase {
            DrcPhase::PadClearances => self.test_pad_to_pad,
            DrcPhase::Unconnected => self.test_unconnected,
            DrcPhase::Keepouts => self.test_keepouts,
            DrcPhase::Footprints => self.test_footprints,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = DrcConfig::default();
        assert!(cfg.test_pad_to_pad);
        assert!(!cfg.test_zones);
        assert_eq!(cfg.track_batch_size, 500);
        assert!(!cfg.phase_enabled(DrcPhase::Footprints));
        assert!(cfg.phase_enabled(DrcPhase::Courtyards));
    }

    #[test]
    fn test_partial_json_and_skips() {
        let cfg: DrcConfig =
            serde_json::from_str(r#"{"test_zones": true, "skip_phases": ["courtyards"], "units": "mils"}"#).unwrap();
        assert!(cfg.test_zones);
        assert!(cfg.test_unconnected);
        assert_eq!(cfg.units, EdaUnits::Mils);
        assert!(!cfg.phase_enabled(DrcPhase::Courtyards));
    }
}
