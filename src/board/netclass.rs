//! Nets, netclasses and board-wide design settings

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::drc::DrcErrorCode;
use crate::geometry::{mm_to_iu, Coord};

pub const DEFAULT_NETCLASS: &str = "Default";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetInfo {
    pub code: i32,
    pub name: String,
    /// Netclass name; `None` means the default netclass
    #[serde(default)]
    pub netclass: Option<String>,
}

/// Per-netclass design values
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetClass {
    pub clearance: Coord,
    pub track_width: Coord,
    pub via_diameter: Coord,
    pub via_drill: Coord,
    pub uvia_diameter: Coord,
    pub uvia_drill: Coord,
}

impl Default for NetClass {
    fn default() -> Self {
        Self {
            clearance: mm_to_iu(0.2),
            track_width: mm_to_iu(0.25),
            via_diameter: mm_to_iu(0.8),
            via_drill: mm_to_iu(0.4),
            uvia_diameter: mm_to_iu(0.3),
            uvia_drill: mm_to_iu(0.1),
        }
    }
}

/// The default netclass plus named netclasses in declaration order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetClasses {
    pub default: NetClass,
    pub classes: IndexMap<String, NetClass>,
}

impl NetClasses {
    /// Netclass by name, falling back to the default
    pub fn find(&self, name: Option<&str>) -> (&str, &NetClass) {
        match name.and_then(|n| self.classes.get_key_value(n)) {
            Some((n, nc)) => (n.as_str(), nc),
            None => (DEFAULT_NETCLASS, &self.default),
        }
    }

    /// Default first, then the rest in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NetClass)> {
        std::iter::once((DEFAULT_NETCLASS, &self.default))
            .chain(self.classes.iter().map(|(n, nc)| (n.as_str(), nc)))
    }
}

fn default_ignored() -> BTreeSet<DrcErrorCode> {
    [DrcErrorCode::MissingCourtyard].into_iter().collect()
}

/// Board-wide floors and settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignSettings {
    pub min_clearance: Coord,
    pub track_min_width: Coord,
    pub vias_min_size: Coord,
    pub vias_min_annulus: Coord,
    pub min_through_drill: Coord,
    pub micro_vias_min_size: Coord,
    pub micro_vias_min_drill: Coord,
    pub hole_to_hole_min: Coord,
    pub copper_layer_count: u8,
    pub net_classes: NetClasses,
    /// Codes that never produce markers
    #[serde(default = "default_ignored")]
    pub ignored: BTreeSet<DrcErrorCode>,
}

impl Default for DesignSettings {
    fn default() -> Self {
        Self {
            min_clearance: 0,
            track_min_width: mm_to_iu(0.2),
            vias_min_size: mm_to_iu(0.4),
            vias_min_annulus: mm_to_iu(0.05),
            min_through_drill: mm_to_iu(0.3),
            micro_vias_min_size: mm_to_iu(0.2),
            micro_vias_min_drill: mm_to_iu(0.1),
            hole_to_hole_min: mm_to_iu(0.25),
            copper_layer_count: 2,
            net_classes: NetClasses::default(),
            ignored: default_ignored(),
        }
    }
}

impl DesignSettings {
    /// Floors all zero, so only clearances and netclasses matter
    pub fn without_floors() -> Self {
        Self {
            min_clearance: 0,
            track_min_width: 0,
            vias_min_size: 0,
            vias_min_annulus: 0,
            min_through_drill: 0,
            micro_vias_min_size: 0,
            micro_vias_min_drill: 0,
            hole_to_hole_min: 0,
            ..Self::default()
        }
    }

    pub fn is_ignored(&self, code: DrcErrorCode) -> bool {
        self.ignored.contains(&code)
    }

    pub fn ignore(&mut self, code: DrcErrorCode) {
        self.ignored.insert(code);
    }

    pub fn unignore(&mut self, code: DrcErrorCode) {
        self.ignored.remove(&code);
    }
}
