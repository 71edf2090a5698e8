//! Board model
//!
//! A `Board` owns every item the checker looks at. Items are plain serde
//! structs; the checker reads them through the `BoardItem` trait and refers
//! to them by `ItemId`.
//!
//! # Submodules
//! - `layers` - Layer ids and layer sets
//! - `item` - Item handles, kinds and the `BoardItem` trait
//! - `items` - Tracks, vias, pads, footprints, zones, graphics, texts
//! - `netclass` - Nets, netclasses, design settings
//! - `connectivity` - Connectivity service trait and a precomputed implementation
//! - `zone_fill` - Zone filler trait
//! - `netlist` - Schematic components for the footprint cross-check
//! - `spatial` - R-tree index over item bounding boxes

mod layers;
mod item;
mod items;
mod netclass;
mod connectivity;
mod zone_fill;
mod netlist;
pub mod spatial;

pub use layers::{LayerId, LayerSet};
pub use item::{BoardItem, ItemId, ItemKind};
pub use items::{
    BoardSide, CornerSmoothing, Drawing, DrillShape, Footprint, Graphic, GraphicShape,
    KeepoutRules, Pad, PadAttribute, PadShape, Size, Text, Track, ViaAttrs, ViaType, Zone,
    expand_text_vars,
};
pub use netclass::{DesignSettings, NetClass, NetClasses, NetInfo, DEFAULT_NETCLASS};
pub use connectivity::{Connectivity, DanglingEnd, PrecomputedConnectivity};
pub use zone_fill::ZoneFiller;
pub use netlist::{Component, Netlist};
pub use spatial::SpatialIndex;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::drc::Marker;

/// A pad together with its footprint
#[derive(Clone, Copy, Debug)]
pub struct PadRef<'a> {
    pub footprint: &'a Footprint,
    pub pad: &'a Pad,
}

fn default_enabled_layers() -> LayerSet {
    LayerSet::all()
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub design_settings: DesignSettings,
    #[serde(default = "default_enabled_layers")]
    pub enabled_layers: LayerSet,
    #[serde(default)]
    pub nets: Vec<NetInfo>,
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub footprints: Vec<Footprint>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub drawings: Vec<Drawing>,
    /// Project text variables for `${NAME}` substitution
    #[serde(default)]
    pub text_vars: IndexMap<String, String>,
    /// Markers from the last check run
    #[serde(skip)]
    pub markers: Vec<Marker>,
    #[serde(skip)]
    footprint_index: HashMap<ItemId, usize>,
    #[serde(skip)]
    net_index: HashMap<i32, usize>,
}

impl Board {
    pub fn new() -> Self {
        Self { enabled_layers: LayerSet::all(), ..Default::default() }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let mut board: Board = serde_json::from_str(text).context("parsing board snapshot")?;
        board.link();
        Ok(board)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading board {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("loading board {}", path.display()))
    }

    /// Rebuild parent handles and lookup tables after items were added or loaded
    pub fn link(&mut self) {
        for fp in &mut self.footprints {
            fp.link_children();
        }
        for track in &mut self.tracks {
            if track.is_via() {
                track.end = track.start;
            }
        }
        self.footprint_index = self
            .footprints
            .iter()
            .enumerate()
            .map(|(i, fp)| (fp.id, i))
            .collect();
        self.net_index = self.nets.iter().enumerate().map(|(i, n)| (n.code, i)).collect();
    }

    pub fn add_footprint(&mut self, mut footprint: Footprint) {
        footprint.link_children();
        self.footprint_index.insert(footprint.id, self.footprints.len());
        self.footprints.push(footprint);
    }

    pub fn add_net(&mut self, code: i32, name: &str, netclass: Option<&str>) {
        self.net_index.insert(code, self.nets.len());
        self.nets.push(NetInfo {
            code,
            name: name.to_string(),
            netclass: netclass.map(str::to_string),
        });
    }

    pub fn footprint(&self, id: ItemId) -> Option<&Footprint> {
        match self.footprint_index.get(&id) {
            Some(&i) => self.footprints.get(i).filter(|fp| fp.id == id),
            None => self.footprints.iter().find(|fp| fp.id == id),
        }
    }

    pub fn net(&self, code: i32) -> Option<&NetInfo> {
        match self.net_index.get(&code) {
            Some(&i) => self.nets.get(i).filter(|n| n.code == code),
            None => self.nets.iter().find(|n| n.code == code),
        }
    }

    /// Netclass name and values for a net; unknown nets use the default netclass
    pub fn netclass_for(&self, net: i32) -> (&str, &NetClass) {
        let name = self.net(net).and_then(|n| n.netclass.as_deref());
        self.design_settings.net_classes.find(name)
    }

    pub fn pads(&self) -> impl Iterator<Item = PadRef<'_>> {
        self.footprints
            .iter()
            .flat_map(|fp| fp.pads.iter().map(move |pad| PadRef { footprint: fp, pad }))
    }

    /// Board zones followed by footprint zones
    pub fn all_zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones
            .iter()
            .chain(self.footprints.iter().flat_map(|fp| fp.zones.iter()))
    }

    pub fn copper_layers(&self) -> LayerSet {
        LayerSet::copper_stack(self.design_settings.copper_layer_count)
    }

    /// Resolve a `${NAME}` reference against the board text variables
    pub fn resolve_text_var(&self, name: &str) -> Option<String> {
        self.text_vars.get(name).cloned()
    }
}
