//! Connectivity service interface
//!
//! The ratsnest / connectivity graph is built outside the checker. The
//! checker only asks it for unconnected pairs, pad counts per net and
//! dangling track ends.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::{Board, ItemId, Track};
use crate::geometry::Point;

pub trait Connectivity {
    /// Rebuild from the current board state
    fn build(&mut self, board: &Board);

    fn recalculate_ratsnest(&mut self);

    /// Pairs of items that should be connected but are not
    fn unconnected_edges(&self) -> Vec<(ItemId, ItemId)>;

    fn pad_count(&self, net: i32) -> usize;

    /// Position of a dangling end, if the track or via has one
    fn track_endpoint_dangling(&self, track: &Track) -> Option<Point>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingEnd {
    pub track: ItemId,
    pub position: Point,
}

/// Connectivity results computed elsewhere and loaded as data
///
/// Pad counts are derived from the board on `build`; unconnected edges and
/// dangling ends are taken as given.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PrecomputedConnectivity {
    #[serde(default)]
    pub unconnected: Vec<(ItemId, ItemId)>,
    #[serde(default)]
    pub dangling: Vec<DanglingEnd>,
    #[serde(skip)]
    pad_counts: HashMap<i32, usize>,
    #[serde(skip)]
    dangling_index: HashMap<ItemId, Point>,
}

impl PrecomputedConnectivity {
    pub fn new(unconnected: Vec<(ItemId, ItemId)>, dangling: Vec<DanglingEnd>) -> Self {
        Self { unconnected, dangling, ..Default::default() }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading connectivity file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing connectivity file {}", path.display()))
    }
}

impl Connectivity for PrecomputedConnectivity {
    fn build(&mut self, board: &Board) {
        self.pad_counts.clear();
        for pad in board.footprints.iter().flat_map(|fp| fp.pads.iter()) {
            *self.pad_counts.entry(pad.net).or_insert(0) += 1;
        }
        self.dangling_index = self.dangling.iter().map(|d| (d.track, d.position)).collect();
    }

    fn recalculate_ratsnest(&mut self) {}

    fn unconnected_edges(&self) -> Vec<(ItemId, ItemId)> {
        self.unconnected.clone()
    }

    fn pad_count(&self, net: i32) -> usize {
        self.pad_counts.get(&net).copied().unwrap_or(0)
    }

    fn track_endpoint_dangling(&self, track: &Track) -> Option<Point> {
        self.dangling_index.get(&track.id).copied()
    }
}
