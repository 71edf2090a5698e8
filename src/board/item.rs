//! Item handles and the capability trait shared by all board items

use serde::{Deserialize, Serialize};
use std::fmt;

use super::LayerSet;
use crate::geometry::{Coord, Point};

/// Board-unique item handle. Violations refer to items only through these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Track,
    Via,
    Pad,
    Zone,
    Keepout,
    Footprint,
    Graphic,
    Text,
}

impl ItemKind {
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Track => "Track",
            ItemKind::Via => "Via",
            ItemKind::Pad => "Pad",
            ItemKind::Zone => "Zone",
            ItemKind::Keepout => "Keepout area",
            ItemKind::Footprint => "Footprint",
            ItemKind::Graphic => "Graphic",
            ItemKind::Text => "Text",
        }
    }
}

/// Capability queries the checks need from any item
pub trait BoardItem {
    fn id(&self) -> ItemId;

    fn kind(&self) -> ItemKind;

    fn layers(&self) -> LayerSet;

    /// Net code for connectable items, `None` for graphics and texts
    fn net_code(&self) -> Option<i32> {
        None
    }

    /// Item-level clearance override; 0 when unset
    fn local_clearance(&self) -> Coord {
        0
    }

    /// Owning footprint, if any
    fn parent(&self) -> Option<ItemId> {
        None
    }

    fn position(&self) -> Point;

    /// Layer used when a single layer must be named (first of the set)
    fn primary_layer(&self) -> Option<super::LayerId> {
        let layers = self.layers();
        layers.copper().first().or_else(|| layers.first())
    }
}
