//! DRC data types
//!
//! The closed error taxonomy, violation records and positioned markers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::board::ItemId;
use crate::geometry::Point;

macro_rules! error_codes {
    ($($variant:ident => ($key:literal, $text:literal)),+ $(,)?) => {
        /// Every kind of violation the checker can report
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum DrcErrorCode {
            $($variant),+
        }

        impl DrcErrorCode {
            pub const ALL: &'static [DrcErrorCode] = &[$(DrcErrorCode::$variant),+];

            /// Stable kebab-case key, used in settings and reports
            pub fn key(self) -> &'static str {
                match self {
                    $(DrcErrorCode::$variant => $key),+
                }
            }

            /// Human readable description
            pub fn error_text(self) -> &'static str {
                match self {
                    $(DrcErrorCode::$variant => $text),+
                }
            }

            pub fn from_key(key: &str) -> Option<DrcErrorCode> {
                match key {
                    $($key => Some(DrcErrorCode::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

error_codes! {
    // Netclass floors
    NetclassClearance => ("netclass-clearance", "NetClass clearance < board minimum"),
    NetclassTrackWidth => ("netclass-trackwidth", "NetClass track width < board minimum"),
    NetclassViaSize => ("netclass-viasize", "NetClass via size < board minimum"),
    NetclassViaDrill => ("netclass-viadrill", "NetClass via drill < board minimum"),
    NetclassViaAnnulus => ("netclass-via-annulus", "NetClass via annulus < board minimum"),
    NetclassMicroViaSize => ("netclass-uviasize", "NetClass micro via size < board minimum"),
    NetclassMicroViaDrill => ("netclass-uviadrill", "NetClass micro via drill < board minimum"),

    // Copper clearance
    PadTooClose => ("pad-too-close", "Pad too close to pad"),
    HoleNearPad => ("hole-near-pad", "Hole too close to pad"),
    HoleNearTrack => ("hole-near-track", "Hole too close to track"),
    TrackTooClose => ("track-too-close", "Track too close to track"),
    ViaTooClose => ("via-too-close", "Via too close to track or via"),
    TrackNearPad => ("track-near-pad", "Track too close to pad"),
    ViaNearPad => ("via-near-pad", "Via too close to pad"),
    TrackNearZone => ("track-near-zone", "Track too close to copper area"),
    ViaNearZone => ("via-near-zone", "Via too close to copper area"),
    TrackNearCopper => ("track-near-copper", "Track too close to copper graphic or text"),
    ViaNearCopper => ("via-near-copper", "Via too close to copper graphic or text"),
    PadNearCopper => ("pad-near-copper", "Pad too close to copper graphic or text"),
    ZonesIntersect => ("zones-intersect", "Copper areas intersect"),
    ZonesTooClose => ("zones-too-close", "Copper areas too close"),
    ZoneHasEmptyNet => ("zone-has-empty-net", "Copper zone net has no pads"),

    // Keepouts
    TrackInsideKeepout => ("track-inside-keepout", "Track inside keepout area"),
    ViaInsideKeepout => ("via-inside-keepout", "Via inside keepout area"),
    PadInsideKeepout => ("pad-inside-keepout", "Pad inside keepout area"),
    FootprintInsideKeepout => ("footprint-inside-keepout", "Footprint inside keepout area"),

    // Item sizes and holes
    TooSmallTrackWidth => ("too-small-track-width", "Track width too small"),
    TooSmallVia => ("too-small-via", "Via size too small"),
    TooSmallMicroVia => ("too-small-microvia", "Micro via size too small"),
    ViaAnnulusTooSmall => ("via-annulus-too-small", "Via annulus too small"),
    ViaHoleBigger => ("via-hole-bigger", "Via hole larger than diameter"),
    MicroViaTooManyLayers => ("microvia-too-many-layers", "Micro via through too many layers"),
    TooSmallPadDrill => ("too-small-pad-drill", "Pad drill too small"),
    TooSmallViaDrill => ("too-small-via-drill", "Via drill too small"),
    TooSmallMicroViaDrill => ("too-small-microvia-drill", "Micro via drill too small"),
    DrilledHolesTooClose => ("drilled-holes-too-close", "Drilled holes too close together"),

    // Connectivity
    DanglingTrack => ("dangling-track", "Track has unconnected end"),
    DanglingVia => ("dangling-via", "Via is not connected"),
    UnconnectedItems => ("unconnected-items", "Missing connection between items"),

    // Courtyards
    OverlappingFootprints => ("overlapping-footprints", "Courtyards overlap"),
    MissingCourtyard => ("missing-courtyard", "Footprint has no courtyard defined"),
    MalformedCourtyard => ("malformed-courtyard", "Footprint has malformed courtyard"),
    PthInsideCourtyard => ("pth-inside-courtyard", "PTH inside courtyard"),
    NpthInsideCourtyard => ("npth-inside-courtyard", "NPTH inside courtyard"),

    // Schematic parity
    DuplicateFootprint => ("duplicate-footprints", "Duplicate footprints"),
    MissingFootprint => ("missing-footprint", "Missing footprint"),
    ExtraFootprint => ("extra-footprint", "Extra footprint"),

    // Board consistency
    DisabledLayerItem => ("disabled-layer-item", "Item on a disabled layer"),
    UnresolvedVariable => ("unresolved-variable", "Unresolved text variable"),
    InvalidOutline => ("invalid-outline", "Board has malformed outline"),
}

impl fmt::Display for DrcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for DrcErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for DrcErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        DrcErrorCode::from_key(&key)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown DRC error code '{}'", key)))
    }
}

/// One violation: code, message and the items involved
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrcItem {
    pub code: DrcErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_item: Option<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux_item: Option<ItemId>,
}

impl DrcItem {
    pub fn new(code: DrcErrorCode) -> Self {
        Self {
            code,
            message: code.error_text().to_string(),
            main_item: None,
            aux_item: None,
        }
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = message;
        self
    }

    pub fn with_item(mut self, item: ItemId) -> Self {
        self.main_item = Some(item);
        self.aux_item = None;
        self
    }

    pub fn with_items(mut self, main: ItemId, aux: ItemId) -> Self {
        self.main_item = Some(main);
        self.aux_item = Some(aux);
        self
    }

    /// Referenced items, main first
    pub fn items(&self) -> impl Iterator<Item = ItemId> {
        self.main_item.into_iter().chain(self.aux_item)
    }
}

/// A violation placed on the board
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    #[serde(flatten)]
    pub item: DrcItem,
    pub position: Point,
}

impl Marker {
    pub fn new(item: DrcItem, position: Point) -> Self {
        Self { item, position }
    }

    pub fn code(&self) -> DrcErrorCode {
        self.item.code
    }
}
