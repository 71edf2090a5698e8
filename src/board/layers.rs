//! Layer identifiers and layer sets
//!
//! Copper layers are numbered from the front: `F.Cu` = 0, `In1.Cu`..`In30.Cu`
//! = 1..30, `B.Cu` = 31. Technical layers follow.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u8);

const TECH_LAYER_NAMES: [&str; 18] = [
    "B.Adhes", "F.Adhes", "B.Paste", "F.Paste", "B.SilkS", "F.SilkS", "B.Mask", "F.Mask",
    "Dwgs.User", "Cmts.User", "Eco1.User", "Eco2.User", "Edge.Cuts", "Margin",
    "B.CrtYd", "F.CrtYd", "B.Fab", "F.Fab",
];

impl LayerId {
    pub const F_CU: LayerId = LayerId(0);
    pub const B_CU: LayerId = LayerId(31);
    pub const B_ADHES: LayerId = LayerId(32);
    pub const F_ADHES: LayerId = LayerId(33);
    pub const B_PASTE: LayerId = LayerId(34);
    pub const F_PASTE: LayerId = LayerId(35);
    pub const B_SILKS: LayerId = LayerId(36);
    pub const F_SILKS: LayerId = LayerId(37);
    pub const B_MASK: LayerId = LayerId(38);
    pub const F_MASK: LayerId = LayerId(39);
    pub const DWGS_USER: LayerId = LayerId(40);
    pub const CMTS_USER: LayerId = LayerId(41);
    pub const ECO1_USER: LayerId = LayerId(42);
    pub const ECO2_USER: LayerId = LayerId(43);
    pub const EDGE_CUTS: LayerId = LayerId(44);
    pub const MARGIN: LayerId = LayerId(45);
    pub const B_CRTYD: LayerId = LayerId(46);
    pub const F_CRTYD: LayerId = LayerId(47);
    pub const B_FAB: LayerId = LayerId(48);
    pub const F_FAB: LayerId = LayerId(49);

    pub const COUNT: u8 = 50;

    /// Inner copper layer `In<n>.Cu`, n in 1..=30
    pub fn inner(n: u8) -> Option<LayerId> {
        (1..=30).contains(&n).then_some(LayerId(n))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn is_copper(self) -> bool {
        self.0 <= Self::B_CU.0
    }

    pub fn name(self) -> String {
        match self.0 {
            0 => "F.Cu".to_string(),
            31 => "B.Cu".to_string(),
            n @ 1..=30 => format!("In{}.Cu", n),
            n => TECH_LAYER_NAMES
                .get((n - 32) as usize)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("Layer{}", n)),
        }
    }

    pub fn from_name(name: &str) -> Option<LayerId> {
        match name {
            "F.Cu" => return Some(Self::F_CU),
            "B.Cu" => return Some(Self::B_CU),
            _ => {}
        }
        if let Some(n) = name.strip_prefix("In").and_then(|s| s.strip_suffix(".Cu")) {
            return n.parse().ok().and_then(LayerId::inner);
        }
        TECH_LAYER_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| LayerId(32 + i as u8))
    }

    /// Position in the physical stack of a board with `copper_count` layers
    pub fn stack_position(self, copper_count: u8) -> u8 {
        if self == Self::B_CU {
            copper_count.saturating_sub(1)
        } else {
            self.0
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for LayerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for LayerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        LayerId::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown layer '{}'", name)))
    }
}

/// Bit set of layers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct LayerSet(u64);

impl LayerSet {
    const COPPER_MASK: u64 = 0xFFFF_FFFF;

    pub const fn empty() -> Self {
        LayerSet(0)
    }

    pub fn single(layer: LayerId) -> Self {
        LayerSet(1 << layer.0)
    }

    pub fn all_copper() -> Self {
        LayerSet(Self::COPPER_MASK)
    }

    pub fn all() -> Self {
        LayerSet((1u64 << LayerId::COUNT) - 1)
    }

    /// Front copper and front technical layers
    pub fn front_mask() -> Self {
        [
            LayerId::F_CU, LayerId::F_ADHES, LayerId::F_PASTE, LayerId::F_SILKS,
            LayerId::F_MASK, LayerId::F_CRTYD, LayerId::F_FAB,
        ]
        .into_iter()
        .collect()
    }

    /// Back copper and back technical layers
    pub fn back_mask() -> Self {
        [
            LayerId::B_CU, LayerId::B_ADHES, LayerId::B_PASTE, LayerId::B_SILKS,
            LayerId::B_MASK, LayerId::B_CRTYD, LayerId::B_FAB,
        ]
        .into_iter()
        .collect()
    }

    /// Copper layers spanned between two copper layers, inclusive
    pub fn copper_span(a: LayerId, b: LayerId) -> Self {
        let lo = a.0.min(b.0);
        let hi = a.0.max(b.0);
        (lo..=hi).filter_map(|i| (i <= 31).then_some(LayerId(i))).collect()
    }

    /// Copper layers of a board with `count` copper layers
    pub fn copper_stack(count: u8) -> Self {
        let count = count.clamp(1, 32);
        let mut set = LayerSet::single(LayerId::F_CU);
        if count > 1 {
            set = set.with(LayerId::B_CU);
        }
        for n in 1..count.saturating_sub(1) {
            if let Some(l) = LayerId::inner(n) {
                set = set.with(l);
            }
        }
        set
    }

    pub fn with(self, layer: LayerId) -> Self {
        LayerSet(self.0 | (1 << layer.0))
    }

    pub fn contains(&self, layer: LayerId) -> bool {
        self.0 & (1 << layer.0) != 0
    }

    pub fn intersects(&self, other: &LayerSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn intersection(&self, other: &LayerSet) -> LayerSet {
        LayerSet(self.0 & other.0)
    }

    pub fn union(&self, other: &LayerSet) -> LayerSet {
        LayerSet(self.0 | other.0)
    }

    pub fn difference(&self, other: &LayerSet) -> LayerSet {
        LayerSet(self.0 & !other.0)
    }

    pub fn copper(&self) -> LayerSet {
        LayerSet(self.0 & Self::COPPER_MASK)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Layers in index order (front copper first)
    pub fn iter(&self) -> impl Iterator<Item = LayerId> + '_ {
        let bits = self.0;
        (0..LayerId::COUNT).filter(move |i| bits & (1 << i) != 0).map(LayerId)
    }

    pub fn first(&self) -> Option<LayerId> {
        self.iter().next()
    }
}

impl FromIterator<LayerId> for LayerSet {
    fn from_iter<T: IntoIterator<Item = LayerId>>(iter: T) -> Self {
        iter.into_iter().fold(LayerSet::empty(), |set, l| set.with(l))
    }
}

impl Serialize for LayerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for LayerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let mut set = LayerSet::empty();
        for name in names {
            // Wildcards used by through-hole pads
            match name.as_str() {
                "*.Cu" => set = set.union(&LayerSet::all_copper()),
                "*.Mask" => set = set.with(LayerId::F_MASK).with(LayerId::B_MASK),
                "*.Paste" => set = set.with(LayerId::F_PASTE).with(LayerId::B_PASTE),
                _ => {
                    let layer = LayerId::from_name(&name)
                        .ok_or_else(|| serde::de::Error::custom(format!("unknown layer '{}'", name)))?;
                    set = set.with(layer);
                }
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_names_roundtrip() {
        for i in 0..LayerId::COUNT {
            let layer = LayerId(i);
            assert_eq!(LayerId::from_name(&layer.name()), Some(layer), "layer {}", i);
        }
        assert_eq!(LayerId::from_name("In31.Cu"), None);
    }

    #[test]
    fn test_copper_span() {
        let span = LayerSet::copper_span(LayerId::B_CU, LayerId::F_CU);
        assert_eq!(span.count(), 32);
        let blind = LayerSet::copper_span(LayerId::F_CU, LayerId::inner(2).unwrap());
        assert_eq!(blind.count(), 3);
        assert!(!blind.contains(LayerId::B_CU));
    }

    #[test]
    fn test_wildcard_deserialize() {
        let set: LayerSet = serde_json::from_str(r#"["*.Cu", "F.Mask"]"#).unwrap();
        assert!(set.contains(LayerId::F_CU));
        assert!(set.contains(LayerId::inner(5).unwrap()));
        assert!(set.contains(LayerId::F_MASK));
        assert!(!set.contains(LayerId::B_MASK));
    }

    #[test]
    fn test_stack_position() {
        assert_eq!(LayerId::B_CU.stack_position(4), 3);
        assert_eq!(LayerId::inner(2).unwrap().stack_position(4), 2);
        assert_eq!(LayerSet::copper_stack(4).count(), 4);
    }
}
