//! Schematic netlist used for the footprint cross-check

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub reference: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Netlist {
    pub components: Vec<Component>,
}

impl Netlist {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading netlist {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing netlist {}", path.display()))
    }

    pub fn find_by_reference(&self, reference: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.reference == reference)
    }
}
