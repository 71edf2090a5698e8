//! Design rule sets and their sources
//!
//! A rule set is an ordered list of selectors, each pointing at a named
//! rule. Rules are loaded as a whole: a definition that fails to parse or
//! validate yields no rules at all.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

use crate::board::{ItemKind, LayerId};
use crate::geometry::Coord;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("cannot read rules from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed rules in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("selector {index} refers to unknown rule '{rule}'")]
    UnknownRule { index: usize, rule: String },

    #[error("rule '{rule}' has a negative clearance ({value})")]
    NegativeClearance { rule: String, value: Coord },

    #[error("rule '{0}' is defined more than once")]
    DuplicateRule(String),
}

/// A named set of constraints
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrcRule {
    pub name: String,
    #[serde(default)]
    pub clearance: Option<Coord>,
}

/// Criteria picking the items a rule applies to; empty lists match anything
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSelector {
    pub match_netclasses: Vec<String>,
    pub match_types: Vec<ItemKind>,
    pub match_layers: Vec<LayerId>,
    pub rule: String,
}

impl RuleSelector {
    pub fn matches(&self, netclass: Option<&str>, kind: ItemKind, layers: &crate::board::LayerSet) -> bool {
        if !self.match_netclasses.is_empty() {
            match netclass {
                Some(nc) if self.match_netclasses.iter().any(|m| m == nc) => {}
                _ => return false,
            }
        }
        if !self.match_types.is_empty() && !self.match_types.contains(&kind) {
            return false;
        }
        if !self.match_layers.is_empty() && !self.match_layers.iter().any(|l| layers.contains(*l)) {
            return false;
        }
        true
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub rules: Vec<DrcRule>,
    pub selectors: Vec<RuleSelector>,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
        self.selectors.clear();
    }

    pub fn rule(&self, name: &str) -> Option<&DrcRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Parse and validate a JSON rule definition
    pub fn from_json_str(text: &str, origin: &Path) -> Result<Self, RuleError> {
        let set: RuleSet = serde_json::from_str(text).map_err(|source| RuleError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        for (i, rule) in self.rules.iter().enumerate() {
            if self.rules[..i].iter().any(|r| r.name == rule.name) {
                return Err(RuleError::DuplicateRule(rule.name.clone()));
            }
            if let Some(value) = rule.clearance.filter(|v| *v < 0) {
                return Err(RuleError::NegativeClearance { rule: rule.name.clone(), value });
            }
        }
        for (index, sel) in self.selectors.iter().enumerate() {
            if self.rule(&sel.rule).is_none() {
                return Err(RuleError::UnknownRule { index, rule: sel.rule.clone() });
            }
        }
        Ok(())
    }

    /// Largest clearance any rule can impose
    pub fn max_clearance(&self) -> Coord {
        self.rules.iter().filter_map(|r| r.clearance).max().unwrap_or(0)
    }
}

/// Where rules come from
pub trait RuleSource {
    /// Modification time of the backing definition; `None` when it does not exist
    fn modified(&self) -> Option<SystemTime>;

    fn load(&self) -> Result<RuleSet, RuleError>;

    fn describe(&self) -> String;
}

/// JSON rule file on disk
#[derive(Clone, Debug)]
pub struct RuleFile {
    path: PathBuf,
}

impl RuleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleSource for RuleFile {
    fn modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    fn load(&self) -> Result<RuleSet, RuleError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| RuleError::Io {
            path: self.path.clone(),
            source,
        })?;
        RuleSet::from_json_str(&text, &self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::LayerSet;

    #[test]
    fn test_parse_valid_rules() {
        let set = RuleSet::from_json_str(
            r#"{
                "rules": [{"name": "hv", "clearance": 1000000}],
                "selectors": [{"match_netclasses": ["HV"], "rule": "hv"}]
            }"#,
            Path::new("rules.json"),
        )
        .unwrap();
        assert_eq!(set.max_clearance(), 1_000_000);
        assert!(set.selectors[0].matches(Some("HV"), ItemKind::Track, &LayerSet::single(LayerId::F_CU)));
        assert!(!set.selectors[0].matches(None, ItemKind::Track, &LayerSet::single(LayerId::F_CU)));
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let err = RuleSet::from_json_str(
            r#"{"rules": [], "selectors": [{"rule": "ghost"}]}"#,
            Path::new("rules.json"),
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::UnknownRule { index: 0, .. }), "got {}", err);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = RuleSet::from_json_str("{ rules: ", Path::new("bad.json")).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_selector_type_and_layer_filters() {
        let sel = RuleSelector {
            match_types: vec![ItemKind::Via],
            match_layers: vec![LayerId::B_CU],
            rule: "r".to_string(),
            ..Default::default()
        };
        let both = LayerSet::copper_span(LayerId::F_CU, LayerId::B_CU);
        assert!(sel.matches(None, ItemKind::Via, &both));
        assert!(!sel.matches(None, ItemKind::Track, &both));
        assert!(!sel.matches(None, ItemKind::Via, &LayerSet::single(LayerId::F_CU)));
    }
}
