//! User-facing unit formatting for violation messages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geometry::{Coord, IU_PER_MIL, IU_PER_MM};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdaUnits {
    #[default]
    #[serde(rename = "mm")]
    Millimetres,
    Mils,
    #[serde(rename = "in")]
    Inches,
}

impl EdaUnits {
    pub fn suffix(self) -> &'static str {
        match self {
            EdaUnits::Millimetres => "mm",
            EdaUnits::Mils => "mils",
            EdaUnits::Inches => "in",
        }
    }

    pub fn from_iu(self, value: Coord) -> f64 {
        match self {
            EdaUnits::Millimetres => value as f64 / IU_PER_MM,
            EdaUnits::Mils => value as f64 / IU_PER_MIL,
            EdaUnits::Inches => value as f64 / (IU_PER_MIL * 1000.0),
        }
    }
}

impl fmt::Display for EdaUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for EdaUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mm" | "millimetres" | "millimeters" => Ok(EdaUnits::Millimetres),
            "mil" | "mils" => Ok(EdaUnits::Mils),
            "in" | "inch" | "inches" => Ok(EdaUnits::Inches),
            other => Err(format!("unknown units '{}' (expected mm, mils or in)", other)),
        }
    }
}

/// Format a board value for a message, e.g. `0.2000 mm`
pub fn message_text_from_value(units: EdaUnits, value: Coord) -> String {
    let v = units.from_iu(value);
    match units {
        EdaUnits::Millimetres => format!("{:.4} mm", v),
        EdaUnits::Mils => format!("{:.2} mils", v),
        EdaUnits::Inches => format!("{:.4} in", v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_formatting() {
        assert_eq!(message_text_from_value(EdaUnits::Millimetres, 200_000), "0.2000 mm");
        assert_eq!(message_text_from_value(EdaUnits::Mils, 254_000), "10.00 mils");
        assert_eq!(message_text_from_value(EdaUnits::Inches, 25_400_000), "1.0000 in");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!("MM".parse::<EdaUnits>(), Ok(EdaUnits::Millimetres));
        assert_eq!("mils".parse::<EdaUnits>(), Ok(EdaUnits::Mils));
        assert!("furlongs".parse::<EdaUnits>().is_err());
    }
}
