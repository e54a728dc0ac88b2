//! Named color buckets for dominant-swatch matching
//!
//! The thresholds live in `COLOR_RULES`, apart from the matching code, so
//! they can be tuned without touching the scorer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Bound::{self, Excluded, Included, Unbounded};
use std::ops::RangeBounds;

/// One of the eight named color buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorName {
    White,
    Gray,
    Red,
    Blue,
    Brown,
    Green,
    Black,
    Pink,
}

impl ColorName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorName::White => "white",
            ColorName::Gray => "gray",
            ColorName::Red => "red",
            ColorName::Blue => "blue",
            ColorName::Brown => "brown",
            ColorName::Green => "green",
            ColorName::Black => "black",
            ColorName::Pink => "pink",
        }
    }
}

impl fmt::Display for ColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dominant color reported by the detection service.
///
/// Channels keep the service's fractional values so thresholds apply to
/// what was reported, not to a rounded sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Swatch {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Swatch {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self::from_channels(red as f64, green as f64, blue as f64)
    }

    pub fn from_channels(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}

/// Lower and upper bound on one channel
pub type ChannelRange = (Bound<f64>, Bound<f64>);

/// Per-channel bounds for one named bucket
#[derive(Debug, Clone)]
pub struct ColorRule {
    pub name: ColorName,
    pub red: ChannelRange,
    pub green: ChannelRange,
    pub blue: ChannelRange,
}

impl ColorRule {
    pub fn matches(&self, swatch: &Swatch) -> bool {
        self.red.contains(&swatch.red)
            && self.green.contains(&swatch.green)
            && self.blue.contains(&swatch.blue)
    }
}

/// Threshold table.
///
/// `R>200` is `(Excluded(200.0), Unbounded)`, `G∈[50,100)` is
/// `(Included(50.0), Excluded(100.0))` and so on.
pub static COLOR_RULES: [ColorRule; 8] = [
    ColorRule {
        name: ColorName::White,
        red: (Excluded(200.0), Unbounded),
        green: (Excluded(200.0), Unbounded),
        blue: (Excluded(200.0), Unbounded),
    },
    ColorRule {
        name: ColorName::Gray,
        red: (Included(100.0), Included(200.0)),
        green: (Included(100.0), Included(200.0)),
        blue: (Included(100.0), Included(200.0)),
    },
    ColorRule {
        name: ColorName::Red,
        red: (Excluded(200.0), Unbounded),
        green: (Unbounded, Excluded(100.0)),
        blue: (Unbounded, Excluded(100.0)),
    },
    ColorRule {
        name: ColorName::Blue,
        red: (Unbounded, Excluded(100.0)),
        green: (Unbounded, Excluded(150.0)),
        blue: (Excluded(200.0), Unbounded),
    },
    ColorRule {
        name: ColorName::Brown,
        red: (Excluded(100.0), Unbounded),
        green: (Included(50.0), Excluded(100.0)),
        blue: (Unbounded, Excluded(50.0)),
    },
    ColorRule {
        name: ColorName::Green,
        red: (Unbounded, Excluded(100.0)),
        green: (Excluded(200.0), Unbounded),
        blue: (Unbounded, Excluded(100.0)),
    },
    ColorRule {
        name: ColorName::Black,
        red: (Unbounded, Excluded(50.0)),
        green: (Unbounded, Excluded(50.0)),
        blue: (Unbounded, Excluded(50.0)),
    },
    ColorRule {
        name: ColorName::Pink,
        red: (Excluded(200.0), Unbounded),
        green: (Included(100.0), Excluded(200.0)),
        blue: (Included(100.0), Excluded(200.0)),
    },
];

/// Look up the rule for a bucket
pub fn rule_for(name: ColorName) -> &'static ColorRule {
    // Every ColorName has exactly one entry in the table.
    COLOR_RULES
        .iter()
        .find(|rule| rule.name == name)
        .unwrap_or(&COLOR_RULES[0])
}

/// True if any swatch falls inside the named bucket
pub fn has_color(swatches: &[Swatch], name: ColorName) -> bool {
    let rule = rule_for(name);
    swatches.iter().any(|swatch| rule.matches(swatch))
}

/// Every bucket matched by at least one swatch, in table order
pub fn matched_colors(swatches: &[Swatch]) -> Vec<ColorName> {
    COLOR_RULES
        .iter()
        .filter(|rule| swatches.iter().any(|swatch| rule.matches(swatch)))
        .map(|rule| rule.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_name() {
        for name in [
            ColorName::White,
            ColorName::Gray,
            ColorName::Red,
            ColorName::Blue,
            ColorName::Brown,
            ColorName::Green,
            ColorName::Black,
            ColorName::Pink,
        ] {
            assert_eq!(rule_for(name).name, name);
        }
    }

    #[test]
    fn test_red_thresholds() {
        assert!(has_color(&[Swatch::new(230, 40, 30)], ColorName::Red));
        assert!(!has_color(&[Swatch::new(200, 40, 30)], ColorName::Red));
        assert!(!has_color(&[Swatch::new(230, 100, 30)], ColorName::Red));
    }

    #[test]
    fn test_gray_is_inclusive() {
        assert!(has_color(&[Swatch::new(100, 150, 200)], ColorName::Gray));
        assert!(!has_color(&[Swatch::new(99, 150, 200)], ColorName::Gray));
        assert!(!has_color(&[Swatch::new(150, 150, 201)], ColorName::Gray));
    }

    #[test]
    fn test_brown_and_pink_half_open_ranges() {
        assert!(has_color(&[Swatch::new(140, 50, 20)], ColorName::Brown));
        assert!(!has_color(&[Swatch::new(140, 100, 20)], ColorName::Brown));
        assert!(has_color(&[Swatch::new(240, 100, 199)], ColorName::Pink));
        assert!(!has_color(&[Swatch::new(240, 200, 150)], ColorName::Pink));
    }

    #[test]
    fn test_white_and_black() {
        let swatches = [Swatch::new(250, 250, 250), Swatch::new(10, 20, 30)];
        let matched = matched_colors(&swatches);
        assert_eq!(matched, vec![ColorName::White, ColorName::Black]);
    }

    #[test]
    fn test_fractional_channels_use_exact_bounds() {
        let just_above = Swatch::from_channels(200.4, 40.0, 30.0);
        assert!(has_color(&[just_above], ColorName::Red));
        assert!(!has_color(&[Swatch::from_channels(200.0, 40.0, 30.0)], ColorName::Red));
        assert!(has_color(&[Swatch::from_channels(200.4, 200.4, 200.4)], ColorName::White));
        assert!(!has_color(&[Swatch::from_channels(200.4, 200.4, 200.4)], ColorName::Gray));
        assert!(has_color(&[Swatch::from_channels(240.0, 199.6, 150.0)], ColorName::Pink));
        assert!(has_color(&[Swatch::from_channels(140.0, 99.6, 20.0)], ColorName::Brown));
    }

    #[test]
    fn test_no_swatches_matches_nothing() {
        assert!(matched_colors(&[]).is_empty());
        assert!(!has_color(&[], ColorName::Blue));
    }
}
