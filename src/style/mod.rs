//! # Style System
//!
//! Templates describe style loosely: hex-ish color strings, sizes with unit
//! suffixes, and a per-section string map of knobs. Nothing downstream of
//! this module sees those strings. The resolver turns them into concrete
//! colors, point sizes and typed per-section settings once, up front.
//!
//! Precedence, highest first:
//!
//! ```text
//! section style map  >  style-override document  >  template fields  >  built-in defaults
//! ```

pub mod keys;
pub mod overrides;
pub mod resolver;
pub mod sections;

pub use keys::{SectionStyleMap, StyleKey};
pub use overrides::StyleOverrides;
pub use resolver::{DocumentStyle, Palette, ResolvedSection, StyleResolver};
pub use sections::*;

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Millimetres to PDF points.
pub const MM_TO_PT: f64 = 72.0 / 25.4;

/// A style value that could not be turned into something renderable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StyleError {
    #[error("invalid color '{value}' for '{key}'")]
    InvalidColor { key: String, value: String },
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    /// Parse `#RGB`, `#RRGGBB` (hash optional) or `rgb(r, g, b)`.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();

        if let Some(inner) = s
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<u8> = inner
                .split(',')
                .map(|p| p.trim().parse::<u8>())
                .collect::<Result<_, _>>()
                .ok()?;
            return match parts.as_slice() {
                [r, g, b] => Some(Self::rgb8(*r, *g, *b)),
                _ => None,
            };
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                Some(Self::rgb8(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::rgb8(r, g, b))
            }
            _ => None,
        }
    }

    /// Mix toward white by `amount` (0.0 = unchanged, 1.0 = white).
    pub fn lighten(&self, amount: f64) -> Self {
        let t = amount.clamp(0.0, 1.0);
        Self {
            r: self.r + (1.0 - self.r) * t,
            g: self.g + (1.0 - self.g) * t,
            b: self.b + (1.0 - self.b) * t,
            a: self.a,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Edge values (top, right, bottom, left) in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Units a template may attach to a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Mm,
    Cm,
    In,
    Pt,
    Px,
}

impl Unit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::In => "in",
            Unit::Pt => "pt",
            Unit::Px => "px",
        }
    }

    /// Convert a value in this unit to points. Template type sizes are
    /// written in px and taken 1:1 as points.
    pub fn to_points(&self, value: f64) -> f64 {
        match self {
            Unit::Mm => value * MM_TO_PT,
            Unit::Cm => value * MM_TO_PT * 10.0,
            Unit::In => value * 72.0,
            Unit::Pt | Unit::Px => value,
        }
    }
}

/// A number with an optional unit suffix, e.g. `"10mm"`, `"18px"`, `"12"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: Option<Unit>,
}

impl FromStr for Length {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for unit in [Unit::Mm, Unit::Cm, Unit::In, Unit::Pt, Unit::Px] {
            if let Some(num) = s.strip_suffix(unit.suffix()) {
                let value: f64 = num.trim().parse().map_err(|_| ())?;
                if !value.is_finite() {
                    return Err(());
                }
                return Ok(Length {
                    value,
                    unit: Some(unit),
                });
            }
        }
        let value: f64 = s.parse().map_err(|_| ())?;
        if !value.is_finite() {
            return Err(());
        }
        Ok(Length { value, unit: None })
    }
}

/// Outcome of reading a length that was expected in a particular unit.
#[derive(Debug, Clone, PartialEq)]
pub struct LenientLength {
    /// Value in points.
    pub points: f64,
    pub warning: Option<String>,
}

/// Parse `raw` expecting `expected` units. Fails soft:
///
/// - bare numbers are taken in the expected unit, silently;
/// - a different known unit is taken as the literal number in the expected
///   unit, with a warning;
/// - anything unparseable yields `default_points`, with a warning.
pub fn lenient_length(key: &str, raw: &str, expected: Unit, default_points: f64) -> LenientLength {
    match raw.parse::<Length>() {
        Ok(Length { value, unit: None }) => LenientLength {
            points: expected.to_points(value),
            warning: None,
        },
        Ok(Length {
            value,
            unit: Some(unit),
        }) if unit == expected => LenientLength {
            points: expected.to_points(value),
            warning: None,
        },
        Ok(Length {
            value,
            unit: Some(unit),
        }) => LenientLength {
            points: expected.to_points(value),
            warning: Some(format!(
                "'{}' = '{}': expected {} but found {}; using {} as {}",
                key,
                raw,
                expected.suffix(),
                unit.suffix(),
                value,
                expected.suffix()
            )),
        },
        Err(()) => LenientLength {
            points: default_points,
            warning: Some(format!(
                "'{}' = '{}' is not a number; using the default",
                key, raw
            )),
        },
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

impl BorderStyle {
    /// PDF dash pattern operands, if any.
    pub fn dash_pattern(&self) -> Option<&'static str> {
        match self {
            BorderStyle::Dashed => Some("[3 2] 0"),
            BorderStyle::Dotted => Some("[0.8 1.6] 0"),
            BorderStyle::Solid | BorderStyle::None => None,
        }
    }
}

impl FromStr for BorderStyle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solid" => Ok(BorderStyle::Solid),
            "dashed" => Ok(BorderStyle::Dashed),
            "dotted" => Ok(BorderStyle::Dotted),
            "none" | "hidden" => Ok(BorderStyle::None),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for TextAlign {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Ok(TextAlign::Left),
            "center" | "centre" => Ok(TextAlign::Center),
            "right" | "end" => Ok(TextAlign::Right),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_parsing() {
        let c = Color::parse("#FF0000").unwrap();
        assert!((c.r - 1.0).abs() < 1e-9 && c.g == 0.0 && c.b == 0.0);
        let short = Color::parse("#0f0").unwrap();
        assert!((short.g - 1.0).abs() < 1e-9);
        assert!(Color::parse("336699").is_some());
    }

    #[test]
    fn test_rgb_function_parsing() {
        let c = Color::parse("rgb(255, 128, 0)").unwrap();
        assert!((c.r - 1.0).abs() < 1e-9);
        assert!((c.g - 128.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn test_malformed_colors() {
        assert!(Color::parse("#12345").is_none());
        assert!(Color::parse("#GGHHII").is_none());
        assert!(Color::parse("rgb(300, 0, 0)").is_none());
        assert!(Color::parse("blue-ish").is_none());
    }

    #[test]
    fn test_lighten() {
        let c = Color::BLACK.lighten(0.5);
        assert!((c.r - 0.5).abs() < 1e-9);
        assert_eq!(Color::WHITE.lighten(0.3), Color::WHITE);
    }

    #[test]
    fn test_length_units() {
        assert_eq!(
            "10mm".parse::<Length>(),
            Ok(Length {
                value: 10.0,
                unit: Some(Unit::Mm)
            })
        );
        assert_eq!(
            " 18px ".parse::<Length>(),
            Ok(Length {
                value: 18.0,
                unit: Some(Unit::Px)
            })
        );
        assert_eq!("4.5".parse::<Length>().map(|l| l.unit), Ok(None));
        assert!("px".parse::<Length>().is_err());
        assert!("ten mm".parse::<Length>().is_err());
    }

    #[test]
    fn test_lenient_length_expected_unit() {
        let l = lenient_length("marginBefore", "10mm", Unit::Mm, 0.0);
        assert!((l.points - 10.0 * MM_TO_PT).abs() < 1e-9);
        assert!(l.warning.is_none());
    }

    #[test]
    fn test_lenient_length_unit_mismatch_is_literal() {
        let l = lenient_length("marginBefore", "10px", Unit::Mm, 0.0);
        assert!((l.points - 10.0 * MM_TO_PT).abs() < 1e-9);
        assert!(l.warning.unwrap().contains("expected mm"));
    }

    #[test]
    fn test_lenient_length_garbage_uses_default() {
        let l = lenient_length("fontSize", "large", Unit::Px, 11.0);
        assert_eq!(l.points, 11.0);
        assert!(l.warning.is_some());
    }

    #[test]
    fn test_border_style_parse() {
        assert_eq!("Dashed".parse(), Ok(BorderStyle::Dashed));
        assert_eq!("none".parse(), Ok(BorderStyle::None));
        assert!("double".parse::<BorderStyle>().is_err());
        assert!(BorderStyle::None.dash_pattern().is_none());
    }
}
