//! # Font Management
//!
//! Templates name font families loosely ("Arial", "Georgia, serif",
//! "Inter"). This module maps such names onto something the PDF writer can
//! actually reference: one of the standard PDF fonts, which need no
//! embedding, or a TrueType family found on disk, which is embedded whole.
//!
//! Resolution results are shared across renders through the resource
//! cache; [`FontContext`] is the per-render view layout measures with.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use std::collections::HashMap;
use std::sync::Arc;

pub const REGULAR: u32 = 400;
pub const BOLD: u32 = 700;

/// A resolved family plus weight: what a text element is drawn with.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
}

impl FontKey {
    pub fn new(family: &str, weight: u32) -> Self {
        Self {
            family: family.to_string(),
            weight: if weight >= 600 { BOLD } else { REGULAR },
        }
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }
}

/// The standard PDF font families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFamily {
    Helvetica,
    Times,
    Courier,
}

impl StandardFamily {
    /// Map a CSS-ish family name to a standard family.
    pub fn from_alias(name: &str) -> Option<Self> {
        let lower = name.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase();
        match lower.as_str() {
            "helvetica" | "arial" | "sans-serif" | "system-ui" => Some(Self::Helvetica),
            "times" | "times new roman" | "times-roman" | "georgia" | "serif" => Some(Self::Times),
            "courier" | "courier new" | "monospace" => Some(Self::Courier),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::Times => "Times",
            Self::Courier => "Courier",
        }
    }

    pub fn face(&self, bold: bool) -> StandardFont {
        match (self, bold) {
            (Self::Helvetica, false) => StandardFont::Helvetica,
            (Self::Helvetica, true) => StandardFont::HelveticaBold,
            (Self::Times, false) => StandardFont::TimesRoman,
            (Self::Times, true) => StandardFont::TimesBold,
            (Self::Courier, false) => StandardFont::Courier,
            (Self::Courier, true) => StandardFont::CourierBold,
        }
    }
}

/// A standard PDF font face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// The PDF /BaseFont name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
            Self::TimesRoman => &metrics::TIMES_ROMAN,
            Self::TimesBold => &metrics::TIMES_BOLD,
            Self::Courier | Self::CourierBold => &metrics::COURIER,
        }
    }
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    pub glyph_ids: HashMap<char, u16>,
}

impl CustomFontMetrics {
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    pub fn from_font_data(data: &[u8]) -> Result<Self, String> {
        let face = ttf_parser::Face::parse(data, 0).map_err(|e| e.to_string())?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();
        let mut default_advance = 0u16;

        for code in 32u32..=0xFFFF {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(glyph_id) = face.glyph_index(ch) {
                let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                advance_widths.insert(ch, advance);
                glyph_ids.insert(ch, glyph_id.0);
                if ch == ' ' {
                    default_advance = advance;
                }
            }
        }

        if glyph_ids.is_empty() {
            return Err("font has no usable character map".to_string());
        }
        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Ok(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            glyph_ids,
        })
    }
}

/// One embedded TrueType face.
#[derive(Debug)]
pub struct CustomFace {
    pub data: Vec<u8>,
    pub metrics: CustomFontMetrics,
}

impl CustomFace {
    pub fn parse(data: Vec<u8>) -> Result<Self, String> {
        let metrics = CustomFontMetrics::from_font_data(&data)?;
        Ok(Self { data, metrics })
    }
}

/// A TrueType family loaded from disk. Bold falls back to regular.
#[derive(Debug)]
pub struct CustomFamily {
    pub name: String,
    pub regular: CustomFace,
    pub bold: Option<CustomFace>,
}

impl CustomFamily {
    pub fn face(&self, bold: bool) -> &CustomFace {
        match (&self.bold, bold) {
            (Some(b), true) => b,
            _ => &self.regular,
        }
    }
}

/// A family a template name resolved to.
#[derive(Debug, Clone)]
pub enum FontFamily {
    Standard(StandardFamily),
    Custom(Arc<CustomFamily>),
}

impl FontFamily {
    pub fn name(&self) -> &str {
        match self {
            FontFamily::Standard(f) => f.name(),
            FontFamily::Custom(c) => &c.name,
        }
    }
}

/// A concrete face, borrowed from a [`FontContext`].
#[derive(Debug, Clone, Copy)]
pub enum FaceRef<'a> {
    Standard(StandardFont),
    Custom(&'a CustomFace),
}

impl FaceRef<'_> {
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        match self {
            FaceRef::Standard(f) => f.metrics().char_width(ch, font_size),
            FaceRef::Custom(face) => face.metrics.char_width(ch, font_size),
        }
    }

    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        match self {
            FaceRef::Standard(f) => f.metrics().measure_string(text, font_size),
            FaceRef::Custom(face) => text.chars().map(|c| face.metrics.char_width(c, font_size)).sum(),
        }
    }
}

/// The fonts one render uses, by resolved family name.
#[derive(Debug, Clone)]
pub struct FontContext {
    families: HashMap<String, FontFamily>,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        let families = [StandardFamily::Helvetica, StandardFamily::Times, StandardFamily::Courier]
            .into_iter()
            .map(|f| (f.name().to_string(), FontFamily::Standard(f)))
            .collect();
        Self { families }
    }

    /// Make a resolved family available and return the key prefix layout
    /// should use for it.
    pub fn add(&mut self, family: FontFamily) -> String {
        let name = family.name().to_string();
        self.families.entry(name.clone()).or_insert(family);
        name
    }

    /// Resolve a key to a face. Unknown families measure as Helvetica.
    pub fn face(&self, key: &FontKey) -> FaceRef<'_> {
        match self.families.get(&key.family) {
            Some(FontFamily::Standard(f)) => FaceRef::Standard(f.face(key.is_bold())),
            Some(FontFamily::Custom(c)) => FaceRef::Custom(c.face(key.is_bold())),
            None => FaceRef::Standard(StandardFamily::Helvetica.face(key.is_bold())),
        }
    }

    pub fn is_custom(&self, family: &str) -> bool {
        matches!(self.families.get(family), Some(FontFamily::Custom(_)))
    }

    pub fn char_width(&self, ch: char, key: &FontKey, font_size: f64) -> f64 {
        self.face(key).char_width(ch, font_size)
    }

    pub fn measure_string(&self, text: &str, key: &FontKey, font_size: f64) -> f64 {
        self.face(key).measure_string(text, font_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(StandardFamily::from_alias("Arial"), Some(StandardFamily::Helvetica));
        assert_eq!(StandardFamily::from_alias(" 'Times New Roman' "), Some(StandardFamily::Times));
        assert_eq!(StandardFamily::from_alias("monospace"), Some(StandardFamily::Courier));
        assert_eq!(StandardFamily::from_alias("Inter"), None);
    }

    #[test]
    fn test_font_key_snaps_weight() {
        assert_eq!(FontKey::new("Helvetica", 800).weight, BOLD);
        assert_eq!(FontKey::new("Helvetica", 500).weight, REGULAR);
    }

    #[test]
    fn test_context_measures_standard_fonts() {
        let ctx = FontContext::new();
        let regular = ctx.char_width('A', &FontKey::new("Helvetica", REGULAR), 12.0);
        let bold = ctx.char_width('A', &FontKey::new("Helvetica", BOLD), 12.0);
        assert!(bold > regular);
        let times = ctx.measure_string("Invoice", &FontKey::new("Times", REGULAR), 12.0);
        let helv = ctx.measure_string("Invoice", &FontKey::new("Helvetica", REGULAR), 12.0);
        assert!(times < helv);
    }

    #[test]
    fn test_unknown_family_measures_as_helvetica() {
        let ctx = FontContext::new();
        let a = ctx.measure_string("Hello", &FontKey::new("Helvetica", REGULAR), 10.0);
        let b = ctx.measure_string("Hello", &FontKey::new("Nope", REGULAR), 10.0);
        assert_eq!(a, b);
        assert!(!ctx.is_custom("Nope"));
    }

    #[test]
    fn test_garbage_font_data_is_rejected() {
        assert!(CustomFace::parse(vec![0, 1, 2, 3]).is_err());
    }
}
