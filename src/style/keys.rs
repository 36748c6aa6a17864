//! Known per-section style keys and the merged style map.
//!
//! Template sections carry an open `string -> string` map. The keys the
//! renderers understand are enumerated in [`StyleKey`]; anything else lands in
//! a residual map so newer templates still load on older engines.

use std::collections::BTreeMap;
use std::str::FromStr;

use super::{lenient_length, Color, StyleError, Unit};

macro_rules! style_keys {
    ($($variant:ident => $name:literal,)*) => {
        /// A style key some section renderer reads.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum StyleKey {
            $($variant,)*
        }

        impl StyleKey {
            pub const ALL: &'static [StyleKey] = &[$(StyleKey::$variant,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(StyleKey::$variant => $name,)*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(StyleKey::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

style_keys! {
    MarginBefore => "marginBefore",
    MarginAfter => "marginAfter",
    BorderStyle => "borderStyle",
    Striped => "striped",
    StripeColor => "stripeColor",
    ShowItemCode => "showItemCode",
    ShowQuantity => "showQuantity",
    ShowUnitPrice => "showUnitPrice",
    ShowDiscount => "showDiscount",
    ShowTax => "showTax",
    NumberFormat => "numberFormat",
    DetailedTaxes => "detailedTaxes",
    ShowPaymentHistory => "showPaymentHistory",
    ShowPaymentMethods => "showPaymentMethods",
    PaymentMethods => "paymentMethods",
    ShowPaymentTerms => "showPaymentTerms",
    ShowDate => "showDate",
    DateLabel => "dateLabel",
    ShowThankYou => "showThankYou",
    ThankYouText => "thankYouText",
    ShowLogo => "showLogo",
    LogoWidth => "logoWidth",
    Align => "align",
    Title => "title",
    Caption => "caption",
    BoxSize => "boxSize",
    TextColor => "textColor",
    BackgroundColor => "backgroundColor",
    AccentColor => "accentColor",
    FontSize => "fontSize",
    Label => "label",
}

/// A section's effective style map after layering, split into known and
/// unknown keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionStyleMap {
    known: BTreeMap<StyleKey, String>,
    extra: BTreeMap<String, String>,
}

impl SectionStyleMap {
    /// Merge raw maps; later layers win.
    pub fn from_layers<'a>(layers: impl IntoIterator<Item = &'a BTreeMap<String, String>>) -> Self {
        let mut map = SectionStyleMap::default();
        for layer in layers {
            for (k, v) in layer {
                match StyleKey::from_name(k) {
                    Some(key) => {
                        map.known.insert(key, v.clone());
                    }
                    None => {
                        map.extra.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        map
    }

    pub fn get(&self, key: StyleKey) -> Option<&str> {
        self.known.get(&key).map(String::as_str)
    }

    /// Keys no renderer understands.
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    pub fn text(&self, key: StyleKey, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    pub fn flag(&self, key: StyleKey, default: bool, warnings: &mut Vec<String>) -> bool {
        match self.get(key) {
            None => default,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => true,
                "false" | "no" | "0" | "off" => false,
                _ => {
                    warnings.push(format!(
                        "'{}' = '{}' is not a boolean; using {}",
                        key.as_str(),
                        raw,
                        default
                    ));
                    default
                }
            },
        }
    }

    /// A length in `unit`, converted to points.
    pub fn length(&self, key: StyleKey, unit: Unit, default_points: f64, warnings: &mut Vec<String>) -> f64 {
        match self.get(key) {
            None => default_points,
            Some(raw) => {
                let parsed = lenient_length(key.as_str(), raw, unit, default_points);
                warnings.extend(parsed.warning);
                parsed.points
            }
        }
    }

    /// Any `FromStr` value; unparseable input warns and yields `default`.
    pub fn parsed<T: FromStr>(&self, key: StyleKey, default: T, warnings: &mut Vec<String>) -> T {
        match self.get(key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warnings.push(format!(
                    "'{}' = '{}' is not recognised; using the default",
                    key.as_str(),
                    raw
                ));
                default
            }),
        }
    }

    /// Colors are strict: a malformed value faults the section.
    pub fn color(&self, key: StyleKey) -> Result<Option<Color>, StyleError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => Color::parse(raw).map(Some).ok_or_else(|| StyleError::InvalidColor {
                key: key.as_str().to_string(),
                value: raw.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn every_key_round_trips_its_name() {
        for key in StyleKey::ALL {
            assert_eq!(StyleKey::from_name(key.as_str()), Some(*key));
        }
    }

    #[test]
    fn later_layers_win_and_unknown_keys_are_kept() {
        let base = layer(&[("striped", "true"), ("legacyGlow", "1")]);
        let top = layer(&[("striped", "false")]);
        let map = SectionStyleMap::from_layers([&base, &top]);
        assert_eq!(map.get(StyleKey::Striped), Some("false"));
        assert_eq!(map.extra().get("legacyGlow").map(String::as_str), Some("1"));
    }

    #[test]
    fn bad_flag_warns_and_defaults() {
        let map = SectionStyleMap::from_layers([&layer(&[("striped", "maybe")])]);
        let mut warnings = Vec::new();
        assert!(map.flag(StyleKey::Striped, true, &mut warnings));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn bad_color_is_an_error() {
        let map = SectionStyleMap::from_layers([&layer(&[("textColor", "#12")])]);
        assert!(map.color(StyleKey::TextColor).is_err());
        assert_eq!(map.color(StyleKey::AccentColor), Ok(None));
    }
}
