//! Typed per-section style sub-schemas.
//!
//! Each section kind reads a handful of [`StyleKey`]s. They are parsed here,
//! once, into plain structs the renderers consume without any string
//! handling of their own.

use super::keys::{SectionStyleMap, StyleKey};
use super::{BorderStyle, Color, StyleError, TextAlign, Unit};
use crate::template::{InvoiceTemplate, SectionKind};

/// Vertical space around a section, in points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SectionSpacing {
    pub before: f64,
    pub after: f64,
}

/// Colors every section can override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionColors {
    pub text: Color,
    pub background: Option<Color>,
    pub accent: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderStyle {
    pub show_logo: bool,
    /// Maximum logo width in points.
    pub logo_width: f64,
    pub align: TextAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartyStyle {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoStyle {
    pub align: TextAlign,
    pub title: Option<String>,
}

/// Optional line-item columns. Description and amount are always shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSet {
    pub item_code: bool,
    pub quantity: bool,
    pub unit_price: bool,
    pub discount: bool,
    pub tax: bool,
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self {
            item_code: false,
            quantity: true,
            unit_price: true,
            discount: false,
            tax: false,
        }
    }
}

/// Row numbering pattern such as `"{n}."` or `"#{n}"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    prefix: String,
    suffix: String,
}

impl NumberFormat {
    pub fn parse(pattern: &str) -> Option<Self> {
        let (prefix, suffix) = pattern.split_once("{n}")?;
        Some(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    pub fn format(&self, n: usize) -> String {
        format!("{}{}{}", self.prefix, n, self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItemsStyle {
    pub border_style: BorderStyle,
    pub striped: bool,
    pub stripe_color: Color,
    pub columns: ColumnSet,
    pub number_format: Option<NumberFormat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStyle {
    pub detailed_taxes: bool,
    pub show_payment_history: bool,
    pub show_payment_methods: bool,
    pub payment_methods: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotesStyle {
    pub title: String,
    pub show_payment_terms: bool,
    pub terms_title: String,
    pub border_style: BorderStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureStyle {
    pub label: String,
    pub show_date: bool,
    pub date_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FooterStyle {
    pub show_thank_you: bool,
    pub thank_you_text: String,
    pub align: TextAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentQrStyle {
    pub title: String,
    pub caption: String,
    /// Edge length of the placeholder square in points.
    pub box_size: f64,
    pub border_style: BorderStyle,
}

/// The typed style of one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionStyle {
    Header(HeaderStyle),
    IssuerInfo(PartyStyle),
    RecipientInfo(PartyStyle),
    InvoiceInfo(InfoStyle),
    LineItems(LineItemsStyle),
    Summary(SummaryStyle),
    Notes(NotesStyle),
    Signature(SignatureStyle),
    Footer(FooterStyle),
    PaymentQr(PaymentQrStyle),
}

impl SectionStyle {
    /// Parse the kind-specific part of a merged style map. Non-color values
    /// fail soft into `warnings`; malformed colors are errors.
    pub fn parse(
        kind: SectionKind,
        map: &SectionStyleMap,
        template: &InvoiceTemplate,
        table_header: Color,
        warnings: &mut Vec<String>,
    ) -> Result<Self, StyleError> {
        Ok(match kind {
            SectionKind::Header => SectionStyle::Header(HeaderStyle {
                show_logo: map.flag(StyleKey::ShowLogo, true, warnings),
                logo_width: map.length(StyleKey::LogoWidth, Unit::Px, 120.0, warnings),
                align: map.parsed(StyleKey::Align, TextAlign::Left, warnings),
            }),
            SectionKind::IssuerInfo => SectionStyle::IssuerInfo(PartyStyle {
                label: map.text(StyleKey::Label, "From"),
            }),
            SectionKind::RecipientInfo => SectionStyle::RecipientInfo(PartyStyle {
                label: map.text(StyleKey::Label, "Bill To"),
            }),
            SectionKind::InvoiceInfo => SectionStyle::InvoiceInfo(InfoStyle {
                align: map.parsed(StyleKey::Align, TextAlign::Right, warnings),
                title: map.get(StyleKey::Title).map(str::to_string),
            }),
            SectionKind::LineItems => {
                let number_format = match map.get(StyleKey::NumberFormat) {
                    None => None,
                    Some(raw) => {
                        let parsed = NumberFormat::parse(raw);
                        if parsed.is_none() {
                            warnings.push(format!(
                                "'numberFormat' = '{}' has no {{n}} placeholder; rows are not numbered",
                                raw
                            ));
                        }
                        parsed
                    }
                };
                let defaults = ColumnSet::default();
                SectionStyle::LineItems(LineItemsStyle {
                    border_style: map.parsed(StyleKey::BorderStyle, BorderStyle::Solid, warnings),
                    striped: map.flag(StyleKey::Striped, false, warnings),
                    stripe_color: map
                        .color(StyleKey::StripeColor)?
                        .unwrap_or_else(|| table_header.lighten(0.5)),
                    columns: ColumnSet {
                        item_code: map.flag(StyleKey::ShowItemCode, defaults.item_code, warnings),
                        quantity: map.flag(StyleKey::ShowQuantity, defaults.quantity, warnings),
                        unit_price: map.flag(StyleKey::ShowUnitPrice, defaults.unit_price, warnings),
                        discount: map.flag(StyleKey::ShowDiscount, defaults.discount, warnings),
                        tax: map.flag(StyleKey::ShowTax, defaults.tax, warnings),
                    },
                    number_format,
                })
            }
            SectionKind::Summary => SectionStyle::Summary(SummaryStyle {
                detailed_taxes: map.flag(StyleKey::DetailedTaxes, false, warnings),
                show_payment_history: map.flag(StyleKey::ShowPaymentHistory, false, warnings),
                show_payment_methods: map.flag(StyleKey::ShowPaymentMethods, false, warnings),
                payment_methods: map.get(StyleKey::PaymentMethods).map(str::to_string),
            }),
            SectionKind::Notes => SectionStyle::Notes(NotesStyle {
                title: map.text(StyleKey::Title, "Notes"),
                show_payment_terms: map.flag(StyleKey::ShowPaymentTerms, true, warnings),
                terms_title: map.text(StyleKey::Label, "Payment Terms"),
                border_style: map.parsed(StyleKey::BorderStyle, BorderStyle::Solid, warnings),
            }),
            SectionKind::Signature => SectionStyle::Signature(SignatureStyle {
                label: map.get(StyleKey::Label).map(str::to_string).unwrap_or_else(|| {
                    template
                        .signature_label
                        .clone()
                        .unwrap_or_else(|| "Authorized Signature".to_string())
                }),
                show_date: map.flag(StyleKey::ShowDate, false, warnings),
                date_label: map.text(StyleKey::DateLabel, "Date"),
            }),
            SectionKind::Footer => SectionStyle::Footer(FooterStyle {
                show_thank_you: map.flag(StyleKey::ShowThankYou, true, warnings),
                thank_you_text: map.text(StyleKey::ThankYouText, "Thank you for your business!"),
                align: map.parsed(StyleKey::Align, TextAlign::Center, warnings),
            }),
            SectionKind::PaymentQr => SectionStyle::PaymentQr(PaymentQrStyle {
                title: map.text(StyleKey::Title, "Scan to Pay"),
                caption: map.text(
                    StyleKey::Caption,
                    "Scan the code with your banking app to pay this invoice.",
                ),
                box_size: map.length(StyleKey::BoxSize, Unit::Px, 90.0, warnings),
                border_style: map.parsed(StyleKey::BorderStyle, BorderStyle::Solid, warnings),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn parse(kind: SectionKind, pairs: &[(&str, &str)]) -> (Result<SectionStyle, StyleError>, Vec<String>) {
        let raw: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let map = SectionStyleMap::from_layers([&raw]);
        let template = InvoiceTemplate::standard("t");
        let mut warnings = Vec::new();
        let style = SectionStyle::parse(kind, &map, &template, Color::WHITE, &mut warnings);
        (style, warnings)
    }

    #[test]
    fn number_format_pattern() {
        let f = NumberFormat::parse("#{n}").unwrap();
        assert_eq!(f.format(7), "#7");
        assert_eq!(NumberFormat::parse("{n}.").unwrap().format(12), "12.");
        assert!(NumberFormat::parse("n.").is_none());
    }

    #[test]
    fn line_items_defaults() {
        let (style, warnings) = parse(SectionKind::LineItems, &[]);
        let SectionStyle::LineItems(s) = style.unwrap() else {
            panic!("wrong variant");
        };
        assert_eq!(s.columns, ColumnSet::default());
        assert_eq!(s.border_style, BorderStyle::Solid);
        assert!(!s.striped);
        assert!(s.number_format.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn line_items_toggles_and_bad_values() {
        let (style, warnings) = parse(
            SectionKind::LineItems,
            &[
                ("showItemCode", "true"),
                ("showQuantity", "false"),
                ("borderStyle", "double"),
                ("numberFormat", "n)"),
            ],
        );
        let SectionStyle::LineItems(s) = style.unwrap() else {
            panic!("wrong variant");
        };
        assert!(s.columns.item_code);
        assert!(!s.columns.quantity);
        assert_eq!(s.border_style, BorderStyle::Solid);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn stripe_color_must_parse() {
        let (style, _) = parse(SectionKind::LineItems, &[("stripeColor", "zebra")]);
        assert!(matches!(style, Err(StyleError::InvalidColor { .. })));
    }

    #[test]
    fn signature_label_falls_back_to_template() {
        let (style, _) = parse(SectionKind::Signature, &[]);
        match style.unwrap() {
            SectionStyle::Signature(s) => assert_eq!(s.label, "Authorized Signature"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
