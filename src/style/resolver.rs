//! The Resolver: template + override document + section map in, concrete
//! rendering parameters out.

use std::collections::BTreeMap;

use super::keys::{SectionStyleMap, StyleKey};
use super::overrides::StyleOverrides;
use super::sections::{SectionColors, SectionSpacing, SectionStyle};
use super::{lenient_length, Color, StyleError, Unit, MM_TO_PT};
use crate::error::FolioError;
use crate::template::{ColorPalette, InvoiceTemplate, SectionKind, TemplateSection, Typography};

/// Default space after every section, in millimetres.
const DEFAULT_MARGIN_AFTER_MM: f64 = 4.0;

/// The document palette as concrete colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub text: Color,
    pub background: Color,
    pub header_background: Color,
    pub footer_background: Color,
}

/// Document-wide resolved style.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStyle {
    pub palette: Palette,
    /// Family names as written; the font layer maps them to real fonts.
    pub heading_font: String,
    pub body_font: String,
    pub heading_size: f64,
    pub body_size: f64,
}

/// Everything a section renderer needs to know about styling.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSection {
    pub kind: SectionKind,
    pub id: String,
    pub spacing: SectionSpacing,
    pub colors: SectionColors,
    pub font_size: f64,
    pub style: SectionStyle,
}

pub struct StyleResolver<'a> {
    template: &'a InvoiceTemplate,
    overrides: StyleOverrides,
    document: DocumentStyle,
    warnings: Vec<String>,
}

impl<'a> StyleResolver<'a> {
    /// Resolve document-level style. Fails only when the typography leaves
    /// nothing renderable.
    pub fn new(template: &'a InvoiceTemplate) -> Result<Self, FolioError> {
        let mut warnings = Vec::new();
        let (overrides, parse_warning) = StyleOverrides::parse(template.style_overrides.as_deref());
        warnings.extend(parse_warning);

        let palette = resolve_palette(&template.colors, &overrides.colors, &mut warnings);
        let builtin = Typography::default();
        let fonts = &template.fonts;
        let pick = |key: &str, template_value: &str| -> String {
            overrides
                .fonts
                .get(key)
                .cloned()
                .unwrap_or_else(|| template_value.to_string())
        };

        let heading_font = non_empty(pick("headingFont", &fonts.heading_font), &builtin.heading_font);
        let body_font = non_empty(pick("bodyFont", &fonts.body_font), &builtin.body_font);
        let heading_size = resolve_size("headingSize", &pick("headingSize", &fonts.heading_size), 24.0, &mut warnings);
        let body_size = resolve_size("bodySize", &pick("bodySize", &fonts.body_size), 10.0, &mut warnings);

        for (name, size) in [("heading", heading_size), ("body", body_size)] {
            if size <= 0.0 {
                return Err(FolioError::Config(format!(
                    "template '{}': {} size must be positive, got {}",
                    template.name, name, size
                )));
            }
        }

        Ok(Self {
            template,
            overrides,
            document: DocumentStyle {
                palette,
                heading_font,
                body_font,
                heading_size,
                body_size,
            },
            warnings,
        })
    }

    pub fn document(&self) -> &DocumentStyle {
        &self.document
    }

    /// Warnings produced since the last call.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Resolve one section. Unparseable values fail soft into warnings; an
    /// invalid color is returned as an error for the caller to treat as a
    /// section fault.
    pub fn resolve_section(&mut self, section: &TemplateSection) -> Result<ResolvedSection, StyleError> {
        let empty = BTreeMap::new();
        let from_overrides = self.overrides.section(section.kind).unwrap_or(&empty);
        let map = SectionStyleMap::from_layers([from_overrides, &section.style]);

        for key in map.extra().keys() {
            log::debug!("Section '{}' has unknown style key '{}'", section.id, key);
        }

        let doc = &self.document;
        let warnings = &mut self.warnings;

        let spacing = SectionSpacing {
            before: map.length(StyleKey::MarginBefore, Unit::Mm, 0.0, warnings),
            after: map.length(
                StyleKey::MarginAfter,
                Unit::Mm,
                DEFAULT_MARGIN_AFTER_MM * MM_TO_PT,
                warnings,
            ),
        };

        let colors = SectionColors {
            text: map.color(StyleKey::TextColor)?.unwrap_or(doc.palette.text),
            background: map.color(StyleKey::BackgroundColor)?,
            accent: map.color(StyleKey::AccentColor)?.unwrap_or(doc.palette.accent),
        };

        let mut font_size = map.length(StyleKey::FontSize, Unit::Px, doc.body_size, warnings);
        if font_size <= 0.0 {
            warnings.push(format!(
                "section '{}': fontSize must be positive; using {}",
                section.id, doc.body_size
            ));
            font_size = doc.body_size;
        }

        let style = SectionStyle::parse(
            section.kind,
            &map,
            self.template,
            doc.palette.header_background,
            warnings,
        )?;

        Ok(ResolvedSection {
            kind: section.kind,
            id: section.id.clone(),
            spacing,
            colors,
            font_size,
            style,
        })
    }
}

fn non_empty(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn resolve_size(key: &str, raw: &str, default: f64, warnings: &mut Vec<String>) -> f64 {
    let parsed = lenient_length(key, raw, Unit::Px, default);
    warnings.extend(parsed.warning);
    parsed.points
}

fn resolve_palette(
    palette: &ColorPalette,
    overrides: &BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) -> Palette {
    let builtin = ColorPalette::default();
    let mut resolve = |key: &str, template_value: &str, builtin_value: &str| -> Color {
        let candidates = overrides
            .get(key)
            .map(|v| ("style overrides", v.as_str()))
            .into_iter()
            .chain(std::iter::once(("template", template_value)));
        for (origin, raw) in candidates {
            match Color::parse(raw) {
                Some(c) => return c,
                None => warnings.push(format!("{} color '{}' = '{}' is invalid", origin, key, raw)),
            }
        }
        Color::parse(builtin_value).unwrap_or(Color::BLACK)
    };

    Palette {
        primary: resolve("primary", &palette.primary, &builtin.primary),
        secondary: resolve("secondary", &palette.secondary, &builtin.secondary),
        accent: resolve("accent", &palette.accent, &builtin.accent),
        text: resolve("text", &palette.text, &builtin.text),
        background: resolve("background", &palette.background, &builtin.background),
        header_background: resolve(
            "headerBackground",
            &palette.header_background,
            &builtin.header_background,
        ),
        footer_background: resolve(
            "footerBackground",
            &palette.footer_background,
            &builtin.footer_background,
        ),
    }
}
