//! # Invoice Templates
//!
//! A template is the user-customizable half of a render call: page setup,
//! palette, typography, company branding, default texts, and an ordered set
//! of sections that can each be hidden, moved, and tweaked through a small
//! string-keyed style map.
//!
//! Templates are owned by an external store. The engine only reads them, but
//! the store-facing operations that must stay consistent with what the engine
//! understands (section patching, export/import) live here too.

pub mod transfer;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FolioError;
use crate::style::{Edges, MM_TO_PT};

/// A complete, user-customizable invoice template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub page: PageSetup,
    /// Page margins in millimetres.
    #[serde(default)]
    pub margins: Margins,

    pub colors: ColorPalette,
    pub fonts: Typography,

    pub sections: Vec<TemplateSection>,

    #[serde(default)]
    pub company: CompanyBranding,
    #[serde(default)]
    pub header: HeaderText,

    #[serde(default)]
    pub default_notes: Option<String>,
    #[serde(default)]
    pub default_payment_terms: Option<String>,
    #[serde(default)]
    pub footer_text: Option<String>,
    #[serde(default)]
    pub signature_label: Option<String>,

    /// Freeform JSON style-override document. Parsed defensively once per
    /// render; see [`crate::style::StyleOverrides`].
    #[serde(default)]
    pub style_overrides: Option<String>,

    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSetup {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
}

impl PageSetup {
    /// Returns (width, height) in points, orientation applied.
    pub fn dimensions(&self) -> (f64, f64) {
        let (w, h) = self.size.dimensions();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// Standard page sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    /// Returns portrait (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Margins::uniform(20.0)
    }
}

impl Margins {
    pub fn uniform(mm: f64) -> Self {
        Self {
            top: mm,
            right: mm,
            bottom: mm,
            left: mm,
        }
    }

    pub fn to_points(&self) -> Edges {
        Edges {
            top: self.top * MM_TO_PT,
            right: self.right * MM_TO_PT,
            bottom: self.bottom * MM_TO_PT,
            left: self.left * MM_TO_PT,
        }
    }
}

/// Document-level colors, as hex-like strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub text: String,
    pub background: String,
    pub header_background: String,
    pub footer_background: String,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            primary: "#1E3A5F".to_string(),
            secondary: "#6B7280".to_string(),
            accent: "#2563EB".to_string(),
            text: "#111827".to_string(),
            background: "#FFFFFF".to_string(),
            header_background: "#F3F4F6".to_string(),
            footer_background: "#FFFFFF".to_string(),
        }
    }
}

/// Font families and sizes. Sizes are unit-suffixed strings such as "24px".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
    pub heading_size: String,
    pub body_size: String,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            heading_font: "Helvetica".to_string(),
            body_font: "Helvetica".to_string(),
            heading_size: "24px".to_string(),
            body_size: "10px".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyBranding {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    /// Logo reference: URL, data URI, or file path.
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderText {
    pub title: String,
    pub subtitle: Option<String>,
}

impl Default for HeaderText {
    fn default() -> Self {
        Self {
            title: "INVOICE".to_string(),
            subtitle: None,
        }
    }
}

/// The kinds of content block a template can arrange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Header,
    IssuerInfo,
    RecipientInfo,
    InvoiceInfo,
    LineItems,
    Summary,
    Notes,
    Signature,
    Footer,
    PaymentQr,
}

impl SectionKind {
    pub const ALL: [SectionKind; 10] = [
        SectionKind::Header,
        SectionKind::IssuerInfo,
        SectionKind::RecipientInfo,
        SectionKind::InvoiceInfo,
        SectionKind::LineItems,
        SectionKind::Summary,
        SectionKind::Notes,
        SectionKind::Signature,
        SectionKind::Footer,
        SectionKind::PaymentQr,
    ];

    /// The wire name, as used in templates and style-override documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Header => "header",
            SectionKind::IssuerInfo => "issuer-info",
            SectionKind::RecipientInfo => "recipient-info",
            SectionKind::InvoiceInfo => "invoice-info",
            SectionKind::LineItems => "line-items",
            SectionKind::Summary => "summary",
            SectionKind::Notes => "notes",
            SectionKind::Signature => "signature",
            SectionKind::Footer => "footer",
            SectionKind::PaymentQr => "payment-qr",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

/// One orderable, independently visible block of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSection {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    /// Sort key. Need not be unique or contiguous; ties keep input order.
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    /// Section-specific knobs, validated by the style resolver.
    #[serde(default)]
    pub style: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl TemplateSection {
    pub fn new(kind: SectionKind, position: i32) -> Self {
        Self {
            id: format!("{}-{}", kind.as_str(), position),
            kind,
            position,
            is_visible: true,
            style: BTreeMap::new(),
        }
    }

    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }

    pub fn with_style(mut self, key: &str, value: &str) -> Self {
        self.style.insert(key.to_string(), value.to_string());
        self
    }
}

/// A partial update to one section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionPatch {
    pub position: Option<i32>,
    pub is_visible: Option<bool>,
    /// `Some(value)` sets a style key, `None` removes it.
    pub style: BTreeMap<String, Option<String>>,
}

impl InvoiceTemplate {
    /// A complete template with every section visible in canonical order.
    pub fn standard(name: &str) -> Self {
        let now = Utc::now();
        let sections = SectionKind::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| TemplateSection::new(*kind, (i as i32 + 1) * 10))
            .collect();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: None,
            page: PageSetup::default(),
            margins: Margins::default(),
            colors: ColorPalette::default(),
            fonts: Typography::default(),
            sections,
            company: CompanyBranding::default(),
            header: HeaderText::default(),
            default_notes: None,
            default_payment_terms: Some("Payment due within 30 days.".to_string()),
            footer_text: None,
            signature_label: Some("Authorized Signature".to_string()),
            style_overrides: None,
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Visible sections in rendering order: ascending `position`, ties in
    /// input order.
    pub fn ordered_sections(&self) -> Vec<&TemplateSection> {
        let mut visible: Vec<&TemplateSection> =
            self.sections.iter().filter(|s| s.is_visible).collect();
        // sort_by_key is stable
        visible.sort_by_key(|s| s.position);
        visible
    }

    /// Apply a patch to the section at `index` (input order, not position
    /// order) and return the updated section.
    pub fn update_section_at(
        &mut self,
        index: usize,
        patch: SectionPatch,
    ) -> Result<&TemplateSection, FolioError> {
        let len = self.sections.len();
        let section = self
            .sections
            .get_mut(index)
            .ok_or(FolioError::SectionIndex { index, len })?;

        if let Some(position) = patch.position {
            section.position = position;
        }
        if let Some(visible) = patch.is_visible {
            section.is_visible = visible;
        }
        for (key, value) in patch.style {
            match value {
                Some(v) => {
                    section.style.insert(key, v);
                }
                None => {
                    section.style.remove(&key);
                }
            }
        }

        self.updated_at = Utc::now();
        Ok(&self.sections[index])
    }

    /// Check that the template can produce a page at all.
    pub fn validate(&self) -> Result<(), FolioError> {
        let m = &self.margins;
        for (side, value) in [("top", m.top), ("right", m.right), ("bottom", m.bottom), ("left", m.left)] {
            if !value.is_finite() || value < 0.0 {
                return Err(FolioError::Config(format!(
                    "template '{}': {} margin must be a non-negative number, got {}",
                    self.name, side, value
                )));
            }
        }

        let (w, h) = self.page.dimensions();
        let edges = m.to_points();
        if w - edges.horizontal() <= 0.0 || h - edges.vertical() <= 0.0 {
            return Err(FolioError::Config(format!(
                "template '{}': margins leave no content area on the page",
                self.name
            )));
        }
        Ok(())
    }
}
