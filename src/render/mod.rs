//! # Document Assembly
//!
//! Drives a render call end to end:
//!
//! ```text
//! template + invoice
//!       ↓
//!   [resolve]   style per visible section, fonts, logo (the only await points)
//!       ↓
//!   [layout]    sections in position order onto one PageCursor
//!       ↓
//!   [decorate]  every-page footer, page numbers, metadata
//!       ↓
//!   [pdf]       serialize
//! ```
//!
//! Fatal problems are returned as [`FolioError`]. Everything recoverable is
//! logged and collected as a [`Diagnostic`] on the result.

pub mod format;

mod footer;
mod header;
mod line_items;
mod notes;
mod parties;
mod payment_qr;
mod signature;
mod summary;

use std::sync::Arc;

use thiserror::Error;

use crate::cache::ResourceCache;
use crate::config::{EngineConfig, FooterPolicy};
use crate::error::FolioError;
use crate::font::{FontContext, FontKey, StandardFamily, BOLD, REGULAR};
use crate::image_loader::{decode_image, LoadedImage};
use crate::layout::{Block, LayoutPage, PageCursor, Stroke, TextStyle};
use crate::model::Invoice;
use crate::pdf::PdfWriter;
use crate::resources::{load_font_family, DefaultLogoFetcher, LogoFetcher};
use crate::style::{Color, DocumentStyle, ResolvedSection, SectionStyle, StyleError, StyleResolver, TextAlign};
use crate::template::{InvoiceTemplate, SectionKind, TemplateSection};

/// Space between the flowing content and an every-page footer.
const FOOTER_GAP: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Bad input or a missing resource; a default was used instead.
    Warning,
    /// A section failed and contributed nothing.
    Fault,
}

/// A recoverable problem encountered during a render.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub section: Option<SectionKind>,
    pub message: String,
}

/// Document information dictionary contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// A renderer-local failure. The section's output is discarded.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct SectionFault(pub String);

impl From<StyleError> for SectionFault {
    fn from(e: StyleError) -> Self {
        SectionFault(e.to_string())
    }
}

/// Laid-out pages plus everything needed to serialize or inspect them.
#[derive(Debug)]
pub struct ComposedDocument {
    pub pages: Vec<LayoutPage>,
    pub metadata: Metadata,
    pub diagnostics: Vec<Diagnostic>,
    pub fonts: FontContext,
}

impl ComposedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Sections in the order their content was laid out, each listed once.
    pub fn section_order(&self) -> Vec<SectionKind> {
        let mut order = Vec::new();
        for el in self.pages.iter().flat_map(|p| &p.elements) {
            if let Some(kind) = el.section {
                if !order.contains(&kind) {
                    order.push(kind);
                }
            }
        }
        order
    }

    /// All text on a page, one entry per line.
    pub fn page_text(&self, page: usize) -> Vec<String> {
        self.pages
            .get(page)
            .map(|p| p.elements.iter().filter_map(|e| e.text()).collect())
            .unwrap_or_default()
    }
}

/// The serialized result of a render call.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    fn push(&mut self, severity: Severity, section: Option<SectionKind>, message: String) {
        match section {
            Some(kind) => log::warn!("[{}] {}", kind.as_str(), message),
            None => log::warn!("{}", message),
        }
        self.0.push(Diagnostic {
            severity,
            section,
            message,
        });
    }

    fn warn(&mut self, section: Option<SectionKind>, message: String) {
        self.push(Severity::Warning, section, message);
    }

    fn warn_all(&mut self, section: Option<SectionKind>, messages: Vec<String>) {
        for message in messages {
            self.warn(section, message);
        }
    }

    fn fault(&mut self, section: SectionKind, message: String) {
        self.push(Severity::Fault, Some(section), message);
    }
}

/// Everything a render call shares between sections.
struct DocContext<'a> {
    invoice: &'a Invoice,
    template: &'a InvoiceTemplate,
    doc: &'a DocumentStyle,
    fonts: &'a FontContext,
    config: &'a EngineConfig,
    logo: Option<&'a Arc<LoadedImage>>,
    left: f64,
    width: f64,
    heading_family: &'a str,
    body_family: &'a str,
}

impl DocContext<'_> {
    fn section<'s>(&'s self, section: &'s ResolvedSection) -> SectionContext<'s> {
        SectionContext {
            invoice: self.invoice,
            template: self.template,
            doc: self.doc,
            section,
            fonts: self.fonts,
            config: self.config,
            logo: self.logo,
            left: self.left,
            width: self.width,
            heading_family: self.heading_family,
            body_family: self.body_family,
        }
    }
}

/// Per-section view handed to renderers.
pub(crate) struct SectionContext<'a> {
    pub invoice: &'a Invoice,
    pub template: &'a InvoiceTemplate,
    pub doc: &'a DocumentStyle,
    pub section: &'a ResolvedSection,
    pub fonts: &'a FontContext,
    pub config: &'a EngineConfig,
    pub logo: Option<&'a Arc<LoadedImage>>,
    /// Left margin and content width, in points.
    pub left: f64,
    pub width: f64,
    heading_family: &'a str,
    body_family: &'a str,
}

impl SectionContext<'_> {
    pub fn body(&self) -> TextStyle {
        TextStyle {
            font: FontKey::new(self.body_family, REGULAR),
            size: self.section.font_size,
            color: self.section.colors.text,
            line_height: self.config.line_height,
        }
    }

    pub fn bold(&self) -> TextStyle {
        self.body().with_font(FontKey::new(self.body_family, BOLD))
    }

    /// Secondary-colored small print.
    pub fn muted(&self) -> TextStyle {
        let size = (self.section.font_size - 1.0).max(6.0);
        self.body().with_size(size).with_color(self.doc.palette.secondary)
    }

    pub fn heading(&self) -> TextStyle {
        TextStyle {
            font: FontKey::new(self.heading_family, BOLD),
            size: self.doc.heading_size,
            color: self.doc.palette.primary,
            line_height: self.config.line_height.min(1.25),
        }
    }

    /// Bold label text in the section accent color.
    pub fn label(&self) -> TextStyle {
        self.bold().with_color(self.section.colors.accent)
    }

    pub fn money(&self, amount: f64) -> String {
        format::format_money(amount, &self.invoice.currency)
    }

    pub fn date(&self, raw: &str) -> String {
        format::format_date(raw, &self.config.date_format)
    }

    pub fn measure(&self, text: &str, style: &TextStyle) -> f64 {
        self.fonts.measure_string(text, &style.font, style.size)
    }
}

/// The composition engine. Cheap to clone; clones share the resource cache.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    cache: Arc<ResourceCache>,
    fetcher: Arc<dyn LogoFetcher>,
}

impl Engine {
    /// An engine with its own private resource cache.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_cache(config, Arc::new(ResourceCache::new()))
    }

    /// An engine sharing `cache` with other engines.
    pub fn with_cache(config: EngineConfig, cache: Arc<ResourceCache>) -> Self {
        let fetcher = Arc::new(DefaultLogoFetcher::new(config.fetch_timeout()));
        Self {
            config,
            cache,
            fetcher,
        }
    }

    /// Replace the logo fetcher, e.g. to read from application storage.
    pub fn with_logo_fetcher(mut self, fetcher: Arc<dyn LogoFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Compose and serialize to PDF bytes.
    pub async fn render(&self, template: &InvoiceTemplate, invoice: &Invoice) -> Result<RenderedDocument, FolioError> {
        let composed = self.compose(template, invoice).await?;
        let bytes = PdfWriter::new().write(&composed.pages, &composed.metadata, &composed.fonts)?;
        Ok(RenderedDocument {
            bytes,
            page_count: composed.pages.len(),
            diagnostics: composed.diagnostics,
        })
    }

    /// Lay out the document without serializing it.
    pub async fn compose(&self, template: &InvoiceTemplate, invoice: &Invoice) -> Result<ComposedDocument, FolioError> {
        self.config.validate()?;
        template.validate()?;

        let mut diags = Diagnostics::default();

        let mut resolver = StyleResolver::new(template)?;
        diags.warn_all(None, resolver.take_warnings());

        let mut plans: Vec<(&TemplateSection, Result<ResolvedSection, StyleError>)> = Vec::new();
        for section in template.ordered_sections() {
            let resolved = resolver.resolve_section(section);
            diags.warn_all(Some(section.kind), resolver.take_warnings());
            plans.push((section, resolved));
        }
        let doc = resolver.document().clone();

        let mut fonts = FontContext::new();
        let heading_family = self.resolve_font(&doc.heading_font, &mut fonts, &mut diags).await;
        let body_family = self.resolve_font(&doc.body_font, &mut fonts, &mut diags).await;

        let logo_reference = plans.iter().find_map(|(_, resolved)| match resolved {
            Ok(ResolvedSection {
                style: SectionStyle::Header(h),
                ..
            }) if h.show_logo => template.company.logo.as_deref().filter(|r| !r.trim().is_empty()),
            _ => None,
        });
        let logo = match logo_reference {
            Some(reference) => self.resolve_logo(reference, &mut diags).await,
            None => None,
        };

        let (page_width, page_height) = template.page.dimensions();
        let margins = template.margins.to_points();
        let mut cursor = PageCursor::new(page_width, page_height, margins);

        let shared = DocContext {
            invoice,
            template,
            doc: &doc,
            fonts: &fonts,
            config: &self.config,
            logo: logo.as_ref(),
            left: margins.left,
            width: page_width - margins.horizontal(),
            heading_family: &heading_family,
            body_family: &body_family,
        };

        // An every-page footer is composed up front so the flow area can
        // leave room for it.
        let mut stamped_footer: Option<Block> = None;
        if self.config.footer_policy == FooterPolicy::EveryPage {
            if let Some((_, resolved)) = plans.iter().find(|(s, _)| s.kind == SectionKind::Footer) {
                let composed = match resolved {
                    Ok(r) => match &r.style {
                        SectionStyle::Footer(style) => footer::compose(&shared.section(r), style),
                        _ => Err(SectionFault("footer resolved to a non-footer style".to_string())),
                    },
                    Err(e) => Err(SectionFault::from(e.clone())),
                };
                match composed {
                    Ok(block) => {
                        cursor.reserve_bottom(block.height + FOOTER_GAP);
                        stamped_footer = Some(block);
                    }
                    Err(fault) => diags.fault(SectionKind::Footer, fault.0),
                }
            }
            plans.retain(|(s, _)| s.kind != SectionKind::Footer);
        }

        let last = plans.len().saturating_sub(1);
        for (i, (section, resolved)) in plans.iter().enumerate() {
            let resolved = match resolved {
                Ok(r) => r,
                Err(e) => {
                    diags.fault(section.kind, e.to_string());
                    continue;
                }
            };

            let checkpoint = cursor.checkpoint();
            cursor.begin_section(Some(section.kind));
            if let Err(fault) = render_section(&shared.section(resolved), &mut cursor, i == last) {
                cursor.rollback(checkpoint);
                diags.fault(section.kind, fault.0);
            }
        }
        cursor.begin_section(None);

        if let Some(footer) = stamped_footer {
            let y = page_height - margins.bottom - footer.height;
            cursor.stamp_each(y, Some(SectionKind::Footer), |_, _| footer.clone());
        }

        if self.config.page_numbers {
            let style = TextStyle {
                font: FontKey::new(&body_family, REGULAR),
                size: (doc.body_size - 2.0).max(6.0),
                color: doc.palette.secondary,
                line_height: 1.0,
            };
            let y = page_height - margins.bottom / 2.0 - style.line_box() / 2.0;
            let config = &self.config;
            let font_ctx = &fonts;
            cursor.stamp_each(y, None, |index, total| {
                let mut block = Block::new();
                block.text_lines(
                    font_ctx,
                    &[config.page_label(index + 1, total)],
                    margins.left,
                    0.0,
                    page_width - margins.horizontal(),
                    &style,
                    TextAlign::Center,
                );
                block
            });
        }

        if doc.palette.background != Color::WHITE {
            cursor.paint_background(doc.palette.background);
        }

        let pages = cursor.finish();
        let metadata = metadata_for(template, invoice);
        log::info!(
            "Composed invoice '{}' with template '{}': {} page(s), {} diagnostic(s)",
            invoice.number,
            template.name,
            pages.len(),
            diags.0.len()
        );

        Ok(ComposedDocument {
            pages,
            metadata,
            diagnostics: diags.0,
            fonts,
        })
    }

    /// Resolve a template family through the cache. Returns the family name
    /// text elements should use.
    async fn resolve_font(&self, spec: &str, fonts: &mut FontContext, diags: &mut Diagnostics) -> String {
        let dirs = self.config.font_dirs.clone();
        let owned = spec.to_string();
        let result = self
            .cache
            .fonts()
            .get_or_populate(spec, || async move { load_font_family(&owned, &dirs).await })
            .await;
        match result {
            Ok(family) => fonts.add((*family).clone()),
            Err(e) => {
                diags.warn(None, format!("{}; using Helvetica", e));
                StandardFamily::Helvetica.name().to_string()
            }
        }
    }

    async fn resolve_logo(&self, reference: &str, diags: &mut Diagnostics) -> Option<Arc<LoadedImage>> {
        let fetcher = self.fetcher.clone();
        let owned = reference.to_string();
        let result = self
            .cache
            .logos()
            .get_or_populate(reference, || async move {
                let bytes = fetcher.fetch(&owned).await?;
                decode_image(&bytes, &owned)
            })
            .await;
        match result {
            Ok(image) => Some(image),
            Err(e) => {
                diags.warn(Some(SectionKind::Header), format!("{}; header is text only", e));
                None
            }
        }
    }
}

/// Dispatch one section. Flowing sections compose a block which the cursor
/// places; line items and the footer drive the cursor themselves.
fn render_section(ctx: &SectionContext, cursor: &mut PageCursor, is_last: bool) -> Result<(), SectionFault> {
    let spacing = ctx.section.spacing;
    let block = match &ctx.section.style {
        SectionStyle::Footer(style) => return footer::render_once(ctx, style, cursor),
        SectionStyle::LineItems(style) => {
            cursor.advance(spacing.before);
            line_items::render(ctx, style, cursor)?;
            cursor.advance(spacing.after);
            return Ok(());
        }
        SectionStyle::Header(style) => header::compose(ctx, style)?,
        SectionStyle::IssuerInfo(style) => parties::issuer(ctx, style)?,
        SectionStyle::RecipientInfo(style) => parties::recipient(ctx, style)?,
        SectionStyle::InvoiceInfo(style) => parties::invoice_info(ctx, style)?,
        SectionStyle::Summary(style) => summary::compose(ctx, style)?,
        SectionStyle::Notes(style) => notes::compose(ctx, style)?,
        SectionStyle::Signature(style) => signature::compose(ctx, style)?,
        SectionStyle::PaymentQr(style) => payment_qr::compose(ctx, style)?,
    };

    if block.is_empty() {
        return Ok(());
    }

    cursor.advance(spacing.before);
    cursor.place_block(with_background(block, ctx), is_last);
    cursor.advance(spacing.after);
    Ok(())
}

/// Padding inside a section background.
const BACKGROUND_PADDING: f64 = 6.0;

fn with_background(block: Block, ctx: &SectionContext) -> Block {
    let Some(color) = ctx.section.colors.background else {
        return block;
    };
    let mut inner = Block::new();
    inner.pad_to(BACKGROUND_PADDING);
    inner.stack(block, 0.0);
    framed(
        inner,
        ctx.left - BACKGROUND_PADDING,
        ctx.width + 2.0 * BACKGROUND_PADDING,
        BACKGROUND_PADDING,
        Some(color),
        None,
    )
}

/// Put a rectangle behind `content`, which was laid out starting `pad`
/// below its top edge. The rectangle extends `pad` below the content.
pub(crate) fn framed(content: Block, x: f64, width: f64, pad: f64, fill: Option<Color>, stroke: Option<Stroke>) -> Block {
    let height = content.height + pad;
    let mut block = Block::new();
    block.rect(x, 0.0, width, height, fill, stroke);
    for el in content.elements {
        block.push(el);
    }
    block.pad_to(height);
    block
}

/// Trimmed text, or `None` when blank.
pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

fn metadata_for(template: &InvoiceTemplate, invoice: &Invoice) -> Metadata {
    Metadata {
        title: Some(format!("Invoice {}", invoice.number)),
        author: non_blank(template.company.name.as_deref())
            .or_else(|| non_blank(Some(&invoice.issuer.name)))
            .map(str::to_string),
        subject: non_blank(Some(&invoice.recipient.name)).map(|name| format!("Invoice for {}", name)),
    }
}

/// Fixed invoice status colors.
pub(crate) fn status_color(status: crate::model::InvoiceStatus, fallback: Color) -> Color {
    use crate::model::InvoiceStatus;
    match status {
        InvoiceStatus::Paid => Color::rgb8(0x16, 0xA3, 0x4A),
        InvoiceStatus::Pending => Color::rgb8(0xEA, 0x58, 0x0C),
        InvoiceStatus::Overdue => Color::rgb8(0xDC, 0x26, 0x26),
        _ => fallback,
    }
}

/// Resolved contexts for exercising renderers without a full render.
#[cfg(test)]
pub(crate) mod fixture {
    use super::*;
    use crate::model::{InvoiceStatus, LineItem, Party, TaxEntry};

    pub struct Fixture {
        pub invoice: Invoice,
        pub template: InvoiceTemplate,
        pub config: EngineConfig,
        pub fonts: FontContext,
        pub logo: Option<Arc<LoadedImage>>,
        doc: DocumentStyle,
        sections: Vec<ResolvedSection>,
    }

    impl Fixture {
        pub fn new(template: InvoiceTemplate, invoice: Invoice) -> Self {
            let mut resolver = StyleResolver::new(&template).unwrap();
            let sections = template
                .sections
                .iter()
                .map(|s| resolver.resolve_section(s).unwrap())
                .collect();
            let doc = resolver.document().clone();
            Self {
                invoice,
                template,
                config: EngineConfig::default(),
                fonts: FontContext::new(),
                logo: None,
                doc,
                sections,
            }
        }

        pub fn standard() -> Self {
            Self::new(InvoiceTemplate::standard("Fixture"), sample_invoice())
        }

        pub fn context(&self, kind: SectionKind) -> SectionContext<'_> {
            let section = self
                .sections
                .iter()
                .find(|s| s.kind == kind)
                .unwrap();
            let (width, _) = self.template.page.dimensions();
            let margins = self.template.margins.to_points();
            SectionContext {
                invoice: &self.invoice,
                template: &self.template,
                doc: &self.doc,
                section,
                fonts: &self.fonts,
                config: &self.config,
                logo: self.logo.as_ref(),
                left: margins.left,
                width: width - margins.horizontal(),
                heading_family: "Helvetica",
                body_family: "Helvetica",
            }
        }

        pub fn cursor(&self) -> PageCursor {
            let (w, h) = self.template.page.dimensions();
            PageCursor::new(w, h, self.template.margins.to_points())
        }
    }

    pub fn sample_invoice() -> Invoice {
        Invoice {
            number: "INV-2024-0042".to_string(),
            reference_number: Some("REF-9".to_string()),
            po_number: None,
            issuer: Party {
                name: "Acme Tooling".to_string(),
                address: Some("1 Forge Lane\nSheffield".to_string()),
                email: Some("billing@acme.test".to_string()),
                phone: None,
                tax_id: Some("GB123".to_string()),
            },
            recipient: Party {
                name: "Globex".to_string(),
                address: Some("99 Harbour Rd".to_string()),
                ..Default::default()
            },
            issue_date: "2024-03-01".to_string(),
            due_date: "2024-03-31".to_string(),
            line_items: vec![
                LineItem {
                    description: "Hex bolts".to_string(),
                    quantity: 100.0,
                    unit_price: 0.25,
                    amount: 25.0,
                    ..Default::default()
                },
                LineItem {
                    description: "Torque wrench".to_string(),
                    item_code: Some("TW-4".to_string()),
                    quantity: 1.0,
                    unit_price: 75.0,
                    amount: 75.0,
                    tax_rate: Some(20.0),
                    ..Default::default()
                },
            ],
            subtotal: 100.0,
            tax_total: 20.0,
            taxes: vec![TaxEntry {
                name: "VAT".to_string(),
                rate: Some(20.0),
                amount: 20.0,
            }],
            total: 120.0,
            balance_due: 120.0,
            currency: "USD".to_string(),
            status: InvoiceStatus::Pending,
            ..Default::default()
        }
    }

    pub fn texts(block: &Block) -> Vec<String> {
        block.elements.iter().filter_map(|e| e.text()).collect()
    }
}
