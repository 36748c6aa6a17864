//! # Folio
//!
//! A template-driven invoice composition engine.
//!
//! A template says which sections an invoice has, in what order, and how
//! each one looks. An invoice supplies the data. Folio lays the sections out
//! onto real pages, top to bottom, and writes a PDF.
//!
//! Pagination is decided while laying out, never afterwards: a section that
//! does not fit moves to the next page whole, and the line-item table breaks
//! between rows and repeats its header row on every continuation page.
//!
//! ## Architecture
//!
//! ```text
//! InvoiceTemplate + Invoice (JSON/API)
//!       ↓
//!   [style]     resolve palette, fonts and per-section overrides
//!       ↓
//!   [resources] fonts and logo, memoized in a shared ResourceCache
//!       ↓
//!   [render]    section renderers on a page cursor
//!       ↓
//!   [layout]    positioned elements per page
//!       ↓
//!   [pdf]       serialize to PDF bytes
//! ```
//!
//! Problems that do not stop a render (a malformed style override, a logo
//! that will not load, a section that cannot be laid out) come back as
//! [`Diagnostic`]s next to the document. Only invalid input and output
//! failures are errors.

pub mod cache;
pub mod config;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod render;
pub mod resources;
pub mod style;
pub mod template;

pub use cache::{CacheEntry, CacheStats, ResourceCache};
pub use config::{EngineConfig, FooterPolicy};
pub use error::{FolioError, ResourceError};
pub use model::Invoice;
pub use render::{ComposedDocument, Diagnostic, Engine, RenderedDocument, Severity};
pub use resources::{DefaultLogoFetcher, LogoFetcher};
pub use template::transfer::{export_template, import_template, ImportMode};
pub use template::{InvoiceTemplate, SectionKind, TemplateSection};

/// Render a template and an invoice, both given as JSON, with the default
/// configuration and a private cache.
///
/// Hosts rendering more than once should keep an [`Engine`] around instead
/// so fonts and logos are loaded only once.
pub async fn render_json(template_json: &str, invoice_json: &str) -> Result<RenderedDocument, FolioError> {
    let template: InvoiceTemplate =
        serde_json::from_str(template_json).map_err(|e| FolioError::parse("template", e))?;
    let invoice: Invoice = serde_json::from_str(invoice_json).map_err(|e| FolioError::parse("invoice", e))?;
    Engine::new(EngineConfig::default()).render(&template, &invoice).await
}
