//! # InvoiceCraft
//!
//! Renders invoices, subscription bills and service orders to PDF.
//!
//! The input is a small document: who the client is, what kind of document
//! this is, and an ordered list of line items. The output is a paginated
//! PDF on a fixed template: colored header with the logo, client block,
//! item table, total, optional notes, attribution footer on every page.
//! Money and dates are formatted for the chosen locale (Brazilian
//! Portuguese by default).
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON / JS object)
//!       ↓
//!   [model]    Document: client info + line items, totals, validation
//!       ↓
//!   [layout]   Invoice template on fixed-size pages
//!       ↓
//!   [pdf]      Serialize to PDF bytes
//!       ↓
//!   [export]   Filename, one-at-a-time guard, download target
//! ```
//!
//! Rendering is deterministic: the same document and options always
//! produce the same bytes.

pub mod error;
pub mod export;
pub mod font;
pub mod format;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod style;
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::InvoiceError;
pub use export::{export_filename, DirectoryTarget, DownloadTarget, ExportedFile, Exporter};
pub use format::Locale;
pub use model::{ClientInfo, Document, DocumentType, LineItem, PageSize, RenderOptions};

use layout::LayoutEngine;
use pdf::{DocumentInfo, PdfWriter};

/// Render a document to PDF bytes.
///
/// This is the primary entry point. Any document renders, complete or not:
/// an empty item list gives an empty table and a zero total. Use
/// [`Exporter`] for the checked user-facing path.
pub fn render(document: &Document, options: &RenderOptions) -> Result<Vec<u8>, InvoiceError> {
    let pages = LayoutEngine::new(*options).layout(document)?;
    let info = DocumentInfo {
        title: Some(document.title()),
        subject: Some(document.client.document_type.label().to_string()),
    };
    PdfWriter::new().write(&pages, &info)
}

/// Render a document described as JSON to PDF bytes, with default options.
pub fn render_json(json: &str) -> Result<Vec<u8>, InvoiceError> {
    render_json_with(json, &RenderOptions::default())
}

/// Render a document described as JSON to PDF bytes.
pub fn render_json_with(json: &str, options: &RenderOptions) -> Result<Vec<u8>, InvoiceError> {
    let document = Document::from_json(json)?;
    render(&document, options)
}
