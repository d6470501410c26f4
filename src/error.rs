//! Structured error types for the InvoiceCraft engine.
//!
//! Logo problems are not here. They are an `image_loader::LogoError`, which
//! the layout engine logs before rendering the header without a logo.

use thiserror::Error;

/// The unified error type returned by all public InvoiceCraft API functions.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// JSON input failed to parse as a valid document.
    #[error("Failed to parse document: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// The document is missing required data and can't be exported.
    #[error("Document is incomplete: {}", .0.join("; "))]
    Incomplete(Vec<String>),
    /// An export was requested while another one was still running.
    #[error("An export is already in progress")]
    Busy,
    /// Layout or PDF generation failed.
    #[error("Render error: {0}")]
    Render(String),
    /// Reading input or delivering the finished file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for InvoiceError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the invoice schema. Check field names, \
                 date format (YYYY-MM-DD) and documentType."
                    .to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        InvoiceError::Parse { source: e, hint }
    }
}
