//! # Export
//!
//! The user-facing "download PDF" action: check the document, render it,
//! name the file, and hand it to wherever downloads go.
//!
//! An [`Exporter`] runs one export at a time. The in-flight flag is a plain
//! `Cell<bool>`, so an exporter can't be shared across threads; a second
//! export started while the first is still running (for example from inside
//! a download target) fails with [`InvoiceError::Busy`]. The flag is cleared
//! on every exit path by a drop guard.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::InvoiceError;
use crate::model::{Document, RenderOptions};

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// `<DocumentTypePrefix>_<invoiceNumber>.pdf`
pub fn export_filename(document: &Document) -> String {
    format!(
        "{}_{}.pdf",
        document.client.document_type.filename_prefix(),
        document.client.invoice_number.trim()
    )
}

/// A finished PDF, ready to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Where exported files end up.
pub trait DownloadTarget {
    fn deliver(&mut self, file: &ExportedFile) -> Result<(), InvoiceError>;
}

/// Keeps delivered files in memory.
impl DownloadTarget for Vec<ExportedFile> {
    fn deliver(&mut self, file: &ExportedFile) -> Result<(), InvoiceError> {
        self.push(file.clone());
        Ok(())
    }
}

/// Saves files into a directory, under their export filename.
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path a file named `filename` would be written to.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

impl DownloadTarget for DirectoryTarget {
    fn deliver(&mut self, file: &ExportedFile) -> Result<(), InvoiceError> {
        // the invoice number is free text; it must not escape the directory
        let name = Path::new(&file.filename);
        if name.components().count() != 1 || name.file_name().is_none() {
            return Err(InvoiceError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is not a plain file name", file.filename),
            )));
        }
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(&file.filename), &file.bytes)?;
        Ok(())
    }
}

/// Marks an export as running; clears the mark when dropped.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Result<Self, InvoiceError> {
        if flag.replace(true) {
            return Err(InvoiceError::Busy);
        }
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Renders documents to downloadable PDFs, one at a time.
#[derive(Debug, Default)]
pub struct Exporter {
    options: RenderOptions,
    in_flight: Cell<bool>,
}

impl Exporter {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            in_flight: Cell::new(false),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// True while an export is running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.get()
    }

    /// Render `document` to a PDF file.
    ///
    /// Fails with `Busy` if another export is running and with `Incomplete`
    /// if the document isn't ready to export. Advisory validation issues
    /// are logged, not enforced.
    pub fn export(&self, document: &Document) -> Result<ExportedFile, InvoiceError> {
        let _guard = InFlight::acquire(&self.in_flight)?;
        self.export_unguarded(document)
    }

    /// Export and deliver in one step. The exporter stays busy until the
    /// target has accepted the file.
    pub fn export_to<T>(&self, document: &Document, target: &mut T) -> Result<ExportedFile, InvoiceError>
    where
        T: DownloadTarget + ?Sized,
    {
        let _guard = InFlight::acquire(&self.in_flight)?;
        let file = self.export_unguarded(document)?;
        target.deliver(&file)?;
        Ok(file)
    }

    fn export_unguarded(&self, document: &Document) -> Result<ExportedFile, InvoiceError> {
        let missing = document.missing_fields();
        if !missing.is_empty() {
            return Err(InvoiceError::Incomplete(missing));
        }
        for issue in document.validate() {
            warn!("exporting despite: {}", issue);
        }

        let bytes = crate::render(document, &self.options)?;
        let file = ExportedFile {
            filename: export_filename(document),
            mime_type: PDF_MIME_TYPE,
            bytes,
        };
        info!("exported {} ({} bytes)", file.filename, file.bytes.len());
        Ok(file)
    }
}
