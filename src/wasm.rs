//! Browser binding. The host page collects the form, passes the document
//! object in, and saves the returned bytes under the returned filename.

use std::str::FromStr;

use chrono::NaiveDate;
use js_sys::{Object, Reflect, Uint8Array};
use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use crate::export::{export_filename as filename_for, ExportedFile, Exporter};
use crate::format::{format_currency as fmt_currency, format_date as fmt_date, Locale};
use crate::model::{ClientInfo, Document, RenderOptions};

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn read_document(value: JsValue) -> Result<Document, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Failed to read document: {}", e)))
}

fn read_locale(tag: Option<String>) -> Result<Locale, JsValue> {
    tag.map_or(Ok(Locale::default()), |t| Locale::from_str(&t).map_err(js_error))
}

fn to_js_file(file: ExportedFile) -> Result<JsValue, JsValue> {
    let out = Object::new();
    Reflect::set(&out, &"filename".into(), &JsValue::from_str(&file.filename))?;
    Reflect::set(&out, &"mimeType".into(), &JsValue::from_str(file.mime_type))?;
    Reflect::set(&out, &"bytes".into(), &Uint8Array::from(file.bytes.as_slice()))?;
    Ok(out.into())
}

/// The "download PDF" button: one export at a time.
#[wasm_bindgen]
pub struct ExportButton {
    exporter: Exporter,
}

#[wasm_bindgen]
impl ExportButton {
    #[wasm_bindgen(constructor)]
    pub fn new(locale: Option<String>) -> Result<ExportButton, JsValue> {
        let options = RenderOptions {
            locale: read_locale(locale)?,
            ..RenderOptions::default()
        };
        Ok(Self {
            exporter: Exporter::new(options),
        })
    }

    /// True while an export is running; the host disables the button.
    #[wasm_bindgen(getter)]
    pub fn busy(&self) -> bool {
        self.exporter.is_busy()
    }

    /// Returns `{ filename, mimeType, bytes }`.
    pub fn export(&self, document: JsValue) -> Result<JsValue, JsValue> {
        let document = read_document(document)?;
        let file = self.exporter.export(&document).map_err(js_error)?;
        to_js_file(file)
    }
}

#[wasm_bindgen(js_name = renderPdf)]
pub fn render_pdf(json: &str) -> Result<Vec<u8>, JsValue> {
    crate::render_json(json).map_err(js_error)
}

#[wasm_bindgen(js_name = exportFilename)]
pub fn export_filename(document: JsValue) -> Result<String, JsValue> {
    Ok(filename_for(&read_document(document)?))
}

/// Defaults for a new form: today's date and a generated invoice number.
#[wasm_bindgen(js_name = freshClient)]
pub fn fresh_client() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&ClientInfo::fresh_today()).map_err(js_error)
}

/// Same currency text the PDF prints, for the on-screen preview.
#[wasm_bindgen(js_name = formatCurrency)]
pub fn format_currency(amount: f64, locale: Option<String>) -> Result<String, JsValue> {
    let amount = Decimal::try_from(amount).map_err(js_error)?;
    Ok(fmt_currency(amount, &read_locale(locale)?))
}

/// Same date text the PDF prints; `iso` is `YYYY-MM-DD`.
#[wasm_bindgen(js_name = formatDate)]
pub fn format_date(iso: &str, locale: Option<String>) -> Result<String, JsValue> {
    let date = NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d").map_err(js_error)?;
    Ok(fmt_date(date, &read_locale(locale)?))
}
