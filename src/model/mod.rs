//! # Document Model
//!
//! The input representation for the engine: who is billed, what kind of
//! document it is, and the ordered list of line items. A `Document` is
//! transient. The host builds a fresh one from its form state for every
//! export, and nothing here is ever persisted.
//!
//! The JSON form is camelCase. The host form's field names (`clientName`,
//! `clientEmail`, `clientAddress`, `services`) are accepted as aliases.

use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::InvoiceError;
use crate::format::Locale;
use crate::style::{palette, Color};

/// A complete document ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub client: ClientInfo,
    /// Line items in print order.
    #[serde(default, alias = "services")]
    pub items: Vec<LineItem>,
}

/// Which kind of document is being issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    #[default]
    Invoice,
    Subscription,
    ServiceOrder,
}

impl DocumentType {
    /// Label printed in the header band.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Invoice => "Fatura",
            Self::Subscription => "Mensalidade",
            Self::ServiceOrder => "Ordem de Serviço",
        }
    }

    /// Prefix of the exported file name.
    pub fn filename_prefix(&self) -> &'static str {
        match self {
            Self::Invoice => "Fatura",
            Self::Subscription => "Mensalidade",
            Self::ServiceOrder => "OrdemServico",
        }
    }
}

/// Value the host's color picker starts with. Treated as "no accent chosen".
pub const ACCENT_PICKER_DEFAULT: &str = "#000000";

/// Client and document header data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    #[serde(default, alias = "clientName")]
    pub name: String,
    #[serde(default, alias = "clientEmail")]
    pub email: String,
    #[serde(default, alias = "clientAddress")]
    pub address: String,
    #[serde(default)]
    pub document_type: DocumentType,
    #[serde(default)]
    pub invoice_number: String,
    /// Issue date. An empty string in JSON means "not filled in".
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub due_date: Option<NaiveDate>,
    /// Data URI, raw base64, or (native only) a file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// `#rgb` / `#rrggbb`. `respectNoteColor` is the host form's name for it.
    #[serde(default, alias = "respectNoteColor", skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("valid email pattern");
}

impl ClientInfo {
    /// Fresh form state: generated number, issued on `today`, everything else blank.
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            invoice_number: InvoiceNumber::generate(today.year()),
            invoice_date: Some(today),
            ..Self::default()
        }
    }

    /// [`ClientInfo::fresh`] for the local calendar date.
    pub fn fresh_today() -> Self {
        Self::fresh(chrono::Local::now().date_naive())
    }

    /// Notes with surrounding whitespace removed, or `None` when blank.
    pub fn notes_text(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Color of the header band and the client stripe.
    ///
    /// Falls back to the standard dark color when no accent is set, when it
    /// still holds the picker default, or when it can't be parsed.
    pub fn header_color(&self) -> Color {
        let raw = match self.accent_color.as_deref().map(str::trim) {
            None | Some("") => return palette::HEADER_DARK,
            Some(raw) => raw,
        };
        match Color::parse_hex(raw) {
            Some(c) if Color::parse_hex(ACCENT_PICKER_DEFAULT).is_some_and(|d| d.same_rgb8(&c)) => {
                palette::HEADER_DARK
            }
            Some(c) => c,
            None => {
                log::warn!("ignoring unparsable accent color {:?}", raw);
                palette::HEADER_DARK
            }
        }
    }

    /// Required fields that are blank, by display name.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let required = [
            ("client name", &self.name),
            ("client email", &self.email),
            ("client address", &self.address),
            ("invoice number", &self.invoice_number),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                missing.push(label.to_string());
            }
        }
        if self.invoice_date.is_none() {
            missing.push("invoice date".to_string());
        }
        missing
    }

    /// Advisory checks. They never block an export.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let email = self.email.trim();
        if !email.is_empty() && !EMAIL_PATTERN.is_match(email) {
            issues.push(ValidationIssue::InvalidEmail);
        }
        if let (Some(issued), Some(due)) = (self.invoice_date, self.due_date) {
            if due < issued {
                issues.push(ValidationIssue::DueBeforeIssue);
            }
        }
        issues
    }
}

/// A non-blocking problem found by [`Document::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    InvalidEmail,
    DueBeforeIssue,
    /// Item at this index has a negative unit price.
    NegativePrice(usize),
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "client email doesn't look like an address"),
            Self::DueBeforeIssue => write!(f, "due date is before the issue date"),
            Self::NegativePrice(i) => write!(f, "item {} has a negative unit price", i + 1),
        }
    }
}

/// Generator for the default `INV-<year>-<nnn>` document number.
pub struct InvoiceNumber;

impl InvoiceNumber {
    /// `INV-<year>-<3 random digits>`.
    pub fn generate(year: i32) -> String {
        let mut buf = [0u8; 2];
        let suffix = match getrandom::getrandom(&mut buf) {
            Ok(()) => u16::from_le_bytes(buf) % 1000,
            Err(e) => {
                log::warn!("no entropy for invoice number, using 000: {}", e);
                0
            }
        };
        Self::format(year, suffix)
    }

    pub fn format(year: i32, suffix: u16) -> String {
        format!("INV-{}-{:03}", year, suffix % 1000)
    }
}

/// One billable row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Decimal,
}

fn default_quantity() -> u32 {
    1
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            description: String::new(),
            quantity: default_quantity(),
            unit_price: Decimal::ZERO,
        }
    }
}

impl LineItem {
    pub fn new(description: &str, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            description: description.to_string(),
            quantity,
            unit_price,
        }
    }

    /// quantity × unit price, saturating at the `Decimal` range.
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.unit_price)
    }

    /// quantity × unit price, or `None` on overflow.
    pub fn checked_subtotal(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }

    /// Description, quantity and price all filled in.
    pub fn is_filled(&self) -> bool {
        !self.description.trim().is_empty() && self.quantity > 0 && self.unit_price > Decimal::ZERO
    }
}

impl Document {
    pub fn new(client: ClientInfo, items: Vec<LineItem>) -> Self {
        Self { client, items }
    }

    /// Parse the camelCase JSON form.
    pub fn from_json(json: &str) -> Result<Self, InvoiceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sum of all subtotals, recomputed on every call.
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ZERO, |acc, item| acc.saturating_add(item.subtotal()))
    }

    /// Like [`Document::total`], but `None` if any step overflows.
    pub fn checked_total(&self) -> Option<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(item.checked_subtotal()?)
        })
    }

    /// Eligible for export: required client fields set and at least one
    /// fully filled line item.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Every reason the document is not complete, empty when it is.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = self.client.missing_fields();
        if !self.items.iter().any(LineItem::is_filled) {
            missing.push("at least one item with description, quantity and price".to_string());
        }
        missing
    }

    /// Advisory checks over client data and items.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = self.client.validate();
        for (i, item) in self.items.iter().enumerate() {
            if item.unit_price.is_sign_negative() && !item.unit_price.is_zero() {
                issues.push(ValidationIssue::NegativePrice(i));
            }
        }
        issues
    }

    /// Title written into the PDF info dictionary.
    pub fn title(&self) -> String {
        format!(
            "{} {}",
            self.client.document_type.label(),
            self.client.invoice_number.trim()
        )
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

impl std::str::FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            other => Err(format!(
                "unknown page size '{}' (expected a4, letter or legal)",
                other
            )),
        }
    }
}

/// Rendering knobs that don't belong to the document itself.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderOptions {
    pub page_size: PageSize,
    pub locale: Locale,
}
