//! # Locale Formatting
//!
//! Every money amount and date that reaches a page goes through this module,
//! so the preview (through the wasm binding) and the PDF always agree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

/// Order of the day and month fields in a numeric date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    /// 05/03/2026
    DayMonthYear,
    /// 3/5/2026
    MonthDayYear,
}

/// Number and date conventions for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    pub tag: &'static str,
    pub currency_symbol: &'static str,
    /// Placed between the symbol and the amount.
    pub symbol_gap: &'static str,
    pub grouping_separator: char,
    pub decimal_separator: char,
    pub date_order: DateOrder,
}

impl Locale {
    /// Brazilian Portuguese, Brazilian real.
    pub const PT_BR: Locale = Locale {
        tag: "pt-BR",
        currency_symbol: "R$",
        symbol_gap: "\u{00A0}",
        grouping_separator: '.',
        decimal_separator: ',',
        date_order: DateOrder::DayMonthYear,
    };

    /// US English, US dollar.
    pub const EN_US: Locale = Locale {
        tag: "en-US",
        currency_symbol: "$",
        symbol_gap: "",
        grouping_separator: ',',
        decimal_separator: '.',
        date_order: DateOrder::MonthDayYear,
    };

    pub const ALL: [Locale; 2] = [Self::PT_BR, Self::EN_US];

    /// Look up a locale by BCP 47 tag, case-insensitively.
    pub fn from_tag(tag: &str) -> Option<Locale> {
        Self::ALL
            .into_iter()
            .find(|l| l.tag.eq_ignore_ascii_case(tag.trim()))
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::PT_BR
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag)
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::from_tag(s).ok_or_else(|| {
            let known: Vec<&str> = Locale::ALL.iter().map(|l| l.tag).collect();
            format!("unknown locale '{}' (expected one of: {})", s, known.join(", "))
        })
    }
}

/// Round to cents, midpoint away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a money amount: symbol, grouping, exactly two decimals.
pub fn format_currency(amount: Decimal, locale: &Locale) -> String {
    let rounded = round_cents(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let mut cents = rounded.abs();
    cents.rescale(2);
    let digits = cents.to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut out = String::with_capacity(digits.len() + 8);
    if negative {
        out.push('-');
    }
    out.push_str(locale.currency_symbol);
    out.push_str(locale.symbol_gap);
    out.push_str(&group_thousands(int_part, locale.grouping_separator));
    out.push(locale.decimal_separator);
    out.push_str(frac_part);
    out
}

fn group_thousands(int_part: &str, separator: char) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

/// Format a calendar date numerically.
pub fn format_date(date: NaiveDate, locale: &Locale) -> String {
    match locale.date_order {
        DateOrder::DayMonthYear => date.format("%d/%m/%Y").to_string(),
        DateOrder::MonthDayYear => date.format("%-m/%-d/%Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_brl_currency() {
        let l = Locale::PT_BR;
        assert_eq!(format_currency(dec("375"), &l), "R$\u{a0}375,00");
        assert_eq!(format_currency(dec("1234.5"), &l), "R$\u{a0}1.234,50");
        assert_eq!(format_currency(dec("1234567.891"), &l), "R$\u{a0}1.234.567,89");
        assert_eq!(format_currency(Decimal::ZERO, &l), "R$\u{a0}0,00");
    }

    #[test]
    fn test_usd_currency() {
        let l = Locale::EN_US;
        assert_eq!(format_currency(dec("375"), &l), "$375.00");
        assert_eq!(format_currency(dec("999999.999"), &l), "$1,000,000.00");
    }

    #[test]
    fn test_negative_and_rounding() {
        let l = Locale::PT_BR;
        assert_eq!(format_currency(dec("-12.345"), &l), "-R$\u{a0}12,35");
        assert_eq!(format_currency(dec("0.125"), &l), "R$\u{a0}0,13");
        // rounds to zero: no minus sign
        assert_eq!(format_currency(dec("-0.001"), &l), "R$\u{a0}0,00");
    }

    #[test]
    fn test_dates() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(format_date(d, &Locale::PT_BR), "05/03/2026");
        assert_eq!(format_date(d, &Locale::EN_US), "3/5/2026");
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!(Locale::from_str("pt-br").unwrap(), Locale::PT_BR);
        assert_eq!(Locale::from_str(" en-US ").unwrap(), Locale::EN_US);
        let err = Locale::from_str("fr-FR").unwrap_err();
        assert!(err.contains("pt-BR"));
        assert_eq!(Locale::default().to_string(), "pt-BR");
    }

    #[test]
    fn test_grouping_edges() {
        assert_eq!(group_thousands("1", '.'), "1");
        assert_eq!(group_thousands("123", '.'), "123");
        assert_eq!(group_thousands("1234", '.'), "1.234");
        assert_eq!(group_thousands("123456", '.'), "123.456");
    }
}
