//! Price text normalization.
//!
//! Marketplace price strings mix currency symbols, thousands separators in
//! either convention, and ranges ("US $3.10 - 5.80"). Only the first amount
//! is kept.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d(?:[\d.,]*\d)?").expect("valid regex"));

/// Strips everything but digits and the two separator characters.
///
/// `"US $1,299.00"` becomes `"1,299.00"`.
#[must_use]
pub fn clean_price(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect()
}

/// Parses the first amount in `raw` as a [`Decimal`].
///
/// Separator rules:
/// - both `.` and `,` present: whichever comes last is the decimal separator
/// - only `,`: decimal separator if it appears once and is followed by one
///   or two digits (`"12,5"`, `"24,99"`), otherwise thousands (`"1,299"`)
/// - only `.`: decimal separator if it appears once, otherwise thousands
///   (`"1.299.000"`)
///
/// Returns `None` if no amount is found or the result does not parse.
#[must_use]
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let token = AMOUNT_RE.find(raw)?.as_str();

    let last_dot = token.rfind('.');
    let last_comma = token.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            if dot > comma {
                token.replace(',', "")
            } else {
                token.replace('.', "").replace(',', ".")
            }
        }
        (None, Some(comma)) => {
            let decimals = token.len() - comma - 1;
            if token.matches(',').count() == 1 && (1..=2).contains(&decimals) {
                token.replace(',', ".")
            } else {
                token.replace(',', "")
            }
        }
        (Some(_), None) => {
            if token.matches('.').count() > 1 {
                token.replace('.', "")
            } else {
                token.to_owned()
            }
        }
        (None, None) => token.to_owned(),
    };

    Decimal::from_str(&normalized).ok().map(|d| d.normalize().max(Decimal::ZERO))
}

/// Infers an ISO 4217 code from the price text.
///
/// Explicit codes win over symbols; multi-character dollar prefixes are
/// checked before the bare `$`, which is taken to mean USD.
#[must_use]
pub fn infer_currency(raw: &str) -> Option<String> {
    const CODES: [&str; 12] = [
        "USD", "EUR", "GBP", "JPY", "CNY", "CAD", "AUD", "BRL", "INR", "MXN", "KRW", "CHF",
    ];
    const PREFIXED_DOLLARS: [(&str, &str); 5] = [
        ("R$", "BRL"),
        ("C$", "CAD"),
        ("CA$", "CAD"),
        ("A$", "AUD"),
        ("AU$", "AUD"),
    ];
    const SYMBOLS: [(char, &str); 6] = [
        ('$', "USD"),
        ('€', "EUR"),
        ('£', "GBP"),
        ('¥', "JPY"),
        ('₹', "INR"),
        ('₩', "KRW"),
    ];

    let upper = raw.to_uppercase();
    let has_code = |code: &str| {
        upper
            .split(|c: char| !c.is_ascii_alphabetic())
            .any(|word| word == code)
    };
    if let Some(code) = CODES.iter().find(|code| has_code(code)) {
        return Some((*code).to_owned());
    }
    if let Some((_, code)) = PREFIXED_DOLLARS.iter().find(|(p, _)| upper.contains(p)) {
        return Some((*code).to_owned());
    }
    SYMBOLS
        .iter()
        .find(|(symbol, _)| raw.contains(*symbol))
        .map(|(_, code)| (*code).to_owned())
}
