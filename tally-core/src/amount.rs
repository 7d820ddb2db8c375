//! Amount parsing and ledger formatting (comma decimals, trailing euro sign).

pub const CURRENCY_SYMBOL: &str = "€";

/// Parse "1234,50", "-42.5" or " 12 " into a number.
pub fn parse_amount(text: &str) -> Option<f64> {
    let n: f64 = text.trim().replace(',', ".").parse().ok()?;
    n.is_finite().then_some(n)
}

/// Ledger amount token: absolute value, two decimals, comma separator, "€".
///
/// Non-numeric input is returned unchanged.
pub fn format_amount(value: impl ToString) -> String {
    let raw = value.to_string();
    match parse_amount(&raw) {
        Some(n) => format!("{} {}", format!("{:.2}", n.abs()).replace('.', ","), CURRENCY_SYMBOL),
        None => raw,
    }
}

/// Numeric cell value for the spreadsheet: absolute value, 0 when unparsable.
pub fn sheet_amount(text: &str) -> f64 {
    parse_amount(text).map(f64::abs).unwrap_or(0.0)
}
