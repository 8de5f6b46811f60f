//! Lenient parsers for the string-typed numeric and date fields of the upstream API.
//!
//! Both return `None` instead of failing; callers pick the fallback.

use chrono::NaiveDate;

const CURRENCY_PREFIX: &str = "R$";

/// Parses a monetary amount.
///
/// Accepts plain decimals (`"100.50"`), pt-BR grouping (`"1.234,56"`) and an optional
/// `R$` prefix. Returns `None` for empty, malformed or non-finite input, including
/// en-US grouping (`"1,234.56"`) where a `.` follows the decimal comma.
pub fn parse_money(s: &str) -> Option<f64> {
    let mut t = s.trim();
    if let Some(rest) = t.strip_prefix(CURRENCY_PREFIX) {
        t = rest.trim_start();
    }
    if t.is_empty() {
        return None;
    }

    let normalized = if let Some(comma) = t.find(',') {
        // pt-BR: '.' groups thousands, ',' separates decimals, so one comma, last.
        if t.rfind(',') != Some(comma) || t[comma..].contains('.') {
            return None;
        }
        t.replace('.', "").replace(',', ".")
    } else {
        t.to_string()
    };

    if !normalized
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
    {
        return None;
    }

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a calendar date from `YYYY-MM-DD`, an ISO timestamp starting with one, or
/// `DD/MM/YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }

    if let Some(head) = t.get(..10) {
        let rest = &t[10..];
        if rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ') {
            if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
                return Some(d);
            }
        }
    }

    NaiveDate::parse_from_str(t, "%d/%m/%Y").ok()
}
