//! Number formatting shared by report consumers.

const CURRENCY_SYMBOL: &str = "R$";

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// One decimal place and a trailing `%`, e.g. `66.7%`.
pub fn format_percent(value: f64) -> String {
    format!("{}%", format_fixed(value, 1, None, '.'))
}

/// pt-BR currency: `R$ 1.234,56`, `-R$ 10,00`.
pub fn format_currency(value: f64) -> String {
    let body = format_fixed(value.abs(), 2, Some('.'), ',');
    if value < 0.0 && body.chars().any(|c| matches!(c, '1'..='9')) {
        format!("-{CURRENCY_SYMBOL} {body}")
    } else {
        format!("{CURRENCY_SYMBOL} {body}")
    }
}

/// Fixed-point rendering with explicit rounding, optional thousands separator and a chosen
/// decimal separator.
fn format_fixed(value: f64, decimals: u32, thousands: Option<char>, decimal: char) -> String {
    if !value.is_finite() {
        return format_fixed(0.0, decimals, thousands, decimal);
    }

    let factor = 10u128.pow(decimals);
    let units = (value.abs() * factor as f64).round() as u128;
    let integer = (units / factor).to_string();
    let fraction = units % factor;

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if let Some(sep) = thousands {
            if i > 0 && (integer.len() - i) % 3 == 0 {
                grouped.push(sep);
            }
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && units != 0 { "-" } else { "" };
    if decimals == 0 {
        format!("{sign}{grouped}")
    } else {
        format!(
            "{sign}{grouped}{decimal}{fraction:0width$}",
            width = decimals as usize
        )
    }
}
