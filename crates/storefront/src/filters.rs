//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;
use std::str::FromStr;

use kirana_core::Price;
use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an amount in the store currency, e.g. `₹799.00`.
///
/// Values that are not decimal numbers are rendered unchanged.
///
/// Usage in templates: `{{ item.price|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(format_money(&raw).unwrap_or(raw))
}

fn format_money(raw: &str) -> Option<String> {
    Decimal::from_str(raw)
        .ok()
        .map(|amount| Price::in_default_currency(amount).display())
}
