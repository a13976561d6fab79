//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Format a price in rupees with two decimals.
///
/// Usage in templates: `{{ product.price|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    Ok(match text.parse::<Decimal>() {
        Ok(amount) => format!("₹{:.2}", amount.round_dp(2)),
        Err(_) => text,
    })
}

/// Remove double quotes left in descriptions by the storefront editor.
#[askama::filter_fn]
pub fn strip_quotes(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value.to_string().replace('"', ""))
}
