//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a timestamp as a Colombian short date, `d/m/Y`.
///
/// Usage in templates: `{{ order.date|date_co }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn date_co(
    value: &chrono::DateTime<chrono::Utc>,
    _env: &dyn askama::Values,
) -> askama::Result<String> {
    Ok(value.format("%d/%m/%Y").to_string())
}

/// Formats a timestamp with time of day, `d/m/Y H:M`.
///
/// Usage in templates: `{{ entry.received_at|datetime_co }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn datetime_co(
    value: &chrono::DateTime<chrono::Utc>,
    _env: &dyn askama::Values,
) -> askama::Result<String> {
    Ok(value.format("%d/%m/%Y %H:%M").to_string())
}
