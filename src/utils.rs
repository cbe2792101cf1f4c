//! Formatting helpers shared by the logger and the report printer.

use time::{format_description, OffsetDateTime};

/// Format a timestamp for human-readable output as
/// `YYYY/MM/DD HH:MM:SS` (UTC).
///
/// Falls back to the default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description::parse("[year]/[month]/[day] [hour]:[minute]:[second]")
        .expect("Failed to create format description");
    dt.format(&format).unwrap_or_else(|_| dt.to_string())
}

/// Format a unix timestamp in seconds; raw seconds are printed if the
/// value is outside the representable range.
pub fn format_timestamp(timestamp: i64) -> String {
    match OffsetDateTime::from_unix_timestamp(timestamp) {
        Ok(dt) => format_datetime(&dt),
        Err(_) => timestamp.to_string(),
    }
}

/// Convert degrees Celsius to degrees Fahrenheit.
pub fn celsius_to_fahrenheit(tempc: f64) -> f64 {
    9.0 / 5.0 * tempc + 32.0
}
