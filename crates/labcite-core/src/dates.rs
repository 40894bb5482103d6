//! Date normalization for sortable citation output.

use chrono::NaiveDate;

/// Normalize an ISO-ish date of arbitrary precision to zero-padded
/// `YYYY-MM-DD` so citations sort correctly as plain strings.
///
/// `"2023"` becomes `"2023-01-01"`, `"2023-5"` becomes `"2023-05-01"`, and a
/// trailing time component (`"2023-05-17T09:30:00Z"`) is dropped. Values that
/// cannot be understood as a date are returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(['T', ' '])
        .next()
        .unwrap_or(trimmed);

    let mut parts = date_part.splitn(3, '-');
    let Some(year) = parts.next().and_then(|p| p.parse::<i32>().ok()) else {
        return raw.to_string();
    };
    let month = match parts.next() {
        None => 1,
        Some(p) => match p.parse::<u32>() {
            Ok(m) => m,
            Err(_) => return raw.to_string(),
        },
    };
    let day = match parts.next() {
        None => 1,
        Some(p) => match p.parse::<u32>() {
            Ok(d) => d,
            Err(_) => return raw.to_string(),
        },
    };

    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}
