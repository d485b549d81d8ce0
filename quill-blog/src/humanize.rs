use chrono::{DateTime, Datelike};

/// Renders a Unix timestamp relative to `now`, e.g. `3 hours ago`.
///
/// Anything older than a week is shown as `month/day/year` (UTC).
pub fn datetime_filter(t: f64, now: f64) -> String {
    let delta = (now - t) as i64;
    if delta < 60 {
        return "1 minute ago".to_owned();
    }
    if delta < 3600 {
        return format!("{} minutes ago", delta / 60);
    }
    if delta < 86400 {
        return format!("{} hours ago", delta / 3600);
    }
    if delta < 604800 {
        return format!("{} days ago", delta / 86400);
    }
    match DateTime::from_timestamp(t as i64, 0) {
        Some(dt) => format!("{}/{}/{}", dt.month(), dt.day(), dt.year()),
        None => String::new(),
    }
}
