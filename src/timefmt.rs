use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};

/// Parses an upstream `localTime` value. The wall-clock time is kept as-is;
/// an explicit offset, if present, is dropped.
pub fn parse_local_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_local())
}

/// `"HH:MM"`, 24-hour.
pub fn format_clock(dt: &NaiveDateTime) -> String {
    format!("{:02}:{:02}", dt.hour(), dt.minute())
}

/// `"YYYY-MM-DD"`.
pub fn format_date(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// `"9h 15m"`, minutes zero-padded.
pub fn format_duration(minutes: u32) -> String {
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

pub fn seconds_to_minutes(seconds: u64) -> u32 {
    u32::try_from(seconds / 60).unwrap_or(u32::MAX)
}

/// Inverse of [`format_clock`]. Accepts `"H:MM"` too.
pub fn clock_to_minutes(clock: &str) -> Option<u32> {
    let (h, m) = clock.trim().split_once(':')?;
    let h: u32 = h.parse().ok()?;
    let m: u32 = m.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// Weekday of a `"YYYY-MM-DD"` date, 0 = Monday .. 6 = Sunday.
pub fn weekday_index(date: &str) -> Option<u8> {
    chrono::NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.weekday().num_days_from_monday() as u8)
}

pub fn parse_weekday(name: &str) -> Option<u8> {
    match name.trim().to_lowercase().as_str() {
        "mon" | "monday" => Some(0),
        "tue" | "tuesday" => Some(1),
        "wed" | "wednesday" => Some(2),
        "thu" | "thursday" => Some(3),
        "fri" | "friday" => Some(4),
        "sat" | "saturday" => Some(5),
        "sun" | "sunday" => Some(6),
        _ => None,
    }
}
