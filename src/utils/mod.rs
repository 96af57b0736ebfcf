use std::time::{SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in seconds
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Wall-clock label (UTC, `HH:MM:SS`) used to prefix activity-log lines
pub fn clock_label() -> String {
    let secs = get_timestamp() % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Format a video duration in seconds as `H:MM:SS`, or `M:SS` under an hour.
/// Zero (metadata missing) renders as a placeholder.
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "--:--".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Abbreviate large counts the way view counters do: `1.5M`, `2.5K`, `42`.
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Human-readable expiry countdown from minutes remaining.
pub fn format_expiry(minutes: i64) -> String {
    if minutes <= 0 {
        return "Expirado".to_string();
    }
    if minutes < 60 {
        return format!("{} min", minutes);
    }

    let hours = minutes / 60;
    let mins = minutes % 60;

    if mins == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}min", hours, mins)
    }
}

/// Render the server's ISO modification timestamp as `dd/mm/yyyy HH:MM`.
/// Anything that fails to parse is shown as-is.
pub fn format_modified(raw: &str) -> String {
    match raw.parse::<chrono::NaiveDateTime>() {
        Ok(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp() {
        let ts = get_timestamp();
        assert!(ts > 1700000000); // Sanity check
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "--:--");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(215), "3:35");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3725), "1:02:05");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(42), "42");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(2500), "2.5K");
        assert_eq!(format_count(1500000), "1.5M");
    }

    #[test]
    fn test_format_expiry() {
        assert_eq!(format_expiry(0), "Expirado");
        assert_eq!(format_expiry(-5), "Expirado");
        assert_eq!(format_expiry(45), "45 min");
        assert_eq!(format_expiry(90), "1h 30min");
        assert_eq!(format_expiry(120), "2h");
    }

    #[test]
    fn test_format_modified() {
        assert_eq!(
            format_modified("2026-08-28T14:05:30.123456"),
            "28/08/2026 14:05"
        );
        assert_eq!(format_modified("2026-01-02T03:04:05"), "02/01/2026 03:04");
        assert_eq!(format_modified("not a date"), "not a date");
    }
}
