//! Duration parsing for Slurm elapsed and limit columns.

use std::time::Duration;

/// Parse a Slurm duration.
///
/// Supports:
/// - D-HH:MM:SS
/// - HH:MM:SS
/// - MM:SS
/// - Seconds as integer
///
/// Fractional seconds ("01:30:00.123") are truncated.
/// Returns None for "UNLIMITED", "INVALID" or empty strings.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() || s == "UNLIMITED" || s == "INVALID" || s == "-" {
        return None;
    }
    let s = s.split('.').next().unwrap_or(s);

    let (days, time_part) = match s.split_once('-') {
        Some((d, rest)) => (d.parse::<u64>().ok()?, rest),
        None => (0, s),
    };

    let time_parts = time_part
        .split(':')
        .map(|p| p.parse::<u64>().ok())
        .collect::<Option<Vec<u64>>>()?;

    let seconds = match time_parts.as_slice() {
        [h, m, s] => h * 3600 + m * 60 + s,
        [m, s] => m * 60 + s,
        [s] => *s,
        _ => return None,
    };

    Some(Duration::from_secs(days * 86400 + seconds))
}

/// Like `parse_duration` but only for strings that look like clock values
/// (contain a `:`), so plain integers keep their numeric meaning.
pub fn parse_clock_secs(s: &str) -> Option<u64> {
    if !s.contains(':') {
        return None;
    }
    parse_duration(s).map(|d| d.as_secs())
}

/// Format seconds as a compact age ("42s", "3m12s", "2h5m").
pub fn format_age(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
