//! Memory parsing and formatting for Slurm output.

/// Parse a Slurm memory string to megabytes.
///
/// Accepts "4G", "1000M", "4096K", "2T" and bare numbers (already in MB).
/// A trailing per-node/per-core marker ("4Gn", "1000Mc") is ignored.
/// Returns None for empty strings or placeholder values.
pub fn parse_memory_mb(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || s == "-" || s == "N/A" {
        return None;
    }

    let s = s.trim_end_matches(['n', 'c']);

    if let Some(stripped) = s.strip_suffix('T') {
        stripped.parse::<f64>().ok().map(|v| (v * 1024.0 * 1024.0) as u64)
    } else if let Some(stripped) = s.strip_suffix('G') {
        stripped.parse::<f64>().ok().map(|v| (v * 1024.0) as u64)
    } else if let Some(stripped) = s.strip_suffix('M') {
        stripped.parse::<f64>().ok().map(|v| v as u64)
    } else if let Some(stripped) = s.strip_suffix('K') {
        stripped.parse::<u64>().ok().map(|v| v / 1024)
    } else {
        s.parse::<u64>().ok()
    }
}

/// Format megabytes for a table cell ("512M", "62.5G", "1.5T").
pub fn format_memory_mb(mb: u64) -> String {
    const GB: f64 = 1024.0;
    const TB: f64 = 1024.0 * 1024.0;

    let value = mb as f64;
    if value >= TB {
        format!("{:.1}T", value / TB)
    } else if value >= GB {
        format!("{:.1}G", value / GB)
    } else {
        format!("{}M", mb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_mb() {
        assert_eq!(parse_memory_mb("4G"), Some(4096));
        assert_eq!(parse_memory_mb("1000M"), Some(1000));
        assert_eq!(parse_memory_mb("4096K"), Some(4));
        assert_eq!(parse_memory_mb("257000"), Some(257000));
        assert_eq!(parse_memory_mb("1T"), Some(1024 * 1024));
        assert_eq!(parse_memory_mb(""), None);
        assert_eq!(parse_memory_mb("N/A"), None);
    }

    #[test]
    fn test_parse_memory_mb_sacct_suffix() {
        assert_eq!(parse_memory_mb("4Gn"), Some(4096));
        assert_eq!(parse_memory_mb("1000Mc"), Some(1000));
    }

    #[test]
    fn test_format_memory_mb() {
        assert_eq!(format_memory_mb(512), "512M");
        assert_eq!(format_memory_mb(64000), "62.5G");
        assert_eq!(format_memory_mb(1024 * 1024 * 3 / 2), "1.5T");
    }
}
