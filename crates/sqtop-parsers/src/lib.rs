//! Parsing utilities for Slurm command output.
//!
//! Everything here is pure text handling except `command`, which runs the
//! external tools under a timeout. Malformed rows are dropped, never raised.

pub mod array;
pub mod command;
pub mod keyvalue;
pub mod memory;
pub mod rank;
pub mod rows;
pub mod time;
pub mod tres;

pub use array::parse_array_size;
pub use command::{CommandError, run_command, run_command_nonempty};
pub use keyvalue::{parse_key_value_block, parse_key_value_records};
pub use memory::{format_memory_mb, parse_memory_mb};
pub use rank::rank_labels;
pub use rows::parse_delimited_rows;
pub use time::{format_age, parse_clock_secs, parse_duration};
pub use tres::{
    ResourceEntry, ResourceTally, aggregate, format_resources, parse_gres, parse_tres,
    total_count,
};

/// Filter helper for optional string fields.
/// Returns None if the string is empty or a placeholder value.
pub fn non_empty_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty()
        || trimmed == "-"
        || trimmed == "N/A"
        || trimmed == "Unknown"
        || trimmed == "(null)"
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Leading numeric part of a job id ("12345_[1-3]" -> 12345).
///
/// Non-numeric ids map to 0 so they can still be sorted.
pub fn leading_job_number(job_id: &str) -> u64 {
    let digits: String = job_id
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_string() {
        assert_eq!(non_empty_string("hello"), Some("hello".to_string()));
        assert_eq!(non_empty_string("  hello  "), Some("hello".to_string()));
        assert_eq!(non_empty_string(""), None);
        assert_eq!(non_empty_string("-"), None);
        assert_eq!(non_empty_string("N/A"), None);
        assert_eq!(non_empty_string("Unknown"), None);
        assert_eq!(non_empty_string("(null)"), None);
    }

    #[test]
    fn test_leading_job_number() {
        assert_eq!(leading_job_number("12345"), 12345);
        assert_eq!(leading_job_number("12345_7"), 12345);
        assert_eq!(leading_job_number("12345_[0-9%2]"), 12345);
        assert_eq!(leading_job_number("12345.batch"), 12345);
        assert_eq!(leading_job_number("abc"), 0);
        assert_eq!(leading_job_number(""), 0);
    }
}
