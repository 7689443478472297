//! Array job id expansion.
//!
//! Pending array jobs are listed once with a bracketed task spec, e.g.
//! `4242_[0-99%5]`. The size is the number of tasks the spec names.

/// Number of tasks an array job id stands for.
///
/// - `"4242"` and `"4242_7"` are one task.
/// - `"4242_[1,3,5,7-10]"` is 7 tasks; a `%K` throttle is ignored and a
///   `a-b:s` step is honoured.
/// - Anything ill-formed inside the brackets (empty, non-numeric, inverted
///   range) counts as a single task instead of failing.
pub fn parse_array_size(job_id: &str) -> u64 {
    let job_id = job_id.trim();

    let Some((_, tail)) = job_id.split_once('_') else {
        return 1;
    };
    let Some(spec) = tail
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        return 1;
    };

    let spec = spec.split('%').next().unwrap_or_default();
    count_tasks(spec).unwrap_or(1)
}

/// Sum the cardinalities of a comma list of indices and ranges.
fn count_tasks(spec: &str) -> Option<u64> {
    if spec.trim().is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    for part in spec.split(',') {
        total = total.checked_add(count_part(part.trim())?)?;
    }
    (total > 0).then_some(total)
}

fn count_part(part: &str) -> Option<u64> {
    let (range, step) = match part.split_once(':') {
        Some((range, step)) => (range, step.parse::<u64>().ok().filter(|s| *s > 0)?),
        None => (part, 1),
    };

    match range.split_once('-') {
        Some((start, end)) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            if start > end {
                return None;
            }
            Some((end - start) / step + 1)
        }
        None => {
            range.parse::<u64>().ok()?;
            Some(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_and_single_task() {
        assert_eq!(parse_array_size("12345"), 1);
        assert_eq!(parse_array_size("12345_7"), 1);
        assert_eq!(parse_array_size(""), 1);
    }

    #[test]
    fn test_ranges() {
        assert_eq!(parse_array_size("12345_[0-99]"), 100);
        assert_eq!(parse_array_size("12345_[1-100]"), 100);
        assert_eq!(parse_array_size("12345_[0-99%5]"), 100);
        assert_eq!(parse_array_size("12345_[1,3,5,7-10]"), 7);
        assert_eq!(parse_array_size("12345_[0-15:4]"), 4);
    }

    #[test]
    fn test_ill_formed_counts_as_one() {
        assert_eq!(parse_array_size("12345_[10-5]"), 1);
        assert_eq!(parse_array_size("12345_[]"), 1);
        assert_eq!(parse_array_size("12345_[%4]"), 1);
        assert_eq!(parse_array_size("12345_[a-b]"), 1);
        assert_eq!(parse_array_size("12345_[1,,2]"), 1);
        assert_eq!(parse_array_size("12345_[1-3"), 1);
        assert_eq!(parse_array_size("12345_[1-3:0]"), 1);
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(parse_array_size("  12345_[0-9]\n"), 10);
    }

    fn valid_part() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u64..1000).prop_map(|n| n.to_string()),
            (0u64..1000, 0u64..1000).prop_map(|(a, len)| format!("{}-{}", a, a + len)),
        ]
    }

    proptest! {
        #[test]
        fn prop_valid_specs_positive_and_trim_invariant(
            parts in prop::collection::vec(valid_part(), 1..6),
            throttle in prop::option::of(1u64..50),
            pad in "[ \t]{0,3}",
        ) {
            let mut spec = parts.join(",");
            if let Some(k) = throttle {
                spec.push_str(&format!("%{}", k));
            }
            let id = format!("777_[{}]", spec);
            let size = parse_array_size(&id);
            prop_assert!(size >= 1);
            prop_assert_eq!(size, parse_array_size(&format!("{pad}{id}{pad}")));
        }

        #[test]
        fn prop_never_panics_and_positive(s in "\\PC{0,24}") {
            prop_assert!(parse_array_size(&s) >= 1);
        }
    }
}
