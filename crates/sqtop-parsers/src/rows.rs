//! Delimited row parsing for `squeue -o`, `sacct --parsable2` and `sshare -P`.

/// Split delimited output into rows of trimmed fields.
///
/// The first non-blank line is the header and is dropped. Rows with fewer
/// than `min_fields` columns are discarded; extra columns are kept.
pub fn parse_delimited_rows(text: &str, sep: char, min_fields: usize) -> Vec<Vec<&str>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    // header
    lines.next();

    lines
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(sep).map(str::trim).collect();
            if fields.len() < min_fields {
                tracing::debug!(
                    "Dropping row with {} fields (need {}): {}",
                    fields.len(),
                    min_fields,
                    line
                );
                return None;
            }
            Some(fields)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_dropped() {
        let text = "JOBID|NAME|STATE\n1|a|RUNNING\n2|b|PENDING\n";
        let rows = parse_delimited_rows(text, '|', 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1", "a", "RUNNING"]);
    }

    #[test]
    fn test_short_rows_discarded() {
        let text = "A|B|C\n1|2|3\n4|5\n6|7|8|9\n";
        let rows = parse_delimited_rows(text, '|', 3);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["6", "7", "8", "9"]);
    }

    #[test]
    fn test_blank_lines_and_leading_blank_header() {
        let text = "\n\nA,B\n\n1,2\n   \n3,4\n";
        let rows = parse_delimited_rows(text, ',', 2);
        assert_eq!(rows, vec![vec!["1", "2"], vec!["3", "4"]]);
    }

    #[test]
    fn test_header_only_or_empty() {
        assert!(parse_delimited_rows("A|B\n", '|', 2).is_empty());
        assert!(parse_delimited_rows("", '|', 2).is_empty());
    }

    #[test]
    fn test_fields_trimmed() {
        let rows = parse_delimited_rows("H\n 1 | x \r\n", '|', 2);
        assert_eq!(rows[0], vec!["1", "x"]);
    }
}
