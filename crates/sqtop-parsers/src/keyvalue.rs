//! `Key=Value` block parsing for `scontrol show` style output.
//!
//! A record is one or more lines of whitespace-separated `Key=Value` tokens.
//! Continuation lines are indented, and a value may contain spaces
//! (`OS=Linux 5.14.0 #1 SMP`), so a value runs until the next key boundary
//! rather than the next space.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// A key starts a line or follows whitespace. Keys may contain `/`, `:` and
/// `.` (`CPUs/Task`, `AllocNode:Sid`, `ReqB:S:C:T`).
static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^|\s)([A-Za-z][A-Za-z0-9_/:.]*)=").expect("valid key regex"));

/// Parse one logical record into a key to value map.
///
/// Values are trimmed; later duplicates of a key overwrite earlier ones.
/// Text before the first key is ignored.
pub fn parse_key_value_block(text: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    // (key, start of value, start of the next match)
    let mut keys: Vec<(&str, usize)> = Vec::new();
    let mut boundaries: Vec<usize> = Vec::new();

    for caps in KEY_RE.captures_iter(text) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        boundaries.push(whole.start());
        keys.push((key.as_str(), whole.end()));
    }

    for (i, (key, value_start)) in keys.iter().enumerate() {
        let value_end = boundaries.get(i + 1).copied().unwrap_or(text.len());
        let value = text[*value_start..value_end].trim();
        map.insert((*key).to_string(), value.to_string());
    }

    map
}

/// Split multi-record output into parsed records.
///
/// Records are separated by blank lines, or by a line that starts with
/// `leading_key=` while a record is already being collected.
pub fn parse_key_value_records(text: &str, leading_key: &str) -> Vec<BTreeMap<String, String>> {
    let marker = format!("{}=", leading_key);
    let mut records = Vec::new();
    let mut current = String::new();

    let mut flush = |current: &mut String| {
        if !current.trim().is_empty() {
            let record = parse_key_value_block(current);
            if !record.is_empty() {
                records.push(record);
            }
        }
        current.clear();
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut current);
            continue;
        }
        if line.trim_start().starts_with(&marker) && !current.trim().is_empty() {
            flush(&mut current);
        }
        current.push_str(line);
        current.push('\n');
    }
    flush(&mut current);

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE: &str = "NodeName=gpu01 Arch=x86_64 CoresPerSocket=16
   CPUAlloc=8 CPUEfctv=32 CPUTot=32 CPULoad=3.10
   Gres=gpu:a100:4(S:0-1)
   OS=Linux 5.14.0-284.el9.x86_64 #1 SMP PREEMPT_DYNAMIC
   RealMemory=257000 AllocMem=64000 FreeMem=190000
   State=MIXED ThreadsPerCore=1
   Partitions=gpu,all
   CfgTRES=cpu=32,mem=257000M,billing=32,gres/gpu=4,gres/gpu:a100=4
   AllocTRES=cpu=8,mem=64000M,gres/gpu=2,gres/gpu:a100=2
";

    #[test]
    fn test_parse_block_basic() {
        let map = parse_key_value_block(NODE);
        assert_eq!(map["NodeName"], "gpu01");
        assert_eq!(map["CPUAlloc"], "8");
        assert_eq!(map["CPUTot"], "32");
        assert_eq!(map["State"], "MIXED");
        assert_eq!(map["Partitions"], "gpu,all");
    }

    #[test]
    fn test_value_with_spaces_runs_to_next_key() {
        let map = parse_key_value_block(NODE);
        assert_eq!(map["OS"], "Linux 5.14.0-284.el9.x86_64 #1 SMP PREEMPT_DYNAMIC");
    }

    #[test]
    fn test_nested_equals_stay_in_value() {
        let map = parse_key_value_block(NODE);
        assert_eq!(
            map["CfgTRES"],
            "cpu=32,mem=257000M,billing=32,gres/gpu=4,gres/gpu:a100=4"
        );
        assert!(!map.contains_key("cpu"));
        assert!(!map.contains_key("gres/gpu"));
    }

    #[test]
    fn test_keys_with_punctuation() {
        let map = parse_key_value_block("JobId=1 AllocNode:Sid=login:42 CPUs/Task=2");
        assert_eq!(map["AllocNode:Sid"], "login:42");
        assert_eq!(map["CPUs/Task"], "2");
    }

    #[test]
    fn test_empty_value() {
        let map = parse_key_value_block("Reason= State=IDLE");
        assert_eq!(map["Reason"], "");
        assert_eq!(map["State"], "IDLE");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_key_value_block("").is_empty());
        assert!(parse_key_value_block("no pairs here").is_empty());
    }

    #[test]
    fn test_records_split_on_blank_lines() {
        let text = "NodeName=a State=IDLE\n   CPUTot=4\n\nNodeName=b State=DOWN\n";
        let records = parse_key_value_records(text, "NodeName");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["NodeName"], "a");
        assert_eq!(records[0]["CPUTot"], "4");
        assert_eq!(records[1]["State"], "DOWN");
    }

    #[test]
    fn test_records_split_on_recurring_name() {
        let text = "NodeName=a State=IDLE\n   CPUTot=4\nNodeName=b State=DOWN\n   CPUTot=8\n";
        let records = parse_key_value_records(text, "NodeName");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["NodeName"], "b");
        assert_eq!(records[1]["CPUTot"], "8");
    }
}
