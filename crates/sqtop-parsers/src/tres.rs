//! Trackable-resource grammar.
//!
//! Slurm describes resources in two compact encodings:
//!
//! - TRES form, comma-joined `family[:type]=count`
//!   (`cpu=8,mem=64000M,gres/gpu=2,gres/gpu:a100=2`)
//! - Gres form, comma-joined `family[:type]:count[(extra)]`
//!   (`gpu:a100:4(S:0-1)`, `gres/gpu:2`)
//!
//! Both list a generic `family=N` entry next to the typed ones, so a node
//! with four A100s reports `gres/gpu=4` *and* `gres/gpu:a100=4`. Totals
//! must drop the generic entry whenever a typed one is present.

use std::collections::BTreeMap;

/// One `(type, count)` pair for a resource family.
///
/// A generic entry carries the family name itself as its tag. Tags are
/// stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub type_tag: String,
    pub count: u64,
}

impl ResourceEntry {
    pub fn new(type_tag: impl Into<String>, count: u64) -> Self {
        Self {
            type_tag: type_tag.into().to_ascii_lowercase(),
            count,
        }
    }

    pub fn is_generic(&self, family: &str) -> bool {
        self.type_tag.eq_ignore_ascii_case(family)
    }
}

/// Parse the TRES form, keeping entries of `family`.
pub fn parse_tres(s: &str, family: &str) -> Vec<ResourceEntry> {
    let family = family.to_ascii_lowercase();
    split_top_level(s)
        .filter_map(|token| {
            let token = token.to_ascii_lowercase();
            let (name, count) = strip_prefix(&token).split_once('=')?;
            let (fam, kind) = match name.split_once(':') {
                Some((fam, kind)) => (fam, Some(kind)),
                None => (name, None),
            };
            if fam != family {
                return None;
            }
            let count = parse_count(count)?;
            Some(ResourceEntry::new(kind.unwrap_or(family.as_str()), count))
        })
        .collect()
}

/// Parse the Gres form, keeping entries of `family`.
pub fn parse_gres(s: &str, family: &str) -> Vec<ResourceEntry> {
    let family = family.to_ascii_lowercase();
    split_top_level(s)
        .filter_map(|token| {
            let token = token.to_ascii_lowercase();
            let token = strip_prefix(&token);
            let token = token.split('(').next().unwrap_or_default();
            let mut parts = token.split(':');
            if parts.next()? != family {
                return None;
            }
            let rest: Vec<&str> = parts.filter(|p| !p.is_empty()).collect();
            match rest.as_slice() {
                [] => Some(ResourceEntry::new(family.as_str(), 1)),
                [only] => match only.parse::<u64>() {
                    Ok(count) => Some(ResourceEntry::new(family.as_str(), count)),
                    Err(_) => Some(ResourceEntry::new(*only, 1)),
                },
                [kind, .., last] => match last.parse::<u64>() {
                    Ok(count) => Some(ResourceEntry::new(*kind, count)),
                    Err(_) => Some(ResourceEntry::new(*kind, 1)),
                },
            }
        })
        .collect()
}

/// Per-type totals, with generic entries dropped when any typed entry exists.
pub fn aggregate(family: &str, entries: &[ResourceEntry]) -> BTreeMap<String, u64> {
    let family = family.to_ascii_lowercase();
    let mut map: BTreeMap<String, u64> = BTreeMap::new();
    for entry in entries {
        let total = map.entry(entry.type_tag.clone()).or_default();
        *total = total.saturating_add(entry.count);
    }
    if entries.iter().any(|e| !e.is_generic(&family)) {
        map.remove(&family);
    }
    map
}

/// Total count under the same rule as `aggregate`.
pub fn total_count(family: &str, entries: &[ResourceEntry]) -> u64 {
    saturating_sum(aggregate(family, entries).values())
}

/// Render as `"4x A100, 2x H100"`, sorted by type name.
pub fn format_resources(family: &str, entries: &[ResourceEntry]) -> String {
    format_map(&aggregate(family, entries))
}

fn format_map(map: &BTreeMap<String, u64>) -> String {
    map.iter()
        .filter(|(_, count)| **count > 0)
        .map(|(kind, count)| format!("{}x {}", count, kind.to_ascii_uppercase()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Running per-type totals across many resource strings.
///
/// Each source is aggregated on its own before merging, so one node's
/// generic entry is only dropped against that same node's typed entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTally {
    counts: BTreeMap<String, u64>,
}

impl ResourceTally {
    pub fn add(&mut self, family: &str, entries: &[ResourceEntry]) {
        for (kind, count) in aggregate(family, entries) {
            let total = self.counts.entry(kind).or_default();
            *total = total.saturating_add(count);
        }
    }

    pub fn total(&self) -> u64 {
        saturating_sum(self.counts.values())
    }

    pub fn format(&self) -> String {
        format_map(&self.counts)
    }
}

fn saturating_sum<'a>(counts: impl Iterator<Item = &'a u64>) -> u64 {
    counts.fold(0, |acc, count| acc.saturating_add(*count))
}

/// Split on commas that are not inside parentheses (`IDX:0,2-3`).
fn split_top_level(s: &str) -> impl Iterator<Item = String> + '_ {
    let s = s.trim();
    let placeholder = s.is_empty() || s == "(null)" || s.eq_ignore_ascii_case("n/a");

    let mut tokens = Vec::new();
    if !placeholder {
        let mut depth = 0usize;
        let mut current = String::new();
        for c in s.chars() {
            match c {
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                ',' if depth == 0 => tokens.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        tokens.push(current);
    }

    tokens
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn strip_prefix(token: &str) -> &str {
    token
        .strip_prefix("gres/")
        .or_else(|| token.strip_prefix("gres:"))
        .unwrap_or(token)
}

fn parse_count(s: &str) -> Option<u64> {
    s.split('(').next()?.trim().parse().ok()
}
