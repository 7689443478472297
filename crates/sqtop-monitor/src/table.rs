//! Incremental table model.
//!
//! `DiffTable` remembers what it last rendered (key -> cells plus the visible
//! order) and turns every new row set into the mutations needed to bring the
//! screen up to date. The cursor follows a row key, not an index.

use sqtop_parsers::{parse_clock_secs, parse_memory_mb};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// One table row: display cells plus the key that identifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRow {
    pub key: String,
    pub cells: Vec<String>,
}

impl RenderRow {
    pub fn new(key: impl Into<String>, cells: Vec<String>) -> Self {
        Self {
            key: key.into(),
            cells,
        }
    }
}

/// A change applied to the rendered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Insert { key: String, index: usize },
    Remove { key: String },
    /// Column count changed; every cell is redrawn
    ReplaceRow { key: String },
    UpdateCell { key: String, column: usize },
    /// Surviving rows changed relative order
    Reorder,
    /// Visible set recomputed from scratch
    Rebuild { visible: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Ascending => "▲",
            Self::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: usize,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Filter {
    #[default]
    None,
    Any(String),
    Column { column: usize, needle: String },
}

impl Filter {
    fn parse(query: &str, columns: &[&str]) -> Self {
        let query = query.trim();
        if query.is_empty() {
            return Filter::None;
        }
        if let Some((name, needle)) = query.split_once(':') {
            let name = name.trim();
            if let Some(column) = columns.iter().position(|c| c.eq_ignore_ascii_case(name)) {
                return Filter::Column {
                    column,
                    needle: needle.trim().to_lowercase(),
                };
            }
        }
        Filter::Any(query.to_lowercase())
    }

    fn matches(&self, cells: &[String]) -> bool {
        match self {
            Filter::None => true,
            Filter::Any(needle) => cells.iter().any(|c| c.to_lowercase().contains(needle)),
            Filter::Column { column, needle } => cells
                .get(*column)
                .is_some_and(|c| c.to_lowercase().contains(needle)),
        }
    }
}

/// Rendered state of one table.
#[derive(Debug, Clone)]
pub struct DiffTable {
    columns: Vec<&'static str>,
    /// Every row last given to `set_data`, visible or not; None before the first populate
    rows: Option<HashMap<String, Vec<String>>>,
    /// Insertion order of `rows`, the order used when no sort is active
    input_order: Vec<String>,
    /// Visible keys in display order
    visible: Vec<String>,
    filter_text: String,
    filter: Filter,
    sort: Option<SortSpec>,
    cursor: usize,
    cursor_key: Option<String>,
}

impl DiffTable {
    pub fn new(columns: &[&'static str]) -> Self {
        Self {
            columns: columns.to_vec(),
            rows: None,
            input_order: Vec::new(),
            visible: Vec::new(),
            filter_text: String::new(),
            filter: Filter::None,
            sort: None,
            cursor: 0,
            cursor_key: None,
        }
    }

    /// Reconcile a new row set with what is on screen.
    ///
    /// Rows with a repeated key are ignored after the first.
    pub fn set_data(&mut self, data: Vec<RenderRow>) -> Vec<Mutation> {
        let mut next: HashMap<String, Vec<String>> = HashMap::with_capacity(data.len());
        let mut input_order = Vec::with_capacity(data.len());
        for row in data {
            if next.contains_key(&row.key) {
                continue;
            }
            input_order.push(row.key.clone());
            next.insert(row.key, row.cells);
        }

        let new_visible = self.visible_order(&next, &input_order);
        let mutations = match self.rows.as_ref() {
            None => new_visible
                .iter()
                .enumerate()
                .map(|(index, key)| Mutation::Insert {
                    key: key.clone(),
                    index,
                })
                .collect(),
            Some(prev) => self.diff(prev, &next, &new_visible),
        };

        self.rows = Some(next);
        self.input_order = input_order;
        self.visible = new_visible;
        self.restore_cursor();
        mutations
    }

    /// Forget everything; the next `set_data` is a first populate.
    pub fn clear(&mut self) {
        self.rows = None;
        self.input_order.clear();
        self.visible.clear();
        self.cursor = 0;
        self.cursor_key = None;
    }

    /// Apply a filter query: a substring over all cells or `column:value`.
    pub fn set_filter(&mut self, query: &str) -> Vec<Mutation> {
        let filter = Filter::parse(query, &self.columns);
        self.filter_text = query.trim().to_string();
        if filter == self.filter {
            return Vec::new();
        }
        self.filter = filter;
        self.rebuild()
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) -> Vec<Mutation> {
        if sort == self.sort {
            return Vec::new();
        }
        self.sort = sort;
        self.rebuild()
    }

    /// Step the sort column: unsorted, then each column ascending.
    pub fn cycle_sort_column(&mut self) -> Vec<Mutation> {
        let next = match self.sort {
            None if !self.columns.is_empty() => Some(SortSpec {
                column: 0,
                direction: SortDirection::Ascending,
            }),
            Some(spec) if spec.column + 1 < self.columns.len() => Some(SortSpec {
                column: spec.column + 1,
                direction: spec.direction,
            }),
            _ => None,
        };
        self.set_sort(next)
    }

    pub fn toggle_sort_direction(&mut self) -> Vec<Mutation> {
        let next = self.sort.map(|spec| SortSpec {
            column: spec.column,
            direction: spec.direction.toggle(),
        });
        self.set_sort(next)
    }

    pub fn row_count(&self) -> usize {
        self.visible.len()
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor
    }

    pub fn cursor_key(&self) -> Option<&str> {
        self.cursor_key.as_deref()
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn filter_text(&self) -> &str {
        &self.filter_text
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    /// Visible rows in display order.
    pub fn rows(&self) -> Vec<(&str, &[String])> {
        let Some(rows) = self.rows.as_ref() else {
            return Vec::new();
        };
        self.visible
            .iter()
            .filter_map(|key| rows.get(key).map(|cells| (key.as_str(), cells.as_slice())))
            .collect()
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.visible.len() {
            self.move_cursor(self.cursor + 1);
        }
    }

    pub fn cursor_up(&mut self) {
        if self.cursor > 0 {
            self.move_cursor(self.cursor - 1);
        }
    }

    pub fn cursor_first(&mut self) {
        self.move_cursor(0);
    }

    pub fn cursor_last(&mut self) {
        self.move_cursor(self.visible.len().saturating_sub(1));
    }

    fn move_cursor(&mut self, index: usize) {
        self.cursor = index;
        self.cursor_key = self.visible.get(index).cloned();
    }

    fn diff(
        &self,
        prev: &HashMap<String, Vec<String>>,
        next: &HashMap<String, Vec<String>>,
        new_visible: &[String],
    ) -> Vec<Mutation> {
        let old_visible: HashSet<&str> = self.visible.iter().map(String::as_str).collect();
        let now_visible: HashSet<&str> = new_visible.iter().map(String::as_str).collect();

        let flipped = next.keys().any(|key| {
            prev.contains_key(key)
                && old_visible.contains(key.as_str()) != now_visible.contains(key.as_str())
        });
        if flipped {
            return vec![Mutation::Rebuild {
                visible: new_visible.len(),
            }];
        }

        let mut mutations = Vec::new();

        for key in &self.visible {
            if !now_visible.contains(key.as_str()) {
                mutations.push(Mutation::Remove { key: key.clone() });
            }
        }

        for (index, key) in new_visible.iter().enumerate() {
            let (Some(old), Some(new)) = (prev.get(key), next.get(key)) else {
                mutations.push(Mutation::Insert {
                    key: key.clone(),
                    index,
                });
                continue;
            };
            if old.len() != new.len() {
                mutations.push(Mutation::ReplaceRow { key: key.clone() });
                continue;
            }
            for (column, (a, b)) in old.iter().zip(new).enumerate() {
                if a != b {
                    mutations.push(Mutation::UpdateCell {
                        key: key.clone(),
                        column,
                    });
                }
            }
        }

        let survivors_before: Vec<&str> = self
            .visible
            .iter()
            .map(String::as_str)
            .filter(|k| now_visible.contains(k))
            .collect();
        let survivors_after: Vec<&str> = new_visible
            .iter()
            .map(String::as_str)
            .filter(|k| old_visible.contains(k))
            .collect();
        if survivors_before != survivors_after {
            mutations.push(Mutation::Reorder);
        }

        mutations
    }

    fn rebuild(&mut self) -> Vec<Mutation> {
        let Some(rows) = self.rows.as_ref() else {
            return Vec::new();
        };
        self.visible = self.visible_order(rows, &self.input_order);
        self.restore_cursor();
        vec![Mutation::Rebuild {
            visible: self.visible.len(),
        }]
    }

    fn visible_order(&self, rows: &HashMap<String, Vec<String>>, order: &[String]) -> Vec<String> {
        let mut visible: Vec<(&String, &Vec<String>)> = order
            .iter()
            .filter_map(|key| rows.get(key).map(|cells| (key, cells)))
            .filter(|(_, cells)| self.filter.matches(cells))
            .collect();

        if let Some(spec) = self.sort {
            visible.sort_by(|(_, a), (_, b)| {
                let ordering = compare_cells(
                    a.get(spec.column).map(String::as_str).unwrap_or_default(),
                    b.get(spec.column).map(String::as_str).unwrap_or_default(),
                );
                match spec.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        visible.into_iter().map(|(key, _)| key.clone()).collect()
    }

    fn restore_cursor(&mut self) {
        let by_key = self
            .cursor_key
            .as_ref()
            .and_then(|key| self.visible.iter().position(|k| k == key));
        let index = by_key.unwrap_or_else(|| self.cursor.min(self.visible.len().saturating_sub(1)));
        self.move_cursor(index);
    }
}

/// Cells that read as numbers, durations or memory sizes sort numerically
/// and ahead of all other cells, which sort case-insensitively.
fn compare_cells(a: &str, b: &str) -> Ordering {
    match (sort_number(a), sort_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

fn sort_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    cell.parse::<f64>()
        .ok()
        .or_else(|| parse_clock_secs(cell).map(|s| s as f64))
        .or_else(|| parse_memory_mb(cell).map(|mb| mb as f64))
}
