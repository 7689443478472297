//! Table component drawing a `DiffTable`.

use crate::table::DiffTable;
use crate::ui::Theme;
use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
};
use sqtop_slurm::StateCategory;

const MAX_COLUMN_WIDTH: usize = 40;

pub struct DataTable;

impl DataTable {
    /// Render the visible rows with the cursor row highlighted.
    ///
    /// When `state_column` is set, rows are colored by the state in that column.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        table: &DiffTable,
        title: Line,
        state_column: Option<usize>,
        theme: &Theme,
    ) {
        let rows = table.rows();
        let sort = table.sort();

        let header = Row::new(table.columns().iter().enumerate().map(|(i, name)| {
            let label = match sort {
                Some(spec) if spec.column == i => format!("{} {}", name, spec.direction.arrow()),
                _ => name.to_string(),
            };
            Cell::from(label)
        }))
        .style(
            Style::default()
                .fg(theme.highlight)
                .add_modifier(Modifier::BOLD),
        );

        let body: Vec<Row> = rows
            .iter()
            .map(|(_, cells)| {
                let style = state_column
                    .and_then(|col| cells.get(col))
                    .map(|state| {
                        Style::default().fg(theme.state_color(StateCategory::from_state(state)))
                    })
                    .unwrap_or_else(|| Style::default().fg(theme.foreground));
                Row::new(cells.iter().map(|c| Cell::from(c.as_str()))).style(style)
            })
            .collect();

        let widths = column_widths(table.columns(), &rows);

        let mut title = title;
        if !table.filter_text().is_empty() {
            title.spans.push(format!("[/{}] ", table.filter_text()).into());
        }

        let widget = Table::new(body, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(
                Style::default()
                    .bg(theme.selection)
                    .add_modifier(Modifier::BOLD),
            );

        let mut state = TableState::default();
        if table.row_count() > 0 {
            state.select(Some(table.cursor_row()));
        }

        frame.render_stateful_widget(widget, area, &mut state);
    }
}

/// Fit each column to its widest cell, capped; the last column takes the rest.
fn column_widths(columns: &[&str], rows: &[(&str, &[String])]) -> Vec<Constraint> {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count() + 2).collect();
    for (_, cells) in rows {
        for (i, cell) in cells.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let last = widths.len().saturating_sub(1);
    widths
        .into_iter()
        .enumerate()
        .map(|(i, w)| {
            let w = w.min(MAX_COLUMN_WIDTH) as u16;
            if i == last {
                Constraint::Min(w)
            } else {
                Constraint::Length(w)
            }
        })
        .collect()
}
