//! Header component with tabs, cache counters and cluster totals.

use crate::app::Tab;
use crate::ui::Theme;
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use sqtop_parsers::format_age;
use sqtop_state::{CacheStats, ClusterView};

pub struct Header;

impl Header {
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        tab: Tab,
        user: &str,
        stats: &CacheStats,
        view: &ClusterView,
        updated_secs_ago: Option<u64>,
        theme: &Theme,
    ) {
        let sep = || Span::styled(" │ ", Style::default().fg(theme.muted));

        let mut title = vec![Span::raw(" sqtop"), sep(), Span::raw(user.to_string()), sep()];
        title.extend(tab_spans(tab, theme));

        let updated = match updated_secs_ago {
            Some(secs) => format!(" updated {} ago ", format_age(secs)),
            None => " waiting for data ".to_string(),
        };
        let updated_line =
            Line::from(Span::styled(updated, Style::default().fg(theme.muted))).alignment(Alignment::Right);

        let cluster = &view.cluster;
        let queue = &view.queue;
        let summary = Line::from(vec![
            Span::styled(
                format!("{}R ", stats.running),
                Style::default()
                    .fg(theme.warning)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{}PD", stats.pending), Style::default().fg(theme.info)),
            sep(),
            Span::raw(format!(
                "history {} (requeues {}, max {})",
                stats.total_jobs, stats.total_requeues, stats.max_requeues
            )),
            sep(),
            Span::raw(format!(
                "nodes {}  cpus {}/{}  gpus {}/{}",
                cluster.nodes_total,
                cluster.cpus_alloc,
                cluster.cpus_total,
                cluster.gpus_alloc,
                cluster.gpus_total
            )),
            sep(),
            Span::raw(format!(
                "queue {}R {}PD ({} tasks)",
                queue.running_jobs, queue.pending_jobs, queue.pending_tasks
            )),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from(title))
            .title_top(updated_line);

        frame.render_widget(Paragraph::new(summary).block(block), area);
    }
}

/// Inline tab bar: the selected tab bracketed and bold, the rest dimmed.
fn tab_spans(selected: Tab, theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        if *tab == selected {
            spans.push(Span::styled(
                format!("[{}]", tab.title()),
                Style::default()
                    .fg(theme.highlight)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(
                tab.title().to_string(),
                Style::default().fg(theme.muted),
            ));
        }
    }
    spans.push(Span::raw(" "));
    spans
}
