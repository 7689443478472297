//! Full-screen states shown before the dashboard: loading and unavailable.

use crate::ui::Theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};
use sqtop_state::LoadProgress;

pub struct LoadingScreen;

impl LoadingScreen {
    pub fn render(frame: &mut Frame, area: Rect, progress: &LoadProgress, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(centered_columns(area, 60));

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" sqtop "))
            .gauge_style(Style::default().fg(theme.highlight))
            .percent(progress.percent())
            .label(format!("{}% {}", progress.percent(), progress.current_label()));
        frame.render_widget(gauge, chunks[1]);

        let failures: Vec<Line> = progress
            .failures()
            .iter()
            .map(|(step, reason)| {
                Line::from(vec![
                    Span::styled("✗ ", Style::default().fg(theme.error)),
                    Span::raw(format!("{}: {}", step.label(), reason)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(failures).wrap(Wrap { trim: true }), chunks[2]);
    }
}

pub struct UnavailableScreen;

impl UnavailableScreen {
    pub fn render(frame: &mut Frame, area: Rect, reason: &str, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Length(7),
                Constraint::Min(0),
            ])
            .split(centered_columns(area, 70));

        let lines = vec![
            Line::from(Span::styled(
                "Slurm tools are not available on this host",
                Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(reason.to_string(), Style::default().fg(theme.muted))),
            Line::from(""),
            Line::from("Press q to quit"),
        ];

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" sqtop "));
        frame.render_widget(paragraph, chunks[1]);
    }
}

fn centered_columns(area: Rect, percent: u16) -> Rect {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent) / 2),
            Constraint::Percentage(percent),
            Constraint::Percentage((100 - percent) / 2),
        ])
        .split(area)[1]
}
