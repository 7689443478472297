//! Footer component with keyboard shortcuts and status messages.

use crate::ui::Theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = "tab:view  j/k:nav  /:filter  s/S:sort  r:refresh  x:cancel  c:copy  ?:help  q:quit";

/// What the left side of the footer shows.
pub enum FooterMode<'a> {
    Help,
    Status(&'a str),
    Filter(&'a str),
    ConfirmCancel(&'a str),
}

pub struct Footer;

impl Footer {
    pub fn render(frame: &mut Frame, area: Rect, mode: FooterMode, theme: &Theme) {
        let version = format!("v{}", VERSION);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(version.len() as u16 + 1),
            ])
            .split(area);

        let left = match mode {
            FooterMode::Help => Line::from(Span::styled(HELP, Style::default().fg(theme.muted))),
            FooterMode::Status(msg) => Line::from(Span::styled(
                msg.to_string(),
                Style::default()
                    .fg(theme.highlight)
                    .add_modifier(Modifier::BOLD),
            )),
            FooterMode::Filter(input) => Line::from(vec![
                Span::styled("/", Style::default().fg(theme.warning)),
                Span::raw(input.to_string()),
                Span::styled("█", Style::default().fg(theme.muted)),
                Span::styled(
                    "  enter:apply  esc:clear",
                    Style::default().fg(theme.muted),
                ),
            ]),
            FooterMode::ConfirmCancel(job_id) => Line::from(Span::styled(
                format!("Cancel job {}? y to confirm, any other key aborts", job_id),
                Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
            )),
        };

        frame.render_widget(Paragraph::new(left), chunks[0]);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                version,
                Style::default().fg(theme.muted),
            ))),
            chunks[1],
        );
    }
}
