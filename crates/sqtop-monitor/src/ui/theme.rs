//! Color themes.

use ratatui::style::Color;
use sqtop_slurm::StateCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub foreground: Color,
    pub muted: Color,
    pub highlight: Color,
    pub selection: Color,
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            foreground: Color::White,
            muted: Color::DarkGray,
            highlight: Color::Cyan,
            selection: Color::DarkGray,
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Blue,
        }
    }

    pub fn light() -> Self {
        Self {
            foreground: Color::Black,
            muted: Color::Gray,
            highlight: Color::Blue,
            selection: Color::Gray,
            success: Color::Green,
            error: Color::Red,
            warning: Color::Magenta,
            info: Color::Blue,
        }
    }

    /// Look up a theme by name; unknown names fall back to dark.
    pub fn by_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn state_color(&self, category: StateCategory) -> Color {
        match category {
            StateCategory::Running => self.warning,
            StateCategory::Pending => self.info,
            StateCategory::Completed => self.success,
            StateCategory::Failed | StateCategory::TimedOut => self.error,
            StateCategory::Cancelled => Color::Magenta,
            StateCategory::Other => self.foreground,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
