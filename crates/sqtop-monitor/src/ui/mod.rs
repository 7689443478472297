//! Styling shared by all components.

pub mod theme;

pub use theme::Theme;
