//! Terminal UI for sqtop.
//!
//! `table` is the incremental table model, `rows` adapts records to it and
//! `app` wires both into the ratatui screens.

pub mod app;
pub mod components;
pub mod rows;
pub mod table;
pub mod ui;

pub use app::{Action, App, AppEvent, DashboardUpdate, Screen, Tab};
pub use rows::{TableRow, render_rows};
pub use table::{DiffTable, Mutation, RenderRow, SortDirection, SortSpec};
pub use ui::Theme;
