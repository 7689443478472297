//! TUI components.

pub mod data_table;
pub mod footer;
pub mod header;
pub mod loading;

pub use data_table::DataTable;
pub use footer::{Footer, FooterMode};
pub use header::Header;
pub use loading::{LoadingScreen, UnavailableScreen};
