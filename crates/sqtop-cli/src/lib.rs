//! CLI argument parsing for sqtop.

use camino::Utf8PathBuf;
use clap::Parser;
use sqtop_slurm::QueryOptions;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "sqtop")]
#[command(about = "Live terminal dashboard for Slurm jobs, nodes and fair-share")]
#[command(version)]
pub struct Args {
    /// Refresh interval in seconds
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// User whose jobs are listed (defaults to $USER)
    #[arg(long, env = "USER")]
    pub user: String,

    /// Show finished jobs from the last N hours
    #[arg(long, default_value = "24", value_parser = clap::value_parser!(u64).range(1..))]
    pub history_hours: u64,

    /// Kill a scheduler command after this many seconds
    #[arg(long, default_value = "15", value_parser = clap::value_parser!(u64).range(1..))]
    pub command_timeout: u64,

    /// Log file (the terminal belongs to the UI)
    #[arg(long)]
    pub log_file: Option<Utf8PathBuf>,

    /// Color theme (dark or light)
    #[arg(long, default_value = "dark")]
    pub theme: String,

    /// Run one load, print it as JSON and exit
    #[arg(long)]
    pub dump: bool,
}

impl Args {
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            user: self.user.clone(),
            history_hours: self.history_hours,
            timeout: Duration::from_secs(self.command_timeout),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Explicit log file, or `sqtop.log` in the temp directory.
    pub fn log_path(&self) -> Utf8PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            let dir = Utf8PathBuf::from_path_buf(std::env::temp_dir())
                .unwrap_or_else(|_| Utf8PathBuf::from("/tmp"));
            dir.join("sqtop.log")
        })
    }
}
