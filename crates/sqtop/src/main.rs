//! sqtop - live terminal dashboard for Slurm.

mod polling;

use camino::Utf8Path;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use miette::{IntoDiagnostic, Result};
use polling::{Poller, PollingConfig, SlurmCli};
use ratatui::prelude::*;
use serde::Serialize;
use sqtop_cli::Args;
use sqtop_monitor::{Action, App, AppEvent, Theme};
use sqtop_state::{CacheCell, CacheSnapshot, ClusterView, NoProgress};
use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// How long the UI waits for a key before checking for worker events.
const TICK_RATE: Duration = Duration::from_millis(100);

/// Output of `--dump`.
#[derive(Serialize)]
struct Dump<'a> {
    generation: u64,
    warnings: &'a [String],
    jobs: &'a CacheSnapshot,
    cluster: &'a ClusterView,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_path())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("sqtop-worker")
        .build()
        .into_diagnostic()?;
    let enter = runtime.enter();

    let cache = CacheCell::new();
    let config = PollingConfig::from(&args);
    let (tx, mut rx) = mpsc::channel(config.channel_capacity);
    let poller = Arc::new(Poller::new(
        SlurmCli::new(args.query_options()),
        cache.get(),
        tx,
    ));

    if args.dump {
        let update = runtime.block_on(poller.initial_load(&NoProgress))?;
        let snapshot = cache.get().snapshot();
        let dump = Dump {
            generation: update.generation,
            warnings: &update.warnings,
            jobs: &snapshot,
            cluster: &update.view,
        };
        let json = serde_json::to_string_pretty(&dump).into_diagnostic()?;
        println!("{}", json);
        return Ok(());
    }

    tracing::info!("Starting sqtop for user {}", args.user);
    let mut app = App::new(cache.get(), args.user.clone(), Theme::by_name(&args.theme));
    poller.spawn_initial_load(config);

    // Setup terminal
    enable_raw_mode().into_diagnostic()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).into_diagnostic()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).into_diagnostic()?;

    let res = run_app(&mut terminal, &mut app, &mut rx, &poller);

    // Restore terminal
    disable_raw_mode().into_diagnostic()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .into_diagnostic()?;
    terminal.show_cursor().into_diagnostic()?;

    // Workers are not waited on; pending subprocesses die with the runtime.
    drop(rx);
    drop(enter);
    runtime.shutdown_timeout(Duration::from_secs(1));

    if let Err(err) = res {
        tracing::error!("UI loop failed: {}", err);
        return Err(err).into_diagnostic();
    }
    tracing::info!("sqtop exiting");
    Ok(())
}

/// Main application loop.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut mpsc::Receiver<AppEvent>,
    poller: &Arc<Poller<SlurmCli>>,
) -> io::Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        app.poll_events(TICK_RATE)?;

        while let Ok(event) = events.try_recv() {
            app.handle_event(event);
        }

        for action in app.take_actions() {
            match action {
                Action::Refresh => {
                    poller.trigger();
                }
                Action::Cancel(job_id) => {
                    poller.spawn_cancel(job_id);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Send tracing output to a file; the terminal belongs to the UI.
fn init_logging(path: &Utf8Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .into_diagnostic()?;
    let filter = EnvFilter::try_from_env("SQTOP_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
