//! CapLab - terminal front end for email/password sign-up, login and sign-out.
//!
//! The terminal stands in for the web page: it shows either the login box or
//! the sign-out control depending on the `token` cookie, and runs the auth
//! workflows from `caplab-core` when a button is pressed.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use caplab_core::Config;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name in cache directory
const LOG_FILE: &str = "caplab.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to a file so they don't draw over the terminal UI.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config ({}), using defaults", e);
            let mut config = Config::default();
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
    };

    let _guard = init_tracing(&config.cache_dir()?)?;
    info!("CapLab starting");

    // Startup routine: build the auth context before touching the terminal
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if app.in_flight > 0 {
        warn!(in_flight = app.in_flight, "Exiting with workflows still running");
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("CapLab shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so workflow results are picked up between keys
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Apply alerts and navigations from finished workflows
        app.check_page_events();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
