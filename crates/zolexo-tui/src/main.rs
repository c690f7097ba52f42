//! Zolexomart sign-in - a terminal front-end for the Zolexomart auth service.
//!
//! Shows a login screen until a session token is stored locally, then a
//! signed-in home screen. The token survives restarts until logout.

mod app;
mod ui;

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zolexo_core::device::resolve_device_id;
use zolexo_core::{AuthClient, Config, Credentials, LoginController};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name in the data directory
const LOG_FILE: &str = "zolexo.log";

const USAGE: &str = "\
Usage: zolexo [OPTION]

Without options, starts the terminal sign-in screen.

Options:
  --login    Sign in from the command line
  --logout   Sign out and wipe local storage
  --status   Show whether a session is stored
  --help     Show this message";

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the UI, so logs go to a file in the data
/// directory when one is available.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = log_dir.filter(|dir| std::fs::create_dir_all(dir).is_ok());
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_dir = Config::data_dir().ok();
    let _log_guard = init_tracing(log_dir.as_deref());
    let config = load_config();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--login") => return login_interactive(config).await,
        Some("--logout") => return logout(config).await,
        Some("--status") => return status(config).await,
        Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            return Ok(());
        }
        Some(other) => {
            eprintln!("Unknown option: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
        None => {}
    }

    info!(base_url = %config.base_url, "Zolexo starting");

    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Restore the saved session while the splash screen shows
    app.start();

    let result = run_app(&mut terminal, &mut app).await;
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Zolexo shutting down");
    Ok(())
}

/// Interactive login (CLI mode)
async fn login_interactive(config: Config) -> Result<()> {
    let session = App::open_session(&config)?;
    if session.restore_session().await.is_logged_in() {
        println!("Already signed in. Run with --logout first to switch accounts.");
        return Ok(());
    }

    println!("\n=== Zolexomart Sign In ===\n");

    print!("Phone Number: ");
    io::stdout().flush()?;
    let mut phone_number = String::new();
    io::stdin().read_line(&mut phone_number)?;

    let password = rpassword::prompt_password("Password: ")?;
    let device_id = resolve_device_id(config.device_id_source().as_ref());

    let client = AuthClient::with_timeout(&config.base_url, config.request_timeout())
        .context("Failed to create auth client")?;
    let controller = LoginController::new(client, session);

    println!("\nSigning in...");

    let credentials = Credentials::new(phone_number.trim(), password, device_id);
    match controller.submit(credentials).await {
        Ok(()) => {
            println!("Login successful!");
            Ok(())
        }
        Err(e) => {
            if let Some(message) = e.alert_message() {
                eprintln!("Error: {}", message);
            }
            Err(e).context("Login failed")
        }
    }
}

async fn logout(config: Config) -> Result<()> {
    let session = App::open_session(&config)?;
    session.logout().await.context("Failed to sign out")?;
    println!("Signed out.");
    Ok(())
}

async fn status(config: Config) -> Result<()> {
    let session = App::open_session(&config)?;
    let state = session.restore_session().await;
    if state.is_logged_in() {
        println!("logged in");
    } else {
        println!("logged out");
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Re-route on session changes, then pick up finished login attempts
        app.sync_session();
        app.check_background_tasks();

        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
