mod app;
mod catalog;
mod config;
mod error;
mod image_cache;
mod notify;
mod state;
mod ui;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::app::App;
use crate::config::Config;
use crate::error::Result;

fn setup_logging() -> Result<()> {
    let data_dir = config::data_dir()?;
    std::fs::create_dir_all(&data_dir)?;

    let file_appender = tracing_appender::rolling::daily(&data_dir, "yomu.log");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("yomu=info".parse().unwrap()))
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Set up file-based logging (we own the terminal for TUI)
    if let Err(e) = setup_logging() {
        eprintln!("Warning: Could not set up logging: {}", e);
    }

    info!("Starting yomu");

    // Load configuration
    let config = Config::load()?;
    info!(theme = %config.ui.theme, "Loaded config");

    // Initialize terminal
    let mut terminal = app::init_terminal()?;

    // Terminal graphics support for posters is probed after raw mode;
    // on failure the detail screen falls back to a text placeholder.
    let picker = ratatui_image::picker::Picker::from_query_stdio().ok();

    // Play splash animation
    let accent = ui::widgets::parse_accent_color(&config.ui.accent_color);
    let _ = app::play_splash(&mut terminal, accent);

    // Run the app (async)
    let mut app = App::new(config, picker)?;
    let result = app.run(&mut terminal).await;

    // Restore terminal on exit
    app::restore_terminal()?;

    result
}
