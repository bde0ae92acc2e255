use std::{io, sync::Arc};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use session::{render::theme_names, CompletionGateway, HttpGateway, Renderer};
use tracing::info;

use crate::{app::App, clipboard::SystemClipboard, config::TermConfig};

mod app;
mod clipboard;
mod config;
mod input;
mod logging;
mod markdown;
mod view;

mod env {
    pub const GATEWAY_URL: &str = "REVCHAT_GATEWAY_URL";
    pub const LOG_FILE: &str = "REVCHAT_LOG_FILE";
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste,
            crossterm::cursor::Show
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = TermConfig::parse();
    logging::configure_logging(config.log_file.as_deref())?;

    let renderer = Renderer::with_theme(&config.theme).with_context(|| {
        format!(
            "unknown theme '{}', expected one of: {}",
            config.theme,
            theme_names().join(", ")
        )
    })?;
    let gateway: Arc<dyn CompletionGateway> =
        Arc::new(HttpGateway::new(reqwest::Client::new(), &config.gateway_url));
    info!("Using gateway at {}", config.gateway_url);

    let (app, exchange_rx) = App::new(gateway, renderer, Box::new(SystemClipboard::new()));

    enable_raw_mode().context("failed to enable raw mode")?;
    let _guard = TerminalGuard;
    crossterm::execute!(
        io::stdout(),
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    app::run(&mut terminal, app, exchange_rx).await
}
