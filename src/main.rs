mod api;
mod app;
mod auth;
mod cache;
mod clipboard;
mod config;
mod event;
mod format;
mod interaction;
mod models;
mod pages;
mod refresh;
mod ui;

use crate::api::ApiClient;
use crate::app::App;
use crate::auth::{RingStorage, SessionStore};
use crate::clipboard::Osc52;
use crate::config::Config;
use crate::event::Dispatch;
use crossterm::{
    event::{
        DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange, Event,
        EventStream, KeyEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const TICK: Duration = Duration::from_millis(250);

fn init_logging() -> anyhow::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("mailcake_debug.log")?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mailcake=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--debug") {
        init_logging()?;
    }

    if std::env::args().any(|arg| arg == "--logout") {
        RingStorage.clear()?;
        println!("Session cleared. Run mailcake again to sign in.");
        return Ok(());
    }

    let config = Config::load();
    let client = ApiClient::new(&config.api_url)?;
    tracing::info!(api_url = %config.api_url, "starting");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatch = Dispatch::new(Arc::new(client), tx);
    let mut app = App::new(
        &config,
        dispatch,
        Box::new(RingStorage),
        Box::new(Osc52),
        Instant::now(),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableFocusChange,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, &mut rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<event::AppEvent>,
) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(TICK);
    app.start();

    while !app.should_quit {
        terminal.draw(|f| ui::render(f, app))?;

        tokio::select! {
            maybe = events.next() => match maybe {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, Instant::now());
                }
                Some(Ok(Event::Paste(text))) => app.handle_paste(&text),
                Some(Ok(Event::FocusGained)) => app.set_focused(true),
                Some(Ok(Event::FocusLost)) => app.set_focused(false),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            Some(event) = rx.recv() => app.handle_event(event, Instant::now()),
            _ = ticker.tick() => app.tick(Instant::now()),
        }
    }

    Ok(())
}
