mod api;
mod app;
mod clipboard;
mod config;
mod conversation;
mod events;
mod input;
mod logging;
mod models;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::Backend, prelude::*};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

use api::GeminiClient;
use app::App;
use clipboard::{Clipboard, NoClipboard, SystemClipboard};
use events::AppEvent;
use input::KeyOutcome;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let _log_guard = logging::init_tracing(&config::get_log_dir()?);
    info!(model = %config.model, "starting enigma");

    let api_key = config::resolve_api_key(&config, |name| std::env::var(name).ok());
    if api_key.is_none() {
        warn!("no API key found; requests will fail until {} is set", config::API_KEY_ENV);
    }
    let client = GeminiClient::new(config.api_base_url.clone(), config.model.clone(), api_key)?;

    let mut clipboard: Box<dyn Clipboard> = match SystemClipboard::new() {
        Ok(clipboard) => Box::new(clipboard),
        Err(e) => {
            warn!(error = %e, "system clipboard unavailable");
            Box::new(NoClipboard)
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config);

    // Answers come back from spawned request tasks through this channel
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();

    let res = run_app(
        &mut terminal,
        &mut app,
        &client,
        clipboard.as_mut(),
        &tx,
        &mut rx,
    );

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {err:?}");
    }

    info!("session ended");
    Ok(())
}

/// Queue the draft and fire the request. Returns false if nothing was sent.
fn send_message(
    app: &mut App,
    client: &GeminiClient,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) -> bool {
    let Some((ticket, question)) = app.submit() else {
        return false;
    };

    let client = client.clone();
    let tx = event_tx.clone();

    tokio::spawn(async move {
        let event = match client.ask(&question).await {
            Ok(text) => AppEvent::Answer { ticket, text },
            Err(error) => AppEvent::Failed { ticket, error },
        };
        // The receiver only goes away when the app is shutting down
        let _ = tx.send(event);
    });
    true
}

fn handle_keyboard_input(
    app: &mut App,
    key: KeyEvent,
    client: &GeminiClient,
    clipboard: &mut dyn Clipboard,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if app.show_help {
        if key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('h')) {
            app.show_help = false;
        }
        return;
    }

    match key.code {
        KeyCode::Char('c') if ctrl => {
            if app.exit_pending {
                app.quit();
            } else {
                app.exit_pending = true;
            }
            return;
        }
        KeyCode::Esc if app.exit_pending => {
            app.exit_pending = false;
            return;
        }
        // Any other key cancels pending exit and is processed normally
        _ => app.exit_pending = false,
    }

    match key.code {
        KeyCode::Char('q') if ctrl => app.quit(),
        KeyCode::Char('h') if ctrl => app.toggle_help(),
        KeyCode::Char('y') if ctrl => {
            app.copy_selected_block(clipboard, Instant::now());
        }
        KeyCode::Char('k') if ctrl => app.select_previous_block(),
        KeyCode::Char('j') if ctrl => app.select_next_block(),

        // Navigation keys always scroll history
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Home => app.scroll_to_top(),
        KeyCode::End => app.scroll_to_bottom(),

        _ => {
            if app.input.on_key_press(key.code, key.modifiers) == KeyOutcome::Submit {
                send_message(app, client, event_tx);
            }
        }
    }
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    client: &GeminiClient,
    clipboard: &mut dyn Clipboard,
    event_tx: &mpsc::UnboundedSender<AppEvent>,
    event_rx: &mut mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        let now = Instant::now();
        app.tick(now, now.duration_since(last_tick));
        last_tick = now;

        terminal.draw(|f| ui::render(f, app, now))?;

        // Apply finished requests before reading keys
        while let Ok(app_event) = event_rx.try_recv() {
            app.handle_app_event(app_event);
        }

        if event::poll(Duration::from_millis(16))? {
            // ~60fps keeps the particles smooth
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_keyboard_input(app, key, client, clipboard, event_tx);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
