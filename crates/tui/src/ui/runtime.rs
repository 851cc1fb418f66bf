//! Runtime: event loop and input routing for the TUI.
//!
//! Responsibilities
//! - Own the terminal lifecycle (enter/leave alternate screen, raw mode).
//! - Drive a single event loop over input, ticks, and finished tasks.
//! - Route keys to `App::handle_key` and spawn the returned `Effect`s.
//! - Render via `ui::main::draw` only when something changed.
//!
//! Event Loop Strategy
//! - A dedicated input task polls and reads `crossterm` events on the same
//!   thread and forwards them over a channel.
//! - Smart ticking: fast interval (100 ms) while toasts, loads, or submissions
//!   are in flight; long interval (5 s) when idle.
//! - Background work lives in a `FuturesUnordered<JoinHandle<Msg>>`; each
//!   finished task is fed back through `App::update`.
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{StreamExt, stream::FuturesUnordered};
use hookflow_types::{Effect, Msg};
use ratatui::{Terminal, prelude::*};
use tokio::task::JoinHandle;
use tokio::{
    signal,
    sync::mpsc,
    time::{self, MissedTickBehavior},
};

use crate::app::App;
use crate::cmd;
use crate::ui;

/// Spawn a dedicated input task that polls terminal input and forwards
/// `crossterm` events over a Tokio channel.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(500);

    tokio::task::spawn_blocking(move || {
        let poll_interval = Duration::from_millis(16);
        loop {
            match event::poll(poll_interval) {
                Ok(false) => {
                    if sender.is_closed() {
                        break;
                    }
                }
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if let Err(e) = sender.blocking_send(event) {
                            tracing::warn!("Failed to send event: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read event: {}", e);
                        break;
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to poll events: {}", e);
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| ui::main::draw(frame, app))?;
    Ok(())
}

/// Translate a terminal event into state changes. Returns `None` when the
/// user asked to quit.
fn handle_input_event(app: &mut App, input_event: Event) -> Option<Vec<Effect>> {
    match input_event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
            if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
                return None;
            }
            Some(app.handle_key(key_event))
        }
        Event::Mouse(mouse_event) => {
            match mouse_event.kind {
                event::MouseEventKind::ScrollUp => app.transcript.scroll_up(3),
                event::MouseEventKind::ScrollDown => app.transcript.scroll_down(3),
                _ => {}
            }
            Some(Vec::new())
        }
        Event::Resize(width, height) => Some(app.update(&Msg::Resize(width, height))),
        Event::Paste(text) => {
            let mut effects = Vec::new();
            for character in text.chars().filter(|character| !character.is_control()) {
                effects.extend(app.handle_key(event::KeyEvent::new(KeyCode::Char(character), KeyModifiers::NONE)));
            }
            Some(effects)
        }
        Event::Key(_) | Event::FocusGained | Event::FocusLost => Some(Vec::new()),
    }
}

fn spawn_pending(app: &mut App, effects: Vec<Effect>, pending: &mut FuturesUnordered<JoinHandle<Msg>>) {
    if effects.is_empty() {
        return;
    }
    if pending.is_empty() {
        app.throbber_idx = 0;
    }
    pending.extend(cmd::spawn_effects(app, effects));
    app.executing = true;
}

/// Entry point for the TUI runtime: sets up the terminal, spawns the event
/// producer, runs the async event loop, and performs cleanup on exit.
pub async fn run_app(mut app: App, startup_effects: Vec<Effect>) -> Result<()> {
    let mut input_receiver = spawn_input_thread();
    let mut terminal = setup_terminal()?;

    let mut pending: FuturesUnordered<JoinHandle<Msg>> = FuturesUnordered::new();
    spawn_pending(&mut app, startup_effects, &mut pending);

    // Ticking strategy: fast while animating, very slow when idle.
    let fast_interval = Duration::from_millis(100);
    let idle_interval = Duration::from_millis(5000);
    let mut current_interval = idle_interval;
    let mut ticker = time::interval(current_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    render(&mut terminal, &mut app)?;

    let result = loop {
        let target_interval = if app.needs_animation() { fast_interval } else { idle_interval };
        if target_interval != current_interval {
            current_interval = target_interval;
            ticker = time::interval(current_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        let mut needs_render = false;
        tokio::select! {
            maybe_event = input_receiver.recv() => {
                let Some(event) = maybe_event else {
                    // Input channel closed; shut down cleanly.
                    break Ok(());
                };
                let Some(effects) = handle_input_event(&mut app, event) else {
                    break Ok(());
                };
                spawn_pending(&mut app, effects, &mut pending);
                needs_render = true;
            }

            _ = ticker.tick() => {
                let animating = app.needs_animation();
                let effects = app.update(&Msg::Tick);
                spawn_pending(&mut app, effects, &mut pending);
                needs_render = animating;
            }

            Some(joined) = pending.next(), if !pending.is_empty() => {
                let msg = match joined {
                    Ok(msg) => msg,
                    Err(error) => {
                        tracing::error!("background task failed: {error}");
                        app.toasts.error(format!("Background task failed: {error}"));
                        Msg::Tick
                    }
                };
                let effects = app.update(&msg);
                app.executing = !pending.is_empty();
                spawn_pending(&mut app, effects, &mut pending);
                needs_render = true;
            }

            _ = signal::ctrl_c() => { break Ok(()); }
        }

        if needs_render && let Err(error) = render(&mut terminal, &mut app) {
            break Err(error);
        }
    };

    cleanup_terminal(&mut terminal)?;
    result
}
