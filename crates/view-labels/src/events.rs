//! Terminal and index events feeding the interaction loop.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tracing::warn;

use crate::app::Input;

/// Application events
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal key press
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Tick for periodic redraws
    Tick,
    /// The node index changed; carries the new generation
    IndexChanged(u64),
}

/// Event handler that polls for terminal events
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    /// Create the event channel. Nothing is polled until
    /// [`start_polling`](Self::start_polling) is called, so other tasks can
    /// queue events before the terminal is set up.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { rx, tx }
    }

    /// Start polling the terminal every `tick_rate`.
    pub fn start_polling(&self, tick_rate: Duration) {
        let event_tx = self.tx.clone();

        // crossterm polling blocks, so keep it off the async workers.
        tokio::task::spawn_blocking(move || {
            loop {
                let next = match event::poll(tick_rate) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                            Some(AppEvent::Key(key))
                        }
                        Ok(Event::Resize(w, h)) => Some(AppEvent::Resize(w, h)),
                        Ok(_) => None,
                        Err(err) => {
                            warn!(error = %err, "Failed to read terminal event");
                            None
                        }
                    },
                    Ok(false) => Some(AppEvent::Tick),
                    Err(err) => {
                        warn!(error = %err, "Terminal poll failed");
                        break;
                    }
                };
                if let Some(event) = next {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }
        });
    }

    /// Wait for the next event.
    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    /// A sender for injecting events from other tasks.
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Translate a key press into a loop input.
pub fn map_key(key: KeyEvent) -> Option<Input> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(Input::Quit),
        KeyCode::Char('u') if ctrl => Some(Input::ClearQuery),
        KeyCode::Char('w') if ctrl => Some(Input::DeleteWord),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(Input::Char(c)),
        KeyCode::Backspace => Some(Input::Backspace),
        KeyCode::Esc => Some(Input::Quit),
        KeyCode::Left => Some(Input::PrevPage),
        KeyCode::Right => Some(Input::NextPage),
        KeyCode::Home => Some(Input::FirstPage),
        KeyCode::End => Some(Input::LastPage),
        _ => None,
    }
}
