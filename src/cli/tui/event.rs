//! Event handling for the navigator

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};

/// Terminal events
#[derive(Debug)]
pub enum Event {
    /// Key press
    Key(KeyEvent),
    /// Terminal resized; the next draw picks up the new size
    Resize,
    /// No input within one tick; used to expire toasts
    Tick,
}

/// Reads terminal events on a background thread
pub struct EventHandler {
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    /// Creates a handler that ticks every `tick_rate_ms` of idle time
    pub fn new(tick_rate_ms: u64) -> Self {
        let tick_rate = Duration::from_millis(tick_rate_ms);
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            let event = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    // Key releases and repeats would double-dispatch
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
                    Ok(CrosstermEvent::Resize(_, _)) => Event::Resize,
                    _ => continue,
                }
            } else {
                Event::Tick
            };

            if tx.send(event).is_err() {
                break;
            }
        });

        Self { rx }
    }

    /// Receives the next event (blocking)
    pub fn next(&self) -> Result<Event> {
        Ok(self.rx.recv()?)
    }
}
