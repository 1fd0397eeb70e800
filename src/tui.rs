// Terminal lifecycle and the background task that turns crossterm input into `TuiEvent`s.
use std::{
    io::stdout,
    ops::{Deref, DerefMut},
    time::Duration,
};

use color_eyre::eyre::Result;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste, EventStream},
    execute,
};
use futures::{FutureExt, StreamExt};
use ratatui::{
    DefaultTerminal,
    crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind},
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TICK_RATE: f64 = 8.0;

#[derive(Clone, Debug)]
pub enum TuiEvent {
    Tick,
    Key(KeyEvent),
    Paste(String),
    Resize(u16, u16),
    Error(String),
}

/// Owns the terminal for the life of the session; restored on `exit` or drop.
pub struct Tui {
    terminal: DefaultTerminal,
    task: Option<JoinHandle<()>>,
    cancellation_token: CancellationToken,
    event_rx: UnboundedReceiver<TuiEvent>,
    event_tx: UnboundedSender<TuiEvent>,
    tick_rate: f64,
    active: bool,
}

impl Tui {
    pub fn new() -> Result<Self> {
        let terminal = ratatui::init();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Ok(Self {
            terminal,
            task: None,
            cancellation_token: CancellationToken::new(),
            event_rx,
            event_tx,
            tick_rate: DEFAULT_TICK_RATE,
            active: true,
        })
    }

    /// Ticks per second. Values at or below zero keep the default.
    pub fn tick_rate(mut self, tick_rate: f64) -> Self {
        if tick_rate > 0.0 {
            self.tick_rate = tick_rate;
        }
        self
    }

    pub fn enter(&mut self) -> Result<()> {
        execute!(stdout(), EnableBracketedPaste)?;
        self.spawn_event_task();
        log::debug!("Terminal session started at {} ticks/s", self.tick_rate);
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.stop();
        execute!(stdout(), DisableBracketedPaste)?;
        ratatui::restore();
        log::info!("Terminal session closed: {}", chrono::Local::now());
        Ok(())
    }

    pub async fn next(&mut self) -> Option<TuiEvent> {
        self.event_rx.recv().await
    }

    fn spawn_event_task(&mut self) {
        self.stop();
        self.cancellation_token = CancellationToken::new();

        let cancel = self.cancellation_token.clone();
        let event_tx = self.event_tx.clone();
        let tick_delay = Duration::from_secs_f64(1.0 / self.tick_rate);

        self.task = Some(tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut ticks = tokio::time::interval(tick_delay);
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticks.tick() => Some(TuiEvent::Tick),
                    input = reader.next().fuse() => match input {
                        Some(Ok(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                            Some(TuiEvent::Key(key))
                        }
                        Some(Ok(CrosstermEvent::Paste(text))) => Some(TuiEvent::Paste(text)),
                        Some(Ok(CrosstermEvent::Resize(w, h))) => Some(TuiEvent::Resize(w, h)),
                        Some(Ok(_)) => None,
                        Some(Err(e)) => Some(TuiEvent::Error(e.to_string())),
                        // Input stream closed.
                        None => break,
                    },
                };

                // The receiver only goes away when the app is shutting down.
                if let Some(event) = event {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }
        }));
    }

    fn stop(&mut self) {
        self.cancellation_token.cancel();
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                task.abort();
            }
        }
    }
}

impl Deref for Tui {
    type Target = DefaultTerminal;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl DerefMut for Tui {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        if let Err(e) = self.exit() {
            log::error!("Failed to restore terminal: {e}");
        }
    }
}
