use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event};
use ratatui::{backend::Backend, Terminal};

use crate::config::Theme;
use crate::error::WpmError;
use crate::game::{Game, Tick};
use crate::key::Key;
use crate::quotes::QuoteSource;
use crate::stats::StatsStore;
use crate::ui::View;

/// Source of keystrokes (and resize notifications).
pub trait EventSource {
    /// Waits up to `timeout` for the next key, `Ok(None)` if none arrived.
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<Key>>;
}

/// Production event source, polls crossterm on the calling thread.
#[derive(Debug, Default)]
pub struct CrosstermEventSource;

impl EventSource for CrosstermEventSource {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<Key>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(Some(Key::from(key))),
            Event::Resize(_, _) => Ok(Some(Key::Resize)),
            _ => Ok(None),
        }
    }
}

/// Scripted event source for tests; `None` entries stand for idle polls.
#[derive(Debug, Default)]
pub struct TestEventSource {
    keys: VecDeque<Option<Key>>,
}

impl TestEventSource {
    pub fn new(keys: impl IntoIterator<Item = Option<Key>>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// One key per poll, in order.
    pub fn typing(text: &str) -> Self {
        Self::new(text.chars().map(|c| Some(Key::Char(c))))
    }

    pub fn push(&mut self, key: Option<Key>) {
        self.keys.push_back(key);
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl EventSource for TestEventSource {
    fn poll_key(&mut self, _timeout: Duration) -> io::Result<Option<Key>> {
        Ok(self.keys.pop_front().flatten())
    }
}

/// Configurable ticker interface
pub trait Ticker {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one poll at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn event_source(&self) -> &E {
        &self.event_source
    }

    /// Blocks up to one tick interval for the next key.
    pub fn step(&mut self) -> io::Result<Option<Key>> {
        self.event_source.poll_key(self.ticker.interval())
    }

    /// Draws and feeds the game until it asks to quit.
    pub fn run<B, Q, S>(
        &mut self,
        terminal: &mut Terminal<B>,
        game: &mut Game<Q, S>,
        theme: &Theme,
        max_width: u16,
    ) -> Result<(), WpmError>
    where
        B: Backend,
        Q: QuoteSource,
        S: StatsStore,
    {
        let mut key = None;
        loop {
            let frame = match game.tick(key, Instant::now()) {
                Tick::Quit => return Ok(()),
                Tick::Frame(frame) => frame,
                Tick::StoreFailed { frame, error } => {
                    tracing::error!(%error, "race result was not saved");
                    frame
                }
            };

            terminal.draw(|f| {
                let view = View::new(&frame, theme, max_width);
                let area = f.area();
                f.render_widget(&view, area);
                if let Some(position) = view.cursor(area) {
                    f.set_cursor_position(position);
                }
            })?;

            key = self.step()?;
        }
    }
}
