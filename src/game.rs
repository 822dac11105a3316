use std::time::Instant;

use crate::error::WpmError;
use crate::key::Key;
use crate::quotes::QuoteSource;
use crate::session::{Session, Transition};
use crate::stats::{RaceRecord, StatsStore, UNSPECIFIED_KEYBOARD};

/// Tunables the game is constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    pub keyboard: Option<String>,
    pub tab_spaces: Option<usize>,
    pub average_window: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            keyboard: None,
            tab_spaces: None,
            average_window: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Mode {
    /// Looking at a quote, no race running.
    Browsing,
    Typing,
    /// Looking at the score of the race just completed.
    Finished,
}

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderDescription {
    pub header: String,
    pub mode: Mode,
    pub text: String,
    pub author: String,
    pub title: String,
    pub position: usize,
    pub incorrect: usize,
    pub edit: String,
    pub wpm: f64,
    pub average: f64,
    pub status: Option<String>,
}

#[derive(Debug)]
pub enum Tick {
    Frame(RenderDescription),
    /// The race was recorded in memory but could not be stored.
    StoreFailed {
        frame: RenderDescription,
        error: WpmError,
    },
    Quit,
}

/// Runs races: routes keys to the session, switches quotes and records results.
pub struct Game<Q: QuoteSource, S: StatsStore> {
    quotes: Q,
    stats: S,
    session: Session,
    settings: GameSettings,
    average: f64,
    /// Last failed save, cleared when the next race starts.
    save_error: Option<String>,
    /// Set while the race history cannot be read.
    history_error: Option<String>,
}

impl<Q: QuoteSource, S: StatsStore> Game<Q, S> {
    pub fn new(quotes: Q, stats: S, settings: GameSettings) -> Self {
        let mut game = Self {
            quotes,
            stats,
            session: Session::new(settings.tab_spaces),
            settings,
            average: 0.0,
            save_error: None,
            history_error: None,
        };
        game.refresh_average();
        game
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn quotes(&self) -> &Q {
        &self.quotes
    }

    pub fn stats(&self) -> &S {
        &self.stats
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    pub fn mode(&self) -> Mode {
        if self.session.has_finished() {
            Mode::Finished
        } else if self.session.is_typing() {
            Mode::Typing
        } else {
            Mode::Browsing
        }
    }

    /// Advances the game by one input poll.
    ///
    /// `None` means no key arrived in time; only the clock-driven numbers
    /// change then.
    pub fn tick(&mut self, key: Option<Key>, now: Instant) -> Tick {
        let Some(key) = key else {
            return Tick::Frame(self.describe(now));
        };

        if key == Key::Quit {
            return Tick::Quit;
        }

        if self.mode() != Mode::Typing {
            match key {
                Key::Left => {
                    self.quotes.previous();
                    self.switched_quote();
                    return Tick::Frame(self.describe(now));
                }
                Key::Right | Key::Char(' ') => {
                    self.quotes.next();
                    self.switched_quote();
                    return Tick::Frame(self.describe(now));
                }
                Key::Cancel if self.mode() == Mode::Browsing => return Tick::Quit,
                _ => {}
            }
        }

        match self.session.handle_key(self.quotes.current(), key, now) {
            Transition::Quit => Tick::Quit,
            Transition::Started => {
                self.save_error = None;
                tracing::debug!(quote = self.quotes.current().id, "race started");
                Tick::Frame(self.describe(now))
            }
            Transition::Reset => {
                tracing::debug!(quote = self.quotes.current().id, "race cancelled");
                Tick::Frame(self.describe(now))
            }
            Transition::Finished => match self.commit() {
                Ok(()) => Tick::Frame(self.describe(now)),
                Err(error) => Tick::StoreFailed {
                    frame: self.describe(now),
                    error,
                },
            },
            Transition::Typed | Transition::Erased | Transition::Ignored => {
                Tick::Frame(self.describe(now))
            }
        }
    }

    fn switched_quote(&mut self) {
        self.session.reset();
        tracing::debug!(quote = self.quotes.current().id, "switched quote");
    }

    /// Stores the finished race; the session keeps its result either way.
    fn commit(&mut self) -> Result<(), WpmError> {
        let quote = self.quotes.current();
        let Some(result) = self.session.result(quote) else {
            return Ok(());
        };

        tracing::info!(
            quote = quote.id,
            wpm = result.wpm,
            accuracy = result.accuracy,
            elapsed = result.elapsed,
            "race finished"
        );

        let record = RaceRecord::new(
            &result,
            quote.id,
            self.quotes.database(),
            self.settings.keyboard.clone(),
        );

        if let Err(err) = self.stats.add(&record) {
            tracing::warn!(%err, "could not store race");
            self.save_error = Some(format!("Could not save result: {err}"));
            return Err(err);
        }

        self.refresh_average();
        Ok(())
    }

    /// Reloads the rolling average; on failure the previous value is kept.
    fn refresh_average(&mut self) {
        let keyboard = self.settings.keyboard.as_deref();
        match self.stats.average(keyboard, self.settings.average_window) {
            Ok(average) => {
                self.average = average;
                self.history_error = None;
            }
            Err(err) => {
                if self.history_error.is_none() {
                    tracing::warn!(%err, "could not read race history");
                }
                self.history_error = Some(format!("Could not read race history: {err}"));
            }
        }
    }

    /// The message for the status line, save failures first.
    pub fn status(&self) -> Option<&str> {
        self.save_error
            .as_deref()
            .or(self.history_error.as_deref())
    }

    /// The top status line.
    pub fn header(&self, now: Instant) -> String {
        let elapsed = self.session.elapsed(now);
        format!(
            "{:5.1} wpm {:4.1} cps {:5.2}s {:5.1}% acc {:5.1} avg wpm - {}",
            self.session.wpm(elapsed),
            self.session.cps(elapsed),
            elapsed,
            100.0 * self.session.accuracy(self.quotes.current()),
            self.average,
            self.settings
                .keyboard
                .as_deref()
                .unwrap_or(UNSPECIFIED_KEYBOARD),
        )
    }

    pub fn describe(&self, now: Instant) -> RenderDescription {
        let quote = self.quotes.current();
        RenderDescription {
            header: self.header(now),
            mode: self.mode(),
            text: quote.text.clone(),
            author: quote.author.clone(),
            title: quote.title.clone(),
            position: self.session.position(),
            incorrect: self.session.incorrect(),
            edit: self.session.edit_buffer().to_string(),
            wpm: self.session.wpm(self.session.elapsed(now)),
            average: self.average,
            status: self.status().map(str::to_string),
        }
    }
}
