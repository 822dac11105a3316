use std::time::Instant;

use crate::key::Key;
use crate::quotes::Quote;

/// Highest speed ever reported, avoids absurd spikes right after the start.
pub const MAX_WPM: f64 = 999.0;
pub const MAX_CPS: f64 = 99.0;
/// Standard word length used to turn characters into words.
pub const CHARS_PER_WORD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Typing { started: Instant },
    Finished { started: Instant, stopped: Instant },
}

/// What a keystroke did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Ignored,
    /// The first keystroke of a race started the clock.
    Started,
    Typed,
    Erased,
    /// The last character of the quote was typed.
    Finished,
    /// The race was abandoned and the session is fresh again.
    Reset,
    /// Cancel pressed with no race running.
    Quit,
}

/// Final numbers of a completed race.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceResult {
    pub wpm: f64,
    pub accuracy: f64,
    pub elapsed: f64,
}

/// One attempt at typing one quote.
#[derive(Debug, Clone)]
pub struct Session {
    phase: Phase,
    position: usize,
    incorrect: usize,
    total_incorrect: usize,
    edit: String,
    tab_spaces: Option<usize>,
}

impl Session {
    pub fn new(tab_spaces: Option<usize>) -> Self {
        Self {
            phase: Phase::NotStarted,
            position: 0,
            incorrect: 0,
            total_incorrect: 0,
            edit: String::new(),
            tab_spaces,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.tab_spaces);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Characters typed correctly so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Wrong keystrokes since the last correct one that still need erasing.
    pub fn incorrect(&self) -> usize {
        self.incorrect
    }

    /// Every wrong keystroke of the race, erased or not.
    pub fn total_incorrect(&self) -> usize {
        self.total_incorrect
    }

    /// Text typed since the last completed word.
    pub fn edit_buffer(&self) -> &str {
        &self.edit
    }

    pub fn has_started(&self) -> bool {
        !matches!(self.phase, Phase::NotStarted)
    }

    pub fn is_typing(&self) -> bool {
        matches!(self.phase, Phase::Typing { .. })
    }

    pub fn has_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. })
    }

    /// Feeds one keystroke into the session.
    ///
    /// Navigation and resize keys are the controller's business and are
    /// ignored here, as is anything unrecognised.
    pub fn handle_key(&mut self, quote: &Quote, key: Key, now: Instant) -> Transition {
        match key {
            Key::Quit => Transition::Quit,
            Key::Cancel => {
                if self.has_started() {
                    self.reset();
                    Transition::Reset
                } else {
                    Transition::Quit
                }
            }
            Key::Backspace => self.backspace(),
            Key::Enter => self.type_char(quote, '\n', now),
            Key::Tab => match self.tab_spaces {
                Some(spaces) => {
                    let mut transition = Transition::Ignored;
                    for _ in 0..spaces {
                        match self.type_char(quote, ' ', now) {
                            Transition::Finished => return Transition::Finished,
                            Transition::Ignored => {}
                            step if transition != Transition::Started => transition = step,
                            _ => {}
                        }
                    }
                    transition
                }
                None => self.type_char(quote, '\t', now),
            },
            Key::Char(c) => self.type_char(quote, c, now),
            Key::Left | Key::Right | Key::Resize | Key::Unknown => Transition::Ignored,
        }
    }

    fn backspace(&mut self) -> Transition {
        // a finished race is final, erasing would reopen it
        if self.has_finished() {
            return Transition::Ignored;
        }

        if self.incorrect > 0 {
            self.incorrect -= 1;
            self.edit.pop();
            Transition::Erased
        } else if !self.edit.is_empty() {
            self.position -= 1;
            self.edit.pop();
            Transition::Erased
        } else {
            Transition::Ignored
        }
    }

    fn type_char(&mut self, quote: &Quote, c: char, now: Instant) -> Transition {
        let mut transition = Transition::Typed;

        if self.has_finished() {
            self.reset();
        }

        if let Phase::NotStarted = self.phase {
            self.phase = Phase::Typing { started: now };
            transition = Transition::Started;
        }

        if self.incorrect == 0 && quote.char_at(self.position) == Some(c) {
            self.position += 1;

            // a completed word clears the edit buffer
            if c == ' ' || c == '\n' {
                self.edit.clear();
            } else {
                self.edit.push(c);
            }

            if self.position == quote.len() {
                if let Phase::Typing { started } = self.phase {
                    self.phase = Phase::Finished {
                        started,
                        stopped: now,
                    };
                }
                return Transition::Finished;
            }
        } else if self.position + self.incorrect < quote.len() {
            self.incorrect += 1;
            self.total_incorrect += 1;
            self.edit.push(if c == '\n' { ' ' } else { c });
        } else if transition == Transition::Typed {
            // the quote is fully covered, nowhere left to put an error
            transition = Transition::Ignored;
        }

        transition
    }

    /// Seconds spent on the race so far.
    pub fn elapsed(&self, now: Instant) -> f64 {
        match self.phase {
            Phase::NotStarted => 0.0,
            Phase::Typing { started } => now.saturating_duration_since(started).as_secs_f64(),
            Phase::Finished { started, stopped } => {
                stopped.saturating_duration_since(started).as_secs_f64()
            }
        }
    }

    /// Words per minute, counting five characters as a word.
    pub fn wpm(&self, elapsed: f64) -> f64 {
        let words_per_minute = 60.0 * self.position as f64 / CHARS_PER_WORD;
        self.rate(words_per_minute, elapsed, MAX_WPM)
    }

    /// Characters per second.
    pub fn cps(&self, elapsed: f64) -> f64 {
        self.rate(self.position as f64, elapsed, MAX_CPS)
    }

    fn rate(&self, amount: f64, elapsed: f64, max: f64) -> f64 {
        if !self.has_started() || self.position == 0 {
            return 0.0;
        }
        if elapsed <= 0.0 {
            return max;
        }
        (amount / elapsed).min(max)
    }

    /// Share of keystrokes that were right, in `(0, 1]` once started.
    pub fn accuracy(&self, quote: &Quote) -> f64 {
        if !self.has_started() {
            return 0.0;
        }
        let length = quote.len() as f64;
        length / (length + self.total_incorrect as f64)
    }

    /// The final numbers, available only once the race is finished.
    pub fn result(&self, quote: &Quote) -> Option<RaceResult> {
        if let Phase::Finished { stopped, .. } = self.phase {
            let elapsed = self.elapsed(stopped);
            Some(RaceResult {
                wpm: self.wpm(elapsed),
                accuracy: self.accuracy(quote),
                elapsed,
            })
        } else {
            None
        }
    }
}
