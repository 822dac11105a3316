use ratatui::style::{Color, Style};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;

/// Foreground and background of one kind of screen element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ColorPair {
    pub fg: Color,
    pub bg: Color,
}

impl ColorPair {
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self { fg, bg }
    }
}

impl From<ColorPair> for Style {
    fn from(pair: ColorPair) -> Self {
        Style::default().fg(pair.fg).bg(pair.bg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Theme {
    pub author: ColorPair,
    pub background: Color,
    pub correct: ColorPair,
    pub incorrect: ColorPair,
    pub prompt: ColorPair,
    pub quote: ColorPair,
    pub status: ColorPair,
    pub score_highlight: ColorPair,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            author: ColorPair::new(Color::Cyan, Color::Reset),
            background: Color::Reset,
            correct: ColorPair::new(Color::DarkGray, Color::Reset),
            incorrect: ColorPair::new(Color::White, Color::Red),
            prompt: ColorPair::new(Color::Yellow, Color::Reset),
            quote: ColorPair::new(Color::White, Color::Reset),
            status: ColorPair::new(Color::Black, Color::Cyan),
            score_highlight: ColorPair::new(Color::Black, Color::Yellow),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Spaces typed for one press of tab; `None` leaves tab unmapped.
    pub tab_spaces: Option<usize>,
    /// How long one input poll may wait before the screen is refreshed.
    pub poll_timeout_ms: u64,
    /// Widest the quote may be drawn, 0 means the terminal width.
    pub max_quote_width: u16,
    /// Number of recent races in the rolling average.
    pub average_window: usize,
    pub keyboard: Option<String>,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tab_spaces: None,
            poll_timeout_ms: 100,
            max_quote_width: 0,
            average_window: 10,
            keyboard: None,
            theme: Theme::default(),
        }
    }
}

impl Config {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

/// Read-only source of the user's settings.
pub trait ConfigStore {
    fn load(&self) -> Config;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("wpm_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config")
                }
            }
        }
        Config::default()
    }
}
