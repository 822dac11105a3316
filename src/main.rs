use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};
use time_humanize::HumanTime;
use tracing_subscriber::{prelude::*, EnvFilter};

use wpm::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    error::WpmError,
    game::{Game, GameSettings},
    quotes::{LengthFilter, QuoteSource, Quotes},
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    stats::{StatsDb, Summary, UNSPECIFIED_KEYBOARD},
};

/// Smallest terminal the race screen is usable in.
const MIN_COLS: u16 = 51;
const MIN_ROWS: u16 = 12;

/// typing speed trainer that races you against famous quotes
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Measures your typing speed and accuracy on well-known quotes and keeps a history of every race, per keyboard."
)]
pub struct Cli {
    /// tag races with the keyboard you are typing on
    #[clap(short = 'k', long)]
    keyboard: Option<String>,

    /// start with the quote that has this id
    #[clap(short = 'i', long)]
    id: Option<u32>,

    /// number of spaces one press of tab stands for
    #[clap(short = 't', long)]
    tabs: Option<usize>,

    /// only use short quotes
    #[clap(long, conflicts_with = "long")]
    short: bool,

    /// only use long quotes
    #[clap(long)]
    long: bool,

    /// load quotes from a JSON file instead of the built-in collection
    #[clap(long, value_name = "FILE")]
    load_json: Option<PathBuf>,

    /// print a summary of past races and exit
    #[clap(long)]
    stats: bool,

    /// write every past race to a CSV file and exit
    #[clap(long, value_name = "FILE")]
    export_csv: Option<PathBuf>,

    /// use this race history database
    #[clap(long, value_name = "FILE")]
    stats_file: Option<PathBuf>,
}

impl Cli {
    fn length_filter(&self) -> LengthFilter {
        if self.short {
            LengthFilter::Short
        } else if self.long {
            LengthFilter::Long
        } else {
            LengthFilter::Any
        }
    }

    /// Command-line flags win over the config file.
    fn settings(&self, config: &Config) -> GameSettings {
        GameSettings {
            keyboard: self.keyboard.clone().or_else(|| config.keyboard.clone()),
            tab_spaces: self.tabs.or(config.tab_spaces),
            average_window: config.average_window.max(1),
        }
    }

    fn open_stats(&self) -> Result<StatsDb, WpmError> {
        match &self.stats_file {
            Some(path) => StatsDb::open(path),
            None => StatsDb::open_default(),
        }
    }

    fn load_quotes(&self) -> Result<Quotes, WpmError> {
        let quotes = match &self.load_json {
            Some(path) => Quotes::load_json(path)?,
            None => Quotes::embedded()?,
        };
        quotes.filter(self.length_filter())
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wpm=info"));

    // stdout belongs to the terminal UI, so logs only ever go to the file
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .try_init();
}

fn format_summary(summary: &Summary) -> String {
    let since = (Local::now() - summary.last_race).num_seconds();
    format!(
        "{}\n  races     {}\n  average   {:.1} wpm (best {:.1}, std dev {:.1})\n  accuracy  {:.1}%\n  last race {}",
        summary.keyboard.as_deref().unwrap_or(UNSPECIFIED_KEYBOARD),
        summary.races,
        summary.average_wpm,
        summary.best_wpm,
        summary.std_dev_wpm,
        100.0 * summary.average_accuracy,
        HumanTime::from_seconds(-since),
    )
}

fn print_stats(db: &StatsDb) -> Result<(), WpmError> {
    let summaries: Vec<Summary> = db
        .keyboards()?
        .iter()
        .map(|keyboard| db.summary(keyboard.as_deref()))
        .filter_map_ok(|summary| summary)
        .collect::<Result<_, _>>()?;

    if summaries.is_empty() {
        println!("No races recorded yet.");
    } else {
        println!("{}", summaries.iter().map(format_summary).join("\n\n"));
    }
    Ok(())
}

fn export_csv(db: &StatsDb, path: &Path) -> Result<(), WpmError> {
    let rows = db.export_csv(File::create(path)?)?;
    println!("Exported {rows} races to {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config = FileConfigStore::new().load();
    let stats = cli.open_stats()?;

    if cli.stats {
        print_stats(&stats)?;
        return Ok(());
    }
    if let Some(path) = &cli.export_csv {
        export_csv(&stats, path)?;
        return Ok(());
    }

    let mut quotes = cli.load_quotes()?.random_iterator();
    if let Some(id) = cli.id {
        quotes.put_to_front(id)?;
    }
    tracing::info!(
        database = quotes.database(),
        quotes = quotes.count(),
        "loaded quotes"
    );

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let (cols, rows) = terminal::size()?;
    if cols < MIN_COLS || rows < MIN_ROWS {
        return Err(WpmError::TerminalTooSmall {
            cols,
            rows,
            min_cols: MIN_COLS,
            min_rows: MIN_ROWS,
        }
        .into());
    }

    let mut game = Game::new(quotes, stats, cli.settings(&config));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(
        CrosstermEventSource,
        FixedTicker::new(config.poll_timeout()),
    );
    let outcome = runner.run(
        &mut terminal,
        &mut game,
        &config.theme,
        config.max_quote_width,
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &outcome {
        tracing::error!(%err, "race loop failed");
    }
    Ok(outcome?)
}
