use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::WpmError;
use crate::session::RaceResult;
use crate::util::{mean, std_dev};

/// Name shown for races recorded without a keyboard.
pub const UNSPECIFIED_KEYBOARD: &str = "Unspecified";

/// One completed race as it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceRecord {
    pub timestamp: DateTime<Local>,
    pub wpm: f64,
    pub accuracy: f64,
    pub quote_id: u32,
    pub database: String,
    pub keyboard: Option<String>,
}

impl RaceRecord {
    pub fn new(
        result: &RaceResult,
        quote_id: u32,
        database: impl Into<String>,
        keyboard: Option<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            wpm: result.wpm,
            accuracy: result.accuracy,
            quote_id,
            database: database.into(),
            keyboard,
        }
    }
}

/// Persists race results and answers questions about past races.
pub trait StatsStore {
    fn add(&mut self, race: &RaceRecord) -> Result<(), WpmError>;

    /// Mean speed of the `last_n` most recent races typed on `keyboard`,
    /// or 0.0 without any history.
    fn average(&self, keyboard: Option<&str>, last_n: usize) -> Result<f64, WpmError>;
}

/// Aggregates for one keyboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub keyboard: Option<String>,
    pub races: usize,
    pub average_wpm: f64,
    pub best_wpm: f64,
    pub std_dev_wpm: f64,
    pub average_accuracy: f64,
    pub last_race: DateTime<Local>,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    timestamp: String,
    wpm: f64,
    accuracy: f64,
    quote_id: u32,
    database: &'a str,
    keyboard: &'a str,
}

/// SQLite-backed race history
#[derive(Debug)]
pub struct StatsDb {
    conn: Connection,
}

impl StatsDb {
    /// Opens (creating if needed) the database in the per-user state directory.
    pub fn open_default() -> Result<Self, WpmError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("wpm_stats.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WpmError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, WpmError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, WpmError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS races (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                wpm REAL NOT NULL,
                accuracy REAL NOT NULL,
                quote_id INTEGER NOT NULL,
                database TEXT NOT NULL,
                keyboard TEXT
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_races_keyboard ON races(keyboard)",
            [],
        )?;

        Ok(StatsDb { conn })
    }

    /// All races, oldest first.
    pub fn all_races(&self) -> Result<Vec<RaceRecord>, WpmError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT timestamp, wpm, accuracy, quote_id, database, keyboard
            FROM races
            ORDER BY id
            "#,
        )?;

        let race_iter = stmt.query_map([], |row| {
            let timestamp_str: String = row.get(0)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(RaceRecord {
                timestamp,
                wpm: row.get(1)?,
                accuracy: row.get(2)?,
                quote_id: row.get(3)?,
                database: row.get(4)?,
                keyboard: row.get(5)?,
            })
        })?;

        let mut races = Vec::new();
        for race in race_iter {
            races.push(race?);
        }

        Ok(races)
    }

    /// Distinct keyboards that have at least one race, unspecified first.
    pub fn keyboards(&self) -> Result<Vec<Option<String>>, WpmError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT keyboard FROM races ORDER BY keyboard")?;
        let keyboards = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<Option<String>>, _>>()?;
        Ok(keyboards)
    }

    pub fn summary(&self, keyboard: Option<&str>) -> Result<Option<Summary>, WpmError> {
        let races: Vec<RaceRecord> = self
            .all_races()?
            .into_iter()
            .filter(|race| race.keyboard.as_deref() == keyboard)
            .collect();

        let Some(last) = races.last() else {
            return Ok(None);
        };

        let speeds: Vec<f64> = races.iter().map(|race| race.wpm).collect();
        let accuracies: Vec<f64> = races.iter().map(|race| race.accuracy).collect();

        Ok(Some(Summary {
            keyboard: keyboard.map(str::to_string),
            races: races.len(),
            average_wpm: mean(&speeds).unwrap_or(0.0),
            best_wpm: speeds.iter().copied().fold(0.0, f64::max),
            std_dev_wpm: std_dev(&speeds).unwrap_or(0.0),
            average_accuracy: mean(&accuracies).unwrap_or(0.0),
            last_race: last.timestamp,
        }))
    }

    /// Writes every race as CSV, returning how many rows were written.
    pub fn export_csv<W: io::Write>(&self, writer: W) -> Result<usize, WpmError> {
        let races = self.all_races()?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        for race in &races {
            csv_writer.serialize(CsvRow {
                timestamp: race.timestamp.to_rfc3339(),
                wpm: race.wpm,
                accuracy: race.accuracy,
                quote_id: race.quote_id,
                database: &race.database,
                keyboard: race.keyboard.as_deref().unwrap_or(""),
            })?;
        }
        csv_writer.flush()?;

        Ok(races.len())
    }
}

impl StatsStore for StatsDb {
    fn add(&mut self, race: &RaceRecord) -> Result<(), WpmError> {
        self.conn.execute(
            r#"
            INSERT INTO races
            (timestamp, wpm, accuracy, quote_id, database, keyboard)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                race.timestamp.to_rfc3339(),
                race.wpm,
                race.accuracy,
                race.quote_id,
                race.database,
                race.keyboard,
            ],
        )?;

        Ok(())
    }

    fn average(&self, keyboard: Option<&str>, last_n: usize) -> Result<f64, WpmError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT wpm FROM races
            WHERE keyboard IS ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;

        let speeds = stmt
            .query_map(params![keyboard, last_n as i64], |row| row.get(0))?
            .collect::<Result<Vec<f64>, _>>()?;

        Ok(mean(&speeds).unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn race(wpm: f64, keyboard: Option<&str>) -> RaceRecord {
        RaceRecord {
            timestamp: Local::now(),
            wpm,
            accuracy: 0.95,
            quote_id: 1,
            database: "default".to_string(),
            keyboard: keyboard.map(str::to_string),
        }
    }

    #[test]
    fn test_average_without_history() {
        let db = StatsDb::open_in_memory().unwrap();
        assert_eq!(db.average(None, 10).unwrap(), 0.0);
        assert_eq!(db.average(Some("model m"), 10).unwrap(), 0.0);
    }

    #[test]
    fn test_average_of_last_n() {
        let mut db = StatsDb::open_in_memory().unwrap();
        for wpm in [10.0, 20.0, 30.0, 40.0] {
            db.add(&race(wpm, None)).unwrap();
        }

        assert_eq!(db.average(None, 10).unwrap(), 25.0);
        assert_eq!(db.average(None, 2).unwrap(), 35.0);
        assert_eq!(db.average(None, 1).unwrap(), 40.0);
    }

    #[test]
    fn test_average_is_per_keyboard() {
        let mut db = StatsDb::open_in_memory().unwrap();
        db.add(&race(50.0, Some("ergodox"))).unwrap();
        db.add(&race(100.0, Some("ergodox"))).unwrap();
        db.add(&race(30.0, Some("laptop"))).unwrap();
        db.add(&race(10.0, None)).unwrap();

        assert_eq!(db.average(Some("ergodox"), 10).unwrap(), 75.0);
        assert_eq!(db.average(Some("laptop"), 10).unwrap(), 30.0);
        assert_eq!(db.average(None, 10).unwrap(), 10.0);
        assert_eq!(db.average(Some("unknown"), 10).unwrap(), 0.0);
    }

    #[test]
    fn test_all_races_round_trip() {
        let mut db = StatsDb::open_in_memory().unwrap();
        let first = race(42.5, Some("ergodox"));
        db.add(&first).unwrap();
        db.add(&race(55.0, None)).unwrap();

        let races = db.all_races().unwrap();
        assert_eq!(races.len(), 2);
        assert_eq!(races[0].wpm, 42.5);
        assert_eq!(races[0].keyboard.as_deref(), Some("ergodox"));
        assert_eq!(races[0].database, "default");
        assert_eq!(races[1].keyboard, None);
    }

    #[test]
    fn test_keyboards() {
        let mut db = StatsDb::open_in_memory().unwrap();
        db.add(&race(1.0, Some("b"))).unwrap();
        db.add(&race(1.0, None)).unwrap();
        db.add(&race(1.0, Some("a"))).unwrap();
        db.add(&race(1.0, Some("a"))).unwrap();

        assert_eq!(
            db.keyboards().unwrap(),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[test]
    fn test_summary() {
        let mut db = StatsDb::open_in_memory().unwrap();
        assert_eq!(db.summary(None).unwrap(), None);

        for wpm in [40.0, 60.0, 80.0] {
            db.add(&race(wpm, Some("kb"))).unwrap();
        }
        db.add(&race(200.0, None)).unwrap();

        let summary = db.summary(Some("kb")).unwrap().unwrap();
        assert_eq!(summary.races, 3);
        assert_eq!(summary.average_wpm, 60.0);
        assert_eq!(summary.best_wpm, 80.0);
        assert!((summary.std_dev_wpm - 16.329931618554522).abs() < 1e-9);
        assert!((summary.average_accuracy - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_export_csv() {
        let mut db = StatsDb::open_in_memory().unwrap();
        db.add(&race(42.0, Some("kb"))).unwrap();
        db.add(&race(43.0, None)).unwrap();

        let mut out = Vec::new();
        assert_eq!(db.export_csv(&mut out).unwrap(), 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "timestamp,wpm,accuracy,quote_id,database,keyboard"
        );
        assert!(lines[1].ends_with(",42.0,0.95,1,default,kb"));
        assert!(lines[2].ends_with(",43.0,0.95,1,default,"));
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.db");

        {
            let mut db = StatsDb::open(&path).unwrap();
            db.add(&race(33.0, None)).unwrap();
        }

        let db = StatsDb::open(&path).unwrap();
        assert_eq!(db.average(None, 10).unwrap(), 33.0);
    }
}
