use std::time::{Duration, Instant};

use tempfile::tempdir;
use wpm::{
    game::{Game, GameSettings, Mode, Tick},
    key::Key,
    quotes::{LengthFilter, Quote, QuoteSource, Quotes, RandomIterator},
    stats::{StatsDb, StatsStore},
};

fn race<Q: QuoteSource, S: StatsStore>(game: &mut Game<Q, S>, start: Instant, secs: u64) {
    let text: Vec<char> = game.quotes().current().text.chars().collect();
    let (last, head) = text.split_last().unwrap();
    for &c in head {
        game.tick(Some(Key::Char(c)), start);
    }
    let tick = game.tick(Some(Key::Char(*last)), start + Duration::from_secs(secs));
    assert!(matches!(tick, Tick::Frame(_)), "race was not stored: {tick:?}");
    assert_eq!(game.mode(), Mode::Finished);
}

fn quotes() -> RandomIterator {
    RandomIterator::sequential(
        Quotes::new(
            "integration",
            vec![
                Quote::new(1, "one two three", "", "").unwrap(),
                Quote::new(2, "four five", "", "").unwrap(),
            ],
        )
        .unwrap(),
    )
}

#[test]
fn races_persist_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("races.db");
    let settings = GameSettings {
        keyboard: Some("ergodox".into()),
        ..GameSettings::default()
    };

    {
        let mut game = Game::new(quotes(), StatsDb::open(&path).unwrap(), settings.clone());
        let t0 = Instant::now();
        // 13 chars in 6s is 26 wpm
        race(&mut game, t0, 6);
        game.tick(Some(Key::Right), t0);
        // 9 chars in 3s is 36 wpm
        race(&mut game, t0, 3);
        assert!((game.average() - 31.0).abs() < 1e-9);
    }

    let db = StatsDb::open(&path).unwrap();
    assert_eq!(db.all_races().unwrap().len(), 2);
    assert_eq!(db.keyboards().unwrap(), vec![Some("ergodox".to_string())]);

    let summary = db.summary(Some("ergodox")).unwrap().unwrap();
    assert_eq!(summary.races, 2);
    assert!((summary.best_wpm - 36.0).abs() < 1e-9);
    assert!((summary.average_wpm - 31.0).abs() < 1e-9);

    // a fresh game picks the rolling average up from disk
    let game = Game::new(quotes(), db, settings);
    assert!((game.average() - 31.0).abs() < 1e-9);
}

#[test]
fn averages_are_kept_per_keyboard() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("races.db");
    let t0 = Instant::now();

    let mut plain = Game::new(
        quotes(),
        StatsDb::open(&path).unwrap(),
        GameSettings::default(),
    );
    race(&mut plain, t0, 6);
    assert!((plain.average() - 26.0).abs() < 1e-9);

    let mut tagged = Game::new(
        quotes(),
        StatsDb::open(&path).unwrap(),
        GameSettings {
            keyboard: Some("planck".into()),
            ..GameSettings::default()
        },
    );
    assert_eq!(tagged.average(), 0.0);
    race(&mut tagged, t0, 3);
    assert!((tagged.average() - 52.0).abs() < 1e-9);

    let db = StatsDb::open(&path).unwrap();
    assert_eq!(db.average(None, 10).unwrap(), 26.0);
    assert_eq!(db.average(Some("planck"), 10).unwrap(), 52.0);
}

#[test]
fn rolling_average_window() {
    let t0 = Instant::now();
    let mut game = Game::new(
        quotes(),
        StatsDb::open_in_memory().unwrap(),
        GameSettings {
            average_window: 1,
            ..GameSettings::default()
        },
    );

    race(&mut game, t0, 6);
    assert!((game.average() - 26.0).abs() < 1e-9);
    // retyping the same quote faster, only the latest race counts
    race(&mut game, t0, 3);
    assert!((game.average() - 52.0).abs() < 1e-9);
}

#[test]
fn embedded_collection_loads_and_filters() {
    let all = Quotes::embedded().unwrap();
    assert_eq!(all.database(), "default");
    assert!(all.len() >= 20);

    let short = Quotes::embedded().unwrap().filter(LengthFilter::Short).unwrap();
    let long = Quotes::embedded().unwrap().filter(LengthFilter::Long).unwrap();
    assert!(short.iter().all(|quote| quote.len() <= 100));
    assert!(long.iter().all(|quote| quote.len() >= 200));
    assert!(short.len() + long.len() < all.len());

    let mut source = all.random_iterator();
    source.put_to_front(5).unwrap();
    assert_eq!(source.current().text, "All this happened, more or less.");
}
