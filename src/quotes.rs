use include_dir::{include_dir, Dir};
use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::WpmError;

static QUOTES_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/data");

/// Quotes of at most this many characters count as short.
pub const SHORT_QUOTE_MAX: usize = 100;
/// Quotes of at least this many characters count as long.
pub const LONG_QUOTE_MIN: usize = 200;

#[derive(Deserialize, Debug)]
struct QuoteDatabase {
    name: String,
    quotes: Vec<RawQuote>,
}

#[derive(Deserialize, Debug)]
struct RawQuote {
    id: u32,
    text: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    title: String,
}

/// A passage to be typed, immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub id: u32,
    pub text: String,
    pub author: String,
    pub title: String,
    chars: Vec<char>,
}

impl Quote {
    /// Builds a quote, rejecting text that is empty after trimming.
    pub fn new(
        id: u32,
        text: impl Into<String>,
        author: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<Self, WpmError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(WpmError::EmptyQuote { id });
        }

        Ok(Self {
            id,
            chars: text.chars().collect(),
            text,
            author: author.into(),
            title: title.into(),
        })
    }

    /// Number of characters in the quote text.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn char_at(&self, idx: usize) -> Option<char> {
        self.chars.get(idx).copied()
    }
}

impl TryFrom<RawQuote> for Quote {
    type Error = WpmError;

    fn try_from(raw: RawQuote) -> Result<Self, Self::Error> {
        Quote::new(raw.id, raw.text, raw.author, raw.title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthFilter {
    #[default]
    Any,
    Short,
    Long,
}

impl LengthFilter {
    fn accepts(&self, quote: &Quote) -> bool {
        match self {
            LengthFilter::Any => true,
            LengthFilter::Short => quote.len() <= SHORT_QUOTE_MAX,
            LengthFilter::Long => quote.len() >= LONG_QUOTE_MIN,
        }
    }
}

/// A named, non-empty collection of quotes.
#[derive(Debug, Clone)]
pub struct Quotes {
    database: String,
    quotes: Vec<Quote>,
}

impl Quotes {
    pub fn new(database: impl Into<String>, quotes: Vec<Quote>) -> Result<Self, WpmError> {
        if quotes.is_empty() {
            return Err(WpmError::NoQuotes);
        }
        Ok(Self {
            database: database.into(),
            quotes,
        })
    }

    /// The quote database shipped inside the binary.
    pub fn embedded() -> Result<Self, WpmError> {
        let contents = QUOTES_DIR
            .get_file("quotes.json")
            .and_then(|file| file.contents_utf8())
            .ok_or(WpmError::NoQuotes)?;
        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self, WpmError> {
        let db: QuoteDatabase = serde_json::from_str(json)?;
        let quotes = db
            .quotes
            .into_iter()
            .map(Quote::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(db.name, quotes)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, WpmError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn filter(self, filter: LengthFilter) -> Result<Self, WpmError> {
        let quotes = self
            .quotes
            .into_iter()
            .filter(|quote| filter.accepts(quote))
            .collect();
        Self::new(self.database, quotes)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.iter()
    }

    pub fn random_iterator(self) -> RandomIterator {
        RandomIterator::new(self, &mut rand::thread_rng())
    }
}

/// Where the game gets its quotes from.
pub trait QuoteSource {
    fn current(&self) -> &Quote;
    fn next(&mut self) -> &Quote;
    fn previous(&mut self) -> &Quote;
    /// Makes the quote with `id` the current one.
    fn put_to_front(&mut self, id: u32) -> Result<(), WpmError>;
    fn count(&self) -> usize;
    /// Name of the collection, recorded alongside each race.
    fn database(&self) -> &str;
}

/// Walks a collection in a shuffled order, wrapping around at either end.
#[derive(Debug, Clone)]
pub struct RandomIterator {
    quotes: Quotes,
    order: Vec<usize>,
    cursor: usize,
}

impl RandomIterator {
    pub fn new<R: Rng + ?Sized>(quotes: Quotes, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..quotes.len()).collect();
        order.shuffle(rng);
        Self {
            quotes,
            order,
            cursor: 0,
        }
    }

    /// Visits quotes in the order they were loaded.
    pub fn sequential(quotes: Quotes) -> Self {
        let order = (0..quotes.len()).collect();
        Self {
            quotes,
            order,
            cursor: 0,
        }
    }
}

impl QuoteSource for RandomIterator {
    fn current(&self) -> &Quote {
        &self.quotes.quotes[self.order[self.cursor]]
    }

    fn next(&mut self) -> &Quote {
        self.cursor = (self.cursor + 1) % self.order.len();
        self.current()
    }

    fn previous(&mut self) -> &Quote {
        self.cursor = (self.cursor + self.order.len() - 1) % self.order.len();
        self.current()
    }

    fn put_to_front(&mut self, id: u32) -> Result<(), WpmError> {
        let wanted = self
            .quotes
            .quotes
            .iter()
            .position(|quote| quote.id == id)
            .ok_or(WpmError::UnknownQuote(id))?;
        let slot = self
            .order
            .iter()
            .position(|&idx| idx == wanted)
            .ok_or(WpmError::UnknownQuote(id))?;
        self.order.swap(slot, self.cursor);
        Ok(())
    }

    fn count(&self) -> usize {
        self.order.len()
    }

    fn database(&self) -> &str {
        self.quotes.database()
    }
}
