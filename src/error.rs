use thiserror::Error;

/// Everything that can go wrong outside the typing engine itself.
#[derive(Debug, Error)]
pub enum WpmError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("statistics database error: {0}")]
    Stats(#[from] rusqlite::Error),

    #[error("invalid quote database: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not export races: {0}")]
    Csv(#[from] csv::Error),

    #[error("quote {id} has no text")]
    EmptyQuote { id: u32 },

    #[error("no quotes available")]
    NoQuotes,

    #[error("no quote with id {0}")]
    UnknownQuote(u32),

    #[error("wpm requires at least {min_cols} columns and {min_rows} lines, terminal is {cols}x{rows}")]
    TerminalTooSmall {
        cols: u16,
        rows: u16,
        min_cols: u16,
        min_rows: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            WpmError::EmptyQuote { id: 7 }.to_string(),
            "quote 7 has no text"
        );
        assert_eq!(WpmError::UnknownQuote(3).to_string(), "no quote with id 3");
        let small = WpmError::TerminalTooSmall {
            cols: 40,
            rows: 10,
            min_cols: 51,
            min_rows: 12,
        };
        assert!(small.to_string().contains("40x10"));
    }

    #[test]
    fn test_from_io_error() {
        let err: WpmError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, WpmError::Io(_)));
    }
}
