use polars::error::PolarsError;
use std::io::Error as IoError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Counting stats are never coerced to zero, a null rejects the whole batch
    #[error("Null counting stats in box scores: {}", .0.join(", "))]
    NullStats(Vec<String>),

    #[error("Invalid game date for game {game_id}: {value:?}")]
    InvalidDate { game_id: String, value: Option<String> },
}
