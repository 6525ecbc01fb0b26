use parse_display::{Display, FromStr};
use polars::prelude::*;
use std::path::Path;

pub mod box_score;
pub mod comparator;
mod error;
pub mod filter;
pub mod quality;
pub mod schedule;
pub mod store;

pub use error::Error;
pub use quality::{compute_from_store, compute_game_quality, GameQualityDf, QualityParams};

pub type Result<T> = std::result::Result<T, Error>;

/// Game segment a box score row covers
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Display, FromStr)]
pub enum Period {
    #[display("1")]
    First,
    #[display("2")]
    Second,
    #[display("3")]
    Third,
    #[display("4")]
    Fourth,
    #[display("FullGame")]
    FullGame,
}

pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let mut file = std::fs::File::open(path)?;
    let df = ParquetReader::new(&mut file).finish()?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_matches_stored_labels() {
        assert_eq!("FullGame".parse::<Period>().unwrap(), Period::FullGame);
        assert_eq!("3".parse::<Period>().unwrap(), Period::Third);
        assert_eq!(Period::First.to_string(), "1");
        assert!("OT".parse::<Period>().is_err());
    }
}
