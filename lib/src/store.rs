use crate::{
    box_score::{BoxScoreDf, BoxScoreFilter},
    schedule::ScheduleDf,
    Period, Result,
};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Read-only access to the two tables the engine consumes
pub trait BoxScoreStore {
    fn box_scores(&self, period: Period) -> Result<BoxScoreDf>;
    fn schedule(&self) -> Result<ScheduleDf>;
}

pub struct ParquetStore {
    box_scores: PathBuf,
    schedule: PathBuf,
}

impl ParquetStore {
    pub fn new(box_scores: impl Into<PathBuf>, schedule: impl Into<PathBuf>) -> Self {
        Self {
            box_scores: box_scores.into(),
            schedule: schedule.into(),
        }
    }

    /// Expects `box_scores.parquet` and `schedule.parquet` inside `dir`
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("box_scores.parquet"), dir.join("schedule.parquet"))
    }
}

impl BoxScoreStore for ParquetStore {
    fn box_scores(&self, period: Period) -> Result<BoxScoreDf> {
        log::debug!("Reading box scores from {}", self.box_scores.display());
        let filter = BoxScoreFilter::new().period(period).build();
        BoxScoreDf::load(&self.box_scores)?.filter(filter)
    }

    fn schedule(&self) -> Result<ScheduleDf> {
        log::debug!("Reading schedule from {}", self.schedule.display());
        ScheduleDf::load(&self.schedule)
    }
}

/// Frames already in memory
pub struct FrameStore {
    box_scores: DataFrame,
    schedule: DataFrame,
}

impl FrameStore {
    pub fn new(box_scores: DataFrame, schedule: DataFrame) -> Self {
        Self { box_scores, schedule }
    }
}

impl BoxScoreStore for FrameStore {
    fn box_scores(&self, period: Period) -> Result<BoxScoreDf> {
        let filter = BoxScoreFilter::new().period(period).build();
        BoxScoreDf::new(self.box_scores.clone()).filter(filter)
    }

    fn schedule(&self) -> Result<ScheduleDf> {
        Ok(ScheduleDf::new(self.schedule.clone()))
    }
}
