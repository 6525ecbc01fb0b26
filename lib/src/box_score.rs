use crate::{error::Error, filter::and_filter, quality::QualityParams, schedule::ScheduleDf, Period, Result};
use derive_deref::Deref;
use itertools::Itertools;
use polars::prelude::*;
use std::path::Path;

/// Counting stats every full-game row must carry
pub const STAT_COLUMNS: [&str; 11] = [
    "fg_made",
    "fg_attempted",
    "ft_made",
    "ft_attempted",
    "fg3_made",
    "points",
    "rebounds",
    "assists",
    "steals",
    "blocks",
    "turnovers",
];

const ID_COLUMNS: [&str; 4] = ["game_id", "entity_id", "player_name", "minutes"];

/// Columns of a prepared row, in output order
pub(crate) const PREPARED_COLUMNS: [&str; 16] = [
    "game_id",
    "entity_id",
    "player_name",
    "week_id",
    "minutes_played",
    "fg_pct",
    "ft_pct",
    "fg_value",
    "ft_value",
    "fg3_made",
    "points",
    "rebounds",
    "assists",
    "steals",
    "blocks",
    "turnovers",
];

#[derive(Clone, Deref)]
pub struct BoxScoreDf(DataFrame);

/// Prepared rows split by the minutes threshold
pub struct Eligibility {
    pub qualified: DataFrame,
    pub excluded: DataFrame,
}

impl BoxScoreDf {
    pub fn new(df: DataFrame) -> Self {
        BoxScoreDf(df)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let df = crate::load_parquet(path)?;
        Ok(BoxScoreDf(df))
    }

    pub fn filter(self, filter: Expr) -> Result<Self> {
        let df = self.0.lazy().filter(filter).collect()?;
        Ok(BoxScoreDf(df))
    }

    /// Rejects the batch if a required column is absent or any counting stat is null
    pub fn validate(&self) -> Result<()> {
        let names = self.get_column_names();
        let missing = ID_COLUMNS
            .iter()
            .chain(STAT_COLUMNS.iter())
            .filter(|name| !names.contains(*name))
            .map(|name| name.to_string())
            .collect_vec();
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }

        let mut nulls = Vec::new();
        for name in STAT_COLUMNS {
            let count = self.column(name)?.null_count();
            if count > 0 {
                nulls.push(format!("{} ({} rows)", name, count));
            }
        }
        if !nulls.is_empty() {
            return Err(Error::NullStats(nulls));
        }
        Ok(())
    }

    /// Annotates each row with its week and shooting values, then splits on the minutes threshold
    pub fn split_eligibility(self, schedule: &ScheduleDf, params: &QualityParams) -> Result<Eligibility> {
        log::trace!("box_score::split_eligibility");
        self.validate()?;

        let mut df = self.0;
        let total = df.height();
        let minutes = minutes_played(&df)?;
        df.with_column(minutes)?;

        let weeks = schedule.week_ids()?;
        let join_args = JoinArgs::new(JoinType::Inner);
        let prepared = df
            .lazy()
            .with_columns([
                col("game_id").cast(DataType::String),
                col("entity_id").cast(DataType::String),
                col("player_name").cast(DataType::String),
            ])
            .join(weeks.lazy(), [col("game_id")], [col("game_id")], join_args)
            .with_columns([
                shooting_pct("fg_made", "fg_attempted").alias("fg_pct"),
                shooting_pct("ft_made", "ft_attempted").alias("ft_pct"),
            ])
            .with_columns([
                shooting_value("fg_pct", "fg_attempted", params.fg_baseline).alias("fg_value"),
                shooting_value("ft_pct", "ft_attempted", params.ft_baseline).alias("ft_value"),
            ])
            .with_columns(STAT_COLUMNS.map(|name| col(name).cast(DataType::Int64)))
            .select(PREPARED_COLUMNS.map(col))
            .collect()?;

        if prepared.height() < total {
            log::warn!("{} box score rows have no scheduled game date", total - prepared.height());
        }

        let is_qualified = col("minutes_played").gt_eq(lit(params.min_minutes));
        let qualified = prepared.clone().lazy().filter(is_qualified.clone()).collect()?;
        let excluded = prepared.lazy().filter(is_qualified.not()).collect()?;
        log::debug!(
            "{} qualified and {} excluded player games (min {} minutes)",
            qualified.height(),
            excluded.height(),
            params.min_minutes
        );

        Ok(Eligibility { qualified, excluded })
    }
}

/// Whole minutes from a `MM:SS` clock; missing or malformed values count as zero
pub fn parse_minutes(raw: Option<&str>) -> i64 {
    raw.and_then(|clock| clock.split_once(':'))
        .and_then(|(minutes, _)| minutes.trim().parse().ok())
        .unwrap_or(0)
}

fn minutes_played(df: &DataFrame) -> Result<Series> {
    let minutes = df.column("minutes")?.cast(&DataType::String)?;
    let parsed: Vec<i64> = minutes.str()?.into_iter().map(parse_minutes).collect();
    Ok(Series::new("minutes_played", parsed))
}

// Rounded to 3 places; no attempts means 0 rather than NaN
fn shooting_pct(made: &str, attempted: &str) -> Expr {
    when(col(attempted).gt(lit(0)))
        .then((col(made).cast(DataType::Float64) / col(attempted).cast(DataType::Float64)).round(3))
        .otherwise(lit(0.0))
}

fn shooting_value(pct: &str, attempted: &str, baseline: f64) -> Expr {
    ((col(pct) - lit(baseline)) * col(attempted).cast(DataType::Float64)).round(2)
}

#[derive(Clone)]
pub struct BoxScoreFilter {
    filter_expr: Option<Expr>,
}

impl BoxScoreFilter {
    pub fn new() -> Self {
        Self { filter_expr: None }
    }

    /// Keeps rows for one game segment, matched against the stored label
    pub fn period(mut self, period: Period) -> Self {
        let expr = col("period").cast(DataType::String).eq(lit(period.to_string()));
        self.filter_expr = and_filter(self.filter_expr.take(), expr);
        self
    }

    /// Matches every row when nothing was added
    pub fn build(self) -> Expr {
        self.filter_expr.unwrap_or_else(|| lit(true))
    }
}
