use crate::{
    box_score::{BoxScoreDf, Eligibility, PREPARED_COLUMNS},
    comparator::pairwise_wins,
    filter::and_filter,
    schedule::ScheduleDf,
    store::BoxScoreStore,
    Period, Result,
};
use derive_deref::Deref;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Marks rows that never entered the contest
pub const SENTINEL: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParams {
    pub min_minutes: i64,
    pub fg_baseline: f64,
    pub ft_baseline: f64,
}

impl QualityParams {
    pub fn standard() -> Self {
        Self {
            min_minutes: 15,
            fg_baseline: 0.47,
            ft_baseline: 0.80,
        }
    }
}

impl Default for QualityParams {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Clone, Deref)]
pub struct GameQualityDf(DataFrame);

impl GameQualityDf {
    pub fn into_inner(self) -> DataFrame {
        self.0
    }

    pub fn filter(self, filter: Expr) -> Result<Self> {
        let df = self.0.lazy().filter(filter).collect()?;
        Ok(Self(df))
    }

    /// Best scored games first, skipping zero and sentinel rows
    pub fn leaderboard(self, limit: u32) -> Result<DataFrame> {
        let df = self
            .0
            .lazy()
            .filter(col("game_quality").gt(lit(0.0)))
            .sort(
                ["game_quality", "game_id", "entity_id"],
                SortMultipleOptions::default().with_order_descending_multi([true, false, false]),
            )
            .limit(limit)
            .collect()?;
        Ok(df)
    }
}

/// Scores every full-game box score row against its week cohort
pub fn compute_game_quality(
    box_scores: BoxScoreDf,
    schedule: &ScheduleDf,
    params: &QualityParams,
) -> Result<GameQualityDf> {
    log::trace!("quality::compute_game_quality");
    let Eligibility { qualified, excluded } = box_scores.split_eligibility(schedule, params)?;

    let games_in_week = qualified
        .clone()
        .lazy()
        .group_by([col("week_id")])
        .agg([len().cast(DataType::Int64).alias("games_in_week")]);

    let mut row_cols: Vec<Expr> = PREPARED_COLUMNS.map(col).to_vec();
    row_cols.push(col("wins").cast(DataType::Int64));

    let scored = pairwise_wins(&qualified)?.lazy().select(row_cols.clone());
    let excluded = excluded.lazy().with_column(lit(SENTINEL).alias("wins")).select(row_cols);

    let df = concat([scored, excluded], UnionArgs::default())?
        .join(
            games_in_week,
            [col("week_id")],
            [col("week_id")],
            JoinArgs::new(JoinType::Left),
        )
        .with_column(col("games_in_week").fill_null(lit(0i64)))
        .with_column(game_quality().alias("game_quality"))
        .sort(
            ["wins", "week_id", "game_id", "entity_id"],
            SortMultipleOptions::default().with_order_descending_multi([true, false, false, false]),
        )
        .collect()?;

    log::debug!("{} player games scored", df.height());
    Ok(GameQualityDf(df))
}

/// Pulls full-game rows and the schedule from `store` and scores them
pub fn compute_from_store<S: BoxScoreStore + ?Sized>(store: &S, params: &QualityParams) -> Result<GameQualityDf> {
    let box_scores = store.box_scores(Period::FullGame)?;
    log::info!("Loaded {} full-game box score rows", box_scores.height());
    let schedule = store.schedule()?;
    compute_game_quality(box_scores, &schedule, params)
}

fn game_quality() -> Expr {
    when(col("wins").neq(lit(SENTINEL)))
        .then((col("wins").cast(DataType::Float64) / col("games_in_week").cast(DataType::Float64)).round(4))
        .otherwise(lit(SENTINEL as f64))
}

#[derive(Clone)]
pub struct GameQualityFilter {
    filter_expr: Option<Expr>,
}

impl GameQualityFilter {
    pub fn new() -> Self {
        Self { filter_expr: None }
    }

    /// Keeps one week, e.g. `202403`
    pub fn week(self, week_id: i32) -> Self {
        self.extend(col("week_id").eq(lit(week_id)))
    }

    /// Inclusive on both ends
    pub fn week_range(self, start: i32, end: i32) -> Self {
        self.extend(col("week_id").is_between(lit(start), lit(end), ClosedInterval::Both))
    }

    pub fn game(self, game_id: &str) -> Self {
        self.extend(col("game_id").eq(lit(game_id)))
    }

    pub fn player_id(self, entity_id: &str) -> Self {
        self.extend(col("entity_id").eq(lit(entity_id)))
    }

    pub fn player_name(self, player_name: &str) -> Self {
        self.extend(col("player_name").eq(lit(player_name)))
    }

    /// Drops rows below the minutes threshold
    pub fn qualified_only(self) -> Self {
        self.extend(col("wins").neq(lit(SENTINEL)))
    }

    fn extend(mut self, expr: Expr) -> Self {
        self.filter_expr = and_filter(self.filter_expr.take(), expr);
        self
    }

    /// Matches every row when nothing was added
    pub fn build(self) -> Expr {
        self.filter_expr.unwrap_or_else(|| lit(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_fill_missing_fields_from_standard() {
        let params: QualityParams = serde_json::from_str(r#"{"min_minutes": 20}"#).unwrap();
        assert_eq!(params.min_minutes, 20);
        assert_eq!(params.fg_baseline, 0.47);
        assert_eq!(params.ft_baseline, 0.80);
        assert_eq!(QualityParams::default(), QualityParams::standard());
    }

    #[test]
    fn filter_combines_with_and() {
        let df = df!(
            "week_id" => [202401, 202402, 202403, 202402],
            "player_name" => ["A", "A", "A", "B"],
            "wins" => [3i64, -1, 2, 4]
        )
        .unwrap();
        let filter = GameQualityFilter::new()
            .week_range(202402, 202403)
            .player_name("A")
            .qualified_only()
            .build();
        let filtered = GameQualityDf(df).filter(filter).unwrap();
        assert_eq!(filtered.height(), 1);
        assert_eq!(filtered.column("week_id").unwrap().i32().unwrap().get(0), Some(202403));
    }

    #[test]
    fn filter_by_game_and_player_id() {
        let df = df!(
            "game_id" => ["g1", "g1", "g2"],
            "entity_id" => ["A", "B", "A"]
        )
        .unwrap();
        let filter = GameQualityFilter::new().game("g1").player_id("A").build();
        let filtered = GameQualityDf(df).filter(filter).unwrap();
        assert_eq!(filtered.height(), 1);
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let df = df!("wins" => [1i64, -1]).unwrap();
        let filtered = GameQualityDf(df).filter(GameQualityFilter::new().build()).unwrap();
        assert_eq!(filtered.height(), 2);
    }
}
