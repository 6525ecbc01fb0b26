//! Round-robin contest between every qualified player game of a week.
//!
//! Each pair is scored over nine categories (1 per category won, 0.5 per tie) and the
//! base row takes the pair only with a strict majority, so identical stat lines split
//! 4.5 to 4.5 and neither side wins.

use crate::Result;
use polars::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Better {
    Higher,
    Lower,
}

#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub column: &'static str,
    pub better: Better,
}

pub const CATEGORIES: [Category; 9] = [
    Category { column: "fg_value", better: Better::Higher },
    Category { column: "ft_value", better: Better::Higher },
    Category { column: "fg3_made", better: Better::Higher },
    Category { column: "points", better: Better::Higher },
    Category { column: "rebounds", better: Better::Higher },
    Category { column: "assists", better: Better::Higher },
    Category { column: "steals", better: Better::Higher },
    Category { column: "blocks", better: Better::Higher },
    Category { column: "turnovers", better: Better::Lower },
];

/// Pair subtotal that must be strictly exceeded to count as a win
pub const MAJORITY: f64 = 4.5;

impl Category {
    fn comp_column(&self) -> String {
        format!("comp_{}", self.column)
    }

    fn win(&self) -> Expr {
        let base = col(self.column);
        let comp = col(&self.comp_column());
        match self.better {
            Better::Higher => base.gt(comp),
            Better::Lower => base.lt(comp),
        }
    }

    fn tie(&self) -> Expr {
        col(self.column).eq(col(&self.comp_column()))
    }

    /// Points the base row earns in this category against one comparison row
    pub fn points(&self) -> Expr {
        self.win().cast(DataType::Float64) + self.tie().cast(DataType::Float64) * lit(0.5)
    }
}

/// Category subtotal for a base row against the `comp_`-prefixed row it is paired with
pub fn pair_points() -> Expr {
    CATEGORIES
        .iter()
        .map(Category::points)
        .reduce(|acc, expr| acc + expr)
        .unwrap_or_else(|| lit(0.0))
}

/// Adds `wins` to every qualified row: the number of same-week rows from other players
/// it beats on a majority of categories. Rows with no opponents get zero.
///
/// Weeks are scored one at a time, so only the largest week's pairs are held in memory.
pub fn pairwise_wins(qualified: &DataFrame) -> Result<DataFrame> {
    log::trace!("comparator::pairwise_wins");
    let weeks = qualified.partition_by_stable(["week_id"], true)?;
    log::debug!("{} week cohorts to compare", weeks.len());

    let mut weeks = weeks.into_iter();
    let Some(first) = weeks.next() else {
        return Ok(cohort_wins(qualified.clone().lazy()).collect()?);
    };

    let mut scored = cohort_wins(first.lazy()).collect()?;
    for week in weeks {
        let week_scored = cohort_wins(week.lazy()).collect()?;
        scored.vstack_mut(&week_scored)?;
    }
    scored.align_chunks();
    Ok(scored)
}

// Self-join on `week_id`, skipping every game of the same player
fn cohort_wins(cohort: LazyFrame) -> LazyFrame {
    let mut base_cols = vec![col("game_id"), col("entity_id"), col("week_id")];
    base_cols.extend(CATEGORIES.iter().map(|c| col(c.column)));

    let mut comp_cols = vec![col("week_id"), col("entity_id").alias("comp_entity_id")];
    comp_cols.extend(CATEGORIES.iter().map(|c| col(c.column).alias(&c.comp_column())));

    let wins = cohort
        .clone()
        .select(base_cols)
        .join(
            cohort.clone().select(comp_cols),
            [col("week_id")],
            [col("week_id")],
            JoinArgs::new(JoinType::Inner),
        )
        .filter(col("entity_id").neq(col("comp_entity_id")))
        .group_by([col("game_id"), col("entity_id")])
        .agg([pair_points()
            .gt(lit(MAJORITY))
            .cast(DataType::Int64)
            .sum()
            .alias("wins")]);

    let keys = [col("game_id"), col("entity_id")];
    cohort
        .join(wins, keys.clone(), keys, JoinArgs::new(JoinType::Left))
        .with_column(col("wins").fill_null(lit(0i64)).cast(DataType::Int64))
}
