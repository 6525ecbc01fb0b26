use crate::Result;
use polars::{prelude::*, sql::SQLContext};

/// Runs `query` against `df` registered as `table`
pub fn filter_sql(df: LazyFrame, table: &str, query: &str) -> Result<LazyFrame> {
    let mut ctx = SQLContext::new();
    ctx.register(table, df);
    let df = ctx.execute(query)?;
    Ok(df)
}

/// ANDs `expr` onto an optional filter
pub(crate) fn and_filter(filter: Option<Expr>, expr: Expr) -> Option<Expr> {
    Some(match filter {
        Some(existing) => existing.and(expr),
        None => expr,
    })
}
