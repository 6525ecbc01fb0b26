use crate::{error::Error, Result};
use chrono::{Datelike, NaiveDate};
use derive_deref::Deref;
use polars::prelude::*;
use std::{collections::BTreeMap, path::Path};

#[derive(Clone, Deref)]
pub struct ScheduleDf(DataFrame);

impl ScheduleDf {
    pub fn new(df: DataFrame) -> Self {
        ScheduleDf(df)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let df = crate::load_parquet(path)?;
        Ok(ScheduleDf(df))
    }

    /// Maps every scheduled game to its ISO year-week id, one row per `game_id`
    pub fn week_ids(&self) -> Result<DataFrame> {
        log::trace!("schedule::week_ids");
        let game_ids = self.column("game_id")?.cast(&DataType::String)?;
        let game_dates = self.column("game_date")?.cast(&DataType::String)?;

        let mut weeks: BTreeMap<String, i32> = BTreeMap::new();
        for (game_id, game_date) in game_ids.str()?.into_iter().zip(game_dates.str()?) {
            let Some(game_id) = game_id else {
                continue;
            };
            let week = match game_date.and_then(parse_game_date) {
                Some(date) => week_id(date),
                None => {
                    return Err(Error::InvalidDate {
                        game_id: game_id.to_string(),
                        value: game_date.map(str::to_string),
                    })
                }
            };

            match weeks.get(game_id) {
                Some(&existing) if existing != week => {
                    log::warn!("game {} scheduled in weeks {} and {}, keeping {}", game_id, existing, week, existing);
                }
                Some(_) => {}
                None => {
                    weeks.insert(game_id.to_string(), week);
                }
            }
        }

        let (game_ids, week_ids): (Vec<String>, Vec<i32>) = weeks.into_iter().unzip();
        let df = df!("game_id" => game_ids, "week_id" => week_ids)?;
        log::debug!("{} scheduled games with a week id", df.height());
        Ok(df)
    }
}

/// ISO year * 100 + ISO week, so 2021-01-01 lands in 202053
pub fn week_id(date: NaiveDate) -> i32 {
    let week = date.iso_week();
    week.year() * 100 + week.week() as i32
}

// Accepts plain dates and anything with a leading `YYYY-MM-DD` (datetimes cast to strings)
fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date = raw.get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_id_follows_iso_boundaries() {
        assert_eq!(week_id(date(2024, 1, 1)), 202401);
        assert_eq!(week_id(date(2024, 1, 14)), 202402);
        assert_eq!(week_id(date(2024, 1, 15)), 202403);
        // Friday before the first Thursday belongs to the previous ISO year
        assert_eq!(week_id(date(2021, 1, 1)), 202053);
        // Monday of the week holding 2025's first Thursday
        assert_eq!(week_id(date(2024, 12, 30)), 202501);
    }

    #[test]
    fn parses_dates_and_datetimes() {
        assert_eq!(parse_game_date("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_game_date("2024-03-05 19:30:00.000"), Some(date(2024, 3, 5)));
        assert_eq!(parse_game_date("03/05/2024"), None);
        assert_eq!(parse_game_date("2024"), None);
    }

    #[test]
    fn week_ids_dedupes_games() {
        let schedule = ScheduleDf::new(
            df!(
                "game_id" => ["g2", "g1", "g2"],
                "game_date" => ["2024-01-15", "2024-01-14", "2024-01-15"]
            )
            .unwrap(),
        );
        let weeks = schedule.week_ids().unwrap();
        assert_eq!(weeks.height(), 2);

        let ids: Vec<_> = weeks.column("game_id").unwrap().str().unwrap().into_no_null_iter().collect();
        let week_ids: Vec<_> = weeks.column("week_id").unwrap().i32().unwrap().into_no_null_iter().collect();
        assert_eq!(ids, ["g1", "g2"]);
        assert_eq!(week_ids, [202402, 202403]);
    }

    fn days_since_epoch(date: NaiveDate) -> i64 {
        (date - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()).num_days()
    }

    fn week_ids_of(game_date: Series) -> Vec<i32> {
        let game_ids = Series::new("game_id", ["g1", "g2"]);
        let schedule = ScheduleDf::new(DataFrame::new(vec![game_ids, game_date]).unwrap());
        let weeks = schedule.week_ids().unwrap();
        weeks.column("week_id").unwrap().i32().unwrap().into_no_null_iter().collect()
    }

    #[test]
    fn week_ids_from_date_column() {
        let days: Vec<i32> = [date(2024, 1, 14), date(2024, 1, 15)]
            .into_iter()
            .map(|d| days_since_epoch(d) as i32)
            .collect();
        let game_date = Series::new("game_date", days).cast(&DataType::Date).unwrap();
        assert_eq!(week_ids_of(game_date), [202402, 202403]);
    }

    #[test]
    fn week_ids_from_timestamp_column() {
        // Sunday and Monday evenings, stored as microsecond timestamps
        let evening = (19 * 3600 + 30 * 60) * 1_000_000i64;
        let micros: Vec<i64> = [date(2024, 1, 14), date(2024, 1, 15)]
            .into_iter()
            .map(|d| days_since_epoch(d) * 86_400 * 1_000_000 + evening)
            .collect();
        let game_date = Series::new("game_date", micros)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
            .unwrap();
        assert_eq!(week_ids_of(game_date), [202402, 202403]);
    }

    #[test]
    fn week_ids_rejects_bad_dates() {
        let schedule = ScheduleDf::new(df!("game_id" => ["g1"], "game_date" => ["soon"]).unwrap());
        match schedule.week_ids() {
            Err(Error::InvalidDate { game_id, value }) => {
                assert_eq!(game_id, "g1");
                assert_eq!(value.as_deref(), Some("soon"));
            }
            other => panic!("expected InvalidDate, got {:?}", other.map(|df| df.height())),
        }
    }
}
