use crate::domain::MonthPeriod;
use anyhow::Context;
use chrono::{DateTime, Datelike, NaiveDate, Utc};

// Brasília time. No DST since 2019.
const BRT_OFFSET_SECS: i32 = -3 * 3600;

/// Today's date in Brasília.
pub fn today_brt(now_utc: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    let brt = chrono::FixedOffset::east_opt(BRT_OFFSET_SECS).context("invalid BRT offset")?;
    Ok(now_utc.with_timezone(&brt).date_naive())
}

/// Month to report on. Explicit arguments win; a missing part comes from the current
/// Brasília date.
pub fn resolve_month(
    year: Option<i32>,
    month: Option<u32>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<MonthPeriod> {
    let today = today_brt(now_utc)?;
    MonthPeriod::new(
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
    )
}

pub fn resolve_year(year: Option<i32>, now_utc: DateTime<Utc>) -> anyhow::Result<i32> {
    match year {
        Some(y) => Ok(y),
        None => Ok(today_brt(now_utc)?.year()),
    }
}
