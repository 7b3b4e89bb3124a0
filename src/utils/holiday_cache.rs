use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::model::holiday::Holiday;

/// year => organization holidays falling in that year
static HOLIDAY_CACHE: Lazy<Cache<i32, Arc<HashSet<NaiveDate>>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(16)
        .time_to_live(Duration::from_secs(6 * 3600)) // 6h TTL
        .build()
});

/// Holiday set for one year, loaded through the cache. A load failure is a
/// calendar-provider failure for the caller to surface, never an empty set.
pub async fn holidays_for_year(pool: &MySqlPool, year: i32) -> Result<Arc<HashSet<NaiveDate>>> {
    HOLIDAY_CACHE
        .try_get_with(year, async move {
            let rows: Vec<Holiday> =
                sqlx::query_as("SELECT id, date, name FROM holidays WHERE YEAR(date) = ?")
                    .bind(year)
                    .fetch_all(pool)
                    .await?;
            Ok::<_, anyhow::Error>(Arc::new(rows.into_iter().map(|h| h.date).collect()))
        })
        .await
        .map_err(|e| anyhow::anyhow!("holiday calendar load failed for {}: {}", year, e))
}

/// Union of the holiday sets for every year a date range touches.
pub async fn holidays_for_range(
    pool: &MySqlPool,
    from_year: i32,
    to_year: i32,
) -> Result<HashSet<NaiveDate>> {
    let mut all = HashSet::new();
    for year in from_year..=to_year {
        let set = holidays_for_year(pool, year).await?;
        all.extend(set.iter().copied());
    }
    Ok(all)
}

/// Stream the whole holiday table once at startup and seed the per-year sets.
pub async fn warmup_holiday_cache(pool: &MySqlPool) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, Holiday>("SELECT id, date, name FROM holidays ORDER BY date")
            .fetch(pool);

    let mut by_year: HashMap<i32, HashSet<NaiveDate>> = HashMap::new();
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let holiday = row?;
        by_year
            .entry(holiday.date.year())
            .or_default()
            .insert(holiday.date);
        total_count += 1;
    }

    let years = by_year.len();
    for (year, set) in by_year {
        HOLIDAY_CACHE.insert(year, Arc::new(set)).await;
    }

    log::info!(
        "Holiday cache warmup complete: {} holidays across {} year(s)",
        total_count,
        years
    );

    Ok(())
}
