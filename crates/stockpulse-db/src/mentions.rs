//! Database operations for the `stock_mentions` table.

use chrono::Utc;
use sqlx::SqlitePool;

use stockpulse_core::{FinalSentimentRecord, Timeframe};

use crate::DbError;

/// Insert one mention row per `(ticker, subreddit)` pair in `records`.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn save_mentions(
    pool: &SqlitePool,
    records: &[FinalSentimentRecord],
    timeframe: Timeframe,
) -> Result<u64, DbError> {
    let recorded_at = Utc::now();
    let mut written = 0u64;

    for record in records {
        for (subreddit, count) in &record.subreddit_mentions {
            sqlx::query(
                "INSERT INTO stock_mentions \
                     (ticker, subreddit, mention_count, timeframe, recorded_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&record.ticker)
            .bind(subreddit)
            .bind(i64::try_from(*count).unwrap_or(i64::MAX))
            .bind(timeframe.api_param())
            .bind(recorded_at)
            .execute(pool)
            .await?;
            written += 1;
        }
    }

    Ok(written)
}

/// Top tickers by summed mention count for a timeframe.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn top_mentions(
    pool: &SqlitePool,
    timeframe: Timeframe,
    limit: i64,
) -> Result<Vec<(String, i64)>, DbError> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT ticker, SUM(mention_count) AS total_mentions \
         FROM stock_mentions \
         WHERE timeframe = ?1 \
         GROUP BY ticker \
         ORDER BY total_mentions DESC \
         LIMIT ?2",
    )
    .bind(timeframe.api_param())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
