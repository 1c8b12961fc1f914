//! Database operations for the `raw_items` table.
//!
//! Stores the filtered content items that contributed to a ticker's
//! analysis so the re-evaluation workflow can re-run extraction without
//! re-fetching from the forum.

use chrono::Utc;
use sqlx::SqlitePool;

use stockpulse_core::ContentItem;

use crate::DbError;

/// Store `items` against `ticker`, skipping duplicates by `(ticker, id)`.
///
/// Returns the number of newly inserted rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if an insert fails.
pub async fn save_raw_items(
    pool: &SqlitePool,
    ticker: &str,
    items: &[ContentItem],
) -> Result<u64, DbError> {
    let ticker = ticker.to_uppercase();
    let stored_at = Utc::now();
    let mut written = 0u64;

    for item in items {
        let payload = match serde_json::to_string(item) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(item = %item.id, error = %e, "raw item serialization failed; skipping");
                continue;
            }
        };

        let result = sqlx::query(
            "INSERT OR IGNORE INTO raw_items (ticker, item_id, payload, stored_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&ticker)
        .bind(&item.id)
        .bind(payload)
        .bind(stored_at)
        .execute(pool)
        .await?;
        written += result.rows_affected();
    }

    Ok(written)
}

/// Load every stored raw item for a ticker, oldest first.
///
/// Rows whose payload no longer parses (e.g. written by an older build) are
/// logged and skipped rather than failing the whole load.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_raw_items(pool: &SqlitePool, ticker: &str) -> Result<Vec<ContentItem>, DbError> {
    let rows: Vec<(i64, String)> = sqlx::query_as(
        "SELECT id, payload FROM raw_items WHERE ticker = ?1 ORDER BY id ASC",
    )
    .bind(ticker.to_uppercase())
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (id, payload) in rows {
        match serde_json::from_str::<ContentItem>(&payload) {
            Ok(item) => items.push(item),
            Err(e) => {
                tracing::warn!(row = id, error = %e, "raw item payload unreadable; skipping");
            }
        }
    }

    Ok(items)
}
