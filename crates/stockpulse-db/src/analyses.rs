//! Database operations for the `sentiment_analyses` table.
//!
//! One row per `(ticker, timeframe)`. Re-running an analysis upserts the
//! row and bumps `analysis_version` — the version counter belongs to this
//! layer, which is why re-evaluation can be byte-identical in the pipeline
//! and still visibly fresh here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;

use stockpulse_core::{FinalSentimentRecord, SentimentBreakdown, Timeframe};

use crate::DbError;

/// A row from the `sentiment_analyses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SentimentAnalysisRow {
    pub id: i64,
    pub ticker: String,
    pub timeframe: String,
    pub total_mentions: i64,
    pub average_sentiment: f64,
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
    pub sentiment_score: f64,
    pub subreddit_mentions: Json<BTreeMap<String, u64>>,
    pub context_snippets: Json<Vec<String>>,
    pub analysis_version: i64,
    pub updated_at: DateTime<Utc>,
}

impl SentimentAnalysisRow {
    /// Rebuild the domain record this row was stored from.
    #[must_use]
    pub fn into_record(self) -> FinalSentimentRecord {
        FinalSentimentRecord {
            ticker: self.ticker,
            total_mentions: u64::try_from(self.total_mentions).unwrap_or(0),
            subreddit_mentions: self.subreddit_mentions.0,
            average_sentiment: self.average_sentiment,
            breakdown: SentimentBreakdown {
                positive: u64::try_from(self.positive).unwrap_or(0),
                neutral: u64::try_from(self.neutral).unwrap_or(0),
                negative: u64::try_from(self.negative).unwrap_or(0),
            },
            sentiment_score: self.sentiment_score,
            context_snippets: self.context_snippets.0,
        }
    }
}

/// Insert or update the analysis for `(ticker, timeframe)`.
///
/// On conflict every metric is replaced and `analysis_version` increments.
/// Returns the row's version after the write.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_analysis(
    pool: &SqlitePool,
    record: &FinalSentimentRecord,
    timeframe: Timeframe,
) -> Result<i64, DbError> {
    let version: i64 = sqlx::query_scalar(
        "INSERT INTO sentiment_analyses \
             (ticker, timeframe, total_mentions, average_sentiment, \
              positive, neutral, negative, sentiment_score, \
              subreddit_mentions, context_snippets, analysis_version, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11) \
         ON CONFLICT(ticker, timeframe) DO UPDATE SET \
             total_mentions = excluded.total_mentions, \
             average_sentiment = excluded.average_sentiment, \
             positive = excluded.positive, \
             neutral = excluded.neutral, \
             negative = excluded.negative, \
             sentiment_score = excluded.sentiment_score, \
             subreddit_mentions = excluded.subreddit_mentions, \
             context_snippets = excluded.context_snippets, \
             analysis_version = sentiment_analyses.analysis_version + 1, \
             updated_at = excluded.updated_at \
         RETURNING analysis_version",
    )
    .bind(&record.ticker)
    .bind(timeframe.api_param())
    .bind(i64::try_from(record.total_mentions).unwrap_or(i64::MAX))
    .bind(record.average_sentiment)
    .bind(i64::try_from(record.breakdown.positive).unwrap_or(i64::MAX))
    .bind(i64::try_from(record.breakdown.neutral).unwrap_or(i64::MAX))
    .bind(i64::try_from(record.breakdown.negative).unwrap_or(i64::MAX))
    .bind(record.sentiment_score)
    .bind(Json(&record.subreddit_mentions))
    .bind(Json(&record.context_snippets))
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(version)
}

/// Fetch the stored analysis for a ticker/timeframe, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_analysis(
    pool: &SqlitePool,
    ticker: &str,
    timeframe: Timeframe,
) -> Result<Option<SentimentAnalysisRow>, DbError> {
    let row = sqlx::query_as::<_, SentimentAnalysisRow>(
        "SELECT id, ticker, timeframe, total_mentions, average_sentiment, \
                positive, neutral, negative, sentiment_score, \
                subreddit_mentions, context_snippets, analysis_version, updated_at \
         FROM sentiment_analyses \
         WHERE ticker = ?1 AND timeframe = ?2",
    )
    .bind(ticker.to_uppercase())
    .bind(timeframe.api_param())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// List stored analyses for a timeframe, most mentions first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_analyses(
    pool: &SqlitePool,
    timeframe: Timeframe,
    limit: i64,
) -> Result<Vec<SentimentAnalysisRow>, DbError> {
    let rows = sqlx::query_as::<_, SentimentAnalysisRow>(
        "SELECT id, ticker, timeframe, total_mentions, average_sentiment, \
                positive, neutral, negative, sentiment_score, \
                subreddit_mentions, context_snippets, analysis_version, updated_at \
         FROM sentiment_analyses \
         WHERE timeframe = ?1 \
         ORDER BY total_mentions DESC, ticker ASC \
         LIMIT ?2",
    )
    .bind(timeframe.api_param())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
