//! `report` and `budget` command handlers.

use stockpulse_core::{AppConfig, Timeframe};
use stockpulse_llm::BudgetTracker;

/// Print stored sentiment analyses for a timeframe.
///
/// # Errors
///
/// Returns database errors from connecting or querying.
pub(crate) async fn run_report(
    config: &AppConfig,
    timeframe: Timeframe,
    limit: i64,
) -> anyhow::Result<()> {
    let pool = stockpulse_db::connect_pool(&config.database_url, stockpulse_db::PoolConfig::default())
        .await?;
    stockpulse_db::run_migrations(&pool).await?;

    let rows = stockpulse_db::list_analyses(&pool, timeframe, limit).await?;
    if rows.is_empty() {
        println!("no stored analyses for timeframe '{timeframe}'");
        return Ok(());
    }

    println!(
        "{:<8} {:>9} {:>10} {:>8} {:>4}  {}",
        "ticker", "mentions", "sentiment", "score", "ver", "updated"
    );
    for row in rows {
        println!(
            "{:<8} {:>9} {:>10.3} {:>8.3} {:>4}  {}",
            row.ticker,
            row.total_mentions,
            row.average_sentiment,
            row.sentiment_score,
            row.analysis_version,
            row.updated_at.format("%Y-%m-%d %H:%M"),
        );
    }

    let totals = stockpulse_db::top_mentions(&pool, timeframe, limit).await?;
    if !totals.is_empty() {
        println!();
        println!("cumulative mentions across runs ({timeframe}):");
        for (ticker, total) in totals {
            println!("  {ticker:<8} {total}");
        }
    }

    Ok(())
}

/// Print today's persisted request budget.
///
/// # Errors
///
/// Returns an error if the budget file cannot be opened or written.
pub(crate) async fn run_budget(config: &AppConfig) -> anyhow::Result<()> {
    let budget = BudgetTracker::open(&config.budget_path, config.daily_request_limit)?;
    let snapshot = budget.snapshot().await;
    println!(
        "{}: {}/{} requests used, {} remaining",
        snapshot.date,
        snapshot.used,
        snapshot.limit,
        snapshot.remaining()
    );
    Ok(())
}
