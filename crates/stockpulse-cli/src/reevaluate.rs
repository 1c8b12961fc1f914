//! `reevaluate` command: re-run extraction over stored raw items.

use anyhow::Context;

use stockpulse_core::{AppConfig, Timeframe};
use stockpulse_llm::{default_models, BudgetTracker, OpenRouterClient};
use stockpulse_sentiment::{reevaluate, AnalysisOptions, PipelineDeps};
use stockpulse_tickers::TickerStore;

const TICKER_FETCH_TIMEOUT_SECS: u64 = 10;

/// Re-run the filter → batch → extract → aggregate pass for one ticker
/// using the raw items a previous run stored, then upsert the analysis
/// (which bumps its version).
///
/// # Errors
///
/// Fails when no raw items are stored for the ticker, on missing
/// credentials, or on database errors.
pub(crate) async fn run_reevaluate(
    config: &AppConfig,
    ticker: &str,
    timeframe: Timeframe,
) -> anyhow::Result<()> {
    let ticker = ticker.to_uppercase();

    let pool = stockpulse_db::connect_pool(&config.database_url, stockpulse_db::PoolConfig::default())
        .await?;
    stockpulse_db::run_migrations(&pool).await?;

    let stored_items = stockpulse_db::get_raw_items(&pool, &ticker).await?;
    if stored_items.is_empty() {
        anyhow::bail!("no stored raw items for {ticker}; run `stockpulse track` first");
    }
    println!("re-evaluating {ticker} over {} stored item(s)", stored_items.len());

    if let Some(previous) = stockpulse_db::get_analysis(&pool, &ticker, timeframe).await? {
        println!(
            "previous analysis: v{} with {} mention(s)",
            previous.analysis_version, previous.total_mentions
        );
    }

    let api_key = config
        .openrouter_api_key
        .as_deref()
        .context("OPENROUTER_API_KEY is not set; re-evaluation needs an LLM backend")?;

    let ticker_store = TickerStore::new(&config.ticker_cache_path, TICKER_FETCH_TIMEOUT_SECS)?;
    let tickers = ticker_store.load_or_refresh().await?;

    let budget = BudgetTracker::open(&config.budget_path, config.daily_request_limit)?;
    let backend = OpenRouterClient::new(
        api_key,
        config.llm_request_timeout_secs,
        config.llm_max_output_tokens,
    )?;
    let models = default_models();

    let deps = PipelineDeps {
        backend: &backend,
        budget: &budget,
        models: &models,
        tickers: &tickers,
    };
    let options = AnalysisOptions {
        min_post_score: config.min_post_score,
        max_tokens_per_batch: config.max_tokens_per_batch,
        max_concurrent_batches: config.max_concurrent_batches,
        ..AnalysisOptions::default()
    };

    let record = reevaluate(deps, &ticker, stored_items, &options).await;
    let version = stockpulse_db::upsert_analysis(&pool, &record, timeframe).await?;

    println!();
    println!("{} (analysis v{version})", record.ticker);
    println!("  mentions:  {}", record.total_mentions);
    println!("  sentiment: {:.3} avg, score {:.3}", record.average_sentiment, record.sentiment_score);
    println!(
        "  breakdown: {} positive / {} neutral / {} negative",
        record.breakdown.positive, record.breakdown.neutral, record.breakdown.negative
    );
    for (subreddit, count) in &record.subreddit_mentions {
        println!("  r/{subreddit}: {count}");
    }

    let snapshot = budget.snapshot().await;
    println!(
        "budget: {}/{} used, {} remaining",
        snapshot.used,
        snapshot.limit,
        snapshot.remaining()
    );

    Ok(())
}
