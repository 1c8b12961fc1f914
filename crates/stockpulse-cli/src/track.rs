//! `track` command: fetch, analyze and persist one tracking run.

use anyhow::Context;

use stockpulse_core::{AppConfig, ContentItem, SortKey, Timeframe};
use stockpulse_llm::{default_models, BudgetTracker, OpenRouterClient};
use stockpulse_reddit::RedditClient;
use stockpulse_sentiment::{run_analysis, AnalysisOptions, PipelineDeps, RunReport};
use stockpulse_tickers::TickerStore;

use crate::subreddits::{parse_subreddit_selection, STOCK_SUBREDDITS};

const TICKER_FETCH_TIMEOUT_SECS: u64 = 10;

pub(crate) struct TrackArgs {
    pub timeframe: Timeframe,
    pub selection: Option<String>,
    pub post_limit: usize,
    pub comments_per_post: usize,
    pub max_requests: Option<u32>,
    pub top: usize,
    pub sort_key: SortKey,
    pub dry_run: bool,
}

/// Run a full tracking pass and persist the results.
///
/// # Errors
///
/// Fails fast on missing OpenRouter credentials, an unavailable ticker set
/// (no cache to fall back to), forum auth/rate-limit errors, or database
/// failures. LLM-side failures never surface here — they are absorbed into
/// the report as abandoned/skipped batches.
pub(crate) async fn run_track(config: &AppConfig, args: TrackArgs) -> anyhow::Result<()> {
    let subreddits: Vec<String> = match &args.selection {
        Some(selection) => parse_subreddit_selection(selection, STOCK_SUBREDDITS),
        None => STOCK_SUBREDDITS.iter().map(|s| (*s).to_string()).collect(),
    };
    if subreddits.is_empty() {
        anyhow::bail!("no valid subreddits selected; see `stockpulse list-subreddits`");
    }

    if args.dry_run {
        println!(
            "dry-run: would analyze {} subreddit(s) over the last {}: [{}]",
            subreddits.len(),
            args.timeframe,
            subreddits.join(", ")
        );
        return Ok(());
    }

    let api_key = config
        .openrouter_api_key
        .as_deref()
        .context("OPENROUTER_API_KEY is not set; the track command needs an LLM backend")?;

    let ticker_store = TickerStore::new(&config.ticker_cache_path, TICKER_FETCH_TIMEOUT_SECS)?;
    let tickers = ticker_store.load_or_refresh().await?;
    tracing::info!(symbols = tickers.len(), "ticker set ready");

    let daily_limit = args.max_requests.unwrap_or(config.daily_request_limit);
    let budget = BudgetTracker::open(&config.budget_path, daily_limit)?;
    let starting = budget.snapshot().await;
    println!(
        "budget: {}/{} requests used today",
        starting.used, starting.limit
    );

    let reddit = RedditClient::connect(config).await?;
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
        post_limit: args.post_limit,
        comments_per_post: args.comments_per_post,
        sort_key: args.sort_key,
    };

    let report = run_analysis(deps, &reddit, &subreddits, args.timeframe, &options).await?;

    print_report(&report, args.top);
    persist_report(config, &report, args.timeframe).await?;

    Ok(())
}

fn print_report(report: &RunReport, top: usize) {
    println!();
    println!(
        "analyzed {} of {} items in {} batch(es)",
        report.items_analyzed, report.items_seen, report.batches_total
    );
    println!(
        "filtered out: {} low-score, {} flaired, {} no candidate, {} low-effort/short",
        report.filter_stats.low_score,
        report.filter_stats.meme_flair,
        report.filter_stats.no_candidate,
        report.filter_stats.low_effort + report.filter_stats.too_short,
    );

    if report.records.is_empty() {
        println!("no tickers found");
    } else {
        println!();
        println!(
            "{:<6} {:<8} {:>9} {:>10} {:>8}",
            "rank", "ticker", "mentions", "sentiment", "score"
        );
        for (rank, record) in report.records.iter().take(top).enumerate() {
            println!(
                "{:<6} {:<8} {:>9} {:>10.3} {:>8.3}",
                rank + 1,
                record.ticker,
                record.total_mentions,
                record.average_sentiment,
                record.sentiment_score
            );
        }
    }

    // Partial results are never presented as complete without saying so.
    println!();
    if report.batches_abandoned > 0 || report.batches_skipped > 0 {
        println!(
            "PARTIAL RESULTS: {} batch(es) abandoned after model rotation, {} skipped on budget",
            report.batches_abandoned, report.batches_skipped
        );
    }
    if report.rejected_symbols > 0 {
        println!(
            "dropped {} symbol(s) not in the authoritative ticker set",
            report.rejected_symbols
        );
    }
    println!(
        "budget: {}/{} used, {} remaining",
        report.budget.used,
        report.budget.limit,
        report.budget.remaining()
    );
}

async fn persist_report(
    config: &AppConfig,
    report: &RunReport,
    timeframe: Timeframe,
) -> anyhow::Result<()> {
    if report.records.is_empty() {
        return Ok(());
    }

    let pool = stockpulse_db::connect_pool(&config.database_url, stockpulse_db::PoolConfig::default())
        .await?;
    stockpulse_db::run_migrations(&pool).await?;

    stockpulse_db::save_mentions(&pool, &report.records, timeframe).await?;

    for record in &report.records {
        let version = stockpulse_db::upsert_analysis(&pool, record, timeframe).await?;
        tracing::debug!(ticker = %record.ticker, version, "analysis stored");

        let ticker_items: Vec<ContentItem> = report
            .analyzed_items
            .iter()
            .filter(|item| mentions_symbol(&item.text(), &record.ticker))
            .cloned()
            .collect();
        if !ticker_items.is_empty() {
            stockpulse_db::save_raw_items(&pool, &record.ticker, &ticker_items).await?;
        }
    }

    println!("stored {} analysis record(s)", report.records.len());
    Ok(())
}

/// True when `text` carries `symbol` as a standalone uppercase token or a
/// `$`-prefixed cashtag (any case).
fn mentions_symbol(text: &str, symbol: &str) -> bool {
    let cashtag = format!("${}", symbol.to_lowercase());
    if text.to_lowercase().contains(&cashtag) {
        return true;
    }
    text.split(|c: char| !c.is_ascii_alphanumeric() && c != '.')
        .any(|token| token == symbol)
}
