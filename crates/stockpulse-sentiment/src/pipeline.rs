//! Pipeline orchestration: fetch → filter → batch → dispatch → aggregate.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};

use stockpulse_core::{ContentItem, FinalSentimentRecord, SortKey, Timeframe};
use stockpulse_llm::{
    build_extraction_prompt, dispatch_batch, BatchOutcome, BudgetSnapshot, BudgetTracker,
    CompletionBackend, LlmError, ModelDescriptor,
};
use stockpulse_reddit::{RedditClient, RedditError};
use stockpulse_tickers::TickerSet;

use crate::aggregator::SentimentAggregator;
use crate::batcher::pack;
use crate::filter::{should_process, FilterStats};

/// Tunables for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub min_post_score: i64,
    pub max_tokens_per_batch: usize,
    /// Batches in flight at once; `1` means sequential dispatch.
    pub max_concurrent_batches: usize,
    pub post_limit: usize,
    pub comments_per_post: usize,
    pub sort_key: SortKey,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            min_post_score: 10,
            max_tokens_per_batch: 98_000,
            max_concurrent_batches: 3,
            post_limit: 100,
            comments_per_post: 5,
            sort_key: SortKey::Mentions,
        }
    }
}

/// Everything a run needs, threaded explicitly — no global state.
pub struct PipelineDeps<'a, B: CompletionBackend> {
    pub backend: &'a B,
    pub budget: &'a BudgetTracker,
    pub models: &'a [ModelDescriptor],
    pub tickers: &'a TickerSet,
}

impl<B: CompletionBackend> Clone for PipelineDeps<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: CompletionBackend> Copy for PipelineDeps<'_, B> {}

/// Outcome of one analysis run. Partial results are explicit: the report
/// always says how many batches were abandoned or skipped and what is left
/// of the daily budget, so nothing partial masquerades as complete.
#[derive(Debug)]
pub struct RunReport {
    pub records: Vec<FinalSentimentRecord>,
    /// The items that passed the filter, for callers that persist raw
    /// content for later re-evaluation.
    pub analyzed_items: Vec<ContentItem>,
    pub items_seen: usize,
    pub items_analyzed: usize,
    pub filter_stats: FilterStats,
    pub batches_total: usize,
    pub batches_abandoned: usize,
    pub batches_skipped: usize,
    pub rejected_symbols: u64,
    pub malformed_entries: u64,
    pub budget: BudgetSnapshot,
}

/// Run the full pipeline against live forum data.
///
/// Posts and their top comments are fetched sequentially per subreddit in
/// the forum's "top" ordering; comments are only fetched for posts that
/// pass the content filter, since each one costs an API call.
///
/// # Errors
///
/// Returns [`RedditError`] as surfaced by the forum client — auth failures
/// and rate limits are the operator's to resolve, not retried here.
pub async fn run_analysis<B: CompletionBackend>(
    deps: PipelineDeps<'_, B>,
    reddit: &RedditClient,
    subreddits: &[String],
    timeframe: Timeframe,
    options: &AnalysisOptions,
) -> Result<RunReport, RedditError> {
    let mut items: Vec<ContentItem> = Vec::new();

    for subreddit in subreddits {
        let posts = reddit
            .fetch_top_posts(subreddit, timeframe, options.post_limit)
            .await?;
        tracing::info!(subreddit = %subreddit, posts = posts.len(), "fetched top posts");

        for post in posts {
            let keep = should_process(&post, options.min_post_score).keep;
            if keep && options.comments_per_post > 0 {
                let comments = reddit
                    .fetch_top_comments(subreddit, &post.id, options.comments_per_post)
                    .await?;
                items.extend(comments);
            }
            items.push(post);
        }
    }

    Ok(analyze_items(deps, items, options).await)
}

/// Filter, batch, dispatch and aggregate a set of already-fetched items.
///
/// This is the network-free core of [`run_analysis`]; re-evaluation and the
/// tests drive it directly. Batch dispatch runs concurrently up to
/// `max_concurrent_batches`; merging happens after all batches resolve, so
/// accumulator updates are naturally serialized.
pub async fn analyze_items<B: CompletionBackend>(
    deps: PipelineDeps<'_, B>,
    items: Vec<ContentItem>,
    options: &AnalysisOptions,
) -> RunReport {
    let items_seen = items.len();

    // Group by subreddit so each batch carries unambiguous provenance.
    let mut stats = FilterStats::default();
    let mut by_subreddit: BTreeMap<String, Vec<ContentItem>> = BTreeMap::new();
    for item in items {
        let decision = should_process(&item, options.min_post_score);
        stats.record(decision);
        if decision.keep {
            by_subreddit.entry(item.subreddit.clone()).or_default().push(item);
        }
    }
    let items_analyzed = stats.kept;

    let mut batches = Vec::new();
    for (subreddit, subreddit_items) in &by_subreddit {
        batches.extend(pack(
            subreddit,
            subreddit_items,
            options.max_tokens_per_batch,
        ));
    }
    let batches_total = batches.len();
    tracing::info!(
        items_seen,
        items_analyzed,
        batches = batches_total,
        "content filtered and batched"
    );

    let outcomes: Vec<(String, Result<BatchOutcome, LlmError>)> =
        stream::iter(batches.into_iter().map(|batch| async move {
            let prompt = build_extraction_prompt(batch.texts());
            let outcome = dispatch_batch(deps.backend, deps.budget, deps.models, &prompt).await;
            (batch.subreddit().to_owned(), outcome)
        }))
        .buffer_unordered(options.max_concurrent_batches.max(1))
        .collect()
        .await;

    let mut aggregator = SentimentAggregator::new();
    let mut batches_abandoned = 0usize;
    let mut batches_skipped = 0usize;

    for (subreddit, outcome) in outcomes {
        match outcome {
            Ok(BatchOutcome::Parsed { response, .. }) => {
                aggregator.merge(&subreddit, &response, deps.tickers);
            }
            Ok(BatchOutcome::Abandoned { attempts }) => {
                tracing::warn!(
                    subreddit = %subreddit,
                    attempts,
                    "batch abandoned; its items are lost to this run"
                );
                batches_abandoned += 1;
            }
            Ok(BatchOutcome::BudgetExhausted { .. }) => {
                batches_skipped += 1;
            }
            Err(e) => {
                tracing::error!(
                    subreddit = %subreddit,
                    error = %e,
                    "batch dispatch failed; counting as abandoned"
                );
                batches_abandoned += 1;
            }
        }
    }

    if batches_skipped > 0 {
        tracing::warn!(
            batches_skipped,
            "daily budget exhausted; report covers only the dispatched batches"
        );
    }

    let rejected_symbols = aggregator.rejected_symbols();
    let malformed_entries = aggregator.malformed_entries();
    let records = aggregator.finalize(options.sort_key);
    let budget = deps.budget.snapshot().await;
    let analyzed_items: Vec<ContentItem> = by_subreddit.into_values().flatten().collect();

    RunReport {
        records,
        analyzed_items,
        items_seen,
        items_analyzed,
        filter_stats: stats,
        batches_total,
        batches_abandoned,
        batches_skipped,
        rejected_symbols,
        malformed_entries,
        budget,
    }
}

/// Re-run extraction and aggregation over stored raw items for one ticker,
/// without touching the forum.
///
/// Deterministic given a deterministic backend: identical stored items
/// yield an identical record (persistence owns its own version counter).
pub async fn reevaluate<B: CompletionBackend>(
    deps: PipelineDeps<'_, B>,
    ticker: &str,
    stored_items: Vec<ContentItem>,
    options: &AnalysisOptions,
) -> FinalSentimentRecord {
    let ticker = ticker.to_uppercase();
    let report = analyze_items(deps, stored_items, options).await;

    tracing::info!(
        ticker = %ticker,
        batches = report.batches_total,
        abandoned = report.batches_abandoned,
        "re-evaluation pass complete"
    );

    report
        .records
        .into_iter()
        .find(|r| r.ticker == ticker)
        .unwrap_or_else(|| FinalSentimentRecord {
            ticker,
            total_mentions: 0,
            subreddit_mentions: BTreeMap::new(),
            average_sentiment: 0.0,
            breakdown: stockpulse_core::SentimentBreakdown::default(),
            sentiment_score: 0.0,
            context_snippets: Vec::new(),
        })
}
