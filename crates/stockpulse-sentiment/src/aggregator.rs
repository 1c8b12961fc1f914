//! Per-ticker accumulation of batch extractions.
//!
//! The aggregator exclusively owns the running accumulator map for one
//! analysis run. Counts only ever go up; hallucinated symbols are dropped
//! at the door by checking the authoritative ticker set.

use std::collections::{BTreeMap, HashMap};

use stockpulse_core::{
    sentiment_score, FinalSentimentRecord, SentimentBreakdown, SortKey,
};
use stockpulse_llm::ParsedResponse;
use stockpulse_tickers::TickerSet;

/// Most context snippets retained per ticker.
const MAX_SNIPPETS: usize = 5;

#[derive(Debug, Default)]
struct TickerAccumulator {
    mention_count: u64,
    subreddit_counts: BTreeMap<String, u64>,
    breakdown: SentimentBreakdown,
    /// Running weighted mean of numeric sentiment, weighted by mentions.
    average_sentiment: f64,
    weight: u64,
    context_snippets: Vec<String>,
}

/// Accumulates batch responses into per-ticker sentiment state.
#[derive(Debug, Default)]
pub struct SentimentAggregator {
    accumulators: HashMap<String, TickerAccumulator>,
    rejected_symbols: u64,
    malformed_entries: u64,
}

impl SentimentAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one parsed batch response.
    ///
    /// `subreddit` is the batch's provenance — all of a batch's items come
    /// from one subreddit, so its mention counts attribute there. Symbols
    /// not present in `tickers` are logged and dropped, never merged.
    pub fn merge(&mut self, subreddit: &str, response: &ParsedResponse, tickers: &TickerSet) {
        self.malformed_entries += response.malformed_entries as u64;

        for extraction in &response.extractions {
            if !tickers.contains(&extraction.ticker) {
                tracing::debug!(
                    symbol = %extraction.ticker,
                    subreddit,
                    "dropping symbol not in the authoritative set"
                );
                self.rejected_symbols += 1;
                continue;
            }

            let acc = self.accumulators.entry(extraction.ticker.clone()).or_default();

            acc.mention_count += extraction.mentions;
            *acc.subreddit_counts.entry(subreddit.to_owned()).or_insert(0) +=
                extraction.mentions;
            acc.breakdown.record(extraction.label);

            // Incremental weighted mean; no per-mention list is kept.
            let w = extraction.mentions;
            acc.weight += w;
            #[allow(clippy::cast_precision_loss)]
            let fraction = w as f64 / acc.weight as f64;
            acc.average_sentiment += (extraction.sentiment - acc.average_sentiment) * fraction;

            if let Some(context) = &extraction.context {
                if acc.context_snippets.len() < MAX_SNIPPETS && !context.trim().is_empty() {
                    acc.context_snippets.push(context.trim().to_owned());
                }
            }
        }
    }

    /// Symbols rejected because the validator does not know them.
    #[must_use]
    pub fn rejected_symbols(&self) -> u64 {
        self.rejected_symbols
    }

    /// Entries that were malformed beyond salvage across all responses.
    #[must_use]
    pub fn malformed_entries(&self) -> u64 {
        self.malformed_entries
    }

    /// Number of tickers with at least one merged mention.
    #[must_use]
    pub fn ticker_count(&self) -> usize {
        self.accumulators.len()
    }

    /// Freeze the accumulators into final records, sorted by `sort_key`
    /// (descending; ties broken by ticker for stable output).
    #[must_use]
    pub fn finalize(self, sort_key: SortKey) -> Vec<FinalSentimentRecord> {
        let mut records: Vec<FinalSentimentRecord> = self
            .accumulators
            .into_iter()
            .map(|(ticker, acc)| {
                let score = sentiment_score(acc.breakdown, acc.mention_count);
                FinalSentimentRecord {
                    ticker,
                    total_mentions: acc.mention_count,
                    subreddit_mentions: acc.subreddit_counts,
                    average_sentiment: acc.average_sentiment,
                    breakdown: acc.breakdown,
                    sentiment_score: score,
                    context_snippets: acc.context_snippets,
                }
            })
            .collect();

        records.sort_by(|a, b| {
            let ordering = match sort_key {
                SortKey::Mentions => b.total_mentions.cmp(&a.total_mentions),
                SortKey::SentimentScore => b
                    .sentiment_score
                    .partial_cmp(&a.sentiment_score)
                    .unwrap_or(std::cmp::Ordering::Equal),
            };
            ordering.then_with(|| a.ticker.cmp(&b.ticker))
        });

        records
    }
}
