//! Sentiment analysis pipeline for stockpulse.
//!
//! Filters raw forum content, packs what survives into token-budgeted
//! batches, sends each batch through the LLM rotation, and aggregates the
//! extractions into one sentiment record per ticker. Partial results are
//! first-class: abandoned and budget-skipped batches are counted and
//! reported, never silently dropped.

pub mod aggregator;
pub mod batcher;
pub mod filter;
pub mod pipeline;

pub use aggregator::SentimentAggregator;
pub use batcher::{estimate_tokens, pack, Batch};
pub use filter::{should_process, FilterDecision, FilterReason, FilterStats};
pub use pipeline::{
    analyze_items, reevaluate, run_analysis, AnalysisOptions, PipelineDeps, RunReport,
};
