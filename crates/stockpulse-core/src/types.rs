use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reddit listing window used when fetching top posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Day,
    Week,
    Month,
}

impl Timeframe {
    /// Value for the Reddit `t=` listing parameter.
    #[must_use]
    pub fn api_param(self) -> &'static str {
        match self {
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_param())
    }
}

/// Whether a content item is a submission or a comment under one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Comment,
}

/// One post or comment as fetched from the forum. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub subreddit: String,
    /// Present for posts, absent for comments.
    pub title: Option<String>,
    pub body: String,
    /// Upvote score.
    pub score: i64,
    /// Raw link flair, if any. Interpretation (meme/gain/loss skip) belongs
    /// to the content filter.
    pub flair: Option<String>,
    pub kind: ContentKind,
    pub created_utc: DateTime<Utc>,
}

impl ContentItem {
    /// Title and body joined the way the analysis prompt sees them.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => format!("{title}\n\n{}", self.body),
            _ => self.body.clone(),
        }
    }
}

/// Three-way sentiment classification for one extracted mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Classify a numeric sentiment in `[-1, 1]` using the same thresholds
    /// the storage layer uses (±0.05).
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > 0.05 {
            SentimentLabel::Positive
        } else if score < -0.05 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// Counts of positive/neutral/negative classifications for one ticker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl SentimentBreakdown {
    #[must_use]
    pub fn total(self) -> u64 {
        self.positive + self.neutral + self.negative
    }

    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }
}

/// Mention-weighted sentiment score.
///
/// `(positive - negative) / max(1, classified)` gives the net polarity in
/// `[-1, 1]`; `ln(1 + total_mentions)` weights it so one enthusiastic post
/// does not outrank a ticker the whole forum is talking about.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sentiment_score(breakdown: SentimentBreakdown, total_mentions: u64) -> f64 {
    let classified = breakdown.total().max(1) as f64;
    let net = breakdown.positive as f64 - breakdown.negative as f64;
    let base = net / classified;
    let weight = (1.0 + total_mentions as f64).ln();
    base * weight
}

/// Sort order for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Mentions,
    SentimentScore,
}

/// Aggregated per-ticker result emitted at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalSentimentRecord {
    pub ticker: String,
    pub total_mentions: u64,
    /// Per-subreddit mention counts, keyed deterministically.
    pub subreddit_mentions: BTreeMap<String, u64>,
    /// Mean of per-mention numeric sentiment values.
    pub average_sentiment: f64,
    pub breakdown: SentimentBreakdown,
    pub sentiment_score: f64,
    /// Short discussion excerpts the model attached to this ticker, capped
    /// by the aggregator.
    #[serde(default)]
    pub context_snippets: Vec<String>,
}
