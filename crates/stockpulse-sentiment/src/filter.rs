//! Pre-LLM content filtering.
//!
//! Every item rejected here saves part of an LLM request, so the rules are
//! deliberately cheap: an upvote floor, a flair skip list, a ticker-shape
//! scan against a stoplist, and low-effort heuristics for comments. The
//! filter is pure — same item in, same decision out — and classifies
//! without touching anything.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use stockpulse_core::{ContentItem, ContentKind};

/// Uppercase tokens that look like tickers but are conversation, not
/// symbols. Merged from common English words, forum slang and finance
/// abbreviations; real one-letter tickers ("F") lose to their word reading
/// here and come back only through an explicit `$F` cashtag.
const STOPLIST: &[&str] = &[
    "I", "A", "IT", "IS", "OF", "OR", "SO", "DO", "GO", "TO", "BE", "WE", "HE", "ME", "US", "UP", "AT",
    "BY", "IN", "ON", "NO", "MY", "AM", "AN", "AS", "IF", "THE", "AND", "FOR", "ARE", "BUT",
    "NOT", "YOU", "ALL", "CAN", "HER", "ONE", "OUR", "OUT", "DAY", "GET", "GOT", "HAD", "HAS",
    "HIM", "HIS", "HOW", "WAS", "ITS", "MAY", "NEW", "NOW", "OLD", "SEE", "TWO", "WAY", "WHO",
    "WHY", "BOY", "DID", "LET", "PUT", "SAY", "SHE", "TOO", "USE", "WON", "YES", "YET", "WILL",
    "YEAR", "WEEK", "TIME", "JUST", "LIKE", "MAKE", "TAKE", "LOOK", "KNOW", "WANT", "NEED",
    "GOOD", "MUCH", "MORE", "VERY", "WELL", "ALSO", "BACK", "DOWN", "EVEN", "BEEN", "FROM",
    "HERE", "ONLY", "OVER", "THAN", "THEN", "THEM", "THEY", "THIS", "THAT", "WHAT", "WHEN",
    "WITH", "YOUR", "HAVE", "INTO", "SOME", "SAID", "EACH", "COME", "MADE", "MOST", "LONG",
    "DOES", "SUCH", "BOTH", "MANY", "MUST", "CALL", "NEXT", "EVER", "ONCE", "THINK", "YOLO",
    "FOMO", "LMAO", "IMO", "TBH", "IDK", "AMA", "ELI", "TIL", "PSA", "EDIT", "TLDR", "NSFW",
    "CEO", "CFO", "IPO", "ETF", "USD", "USA", "SEC", "FDA", "ATH", "ATL", "EOD", "AH", "PM",
    "DD", "TA", "FA", "FD", "WSB", "OP", "LOL", "WTF", "FYI", "ASAP", "BTW",
];

/// Flair fragments marking screenshot/meme posts with no analyzable text.
const SKIP_FLAIRS: &[&str] = &["gain", "loss", "gain/loss", "gains", "losses", "meme"];

/// Exact low-effort phrases (after trim/lowercase/punctuation strip) that
/// mark a comment as noise.
const LOW_EFFORT_PHRASES: &[&str] = &[
    "yolo",
    "to the moon",
    "moon",
    "lambo",
    "wen lambo",
    "diamond hands",
    "paper hands",
    "hodl",
    "stonks",
    "tendies",
    "this is the way",
    "buy the dip",
    "lol",
    "lmao",
    "omg",
    "wow",
    "same",
    "agreed",
    "agree",
    "nice",
    "this",
    "+1",
];

/// Minimum characters for a comment to be worth a request.
const MIN_COMMENT_CHARS: usize = 40;

/// Why an item was kept or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    Accepted,
    /// Upvote score below the configured floor.
    LowScore,
    /// Gain/Loss/Meme flair.
    MemeFlair,
    /// Nothing in the text looks like a ticker symbol.
    NoTickerCandidate,
    /// Comment shorter than the minimum length.
    TooShort,
    /// Pure emoji/punctuation, ≤2 tokens, or an exact low-effort phrase.
    LowEffort,
}

/// The filter's verdict for one item. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDecision {
    pub keep: bool,
    pub reason: FilterReason,
}

impl FilterDecision {
    fn keep() -> Self {
        Self {
            keep: true,
            reason: FilterReason::Accepted,
        }
    }

    fn reject(reason: FilterReason) -> Self {
        Self {
            keep: false,
            reason,
        }
    }
}

/// Per-reason rejection counts for one filtering pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterStats {
    pub total: usize,
    pub kept: usize,
    pub low_score: usize,
    pub meme_flair: usize,
    pub no_candidate: usize,
    pub too_short: usize,
    pub low_effort: usize,
}

impl FilterStats {
    pub fn record(&mut self, decision: FilterDecision) {
        self.total += 1;
        match decision.reason {
            FilterReason::Accepted => self.kept += 1,
            FilterReason::LowScore => self.low_score += 1,
            FilterReason::MemeFlair => self.meme_flair += 1,
            FilterReason::NoTickerCandidate => self.no_candidate += 1,
            FilterReason::TooShort => self.too_short += 1,
            FilterReason::LowEffort => self.low_effort += 1,
        }
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.total - self.kept
    }
}

/// Decide whether `item` is worth sending to the LLM.
///
/// Rejection order: score floor, flair skip list, comment quality, ticker
/// candidate scan. Pure and order-independent — the same item always gets
/// the same decision.
#[must_use]
pub fn should_process(item: &ContentItem, min_score: i64) -> FilterDecision {
    if item.score < min_score {
        return FilterDecision::reject(FilterReason::LowScore);
    }

    if let Some(flair) = &item.flair {
        let flair = flair.to_lowercase();
        if SKIP_FLAIRS.iter().any(|skip| flair.contains(skip)) {
            return FilterDecision::reject(FilterReason::MemeFlair);
        }
    }

    if item.kind == ContentKind::Comment {
        if let Some(reason) = comment_quality_reject(&item.body) {
            return FilterDecision::reject(reason);
        }
    }

    if !has_ticker_candidate(&item.text()) {
        return FilterDecision::reject(FilterReason::NoTickerCandidate);
    }

    FilterDecision::keep()
}

/// True when the text contains at least one ticker-shaped token: a `$`
/// cashtag, or an uppercase 1–5 letter word outside the stoplist.
fn has_ticker_candidate(text: &str) -> bool {
    if text.len() < 10 {
        return false;
    }

    static CASHTAG_RE: OnceLock<Regex> = OnceLock::new();
    static CANDIDATE_RE: OnceLock<Regex> = OnceLock::new();
    static STOPSET: OnceLock<HashSet<&'static str>> = OnceLock::new();

    let cashtag = CASHTAG_RE.get_or_init(|| Regex::new(r"\$[A-Z]{1,5}\b").expect("static regex"));
    if text.contains('$') && cashtag.is_match(text) {
        return true;
    }

    let candidate =
        CANDIDATE_RE.get_or_init(|| Regex::new(r"\b[A-Z]{1,5}\b").expect("static regex"));
    let stopset = STOPSET.get_or_init(|| STOPLIST.iter().copied().collect());

    candidate
        .find_iter(text)
        .any(|token| !stopset.contains(token.as_str()))
}

/// Low-effort checks that apply only to comments.
fn comment_quality_reject(body: &str) -> Option<FilterReason> {
    let trimmed = body.trim();
    if trimmed.len() < MIN_COMMENT_CHARS {
        // Everything below the length floor is also checked for the more
        // specific noise reasons so the stats say why.
        let normalized = normalize_phrase(trimmed);

        if normalized.is_empty() || is_pure_fs(&normalized) {
            return Some(FilterReason::LowEffort);
        }
        if LOW_EFFORT_PHRASES.contains(&normalized.as_str()) {
            return Some(FilterReason::LowEffort);
        }
        if trimmed.split_whitespace().count() <= 2 {
            return Some(FilterReason::LowEffort);
        }
        return Some(FilterReason::TooShort);
    }

    if !trimmed.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Some(FilterReason::LowEffort);
    }

    None
}

/// Lowercase and strip non-alphanumeric edges for exact phrase matching.
fn normalize_phrase(text: &str) -> String {
    text.to_lowercase()
        .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '+')
        .to_string()
}

/// "f", "ff", "ffff" — paying respects, not discussing Ford.
fn is_pure_fs(normalized: &str) -> bool {
    !normalized.is_empty() && normalized.chars().all(|c| c == 'f')
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn post(score: i64, title: &str, body: &str, flair: Option<&str>) -> ContentItem {
        ContentItem {
            id: "p1".to_string(),
            subreddit: "stocks".to_string(),
            title: Some(title.to_string()),
            body: body.to_string(),
            score,
            flair: flair.map(str::to_string),
            kind: ContentKind::Post,
            created_utc: Utc::now(),
        }
    }

    fn comment(score: i64, body: &str) -> ContentItem {
        ContentItem {
            id: "c1".to_string(),
            subreddit: "stocks".to_string(),
            title: None,
            body: body.to_string(),
            score,
            flair: None,
            kind: ContentKind::Comment,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn low_score_rejects_regardless_of_body() {
        let item = post(3, "NVDA $AAPL TSLA all going up", "so many tickers here", None);
        let decision = should_process(&item, 10);
        assert!(!decision.keep);
        assert_eq!(decision.reason, FilterReason::LowScore);
    }

    #[test]
    fn score_at_threshold_is_kept() {
        let item = post(10, "Thoughts on NVDA before earnings?", "long thesis inside", None);
        assert!(should_process(&item, 10).keep);
    }

    #[test]
    fn gain_loss_and_meme_flairs_are_skipped() {
        for flair in ["Gain", "LOSS", "Gain/Loss", "Meme", "gains"] {
            let item = post(100, "Look at my NVDA position", "screenshot", Some(flair));
            let decision = should_process(&item, 10);
            assert!(!decision.keep, "flair {flair} should reject");
            assert_eq!(decision.reason, FilterReason::MemeFlair);
        }
    }

    #[test]
    fn text_without_ticker_shapes_is_rejected() {
        let item = post(50, "what should i do with my savings", "looking for general advice", None);
        let decision = should_process(&item, 10);
        assert!(!decision.keep);
        assert_eq!(decision.reason, FilterReason::NoTickerCandidate);
    }

    #[test]
    fn stoplist_words_are_not_candidates() {
        let item = post(50, "THE CEO SAID THIS IS FOR ALL OF YOU", "DD IMO TLDR", None);
        let decision = should_process(&item, 10);
        assert_eq!(decision.reason, FilterReason::NoTickerCandidate);
    }

    #[test]
    fn cashtag_beats_the_stoplist() {
        // "F" alone reads as a word; "$F" is unambiguous.
        let item = post(50, "loading up on $F before the dividend", "ford thesis", None);
        assert!(should_process(&item, 10).keep);
    }

    #[test]
    fn short_comments_are_rejected() {
        let decision = should_process(&comment(80, "good point about the margins"), 10);
        assert!(!decision.keep);
        assert_eq!(decision.reason, FilterReason::TooShort);
    }

    #[test]
    fn low_effort_phrases_are_rejected_as_such() {
        for body in ["yolo", "to the moon", "f", "FFFF", "nice", "this", "+1", "🚀🚀🚀"] {
            let decision = should_process(&comment(80, body), 10);
            assert!(!decision.keep, "{body:?} should reject");
            assert_eq!(decision.reason, FilterReason::LowEffort, "{body:?}");
        }
    }

    #[test]
    fn substantive_comment_is_kept() {
        let body = "Their Q3 revenue grew 40% and AAPL still trades below the sector P/E.";
        assert!(should_process(&comment(25, body), 10).keep);
    }

    #[test]
    fn filtering_is_deterministic() {
        let item = post(50, "NVDA earnings tomorrow", "expecting a beat", None);
        let first = should_process(&item, 10);
        for _ in 0..10 {
            assert_eq!(should_process(&item, 10), first);
        }
    }

    #[test]
    fn stats_bucket_by_reason() {
        let items = vec![
            post(1, "NVDA", "low score", None),
            post(50, "Look at this gain", "flaired", Some("Gain")),
            post(50, "NVDA earnings thread", "discussion inside", None),
            comment(50, "lol"),
        ];
        let mut stats = FilterStats::default();
        for item in &items {
            stats.record(should_process(item, 10));
        }
        assert_eq!(stats.total, 4);
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.low_score, 1);
        assert_eq!(stats.meme_flair, 1);
        assert_eq!(stats.low_effort, 1);
        assert_eq!(stats.rejected(), 3);
    }
}
