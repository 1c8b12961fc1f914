//! Tolerant parsing of model output.
//!
//! Models are asked for one JSON object keyed by ticker, but free-tier
//! models wrap it in code fences, truncate it, or interleave prose. The
//! policy is salvage-first: unwrap fences, try a whole-document parse, then
//! fall back to extracting individual well-formed ticker entries with a
//! regex. Only a response that yields zero entries counts as a parse
//! failure and feeds the rotation path.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use stockpulse_core::SentimentLabel;

use crate::error::LlmError;

/// One extracted ticker entry from a model response.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerExtraction {
    pub ticker: String,
    pub mentions: u64,
    /// Average numeric sentiment reported by the model, clamped to [-1, 1].
    pub sentiment: f64,
    pub label: SentimentLabel,
    /// Optional short excerpt of the discussion driving the sentiment.
    pub context: Option<String>,
}

/// All entries salvaged from one response, plus how many candidate entries
/// were malformed beyond repair.
#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    pub extractions: Vec<TickerExtraction>,
    pub malformed_entries: usize,
}

#[derive(Debug, Deserialize)]
struct TickerEntry {
    #[serde(default = "default_mentions")]
    mentions: u64,
    #[serde(default)]
    sentiment: f64,
    label: Option<String>,
    context: Option<String>,
}

fn default_mentions() -> u64 {
    1
}

/// Parse a raw model response into ticker extractions.
///
/// `model` is only used for error context.
///
/// # Errors
///
/// Returns [`LlmError::Parse`] when no ticker entry could be salvaged at
/// all — partial salvage is a success with `malformed_entries > 0`.
pub fn parse_extractions(model: &str, content: &str) -> Result<ParsedResponse, LlmError> {
    let stripped = strip_code_fences(content);

    let mut parsed = match serde_json::from_str::<serde_json::Value>(stripped) {
        Ok(doc) => salvage_from_document(&doc),
        Err(_) => salvage_with_regex(stripped),
    };

    if parsed.extractions.is_empty() {
        return Err(LlmError::Parse {
            model: model.to_owned(),
        });
    }

    for extraction in &mut parsed.extractions {
        extraction.sentiment = extraction.sentiment.clamp(-1.0, 1.0);
    }
    Ok(parsed)
}

/// Unwrap ```json ... ``` or ``` ... ``` fences, returning the inner text.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let rest = &trimmed[start + fence.len()..];
            if let Some(end) = rest.find("```") {
                return rest[..end].trim();
            }
            return rest.trim();
        }
    }
    trimmed
}

/// Pull entries out of a fully parsed document: `{"tickers": {SYM: {...}}}`.
/// Individually malformed entries are counted, not fatal.
fn salvage_from_document(doc: &serde_json::Value) -> ParsedResponse {
    let mut out = ParsedResponse::default();

    let Some(tickers) = doc.get("tickers").and_then(serde_json::Value::as_object) else {
        return out;
    };

    // BTreeMap ordering keeps downstream merging deterministic.
    let ordered: BTreeMap<&String, &serde_json::Value> = tickers.iter().collect();
    for (symbol, value) in ordered {
        match serde_json::from_value::<TickerEntry>(value.clone()) {
            Ok(entry) => out.extractions.push(to_extraction(symbol, &entry)),
            Err(_) => out.malformed_entries += 1,
        }
    }
    out
}

/// Last-resort salvage for truncated or prose-wrapped output: pick up every
/// `"SYM": { ... }` object whose body still parses as JSON.
fn salvage_with_regex(content: &str) -> ParsedResponse {
    static ENTRY_RE: OnceLock<Regex> = OnceLock::new();
    let re = ENTRY_RE
        .get_or_init(|| Regex::new(r#""([A-Z][A-Z.]{0,4})"\s*:\s*(\{[^{}]*\})"#).expect("static regex"));

    let mut out = ParsedResponse::default();
    for caps in re.captures_iter(content) {
        let symbol = &caps[1];
        match serde_json::from_str::<TickerEntry>(&caps[2]) {
            Ok(entry) => out.extractions.push(to_extraction(symbol, &entry)),
            Err(_) => out.malformed_entries += 1,
        }
    }
    out
}

fn to_extraction(symbol: &str, entry: &TickerEntry) -> TickerExtraction {
    let label = entry
        .label
        .as_deref()
        .and_then(parse_label)
        .unwrap_or_else(|| SentimentLabel::from_score(entry.sentiment));
    TickerExtraction {
        ticker: symbol.to_uppercase(),
        mentions: entry.mentions.max(1),
        sentiment: entry.sentiment,
        label,
        context: entry.context.clone(),
    }
}

fn parse_label(raw: &str) -> Option<SentimentLabel> {
    match raw.trim().to_lowercase().as_str() {
        "positive" | "bullish" => Some(SentimentLabel::Positive),
        "neutral" | "mixed" => Some(SentimentLabel::Neutral),
        "negative" | "bearish" => Some(SentimentLabel::Negative),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_clean_document() {
        let content = r#"{"tickers": {"AAPL": {"mentions": 3, "sentiment": 0.7, "label": "positive"},
                                      "TSLA": {"mentions": 5, "sentiment": -0.2}}}"#;
        let parsed = parse_extractions("test-model", content).unwrap();
        assert_eq!(parsed.extractions.len(), 2);
        assert_eq!(parsed.malformed_entries, 0);

        let aapl = &parsed.extractions[0];
        assert_eq!(aapl.ticker, "AAPL");
        assert_eq!(aapl.mentions, 3);
        assert_eq!(aapl.label, SentimentLabel::Positive);

        let tsla = &parsed.extractions[1];
        assert_eq!(tsla.label, SentimentLabel::Negative, "label derives from score");
    }

    #[test]
    fn unwraps_json_code_fences() {
        let content = "Here you go:\n```json\n{\"tickers\": {\"NVDA\": {\"mentions\": 2, \"sentiment\": 0.5}}}\n```";
        let parsed = parse_extractions("test-model", content).unwrap();
        assert_eq!(parsed.extractions.len(), 1);
        assert_eq!(parsed.extractions[0].ticker, "NVDA");
    }

    #[test]
    fn counts_malformed_entries_but_keeps_good_ones() {
        let content = r#"{"tickers": {"AAPL": {"mentions": 3, "sentiment": 0.7},
                                      "GME": {"mentions": "lots", "sentiment": "up"}}}"#;
        let parsed = parse_extractions("test-model", content).unwrap();
        assert_eq!(parsed.extractions.len(), 1);
        assert_eq!(parsed.malformed_entries, 1);
    }

    #[test]
    fn regex_salvage_recovers_from_truncated_output() {
        // Document cut off mid-entry: whole-document parse fails, entry
        // salvage still finds the complete objects.
        let content = r#"{"tickers": {"AAPL": {"mentions": 3, "sentiment": 0.7}, "TSLA": {"mentions": 5, "sent"#;
        let parsed = parse_extractions("test-model", content).unwrap();
        assert_eq!(parsed.extractions.len(), 1);
        assert_eq!(parsed.extractions[0].ticker, "AAPL");
    }

    #[test]
    fn zero_salvage_is_a_parse_error() {
        let result = parse_extractions("test-model", "I could not find any tickers, sorry!");
        assert!(
            matches!(result, Err(LlmError::Parse { ref model }) if model == "test-model"),
            "expected Parse error, got: {result:?}"
        );
    }

    #[test]
    fn sentiment_is_clamped_to_unit_range() {
        let content = r#"{"tickers": {"AAPL": {"mentions": 1, "sentiment": 3.5}}}"#;
        let parsed = parse_extractions("test-model", content).unwrap();
        assert!((parsed.extractions[0].sentiment - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_mentions_defaults_to_one() {
        let content = r#"{"tickers": {"AMD": {"sentiment": 0.2}}}"#;
        let parsed = parse_extractions("test-model", content).unwrap();
        assert_eq!(parsed.extractions[0].mentions, 1);
    }

    #[test]
    fn dotted_share_classes_survive_salvage() {
        let content = r#"{"tickers": {"BRK.B": {"mentions": 2, "sentiment": 0.1}}"#;
        let parsed = parse_extractions("test-model", content).unwrap();
        assert_eq!(parsed.extractions[0].ticker, "BRK.B");
    }
}
