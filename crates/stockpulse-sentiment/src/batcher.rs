//! Token-budgeted batching of filtered content.
//!
//! Greedy first-fit over the items in their given order: an item joins the
//! open batch while the running estimate stays under the ceiling, otherwise
//! the batch is sealed and a new one opens. An item too large for an empty
//! batch is truncated to fit and the batch flagged — never dropped.

use stockpulse_core::ContentItem;

/// Rough token estimate: one token per four characters.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

/// A sealed group of item texts bound for one LLM request.
///
/// Fields are private; once `pack` hands a batch out, nothing can grow it
/// past the ceiling it was built under.
#[derive(Debug, Clone)]
pub struct Batch {
    subreddit: String,
    texts: Vec<String>,
    item_ids: Vec<String>,
    estimated_tokens: usize,
    truncated: bool,
}

impl Batch {
    #[must_use]
    pub fn subreddit(&self) -> &str {
        &self.subreddit
    }

    #[must_use]
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Ids of the items in this batch, aligned with `texts`.
    #[must_use]
    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    #[must_use]
    pub fn estimated_tokens(&self) -> usize {
        self.estimated_tokens
    }

    /// True when an oversized item had to be cut down to fit.
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Pack `items` (all from `subreddit`) into batches whose token estimates
/// stay at or under `max_tokens`.
///
/// Input order is preserved within and across batches. Order has no effect
/// on aggregation, but it decides which items share a request — and so
/// share a parse failure.
#[must_use]
pub fn pack(subreddit: &str, items: &[ContentItem], max_tokens: usize) -> Vec<Batch> {
    let mut batches: Vec<Batch> = Vec::new();
    let mut open = new_batch(subreddit);

    for item in items {
        let mut text = item.text();
        let mut cost = estimate_tokens(&text);

        if cost > max_tokens {
            text = truncate_to_tokens(&text, max_tokens);
            cost = estimate_tokens(&text);
            tracing::warn!(
                item = %item.id,
                subreddit,
                estimated_tokens = cost,
                "item exceeds the batch ceiling on its own; body truncated"
            );
            if !open.is_empty() {
                batches.push(std::mem::replace(&mut open, new_batch(subreddit)));
            }
            open.truncated = true;
        } else if open.estimated_tokens + cost > max_tokens && !open.is_empty() {
            batches.push(std::mem::replace(&mut open, new_batch(subreddit)));
        }

        open.estimated_tokens += cost;
        open.texts.push(text);
        open.item_ids.push(item.id.clone());
    }

    if !open.is_empty() {
        batches.push(open);
    }

    batches
}

fn new_batch(subreddit: &str) -> Batch {
    Batch {
        subreddit: subreddit.to_owned(),
        texts: Vec::new(),
        item_ids: Vec::new(),
        estimated_tokens: 0,
        truncated: false,
    }
}

/// Cut `text` down to at most `max_tokens` worth of characters, respecting
/// char boundaries.
fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    let max_bytes = max_tokens * 4;
    if text.len() <= max_bytes {
        return text.to_owned();
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_owned()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use stockpulse_core::ContentKind;

    use super::*;

    fn item(id: &str, body: &str) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            subreddit: "stocks".to_string(),
            title: None,
            body: body.to_string(),
            score: 50,
            flair: None,
            kind: ContentKind::Post,
            created_utc: Utc::now(),
        }
    }

    /// An item whose text estimates to exactly `tokens`.
    fn item_with_tokens(id: &str, tokens: usize) -> ContentItem {
        item(id, &"x".repeat(tokens * 4))
    }

    #[test]
    fn no_batch_exceeds_the_ceiling() {
        let items: Vec<ContentItem> = (0..12)
            .map(|i| item_with_tokens(&format!("p{i}"), 30))
            .collect();
        let batches = pack("stocks", &items, 100);

        assert!(batches.len() > 1);
        for batch in &batches {
            assert!(
                batch.estimated_tokens() <= 100,
                "batch estimate {} exceeds ceiling",
                batch.estimated_tokens()
            );
        }
    }

    #[test]
    fn nothing_is_dropped_and_order_is_preserved() {
        let items: Vec<ContentItem> = (0..7)
            .map(|i| item_with_tokens(&format!("p{i}"), 40))
            .collect();
        let batches = pack("stocks", &items, 100);

        let ids: Vec<&str> = batches
            .iter()
            .flat_map(|b| b.item_ids().iter().map(String::as_str))
            .collect();
        assert_eq!(ids, vec!["p0", "p1", "p2", "p3", "p4", "p5", "p6"]);
    }

    #[test]
    fn oversized_item_is_truncated_and_flagged() {
        let items = vec![item_with_tokens("big", 300)];
        let batches = pack("stocks", &items, 100);

        assert_eq!(batches.len(), 1);
        assert!(batches[0].truncated());
        assert_eq!(batches[0].len(), 1, "the item is kept, not dropped");
        assert!(batches[0].estimated_tokens() <= 100);
    }

    #[test]
    fn oversized_item_does_not_taint_neighbours() {
        let items = vec![
            item_with_tokens("small-1", 20),
            item_with_tokens("big", 500),
            item_with_tokens("small-2", 20),
        ];
        let batches = pack("stocks", &items, 100);

        // The truncated giant fills a batch of its own; the small items on
        // either side land in clean, unflagged batches.
        assert_eq!(batches.len(), 3);
        assert!(!batches[0].truncated());
        assert_eq!(batches[0].item_ids(), ["small-1"]);
        assert!(batches[1].truncated());
        assert_eq!(batches[1].item_ids(), ["big"]);
        assert!(!batches[2].truncated());
        assert_eq!(batches[2].item_ids(), ["small-2"]);
    }

    #[test]
    fn single_small_item_makes_one_batch() {
        let batches = pack("stocks", &[item("p0", "short NVDA take here")], 98_000);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert!(!batches[0].truncated());
    }

    #[test]
    fn empty_input_packs_to_nothing() {
        let batches = pack("stocks", &[], 98_000);
        assert!(batches.is_empty());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // Multi-byte characters at the cut point must not panic.
        let body = "é".repeat(300);
        let batches = pack("stocks", &[item("utf8", &body)], 50);
        assert_eq!(batches.len(), 1);
        assert!(batches[0].truncated());
    }
}
