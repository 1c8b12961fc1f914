//! Serde shapes for Reddit listing responses and their conversion into
//! domain content items.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use stockpulse_core::{ContentItem, ContentKind};

/// Reddit OAuth token response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
}

/// Listing wrapper: `{"data": {"children": [...], "after": ...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub(crate) data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub(crate) children: Vec<Thing>,
    pub(crate) after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Thing {
    #[serde(default)]
    pub(crate) kind: String,
    pub(crate) data: ThingData,
}

/// Union of the post and comment fields we care about. Reddit uses the same
/// listing envelope for both; `t3` things carry `title`/`selftext`, `t1`
/// things carry `body`.
#[derive(Debug, Deserialize)]
pub(crate) struct ThingData {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) subreddit: String,
    pub(crate) title: Option<String>,
    pub(crate) selftext: Option<String>,
    pub(crate) body: Option<String>,
    #[serde(default)]
    pub(crate) score: i64,
    pub(crate) link_flair_text: Option<String>,
    #[serde(default)]
    pub(crate) created_utc: f64,
}

impl Thing {
    /// Convert a `t3` listing entry into a post item.
    ///
    /// Returns `None` for non-post kinds.
    pub(crate) fn into_post_item(self) -> Option<ContentItem> {
        if self.kind != "t3" {
            return None;
        }
        let d = self.data;
        Some(ContentItem {
            id: d.id,
            subreddit: d.subreddit,
            title: d.title,
            body: d.selftext.unwrap_or_default(),
            score: d.score,
            flair: d.link_flair_text,
            kind: ContentKind::Post,
            created_utc: epoch_to_datetime(d.created_utc),
        })
    }

    /// Convert a `t1` listing entry into a comment item.
    ///
    /// Deleted/removed comments and non-comment kinds (e.g. the `more`
    /// placeholder) are dropped.
    pub(crate) fn into_comment_item(self, subreddit: &str) -> Option<ContentItem> {
        if self.kind != "t1" {
            return None;
        }
        let d = self.data;
        let body = d.body.unwrap_or_default();
        if body.is_empty() || body == "[deleted]" || body == "[removed]" {
            return None;
        }
        Some(ContentItem {
            id: d.id,
            subreddit: subreddit.to_owned(),
            title: None,
            body,
            score: d.score,
            flair: None,
            kind: ContentKind::Comment,
            created_utc: epoch_to_datetime(d.created_utc),
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn epoch_to_datetime(secs: f64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs as i64, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thing(kind: &str, body: serde_json::Value) -> Thing {
        serde_json::from_value(serde_json::json!({ "kind": kind, "data": body })).unwrap()
    }

    #[test]
    fn post_thing_converts_with_flair_and_score() {
        let t = thing(
            "t3",
            serde_json::json!({
                "id": "abc",
                "subreddit": "wallstreetbets",
                "title": "NVDA to the moon",
                "selftext": "earnings next week",
                "score": 512,
                "link_flair_text": "DD",
                "created_utc": 1_700_000_000.0
            }),
        );
        let item = t.into_post_item().expect("t3 converts");
        assert_eq!(item.id, "abc");
        assert_eq!(item.kind, ContentKind::Post);
        assert_eq!(item.score, 512);
        assert_eq!(item.flair.as_deref(), Some("DD"));
        assert_eq!(item.text(), "NVDA to the moon\n\nearnings next week");
    }

    #[test]
    fn comment_thing_converts_with_parent_subreddit() {
        let t = thing(
            "t1",
            serde_json::json!({
                "id": "c9",
                "body": "their balance sheet looks rough",
                "score": 40,
                "created_utc": 1_700_000_100.0
            }),
        );
        let item = t.into_comment_item("stocks").expect("t1 converts");
        assert_eq!(item.subreddit, "stocks");
        assert_eq!(item.kind, ContentKind::Comment);
        assert!(item.title.is_none());
    }

    #[test]
    fn deleted_comments_are_dropped() {
        let t = thing(
            "t1",
            serde_json::json!({ "id": "c1", "body": "[deleted]", "score": 1, "created_utc": 0.0 }),
        );
        assert!(t.into_comment_item("stocks").is_none());
    }

    #[test]
    fn more_placeholder_is_not_a_comment() {
        let t = thing("more", serde_json::json!({ "id": "m1", "created_utc": 0.0 }));
        assert!(t.into_comment_item("stocks").is_none());
    }

    #[test]
    fn non_post_kind_is_not_a_post() {
        let t = thing("t1", serde_json::json!({ "id": "c1", "created_utc": 0.0 }));
        assert!(t.into_post_item().is_none());
    }
}
