//! HTTP client for the Reddit data API.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use stockpulse_core::{AppConfig, ContentItem, Timeframe};

use crate::error::RedditError;
use crate::listing::{Listing, TokenResponse};

const DEFAULT_AUTH_BASE_URL: &str = "https://www.reddit.com";
const DEFAULT_API_BASE_URL: &str = "https://oauth.reddit.com";

/// Posts per listing page; Reddit caps listings at 100.
const PAGE_LIMIT: usize = 100;
/// Guard against runaway cursor loops.
const MAX_PAGES: usize = 10;

/// Reddit API client holding a valid access token.
pub struct RedditClient {
    client: Client,
    token: String,
    user_agent: String,
    api_base_url: String,
}

impl RedditClient {
    /// Create a client against the production Reddit API by exchanging
    /// client credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`RedditError::Auth`] if the token exchange is rejected, or
    /// [`RedditError::Http`] on transport failure.
    pub async fn connect(config: &AppConfig) -> Result<Self, RedditError> {
        Self::connect_with_base_urls(config, DEFAULT_AUTH_BASE_URL, DEFAULT_API_BASE_URL).await
    }

    /// Create a client against custom auth/API base URLs (for wiremock tests).
    ///
    /// # Errors
    ///
    /// Same as [`RedditClient::connect`].
    pub async fn connect_with_base_urls(
        config: &AppConfig,
        auth_base_url: &str,
        api_base_url: &str,
    ) -> Result<Self, RedditError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let token = Self::fetch_token(
            &client,
            auth_base_url,
            &config.reddit_client_id,
            &config.reddit_client_secret,
            &config.reddit_user_agent,
        )
        .await?;

        Ok(Self {
            client,
            token,
            user_agent: config.reddit_user_agent.clone(),
            api_base_url: api_base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn fetch_token(
        client: &Client,
        auth_base_url: &str,
        client_id: &str,
        client_secret: &str,
        user_agent: &str,
    ) -> Result<String, RedditError> {
        let url = format!("{}/api/v1/access_token", auth_base_url.trim_end_matches('/'));
        let response = client
            .post(&url)
            .header("User-Agent", user_agent)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RedditError::Auth(format!(
                "token exchange failed with status {}",
                response.status()
            )));
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| RedditError::Auth(format!("token parse error: {e}")))?;

        Ok(token.access_token)
    }

    /// Fetch up to `limit` top posts for a subreddit and timeframe, in the
    /// forum's own "top" ordering.
    ///
    /// Follows `after` cursors until `limit` posts are collected or the
    /// listing runs out.
    ///
    /// # Errors
    ///
    /// - [`RedditError::RateLimited`] on 429 — the caller surfaces it, no
    ///   internal retry.
    /// - [`RedditError::Auth`] on 401/403 (expired or revoked token).
    /// - [`RedditError::Http`] / [`RedditError::Deserialize`] otherwise.
    pub async fn fetch_top_posts(
        &self,
        subreddit: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<ContentItem>, RedditError> {
        let mut posts: Vec<ContentItem> = Vec::new();
        let mut after: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let url = format!("{}/r/{subreddit}/top", self.api_base_url);
            let mut params: Vec<(&str, String)> = vec![
                ("t", timeframe.api_param().to_owned()),
                ("limit", PAGE_LIMIT.min(limit).to_string()),
                ("raw_json", "1".to_owned()),
            ];
            if let Some(cursor) = &after {
                params.push(("after", cursor.clone()));
            }

            let context = format!("r/{subreddit}/top");
            let listing: Listing = self.get_json(&url, &params, &context).await?;

            for thing in listing.data.children {
                if let Some(item) = thing.into_post_item() {
                    posts.push(item);
                }
                if posts.len() >= limit {
                    return Ok(posts);
                }
            }

            after = listing.data.after;
            if after.is_none() {
                break;
            }
        }

        tracing::debug!(subreddit, posts = posts.len(), "collected top posts");
        Ok(posts)
    }

    /// Fetch up to `limit` top-level comments for a post, sorted by top.
    ///
    /// Deleted/removed comments and `more` placeholders are dropped; quality
    /// filtering beyond that is the content filter's job.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`RedditClient::fetch_top_posts`].
    pub async fn fetch_top_comments(
        &self,
        subreddit: &str,
        post_id: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>, RedditError> {
        let url = format!("{}/comments/{post_id}", self.api_base_url);
        let params: Vec<(&str, String)> = vec![
            ("sort", "top".to_owned()),
            ("limit", limit.to_string()),
            ("depth", "1".to_owned()),
            ("raw_json", "1".to_owned()),
        ];

        let context = format!("comments/{post_id}");
        // The comments endpoint returns a two-element array:
        // [post listing, comment listing].
        let listings: Vec<Listing> = self.get_json(&url, &params, &context).await?;

        let Some(comment_listing) = listings.into_iter().nth(1) else {
            return Ok(Vec::new());
        };

        Ok(comment_listing
            .data
            .children
            .into_iter()
            .filter_map(|thing| thing.into_comment_item(subreddit))
            .take(limit)
            .collect())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
        context: &str,
    ) -> Result<T, RedditError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", &self.user_agent)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RedditError::Auth(format!(
                "{context} rejected with status {status}"
            )));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(RedditError::RateLimited {
                context: context.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(RedditError::UnexpectedStatus {
                context: context.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| RedditError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}
