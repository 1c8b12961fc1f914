//! Integration tests for `RedditClient` using wiremock HTTP mocks.

use std::path::PathBuf;

use stockpulse_core::{AppConfig, Timeframe};
use stockpulse_reddit::{RedditClient, RedditError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> AppConfig {
    AppConfig {
        reddit_client_id: "test-id".to_string(),
        reddit_client_secret: "test-secret".to_string(),
        reddit_user_agent: "stockpulse-tests/0.1".to_string(),
        openrouter_api_key: None,
        database_url: "sqlite::memory:".to_string(),
        log_level: "info".to_string(),
        ticker_cache_path: PathBuf::from("unused.json"),
        budget_path: PathBuf::from("unused-budget.json"),
        daily_request_limit: 1000,
        min_post_score: 10,
        max_tokens_per_batch: 98_000,
        llm_request_timeout_secs: 60,
        llm_max_output_tokens: 2000,
        max_concurrent_batches: 3,
    }
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "access_token": "test-token" })),
        )
        .mount(server)
        .await;
}

async fn connect(server: &MockServer) -> RedditClient {
    RedditClient::connect_with_base_urls(&test_config(), &server.uri(), &server.uri())
        .await
        .expect("client connect should succeed")
}

fn post_json(id: &str, title: &str, body: &str, score: i64) -> serde_json::Value {
    serde_json::json!({
        "kind": "t3",
        "data": {
            "id": id,
            "subreddit": "wallstreetbets",
            "title": title,
            "selftext": body,
            "score": score,
            "link_flair_text": null,
            "created_utc": 1_700_000_000.0
        }
    })
}

#[tokio::test]
async fn fetch_top_posts_parses_listing() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let listing = serde_json::json!({
        "data": {
            "children": [
                post_json("p1", "NVDA earnings", "beat expectations", 321),
                post_json("p2", "AAPL dip", "buying opportunity?", 88),
            ],
            "after": null
        }
    });

    Mock::given(method("GET"))
        .and(path("/r/wallstreetbets/top"))
        .and(query_param("t", "day"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&listing))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let posts = client
        .fetch_top_posts("wallstreetbets", Timeframe::Day, 50)
        .await
        .expect("should parse posts");

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, "p1");
    assert_eq!(posts[0].score, 321);
    assert_eq!(posts[1].text(), "AAPL dip\n\nbuying opportunity?");
}

#[tokio::test]
async fn fetch_top_posts_respects_limit_across_pages() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let page_one = serde_json::json!({
        "data": {
            "children": [
                post_json("p1", "one", "", 10),
                post_json("p2", "two", "", 10),
            ],
            "after": "t3_p2"
        }
    });
    let page_two = serde_json::json!({
        "data": {
            "children": [ post_json("p3", "three", "", 10) ],
            "after": null
        }
    });

    Mock::given(method("GET"))
        .and(path("/r/stocks/top"))
        .and(query_param("after", "t3_p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page_two))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/stocks/top"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&page_one))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let posts = client
        .fetch_top_posts("stocks", Timeframe::Week, 3)
        .await
        .expect("should follow the cursor");

    assert_eq!(posts.len(), 3);
    assert_eq!(posts[2].id, "p3");
}

#[tokio::test]
async fn rejected_token_exchange_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result =
        RedditClient::connect_with_base_urls(&test_config(), &server.uri(), &server.uri()).await;

    assert!(
        matches!(result, Err(RedditError::Auth(_))),
        "expected Auth error, got: {:?}",
        result.err()
    );
}

#[tokio::test]
async fn http_429_surfaces_as_rate_limited() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/r/stocks/top"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let result = client.fetch_top_posts("stocks", Timeframe::Day, 10).await;

    assert!(
        matches!(result, Err(RedditError::RateLimited { .. })),
        "expected RateLimited, got: {:?}",
        result.err()
    );
}

#[tokio::test]
async fn fetch_top_comments_takes_the_second_listing() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let body = serde_json::json!([
        { "data": { "children": [], "after": null } },
        { "data": {
            "children": [
                { "kind": "t1", "data": {
                    "id": "c1", "body": "solid earnings, holding", "score": 30,
                    "created_utc": 1_700_000_200.0
                }},
                { "kind": "t1", "data": {
                    "id": "c2", "body": "[deleted]", "score": 2,
                    "created_utc": 1_700_000_201.0
                }},
                { "kind": "more", "data": { "id": "m1", "created_utc": 0.0 } }
            ],
            "after": null
        }}
    ]);

    Mock::given(method("GET"))
        .and(path("/comments/p1"))
        .and(query_param("sort", "top"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let comments = client
        .fetch_top_comments("wallstreetbets", "p1", 5)
        .await
        .expect("should parse comments");

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, "c1");
    assert_eq!(comments[0].subreddit, "wallstreetbets");
}
