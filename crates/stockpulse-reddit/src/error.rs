use thiserror::Error;

/// Errors returned by the Reddit client.
///
/// `Auth` and `RateLimited` are deliberately separate from generic HTTP
/// failures: callers surface them to the operator instead of retrying.
#[derive(Debug, Error)]
pub enum RedditError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credential exchange or an authenticated call was rejected.
    #[error("Reddit auth error: {0}")]
    Auth(String),

    /// Reddit returned 429 for {context}.
    #[error("Reddit rate limited: {context}")]
    RateLimited { context: String },

    /// A non-2xx status outside the auth/rate-limit cases.
    #[error("unexpected Reddit status {status} for {context}")]
    UnexpectedStatus { context: String, status: u16 },

    /// The response body could not be deserialized into the expected shape.
    #[error("Reddit response parse error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
