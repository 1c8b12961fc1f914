use thiserror::Error;

/// Errors from the LLM client, budget tracker and response parser.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend returned 429 for this model.
    #[error("rate limited on model {model}")]
    RateLimited { model: String },

    /// The backend answered 2xx but with an application-level error or an
    /// unusable body (no choices, empty content).
    #[error("LLM API error from {model}: {message}")]
    Api { model: String, message: String },

    /// The response content yielded no salvageable ticker entries.
    #[error("unparseable LLM response from {model}")]
    Parse { model: String },

    /// The daily request ceiling has been reached; no reservation was made.
    #[error("request budget exceeded: {used}/{limit}")]
    BudgetExceeded { used: u32, limit: u32 },

    /// The budget file could not be read or written.
    #[error("budget persistence error for {context}: {source}")]
    BudgetPersist {
        context: String,
        #[source]
        source: std::io::Error,
    },
}
