use thiserror::Error;

/// Errors from fetching or caching the authoritative ticker set.
#[derive(Debug, Error)]
pub enum TickerError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Cache file could not be read or written.
    #[error("ticker cache I/O error for {context}: {source}")]
    Cache {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Cache file exists but does not parse as a cached ticker set.
    #[error("ticker cache parse error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Every exchange fetch failed and no cached set exists to fall back to.
    #[error("ticker list unavailable: all exchange fetches failed and no cache is present")]
    DataUnavailable,
}
