use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;

use crate::error::TickerError;
use crate::set::TickerSet;

const DEFAULT_BASE_URL: &str =
    "https://raw.githubusercontent.com/rreichel3/US-Stock-Symbols/main";

/// Exchange name and list path, relative to the base URL. Each file is a
/// newline-separated list of symbols.
const EXCHANGE_LISTS: &[(&str, &str)] = &[
    ("nasdaq", "/nasdaq/nasdaq_tickers.txt"),
    ("nyse", "/nyse/nyse_tickers.txt"),
    ("amex", "/amex/amex_tickers.txt"),
];

/// Fetches and caches the authoritative ticker set.
///
/// Use [`TickerStore::new`] for production or [`TickerStore::with_base_url`]
/// to point at a mock server in tests.
pub struct TickerStore {
    client: Client,
    base_url: String,
    cache_path: PathBuf,
}

impl TickerStore {
    /// Creates a store pointed at the production symbol lists.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(cache_path: &Path, timeout_secs: u64) -> Result<Self, TickerError> {
        Self::with_base_url(cache_path, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a store with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        cache_path: &Path,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, TickerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("stockpulse/0.1 (stock-sentiment)")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            cache_path: cache_path.to_owned(),
        })
    }

    /// Returns the cached set while it is younger than the TTL; otherwise
    /// fetches fresh lists and rewrites the cache.
    ///
    /// A failed refresh falls back to the stale cached set when one exists,
    /// so a network outage degrades to yesterday's symbols instead of
    /// killing the run.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::DataUnavailable`] when every exchange fetch
    /// fails and no cache file is present.
    pub async fn load_or_refresh(&self) -> Result<TickerSet, TickerError> {
        if let Some(cached) = self.read_cache_lenient() {
            if !cached.is_stale(Utc::now()) {
                tracing::debug!(
                    symbols = cached.len(),
                    "using cached ticker set"
                );
                return Ok(cached);
            }
        }

        match self.fetch_all().await {
            Ok(fresh) => {
                self.write_cache_best_effort(&fresh);
                Ok(fresh)
            }
            Err(e) => match self.read_cache_lenient() {
                Some(stale) => {
                    tracing::warn!(
                        error = %e,
                        symbols = stale.len(),
                        "ticker refresh failed; falling back to stale cache"
                    );
                    Ok(stale)
                }
                None => {
                    tracing::error!(error = %e, "ticker refresh failed with no cache to fall back to");
                    Err(TickerError::DataUnavailable)
                }
            },
        }
    }

    /// Deletes the cache file (if present) and fetches a fresh set.
    ///
    /// # Errors
    ///
    /// Returns [`TickerError::Cache`] if an existing cache file cannot be
    /// removed, or [`TickerError::DataUnavailable`] if the fetch fails.
    pub async fn force_refresh(&self) -> Result<TickerSet, TickerError> {
        if self.cache_path.exists() {
            std::fs::remove_file(&self.cache_path).map_err(|source| TickerError::Cache {
                context: self.cache_path.display().to_string(),
                source,
            })?;
        }
        let fresh = self.fetch_all().await.map_err(|e| {
            tracing::error!(error = %e, "forced ticker refresh failed");
            TickerError::DataUnavailable
        })?;
        self.write_cache_best_effort(&fresh);
        Ok(fresh)
    }

    /// Fetches every exchange list, tolerating individual exchange failures.
    ///
    /// Fails only when no exchange returned any symbols, carrying the last
    /// error observed.
    async fn fetch_all(&self) -> Result<TickerSet, TickerError> {
        let mut symbols: Vec<String> = Vec::new();
        let mut last_err: Option<TickerError> = None;

        for &(exchange, path) in EXCHANGE_LISTS {
            match self.fetch_exchange(path).await {
                Ok(list) => {
                    tracing::debug!(exchange, count = list.len(), "fetched exchange tickers");
                    symbols.extend(list);
                }
                Err(e) => {
                    tracing::warn!(exchange, error = %e, "exchange ticker fetch failed");
                    last_err = Some(e);
                }
            }
        }

        if symbols.is_empty() {
            return Err(last_err.unwrap_or(TickerError::DataUnavailable));
        }

        Ok(TickerSet::new(symbols, Utc::now()))
    }

    async fn fetch_exchange(&self, path: &str) -> Result<Vec<String>, TickerError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.get(&url).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;

        Ok(body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// Reads the cache file; any read/parse failure is logged and treated
    /// as an absent cache, matching the refresh-on-doubt policy.
    fn read_cache_lenient(&self) -> Option<TickerSet> {
        let raw = match std::fs::read_to_string(&self.cache_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(
                    path = %self.cache_path.display(),
                    error = %e,
                    "ticker cache read failed"
                );
                return None;
            }
        };

        match serde_json::from_str::<TickerSet>(&raw) {
            Ok(set) => Some(set),
            Err(e) => {
                tracing::warn!(
                    path = %self.cache_path.display(),
                    error = %e,
                    "ticker cache parse failed; ignoring cache"
                );
                None
            }
        }
    }

    fn write_cache_best_effort(&self, set: &TickerSet) {
        let serialized = match serde_json::to_string(set) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "ticker cache serialization failed");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.cache_path, serialized) {
            tracing::warn!(
                path = %self.cache_path.display(),
                error = %e,
                "ticker cache write failed"
            );
        } else {
            tracing::debug!(
                path = %self.cache_path.display(),
                symbols = set.len(),
                "ticker cache written"
            );
        }
    }
}
