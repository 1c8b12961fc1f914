use std::path::PathBuf;

/// Application configuration, loaded once at startup and threaded through
/// the pipeline explicitly — there is no global config singleton.
#[derive(Clone)]
pub struct AppConfig {
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_user_agent: String,
    /// OpenRouter API key. Optional at load time; LLM commands fail with a
    /// clear message when it is absent.
    pub openrouter_api_key: Option<String>,
    pub database_url: String,
    pub log_level: String,
    /// JSON cache file for the authoritative ticker set.
    pub ticker_cache_path: PathBuf,
    /// JSON file holding the persisted daily request budget.
    pub budget_path: PathBuf,
    pub daily_request_limit: u32,
    pub min_post_score: i64,
    pub max_tokens_per_batch: usize,
    pub llm_request_timeout_secs: u64,
    pub llm_max_output_tokens: u32,
    /// Upper bound on batches in flight at once. `1` gives strictly
    /// sequential dispatch.
    pub max_concurrent_batches: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("reddit_client_id", &"[redacted]")
            .field("reddit_client_secret", &"[redacted]")
            .field("reddit_user_agent", &self.reddit_user_agent)
            .field(
                "openrouter_api_key",
                &self.openrouter_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("database_url", &self.database_url)
            .field("log_level", &self.log_level)
            .field("ticker_cache_path", &self.ticker_cache_path)
            .field("budget_path", &self.budget_path)
            .field("daily_request_limit", &self.daily_request_limit)
            .field("min_post_score", &self.min_post_score)
            .field("max_tokens_per_batch", &self.max_tokens_per_batch)
            .field("llm_request_timeout_secs", &self.llm_request_timeout_secs)
            .field("llm_max_output_tokens", &self.llm_max_output_tokens)
            .field("max_concurrent_batches", &self.max_concurrent_batches)
            .finish()
    }
}
