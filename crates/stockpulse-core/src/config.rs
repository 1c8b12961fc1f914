use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let reddit_client_id = require("REDDIT_CLIENT_ID")?;
    let reddit_client_secret = require("REDDIT_CLIENT_SECRET")?;
    let reddit_user_agent = or_default("REDDIT_USER_AGENT", "stockpulse/0.1 (stock-sentiment)");
    let openrouter_api_key = lookup("OPENROUTER_API_KEY").ok();

    let database_url = or_default("DATABASE_URL", "sqlite:stocks.db?mode=rwc");
    let log_level = or_default("STOCKPULSE_LOG_LEVEL", "info");

    let ticker_cache_path = PathBuf::from(or_default(
        "STOCKPULSE_TICKER_CACHE_PATH",
        "./valid_tickers_cache.json",
    ));
    let budget_path = PathBuf::from(or_default(
        "STOCKPULSE_BUDGET_PATH",
        "./request_budget.json",
    ));

    let daily_request_limit = parse_u32("STOCKPULSE_DAILY_REQUEST_LIMIT", "1000")?;
    let min_post_score = parse_i64("STOCKPULSE_MIN_POST_SCORE", "10")?;
    let max_tokens_per_batch = parse_usize("STOCKPULSE_MAX_TOKENS_PER_BATCH", "98000")?;
    let llm_request_timeout_secs = parse_u64("STOCKPULSE_LLM_TIMEOUT_SECS", "60")?;
    let llm_max_output_tokens = parse_u32("STOCKPULSE_LLM_MAX_OUTPUT_TOKENS", "2000")?;
    let max_concurrent_batches = parse_usize("STOCKPULSE_MAX_CONCURRENT_BATCHES", "3")?;

    Ok(AppConfig {
        reddit_client_id,
        reddit_client_secret,
        reddit_user_agent,
        openrouter_api_key,
        database_url,
        log_level,
        ticker_cache_path,
        budget_path,
        daily_request_limit,
        min_post_score,
        max_tokens_per_batch,
        llm_request_timeout_secs,
        llm_max_output_tokens,
        max_concurrent_batches,
    })
}
