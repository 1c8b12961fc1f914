//! Shared configuration and domain types for stockpulse.
//!
//! Every other crate in the workspace depends on this one for the
//! environment-driven [`AppConfig`] and the content/sentiment types that
//! flow through the pipeline.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod types;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{
    sentiment_score, ContentItem, ContentKind, FinalSentimentRecord, SentimentBreakdown,
    SentimentLabel, SortKey, Timeframe,
};

/// Errors produced while loading application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
