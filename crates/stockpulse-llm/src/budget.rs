//! Persistent daily request budget.
//!
//! The budget file survives process restarts; the calendar day boundary is
//! evaluated in UTC so a run started near midnight cannot double-spend by
//! crossing a local-time boundary. All reservation paths go through one
//! async mutex, making check-and-increment atomic under concurrent batch
//! dispatch — this is the pipeline's only contended resource besides the
//! accumulator map.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::LlmError;

/// Persisted budget state for one calendar day (UTC).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetState {
    pub date: NaiveDate,
    pub requests_used: u32,
    pub daily_limit: u32,
}

/// Point-in-time view of the budget for reports.
#[derive(Debug, Clone, Copy)]
pub struct BudgetSnapshot {
    pub date: NaiveDate,
    pub used: u32,
    pub limit: u32,
}

impl BudgetSnapshot {
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }
}

/// Tracks and persists the daily LLM request budget.
pub struct BudgetTracker {
    path: PathBuf,
    state: Mutex<BudgetState>,
}

impl BudgetTracker {
    /// Open (or create) the budget file.
    ///
    /// An unreadable or unparseable file starts a fresh day at zero usage.
    /// A file from a previous day is reset. A persisted limit that differs
    /// from `daily_limit` is overwritten — the configured limit wins, usage
    /// is kept.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::BudgetPersist`] if the initial state cannot be
    /// written.
    pub fn open(path: &Path, daily_limit: u32) -> Result<Self, LlmError> {
        let today = Utc::now().date_naive();

        let mut state = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<BudgetState>(&raw) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "budget file unreadable; starting a fresh day"
                    );
                    BudgetState {
                        date: today,
                        requests_used: 0,
                        daily_limit,
                    }
                }
            },
            Err(_) => BudgetState {
                date: today,
                requests_used: 0,
                daily_limit,
            },
        };

        if state.date != today {
            tracing::info!(
                previous = %state.date,
                used = state.requests_used,
                "budget day rollover; usage reset"
            );
            state.date = today;
            state.requests_used = 0;
        }
        state.daily_limit = daily_limit;

        persist(path, &state)?;

        Ok(Self {
            path: path.to_owned(),
            state: Mutex::new(state),
        })
    }

    /// Atomically reserve `n` requests.
    ///
    /// Returns `Ok(false)` without any state change once
    /// `requests_used + n` would exceed the daily limit. A successful
    /// reservation is flushed to disk before this returns, so a crash
    /// between reserve and send can only over-count, never under-count.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::BudgetPersist`] if the updated state cannot be
    /// written; the in-memory reservation is rolled back in that case.
    pub async fn try_reserve(&self, n: u32) -> Result<bool, LlmError> {
        let mut state = self.state.lock().await;
        self.roll_over_if_new_day(&mut state);

        if state.requests_used.saturating_add(n) > state.daily_limit {
            return Ok(false);
        }

        state.requests_used += n;
        if let Err(e) = persist(&self.path, &state) {
            state.requests_used -= n;
            return Err(e);
        }

        let (used, limit) = (state.requests_used, state.daily_limit);
        drop(state);
        warn_at_thresholds(used, limit);
        Ok(true)
    }

    /// Return `n` unspent reservations to the pool.
    ///
    /// Only for reservations that were never sent; a request that went out
    /// stays counted regardless of its outcome.
    pub async fn release(&self, n: u32) {
        let mut state = self.state.lock().await;
        state.requests_used = state.requests_used.saturating_sub(n);
        if let Err(e) = persist(&self.path, &state) {
            tracing::warn!(error = %e, "budget release persist failed");
        }
    }

    /// Current usage for reports and the `budget` CLI command.
    pub async fn snapshot(&self) -> BudgetSnapshot {
        let mut state = self.state.lock().await;
        self.roll_over_if_new_day(&mut state);
        BudgetSnapshot {
            date: state.date,
            used: state.requests_used,
            limit: state.daily_limit,
        }
    }

    fn roll_over_if_new_day(&self, state: &mut BudgetState) {
        let today = Utc::now().date_naive();
        if state.date != today {
            tracing::info!(
                previous = %state.date,
                used = state.requests_used,
                "budget day rollover; usage reset"
            );
            state.date = today;
            state.requests_used = 0;
            if let Err(e) = persist(&self.path, state) {
                tracing::warn!(error = %e, "budget rollover persist failed");
            }
        }
    }
}

fn persist(path: &Path, state: &BudgetState) -> Result<(), LlmError> {
    let serialized = serde_json::to_string_pretty(state).map_err(|e| LlmError::BudgetPersist {
        context: path.display().to_string(),
        source: std::io::Error::other(e),
    })?;
    std::fs::write(path, serialized).map_err(|source| LlmError::BudgetPersist {
        context: path.display().to_string(),
        source,
    })
}

fn warn_at_thresholds(used: u32, limit: u32) {
    if limit == 0 {
        return;
    }
    let percentage = u64::from(used) * 100 / u64::from(limit);
    if percentage >= 90 {
        tracing::warn!(used, limit, percentage, "request budget critical");
    } else if percentage >= 80 {
        tracing::info!(used, limit, percentage, "request budget warning");
    }
}
