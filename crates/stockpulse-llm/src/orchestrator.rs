//! Per-batch request orchestration with model rotation.
//!
//! A batch moves through `pending → sent(model) → parsed | failed(model)`;
//! on failure the next model in the priority list is tried (each at most
//! once per batch), and every attempt costs one budget unit whether or not
//! it succeeds. Transport errors, rate limits and unparseable responses
//! are all the same `failed` for rotation purposes. The rotation order is
//! the static roster, never shuffled, so runs are reproducible.

use crate::backend::CompletionBackend;
use crate::budget::BudgetTracker;
use crate::error::LlmError;
use crate::models::ModelDescriptor;
use crate::parse::{parse_extractions, ParsedResponse};

/// Terminal state of one batch dispatch.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Some model produced a response with at least one salvageable entry.
    Parsed {
        model_id: String,
        response: ParsedResponse,
        attempts: u32,
    },
    /// Every configured model was tried and failed; the batch's
    /// contribution is dropped and the run continues.
    Abandoned { attempts: u32 },
    /// The daily budget denied a reservation before the batch could be
    /// (re)sent; `attempts` counts the sends that did happen.
    BudgetExhausted { attempts: u32 },
}

/// Send one batch prompt through the model rotation.
///
/// Models are tried in ascending `priority` order, each at most once. A
/// budget reservation is taken before every attempt; a denied reservation
/// ends the batch as [`BatchOutcome::BudgetExhausted`] without calling the
/// backend.
///
/// # Errors
///
/// Only budget persistence failures abort the dispatch; model failures are
/// absorbed into the outcome.
pub async fn dispatch_batch<B: CompletionBackend>(
    backend: &B,
    budget: &BudgetTracker,
    models: &[ModelDescriptor],
    prompt: &str,
) -> Result<BatchOutcome, LlmError> {
    let mut roster: Vec<&ModelDescriptor> = models.iter().collect();
    roster.sort_by_key(|m| m.priority);

    let mut attempts = 0u32;

    for model in roster {
        if !budget.try_reserve(1).await? {
            let snap = budget.snapshot().await;
            let denied = LlmError::BudgetExceeded {
                used: snap.used,
                limit: snap.limit,
            };
            tracing::warn!(
                attempts,
                error = %denied,
                "batch dispatch stopped by budget"
            );
            return Ok(BatchOutcome::BudgetExhausted { attempts });
        }

        attempts += 1;
        tracing::debug!(model = %model.display_name, attempt = attempts, "batch sent");

        match backend.complete(model, prompt).await {
            Ok(content) => match parse_extractions(&model.id, &content) {
                Ok(response) => {
                    tracing::debug!(
                        model = %model.display_name,
                        tickers = response.extractions.len(),
                        malformed = response.malformed_entries,
                        "batch parsed"
                    );
                    return Ok(BatchOutcome::Parsed {
                        model_id: model.id.clone(),
                        response,
                        attempts,
                    });
                }
                Err(e) => {
                    tracing::warn!(model = %model.display_name, error = %e, "batch response unparseable; rotating");
                }
            },
            Err(e) => {
                tracing::warn!(model = %model.display_name, error = %e, "batch send failed; rotating");
            }
        }
    }

    tracing::warn!(attempts, "all models exhausted; batch abandoned");
    Ok(BatchOutcome::Abandoned { attempts })
}
