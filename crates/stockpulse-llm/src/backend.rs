//! Backend seam for model rotation.

use std::future::Future;

use crate::error::LlmError;
use crate::models::ModelDescriptor;

/// One uniform completion capability over any configured model.
///
/// The orchestrator rotates across [`ModelDescriptor`]s through this single
/// seam; tests substitute deterministic stubs.
pub trait CompletionBackend: Send + Sync {
    /// Send `prompt` to `model` and return the raw response content.
    fn complete(
        &self,
        model: &ModelDescriptor,
        prompt: &str,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}
