pub mod allowance;
pub mod vacation_request;

use crate::engine::EngineError;

/// Store failures are surfaced as the transient error class; retry policy
/// belongs to the caller.
pub(crate) fn store_error(e: sqlx::Error, context: &'static str) -> EngineError {
    tracing::error!(error = %e, context, "Store query failed");
    EngineError::Transient(format!("store: {context}"))
}
