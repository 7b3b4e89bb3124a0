use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row per employee per year, provisioned by HR tooling. Consumption is
/// never stored on it; the ledger re-derives it from the approved request set.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AllowanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1000)]
    pub employee_id: u64,

    #[schema(example = 2026)]
    pub year: i32,

    /// Days granted for `year`.
    #[schema(example = 26)]
    pub total_days: u32,

    /// Unused days brought in from the prior year; expire March 31.
    #[schema(example = 5)]
    pub carryover_days: u32,
}
