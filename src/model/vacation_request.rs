use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Submitted,
    Approved,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    /// Approved/rejected/cancelled requests accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Submitted)
    }

    /// Statuses that hold (or may yet hold) days against the ledger.
    pub fn is_active(&self) -> bool {
        matches!(self, RequestStatus::Submitted | RequestStatus::Approved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct VacationRequest {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1000)]
    pub employee_id: u64,

    #[schema(example = "2026-02-02", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2026-02-06", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    /// Computed once at creation, immutable afterwards.
    #[schema(example = 5)]
    pub business_days: u32,

    #[schema(example = "submitted")]
    pub status: RequestStatus,

    /// Approver or rejecter; set together with processed_at, exactly once.
    #[schema(example = 7, nullable = true)]
    pub processed_by: Option<u64>,

    #[schema(example = "2026-01-15T09:30:00Z", value_type = String, format = "date-time", nullable = true)]
    pub processed_at: Option<DateTime<Utc>>,

    #[schema(example = "team is short-staffed that week", nullable = true)]
    pub rejection_reason: Option<String>,

    #[schema(example = "2026-01-10T08:00:00Z", value_type = String, format = "date-time", nullable = true)]
    pub created_at: Option<DateTime<Utc>>,

    #[schema(example = "2026-01-15T09:30:00Z", value_type = String, format = "date-time", nullable = true)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl VacationRequest {
    /// Inclusive calendar-interval intersection with [start, end].
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}
