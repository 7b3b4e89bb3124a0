use actix_web::{HttpResponse, http::StatusCode};
use chrono::NaiveDate;
use derive_more::Display;

use crate::model::vacation_request::RequestStatus;

/// Everything the lifecycle can refuse to do, detected before any mutation.
/// `Transient` is the only class a caller may retry.
#[derive(Debug, Display)]
pub enum EngineError {
    #[display(fmt = "invalid range: {}", _0)]
    InvalidRange(&'static str),

    #[display(fmt = "start date {} is in the past", _0)]
    PastDate(NaiveDate),

    #[display(
        fmt = "insufficient balance: requested {} day(s), {} available",
        requested,
        available
    )]
    InsufficientBalance { requested: u32, available: u32 },

    #[display(fmt = "no allowance configured for employee {} in {}", employee_id, year)]
    NoAllowanceConfigured { employee_id: u64, year: i32 },

    #[display(fmt = "overlaps existing request {}", _0)]
    OverlappingRequest(u64),

    #[display(fmt = "cannot {} a request in status {}", action, from)]
    InvalidStateTransition {
        from: RequestStatus,
        action: &'static str,
    },

    #[display(fmt = "approvers cannot process their own request")]
    SelfApproval,

    #[display(fmt = "role not permitted to {}", _0)]
    Unauthorized(&'static str),

    #[display(
        fmt = "team occupancy {:.2} exceeds threshold {:.2}; resubmit with acknowledgment to proceed",
        occupancy,
        threshold
    )]
    AdmissionWarning { occupancy: f64, threshold: f64 },

    #[display(fmt = "request {} not found", _0)]
    NotFound(u64),

    #[display(fmt = "{}", _0)]
    Validation(&'static str),

    #[display(fmt = "dependency failure: {}", _0)]
    Transient(String),
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidRange(_) => "invalid_range",
            EngineError::PastDate(_) => "past_date",
            EngineError::InsufficientBalance { .. } => "insufficient_balance",
            EngineError::NoAllowanceConfigured { .. } => "no_allowance_configured",
            EngineError::OverlappingRequest(_) => "overlapping_request",
            EngineError::InvalidStateTransition { .. } => "invalid_state_transition",
            EngineError::SelfApproval => "self_approval",
            EngineError::Unauthorized(_) => "unauthorized",
            EngineError::AdmissionWarning { .. } => "admission_warning",
            EngineError::NotFound(_) => "not_found",
            EngineError::Validation(_) => "validation",
            EngineError::Transient(_) => "transient_dependency_failure",
        }
    }
}

impl std::error::Error for EngineError {}

impl actix_web::ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::InvalidRange(_)
            | EngineError::PastDate(_)
            | EngineError::InsufficientBalance { .. }
            | EngineError::NoAllowanceConfigured { .. }
            | EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::OverlappingRequest(_)
            | EngineError::InvalidStateTransition { .. }
            | EngineError::AdmissionWarning { .. } => StatusCode::CONFLICT,
            EngineError::SelfApproval | EngineError::Unauthorized(_) => StatusCode::FORBIDDEN,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        }))
    }
}
