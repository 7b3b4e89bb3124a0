use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;

use crate::model::allowance::AllowanceRecord;
use crate::model::role::Role;
use crate::model::vacation_request::{RequestStatus, VacationRequest};

use super::error::EngineError;
use super::occupancy::OccupancyCheck;
use super::{calendar, ledger, overlap};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Operation {
    Create,
    Approve,
    Reject,
    Cancel,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Approve => "approve",
            Operation::Reject => "reject",
            Operation::Cancel => "cancel",
        }
    }
}

/// Single role-to-operation capability table. Every transition consults this
/// instead of repeating role conditionals at each call site. Ownership and
/// self-approval constraints are enforced on top of it per transition.
static PERMISSIONS: Lazy<HashMap<Operation, &'static [Role]>> = Lazy::new(|| {
    let mut table: HashMap<Operation, &'static [Role]> = HashMap::new();
    table.insert(
        Operation::Create,
        &[Role::Employee, Role::Hr, Role::Administrator][..],
    );
    table.insert(Operation::Approve, &[Role::Hr, Role::Administrator][..]);
    table.insert(Operation::Reject, &[Role::Hr, Role::Administrator][..]);
    table.insert(
        Operation::Cancel,
        &[Role::Employee, Role::Hr, Role::Administrator][..],
    );
    table
});

pub fn authorize(role: Role, op: Operation) -> Result<(), EngineError> {
    match PERMISSIONS.get(&op) {
        Some(allowed) if allowed.contains(&role) => Ok(()),
        _ => Err(EngineError::Unauthorized(op.as_str())),
    }
}

/// Full creation check. Fail-closed: nothing may be persisted unless this
/// returns the business-day count for the new request.
#[allow(clippy::too_many_arguments)]
pub fn validate_create(
    role: Role,
    employee_id: u64,
    today: NaiveDate,
    start: NaiveDate,
    end: NaiveDate,
    holidays: &HashSet<NaiveDate>,
    record: Option<&AllowanceRecord>,
    existing: &[VacationRequest],
) -> Result<u32, EngineError> {
    authorize(role, Operation::Create)?;

    if end < start {
        return Err(EngineError::InvalidRange("end date is before start date"));
    }
    if !calendar::is_business_day(start, holidays) {
        return Err(EngineError::InvalidRange("start date is not a business day"));
    }
    if !calendar::is_business_day(end, holidays) {
        return Err(EngineError::InvalidRange("end date is not a business day"));
    }
    if start < today {
        return Err(EngineError::PastDate(start));
    }

    // Both endpoints are business days, so the count is at least 1.
    let days = calendar::count_business_days(start, end, holidays);

    let record = record.ok_or(EngineError::NoAllowanceConfigured {
        employee_id,
        year: start.year(),
    })?;
    let available = ledger::available_days(record, existing, start);
    if days > available {
        return Err(EngineError::InsufficientBalance {
            requested: days,
            available,
        });
    }

    if let Some(conflict) = overlap::find_overlap(existing, start, end, None) {
        return Err(EngineError::OverlappingRequest(conflict));
    }

    Ok(days)
}

/// Role, self-approval and state checks for an approval. The occupancy
/// verdict is enforced separately once the caller has computed it under the
/// team lock.
pub fn validate_approve(
    request: &VacationRequest,
    approver_employee: Option<u64>,
    approver_role: Role,
) -> Result<(), EngineError> {
    authorize(approver_role, Operation::Approve)?;
    if approver_employee == Some(request.employee_id) {
        return Err(EngineError::SelfApproval);
    }
    if request.status.is_terminal() {
        return Err(EngineError::InvalidStateTransition {
            from: request.status,
            action: "approve",
        });
    }
    Ok(())
}

/// An exceeded threshold is a warning, not a hard block: the approver must
/// resubmit with the acknowledgment flag to proceed.
pub fn enforce_admission(
    check: &OccupancyCheck,
    acknowledged: bool,
    threshold: f64,
) -> Result<(), EngineError> {
    if check.exceeds && !acknowledged {
        return Err(EngineError::AdmissionWarning {
            occupancy: check.occupancy,
            threshold,
        });
    }
    Ok(())
}

pub fn validate_reject(
    request: &VacationRequest,
    approver_employee: Option<u64>,
    approver_role: Role,
    reason: &str,
) -> Result<(), EngineError> {
    authorize(approver_role, Operation::Reject)?;
    if approver_employee == Some(request.employee_id) {
        return Err(EngineError::SelfApproval);
    }
    if request.status.is_terminal() {
        return Err(EngineError::InvalidStateTransition {
            from: request.status,
            action: "reject",
        });
    }
    if reason.trim().is_empty() {
        return Err(EngineError::Validation("rejection reason must not be empty"));
    }
    Ok(())
}

/// Owner-only. SUBMITTED cancels freely; APPROVED only while the vacation
/// has not begun. Returns the days handed back to the ledger — informational,
/// since cancelled requests simply drop out of consumption.
pub fn validate_cancel(
    request: &VacationRequest,
    requester_employee: Option<u64>,
    requester_role: Role,
    today: NaiveDate,
) -> Result<u32, EngineError> {
    authorize(requester_role, Operation::Cancel)?;
    if requester_employee != Some(request.employee_id) {
        return Err(EngineError::Unauthorized("cancel another employee's request"));
    }
    match request.status {
        RequestStatus::Submitted => {}
        RequestStatus::Approved => {
            if request.start_date <= today {
                return Err(EngineError::PastDate(request.start_date));
            }
        }
        RequestStatus::Rejected | RequestStatus::Cancelled => {
            return Err(EngineError::InvalidStateTransition {
                from: request.status,
                action: "cancel",
            });
        }
    }
    Ok(request.business_days)
}
