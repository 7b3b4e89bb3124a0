use chrono::NaiveDate;

use crate::model::vacation_request::VacationRequest;

/// First SUBMITTED or APPROVED request intersecting [start, end], if any.
/// Rejected and cancelled requests hold no days and never conflict.
/// `excluding` skips the request being re-validated.
pub fn find_overlap(
    requests: &[VacationRequest],
    start: NaiveDate,
    end: NaiveDate,
    excluding: Option<u64>,
) -> Option<u64> {
    requests
        .iter()
        .filter(|r| Some(r.id) != excluding)
        .filter(|r| r.status.is_active())
        .find(|r| r.overlaps(start, end))
        .map(|r| r.id)
}

pub fn has_overlap(
    requests: &[VacationRequest],
    start: NaiveDate,
    end: NaiveDate,
    excluding: Option<u64>,
) -> bool {
    find_overlap(requests, start, end, excluding).is_some()
}
