use chrono::{Datelike, NaiveDate};

use crate::model::allowance::AllowanceRecord;
use crate::model::vacation_request::{RequestStatus, VacationRequest};

/// Carried-over days are spendable only on requests starting on or before
/// March 31 of the record's year.
pub fn carryover_expiry(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 3, 31).expect("March 31 exists in every year")
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Consumption {
    pub used_carryover: u32,
    pub used_current_year: u32,
}

impl Consumption {
    pub fn used_total(&self) -> u32 {
        self.used_carryover + self.used_current_year
    }
}

/// Derive the consumption split for one allowance record from the request
/// set. Only APPROVED requests charged to the record's year participate;
/// recomputing from the source of truth on every call is what lets the
/// ledger survive a missed reversal.
///
/// Requests are walked in (start_date, id) order. While carryover remains
/// and a request starts on or before the expiry, its days draw from
/// carryover first; any shortfall spills into the current-year grant.
pub fn compute_consumption(record: &AllowanceRecord, requests: &[VacationRequest]) -> Consumption {
    let mut approved: Vec<&VacationRequest> = requests
        .iter()
        .filter(|r| r.status == RequestStatus::Approved && r.start_date.year() == record.year)
        .collect();
    approved.sort_by_key(|r| (r.start_date, r.id));

    let expiry = carryover_expiry(record.year);
    let mut remaining_carryover = record.carryover_days;
    let mut used = Consumption::default();

    for request in approved {
        let mut days = request.business_days;
        if request.start_date <= expiry && remaining_carryover > 0 {
            let from_carryover = days.min(remaining_carryover);
            remaining_carryover -= from_carryover;
            used.used_carryover += from_carryover;
            days -= from_carryover;
        }
        used.used_current_year += days;
    }
    used
}

pub fn remaining_carryover(record: &AllowanceRecord, used: Consumption) -> u32 {
    record.carryover_days.saturating_sub(used.used_carryover)
}

pub fn remaining_current_year(record: &AllowanceRecord, used: Consumption) -> u32 {
    record.total_days.saturating_sub(used.used_current_year)
}

/// Days a candidate request starting on `candidate_start` could still draw.
/// Carryover counts only while the candidate itself starts within the
/// expiry window.
pub fn available_days(
    record: &AllowanceRecord,
    requests: &[VacationRequest],
    candidate_start: NaiveDate,
) -> u32 {
    let used = compute_consumption(record, requests);
    let current = remaining_current_year(record, used);
    if candidate_start <= carryover_expiry(record.year) {
        remaining_carryover(record, used) + current
    } else {
        current
    }
}

pub fn has_sufficient_balance(
    record: &AllowanceRecord,
    requests: &[VacationRequest],
    candidate_start: NaiveDate,
    candidate_days: u32,
) -> bool {
    candidate_days <= available_days(record, requests, candidate_start)
}
