use std::collections::HashSet;

use chrono::NaiveDate;

use crate::model::allowance::AllowanceRecord;
use crate::model::role::Role;
use crate::model::vacation_request::{RequestStatus, VacationRequest};

use super::calendar::{count_business_days, is_business_day};
use super::error::EngineError;
use super::ledger::{self, compute_consumption};
use super::lifecycle::{self, Operation};
use super::occupancy::check_threshold;
use super::overlap::{find_overlap, has_overlap};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn no_holidays() -> HashSet<NaiveDate> {
    HashSet::new()
}

fn request(
    id: u64,
    employee_id: u64,
    start: NaiveDate,
    end: NaiveDate,
    business_days: u32,
    status: RequestStatus,
) -> VacationRequest {
    VacationRequest {
        id,
        employee_id,
        start_date: start,
        end_date: end,
        business_days,
        status,
        processed_by: None,
        processed_at: None,
        rejection_reason: None,
        created_at: None,
        updated_at: None,
    }
}

fn record(employee_id: u64, year: i32, total_days: u32, carryover_days: u32) -> AllowanceRecord {
    AllowanceRecord {
        id: 1,
        employee_id,
        year,
        total_days,
        carryover_days,
    }
}

// ── Business calendar ────────────────────────────────────

#[test]
fn full_week_counts_five_business_days() {
    // 2026-02-02 is a Monday, 2026-02-06 a Friday
    assert_eq!(count_business_days(d(2026, 2, 2), d(2026, 2, 6), &no_holidays()), 5);
}

#[test]
fn weekend_days_do_not_count() {
    // Friday through Monday spans two weekend days
    assert_eq!(count_business_days(d(2026, 2, 6), d(2026, 2, 9), &no_holidays()), 2);
}

#[test]
fn holidays_subtract_from_the_count() {
    let holidays: HashSet<NaiveDate> = [d(2026, 2, 4)].into_iter().collect();
    assert_eq!(count_business_days(d(2026, 2, 2), d(2026, 2, 6), &holidays), 4);
}

#[test]
fn reversed_range_counts_zero() {
    assert_eq!(count_business_days(d(2026, 2, 6), d(2026, 2, 2), &no_holidays()), 0);
}

#[test]
fn single_day_range_counts_itself() {
    assert_eq!(count_business_days(d(2026, 2, 2), d(2026, 2, 2), &no_holidays()), 1);
}

#[test]
fn saturday_is_not_a_business_day() {
    assert!(!is_business_day(d(2026, 2, 7), &no_holidays()));
    assert!(is_business_day(d(2026, 2, 6), &no_holidays()));
}

#[test]
fn holiday_is_not_a_business_day() {
    let holidays: HashSet<NaiveDate> = [d(2026, 2, 4)].into_iter().collect();
    assert!(!is_business_day(d(2026, 2, 4), &holidays));
}

// ── Allowance ledger ─────────────────────────────────────

#[test]
fn carryover_consumed_first_before_cutoff() {
    let rec = record(1, 2026, 26, 5);
    let approved = vec![request(10, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Approved)];
    let used = compute_consumption(&rec, &approved);
    assert_eq!(used.used_carryover, 5);
    assert_eq!(used.used_current_year, 0);
    assert_eq!(ledger::remaining_carryover(&rec, used), 0);
    assert_eq!(ledger::remaining_current_year(&rec, used), 26);
}

#[test]
fn carryover_shortfall_spills_into_current_year() {
    let rec = record(1, 2026, 26, 3);
    let approved = vec![request(10, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Approved)];
    let used = compute_consumption(&rec, &approved);
    assert_eq!(used.used_carryover, 3);
    assert_eq!(used.used_current_year, 2);
    assert_eq!(used.used_total(), 5);
}

#[test]
fn start_after_cutoff_never_touches_carryover() {
    let rec = record(1, 2026, 26, 5);
    let approved = vec![request(10, 1, d(2026, 4, 2), d(2026, 4, 3), 2, RequestStatus::Approved)];
    let used = compute_consumption(&rec, &approved);
    assert_eq!(used.used_carryover, 0);
    assert_eq!(used.used_current_year, 2);
}

#[test]
fn cutoff_day_itself_is_still_eligible() {
    let rec = record(1, 2026, 26, 5);
    // 2026-03-31 is a Tuesday
    let approved = vec![request(10, 1, d(2026, 3, 31), d(2026, 4, 1), 2, RequestStatus::Approved)];
    let used = compute_consumption(&rec, &approved);
    assert_eq!(used.used_carryover, 2);
    assert_eq!(used.used_current_year, 0);
}

#[test]
fn consumption_walks_requests_in_start_order() {
    let rec = record(1, 2026, 26, 4);
    // The March request drains the carryover before the April one runs
    let approved = vec![
        request(11, 1, d(2026, 4, 6), d(2026, 4, 10), 5, RequestStatus::Approved),
        request(10, 1, d(2026, 3, 16), d(2026, 3, 20), 5, RequestStatus::Approved),
    ];
    let used = compute_consumption(&rec, &approved);
    assert_eq!(used.used_carryover, 4);
    assert_eq!(used.used_current_year, 6);
}

#[test]
fn consumption_is_deterministic() {
    let rec = record(1, 2026, 26, 5);
    let approved = vec![
        request(12, 1, d(2026, 2, 2), d(2026, 2, 3), 2, RequestStatus::Approved),
        request(11, 1, d(2026, 2, 2), d(2026, 2, 4), 3, RequestStatus::Approved),
    ];
    let first = compute_consumption(&rec, &approved);
    let second = compute_consumption(&rec, &approved);
    assert_eq!(first, second);
}

#[test]
fn used_total_is_monotone_in_the_approved_set() {
    let rec = record(1, 2026, 26, 5);
    let mut approved = vec![request(10, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Approved)];
    let before = compute_consumption(&rec, &approved).used_total();
    approved.push(request(11, 1, d(2026, 5, 4), d(2026, 5, 8), 5, RequestStatus::Approved));
    let after = compute_consumption(&rec, &approved).used_total();
    assert!(after >= before);
}

#[test]
fn used_carryover_never_exceeds_the_grant() {
    let rec = record(1, 2026, 26, 2);
    let approved = vec![
        request(10, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Approved),
        request(11, 1, d(2026, 3, 2), d(2026, 3, 6), 5, RequestStatus::Approved),
    ];
    let used = compute_consumption(&rec, &approved);
    assert!(used.used_carryover <= rec.carryover_days);
    assert_eq!(used.used_total(), 10);
}

#[test]
fn non_approved_requests_do_not_consume() {
    let rec = record(1, 2026, 26, 5);
    let requests = vec![
        request(10, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Submitted),
        request(11, 1, d(2026, 3, 2), d(2026, 3, 6), 5, RequestStatus::Cancelled),
        request(12, 1, d(2026, 4, 6), d(2026, 4, 10), 5, RequestStatus::Rejected),
    ];
    assert_eq!(compute_consumption(&rec, &requests).used_total(), 0);
}

#[test]
fn requests_charged_to_other_years_are_ignored() {
    let rec = record(1, 2026, 26, 5);
    let approved = vec![request(10, 1, d(2025, 12, 22), d(2025, 12, 24), 3, RequestStatus::Approved)];
    assert_eq!(compute_consumption(&rec, &approved).used_total(), 0);
}

#[test]
fn candidate_after_cutoff_cannot_draw_remaining_carryover() {
    let rec = record(1, 2026, 10, 5);
    let approved = vec![request(10, 1, d(2026, 5, 4), d(2026, 5, 15), 10, RequestStatus::Approved)];
    // Current-year grant is exhausted; the untouched carryover is expired
    // from the candidate's point of view.
    assert_eq!(ledger::available_days(&rec, &approved, d(2026, 6, 1)), 0);
    assert!(!ledger::has_sufficient_balance(&rec, &approved, d(2026, 6, 1), 1));
    // A (hypothetical) candidate inside the window could still use it.
    assert_eq!(ledger::available_days(&rec, &approved, d(2026, 3, 2)), 5);
}

// ── Overlap guard ────────────────────────────────────────

#[test]
fn submitted_request_conflicts_on_intersection() {
    let existing = vec![request(7, 1, d(2026, 2, 5), d(2026, 2, 10), 4, RequestStatus::Submitted)];
    assert_eq!(find_overlap(&existing, d(2026, 2, 2), d(2026, 2, 6), None), Some(7));
}

#[test]
fn approved_request_conflicts_on_intersection() {
    let existing = vec![request(7, 1, d(2026, 2, 5), d(2026, 2, 10), 4, RequestStatus::Approved)];
    assert!(has_overlap(&existing, d(2026, 2, 2), d(2026, 2, 6), None));
}

#[test]
fn cancelled_and_rejected_never_conflict() {
    let existing = vec![
        request(7, 1, d(2026, 2, 5), d(2026, 2, 10), 4, RequestStatus::Cancelled),
        request(8, 1, d(2026, 2, 5), d(2026, 2, 10), 4, RequestStatus::Rejected),
    ];
    assert!(!has_overlap(&existing, d(2026, 2, 2), d(2026, 2, 6), None));
}

#[test]
fn touching_edges_count_as_overlap() {
    let existing = vec![request(7, 1, d(2026, 2, 6), d(2026, 2, 10), 3, RequestStatus::Submitted)];
    assert!(has_overlap(&existing, d(2026, 2, 2), d(2026, 2, 6), None));
}

#[test]
fn disjoint_ranges_do_not_conflict() {
    let existing = vec![request(7, 1, d(2026, 2, 9), d(2026, 2, 13), 5, RequestStatus::Approved)];
    assert!(!has_overlap(&existing, d(2026, 2, 2), d(2026, 2, 6), None));
}

#[test]
fn excluded_request_is_skipped() {
    let existing = vec![request(7, 1, d(2026, 2, 5), d(2026, 2, 10), 4, RequestStatus::Submitted)];
    assert!(!has_overlap(&existing, d(2026, 2, 2), d(2026, 2, 6), Some(7)));
}

// ── Occupancy admission ──────────────────────────────────

#[test]
fn lone_member_team_peaks_at_full_occupancy() {
    let check = check_threshold(&[1], &[], 1, d(2026, 2, 2), d(2026, 2, 6), 0.5);
    assert!(check.exceeds);
    assert_eq!(check.occupancy, 1.0);
    assert_eq!(check.affected_members, vec![1]);
}

#[test]
fn peak_day_fraction_is_reported() {
    // Member 2 is away only for the tail of the candidate range; the peak
    // day has both of the four members absent.
    let approved = vec![request(7, 2, d(2026, 2, 5), d(2026, 2, 10), 4, RequestStatus::Approved)];
    let check = check_threshold(&[1, 2, 3, 4], &approved, 1, d(2026, 2, 2), d(2026, 2, 6), 0.6);
    assert!(!check.exceeds);
    assert_eq!(check.occupancy, 0.5);
    assert_eq!(check.affected_members, vec![1, 2]);
}

#[test]
fn fraction_equal_to_threshold_does_not_exceed() {
    let check = check_threshold(&[1, 2], &[], 1, d(2026, 2, 2), d(2026, 2, 6), 0.5);
    assert_eq!(check.occupancy, 0.5);
    assert!(!check.exceeds);
}

#[test]
fn fraction_above_threshold_exceeds() {
    let approved = vec![request(7, 2, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Approved)];
    let check = check_threshold(&[1, 2, 3], &approved, 1, d(2026, 2, 2), d(2026, 2, 6), 0.5);
    assert!(check.exceeds);
    assert!((check.occupancy - 2.0 / 3.0).abs() < 1e-9);
}

#[test]
fn empty_team_never_exceeds() {
    let check = check_threshold(&[], &[], 1, d(2026, 2, 2), d(2026, 2, 6), 0.5);
    assert!(!check.exceeds);
    assert_eq!(check.occupancy, 0.0);
}

// ── Lifecycle: permissions ───────────────────────────────

#[test]
fn permission_table_gates_approve_and_reject() {
    assert!(lifecycle::authorize(Role::Hr, Operation::Approve).is_ok());
    assert!(lifecycle::authorize(Role::Administrator, Operation::Approve).is_ok());
    assert!(matches!(
        lifecycle::authorize(Role::Employee, Operation::Approve),
        Err(EngineError::Unauthorized(_))
    ));
    assert!(matches!(
        lifecycle::authorize(Role::Employee, Operation::Reject),
        Err(EngineError::Unauthorized(_))
    ));
}

#[test]
fn every_role_may_create_and_cancel() {
    for role in [Role::Employee, Role::Hr, Role::Administrator] {
        assert!(lifecycle::authorize(role, Operation::Create).is_ok());
        assert!(lifecycle::authorize(role, Operation::Cancel).is_ok());
    }
}

// ── Lifecycle: create ────────────────────────────────────

fn try_create(
    rec: Option<&AllowanceRecord>,
    existing: &[VacationRequest],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<u32, EngineError> {
    lifecycle::validate_create(
        Role::Employee,
        1,
        d(2026, 1, 15),
        start,
        end,
        &no_holidays(),
        rec,
        existing,
    )
}

#[test]
fn create_returns_the_business_day_count() {
    let rec = record(1, 2026, 26, 5);
    let days = try_create(Some(&rec), &[], d(2026, 2, 2), d(2026, 2, 6)).unwrap();
    assert_eq!(days, 5);
}

#[test]
fn create_rejects_reversed_range() {
    let rec = record(1, 2026, 26, 5);
    assert!(matches!(
        try_create(Some(&rec), &[], d(2026, 2, 6), d(2026, 2, 2)),
        Err(EngineError::InvalidRange(_))
    ));
}

#[test]
fn create_rejects_non_business_day_endpoints() {
    let rec = record(1, 2026, 26, 5);
    // Saturday start
    assert!(matches!(
        try_create(Some(&rec), &[], d(2026, 2, 7), d(2026, 2, 9)),
        Err(EngineError::InvalidRange(_))
    ));
    // Sunday end
    assert!(matches!(
        try_create(Some(&rec), &[], d(2026, 2, 6), d(2026, 2, 8)),
        Err(EngineError::InvalidRange(_))
    ));
}

#[test]
fn create_rejects_holiday_endpoint() {
    let rec = record(1, 2026, 26, 5);
    let holidays: HashSet<NaiveDate> = [d(2026, 2, 2)].into_iter().collect();
    let result = lifecycle::validate_create(
        Role::Employee,
        1,
        d(2026, 1, 15),
        d(2026, 2, 2),
        d(2026, 2, 6),
        &holidays,
        Some(&rec),
        &[],
    );
    assert!(matches!(result, Err(EngineError::InvalidRange(_))));
}

#[test]
fn create_rejects_past_start() {
    let rec = record(1, 2026, 26, 5);
    assert!(matches!(
        try_create(Some(&rec), &[], d(2026, 1, 5), d(2026, 1, 9)),
        Err(EngineError::PastDate(_))
    ));
}

#[test]
fn create_without_allowance_record_is_distinct_from_insufficient() {
    assert!(matches!(
        try_create(None, &[], d(2026, 2, 2), d(2026, 2, 6)),
        Err(EngineError::NoAllowanceConfigured { employee_id: 1, year: 2026 })
    ));
}

#[test]
fn create_rejects_insufficient_balance() {
    let rec = record(1, 2026, 2, 0);
    let result = try_create(Some(&rec), &[], d(2026, 2, 2), d(2026, 2, 6));
    match result {
        Err(EngineError::InsufficientBalance { requested, available }) => {
            assert_eq!(requested, 5);
            assert_eq!(available, 2);
        }
        other => panic!("expected InsufficientBalance, got {:?}", other),
    }
}

#[test]
fn create_rejects_overlap_with_active_request() {
    let rec = record(1, 2026, 26, 5);
    let existing = vec![request(7, 1, d(2026, 2, 5), d(2026, 2, 10), 4, RequestStatus::Submitted)];
    assert!(matches!(
        try_create(Some(&rec), &existing, d(2026, 2, 2), d(2026, 2, 6)),
        Err(EngineError::OverlappingRequest(7))
    ));
}

#[test]
fn create_accepts_range_freed_by_cancellation() {
    let rec = record(1, 2026, 26, 5);
    let existing = vec![request(7, 1, d(2026, 2, 5), d(2026, 2, 10), 4, RequestStatus::Cancelled)];
    assert!(try_create(Some(&rec), &existing, d(2026, 2, 2), d(2026, 2, 6)).is_ok());
}

// ── Lifecycle: approve / reject / cancel ─────────────────

#[test]
fn approve_requires_submitted_status() {
    let req = request(7, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Approved);
    assert!(matches!(
        lifecycle::validate_approve(&req, Some(2), Role::Hr),
        Err(EngineError::InvalidStateTransition { .. })
    ));
}

#[test]
fn approve_forbids_self_approval() {
    let req = request(7, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Submitted);
    assert!(matches!(
        lifecycle::validate_approve(&req, Some(1), Role::Hr),
        Err(EngineError::SelfApproval)
    ));
}

#[test]
fn approve_requires_an_approver_role() {
    let req = request(7, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Submitted);
    assert!(matches!(
        lifecycle::validate_approve(&req, Some(2), Role::Employee),
        Err(EngineError::Unauthorized(_))
    ));
}

#[test]
fn approve_passes_for_a_foreign_approver() {
    let req = request(7, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Submitted);
    assert!(lifecycle::validate_approve(&req, Some(2), Role::Hr).is_ok());
    assert!(lifecycle::validate_approve(&req, None, Role::Administrator).is_ok());
}

#[test]
fn exceeded_threshold_without_acknowledgment_is_a_warning_error() {
    let check = check_threshold(&[1], &[], 1, d(2026, 2, 2), d(2026, 2, 6), 0.5);
    assert!(matches!(
        lifecycle::enforce_admission(&check, false, 0.5),
        Err(EngineError::AdmissionWarning { .. })
    ));
    assert!(lifecycle::enforce_admission(&check, true, 0.5).is_ok());
}

#[test]
fn reject_requires_a_reason() {
    let req = request(7, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Submitted);
    assert!(matches!(
        lifecycle::validate_reject(&req, Some(2), Role::Hr, "  "),
        Err(EngineError::Validation(_))
    ));
    assert!(lifecycle::validate_reject(&req, Some(2), Role::Hr, "short-staffed").is_ok());
}

#[test]
fn reject_from_terminal_status_fails() {
    let req = request(7, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Rejected);
    assert!(matches!(
        lifecycle::validate_reject(&req, Some(2), Role::Hr, "again"),
        Err(EngineError::InvalidStateTransition { .. })
    ));
}

#[test]
fn cancel_is_owner_only() {
    let req = request(7, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Submitted);
    assert!(matches!(
        lifecycle::validate_cancel(&req, Some(2), Role::Employee, d(2026, 1, 15)),
        Err(EngineError::Unauthorized(_))
    ));
    assert!(matches!(
        lifecycle::validate_cancel(&req, None, Role::Administrator, d(2026, 1, 15)),
        Err(EngineError::Unauthorized(_))
    ));
}

#[test]
fn cancel_submitted_returns_its_days() {
    let req = request(7, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Submitted);
    assert_eq!(
        lifecycle::validate_cancel(&req, Some(1), Role::Employee, d(2026, 1, 15)).unwrap(),
        5
    );
}

#[test]
fn cancel_approved_request_already_started_fails() {
    let req = request(7, 1, d(2026, 1, 14), d(2026, 1, 20), 5, RequestStatus::Approved);
    // started yesterday
    assert!(matches!(
        lifecycle::validate_cancel(&req, Some(1), Role::Employee, d(2026, 1, 15)),
        Err(EngineError::PastDate(_))
    ));
}

#[test]
fn cancel_approved_future_request_is_allowed() {
    let req = request(7, 1, d(2026, 2, 2), d(2026, 2, 6), 5, RequestStatus::Approved);
    assert_eq!(
        lifecycle::validate_cancel(&req, Some(1), Role::Employee, d(2026, 1, 15)).unwrap(),
        5
    );
}

#[test]
fn cancel_from_terminal_status_fails() {
    for status in [RequestStatus::Rejected, RequestStatus::Cancelled] {
        let req = request(7, 1, d(2026, 2, 2), d(2026, 2, 6), 5, status);
        assert!(matches!(
            lifecycle::validate_cancel(&req, Some(1), Role::Employee, d(2026, 1, 15)),
            Err(EngineError::InvalidStateTransition { .. })
        ));
    }
}

// ── End to end ───────────────────────────────────────────

#[test]
fn submitted_week_consumes_carryover_fully_once_approved() {
    let rec = record(1, 2026, 26, 5);

    // Submission passes validation and yields 5 business days.
    let days = try_create(Some(&rec), &[], d(2026, 2, 2), d(2026, 2, 6)).unwrap();
    assert_eq!(days, 5);

    // While merely submitted the ledger is untouched.
    let mut req = request(42, 1, d(2026, 2, 2), d(2026, 2, 6), days, RequestStatus::Submitted);
    assert_eq!(compute_consumption(&rec, std::slice::from_ref(&req)).used_total(), 0);

    // Approval flips the status; consumption now derives from the set.
    req.status = RequestStatus::Approved;
    let used = compute_consumption(&rec, std::slice::from_ref(&req));
    assert_eq!(used.used_carryover, 5);
    assert_eq!(used.used_current_year, 0);
    assert_eq!(ledger::remaining_carryover(&rec, used), 0);
    assert_eq!(ledger::remaining_current_year(&rec, used), 26);
}
