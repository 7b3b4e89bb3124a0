use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

use crate::model::vacation_request::{RequestStatus, VacationRequest};

/// Admission-control verdict for one candidate approval. Recomputed per
/// check, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyCheck {
    pub exceeds: bool,
    /// Highest single-day fraction of the team simultaneously absent over
    /// the candidate range, with the candidate counted as approved.
    pub occupancy: f64,
    /// Members absent on the peak day, candidate included.
    pub affected_members: Vec<u64>,
}

/// Walk each calendar day of [start, end] and count team members with an
/// APPROVED absence covering that day, plus the candidate's owner. The
/// verdict carries the worst day observed.
pub fn check_threshold(
    member_ids: &[u64],
    approved: &[VacationRequest],
    candidate_employee: u64,
    start: NaiveDate,
    end: NaiveDate,
    threshold: f64,
) -> OccupancyCheck {
    if member_ids.is_empty() || end < start {
        return OccupancyCheck {
            exceeds: false,
            occupancy: 0.0,
            affected_members: Vec::new(),
        };
    }

    let team_size = member_ids.len() as f64;
    let mut peak = 0.0f64;
    let mut peak_members: BTreeSet<u64> = BTreeSet::new();

    let mut day = start;
    while day <= end {
        let absent: BTreeSet<u64> = member_ids
            .iter()
            .copied()
            .filter(|id| {
                *id == candidate_employee
                    || approved.iter().any(|r| {
                        r.employee_id == *id
                            && r.status == RequestStatus::Approved
                            && r.overlaps(day, day)
                    })
            })
            .collect();

        let fraction = absent.len() as f64 / team_size;
        if fraction > peak {
            peak = fraction;
            peak_members = absent;
        }
        day += Duration::days(1);
    }

    OccupancyCheck {
        exceeds: peak > threshold,
        occupancy: peak,
        affected_members: peak_members.into_iter().collect(),
    }
}
