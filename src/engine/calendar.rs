use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// A weekday that is not a designated holiday.
pub fn is_business_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(&date)
}

/// Business days in the closed interval [start, end]. Returns 0 when
/// end < start; rejecting a reversed range is the caller's job.
pub fn count_business_days(start: NaiveDate, end: NaiveDate, holidays: &HashSet<NaiveDate>) -> u32 {
    if end < start {
        return 0;
    }

    let mut count = 0;
    let mut day = start;
    while day <= end {
        if is_business_day(day, holidays) {
            count += 1;
        }
        day += Duration::days(1);
    }
    count
}
