use chrono::{Datelike, NaiveDate};

/// Counts Monday through Friday days in `start..=end`.
///
/// A half-day request covering exactly one weekday counts as 0.5.
pub fn calculate_leave_days(start: NaiveDate, end: NaiveDate, half_day: bool) -> f64 {
    if start > end {
        return 0.0;
    }
    let span = (end - start).num_days() + 1;
    let first = start.weekday().num_days_from_monday() as i64;
    let tail = (0..span % 7)
        .filter(|offset| (first + offset) % 7 < 5)
        .count() as i64;
    let weekdays = span / 7 * 5 + tail;

    if half_day && weekdays == 1 {
        0.5
    } else {
        weekdays as f64
    }
}

/// Whether two inclusive date ranges share at least one day.
pub fn ranges_overlap(a: (NaiveDate, NaiveDate), b: (NaiveDate, NaiveDate)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn full_work_week_counts_five() {
        assert_eq!(calculate_leave_days(date(2024, 6, 3), date(2024, 6, 7), false), 5.0);
    }

    #[test]
    fn weekend_counts_zero() {
        assert_eq!(calculate_leave_days(date(2024, 6, 1), date(2024, 6, 2), false), 0.0);
        assert_eq!(calculate_leave_days(date(2024, 6, 1), date(2024, 6, 2), true), 0.0);
    }

    #[test]
    fn half_day_applies_only_to_single_weekday() {
        assert_eq!(calculate_leave_days(date(2024, 6, 4), date(2024, 6, 4), true), 0.5);
        assert_eq!(calculate_leave_days(date(2024, 6, 4), date(2024, 6, 5), true), 2.0);
    }

    #[test]
    fn spanning_weekend_skips_it() {
        assert_eq!(calculate_leave_days(date(2024, 6, 6), date(2024, 6, 11), false), 4.0);
    }

    #[test]
    fn reversed_range_counts_nothing() {
        assert_eq!(calculate_leave_days(date(2024, 6, 7), date(2024, 6, 3), false), 0.0);
    }

    #[test]
    fn long_ranges_count_whole_weeks() {
        // 2024 has 366 days starting on a Monday: 52 weeks plus Mon and Tue.
        assert_eq!(calculate_leave_days(date(2024, 1, 1), date(2024, 12, 31), false), 262.0);
        assert_eq!(calculate_leave_days(date(2024, 6, 1), date(2024, 6, 30), false), 20.0);
    }

    #[test]
    fn overlap_is_inclusive() {
        let a = (date(2024, 6, 3), date(2024, 6, 5));
        assert!(ranges_overlap(a, (date(2024, 6, 5), date(2024, 6, 9))));
        assert!(ranges_overlap(a, (date(2024, 6, 1), date(2024, 6, 3))));
        assert!(ranges_overlap(a, (date(2024, 6, 4), date(2024, 6, 4))));
        assert!(!ranges_overlap(a, (date(2024, 6, 6), date(2024, 6, 9))));
    }
}
