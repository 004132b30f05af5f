//! Read models over the persisted activity history.
//!
//! These summaries are computed from the history on demand rather than
//! maintained incrementally; they back the "this week" / "this month"
//! views.

use crate::activity::Activity;
use crate::stats::types::{MonthlyStats, WeeklyStats};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Monday of the calendar week containing `now`.
fn week_start_of(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    today - Duration::days(today.weekday().num_days_from_monday() as i64)
}

/// Summarize the calendar week containing `now`.
pub fn weekly_summary(history: &[Activity], now: DateTime<Utc>) -> WeeklyStats {
    let week_start = week_start_of(now);
    let week_end = week_start + Duration::days(7);

    let mut summary = WeeklyStats {
        total_activities: 0,
        total_distance_m: 0.0,
        total_duration_secs: 0,
        total_calories: 0,
        average_workouts_per_day: 0.0,
        week_start,
    };

    for activity in history {
        let day = activity.start_time.date_naive();
        if day >= week_start && day < week_end {
            summary.total_activities += 1;
            summary.total_distance_m += activity.distance_m;
            summary.total_duration_secs += activity.duration_secs as u64;
            summary.total_calories += activity.calories as u64;
        }
    }

    summary.average_workouts_per_day = summary.total_activities as f64 / 7.0;
    summary
}

/// Summarize the calendar month containing `now`.
pub fn monthly_summary(history: &[Activity], now: DateTime<Utc>) -> MonthlyStats {
    let month = now.month();
    let year = now.year();

    let mut summary = MonthlyStats {
        month,
        year,
        total_activities: 0,
        total_distance_m: 0.0,
        total_duration_secs: 0,
        total_calories: 0,
    };

    for activity in history {
        if activity.start_time.month() == month && activity.start_time.year() == year {
            summary.total_activities += 1;
            summary.total_distance_m += activity.distance_m;
            summary.total_duration_secs += activity.duration_secs as u64;
            summary.total_calories += activity.calories as u64;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityType;
    use chrono::TimeZone;

    fn activity_on(start: DateTime<Utc>, distance_m: f64) -> Activity {
        let mut a = Activity::new(ActivityType::Running, start);
        a.distance_m = distance_m;
        a.duration_secs = 600;
        a.calories = 100;
        a
    }

    #[test]
    fn test_weekly_summary_filters_by_week() {
        // Wednesday 2025-06-18; week runs Mon 16th..Sun 22nd
        let now = Utc.with_ymd_and_hms(2025, 6, 18, 12, 0, 0).unwrap();
        let history = vec![
            activity_on(Utc.with_ymd_and_hms(2025, 6, 16, 7, 0, 0).unwrap(), 3000.0),
            activity_on(Utc.with_ymd_and_hms(2025, 6, 18, 7, 0, 0).unwrap(), 4000.0),
            // Previous Sunday: excluded
            activity_on(Utc.with_ymd_and_hms(2025, 6, 15, 7, 0, 0).unwrap(), 9000.0),
        ];

        let summary = weekly_summary(&history, now);
        assert_eq!(summary.week_start, NaiveDate::from_ymd_opt(2025, 6, 16).unwrap());
        assert_eq!(summary.total_activities, 2);
        assert_eq!(summary.total_distance_m, 7000.0);
        assert!((summary.average_workouts_per_day - 2.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_summary_filters_by_month() {
        let now = Utc.with_ymd_and_hms(2025, 6, 18, 12, 0, 0).unwrap();
        let history = vec![
            activity_on(Utc.with_ymd_and_hms(2025, 6, 2, 7, 0, 0).unwrap(), 3000.0),
            activity_on(Utc.with_ymd_and_hms(2025, 6, 28, 7, 0, 0).unwrap(), 4000.0),
            activity_on(Utc.with_ymd_and_hms(2025, 5, 30, 7, 0, 0).unwrap(), 9000.0),
        ];

        let summary = monthly_summary(&history, now);
        assert_eq!((summary.month, summary.year), (6, 2025));
        assert_eq!(summary.total_activities, 2);
        assert_eq!(summary.total_calories, 200);
    }

    #[test]
    fn test_empty_history() {
        let now = Utc::now();
        let summary = weekly_summary(&[], now);
        assert_eq!(summary.total_activities, 0);
        assert_eq!(summary.average_workouts_per_day, 0.0);
    }
}
