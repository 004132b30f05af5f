//! Integration tests for the statistics engine over a realistic history.

use aerotrack::stats::{RecordKind, StatsEngine};
use aerotrack::{Activity, ActivityType};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn account_opened() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
}

fn run(start: DateTime<Utc>, distance_m: f64, duration_secs: u32) -> Activity {
    completed(ActivityType::Running, start, distance_m, duration_secs)
}

fn completed(
    activity_type: ActivityType,
    start: DateTime<Utc>,
    distance_m: f64,
    duration_secs: u32,
) -> Activity {
    let mut activity = Activity::new(activity_type, start);
    activity.end_time = Some(start + Duration::seconds(duration_secs as i64));
    activity.duration_secs = duration_secs;
    activity.distance_m = distance_m;
    activity.calories = (duration_secs / 60) * 10;
    activity.average_speed = if duration_secs > 0 {
        distance_m / duration_secs as f64
    } else {
        0.0
    };
    activity.elevation_gain = Some(20.0);
    activity.is_completed = true;
    activity
}

#[test]
fn test_longest_distance_record_moves_to_better_activity() {
    let mut engine = StatsEngine::new(account_opened());

    let first = run(account_opened(), 3000.0, 1200);
    let second = run(account_opened() + Duration::days(1), 7000.0, 2500);

    engine.apply_activity_at(&first, first.finalized_at());
    let record = engine
        .statistics()
        .record(ActivityType::Running, RecordKind::LongestDistance)
        .expect("record created on first apply");
    assert_eq!(record.value, 3000.0);
    assert_eq!(record.activity_id, first.id);

    engine.apply_activity_at(&second, second.finalized_at());
    let record = engine
        .statistics()
        .record(ActivityType::Running, RecordKind::LongestDistance)
        .expect("record still present");
    assert_eq!(record.value, 7000.0);
    assert_eq!(record.activity_id, second.id);

    // Exactly one record per (type, kind) pair
    let longest_distance_records = engine
        .statistics()
        .personal_records
        .iter()
        .filter(|r| r.kind == RecordKind::LongestDistance)
        .count();
    assert_eq!(longest_distance_records, 1);
}

#[test]
fn test_weaker_activity_does_not_regress_records() {
    let mut engine = StatsEngine::new(account_opened());

    let strong = run(account_opened(), 10_000.0, 3000);
    let weak = run(account_opened() + Duration::days(1), 2000.0, 900);

    engine.apply_activity_at(&strong, strong.finalized_at());
    engine.apply_activity_at(&weak, weak.finalized_at());

    let stats = engine.statistics();
    let distance = stats
        .record(ActivityType::Running, RecordKind::LongestDistance)
        .unwrap();
    assert_eq!(distance.activity_id, strong.id);

    // 10 km in 50 min (5 min/km) beats 2 km in 15 min (7.5 min/km)
    let pace = stats
        .record(ActivityType::Running, RecordKind::FastestPace)
        .unwrap();
    assert_eq!(pace.activity_id, strong.id);
    assert!((pace.value - 5.0).abs() < 1e-9);

    // Totals still count both
    assert_eq!(stats.total_activities, 2);
    assert_eq!(stats.total_distance_m, 12_000.0);
}

#[test]
fn test_records_are_per_activity_type() {
    let mut engine = StatsEngine::new(account_opened());

    let run_activity = run(account_opened(), 5000.0, 1500);
    let ride = completed(
        ActivityType::Cycling,
        account_opened() + Duration::hours(3),
        20_000.0,
        3600,
    );

    engine.apply_activity_at(&run_activity, run_activity.finalized_at());
    engine.apply_activity_at(&ride, ride.finalized_at());

    let stats = engine.statistics();
    assert_eq!(
        stats
            .record(ActivityType::Running, RecordKind::LongestDistance)
            .unwrap()
            .value,
        5000.0
    );
    assert_eq!(
        stats
            .record(ActivityType::Cycling, RecordKind::LongestDistance)
            .unwrap()
            .value,
        20_000.0
    );
}

#[test]
fn test_daily_streak_growth_and_reset() {
    let mut engine = StatsEngine::new(account_opened());
    let day = |offset: i64| account_opened() + Duration::days(offset);

    // Three consecutive days
    for offset in 0..3 {
        let activity = run(day(offset), 3000.0, 1200);
        engine.apply_activity_at(&activity, activity.finalized_at());
    }
    assert_eq!(engine.statistics().current_streak, 3);
    assert_eq!(engine.statistics().longest_streak, 3);

    // Second workout on the same day leaves the streak unchanged
    let extra = run(day(2) + Duration::hours(5), 2000.0, 900);
    engine.apply_activity_at(&extra, extra.finalized_at());
    assert_eq!(engine.statistics().current_streak, 3);

    // Two-day gap resets the current streak but not the longest
    let late = run(day(5), 3000.0, 1200);
    engine.apply_activity_at(&late, late.finalized_at());
    assert_eq!(engine.statistics().current_streak, 1);
    assert_eq!(engine.statistics().longest_streak, 3);
}

#[test]
fn test_favorite_activity_follows_counts() {
    let mut engine = StatsEngine::new(account_opened());
    let day = |offset: i64| account_opened() + Duration::days(offset);

    for offset in 0..2 {
        let activity = completed(ActivityType::Cycling, day(offset), 10_000.0, 2000);
        engine.apply_activity_at(&activity, activity.finalized_at());
    }
    let one_run = run(day(2), 5000.0, 1500);
    engine.apply_activity_at(&one_run, one_run.finalized_at());

    assert_eq!(
        engine.statistics().favorite_activity_type,
        Some(ActivityType::Cycling)
    );

    // Two more runs overtake cycling
    for offset in 3..5 {
        let activity = run(day(offset), 5000.0, 1500);
        engine.apply_activity_at(&activity, activity.finalized_at());
    }
    assert_eq!(
        engine.statistics().favorite_activity_type,
        Some(ActivityType::Running)
    );
}

#[test]
fn test_rebuild_matches_incremental_application() {
    let mut incremental = StatsEngine::new(account_opened());
    let day = |offset: i64| account_opened() + Duration::days(offset);

    let history = vec![
        run(day(0), 3000.0, 1200),
        completed(ActivityType::Cycling, day(1), 15_000.0, 2700),
        run(day(2), 7000.0, 2400),
        completed(ActivityType::Yoga, day(4), 0.0, 2400),
    ];
    for activity in &history {
        incremental.apply_activity_at(activity, activity.finalized_at());
    }

    let mut rebuilt = StatsEngine::new(account_opened());
    rebuilt.rebuild(&history);

    let a = incremental.statistics();
    let b = rebuilt.statistics();
    assert_eq!(a.total_activities, b.total_activities);
    assert_eq!(a.total_distance_m, b.total_distance_m);
    assert_eq!(a.total_calories, b.total_calories);
    assert_eq!(a.current_streak, b.current_streak);
    assert_eq!(a.longest_streak, b.longest_streak);
    assert_eq!(a.favorite_activity_type, b.favorite_activity_type);
    assert_eq!(a.personal_records.len(), b.personal_records.len());
    assert_eq!(a.monthly_stats, b.monthly_stats);
}
