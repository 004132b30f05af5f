//! Integration tests for SQLite persistence against a real database file.

use aerotrack::stats::StatsEngine;
use aerotrack::storage::{ActivityRepository, Database};
use aerotrack::{Activity, ActivityType};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn start_of_history() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 7, 0, 0).unwrap()
}

fn completed_run(start: DateTime<Utc>, distance_m: f64) -> Activity {
    let mut activity = Activity::new(ActivityType::Running, start);
    activity.end_time = Some(start + Duration::seconds(1800));
    activity.duration_secs = 1800;
    activity.distance_m = distance_m;
    activity.calories = 360;
    activity.average_speed = distance_m / 1800.0;
    activity.is_completed = true;
    activity
}

#[test]
fn test_history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aerotrack.db");

    let saved_id;
    {
        let mut db = Database::open(&path).unwrap();
        let activity = completed_run(start_of_history(), 5000.0);
        saved_id = activity.id;
        db.save(&activity).unwrap();
    }

    let db = Database::open(&path).unwrap();
    let load = db.load_all().unwrap();
    assert_eq!(load.activities.len(), 1);
    assert_eq!(load.skipped, 0);
    assert_eq!(load.activities[0].id, saved_id);
    assert_eq!(load.activities[0].distance_m, 5000.0);
}

#[test]
fn test_corrupt_row_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aerotrack.db");

    let mut kept_ids = Vec::new();
    {
        let mut db = Database::open(&path).unwrap();
        for i in 0..10 {
            let activity =
                completed_run(start_of_history() + Duration::days(i), 3000.0 + i as f64);
            kept_ids.push(activity.id);
            db.save(&activity).unwrap();
        }
    }

    // Corrupt one stored record's route payload behind the store's back
    let corrupted_id = kept_ids.remove(4);
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute(
            "UPDATE activities SET route_json = 'not valid json' WHERE id = ?1",
            rusqlite::params![corrupted_id.to_string()],
        )
        .unwrap();
    }

    let db = Database::open(&path).unwrap();
    let load = db.load_all().unwrap();
    assert_eq!(load.activities.len(), 9);
    assert_eq!(load.skipped, 1);
    assert!(load.activities.iter().all(|a| a.id != corrupted_id));
    for id in kept_ids {
        assert!(load.activities.iter().any(|a| a.id == id));
    }
}

#[test]
fn test_statistics_snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aerotrack.db");

    {
        let mut db = Database::open(&path).unwrap();
        let mut engine = StatsEngine::new(start_of_history());
        let activity = completed_run(start_of_history(), 5000.0);
        engine.apply_activity_at(&activity, activity.finalized_at());
        db.save_statistics(&engine.snapshot()).unwrap();
    }

    let db = Database::open(&path).unwrap();
    let snapshot = db.load_statistics().unwrap().expect("snapshot persisted");
    assert_eq!(snapshot.statistics.total_activities, 1);
    assert_eq!(snapshot.streaks.len(), 1);
}

#[test]
fn test_corrupt_snapshot_triggers_rebuild_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aerotrack.db");

    let activity = completed_run(start_of_history(), 7000.0);
    {
        let mut db = Database::open(&path).unwrap();
        db.save(&activity).unwrap();
        let mut engine = StatsEngine::new(start_of_history());
        engine.apply_activity_at(&activity, activity.finalized_at());
        db.save_statistics(&engine.snapshot()).unwrap();
    }

    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute(
            "UPDATE user_statistics SET snapshot_json = '{truncated' WHERE id = 1",
            [],
        )
        .unwrap();
    }

    // An unreadable snapshot reads as absent; the history still loads, so
    // the aggregate can be rebuilt from it.
    let db = Database::open(&path).unwrap();
    assert!(db.load_statistics().unwrap().is_none());

    let load = db.load_all().unwrap();
    let mut engine = StatsEngine::new(start_of_history());
    engine.rebuild(&load.activities);
    assert_eq!(engine.statistics().total_activities, 1);
    assert_eq!(engine.statistics().total_distance_m, 7000.0);
}

#[test]
fn test_delete_then_rebuild_repairs_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aerotrack.db");
    let mut db = Database::open(&path).unwrap();

    let keep = completed_run(start_of_history(), 3000.0);
    let remove = completed_run(start_of_history() + Duration::days(1), 9000.0);
    db.save(&keep).unwrap();
    db.save(&remove).unwrap();

    let mut engine = StatsEngine::new(start_of_history());
    engine.apply_activity_at(&keep, keep.finalized_at());
    engine.apply_activity_at(&remove, remove.finalized_at());
    assert_eq!(engine.statistics().total_distance_m, 12_000.0);

    // Deletion does not unwind the aggregate; rebuilding over the
    // remaining history does.
    db.delete(remove.id).unwrap();
    let load = db.load_all().unwrap();
    engine.rebuild(&load.activities);

    assert_eq!(engine.statistics().total_activities, 1);
    assert_eq!(engine.statistics().total_distance_m, 3000.0);
    assert!(engine
        .statistics()
        .record(ActivityType::Running, aerotrack::stats::RecordKind::LongestDistance)
        .map(|r| r.value == 3000.0)
        .unwrap_or(false));
}
