//! Aerotrack demo binary.
//!
//! Runs a short simulated running session against a local SQLite file:
//! start, stream synthetic GPS fixes, stop, wait for persistence, then
//! print the updated statistics.

use aerotrack::session::{geo, GeoEvent, SessionEvent, SessionService, TrackerConfig};
use aerotrack::stats::{weekly_summary, StatsEngine};
use aerotrack::storage::{ActivityRepository, Database};
use aerotrack::ActivityType;
use anyhow::{anyhow, Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Aerotrack v{}", env!("CARGO_PKG_VERSION"));

    let db_path = PathBuf::from("aerotrack.db");
    let database = Database::open(&db_path).context("opening database")?;

    // Restore the statistics aggregate, rebuilding from history when the
    // snapshot is missing or unreadable.
    let load = database
        .load_all()
        .map_err(|e| anyhow!("loading history: {e}"))?;
    if load.skipped > 0 {
        tracing::warn!(skipped = load.skipped, "some stored activities were unreadable");
    }
    tracing::info!(count = load.activities.len(), "loaded activity history");

    let engine = match database.load_statistics().context("loading statistics")? {
        Some(snapshot) => StatsEngine::from_snapshot(snapshot),
        None => {
            let earliest = load
                .activities
                .iter()
                .map(|a| a.start_time)
                .min()
                .unwrap_or_else(Utc::now);
            let mut engine = StatsEngine::new(earliest);
            let mut history = load.activities.clone();
            history.sort_by_key(|a| a.start_time);
            engine.rebuild(&history);
            tracing::info!("rebuilt statistics from history");
            engine
        }
    };

    let repository = Arc::new(Mutex::new(database));
    let stats = Arc::new(Mutex::new(engine));

    let config = TrackerConfig {
        tick_interval: Duration::from_millis(200),
        ..TrackerConfig::default()
    };
    let (fix_tx, fix_rx) = mpsc::channel(config.channel_capacity);
    let (handle, mut events) =
        SessionService::spawn(config, repository.clone(), stats.clone(), fix_rx);

    handle.start(ActivityType::Running).await;
    tracing::info!("session started");

    // Simulated run: fixes ~25 m apart heading due north, 1 km total.
    let origin_lat = 37.3349;
    let origin_lon = -122.0090;
    let base = Utc::now();
    for i in 0..40u32 {
        let point = aerotrack::LocationPoint {
            latitude: geo::offset_latitude(origin_lat, 25.0 * i as f64),
            longitude: origin_lon,
            timestamp: base + ChronoDuration::seconds(i as i64 * 8),
            altitude: Some(12.0 + (i as f64) * 0.5),
            speed: Some(3.1),
            heart_rate: Some(140 + (i % 10) as u8),
        };
        fix_tx
            .send(GeoEvent::Fix(point))
            .await
            .map_err(|_| anyhow!("session service stopped unexpectedly"))?;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let live = handle.snapshot();
    tracing::info!(
        distance_m = live.distance_m,
        duration_secs = live.duration_secs,
        calories = live.calories,
        "live snapshot before stop"
    );

    handle.stop().await;

    // Drain events until persistence settles.
    loop {
        match events.recv().await {
            Some(SessionEvent::Completed(activity)) => {
                tracing::info!(
                    name = %activity.name,
                    distance = %activity.formatted_distance(),
                    duration = %activity.formatted_duration(),
                    intensity = activity.intensity.display_name(),
                    achievements = activity.achievements.len(),
                    "session completed"
                );
            }
            Some(SessionEvent::Saved { activity_id }) => {
                tracing::info!(%activity_id, "activity saved");
                break;
            }
            Some(SessionEvent::SaveFailed { activity_id, error }) => {
                return Err(anyhow!("saving activity {activity_id}: {error}"));
            }
            Some(SessionEvent::StreamError(message)) => {
                tracing::warn!(%message, "geolocation stream error");
            }
            Some(SessionEvent::NothingToStop) => {}
            None => return Err(anyhow!("session service stopped unexpectedly")),
        }
    }

    {
        let engine = stats
            .lock()
            .map_err(|_| anyhow!("statistics lock poisoned"))?;
        let statistics = engine.statistics();
        tracing::info!(
            total_activities = statistics.total_activities,
            total_distance_m = statistics.total_distance_m,
            total_calories = statistics.total_calories,
            current_streak = statistics.current_streak,
            favorite = ?statistics.favorite_activity_type,
            "updated statistics"
        );

        let mut repo = repository
            .lock()
            .map_err(|_| anyhow!("repository lock poisoned"))?;
        repo.save_statistics(&engine.snapshot())
            .context("saving statistics snapshot")?;

        let history = repo
            .load_all()
            .map_err(|e| anyhow!("reloading history: {e}"))?;
        let week = weekly_summary(&history.activities, Utc::now());
        tracing::info!(
            week_start = %week.week_start,
            activities = week.total_activities,
            distance_m = week.total_distance_m,
            "this week"
        );
    }

    Ok(())
}
