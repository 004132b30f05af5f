//! Session tracker: the state machine for one live workout.

use crate::activity::{Activity, ActivityType, LocationPoint};
use crate::classify;
use crate::session::geo::haversine_distance;
use chrono::{DateTime, Utc};

/// State of the session tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session in progress
    #[default]
    Idle,
    /// Actively tracking
    Tracking,
    /// Tracking suspended; the duration clock is frozen
    Paused,
}

/// Configuration for session tracking.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Fixes closer than this to the last accepted fix are treated as GPS
    /// jitter and rejected
    pub min_fix_distance_m: f64,
    /// Clock tick interval driving duration/calorie updates
    pub tick_interval: std::time::Duration,
    /// Capacity of the fix and command channels feeding the service loop
    pub channel_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_fix_distance_m: 5.0,
            tick_interval: std::time::Duration::from_secs(1),
            channel_capacity: 64,
        }
    }
}

/// Live metrics published while a session is in progress.
#[derive(Debug, Clone, Default)]
pub struct LiveSnapshot {
    /// Current tracker state
    pub state: SessionState,
    /// Type of the activity being tracked
    pub activity_type: Option<ActivityType>,
    /// Active duration in seconds (paused time excluded)
    pub duration_secs: u32,
    /// Accumulated distance in meters
    pub distance_m: f64,
    /// Pace in minutes per kilometer; `None` until distance is covered
    pub pace_min_per_km: Option<f64>,
    /// Average speed in m/s over the active duration
    pub speed_ms: f64,
    /// Estimated calories burned
    pub calories: u32,
    /// Cumulative elevation gain in meters
    pub elevation_gain_m: f64,
    /// Maximum instantaneous speed seen so far in m/s
    pub max_speed_ms: f64,
    /// Number of accepted route points
    pub route_points: usize,
    /// Most recent geolocation stream error, if any
    pub last_stream_error: Option<String>,
}

/// Tracks one live workout from start to stop, producing a finalized
/// [`Activity`].
///
/// All operations take explicit timestamps so the state machine is
/// deterministic under test; the service loop supplies wall-clock time.
/// Invalid transitions are silent no-ops: a second `start` while tracking
/// must never corrupt the session in progress.
pub struct SessionTracker {
    config: TrackerConfig,
    state: SessionState,
    /// Provisional activity owned exclusively by the tracker until stop
    activity: Option<Activity>,
    /// When the current tracking segment began
    segment_started_at: Option<DateTime<Utc>>,
    /// Active seconds accumulated over completed segments
    active_secs: f64,
    distance_m: f64,
    elevation_gain_m: f64,
    max_speed_ms: f64,
    /// Last accepted fix, used for distance and elevation deltas
    last_accepted: Option<LocationPoint>,
    /// Timestamp of the newest fix seen, accepted or not; enforces
    /// non-decreasing fix order
    last_fix_at: Option<DateTime<Utc>>,
    snapshot: LiveSnapshot,
}

impl SessionTracker {
    /// Create a tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            activity: None,
            segment_started_at: None,
            active_secs: 0.0,
            distance_m: 0.0,
            elevation_gain_m: 0.0,
            max_speed_ms: 0.0,
            last_accepted: None,
            last_fix_at: None,
            snapshot: LiveSnapshot::default(),
        }
    }

    /// Create a tracker with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TrackerConfig::default())
    }

    /// Get the current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get a copy of the live metrics.
    pub fn snapshot(&self) -> LiveSnapshot {
        self.snapshot.clone()
    }

    /// Start a new session. No-op if a session is already in progress.
    pub fn start(&mut self, activity_type: ActivityType, now: DateTime<Utc>) {
        if self.state != SessionState::Idle {
            tracing::warn!("start ignored: session already in progress");
            return;
        }

        self.activity = Some(Activity::new(activity_type, now));
        self.segment_started_at = Some(now);
        self.active_secs = 0.0;
        self.distance_m = 0.0;
        self.elevation_gain_m = 0.0;
        self.max_speed_ms = 0.0;
        self.last_accepted = None;
        self.last_fix_at = None;
        self.snapshot = LiveSnapshot {
            state: SessionState::Tracking,
            activity_type: Some(activity_type),
            ..LiveSnapshot::default()
        };
        self.state = SessionState::Tracking;

        tracing::info!(activity_type = %activity_type, "started session");
    }

    /// Pause the session, freezing the duration clock. No-op unless tracking.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.state != SessionState::Tracking {
            tracing::warn!("pause ignored: not tracking");
            return;
        }

        if let Some(segment_start) = self.segment_started_at.take() {
            self.active_secs += seconds_between(segment_start, now);
        }
        self.state = SessionState::Paused;
        self.snapshot.state = SessionState::Paused;

        tracing::info!("paused session");
    }

    /// Resume a paused session. No-op unless paused.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.state != SessionState::Paused {
            tracing::warn!("resume ignored: not paused");
            return;
        }

        self.segment_started_at = Some(now);
        self.state = SessionState::Tracking;
        self.snapshot.state = SessionState::Tracking;

        tracing::info!("resumed session");
    }

    /// Advance the duration clock. Called once per tick interval; ignored
    /// unless tracking.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if self.state != SessionState::Tracking {
            return;
        }

        let duration = self.active_duration(now);
        let activity_type = match self.activity.as_ref() {
            Some(activity) => activity.activity_type,
            None => return,
        };

        self.snapshot.duration_secs = duration as u32;
        self.snapshot.calories =
            ((duration / 60.0) * classify::calorie_rate(activity_type)) as u32;

        if self.distance_m > 0.0 && duration > 0.0 {
            self.snapshot.speed_ms = self.distance_m / duration;
            self.snapshot.pace_min_per_km =
                Some((duration / 60.0) / (self.distance_m / 1000.0));
        } else {
            self.snapshot.speed_ms = 0.0;
            self.snapshot.pace_min_per_km = None;
        }
    }

    /// Ingest one GPS fix.
    ///
    /// Fixes are dropped while paused or idle, dropped when their timestamp
    /// does not advance past the newest fix seen, and rejected as jitter
    /// when they move less than the configured noise-gate distance from the
    /// last accepted fix. Rejected fixes never change distance or elevation.
    pub fn ingest_fix(&mut self, fix: LocationPoint) {
        if self.state != SessionState::Tracking {
            tracing::debug!("fix dropped: not tracking");
            return;
        }

        // Out-of-order or duplicate timestamps are dropped, not reordered.
        if let Some(last_at) = self.last_fix_at {
            if fix.timestamp <= last_at {
                tracing::debug!("fix dropped: timestamp not advancing");
                return;
            }
        }
        self.last_fix_at = Some(fix.timestamp);

        if let Some(speed) = fix.speed {
            if speed > self.max_speed_ms {
                self.max_speed_ms = speed;
                self.snapshot.max_speed_ms = speed;
            }
        }

        if let Some(prev) = &self.last_accepted {
            let delta_m = haversine_distance(
                prev.latitude,
                prev.longitude,
                fix.latitude,
                fix.longitude,
            );

            if delta_m < self.config.min_fix_distance_m {
                return;
            }

            self.distance_m += delta_m;

            if let (Some(prev_alt), Some(alt)) = (prev.altitude, fix.altitude) {
                if alt > prev_alt {
                    self.elevation_gain_m += alt - prev_alt;
                }
            }
        }

        if let Some(activity) = self.activity.as_mut() {
            activity.route.push(fix.clone());
        }
        self.last_accepted = Some(fix);

        self.snapshot.distance_m = self.distance_m;
        self.snapshot.elevation_gain_m = self.elevation_gain_m;
        self.snapshot.route_points += 1;
    }

    /// Record a geolocation stream failure.
    ///
    /// The error is surfaced through the snapshot; the session keeps
    /// tracking elapsed duration from the clock, with distance and route
    /// simply frozen until fixes resume.
    pub fn report_stream_error(&mut self, message: String) {
        tracing::warn!(error = %message, "geolocation stream error");
        self.snapshot.last_stream_error = Some(message);
    }

    /// Stop the session and return the finalized activity.
    ///
    /// Returns `None` when no session is in progress (nothing to stop).
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<Activity> {
        if self.state == SessionState::Idle {
            tracing::warn!("stop ignored: no session in progress");
            return None;
        }

        if let Some(segment_start) = self.segment_started_at.take() {
            self.active_secs += seconds_between(segment_start, now);
        }

        let mut activity = self.activity.take()?;
        let duration_secs = self.active_secs.round() as u32;

        activity.end_time = Some(now);
        activity.duration_secs = duration_secs;
        activity.distance_m = self.distance_m;
        activity.calories =
            ((self.active_secs / 60.0) * classify::calorie_rate(activity.activity_type)) as u32;
        activity.average_speed = if duration_secs > 0 {
            self.distance_m / duration_secs as f64
        } else {
            0.0
        };
        activity.max_speed = self.max_speed_ms;
        activity.elevation_gain = Some(self.elevation_gain_m);

        let heart_rates: Vec<u8> = activity.route.iter().filter_map(|p| p.heart_rate).collect();
        if !heart_rates.is_empty() {
            let sum: u32 = heart_rates.iter().map(|&h| h as u32).sum();
            activity.avg_heart_rate = Some((sum / heart_rates.len() as u32) as u8);
            activity.max_heart_rate = heart_rates.iter().copied().max();
        }

        activity.is_completed = true;
        activity.intensity = classify::classify_intensity(&activity);
        activity.achievements = classify::detect_achievements(&activity);

        self.state = SessionState::Idle;
        self.active_secs = 0.0;
        self.distance_m = 0.0;
        self.elevation_gain_m = 0.0;
        self.max_speed_ms = 0.0;
        self.last_accepted = None;
        self.last_fix_at = None;
        self.snapshot = LiveSnapshot::default();

        tracing::info!(
            activity = %activity.name,
            duration_secs,
            distance_m = activity.distance_m,
            "finalized session"
        );
        Some(activity)
    }

    fn active_duration(&self, now: DateTime<Utc>) -> f64 {
        match self.segment_started_at {
            Some(segment_start) => self.active_secs + seconds_between(segment_start, now),
            None => self.active_secs,
        }
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds().max(0) as f64 / 1000.0
}
