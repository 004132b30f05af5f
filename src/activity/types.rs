//! Core types for recorded workout activities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of workout being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Running,
    Cycling,
    Walking,
    Swimming,
    Hiking,
    Yoga,
    Gym,
    Basketball,
    Football,
    Tennis,
    Other,
}

impl ActivityType {
    /// All known activity types.
    pub const ALL: [ActivityType; 11] = [
        ActivityType::Running,
        ActivityType::Cycling,
        ActivityType::Walking,
        ActivityType::Swimming,
        ActivityType::Hiking,
        ActivityType::Yoga,
        ActivityType::Gym,
        ActivityType::Basketball,
        ActivityType::Football,
        ActivityType::Tennis,
        ActivityType::Other,
    ];

    /// Human-readable name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            ActivityType::Running => "Running",
            ActivityType::Cycling => "Cycling",
            ActivityType::Walking => "Walking",
            ActivityType::Swimming => "Swimming",
            ActivityType::Hiking => "Hiking",
            ActivityType::Yoga => "Yoga",
            ActivityType::Gym => "Gym Workout",
            ActivityType::Basketball => "Basketball",
            ActivityType::Football => "Football",
            ActivityType::Tennis => "Tennis",
            ActivityType::Other => "Other",
        }
    }

    /// Icon identifier used by presentation layers.
    pub fn icon(&self) -> &'static str {
        match self {
            ActivityType::Running => "figure.run",
            ActivityType::Cycling => "bicycle",
            ActivityType::Walking => "figure.walk",
            ActivityType::Swimming => "figure.pool.swim",
            ActivityType::Hiking => "figure.hiking",
            ActivityType::Yoga => "figure.yoga",
            ActivityType::Gym => "dumbbell",
            ActivityType::Basketball => "basketball",
            ActivityType::Football => "football",
            ActivityType::Tennis => "tennisball",
            ActivityType::Other => "figure.strengthtraining.traditional",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Effort bucket assigned to a finalized activity.
///
/// `Extreme` exists for manual tagging and future use; the built-in
/// classifier never produces it (see `classify::classify_intensity`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Moderate,
    High,
    Extreme,
}

impl Intensity {
    /// Human-readable name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            Intensity::Low => "Low",
            Intensity::Moderate => "Moderate",
            Intensity::High => "High",
            Intensity::Extreme => "Extreme",
        }
    }
}

/// One GPS fix within an activity's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// When the fix was taken
    pub timestamp: DateTime<Utc>,
    /// Altitude above sea level in meters
    pub altitude: Option<f64>,
    /// Instantaneous speed in m/s
    pub speed: Option<f64>,
    /// Heart rate in BPM, if a monitor was paired
    pub heart_rate: Option<u8>,
}

/// Weather conditions captured at activity start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Temperature in Celsius
    pub temperature_c: f64,
    /// Relative humidity percentage
    pub humidity_pct: f64,
    /// Wind speed in m/s
    pub wind_speed_ms: f64,
    /// Condition description (e.g. "Clear")
    pub condition: String,
    /// Icon identifier
    pub icon: String,
}

/// Category of an unlocked achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Distance,
    Duration,
    Speed,
    Consistency,
    Milestone,
}

/// A milestone unlocked by a finalized activity.
///
/// Carries no random identity so that re-running detection over the same
/// activity yields an identical set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    /// Display title
    pub title: String,
    /// Description of what was accomplished
    pub description: String,
    /// Icon identifier
    pub icon: String,
    /// When the achievement was earned (the activity's finalize time)
    pub earned_at: DateTime<Utc>,
    /// Achievement category
    pub category: AchievementCategory,
}

/// A completed or in-progress workout activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier
    pub id: Uuid,
    /// Kind of workout
    pub activity_type: ActivityType,
    /// Display name
    pub name: String,
    /// When the session started
    pub start_time: DateTime<Utc>,
    /// When the session ended; set on finalize
    pub end_time: Option<DateTime<Utc>>,
    /// Active duration in seconds (paused time excluded)
    pub duration_secs: u32,
    /// Total distance in meters
    pub distance_m: f64,
    /// Estimated calories burned
    pub calories: u32,
    /// Average heart rate in BPM
    pub avg_heart_rate: Option<u8>,
    /// Maximum heart rate in BPM
    pub max_heart_rate: Option<u8>,
    /// Average speed in m/s (distance / duration, 0 when duration is 0)
    pub average_speed: f64,
    /// Maximum instantaneous speed in m/s
    pub max_speed: f64,
    /// Cumulative elevation gain in meters
    pub elevation_gain: Option<f64>,
    /// Route points ordered by non-decreasing timestamp
    pub route: Vec<LocationPoint>,
    /// Effort bucket
    pub intensity: Intensity,
    /// Free-text notes
    pub notes: Option<String>,
    /// Weather at the start of the session
    pub weather: Option<WeatherSnapshot>,
    /// Whether the session has been finalized
    pub is_completed: bool,
    /// Achievements unlocked by this activity
    pub achievements: Vec<Achievement>,
}

impl Activity {
    /// Create a provisional (not yet completed) activity for a new session.
    pub fn new(activity_type: ActivityType, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            activity_type,
            name: default_session_name(activity_type, start_time),
            start_time,
            end_time: None,
            duration_secs: 0,
            distance_m: 0.0,
            calories: 0,
            avg_heart_rate: None,
            max_heart_rate: None,
            average_speed: 0.0,
            max_speed: 0.0,
            elevation_gain: None,
            route: Vec::new(),
            intensity: Intensity::Moderate,
            notes: None,
            weather: None,
            is_completed: false,
            achievements: Vec::new(),
        }
    }

    /// Pace in minutes per kilometer, `None` when no distance was covered.
    pub fn pace_min_per_km(&self) -> Option<f64> {
        if self.distance_m > 0.0 && self.duration_secs > 0 {
            Some((self.duration_secs as f64 / 60.0) / (self.distance_m / 1000.0))
        } else {
            None
        }
    }

    /// The time at which the activity was finalized, falling back to the
    /// start time for activities that never completed.
    pub fn finalized_at(&self) -> DateTime<Utc> {
        self.end_time.unwrap_or(self.start_time)
    }

    /// Duration formatted as `h:mm:ss` or `m:ss`.
    pub fn formatted_duration(&self) -> String {
        let hours = self.duration_secs / 3600;
        let minutes = (self.duration_secs % 3600) / 60;
        let seconds = self.duration_secs % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{}:{:02}", minutes, seconds)
        }
    }

    /// Distance formatted in kilometers above 1 km, meters below.
    pub fn formatted_distance(&self) -> String {
        if self.distance_m >= 1000.0 {
            format!("{:.2} km", self.distance_m / 1000.0)
        } else {
            format!("{:.0} m", self.distance_m)
        }
    }

    /// Average speed formatted in km/h.
    pub fn formatted_speed(&self) -> String {
        format!("{:.1} km/h", self.average_speed * 3.6)
    }
}

/// Default display name for a session, e.g. "Running - Aug 29 at 7:05 AM".
pub fn default_session_name(activity_type: ActivityType, start: DateTime<Utc>) -> String {
    format!(
        "{} - {} at {}",
        activity_type.display_name(),
        start.format("%b %-d"),
        start.format("%-I:%M %p")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formatted_duration() {
        let mut activity = Activity::new(ActivityType::Running, Utc::now());
        activity.duration_secs = 125;
        assert_eq!(activity.formatted_duration(), "2:05");

        activity.duration_secs = 3661;
        assert_eq!(activity.formatted_duration(), "1:01:01");
    }

    #[test]
    fn test_formatted_distance() {
        let mut activity = Activity::new(ActivityType::Cycling, Utc::now());
        activity.distance_m = 999.0;
        assert_eq!(activity.formatted_distance(), "999 m");

        activity.distance_m = 12_345.0;
        assert_eq!(activity.formatted_distance(), "12.35 km");
    }

    #[test]
    fn test_pace_undefined_without_distance() {
        let mut activity = Activity::new(ActivityType::Running, Utc::now());
        activity.duration_secs = 600;
        assert_eq!(activity.pace_min_per_km(), None);

        // 5 km in 25 minutes = 5 min/km
        activity.distance_m = 5000.0;
        activity.duration_secs = 1500;
        let pace = activity.pace_min_per_km().unwrap();
        assert!((pace - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_session_name() {
        let start = Utc.with_ymd_and_hms(2025, 8, 4, 7, 5, 0).unwrap();
        let name = default_session_name(ActivityType::Running, start);
        assert_eq!(name, "Running - Aug 4 at 7:05 AM");
    }

    #[test]
    fn test_provisional_activity_is_not_completed() {
        let activity = Activity::new(ActivityType::Yoga, Utc::now());
        assert!(!activity.is_completed);
        assert!(activity.end_time.is_none());
        assert_eq!(activity.duration_secs, 0);
        assert_eq!(activity.distance_m, 0.0);
    }

    #[test]
    fn test_activity_type_roundtrip() {
        for t in ActivityType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            let back: ActivityType = serde_json::from_str(&json).unwrap();
            assert_eq!(t, back);
        }
    }
}
