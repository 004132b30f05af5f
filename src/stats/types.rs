//! Types for aggregated user statistics.

use crate::activity::ActivityType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Metric tracked as a personal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    LongestDistance,
    LongestDuration,
    FastestPace,
    MostCaloriesBurned,
    HighestElevationGain,
}

impl RecordKind {
    /// Whether a smaller value beats the current record (pace only).
    pub fn lower_is_better(&self) -> bool {
        matches!(self, RecordKind::FastestPace)
    }

    /// Human-readable name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            RecordKind::LongestDistance => "Longest Distance",
            RecordKind::LongestDuration => "Longest Duration",
            RecordKind::FastestPace => "Fastest Pace",
            RecordKind::MostCaloriesBurned => "Most Calories Burned",
            RecordKind::HighestElevationGain => "Highest Elevation Gain",
        }
    }
}

/// Best observed value for one (activity type, record kind) pair.
///
/// Exactly one record per pair exists at any time; it is overwritten in
/// place when beaten, never duplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    /// Activity type the record belongs to
    pub activity_type: ActivityType,
    /// Which metric this record tracks
    pub kind: RecordKind,
    /// Best observed value (meters, seconds, min/km, kcal)
    pub value: f64,
    /// When the record was achieved
    pub achieved_at: DateTime<Utc>,
    /// Activity that achieved it
    pub activity_id: Uuid,
}

/// Cadence a streak is counted over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakType {
    DailyWorkout,
    WeeklyGoal,
    MonthlyChallenge,
    RunningStreak,
}

/// Consecutive-day (or period) activity streak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streak {
    /// Cadence definition
    pub streak_type: StreakType,
    /// Current consecutive count
    pub current_count: u32,
    /// Longest count ever reached
    pub longest_count: u32,
    /// First day of the current streak window
    pub start_date: NaiveDate,
    /// Calendar day of the most recent qualifying activity
    pub last_active: NaiveDate,
    /// Whether the streak is still alive relative to today
    pub is_active: bool,
}

/// Aggregated totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyStats {
    /// Month (1-12)
    pub month: u32,
    /// Year
    pub year: i32,
    /// Number of activities
    pub total_activities: u32,
    /// Total distance in meters
    pub total_distance_m: f64,
    /// Total active duration in seconds
    pub total_duration_secs: u64,
    /// Total estimated calories
    pub total_calories: u64,
}

/// Aggregated totals for one calendar week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyStats {
    /// Number of activities
    pub total_activities: u32,
    /// Total distance in meters
    pub total_distance_m: f64,
    /// Total active duration in seconds
    pub total_duration_secs: u64,
    /// Total estimated calories
    pub total_calories: u64,
    /// Activities per day over the 7-day week
    pub average_workouts_per_day: f64,
    /// Monday of the week
    pub week_start: NaiveDate,
}

/// Per-type activity tally, carrying the order in which counts were last
/// bumped so favorite-type ties break deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeCount {
    /// Activities of this type
    pub count: u32,
    /// Sequence number of the most recent increment
    pub last_bumped: u64,
}

/// Root statistics aggregate for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatistics {
    /// Total number of activities
    pub total_activities: u32,
    /// Total distance in meters
    pub total_distance_m: f64,
    /// Total active duration in seconds
    pub total_duration_secs: u64,
    /// Total estimated calories
    pub total_calories: u64,
    /// Rolling average workouts per week since account creation
    pub average_workouts_per_week: f64,
    /// Current daily-workout streak (mirrored from the streak aggregate)
    pub current_streak: u32,
    /// Longest daily-workout streak ever (mirrored)
    pub longest_streak: u32,
    /// Most frequent activity type
    pub favorite_activity_type: Option<ActivityType>,
    /// Total elevation gain in meters
    pub total_elevation_gain_m: f64,
    /// One record per (activity type, record kind) pair
    pub personal_records: Vec<PersonalRecord>,
    /// Rollups keyed by (month, year)
    pub monthly_stats: Vec<MonthlyStats>,
    /// Account creation date, the denominator of the weekly average
    pub account_created_at: DateTime<Utc>,
    /// Per-type activity counts behind favorite-type inference
    pub type_counts: HashMap<ActivityType, TypeCount>,
    /// Monotonic counter stamping `type_counts` increments
    pub bump_seq: u64,
}

impl UserStatistics {
    /// Create an empty aggregate for an account created at the given time.
    pub fn new(account_created_at: DateTime<Utc>) -> Self {
        Self {
            total_activities: 0,
            total_distance_m: 0.0,
            total_duration_secs: 0,
            total_calories: 0,
            average_workouts_per_week: 0.0,
            current_streak: 0,
            longest_streak: 0,
            favorite_activity_type: None,
            total_elevation_gain_m: 0.0,
            personal_records: Vec::new(),
            monthly_stats: Vec::new(),
            account_created_at,
            type_counts: HashMap::new(),
            bump_seq: 0,
        }
    }

    /// Find the record for a (type, kind) pair.
    pub fn record(
        &self,
        activity_type: ActivityType,
        kind: RecordKind,
    ) -> Option<&PersonalRecord> {
        self.personal_records
            .iter()
            .find(|r| r.activity_type == activity_type && r.kind == kind)
    }
}

/// Serializable snapshot of the whole derived-state aggregate, used for
/// persistence and for handing immutable copies to readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Root statistics aggregate
    pub statistics: UserStatistics,
    /// All streak aggregates
    pub streaks: Vec<Streak>,
}
