//! Intensity classification and achievement detection.
//!
//! Both entry points are pure functions over a finalized activity: calling
//! them any number of times yields the same result. Per-type constants live
//! in a single lookup table rather than being scattered across branches.

use crate::activity::{Achievement, AchievementCategory, Activity, ActivityType, Intensity};

/// Speed/duration thresholds for intensity classification.
#[derive(Debug, Clone, Copy)]
pub struct IntensityThresholds {
    /// Average speed (km/h) above which the activity is High intensity
    pub high_speed_kmh: f64,
    /// Duration (minutes) above which the activity is High intensity
    pub high_duration_min: f64,
    /// Average speed (km/h) above which the activity is Moderate intensity
    pub moderate_speed_kmh: f64,
    /// Duration (minutes) above which the activity is Moderate intensity
    pub moderate_duration_min: f64,
}

/// Per-activity-type constants used by the tracker and classifier.
#[derive(Debug, Clone, Copy)]
pub struct TypeProfile {
    /// Flat calorie burn rate in kcal per active minute. An approximation,
    /// not a physiological model.
    pub calories_per_minute: f64,
    /// Speed-aware thresholds; types without them classify on duration alone.
    pub thresholds: Option<IntensityThresholds>,
}

/// Look up the profile for an activity type.
pub fn profile(activity_type: ActivityType) -> TypeProfile {
    match activity_type {
        ActivityType::Running => TypeProfile {
            calories_per_minute: 12.0,
            thresholds: Some(IntensityThresholds {
                high_speed_kmh: 12.0,
                high_duration_min: 60.0,
                moderate_speed_kmh: 8.0,
                moderate_duration_min: 30.0,
            }),
        },
        ActivityType::Cycling => TypeProfile {
            calories_per_minute: 8.0,
            thresholds: Some(IntensityThresholds {
                high_speed_kmh: 25.0,
                high_duration_min: 90.0,
                moderate_speed_kmh: 15.0,
                moderate_duration_min: 45.0,
            }),
        },
        ActivityType::Walking => TypeProfile {
            calories_per_minute: 4.0,
            thresholds: None,
        },
        ActivityType::Swimming => TypeProfile {
            calories_per_minute: 11.0,
            thresholds: None,
        },
        ActivityType::Hiking => TypeProfile {
            calories_per_minute: 6.0,
            thresholds: None,
        },
        ActivityType::Yoga => TypeProfile {
            calories_per_minute: 3.0,
            thresholds: None,
        },
        ActivityType::Gym => TypeProfile {
            calories_per_minute: 8.0,
            thresholds: None,
        },
        ActivityType::Basketball | ActivityType::Football | ActivityType::Tennis
        | ActivityType::Other => TypeProfile {
            calories_per_minute: 6.0,
            thresholds: None,
        },
    }
}

/// Calorie burn rate in kcal per active minute for an activity type.
pub fn calorie_rate(activity_type: ActivityType) -> f64 {
    profile(activity_type).calories_per_minute
}

/// Classify the intensity of a finalized activity.
///
/// Types without speed thresholds classify on duration alone: >60 min is
/// High, >30 min is Moderate. `Intensity::Extreme` is never returned.
pub fn classify_intensity(activity: &Activity) -> Intensity {
    let duration_min = activity.duration_secs as f64 / 60.0;
    let avg_speed_kmh = activity.average_speed * 3.6;

    match profile(activity.activity_type).thresholds {
        Some(t) => {
            if avg_speed_kmh > t.high_speed_kmh || duration_min > t.high_duration_min {
                Intensity::High
            } else if avg_speed_kmh > t.moderate_speed_kmh
                || duration_min > t.moderate_duration_min
            {
                Intensity::Moderate
            } else {
                Intensity::Low
            }
        }
        None => {
            if duration_min > 60.0 {
                Intensity::High
            } else if duration_min > 30.0 {
                Intensity::Moderate
            } else {
                Intensity::Low
            }
        }
    }
}

/// Distance needed for the 5K achievement, in meters.
const FIVE_K_METERS: f64 = 5000.0;
/// Distance needed for the 10K achievement, in meters.
const TEN_K_METERS: f64 = 10_000.0;
/// Duration needed for the endurance achievement, in seconds.
const ENDURANCE_SECONDS: u32 = 3600;

/// Detect milestone achievements unlocked by a finalized activity.
///
/// The 5K and 10K achievements are not mutually exclusive; a 10 km run
/// earns both. Earned timestamps come from the activity's finalize time,
/// so detection is idempotent.
pub fn detect_achievements(activity: &Activity) -> Vec<Achievement> {
    let earned_at = activity.finalized_at();
    let mut achievements = Vec::new();

    if activity.distance_m >= FIVE_K_METERS {
        achievements.push(Achievement {
            title: "5K Runner".to_string(),
            description: "Completed your first 5km activity".to_string(),
            icon: "figure.run".to_string(),
            earned_at,
            category: AchievementCategory::Distance,
        });
    }

    if activity.distance_m >= TEN_K_METERS {
        achievements.push(Achievement {
            title: "10K Champion".to_string(),
            description: "Conquered the 10km distance".to_string(),
            icon: "rosette".to_string(),
            earned_at,
            category: AchievementCategory::Distance,
        });
    }

    if activity.duration_secs >= ENDURANCE_SECONDS {
        achievements.push(Achievement {
            title: "Endurance Warrior".to_string(),
            description: "Completed 1 hour of continuous activity".to_string(),
            icon: "timer".to_string(),
            earned_at,
            category: AchievementCategory::Duration,
        });
    }

    achievements
}
