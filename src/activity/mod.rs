//! Activity data model: workout records, route points, and achievements.

pub mod types;

pub use types::{
    Achievement, AchievementCategory, Activity, ActivityType, Intensity, LocationPoint,
    WeatherSnapshot,
};
