//! Derived statistics: personal records, streaks, rollups, and totals.

pub mod engine;
pub mod report;
pub mod types;

pub use engine::StatsEngine;
pub use report::{monthly_summary, weekly_summary};
pub use types::{
    MonthlyStats, PersonalRecord, RecordKind, StatsSnapshot, Streak, StreakType, UserStatistics,
    WeeklyStats,
};
