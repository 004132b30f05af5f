//! Aerotrack - Activity Tracking & Statistics Engine
//!
//! Core library for a personal fitness tracker: a live workout session
//! driven by a stream of GPS fixes, activity classification (calories,
//! intensity, achievements), incremental statistics aggregation, and
//! SQLite persistence.

pub mod activity;
pub mod classify;
pub mod session;
pub mod stats;
pub mod storage;

// Re-export commonly used types
pub use activity::{Activity, ActivityType, Intensity, LocationPoint};
pub use session::{SessionHandle, SessionService, SessionTracker, TrackerConfig};
pub use stats::StatsEngine;
pub use storage::{ActivityRepository, Database};
