//! Activity repository contract.
//!
//! The tracking core depends on persistence only through this trait.
//! Every failure is a typed error naming the attempted operation; nothing
//! here panics, and a corrupt stored record never fails a whole load.

use crate::activity::Activity;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Result of loading the full history.
#[derive(Debug, Clone)]
pub struct ActivityLoad {
    /// Successfully decoded activities, newest start time first
    pub activities: Vec<Activity>,
    /// Number of stored records skipped because they could not be decoded
    pub skipped: usize,
}

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Failed to save an activity
    #[error("Failed to save activity: {0}")]
    SaveFailed(String),

    /// Failed to load activities
    #[error("Failed to load activities: {0}")]
    LoadFailed(String),

    /// Failed to delete an activity
    #[error("Failed to delete activity: {0}")]
    DeleteFailed(String),

    /// No activity with the given id exists
    #[error("Activity not found: {0}")]
    NotFound(Uuid),
}

/// Abstract store for finalized activities.
pub trait ActivityRepository {
    /// Upsert an activity by id.
    fn save(&mut self, activity: &Activity) -> Result<(), RepositoryError>;

    /// Load the full history, newest start time first. Individually
    /// corrupt records are skipped and counted, not fatal.
    fn load_all(&self) -> Result<ActivityLoad, RepositoryError>;

    /// Load one activity by id.
    fn load_by_id(&self, id: Uuid) -> Result<Activity, RepositoryError>;

    /// Delete an activity by id.
    fn delete(&mut self, id: Uuid) -> Result<(), RepositoryError>;

    /// Load activities whose start time falls within `[start, end]`.
    fn load_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Activity>, RepositoryError>;
}
