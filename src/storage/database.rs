//! SQLite persistence for activities and the statistics snapshot.

use crate::activity::{Activity, ActivityType, Intensity};
use crate::stats::StatsSnapshot;
use crate::storage::repository::{ActivityLoad, ActivityRepository, RepositoryError};
use crate::storage::schema::SCHEMA;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open the database connection
    #[error("Failed to open database: {0}")]
    ConnectionFailed(String),

    /// Failed to run the schema
    #[error("Failed to initialize schema: {0}")]
    MigrationFailed(String),

    /// A query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A value could not be (de)serialized
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// A stored record could not be decoded
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    IoError(String),
}

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &PathBuf) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { conn };
        db.initialize()?;

        Ok(db)
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(SCHEMA)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Persist the derived-statistics snapshot, replacing any previous one.
    pub fn save_statistics(&mut self, snapshot: &StatsSnapshot) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| DatabaseError::SerializationFailed(e.to_string()))?;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO user_statistics (id, snapshot_json, updated_at)
                 VALUES (1, ?1, ?2)",
                params![json, Utc::now().to_rfc3339()],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    /// Load the persisted statistics snapshot.
    ///
    /// Returns `None` both when no snapshot has been saved yet and when the
    /// stored blob cannot be decoded; callers treat either as "rebuild from
    /// history".
    pub fn load_statistics(&self) -> Result<Option<StatsSnapshot>, DatabaseError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT snapshot_json FROM user_statistics WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        match json {
            None => Ok(None),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(snapshot) => Ok(Some(snapshot)),
                Err(e) => {
                    warn!("Discarding unreadable statistics snapshot: {}", e);
                    Ok(None)
                }
            },
        }
    }

    /// Decode one `activities` row. Any failure here marks the row as
    /// corrupt without affecting its neighbors.
    fn activity_from_row(row: &Row<'_>) -> Result<Activity, DatabaseError> {
        let id_raw: String = get_column(row, "id")?;
        let id = Uuid::parse_str(&id_raw).map_err(|e| {
            DatabaseError::CorruptRecord(format!("bad activity id {:?}: {}", id_raw, e))
        })?;

        let type_raw: String = get_column(row, "activity_type")?;
        let activity_type: ActivityType = enum_from_text(&type_raw)?;
        let intensity_raw: String = get_column(row, "intensity")?;
        let intensity: Intensity = enum_from_text(&intensity_raw)?;

        let started_raw: String = get_column(row, "started_at")?;
        let ended_raw: Option<String> = get_column(row, "ended_at")?;

        let route_json: String = get_column(row, "route_json")?;
        let weather_json: Option<String> = get_column(row, "weather_json")?;
        let achievements_json: String = get_column(row, "achievements_json")?;

        Ok(Activity {
            id,
            activity_type,
            name: get_column(row, "name")?,
            start_time: datetime_from_text(&started_raw)?,
            end_time: ended_raw.as_deref().map(datetime_from_text).transpose()?,
            duration_secs: get_column(row, "duration_seconds")?,
            distance_m: get_column(row, "distance_meters")?,
            calories: get_column(row, "calories")?,
            avg_heart_rate: get_column(row, "avg_heart_rate")?,
            max_heart_rate: get_column(row, "max_heart_rate")?,
            average_speed: get_column(row, "average_speed")?,
            max_speed: get_column(row, "max_speed")?,
            elevation_gain: get_column(row, "elevation_gain")?,
            route: json_from_text(&route_json)?,
            intensity,
            notes: get_column(row, "notes")?,
            weather: weather_json
                .as_deref()
                .map(json_from_text)
                .transpose()?,
            is_completed: get_column(row, "is_completed")?,
            achievements: json_from_text(&achievements_json)?,
        })
    }
}

const SELECT_COLUMNS: &str = "id, activity_type, name, started_at, ended_at, duration_seconds, \
     distance_meters, calories, avg_heart_rate, max_heart_rate, average_speed, max_speed, \
     elevation_gain, route_json, intensity, notes, weather_json, is_completed, achievements_json";

impl ActivityRepository for Database {
    fn save(&mut self, activity: &Activity) -> Result<(), RepositoryError> {
        let route_json = serde_json::to_string(&activity.route)
            .map_err(|e| RepositoryError::SaveFailed(e.to_string()))?;
        let weather_json = activity
            .weather
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::SaveFailed(e.to_string()))?;
        let achievements_json = serde_json::to_string(&activity.achievements)
            .map_err(|e| RepositoryError::SaveFailed(e.to_string()))?;
        let type_text = enum_to_text(&activity.activity_type)
            .map_err(|e| RepositoryError::SaveFailed(e.to_string()))?;
        let intensity_text = enum_to_text(&activity.intensity)
            .map_err(|e| RepositoryError::SaveFailed(e.to_string()))?;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO activities (
                    id, activity_type, name, started_at, ended_at, duration_seconds,
                    distance_meters, calories, avg_heart_rate, max_heart_rate,
                    average_speed, max_speed, elevation_gain, route_json, intensity,
                    notes, weather_json, is_completed, achievements_json, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                          ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
                params![
                    activity.id.to_string(),
                    type_text,
                    activity.name,
                    activity.start_time.to_rfc3339(),
                    activity.end_time.map(|t| t.to_rfc3339()),
                    activity.duration_secs,
                    activity.distance_m,
                    activity.calories,
                    activity.avg_heart_rate,
                    activity.max_heart_rate,
                    activity.average_speed,
                    activity.max_speed,
                    activity.elevation_gain,
                    route_json,
                    intensity_text,
                    activity.notes,
                    weather_json,
                    activity.is_completed,
                    achievements_json,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(|e| RepositoryError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    fn load_all(&self) -> Result<ActivityLoad, RepositoryError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM activities ORDER BY started_at DESC");
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| RepositoryError::LoadFailed(e.to_string()))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| RepositoryError::LoadFailed(e.to_string()))?;

        let mut activities = Vec::new();
        let mut skipped = 0;
        loop {
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => return Err(RepositoryError::LoadFailed(e.to_string())),
            };
            match Self::activity_from_row(row) {
                Ok(activity) => activities.push(activity),
                Err(e) => {
                    warn!("Skipping unreadable activity record: {}", e);
                    skipped += 1;
                }
            }
        }

        Ok(ActivityLoad {
            activities,
            skipped,
        })
    }

    fn load_by_id(&self, id: Uuid) -> Result<Activity, RepositoryError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM activities WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id.to_string()], |row| {
                Ok(Self::activity_from_row(row))
            })
            .optional()
            .map_err(|e| RepositoryError::LoadFailed(e.to_string()))?;

        match row {
            None => Err(RepositoryError::NotFound(id)),
            Some(parsed) => parsed.map_err(|e| RepositoryError::LoadFailed(e.to_string())),
        }
    }

    fn delete(&mut self, id: Uuid) -> Result<(), RepositoryError> {
        let affected = self
            .conn
            .execute(
                "DELETE FROM activities WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| RepositoryError::DeleteFailed(e.to_string()))?;

        if affected == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    fn load_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Activity>, RepositoryError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM activities \
             WHERE started_at >= ?1 AND started_at <= ?2 ORDER BY started_at DESC"
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| RepositoryError::LoadFailed(e.to_string()))?;
        let mut rows = stmt
            .query(params![start.to_rfc3339(), end.to_rfc3339()])
            .map_err(|e| RepositoryError::LoadFailed(e.to_string()))?;

        let mut activities = Vec::new();
        loop {
            let row = match rows.next() {
                Ok(Some(row)) => row,
                Ok(None) => break,
                Err(e) => return Err(RepositoryError::LoadFailed(e.to_string())),
            };
            match Self::activity_from_row(row) {
                Ok(activity) => activities.push(activity),
                Err(e) => warn!("Skipping unreadable activity record: {}", e),
            }
        }

        Ok(activities)
    }
}

fn get_column<T: rusqlite::types::FromSql>(row: &Row<'_>, name: &str) -> Result<T, DatabaseError> {
    row.get(name)
        .map_err(|e| DatabaseError::CorruptRecord(format!("column {}: {}", name, e)))
}

fn json_from_text<T: DeserializeOwned>(raw: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::CorruptRecord(e.to_string()))
}

/// Serialize a string-tagged enum to its bare tag (e.g. `running`).
fn enum_to_text<T: Serialize>(value: &T) -> Result<String, DatabaseError> {
    match serde_json::to_value(value)
        .map_err(|e| DatabaseError::SerializationFailed(e.to_string()))?
    {
        serde_json::Value::String(s) => Ok(s),
        other => Err(DatabaseError::SerializationFailed(format!(
            "expected string tag, got {}",
            other
        ))),
    }
}

fn enum_from_text<T: DeserializeOwned>(raw: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|e| DatabaseError::CorruptRecord(format!("bad tag {:?}: {}", raw, e)))
}

fn datetime_from_text(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::CorruptRecord(format!("bad timestamp {:?}: {}", raw, e)))
}
