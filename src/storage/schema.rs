//! Database schema definitions.

/// SQL schema for creating all tables.
pub const SCHEMA: &str = r#"
-- Activities table
CREATE TABLE IF NOT EXISTS activities (
    id TEXT PRIMARY KEY,
    activity_type TEXT NOT NULL,
    name TEXT NOT NULL,
    started_at TEXT NOT NULL,
    ended_at TEXT,
    duration_seconds INTEGER NOT NULL,
    distance_meters REAL NOT NULL,
    calories INTEGER NOT NULL,
    avg_heart_rate INTEGER,
    max_heart_rate INTEGER,
    average_speed REAL NOT NULL,
    max_speed REAL NOT NULL,
    elevation_gain REAL,
    route_json TEXT NOT NULL,
    intensity TEXT NOT NULL,
    notes TEXT,
    weather_json TEXT,
    is_completed INTEGER NOT NULL,
    achievements_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activities_started_at ON activities(started_at);

-- Single-row snapshot of the derived statistics aggregate
CREATE TABLE IF NOT EXISTS user_statistics (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    snapshot_json TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
