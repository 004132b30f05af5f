//! Persistence: the activity repository contract and its SQLite backend.

pub mod database;
pub mod repository;
pub mod schema;

pub use database::{Database, DatabaseError};
pub use repository::{ActivityLoad, ActivityRepository, RepositoryError};
