//! Live workout session tracking.
//!
//! `SessionTracker` is the synchronous state machine; `SessionService`
//! wraps it in a single tokio task that serializes the clock tick and the
//! incoming GPS fix stream.

pub mod geo;
pub mod service;
pub mod tracker;

pub use service::{GeoEvent, SessionCommand, SessionEvent, SessionHandle, SessionService};
pub use tracker::{LiveSnapshot, SessionState, SessionTracker, TrackerConfig};
