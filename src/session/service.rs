//! Async session service: a single task that owns the tracker.
//!
//! The per-second clock tick and the incoming fix stream are two
//! independent event sources that both mutate the live session. The
//! service serializes them by construction: one tokio task owns the
//! [`SessionTracker`] and processes ticks, fixes, and commands in arrival
//! order. Readers observe the session only through immutable
//! [`LiveSnapshot`] values on a watch channel.
//!
//! Persisting a finalized activity and updating the statistics aggregate
//! are dispatched to a separate task (`spawn_blocking` around the
//! repository), so a slow save never stalls the tick path or a subsequent
//! start.

use crate::activity::{Activity, ActivityType, LocationPoint};
use crate::session::tracker::{LiveSnapshot, SessionTracker, TrackerConfig};
use crate::stats::StatsEngine;
use crate::storage::ActivityRepository;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

/// Events emitted by a geolocation stream adapter.
#[derive(Debug, Clone)]
pub enum GeoEvent {
    /// A position fix
    Fix(LocationPoint),
    /// A stream failure; non-fatal, the session keeps tracking duration
    Error(String),
}

/// Commands accepted by the session service.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Begin tracking a new session of the given type
    Start(ActivityType),
    /// Freeze the duration clock and ignore fixes
    Pause,
    /// Re-arm the clock after a pause
    Resume,
    /// Finalize the session, persist it, and update statistics
    Stop,
}

/// Notifications reported back to observers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session was finalized; persistence is still in flight
    Completed(Box<Activity>),
    /// The finalized activity was saved and aggregated
    Saved { activity_id: Uuid },
    /// Persistence or aggregation failed; in-memory state is not rolled back
    SaveFailed { activity_id: Uuid, error: String },
    /// The geolocation stream reported an error
    StreamError(String),
    /// Stop was requested with no session in progress
    NothingToStop,
}

/// Handle for controlling a running session service.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshot: watch::Receiver<LiveSnapshot>,
}

impl SessionHandle {
    /// Start a new session.
    pub async fn start(&self, activity_type: ActivityType) {
        let _ = self.commands.send(SessionCommand::Start(activity_type)).await;
    }

    /// Pause the current session.
    pub async fn pause(&self) {
        let _ = self.commands.send(SessionCommand::Pause).await;
    }

    /// Resume a paused session.
    pub async fn resume(&self) {
        let _ = self.commands.send(SessionCommand::Resume).await;
    }

    /// Stop the current session.
    pub async fn stop(&self) {
        let _ = self.commands.send(SessionCommand::Stop).await;
    }

    /// Get the most recent live snapshot.
    pub fn snapshot(&self) -> LiveSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot updates.
    pub fn watch(&self) -> watch::Receiver<LiveSnapshot> {
        self.snapshot.clone()
    }
}

/// Owns the session event loop.
pub struct SessionService;

impl SessionService {
    /// Spawn the service task.
    ///
    /// `fixes` is the geolocation stream adapter's outbound channel. The
    /// returned receiver carries [`SessionEvent`] notifications; dropping
    /// the handle's command channel shuts the loop down.
    pub fn spawn<R>(
        config: TrackerConfig,
        repository: Arc<Mutex<R>>,
        stats: Arc<Mutex<StatsEngine>>,
        fixes: mpsc::Receiver<GeoEvent>,
    ) -> (SessionHandle, mpsc::Receiver<SessionEvent>)
    where
        R: ActivityRepository + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(config.channel_capacity);
        let (event_tx, event_rx) = mpsc::channel(config.channel_capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(LiveSnapshot::default());

        tokio::spawn(run_loop(
            config,
            repository,
            stats,
            fixes,
            command_rx,
            event_tx,
            snapshot_tx,
        ));

        (
            SessionHandle {
                commands: command_tx,
                snapshot: snapshot_rx,
            },
            event_rx,
        )
    }
}

async fn run_loop<R>(
    config: TrackerConfig,
    repository: Arc<Mutex<R>>,
    stats: Arc<Mutex<StatsEngine>>,
    mut fixes: mpsc::Receiver<GeoEvent>,
    mut commands: mpsc::Receiver<SessionCommand>,
    event_tx: mpsc::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<LiveSnapshot>,
) where
    R: ActivityRepository + Send + 'static,
{
    let mut tracker = SessionTracker::new(config.clone());
    let mut interval = tokio::time::interval(config.tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut fixes_open = true;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                tracker.tick(Utc::now());
                let _ = snapshot_tx.send(tracker.snapshot());
            }
            geo = fixes.recv(), if fixes_open => {
                match geo {
                    Some(GeoEvent::Fix(point)) => {
                        tracker.ingest_fix(point);
                        let _ = snapshot_tx.send(tracker.snapshot());
                    }
                    Some(GeoEvent::Error(message)) => {
                        tracker.report_stream_error(message.clone());
                        let _ = event_tx.send(SessionEvent::StreamError(message)).await;
                        let _ = snapshot_tx.send(tracker.snapshot());
                    }
                    None => {
                        tracing::debug!("fix stream closed");
                        fixes_open = false;
                    }
                }
            }
            command = commands.recv() => {
                match command {
                    Some(SessionCommand::Start(activity_type)) => {
                        tracker.start(activity_type, Utc::now());
                    }
                    Some(SessionCommand::Pause) => tracker.pause(Utc::now()),
                    Some(SessionCommand::Resume) => tracker.resume(Utc::now()),
                    Some(SessionCommand::Stop) => {
                        match tracker.stop(Utc::now()) {
                            Some(activity) => {
                                let _ = event_tx
                                    .send(SessionEvent::Completed(Box::new(activity.clone())))
                                    .await;
                                tokio::spawn(persist_activity(
                                    activity,
                                    repository.clone(),
                                    stats.clone(),
                                    event_tx.clone(),
                                ));
                            }
                            None => {
                                let _ = event_tx.send(SessionEvent::NothingToStop).await;
                            }
                        }
                    }
                    None => break,
                }
                let _ = snapshot_tx.send(tracker.snapshot());
            }
        }
    }

    tracing::debug!("session service stopped");
}

/// Save a finalized activity and fold it into the statistics aggregate.
///
/// Statistics are applied exactly once per finalized activity; the
/// repository save and the aggregate update run off the tick path.
async fn persist_activity<R>(
    activity: Activity,
    repository: Arc<Mutex<R>>,
    stats: Arc<Mutex<StatsEngine>>,
    event_tx: mpsc::Sender<SessionEvent>,
) where
    R: ActivityRepository + Send + 'static,
{
    let activity_id = activity.id;

    let result = tokio::task::spawn_blocking(move || {
        {
            let mut repo = repository
                .lock()
                .map_err(|_| "repository lock poisoned".to_string())?;
            repo.save(&activity).map_err(|e| e.to_string())?;
        }

        let mut engine = stats
            .lock()
            .map_err(|_| "statistics lock poisoned".to_string())?;
        engine.apply_activity(&activity);
        Ok::<(), String>(())
    })
    .await;

    let event = match result {
        Ok(Ok(())) => SessionEvent::Saved { activity_id },
        Ok(Err(error)) => {
            tracing::error!(%activity_id, %error, "failed to persist activity");
            SessionEvent::SaveFailed { activity_id, error }
        }
        Err(join_error) => {
            let error = join_error.to_string();
            tracing::error!(%activity_id, %error, "persistence task panicked");
            SessionEvent::SaveFailed { activity_id, error }
        }
    };
    let _ = event_tx.send(event).await;
}
