//! # Submission Events
//!
//! Broadcast channel for scrobble submission lifecycle events, so display
//! layers and loggers can follow a batch without polling the orchestrator.

use crate::types::ScrobbleProgress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

/// Events emitted by the orchestrator while a batch moves through its states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrobbleEvent {
    /// A batch is about to be handed to the backend
    SubmissionStarted {
        timestamp: DateTime<Utc>,
        release_id: String,
        /// Number of scrobbles in the batch
        tracks: usize,
    },
    /// The backend accepted the batch and assigned a session
    SessionCreated {
        timestamp: DateTime<Utc>,
        session_id: String,
    },
    /// A poll returned new counters
    Progress {
        timestamp: DateTime<Utc>,
        session_id: String,
        progress: ScrobbleProgress,
    },
    /// The session finished; `progress` is the final result
    Completed {
        timestamp: DateTime<Utc>,
        session_id: String,
        progress: ScrobbleProgress,
    },
    /// Submission or polling failed
    Failed {
        timestamp: DateTime<Utc>,
        session_id: Option<String>,
        message: String,
    },
    /// Polling was abandoned because the view went away
    Cancelled {
        timestamp: DateTime<Utc>,
        session_id: Option<String>,
    },
}

pub type ScrobbleEventReceiver = broadcast::Receiver<ScrobbleEvent>;

/// Event broadcasting state shared between an orchestrator and its observers.
///
/// Keeps the most recent event around so late subscribers can catch up.
#[derive(Clone)]
pub struct SharedEventBroadcaster {
    event_tx: broadcast::Sender<ScrobbleEvent>,
    last_event_tx: watch::Sender<Option<ScrobbleEvent>>,
}

impl SharedEventBroadcaster {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (last_event_tx, _) = watch::channel(None);
        Self {
            event_tx,
            last_event_tx,
        }
    }

    pub fn broadcast_event(&self, event: ScrobbleEvent) {
        let _ = self.event_tx.send(event.clone()); // Ignore send errors (no receivers)
        self.last_event_tx.send_replace(Some(event));
    }

    pub fn subscribe(&self) -> ScrobbleEventReceiver {
        self.event_tx.subscribe()
    }

    pub fn latest_event(&self) -> Option<ScrobbleEvent> {
        self.last_event_tx.borrow().clone()
    }

    pub fn emit_submission_started(&self, release_id: &str, tracks: usize) {
        self.broadcast_event(ScrobbleEvent::SubmissionStarted {
            timestamp: Utc::now(),
            release_id: release_id.to_string(),
            tracks,
        });
    }

    pub fn emit_session_created(&self, session_id: &str) {
        self.broadcast_event(ScrobbleEvent::SessionCreated {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
        });
    }

    pub fn emit_progress(&self, session_id: &str, progress: ScrobbleProgress) {
        self.broadcast_event(ScrobbleEvent::Progress {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            progress,
        });
    }

    pub fn emit_completed(&self, session_id: &str, progress: ScrobbleProgress) {
        self.broadcast_event(ScrobbleEvent::Completed {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            progress,
        });
    }

    pub fn emit_failed(&self, session_id: Option<&str>, message: &str) {
        self.broadcast_event(ScrobbleEvent::Failed {
            timestamp: Utc::now(),
            session_id: session_id.map(str::to_string),
            message: message.to_string(),
        });
    }

    pub fn emit_cancelled(&self, session_id: Option<&str>) {
        self.broadcast_event(ScrobbleEvent::Cancelled {
            timestamp: Utc::now(),
            session_id: session_id.map(str::to_string),
        });
    }
}

impl Default for SharedEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedEventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedEventBroadcaster")
            .field("subscribers", &self.event_tx.receiver_count())
            .finish()
    }
}
