//! Submit-then-poll driver for scrobble batches.
//!
//! ```text
//! Idle -> Submitting -> Polling -> Completed
//!              |           |
//!              +-----------+----> Failed
//! ```
//!
//! Terminal states go back through `Submitting` on the next submit. Only one
//! submission may be in flight at a time, and poll requests for a session are
//! strictly sequential: poll N+1 is not sent before poll N has answered.

use crate::backend::ScrobbleBackend;
use crate::cancel::{sleep_with_cancel, PollScope, ScopeToken};
use crate::error::ScrobblerError;
use crate::events::{ScrobbleEventReceiver, SharedEventBroadcaster};
use crate::types::{ReleaseContext, ScrobbleBatch, ScrobbleProgress, SessionStatus};
use crate::Result;
use std::time::Duration;
use tokio::sync::watch;

/// Timing of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Wait before the first status request
    pub initial_delay: Duration,
    /// Wait between consecutive status requests
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            interval: Duration::from_secs(1),
        }
    }
}

/// Observable state of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Polling {
        session_id: String,
        /// Latest counters reported by the backend, if any yet
        progress: Option<ScrobbleProgress>,
    },
    Completed {
        session_id: String,
        progress: ScrobbleProgress,
    },
    Failed {
        /// `None` when the batch never reached the backend
        session_id: Option<String>,
        message: String,
        /// Last counters seen before the failure; never invented
        progress: Option<ScrobbleProgress>,
    },
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SubmissionState::Submitting | SubmissionState::Polling { .. }
        )
    }

    pub fn progress(&self) -> Option<ScrobbleProgress> {
        match self {
            SubmissionState::Polling { progress, .. } => *progress,
            SubmissionState::Completed { progress, .. } => Some(*progress),
            SubmissionState::Failed { progress, .. } => *progress,
            _ => None,
        }
    }
}

/// Drives one release's submissions through the state machine.
///
/// The orchestrator is shared by reference: state lives in a `watch` channel
/// so display code can `subscribe()` to it, and `cancel()` may be called from
/// elsewhere while `submit()` is awaiting.
#[derive(Debug)]
pub struct ScrobbleOrchestrator {
    settings: PollSettings,
    state: watch::Sender<SubmissionState>,
    scope: PollScope,
    broadcaster: SharedEventBroadcaster,
}

/// Resets a submission whose `submit()` future was dropped mid-flight.
///
/// Every normal exit leaves a terminal state (or a stale token after
/// `cancel()`), so the guard only acts when the token is still current and
/// the state still says in flight.
struct InFlightGuard<'a> {
    orchestrator: &'a ScrobbleOrchestrator,
    token: ScopeToken,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.token.is_current() && self.orchestrator.state().is_in_flight() {
            log::debug!("Submission dropped while in flight, resetting");
            self.orchestrator.cancel();
        }
    }
}

impl Default for ScrobbleOrchestrator {
    fn default() -> Self {
        Self::new(PollSettings::default())
    }
}

impl ScrobbleOrchestrator {
    pub fn new(settings: PollSettings) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            settings,
            state,
            scope: PollScope::new(),
            broadcaster: SharedEventBroadcaster::new(),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn subscribe(&self) -> ScrobbleEventReceiver {
        self.broadcaster.subscribe()
    }

    pub fn broadcaster(&self) -> &SharedEventBroadcaster {
        &self.broadcaster
    }

    /// Abandon any in-flight submission; its pending poll never fires.
    ///
    /// State returns to `Idle`. A running `submit()` resolves to
    /// [`ScrobblerError::Cancelled`] without writing further state.
    pub fn cancel(&self) {
        self.scope.cancel();
        let previous = self.state.send_replace(SubmissionState::Idle);
        if previous.is_in_flight() {
            let session_id = match &previous {
                SubmissionState::Polling { session_id, .. } => Some(session_id.as_str()),
                _ => None,
            };
            log::info!("Cancelled in-flight submission {session_id:?}");
            self.broadcaster.emit_cancelled(session_id);
        }
    }

    /// Submit `batch` and poll until the backend finishes processing it.
    ///
    /// Returns the frozen final counters of a completed session. Partial
    /// failures (ignored/failed entries) are part of a successful result.
    pub async fn submit<B>(
        &self,
        backend: &B,
        batch: &ScrobbleBatch,
        context: &ReleaseContext,
    ) -> Result<ScrobbleProgress>
    where
        B: ScrobbleBackend + ?Sized,
    {
        if batch.is_empty() {
            return Err(ScrobblerError::NothingSelected);
        }

        let started = self.state.send_if_modified(|state| {
            if state.is_in_flight() {
                false
            } else {
                *state = SubmissionState::Submitting;
                true
            }
        });
        if !started {
            return Err(ScrobblerError::AlreadyInFlight);
        }
        let guard = InFlightGuard {
            orchestrator: self,
            token: self.scope.begin(),
        };
        let token = &guard.token;

        log::info!(
            "Submitting {} scrobbles for release {} ({} - {})",
            batch.len(),
            context.release_id,
            context.artist,
            context.title
        );
        self.broadcaster
            .emit_submission_started(&context.release_id, batch.len());

        let session_id = match backend.submit_scrobble_batch(batch, context).await {
            Ok(response) => response.session_id,
            Err(e) => {
                token.check()?;
                return Err(self.fail(None, None, e));
            }
        };
        token.check()?;

        log::debug!("Batch accepted as session {session_id}");
        self.state.send_replace(SubmissionState::Polling {
            session_id: session_id.clone(),
            progress: None,
        });
        self.broadcaster.emit_session_created(&session_id);

        self.poll(backend, token, &session_id, batch.len()).await
    }

    async fn poll<B>(
        &self,
        backend: &B,
        token: &ScopeToken,
        session_id: &str,
        batch_len: usize,
    ) -> Result<ScrobbleProgress>
    where
        B: ScrobbleBackend + ?Sized,
    {
        let mut latest: Option<ScrobbleProgress> = None;
        let mut delay = self.settings.initial_delay;

        loop {
            sleep_with_cancel(token, delay).await?;
            delay = self.settings.interval;

            let response = backend.get_scrobble_session_status(session_id).await;
            token.check()?;

            let response = match response {
                Ok(response) => response,
                Err(e) => return Err(self.fail(Some(session_id), latest, e)),
            };

            if let Some(progress) = response.progress {
                latest = Some(progress);
                log::debug!("Session {session_id}: {progress}");
                self.broadcaster.emit_progress(session_id, progress);
            }

            match response.status {
                SessionStatus::Pending => {
                    self.state.send_replace(SubmissionState::Polling {
                        session_id: session_id.to_string(),
                        progress: latest,
                    });
                }
                SessionStatus::Completed => {
                    let progress = latest.unwrap_or(ScrobbleProgress {
                        total: u32::try_from(batch_len).unwrap_or(u32::MAX),
                        ..ScrobbleProgress::default()
                    });
                    log::info!("Session {session_id} completed: {progress}");
                    self.state.send_replace(SubmissionState::Completed {
                        session_id: session_id.to_string(),
                        progress,
                    });
                    self.broadcaster.emit_completed(session_id, progress);
                    return Ok(progress);
                }
                SessionStatus::Failed => {
                    let message = response
                        .error
                        .unwrap_or_else(|| "Scrobble session failed".to_string());
                    log::warn!("Session {session_id} failed: {message}");
                    self.state.send_replace(SubmissionState::Failed {
                        session_id: Some(session_id.to_string()),
                        message: message.clone(),
                        progress: latest,
                    });
                    self.broadcaster.emit_failed(Some(session_id), &message);
                    return Err(ScrobblerError::SessionFailed {
                        session_id: session_id.to_string(),
                        message,
                    });
                }
            }
        }
    }

    fn fail(
        &self,
        session_id: Option<&str>,
        progress: Option<ScrobbleProgress>,
        error: ScrobblerError,
    ) -> ScrobblerError {
        let message = error.to_string();
        log::warn!("Scrobble submission failed: {message}");
        self.state.send_replace(SubmissionState::Failed {
            session_id: session_id.map(str::to_string),
            message: message.clone(),
            progress,
        });
        self.broadcaster.emit_failed(session_id, &message);
        error
    }
}
