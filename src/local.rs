//! Offline [`ScrobbleBackend`] backed by JSON files in a data directory.
//!
//! Layout:
//!
//! ```text
//! <data_dir>/releases/<release id>.json   one Release per file
//! <data_dir>/history.json                 [{ "artist", "album", "track", "timestamp" }, ...]
//! ```
//!
//! Artist mappings come from the config. Submitted batches are processed in
//! memory: a session reports `pending` on its first poll and `completed` on
//! the next, with entries older than the tracking service's acceptance
//! window counted as ignored.

use crate::backend::ScrobbleBackend;
use crate::config::ScrobblerConfig;
use crate::error::ScrobblerError;
use crate::types::{
    AlbumHistory, ArtistMapping, HistoryPlay, Release, ReleaseContext, ScrobbleBatch,
    ScrobbleProgress, SessionStatus, SessionStatusResponse, SubmitResponse,
};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Scrobbles older than this many days are ignored by the tracking service.
pub const ACCEPTANCE_WINDOW_DAYS: i64 = 14;

/// One row of `history.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalPlay {
    pub artist: String,
    pub album: String,
    #[serde(default)]
    pub track: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
struct LocalSession {
    progress: ScrobbleProgress,
    polls: u32,
}

pub struct LocalCatalog {
    data_dir: PathBuf,
    artist_mappings: HashMap<String, String>,
    sessions: Mutex<HashMap<String, LocalSession>>,
    next_session: AtomicU64,
}

impl LocalCatalog {
    pub fn new(data_dir: impl Into<PathBuf>, artist_mappings: HashMap<String, String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            artist_mappings,
            sessions: Mutex::new(HashMap::new()),
            next_session: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &ScrobblerConfig) -> Self {
        Self::new(config.data_dir.clone(), config.artist_mappings.clone())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn release_path(&self, release_id: &str) -> Option<PathBuf> {
        let valid = !release_id.is_empty()
            && release_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| {
            self.data_dir
                .join("releases")
                .join(format!("{release_id}.json"))
        })
    }

    async fn load_plays(&self) -> Result<Vec<LocalPlay>> {
        let path = self.data_dir.join("history.json");
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[async_trait(?Send)]
impl ScrobbleBackend for LocalCatalog {
    async fn fetch_release(&self, release_id: &str) -> Result<Release> {
        let path = self
            .release_path(release_id)
            .ok_or_else(|| ScrobblerError::NotFound(format!("release {release_id:?}")))?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScrobblerError::NotFound(format!("release {release_id}")));
            }
            Err(e) => return Err(e.into()),
        };
        let release: Release = serde_json::from_str(&contents)
            .map_err(|e| ScrobblerError::Parse(format!("{}: {e}", path.display())))?;
        log::debug!(
            "Loaded release {} with {} tracklist entries",
            release.id,
            release.tracks.len()
        );
        Ok(release)
    }

    async fn fetch_album_history(&self, artist: &str, album: &str) -> Result<AlbumHistory> {
        let plays: Vec<HistoryPlay> = self
            .load_plays()
            .await?
            .into_iter()
            .filter(|p| same_name(&p.artist, artist) && same_name(&p.album, album))
            .map(|p| HistoryPlay {
                timestamp: p.timestamp,
                track: p.track,
            })
            .collect();
        Ok(AlbumHistory {
            found: !plays.is_empty(),
            plays,
        })
    }

    async fn lookup_artist_mapping(&self, name: &str) -> Result<ArtistMapping> {
        Ok(self
            .artist_mappings
            .get(name)
            .map(|target| ArtistMapping::mapped_to(target))
            .unwrap_or_else(ArtistMapping::unmapped))
    }

    async fn submit_scrobble_batch(
        &self,
        batch: &ScrobbleBatch,
        context: &ReleaseContext,
    ) -> Result<SubmitResponse> {
        let cutoff = Utc::now().timestamp() - ACCEPTANCE_WINDOW_DAYS * 24 * 3600;
        let total = u32::try_from(batch.len()).unwrap_or(u32::MAX);
        let ignored = u32::try_from(
            batch
                .entries
                .iter()
                .filter(|e| e.timestamp < cutoff)
                .count(),
        )
        .unwrap_or(u32::MAX);

        let session_id = format!(
            "local-{}",
            self.next_session.fetch_add(1, Ordering::SeqCst)
        );
        log::info!(
            "Accepted {total} scrobbles for {} - {} as {session_id}",
            context.artist,
            context.title
        );
        self.sessions.lock().await.insert(
            session_id.clone(),
            LocalSession {
                progress: ScrobbleProgress {
                    current: total,
                    total,
                    success: total - ignored,
                    failed: 0,
                    ignored,
                },
                polls: 0,
            },
        );
        Ok(SubmitResponse { session_id })
    }

    async fn get_scrobble_session_status(&self, session_id: &str) -> Result<SessionStatusResponse> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| ScrobblerError::NotFound(format!("session {session_id}")))?;
        session.polls += 1;

        if session.polls == 1 {
            return Ok(SessionStatusResponse {
                status: SessionStatus::Pending,
                progress: Some(ScrobbleProgress {
                    current: 0,
                    ..session.progress
                }),
                error: None,
            });
        }

        // Completed sessions are reported once, then forgotten.
        let progress = session.progress;
        sessions.remove(session_id);
        log::debug!("Session {session_id} completed: {progress}");
        Ok(SessionStatusResponse {
            status: SessionStatus::Completed,
            progress: Some(progress),
            error: None,
        })
    }
}
