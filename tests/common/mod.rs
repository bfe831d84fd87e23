#![allow(dead_code)]
use async_trait::async_trait;
use release_scrobbler::{
    AlbumHistory, ArtistMapping, Release, ReleaseContext, ReleaseTrack, Result, ScrobbleBackend,
    ScrobbleBatch, ScrobbleProgress, ScrobblerError, SessionStatus, SessionStatusResponse,
    SubmitResponse,
};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A double LP with a header row and a compilation-style artist credit.
pub fn double_lp() -> Release {
    Release::new(
        "249504",
        "Boris (2)",
        "Amplifier Worship",
        vec![
            ReleaseTrack::new("", "Disc One"),
            ReleaseTrack::new("A1", "Hama").with_duration("15:47"),
            ReleaseTrack::new("A2", "Ganbou-Shi").with_duration("3:30"),
            ReleaseTrack::new("B1", "Kuruimizu").with_duration("4:00"),
            ReleaseTrack::new("B2", "Vomitself").with_duration(125),
            ReleaseTrack::new("", "Disc Two"),
            ReleaseTrack::new("C1", "Huge").with_duration("garbage"),
            ReleaseTrack::new("D1", "Dronevil").with_artist("Sunn O))) (3)"),
        ],
    )
}

/// Write a release and a history file into a fresh data directory.
pub fn write_catalog(dir: &Path, release: &Release, history: &str) {
    fs::create_dir_all(dir.join("releases")).unwrap();
    fs::write(
        dir.join("releases").join(format!("{}.json", release.id)),
        serde_json::to_string_pretty(release).unwrap(),
    )
    .unwrap();
    fs::write(dir.join("history.json"), history).unwrap();
}

/// Backend double that replays scripted poll responses with simulated latency
/// and records how polls were issued.
pub struct ScriptedBackend {
    pub release: Release,
    pub mappings: HashMap<String, String>,
    pub submit_error: Option<String>,
    pub poll_latency: Duration,
    polls: RefCell<VecDeque<Result<SessionStatusResponse>>>,
    pub poll_count: Cell<usize>,
    in_flight: Cell<usize>,
    pub max_in_flight: Cell<usize>,
    pub submitted: RefCell<Vec<ScrobbleBatch>>,
}

impl ScriptedBackend {
    pub fn new(release: Release) -> Self {
        Self {
            release,
            mappings: HashMap::new(),
            submit_error: None,
            poll_latency: Duration::from_millis(2),
            polls: RefCell::new(VecDeque::new()),
            poll_count: Cell::new(0),
            in_flight: Cell::new(0),
            max_in_flight: Cell::new(0),
            submitted: RefCell::new(Vec::new()),
        }
    }

    pub fn with_mapping(mut self, from: &str, to: &str) -> Self {
        self.mappings.insert(from.to_string(), to.to_string());
        self
    }

    pub fn push_status(&self, status: SessionStatus, progress: Option<ScrobbleProgress>) {
        self.polls.borrow_mut().push_back(Ok(SessionStatusResponse {
            status,
            progress,
            error: None,
        }));
    }

    pub fn push_poll_error(&self, message: &str) {
        self.polls
            .borrow_mut()
            .push_back(Err(ScrobblerError::Http(message.to_string())));
    }
}

#[async_trait(?Send)]
impl ScrobbleBackend for ScriptedBackend {
    async fn fetch_release(&self, release_id: &str) -> Result<Release> {
        if release_id == self.release.id {
            Ok(self.release.clone())
        } else {
            Err(ScrobblerError::NotFound(release_id.to_string()))
        }
    }

    async fn fetch_album_history(&self, _artist: &str, _album: &str) -> Result<AlbumHistory> {
        Ok(AlbumHistory::not_found())
    }

    async fn lookup_artist_mapping(&self, name: &str) -> Result<ArtistMapping> {
        Ok(self
            .mappings
            .get(name)
            .map(|target| ArtistMapping::mapped_to(target))
            .unwrap_or_default())
    }

    async fn submit_scrobble_batch(
        &self,
        batch: &ScrobbleBatch,
        _context: &ReleaseContext,
    ) -> Result<SubmitResponse> {
        if let Some(message) = &self.submit_error {
            return Err(ScrobblerError::Http(message.clone()));
        }
        self.submitted.borrow_mut().push(batch.clone());
        Ok(SubmitResponse {
            session_id: "scripted".to_string(),
        })
    }

    async fn get_scrobble_session_status(
        &self,
        _session_id: &str,
    ) -> Result<SessionStatusResponse> {
        self.poll_count.set(self.poll_count.get() + 1);
        self.in_flight.set(self.in_flight.get() + 1);
        self.max_in_flight
            .set(self.max_in_flight.get().max(self.in_flight.get()));

        tokio::time::sleep(self.poll_latency).await;

        self.in_flight.set(self.in_flight.get() - 1);
        self.polls.borrow_mut().pop_front().unwrap_or(Ok(SessionStatusResponse {
            status: SessionStatus::Pending,
            progress: None,
            error: None,
        }))
    }
}
