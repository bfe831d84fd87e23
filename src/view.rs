use crate::backend::ScrobbleBackend;
use crate::error::ScrobblerError;
use crate::guard::{check_selection, strip_disambiguation_suffix, GuardOutcome};
use crate::history::{AlbumPlaySummary, HistoryIndex, TrackScrobbleStats};
use crate::orchestrator::{PollSettings, ScrobbleOrchestrator, SubmissionState};
use crate::selection::Selection;
use crate::timing::{nudge, total_duration, TimingPlan};
use crate::topology::{Disc, SideTopology};
use crate::types::{Release, ScrobbleBatch, ScrobbleProgress};
use crate::Result;
use chrono::{Local, Utc};
use std::sync::Arc;

/// Result of asking the view to submit the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRequest {
    /// The batch was processed; these are the final counters.
    Submitted(ScrobbleProgress),
    /// Submission is paused until the user confirms these artists.
    AwaitingConfirmation(Vec<String>),
}

/// Everything the display layer needs for one mounted release.
///
/// Release, topology, selection, timing plan and history are held here and
/// handed explicitly to the pure functions that work on them. The
/// orchestrator is shared behind an `Arc` so another task can cancel polling
/// while `submit` is awaiting.
#[derive(Debug)]
pub struct ReleaseView {
    release: Release,
    topology: SideTopology,
    selection: Selection,
    timing: TimingPlan,
    history: HistoryIndex,
    pending_confirmation: Option<Vec<String>>,
    orchestrator: Arc<ScrobbleOrchestrator>,
}

impl ReleaseView {
    /// Build a view over an already fetched release, with empty history.
    pub fn new(release: Release, settings: PollSettings) -> Self {
        let topology = SideTopology::resolve(&release);
        let selection = Selection::all_selectable(&release);
        Self {
            release,
            topology,
            selection,
            timing: TimingPlan::auto(),
            history: HistoryIndex::empty(),
            pending_confirmation: None,
            orchestrator: Arc::new(ScrobbleOrchestrator::new(settings)),
        }
    }

    /// Fetch a release and its listening history.
    pub async fn load<B>(backend: &B, release_id: &str, settings: PollSettings) -> Result<Self>
    where
        B: ScrobbleBackend + ?Sized,
    {
        let release = backend.fetch_release(release_id).await?;
        let mut view = Self::new(release, settings);
        view.reload_history(backend).await;
        Ok(view)
    }

    /// Replace the history index with a fresh snapshot.
    ///
    /// History is display-only, so a failed fetch leaves an empty index.
    pub async fn reload_history<B>(&mut self, backend: &B)
    where
        B: ScrobbleBackend + ?Sized,
    {
        let artist = strip_disambiguation_suffix(&self.release.artist);
        self.history = match backend
            .fetch_album_history(artist, &self.release.title)
            .await
        {
            Ok(history) => HistoryIndex::build(&history),
            Err(e) => {
                log::warn!(
                    "Could not fetch history for {} - {}: {e}",
                    artist,
                    self.release.title
                );
                HistoryIndex::empty()
            }
        };
    }

    pub fn release(&self) -> &Release {
        &self.release
    }

    pub fn topology(&self) -> &SideTopology {
        &self.topology
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn timing(&self) -> TimingPlan {
        self.timing
    }

    pub fn orchestrator(&self) -> Arc<ScrobbleOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.orchestrator.state()
    }

    // --- selection -------------------------------------------------------

    pub fn is_multi_side(&self) -> bool {
        self.topology.is_multi_side()
    }

    /// Side letters in ascending order; empty for releases without sides.
    pub fn side_labels(&self) -> &[char] {
        &self.topology.sides
    }

    pub fn discs(&self) -> &[Disc] {
        &self.topology.discs
    }

    pub fn toggle_track(&mut self, index: usize) -> bool {
        self.selection.toggle_track(&self.release, index)
    }

    pub fn toggle_side(&mut self, side: char) {
        self.selection.toggle_side(&self.release, side);
    }

    pub fn toggle_disc(&mut self, number: u32) {
        if let Some(disc) = self.topology.disc(number) {
            self.selection.toggle_disc(&self.release, &disc.sides);
        }
    }

    pub fn toggle_all(&mut self) {
        self.selection.toggle_all(&self.release);
    }

    pub fn is_side_selected(&self, side: char) -> bool {
        self.selection.is_side_selected(&self.release, side)
    }

    pub fn is_disc_selected(&self, number: u32) -> bool {
        self.topology
            .disc(number)
            .is_some_and(|disc| self.selection.is_disc_selected(&self.release, &disc.sides))
    }

    // --- timing ----------------------------------------------------------

    /// Set or clear (`None` = auto) the explicit start time.
    pub fn set_start(&mut self, start: Option<i64>) {
        self.timing.start = start;
    }

    /// Shift the start time by `steps` × 5 minutes on the local wall clock.
    ///
    /// In auto mode the nudge starts from the currently derived start and
    /// switches the plan to an explicit time. Does nothing with an empty
    /// selection.
    pub fn nudge_start(&mut self, steps: i64) {
        let now = Utc::now().timestamp();
        if let Some(start) = self.timing.resolve_start(&self.release, &self.selection, now) {
            self.timing.start = Some(nudge(start, steps, &Local));
        }
    }

    /// Selected playing time in seconds, including inter-track gaps.
    pub fn selected_duration(&self) -> u64 {
        total_duration(&self.release, &self.selection)
    }

    pub fn timing_display(&self, now: i64) -> Option<String> {
        self.timing
            .display(&self.release, &self.selection, now, &Local)
    }

    /// The batch that would be submitted at `now`.
    pub fn preview_batch(&self, now: i64) -> Option<ScrobbleBatch> {
        self.timing.build_batch(&self.release, &self.selection, now)
    }

    // --- history ---------------------------------------------------------

    /// Play statistics for the track at `index`; `None` if never played.
    pub fn stats_for(&self, index: usize) -> Option<&TrackScrobbleStats> {
        let track = self.release.tracks.get(index)?;
        if !track.is_selectable() {
            return None;
        }
        self.history.stats_for(&track.title)
    }

    pub fn album_play_summary(&self) -> AlbumPlaySummary {
        self.history.summary()
    }

    // --- submission ------------------------------------------------------

    /// Artists awaiting confirmation, if the guard paused submission.
    pub fn pending_confirmation(&self) -> Option<&[String]> {
        self.pending_confirmation.as_deref()
    }

    /// Run the disambiguation guard and, if it passes, submit the selection.
    pub async fn submit<B>(&mut self, backend: &B) -> Result<SubmitRequest>
    where
        B: ScrobbleBackend + ?Sized,
    {
        if self.selection.is_empty() {
            return Err(ScrobblerError::NothingSelected);
        }
        if self.orchestrator.state().is_in_flight() {
            return Err(ScrobblerError::AlreadyInFlight);
        }
        self.pending_confirmation = None;

        match check_selection(backend, &self.release, &self.selection).await {
            GuardOutcome::Proceed => self
                .run_submission(backend)
                .await
                .map(SubmitRequest::Submitted),
            GuardOutcome::NeedsConfirmation(artists) => {
                self.pending_confirmation = Some(artists.clone());
                Ok(SubmitRequest::AwaitingConfirmation(artists))
            }
        }
    }

    /// Continue a submission the guard paused ("continue anyway").
    pub async fn confirm_submission<B>(&mut self, backend: &B) -> Result<ScrobbleProgress>
    where
        B: ScrobbleBackend + ?Sized,
    {
        if self.pending_confirmation.take().is_none() {
            return Err(ScrobblerError::NoPendingConfirmation);
        }
        self.run_submission(backend).await
    }

    /// Drop a paused submission ("go create a mapping first").
    pub fn cancel_confirmation(&mut self) {
        self.pending_confirmation = None;
    }

    /// Leave the view: abandon polling and any pending confirmation.
    pub fn leave(&mut self) {
        self.pending_confirmation = None;
        self.orchestrator.cancel();
    }

    async fn run_submission<B>(&self, backend: &B) -> Result<ScrobbleProgress>
    where
        B: ScrobbleBackend + ?Sized,
    {
        // Timestamps are taken at submit time so auto timing ends "now".
        let now = Utc::now().timestamp();
        let batch = self
            .timing
            .build_batch(&self.release, &self.selection, now)
            .ok_or(ScrobblerError::NothingSelected)?;
        self.orchestrator
            .submit(backend, &batch, &self.release.context())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockScrobbleBackend;
    use crate::types::{
        AlbumHistory, ArtistMapping, HistoryPlay, ReleaseTrack, SessionStatus,
        SessionStatusResponse, SubmitResponse,
    };
    use mockall::predicate::eq;
    use std::time::Duration;

    fn fast() -> PollSettings {
        PollSettings {
            initial_delay: Duration::from_millis(1),
            interval: Duration::from_millis(1),
        }
    }

    fn release() -> Release {
        Release::new(
            "7",
            "Boris (2)",
            "Pink",
            vec![
                ReleaseTrack::new("A1", "Farewell").with_duration("7:14"),
                ReleaseTrack::new("A2", "Pink").with_duration("3:30"),
                ReleaseTrack::new("B1", "Woman On The Screen").with_duration("2:31"),
                ReleaseTrack::new("", "Bonus"),
                ReleaseTrack::new("C1", "Just Abandoned Myself").with_duration("18:32"),
            ],
        )
    }

    fn history_backend() -> MockScrobbleBackend {
        let mut backend = MockScrobbleBackend::new();
        let release = release();
        backend
            .expect_fetch_release()
            .with(eq("7"))
            .returning(move |_| Ok(release.clone()));
        backend
            .expect_fetch_album_history()
            .with(eq("Boris"), eq("Pink"))
            .returning(|_, _| {
                Ok(AlbumHistory {
                    found: true,
                    plays: vec![
                        HistoryPlay {
                            timestamp: 10,
                            track: Some("pink".to_string()),
                        },
                        HistoryPlay {
                            timestamp: 20,
                            track: Some("PINK".to_string()),
                        },
                    ],
                })
            });
        backend
    }

    fn accepting(backend: &mut MockScrobbleBackend) {
        backend.expect_submit_scrobble_batch().returning(|_, _| {
            Ok(SubmitResponse {
                session_id: "s".to_string(),
            })
        });
        backend.expect_get_scrobble_session_status().returning(|_| {
            Ok(SessionStatusResponse {
                status: SessionStatus::Completed,
                progress: None,
                error: None,
            })
        });
    }

    #[tokio::test]
    async fn test_load_initializes_selection_and_history() {
        let backend = history_backend();
        let view = ReleaseView::load(&backend, "7", fast()).await.unwrap();

        assert_eq!(view.selection().len(), 4);
        assert!(view.is_multi_side());
        assert_eq!(view.discs().len(), 2);
        assert_eq!(view.stats_for(1).unwrap().count, 2);
        assert_eq!(view.stats_for(1).unwrap().last_played, 20);
        assert!(view.stats_for(0).is_none());
        assert!(view.stats_for(3).is_none());
        assert_eq!(view.album_play_summary().plays, 2);
    }

    #[tokio::test]
    async fn test_history_failure_leaves_empty_index() {
        let mut backend = MockScrobbleBackend::new();
        backend.expect_fetch_release().returning(|_| Ok(release()));
        backend
            .expect_fetch_album_history()
            .returning(|_, _| Err(ScrobblerError::Http("down".to_string())));

        let view = ReleaseView::load(&backend, "7", fast()).await.unwrap();
        assert_eq!(view.album_play_summary(), AlbumPlaySummary::default());
    }

    #[tokio::test]
    async fn test_guard_pauses_until_confirmed() {
        let mut backend = history_backend();
        backend
            .expect_lookup_artist_mapping()
            .returning(|_| Ok(ArtistMapping::unmapped()));
        accepting(&mut backend);

        let mut view = ReleaseView::load(&backend, "7", fast()).await.unwrap();
        let request = view.submit(&backend).await.unwrap();
        assert_eq!(
            request,
            SubmitRequest::AwaitingConfirmation(vec!["Boris (2)".to_string()])
        );
        assert_eq!(view.submission_state(), SubmissionState::Idle);
        assert_eq!(view.pending_confirmation().unwrap(), ["Boris (2)"]);

        let progress = view.confirm_submission(&backend).await.unwrap();
        assert_eq!(progress.total, 4);
        assert!(view.pending_confirmation().is_none());
        assert!(matches!(
            view.confirm_submission(&backend).await,
            Err(ScrobblerError::NoPendingConfirmation)
        ));
    }

    #[tokio::test]
    async fn test_cancelled_confirmation_never_submits() {
        let mut backend = history_backend();
        backend
            .expect_lookup_artist_mapping()
            .returning(|_| Ok(ArtistMapping::unmapped()));
        backend.expect_submit_scrobble_batch().never();

        let mut view = ReleaseView::load(&backend, "7", fast()).await.unwrap();
        view.submit(&backend).await.unwrap();
        view.cancel_confirmation();
        assert!(matches!(
            view.confirm_submission(&backend).await,
            Err(ScrobblerError::NoPendingConfirmation)
        ));
    }

    #[tokio::test]
    async fn test_mapped_artist_submits_directly() {
        let mut backend = history_backend();
        backend
            .expect_lookup_artist_mapping()
            .returning(|_| Ok(ArtistMapping::mapped_to("Boris")));
        accepting(&mut backend);

        let mut view = ReleaseView::load(&backend, "7", fast()).await.unwrap();
        view.toggle_disc(2);
        let request = view.submit(&backend).await.unwrap();
        assert!(matches!(request, SubmitRequest::Submitted(p) if p.total == 3));
    }

    #[tokio::test]
    async fn test_empty_selection_cannot_submit() {
        let backend = history_backend();
        let mut view = ReleaseView::load(&backend, "7", fast()).await.unwrap();
        view.toggle_all();
        assert!(view.preview_batch(1_000).is_none());
        assert!(view.timing_display(1_000).is_none());
        assert!(matches!(
            view.submit(&backend).await,
            Err(ScrobblerError::NothingSelected)
        ));
    }

    #[test]
    fn test_side_labels() {
        let view = ReleaseView::new(release(), fast());
        assert_eq!(view.side_labels(), ['A', 'B', 'C']);

        let cd = Release::new(
            "8",
            "Boris",
            "Akuma no Uta",
            vec![ReleaseTrack::new("1", "Intro"), ReleaseTrack::new("2", "Ibitsu")],
        );
        let view = ReleaseView::new(cd, fast());
        assert!(view.side_labels().is_empty());
        assert!(!view.is_multi_side());
    }

    #[test]
    fn test_selection_delegates() {
        let mut view = ReleaseView::new(release(), fast());
        view.toggle_side('A');
        assert!(!view.is_side_selected('A'));
        assert!(!view.is_disc_selected(1));
        view.toggle_disc(1);
        assert!(view.is_disc_selected(1));
        assert!(!view.toggle_track(3));
        view.toggle_disc(9);
        assert_eq!(view.selection().len(), 4);
    }

    #[test]
    fn test_explicit_start_and_nudge() {
        let mut view = ReleaseView::new(release(), fast());
        view.set_start(Some(1_700_000_000));
        view.nudge_start(1);
        assert_eq!(view.timing().start, Some(1_700_000_300));
        view.nudge_start(-2);
        assert_eq!(view.timing().start, Some(1_699_999_700));

        let batch = view.preview_batch(0).unwrap();
        assert_eq!(batch.first_timestamp(), Some(1_699_999_700));

        view.set_start(None);
        assert!(view.timing().is_auto());
        let now = 2_000_000_000;
        let batch = view.preview_batch(now).unwrap();
        assert_eq!(
            batch.first_timestamp(),
            Some(now - view.selected_duration() as i64)
        );
    }

    #[test]
    fn test_nudge_from_auto_switches_to_explicit() {
        let mut view = ReleaseView::new(release(), fast());
        view.nudge_start(-1);
        assert!(!view.timing().is_auto());
    }

    #[tokio::test]
    async fn test_leave_cancels_and_clears_pending() {
        let mut backend = history_backend();
        backend
            .expect_lookup_artist_mapping()
            .returning(|_| Ok(ArtistMapping::unmapped()));
        let mut view = ReleaseView::load(&backend, "7", fast()).await.unwrap();
        view.submit(&backend).await.unwrap();
        view.leave();
        assert!(view.pending_confirmation().is_none());
        assert_eq!(view.submission_state(), SubmissionState::Idle);
    }
}
