use crate::types::{
    AlbumHistory, ArtistMapping, Release, ReleaseContext, ScrobbleBatch, SessionStatusResponse,
    SubmitResponse,
};
use crate::Result;
use async_trait::async_trait;

/// Operations the scrobbling core needs from the outside world.
///
/// Catalog lookups, play history, artist name mappings and the asynchronous
/// batch processor all live behind this trait so the selection, timing and
/// submission logic can be driven by any transport (or by a test double).
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides `MockScrobbleBackend`
/// that implements this trait using the `mockall` library.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait(?Send)]
pub trait ScrobbleBackend {
    /// Fetch a release with its full tracklist.
    async fn fetch_release(&self, release_id: &str) -> Result<Release>;

    /// Fetch the listening history of an album.
    ///
    /// An album that was never played is `AlbumHistory { found: false, .. }`,
    /// not an error.
    async fn fetch_album_history(&self, artist: &str, album: &str) -> Result<AlbumHistory>;

    /// Look up how a catalog artist name is mapped onto the tracking service.
    async fn lookup_artist_mapping(&self, name: &str) -> Result<ArtistMapping>;

    /// Hand a timestamped batch to the backend for asynchronous processing.
    async fn submit_scrobble_batch(
        &self,
        batch: &ScrobbleBatch,
        context: &ReleaseContext,
    ) -> Result<SubmitResponse>;

    /// Query the processing state of a previously submitted batch.
    async fn get_scrobble_session_status(&self, session_id: &str) -> Result<SessionStatusResponse>;
}
