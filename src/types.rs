//! Data types shared by the track selection, timing and submission modules.
//!
//! Releases and album histories are owned by external collaborators and are
//! treated as read-only snapshots; everything else in this module is built
//! from them.

use chrono::{DateTime, Utc};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ================================================================================================
// RELEASE AND TRACKLIST
// ================================================================================================

/// Duration of a track as supplied by the catalog.
///
/// Catalogs deliver either a plain number of seconds or a human readable
/// `MM:SS` string. Use [`crate::duration::parse_duration`] to turn either
/// form into seconds.
///
/// Deserialization never fails: numbers that are not whole, non-negative
/// seconds (and any other JSON value) are kept in text form, which
/// `parse_duration` reads as unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TrackDuration {
    /// Already a count of seconds
    Seconds(u64),
    /// Free-form text, usually `MM:SS`
    Text(String),
}

impl From<u64> for TrackDuration {
    fn from(seconds: u64) -> Self {
        TrackDuration::Seconds(seconds)
    }
}

impl From<&str> for TrackDuration {
    fn from(text: &str) -> Self {
        TrackDuration::Text(text.to_string())
    }
}

impl<'de> Deserialize<'de> for TrackDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TrackDurationVisitor)
    }
}

struct TrackDurationVisitor;

impl<'de> Visitor<'de> for TrackDurationVisitor {
    type Value = TrackDuration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number of seconds or a duration string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(TrackDuration::Seconds(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(match u64::try_from(v) {
            Ok(seconds) => TrackDuration::Seconds(seconds),
            Err(_) => TrackDuration::Text(v.to_string()),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(TrackDuration::Text(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(TrackDuration::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(TrackDuration::Text(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(TrackDuration::Text(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(TrackDuration::Text(String::new()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(TrackDuration::Text(String::new()))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(TrackDuration::Text(String::new()))
    }
}

/// One entry of a release tracklist.
///
/// A track whose `position` is empty after trimming is a section header
/// (e.g. "Side One" or "Bonus Tracks"). Headers are informational only and
/// never take part in selection or timing.
///
/// # Examples
///
/// ```rust
/// use release_scrobbler::ReleaseTrack;
///
/// let track = ReleaseTrack::new("A1", "Tomorrow Never Knows").with_duration("2:57");
/// assert!(track.is_selectable());
///
/// let header = ReleaseTrack::new("", "Side One");
/// assert!(!header.is_selectable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseTrack {
    /// Position label, e.g. "A1", "B2", "3", or empty for a header
    #[serde(default)]
    pub position: String,
    /// The track title
    pub title: String,
    /// Per-track artist credit, if different from the release artist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Track length as listed by the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<TrackDuration>,
}

impl ReleaseTrack {
    pub fn new(position: &str, title: &str) -> Self {
        Self {
            position: position.to_string(),
            title: title.to_string(),
            artist: None,
            duration: None,
        }
    }

    pub fn with_artist(mut self, artist: &str) -> Self {
        self.artist = Some(artist.to_string());
        self
    }

    pub fn with_duration(mut self, duration: impl Into<TrackDuration>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    /// Whether this entry is a real track rather than a section header.
    pub fn is_selectable(&self) -> bool {
        !self.position.trim().is_empty()
    }
}

impl fmt::Display for ReleaseTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_selectable() {
            write!(f, "{}. {}", self.position.trim(), self.title)
        } else {
            write!(f, "[{}]", self.title)
        }
    }
}

/// A release (album) as returned by the catalog collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Catalog identifier of the release
    pub id: String,
    /// Release-level artist credit
    pub artist: String,
    /// Release title
    pub title: String,
    /// Ordered tracklist; the index into this list is a track's identity
    #[serde(default)]
    pub tracks: Vec<ReleaseTrack>,
}

impl Release {
    pub fn new(id: &str, artist: &str, title: &str, tracks: Vec<ReleaseTrack>) -> Self {
        Self {
            id: id.to_string(),
            artist: artist.to_string(),
            title: title.to_string(),
            tracks,
        }
    }

    /// Artist credited for the track at `index`, falling back to the release artist.
    pub fn artist_for(&self, index: usize) -> &str {
        self.tracks
            .get(index)
            .and_then(|t| t.artist.as_deref())
            .filter(|a| !a.trim().is_empty())
            .unwrap_or(&self.artist)
    }

    /// Indices of every selectable (non-header) track, in tracklist order.
    pub fn selectable_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_selectable())
            .map(|(i, _)| i)
    }

    pub fn selectable_count(&self) -> usize {
        self.selectable_indices().count()
    }

    pub fn context(&self) -> ReleaseContext {
        ReleaseContext {
            release_id: self.id.clone(),
            artist: self.artist.clone(),
            title: self.title.clone(),
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// Release details sent along with a batch so the backend can apply its own
/// artist name mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseContext {
    pub release_id: String,
    pub artist: String,
    pub title: String,
}

// ================================================================================================
// PLAY HISTORY
// ================================================================================================

/// A single historical listen for an album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPlay {
    /// Unix timestamp of the listen
    pub timestamp: i64,
    /// Track title as recorded by the tracking service (may be missing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
}

impl HistoryPlay {
    pub fn played_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// Listening history for one (artist, album) pair.
///
/// An album that was never listened to is reported as `found: false` with no
/// plays rather than as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumHistory {
    pub found: bool,
    #[serde(default)]
    pub plays: Vec<HistoryPlay>,
}

impl AlbumHistory {
    pub fn not_found() -> Self {
        Self::default()
    }
}

/// Result of asking the backend how a catalog artist name maps onto the
/// tracking service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistMapping {
    pub has_mapping: bool,
    #[serde(default)]
    pub lastfm_name: String,
}

impl ArtistMapping {
    pub fn unmapped() -> Self {
        Self::default()
    }

    pub fn mapped_to(name: &str) -> Self {
        Self {
            has_mapping: true,
            lastfm_name: name.to_string(),
        }
    }
}

// ================================================================================================
// SCROBBLE BATCHES AND SESSIONS
// ================================================================================================

/// One timestamped listen ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrobbleEntry {
    /// Index of the track within the release tracklist
    pub track_index: usize,
    pub position: String,
    pub artist: String,
    pub track: String,
    pub album: String,
    pub album_artist: String,
    /// Unix timestamp at which the track started playing
    pub timestamp: i64,
    /// Duration in seconds used for timing
    pub duration: u64,
}

impl fmt::Display for ScrobbleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} [{}]", self.artist, self.track, self.album)
    }
}

/// An ordered batch of scrobbles; timestamps strictly increase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrobbleBatch {
    pub entries: Vec<ScrobbleEntry>,
}

impl ScrobbleBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.entries.first().map(|e| e.timestamp)
    }
}

/// Backend acknowledgement of a submitted batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub session_id: String,
}

/// Processing state of a scrobble session as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[serde(alias = "processing")]
    Pending,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

/// Per-session counters. `ignored` and `failed` entries in a completed
/// session are a normal outcome, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrobbleProgress {
    pub current: u32,
    pub total: u32,
    pub success: u32,
    pub failed: u32,
    pub ignored: u32,
}

impl fmt::Display for ScrobbleProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} processed ({} scrobbled, {} ignored, {} failed)",
            self.current, self.total, self.success, self.ignored, self.failed
        )
    }
}

/// Response body of a session status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ScrobbleProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
