//! Mapping of previous listens back onto the current tracklist.
//!
//! Track titles on the tracking service rarely match catalog titles byte for
//! byte ("Don't Stop" vs "Dont Stop", "Rock & Roll" vs "Rock and Roll"), so
//! both sides are passed through [`normalize_title`] before comparison.

use crate::types::{AlbumHistory, HistoryPlay};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical form of a track title used as the history lookup key.
///
/// Lowercases, spells out `&`, turns every non-alphanumeric character into a
/// space and collapses whitespace. Applying it twice gives the same result
/// as applying it once.
///
/// ```rust
/// use release_scrobbler::history::normalize_title;
///
/// assert_eq!(normalize_title("  Rock & Roll (Live!) "), "rock and roll live");
/// assert_eq!(normalize_title("Don't   Stop"), normalize_title("don t stop"));
/// ```
pub fn normalize_title(title: &str) -> String {
    let mut spaced = String::with_capacity(title.len());
    for c in title.chars() {
        if c == '&' {
            spaced.push_str(" and ");
        } else {
            // Lowercasing can emit combining marks (İ -> i + U+0307); drop those too.
            for lower in c.to_lowercase() {
                spaced.push(if lower.is_alphanumeric() { lower } else { ' ' });
            }
        }
    }
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Play count and most recent listen for one normalized title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackScrobbleStats {
    pub count: u32,
    /// Unix timestamp of the latest matching play
    pub last_played: i64,
}

impl TrackScrobbleStats {
    pub fn last_played_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.last_played, 0)
    }
}

/// Totals over every play of the album, including plays without a title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumPlaySummary {
    pub plays: u32,
    pub last_played: Option<i64>,
}

/// Per-title statistics built from one [`AlbumHistory`] snapshot.
///
/// The index is rebuilt from scratch whenever the history changes; there is
/// no incremental update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryIndex {
    stats: HashMap<String, TrackScrobbleStats>,
    summary: AlbumPlaySummary,
}

impl HistoryIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(history: &AlbumHistory) -> Self {
        if !history.found {
            return Self::empty();
        }

        let mut stats: HashMap<String, TrackScrobbleStats> = HashMap::new();
        let mut summary = AlbumPlaySummary::default();

        for play in &history.plays {
            summary.plays += 1;
            summary.last_played = Some(
                summary
                    .last_played
                    .map_or(play.timestamp, |t| t.max(play.timestamp)),
            );

            let Some(key) = play_key(play) else {
                continue;
            };
            stats
                .entry(key)
                .and_modify(|s| {
                    s.count += 1;
                    s.last_played = s.last_played.max(play.timestamp);
                })
                .or_insert(TrackScrobbleStats {
                    count: 1,
                    last_played: play.timestamp,
                });
        }

        log::debug!(
            "Indexed {} plays across {} distinct titles",
            summary.plays,
            stats.len()
        );
        Self { stats, summary }
    }

    /// Stats for a tracklist title; `None` when it was never played.
    pub fn stats_for(&self, title: &str) -> Option<&TrackScrobbleStats> {
        self.stats.get(&normalize_title(title))
    }

    pub fn summary(&self) -> AlbumPlaySummary {
        self.summary
    }

    pub fn is_empty(&self) -> bool {
        self.summary.plays == 0
    }
}

fn play_key(play: &HistoryPlay) -> Option<String> {
    let title = play.track.as_deref()?;
    let key = normalize_title(title);
    (!key.is_empty()).then_some(key)
}
