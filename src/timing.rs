//! Timestamp assignment for a batch of selected tracks.
//!
//! Tracks play back to back in ascending tracklist order with a one second
//! gap between them. The start time is either set explicitly by the user or
//! derived so that the last selected track finishes "now".

use crate::duration::parse_duration;
use crate::selection::Selection;
use crate::types::{Release, ScrobbleBatch, ScrobbleEntry};
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone};
use std::fmt;

/// Seconds added after every track.
pub const INTER_TRACK_GAP: u64 = 1;

/// Size of one manual nudge step, in minutes.
pub const NUDGE_MINUTES: i64 = 5;

const INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// How the start of a batch is chosen.
///
/// `start == None` is auto mode ("just finished"): the start is recomputed
/// from the current time every time it is needed and never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingPlan {
    /// Explicit unix start timestamp chosen by the user
    pub start: Option<i64>,
}

impl TimingPlan {
    pub fn auto() -> Self {
        Self { start: None }
    }

    pub fn explicit(start: i64) -> Self {
        Self { start: Some(start) }
    }

    pub fn is_auto(&self) -> bool {
        self.start.is_none()
    }

    /// Start timestamp for the current selection, or `None` when nothing is selected.
    pub fn resolve_start(&self, release: &Release, selection: &Selection, now: i64) -> Option<i64> {
        if selection.is_empty() {
            return None;
        }
        match self.start {
            Some(start) => Some(start),
            None => Some(auto_start(release, selection, now)),
        }
    }

    /// Build the timestamped batch, or `None` when nothing is selected.
    pub fn build_batch(
        &self,
        release: &Release,
        selection: &Selection,
        now: i64,
    ) -> Option<ScrobbleBatch> {
        let start = self.resolve_start(release, selection, now)?;
        Some(build_batch(release, selection, start))
    }

    /// Human readable summary of when the selection will be recorded as played.
    pub fn display<Tz>(
        &self,
        release: &Release,
        selection: &Selection,
        now: i64,
        tz: &Tz,
    ) -> Option<String>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let start = self.resolve_start(release, selection, now)?;
        let end = start.saturating_add(as_offset(total_duration(release, selection)));
        let start = format_local_datetime(start, tz);
        let end = format_local_datetime(end, tz);
        Some(if self.is_auto() {
            format!("Auto Timing (Just Finished): {start} to {end}")
        } else {
            format!("Starting {start}, ending {end}")
        })
    }
}

/// Seconds attributed to one track, including the trailing gap.
pub fn track_slot(release: &Release, index: usize) -> u64 {
    let duration = release
        .tracks
        .get(index)
        .map(|t| parse_duration(t.duration.as_ref()))
        .unwrap_or(0);
    duration.saturating_add(INTER_TRACK_GAP)
}

/// Sum of `duration + gap` over the selection.
pub fn total_duration(release: &Release, selection: &Selection) -> u64 {
    selection
        .iter()
        .map(|i| track_slot(release, i))
        .fold(0, u64::saturating_add)
}

/// Start time at which the selection would finish exactly at `now`.
pub fn auto_start(release: &Release, selection: &Selection, now: i64) -> i64 {
    now.saturating_sub(as_offset(total_duration(release, selection)))
}

// Durations come from catalog data; clamp instead of wrapping.
fn as_offset(seconds: u64) -> i64 {
    i64::try_from(seconds).unwrap_or(i64::MAX)
}

/// Assign timestamps starting at `start`, in ascending track order.
pub fn build_batch(release: &Release, selection: &Selection, start: i64) -> ScrobbleBatch {
    let mut timestamp = start;
    let mut entries = Vec::with_capacity(selection.len());

    for index in selection.iter() {
        let Some(track) = release.tracks.get(index) else {
            continue;
        };
        let duration = parse_duration(track.duration.as_ref());
        entries.push(ScrobbleEntry {
            track_index: index,
            position: track.position.trim().to_string(),
            artist: release.artist_for(index).to_string(),
            track: track.title.clone(),
            album: release.title.clone(),
            album_artist: release.artist.clone(),
            timestamp,
            duration,
        });
        timestamp = timestamp.saturating_add(as_offset(duration.saturating_add(INTER_TRACK_GAP)));
    }

    log::debug!(
        "Built batch of {} scrobbles starting at {start}",
        entries.len()
    );
    ScrobbleBatch { entries }
}

/// Shift `timestamp` by `steps` × 5 minutes on the wall clock of `tz`.
///
/// The arithmetic runs on local calendar components so hour, day, month and
/// year boundaries carry over. When the shifted wall-clock time does not
/// exist in `tz` (a DST gap) the shift is applied to the absolute instant.
/// When it exists twice (a DST overlap) the occurrence closest to the
/// absolute shift wins.
pub fn nudge<Tz: TimeZone>(timestamp: i64, steps: i64, tz: &Tz) -> i64 {
    let delta = Duration::minutes(NUDGE_MINUTES.saturating_mul(steps));
    let target = timestamp.saturating_add(delta.num_seconds());
    let Some(local) = tz.timestamp_opt(timestamp, 0).earliest() else {
        return target;
    };
    match local.naive_local().checked_add_signed(delta) {
        Some(shifted) => closest_instant(tz.from_local_datetime(&shifted), target),
        None => target,
    }
}

/// Pick the candidate instant nearest to `target`; `target` itself if none exists.
fn closest_instant<Tz: TimeZone>(candidates: LocalResult<DateTime<Tz>>, target: i64) -> i64 {
    match candidates {
        LocalResult::Single(dt) => dt.timestamp(),
        LocalResult::Ambiguous(first, second) => {
            let (first, second) = (first.timestamp(), second.timestamp());
            if first.abs_diff(target) <= second.abs_diff(target) {
                first
            } else {
                second
            }
        }
        LocalResult::None => target,
    }
}

/// Parse a user-entered local date and time (`YYYY-MM-DDTHH:MM` and close variants).
pub fn parse_local_datetime<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<i64> {
    let text = text.trim();
    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.timestamp())
}

pub fn format_local_datetime<Tz>(timestamp: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    match tz.timestamp_opt(timestamp, 0).earliest() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}
