use crate::types::TrackDuration;

/// Seconds assumed for a track whose length is unknown or unreadable.
pub const DEFAULT_TRACK_SECONDS: u64 = 180;

/// Convert a catalog duration into whole seconds.
///
/// Numbers are taken as seconds. Strings must be exactly `MM:SS` (two
/// colon-separated unsigned integers); anything else, and a missing
/// duration, yields [`DEFAULT_TRACK_SECONDS`]. This never fails.
///
/// ```rust
/// use release_scrobbler::duration::parse_duration;
/// use release_scrobbler::TrackDuration;
///
/// assert_eq!(parse_duration(Some(&TrackDuration::from("3:30"))), 210);
/// assert_eq!(parse_duration(Some(&TrackDuration::from(125))), 125);
/// assert_eq!(parse_duration(None), 180);
/// ```
pub fn parse_duration(duration: Option<&TrackDuration>) -> u64 {
    match duration {
        Some(TrackDuration::Seconds(seconds)) => *seconds,
        Some(TrackDuration::Text(text)) => parse_minutes_seconds(text).unwrap_or_else(|| {
            log::debug!("Unreadable duration {text:?}, assuming {DEFAULT_TRACK_SECONDS}s");
            DEFAULT_TRACK_SECONDS
        }),
        None => DEFAULT_TRACK_SECONDS,
    }
}

fn parse_minutes_seconds(text: &str) -> Option<u64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    match parts.as_slice() {
        [minutes, seconds] => {
            let minutes: u64 = parse_unsigned(minutes)?;
            let seconds: u64 = parse_unsigned(seconds)?;
            minutes.checked_mul(60)?.checked_add(seconds)
        }
        _ => None,
    }
}

// `str::parse` accepts a leading '+', which is not a valid duration digit.
fn parse_unsigned(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Render seconds as `M:SS` (or `H:MM:SS` past an hour) for display.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
