//! Pre-submission check for catalog disambiguation suffixes.
//!
//! Catalogs tell same-named artists apart with a trailing number in
//! parentheses ("Boris (2)"). The tracking service knows no such artist, so
//! scrobbling the raw name creates a bogus artist unless a name mapping
//! exists. Flagged artists must be confirmed by the user before submission.

use crate::backend::ScrobbleBackend;
use crate::selection::Selection;
use crate::types::Release;
use futures::future::join_all;
use regex::Regex;
use std::sync::LazyLock;

static DISAMBIGUATION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\(\d+\)\s*$").expect("disambiguation suffix pattern is valid")
});

/// Outcome of running the guard over a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Nothing suspicious; submit right away.
    Proceed,
    /// These artists carry a suffix and have no usable mapping.
    NeedsConfirmation(Vec<String>),
}

pub fn has_disambiguation_suffix(name: &str) -> bool {
    DISAMBIGUATION_SUFFIX.is_match(name)
}

/// `"Boris (2)"` -> `"Boris"`; names without a suffix are returned unchanged.
pub fn strip_disambiguation_suffix(name: &str) -> &str {
    match DISAMBIGUATION_SUFFIX.find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

/// Unique artist names across the selection, in first-seen track order.
///
/// Each track uses its own artist credit and falls back to the release artist.
pub fn selected_artists(release: &Release, selection: &Selection) -> Vec<String> {
    let mut artists: Vec<String> = Vec::new();
    for index in selection.iter() {
        let artist = release.artist_for(index);
        if !artists.iter().any(|a| a == artist) {
            artists.push(artist.to_string());
        }
    }
    artists
}

/// Look up every suffixed artist and return those still unmapped.
///
/// An artist is unmapped when the backend has no mapping or the mapping
/// points at the unchanged name. A failed lookup counts as unmapped so the
/// user still gets asked. Lookups for different artists run concurrently.
pub async fn find_unmapped_artists<B>(backend: &B, artists: &[String]) -> Vec<String>
where
    B: ScrobbleBackend + ?Sized,
{
    let flagged: Vec<&String> = artists
        .iter()
        .filter(|a| has_disambiguation_suffix(a))
        .collect();
    if flagged.is_empty() {
        return Vec::new();
    }

    let lookups = flagged.iter().map(|artist| async move {
        match backend.lookup_artist_mapping(artist).await {
            Ok(mapping) => {
                let unmapped = !mapping.has_mapping || mapping.lastfm_name == **artist;
                log::debug!(
                    "Artist mapping for {artist:?}: has_mapping={} target={:?}",
                    mapping.has_mapping,
                    mapping.lastfm_name
                );
                unmapped
            }
            Err(e) => {
                log::warn!("Artist mapping lookup for {artist:?} failed: {e}");
                true
            }
        }
    });
    let results = join_all(lookups).await;

    flagged
        .into_iter()
        .zip(results)
        .filter(|(_, unmapped)| *unmapped)
        .map(|(artist, _)| artist.clone())
        .collect()
}

/// Run the full guard for a selection.
pub async fn check_selection<B>(
    backend: &B,
    release: &Release,
    selection: &Selection,
) -> GuardOutcome
where
    B: ScrobbleBackend + ?Sized,
{
    let artists = selected_artists(release, selection);
    let unmapped = find_unmapped_artists(backend, &artists).await;
    if unmapped.is_empty() {
        GuardOutcome::Proceed
    } else {
        log::info!("Unmapped disambiguated artists: {}", unmapped.join(", "));
        GuardOutcome::NeedsConfirmation(unmapped)
    }
}
