//! Side and disc structure of a release, derived from track position labels.
//!
//! Vinyl and cassette catalogs label tracks `A1`, `A2`, `B1`, ...; the leading
//! letter names the physical side. Sides pair up two per disc in alphabetical
//! order (A and B on disc 1, C and D on disc 2, ...). Labels that are not a
//! single uppercase letter followed by digits (`1`, `CD1-3`, `AA1`, empty)
//! contribute no side.

use crate::types::Release;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static SIDE_POSITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z])(\d*)$").expect("side position pattern is valid"));

/// A group of sides pressed on the same physical disc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disc {
    /// 1-based disc number
    pub number: u32,
    /// Member sides in ascending order
    pub sides: Vec<char>,
}

impl Disc {
    pub fn label(&self) -> String {
        format!("Disc {}", self.number)
    }
}

impl fmt::Display for Disc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sides: String = self.sides.iter().collect();
        write!(f, "Disc {} ({sides})", self.number)
    }
}

/// Resolved side/disc layout of a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideTopology {
    /// Distinct side letters in ascending order
    pub sides: Vec<char>,
    /// Discs in ascending order of number
    pub discs: Vec<Disc>,
}

impl SideTopology {
    /// Derive the topology from a release's tracklist.
    pub fn resolve(release: &Release) -> Self {
        let mut sides: Vec<char> = Vec::new();
        let mut discs: BTreeMap<u32, Vec<char>> = BTreeMap::new();

        for track in &release.tracks {
            let Some(side) = side_letter(&track.position) else {
                continue;
            };
            if !sides.contains(&side) {
                sides.push(side);
            }
            let members = discs.entry(disc_number(side)).or_default();
            if !members.contains(&side) {
                members.push(side);
            }
        }

        sides.sort_unstable();
        let discs = discs
            .into_iter()
            .map(|(number, mut sides)| {
                sides.sort_unstable();
                Disc { number, sides }
            })
            .collect();

        Self { sides, discs }
    }

    /// Side and disc controls only make sense for more than one side.
    pub fn is_multi_side(&self) -> bool {
        self.sides.len() > 1
    }

    /// Discs keyed by their display label ("Disc 1", "Disc 2", ...).
    pub fn disc_map(&self) -> BTreeMap<String, Vec<char>> {
        self.discs
            .iter()
            .map(|d| (d.label(), d.sides.clone()))
            .collect()
    }

    pub fn disc(&self, number: u32) -> Option<&Disc> {
        self.discs.iter().find(|d| d.number == number)
    }
}

/// Side letter of a position label, if it is of the form `^[A-Z]\d*$`.
pub fn side_letter(position: &str) -> Option<char> {
    SIDE_POSITION
        .captures(position.trim())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().chars().next())
}

/// Disc a side belongs to: `floor(letter_index / 2) + 1`.
pub fn disc_number(side: char) -> u32 {
    let letter_index = u32::from(side).saturating_sub(u32::from('A'));
    letter_index / 2 + 1
}

/// Indices of every track on `side`, in tracklist order.
pub fn side_track_indices(release: &Release, side: char) -> Vec<usize> {
    release
        .tracks
        .iter()
        .enumerate()
        .filter(|(_, t)| t.position.trim().starts_with(side))
        .map(|(i, _)| i)
        .collect()
}

/// Indices of every track on any of `sides`, grouped side by side.
pub fn disc_track_indices(release: &Release, sides: &[char]) -> Vec<usize> {
    sides
        .iter()
        .flat_map(|&side| side_track_indices(release, side))
        .collect()
}
