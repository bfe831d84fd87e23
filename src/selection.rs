use crate::topology::{disc_track_indices, side_track_indices};
use crate::types::Release;
use std::collections::BTreeSet;

/// The set of selected track indices for one release.
///
/// Only selectable (non-header) tracks can ever be members. Storage order is
/// irrelevant, but iteration is always ascending so timing follows tracklist
/// order no matter the order in which tracks were toggled.
///
/// Side and disc toggles are all-or-nothing: if every track of the group is
/// already selected the group is deselected, otherwise the whole group is
/// selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    indices: BTreeSet<usize>,
}

impl Selection {
    /// An empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every selectable track of `release`.
    pub fn all_selectable(release: &Release) -> Self {
        Self {
            indices: release.selectable_indices().collect(),
        }
    }

    /// Reset to every selectable track, as when a release is loaded.
    pub fn initialize_to_all_selectable(&mut self, release: &Release) {
        *self = Self::all_selectable(release);
    }

    /// Add or remove a single track. Headers and out-of-range indices are ignored.
    ///
    /// Returns whether the track is selected afterwards.
    pub fn toggle_track(&mut self, release: &Release, index: usize) -> bool {
        if !is_selectable(release, index) {
            return false;
        }
        if self.indices.remove(&index) {
            false
        } else {
            self.indices.insert(index);
            true
        }
    }

    pub fn toggle_side(&mut self, release: &Release, side: char) {
        let indices = side_track_indices(release, side);
        self.toggle_group(release, &indices);
    }

    pub fn toggle_disc(&mut self, release: &Release, sides: &[char]) {
        let indices = disc_track_indices(release, sides);
        self.toggle_group(release, &indices);
    }

    /// Clear when everything selectable is selected, otherwise select everything.
    pub fn toggle_all(&mut self, release: &Release) {
        if self.indices.len() == release.selectable_count() {
            self.indices.clear();
        } else {
            self.initialize_to_all_selectable(release);
        }
    }

    pub fn is_side_selected(&self, release: &Release, side: char) -> bool {
        self.covers(&side_track_indices(release, side))
    }

    pub fn is_disc_selected(&self, release: &Release, sides: &[char]) -> bool {
        self.covers(&disc_track_indices(release, sides))
    }

    pub fn is_all_selected(&self, release: &Release) -> bool {
        let total = release.selectable_count();
        total > 0 && self.indices.len() == total
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Selected indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    fn toggle_group(&mut self, release: &Release, indices: &[usize]) {
        let members: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| is_selectable(release, i))
            .collect();
        if members.is_empty() {
            return;
        }
        if self.covers(&members) {
            for index in &members {
                self.indices.remove(index);
            }
        } else {
            self.indices.extend(members);
        }
    }

    // An empty group is never "selected".
    fn covers(&self, indices: &[usize]) -> bool {
        !indices.is_empty() && indices.iter().all(|i| self.indices.contains(i))
    }
}

fn is_selectable(release: &Release, index: usize) -> bool {
    release
        .tracks
        .get(index)
        .is_some_and(|t| t.is_selectable())
}
