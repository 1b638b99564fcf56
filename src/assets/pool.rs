use std::collections::HashMap;

use rand::Rng;

use crate::{
    assets::handle::AssetHandle,
    foundation::core::AssetId,
    random::sample::shuffle,
};

/// Asset ids currently on screen for one layer.
///
/// Counted, so that a fallback repeat does not free an id while its twin is still shown.
#[derive(Clone, Debug, Default)]
pub struct DisplayedSet {
    counts: HashMap<AssetId, usize>,
}

impl DisplayedSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one more on-screen use of `id`.
    pub fn reserve(&mut self, id: &AssetId) {
        *self.counts.entry(id.clone()).or_insert(0) += 1;
    }

    /// Drop one on-screen use of `id`. Returns `false` if `id` was not displayed.
    pub fn release(&mut self, id: &AssetId) -> bool {
        match self.counts.get_mut(id) {
            Some(n) if *n > 1 => {
                *n -= 1;
                true
            }
            Some(_) => {
                self.counts.remove(id);
                true
            }
            None => false,
        }
    }

    /// Return `true` while at least one element shows `id`.
    pub fn contains(&self, id: &AssetId) -> bool {
        self.counts.contains_key(id)
    }

    /// Number of distinct ids displayed.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Return `true` when nothing is displayed.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Forget every reservation.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

/// Result of an allocation.
#[derive(Clone, Debug)]
pub struct Pick {
    /// Chosen asset.
    pub asset: AssetHandle,
    /// `true` when every asset was displayed and this one is shown twice.
    pub repeat: bool,
}

/// Shuffled, no-repeat-until-exhausted sequence of a layer's assets.
#[derive(Clone, Debug)]
pub struct AssetPool {
    assets: Vec<AssetHandle>,
    sequence: Vec<usize>,
    cursor: usize,
}

impl AssetPool {
    /// Build a pool and shuffle its first pass.
    pub fn new<R: Rng + ?Sized>(assets: Vec<AssetHandle>, rng: &mut R) -> Self {
        let mut pool = Self {
            assets,
            sequence: Vec::new(),
            cursor: 0,
        };
        pool.reshuffle(rng);
        pool
    }

    /// Number of assets known to the pool, including pending ones.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Return `true` when the pool has no assets.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Position within the current shuffled pass.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Look up an asset by id.
    pub fn get(&self, id: &AssetId) -> Option<&AssetHandle> {
        self.assets.iter().find(|a| &a.id == id)
    }

    /// All assets in insertion order.
    pub fn assets(&self) -> &[AssetHandle] {
        &self.assets
    }

    /// Start a fresh shuffled pass over every eligible asset.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.sequence = (0..self.assets.len())
            .filter(|&i| !self.assets[i].is_unavailable())
            .collect();
        shuffle(rng, &mut self.sequence);
        self.cursor = 0;
    }

    /// Replace the stored handle with the same id (decode finished or failed).
    pub fn update(&mut self, handle: AssetHandle) -> bool {
        match self.assets.iter_mut().find(|a| a.id == handle.id) {
            Some(slot) => {
                *slot = handle;
                true
            }
            None => false,
        }
    }

    /// Next asset not in `displayed`, or `None` when every eligible asset is displayed.
    ///
    /// Eligibility is fixed per pass: an asset that fails mid-pass can still be handed
    /// out once, and the caller's creation step is expected to reject it.
    pub fn next<R: Rng + ?Sized>(
        &mut self,
        displayed: &DisplayedSet,
        rng: &mut R,
    ) -> Option<AssetHandle> {
        if self.cursor >= self.sequence.len() {
            self.reshuffle(rng);
        }
        let n = self.sequence.len();
        for step in 0..n {
            let pos = (self.cursor + step) % n;
            let asset = &self.assets[self.sequence[pos]];
            if displayed.contains(&asset.id) {
                continue;
            }
            self.cursor = pos + 1;
            return Some(asset.clone());
        }
        None
    }

    /// Like [`AssetPool::next`], but falls back to a repeat instead of returning `None`
    /// while any eligible asset exists. Reuse is preferable to stalling an ambient layer.
    pub fn next_or_repeat<R: Rng + ?Sized>(
        &mut self,
        displayed: &DisplayedSet,
        rng: &mut R,
    ) -> Option<Pick> {
        if let Some(asset) = self.next(displayed, rng) {
            return Some(Pick {
                asset,
                repeat: false,
            });
        }
        if self.cursor >= self.sequence.len() {
            self.reshuffle(rng);
        }
        let asset = self.assets.get(*self.sequence.get(self.cursor)?)?.clone();
        self.cursor += 1;
        Some(Pick {
            asset,
            repeat: true,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/pool.rs"]
mod tests;
