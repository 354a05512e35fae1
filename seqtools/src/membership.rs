//! Adaptive membership tests between a collection and a probe list.
//!
//! Each test has two strategies. The nested scan costs `O(n * m)` with no allocation and wins for
//! short probe lists. The hashed strategy builds an [`FxHashSet`] over the collection, costing
//! `O(n + m)` plus the allocation. The default entry points choose between them with
//! [`MembershipThresholds`]; the `_nested` and `_hashed` variants force one strategy. Every variant
//! returns the same answer.

use std::hash::Hash;

use rustc_hash::FxHashSet;

/// When to switch from the nested scan to the hashed strategy.
///
/// Hashing is chosen when the probe list is longer than `probe_limit`, or when the collection is
/// longer than `large_collection` and the probe list is longer than `probe_floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipThresholds {
    /// Probe lists longer than this are always hashed.
    pub probe_limit: usize,
    /// Collections longer than this count as large.
    pub large_collection: usize,
    /// Minimum probe length for hashing a large collection.
    pub probe_floor: usize,
}

impl MembershipThresholds {
    /// Defaults for [`every`].
    pub const EVERY: Self = Self {
        probe_limit: 100,
        large_collection: 2000,
        probe_floor: 50,
    };
    /// Defaults for [`some`]. Lower than the others since `some` can stop at the first hit.
    pub const SOME: Self = Self {
        probe_limit: 80,
        large_collection: 5000,
        probe_floor: 30,
    };
    /// Defaults for [`none`].
    pub const NONE: Self = Self {
        probe_limit: 100,
        large_collection: 3000,
        probe_floor: 50,
    };

    /// Whether a collection of `list_len` probed with `probe_len` values should be hashed.
    pub fn prefers_hash(&self, list_len: usize, probe_len: usize) -> bool {
        probe_len > self.probe_limit
            || (list_len > self.large_collection && probe_len > self.probe_floor)
    }
}

/// Whether every element of `probe` occurs in `list`. `true` for an empty probe.
pub fn every<T: Eq + Hash>(list: &[T], probe: &[T]) -> bool {
    every_with(list, probe, &MembershipThresholds::EVERY)
}

/// Like [`every`], choosing the strategy with `thresholds`.
pub fn every_with<T: Eq + Hash>(list: &[T], probe: &[T], thresholds: &MembershipThresholds) -> bool {
    if thresholds.prefers_hash(list.len(), probe.len()) {
        every_hashed(list, probe)
    } else {
        every_nested(list, probe)
    }
}

/// [`every`] by nested scan.
pub fn every_nested<T: PartialEq>(list: &[T], probe: &[T]) -> bool {
    probe.iter().all(|value| list.contains(value))
}

/// [`every`] by hashing `list`.
pub fn every_hashed<T: Eq + Hash>(list: &[T], probe: &[T]) -> bool {
    if probe.is_empty() {
        return true;
    }
    let index = list.iter().collect::<FxHashSet<_>>();
    probe.iter().all(|value| index.contains(value))
}

/// Whether at least one element of `probe` occurs in `list`. `false` if either is empty.
pub fn some<T: Eq + Hash>(list: &[T], probe: &[T]) -> bool {
    some_with(list, probe, &MembershipThresholds::SOME)
}

/// Like [`some`], choosing the strategy with `thresholds`.
pub fn some_with<T: Eq + Hash>(list: &[T], probe: &[T], thresholds: &MembershipThresholds) -> bool {
    if list.is_empty() || probe.is_empty() {
        return false;
    }
    if thresholds.prefers_hash(list.len(), probe.len()) {
        some_hashed(list, probe)
    } else {
        some_nested(list, probe)
    }
}

/// [`some`] by nested scan.
pub fn some_nested<T: PartialEq>(list: &[T], probe: &[T]) -> bool {
    probe.iter().any(|value| list.contains(value))
}

/// [`some`] by hashing `list`.
pub fn some_hashed<T: Eq + Hash>(list: &[T], probe: &[T]) -> bool {
    if list.is_empty() || probe.is_empty() {
        return false;
    }
    let index = list.iter().collect::<FxHashSet<_>>();
    probe.iter().any(|value| index.contains(value))
}

/// Whether no element of `probe` occurs in `list`. `true` if either is empty.
pub fn none<T: Eq + Hash>(list: &[T], probe: &[T]) -> bool {
    none_with(list, probe, &MembershipThresholds::NONE)
}

/// Like [`none`], choosing the strategy with `thresholds`.
pub fn none_with<T: Eq + Hash>(list: &[T], probe: &[T], thresholds: &MembershipThresholds) -> bool {
    if list.is_empty() || probe.is_empty() {
        return true;
    }
    if thresholds.prefers_hash(list.len(), probe.len()) {
        none_hashed(list, probe)
    } else {
        none_nested(list, probe)
    }
}

/// [`none`] by nested scan.
pub fn none_nested<T: PartialEq>(list: &[T], probe: &[T]) -> bool {
    !some_nested(list, probe)
}

/// [`none`] by hashing `list`.
pub fn none_hashed<T: Eq + Hash>(list: &[T], probe: &[T]) -> bool {
    !some_hashed(list, probe)
}
