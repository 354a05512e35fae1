//! [`Comparator`], a short-circuiting chain of sort keys.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

type CompareFn<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A chain of comparison keys, most significant first.
///
/// Keys are consulted in order and the first non-[`Ordering::Equal`] result wins, so secondary keys
/// are only evaluated to break ties in the primary key.
pub struct Comparator<T> {
    keys: SmallVec<[CompareFn<T>; 2]>,
}

impl<T> Clone for Comparator<T> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
        }
    }
}

impl<T> fmt::Debug for Comparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparator")
            .field("keys", &self.keys.len())
            .finish()
    }
}

impl<T> Comparator<T> {
    /// Single-key comparator from an arbitrary comparison function.
    pub fn by<F>(compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let mut keys = SmallVec::new();
        keys.push(Arc::new(compare) as CompareFn<T>);
        Self { keys }
    }

    /// Ascending on `key`.
    pub fn asc<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::by(move |a, b| (key)(a).cmp(&(key)(b)))
    }

    /// Descending on `key`.
    pub fn desc<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::by(move |a, b| (key)(b).cmp(&(key)(a)))
    }

    /// Appends the keys of `next` as tie-breakers.
    pub fn then(mut self, next: Comparator<T>) -> Self {
        self.keys.extend(next.keys);
        self
    }

    /// Compares by each key in turn, stopping at the first one that differs.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.keys
            .iter()
            .map(|key| (key)(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Number of keys in the chain.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the chain has no keys, in which case everything compares equal.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
