//! Terminal operators: the only place a sequence is actually run.
//!
//! Each terminal starts a fresh pull from the original source. Where the input is on the fast path,
//! the backing window is scanned directly, testing the fused conjunction inline, instead of going
//! through the cursor.

mod stats;

use std::hash::Hash;

use futures::Stream;
use rustc_hash::FxHashMap;

use crate::Element;
use crate::error::Error;
use crate::membership;
use crate::pool::BufferPool;
use crate::sequence::Sequence;

impl<T> Sequence<T>
where
    T: Element,
{
    /// Collects every element into a new vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.append_to(Vec::new())
    }

    /// Collects every element onto the end of `dest`.
    pub fn append_to(&self, mut dest: Vec<T>) -> Vec<T> {
        match self.fast_path() {
            Some(fast) if fast.is_pure() => dest.extend_from_slice(fast.window()),
            Some(fast) => {
                // Half the window is only a guess at selectivity.
                dest.reserve(fast.span() / 2 + 1);
                dest.extend(
                    fast.window()
                        .iter()
                        .filter(|item| fast.admits(item))
                        .cloned(),
                );
            }
            None => dest.extend(self.iter()),
        }
        dest
    }

    /// Collects into a buffer drawn from `pool`. Hand the result back with [`BufferPool::release`]
    /// once done with it.
    pub fn to_vec_pooled(&self, pool: &BufferPool<T>) -> Vec<T> {
        self.append_to(pool.acquire(self.size_hint()))
    }

    /// Indexes the elements by `key`. A later element replaces an earlier one with the same key.
    pub fn to_map<K, F>(&self, key: F) -> FxHashMap<K, T>
    where
        K: Eq + Hash,
        F: Fn(&T) -> K,
    {
        self.to_map_select(key, |item| item)
    }

    /// Like [`Sequence::to_map`], storing `value(item)` instead of the item.
    pub fn to_map_select<K, V, F, G>(&self, key: F, value: G) -> FxHashMap<K, V>
    where
        K: Eq + Hash,
        F: Fn(&T) -> K,
        G: Fn(T) -> V,
    {
        self.iter().map(|item| (key(&item), value(item))).collect()
    }

    /// The elements as a [`Stream`], pulled from a fresh run of the sequence.
    pub fn into_stream(&self) -> impl Stream<Item = T> + Send + Unpin + use<T> {
        futures::stream::iter(self.iter())
    }

    /// Number of elements. Free for an unfiltered fast-path sequence.
    pub fn count(&self) -> usize {
        match self.fast_path() {
            Some(fast) if fast.is_pure() => fast.span(),
            Some(fast) => fast.window().iter().filter(|item| fast.admits(item)).count(),
            None => self.iter().count(),
        }
    }

    /// Number of elements satisfying `predicate`.
    pub fn count_by<F>(&self, predicate: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        self.iter().filter(|item| predicate(item)).count()
    }

    /// Whether the sequence yields anything at all. Stops at the first element.
    pub fn any(&self) -> bool {
        match self.fast_path() {
            Some(fast) if fast.is_pure() => fast.span() > 0,
            _ => self.iter().next().is_some(),
        }
    }

    /// Whether some element satisfies `predicate`. Stops at the first match.
    pub fn any_by<F>(&self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        self.iter().any(|item| predicate(&item))
    }

    /// Whether every element satisfies `predicate`. `true` when empty; stops at the first failure.
    pub fn all<F>(&self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        self.iter().all(|item| predicate(&item))
    }

    /// Whether some element equals `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        match self.fast_path() {
            Some(fast) => fast
                .window()
                .iter()
                .any(|item| item == value && fast.admits(item)),
            None => self.iter().any(|item| &item == value),
        }
    }

    /// The first element, reading nothing past it.
    pub fn first(&self) -> Option<T> {
        self.iter().next()
    }

    /// The first element satisfying `predicate`.
    pub fn first_by<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        self.iter().find(|item| predicate(item))
    }

    /// The first element, or `default` when empty.
    pub fn first_or(&self, default: T) -> T {
        self.first().unwrap_or(default)
    }

    /// The last element. On the fast path this scans backwards from the end of the window.
    pub fn last(&self) -> Option<T> {
        match self.fast_path() {
            Some(fast) => fast.iter().next_back(),
            None => self.iter().last(),
        }
    }

    /// The last element satisfying `predicate`.
    pub fn last_by<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        match self.fast_path() {
            Some(fast) => fast.iter().rev().find(|item| predicate(item)),
            None => self.iter().filter(|item| predicate(item)).last(),
        }
    }

    /// The last element, or `default` when empty.
    pub fn last_or(&self, default: T) -> T {
        self.last().unwrap_or(default)
    }

    /// The only element.
    ///
    /// Stops reading as soon as a second element is seen.
    pub fn single(&self) -> Result<T, Error> {
        exactly_one(self.iter())
    }

    /// The only element satisfying `predicate`.
    pub fn single_by<F>(&self, predicate: F) -> Result<T, Error>
    where
        F: Fn(&T) -> bool,
    {
        exactly_one(self.iter().filter(|item| predicate(item)))
    }

    /// The only element, or `default` if there are none or several.
    pub fn single_or(&self, default: T) -> T {
        self.single().unwrap_or(default)
    }

    /// Position of the first element satisfying `predicate`.
    pub fn index_of<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&T) -> bool,
    {
        self.iter().position(|item| predicate(&item))
    }

    /// Position of the first element equal to `value`.
    pub fn index_of_value(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.iter().position(|item| &item == value)
    }

    /// Position of the last element satisfying `predicate`.
    pub fn last_index_of<F>(&self, predicate: F) -> Option<usize>
    where
        F: Fn(&T) -> bool,
    {
        self.iter()
            .enumerate()
            .filter(|(_, item)| predicate(item))
            .map(|(idx, _)| idx)
            .last()
    }

    /// Runs `action` on every element, in order, on the calling thread.
    ///
    /// A panic in `action` unwinds into the caller. See [`Sequence::for_each_parallel`] for the
    /// isolating variant.
    pub fn for_each<F>(&self, mut action: F)
    where
        F: FnMut(T),
    {
        self.iter().for_each(|item| action(item));
    }

    /// Runs `action` on each element until it returns `false`.
    pub fn for_each_while<F>(&self, mut action: F)
    where
        F: FnMut(T) -> bool,
    {
        for item in self.iter() {
            if !action(item) {
                break;
            }
        }
    }

    /// Runs `action` on each element and its position until it returns `false`.
    pub fn for_each_indexed<F>(&self, mut action: F)
    where
        F: FnMut(usize, T) -> bool,
    {
        for (idx, item) in self.iter().enumerate() {
            if !action(idx, item) {
                break;
            }
        }
    }

    /// Folds every element into `init`, in order.
    pub fn fold<A, F>(&self, init: A, fold: F) -> A
    where
        F: FnMut(A, T) -> A,
    {
        self.iter().fold(init, fold)
    }

    /// Folds using the first element as the initial accumulator. `None` when empty.
    pub fn reduce<F>(&self, reduce: F) -> Option<T>
    where
        F: FnMut(T, T) -> T,
    {
        self.iter().reduce(reduce)
    }
}

impl<T> Sequence<T>
where
    T: Element + Eq + Hash,
{
    /// Whether every element of `probe` occurs in this sequence.
    pub fn contains_all(&self, probe: &[T]) -> bool {
        membership::every(&self.to_vec(), probe)
    }

    /// Whether at least one element of `probe` occurs in this sequence.
    pub fn contains_any(&self, probe: &[T]) -> bool {
        membership::some(&self.to_vec(), probe)
    }

    /// Whether no element of `probe` occurs in this sequence.
    pub fn contains_none(&self, probe: &[T]) -> bool {
        membership::none(&self.to_vec(), probe)
    }
}

fn exactly_one<T>(mut iter: impl Iterator<Item = T>) -> Result<T, Error> {
    let only = iter.next().ok_or(Error::Empty)?;
    match iter.next() {
        Some(_) => Err(Error::MoreThanOne),
        None => Ok(only),
    }
}
