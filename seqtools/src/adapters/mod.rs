//! Constructors turning collections, maps, text, and live feeds into [`Sequence`]s.
//!
//! Only sequences built from a fixed collection ([`Sequence::from_vec`] and friends) carry the fast
//! path. Everything else starts on the generic path.

mod utf8;

use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, PoisonError};

use self::utf8::Utf8Decoder;
use crate::Element;
use crate::sequence::Sequence;
use crate::sequence::fast_path::FastPath;

impl<T> Sequence<T>
where
    T: Element,
{
    /// Sequence over an owned collection. Fast-path eligible.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::from_arc(Arc::from(items))
    }

    /// Sequence over a copy of `items`. Fast-path eligible.
    pub fn from_slice(items: &[T]) -> Self {
        Self::from_arc(Arc::from(items))
    }

    /// Sequence over a shared collection, without copying it. Fast-path eligible.
    pub fn from_arc(items: Arc<[T]>) -> Self {
        Self::from_fast(FastPath::new(items))
    }

    /// The empty sequence.
    pub fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Re-runnable generic sequence: `factory` is called for a fresh iterator on every pull.
    pub fn from_fn<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_factory(0, move || (factory)().into_iter())
    }

    /// Live feed, consumed exactly once and in order.
    ///
    /// The first pull takes ownership of `iter`; every later pull sees an empty sequence.
    pub fn from_iter_once<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let slot = Mutex::new(Some(iter));
        Self::from_factory(lower, move || {
            slot.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
                .into_iter()
                .flatten()
        })
    }

    /// Live feed from a channel. Pulls block until the next item arrives or every sender is dropped.
    pub fn from_receiver(receiver: Receiver<T>) -> Self {
        Self::from_iter_once(receiver)
    }

    /// `value` repeated `count` times.
    pub fn repeat(value: T, count: usize) -> Self {
        Self::from_factory(count, move || std::iter::repeat_n(value.clone(), count))
    }
}

impl Sequence<i64> {
    /// The `count` consecutive integers starting at `start`.
    pub fn range(start: i64, count: usize) -> Self {
        let end = start.saturating_add(i64::try_from(count).unwrap_or(i64::MAX));
        Self::from_factory(count, move || start..end)
    }
}

impl<K, V> Sequence<(K, V)>
where
    K: Element,
    V: Element,
{
    /// Snapshot of a map's entries. Entry order is whatever the map iterates in, fixed for the
    /// snapshot.
    pub fn from_map<S>(map: HashMap<K, V, S>) -> Self {
        Self::from_vec(map.into_iter().collect())
    }
}

impl Sequence<char> {
    /// Decodes `bytes` as UTF-8, one `char` per code point, incrementally on each pull.
    ///
    /// Each byte which is not part of a valid encoding yields one [`char::REPLACEMENT_CHARACTER`].
    pub fn from_utf8(bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self::from_factory(bytes.len(), move || Utf8Decoder::new(Arc::clone(&bytes)))
    }

    /// The characters of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::from_utf8(text.as_bytes())
    }
}

impl<T> From<Vec<T>> for Sequence<T>
where
    T: Element,
{
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T> From<Arc<[T]>> for Sequence<T>
where
    T: Element,
{
    fn from(items: Arc<[T]>) -> Self {
        Self::from_arc(items)
    }
}

impl<T> FromIterator<T> for Sequence<T>
where
    T: Element,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}
