//! Grouping by key.

use std::collections::hash_map::Entry;
use std::hash::Hash;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::Element;
use crate::sequence::Sequence;
use crate::sequence::deferred::Deferred;

/// One group produced by [`Sequence::group_by`]: a key and every member sharing it, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<K, V> {
    /// Shared key.
    pub key: K,
    /// Members in input order.
    pub members: Vec<V>,
}

impl<T> Sequence<T>
where
    T: Element,
{
    /// Partitions the elements by `key`.
    ///
    /// Groups are emitted in the order their keys first appear. The whole input is read on the first
    /// pull.
    pub fn group_by<K, F>(self, key: F) -> Sequence<Group<K, T>>
    where
        K: Element + Eq + Hash,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.group_by_select(key, |item| item)
    }

    /// Like [`Sequence::group_by`], storing `element(item)` in each group instead of the item.
    pub fn group_by_select<K, V, F, G>(self, key: F, element: G) -> Sequence<Group<K, V>>
    where
        K: Element + Eq + Hash,
        V: Element,
        F: Fn(&T) -> K + Send + Sync + 'static,
        G: Fn(T) -> V + Send + Sync + 'static,
    {
        let key = Arc::new(key);
        let element = Arc::new(element);
        self.wrap(move |iter| {
            let key = Arc::clone(&key);
            let element = Arc::clone(&element);
            Deferred::new(move || {
                let mut slots = FxHashMap::<K, usize>::default();
                let mut groups = Vec::<Group<K, V>>::new();
                for item in iter {
                    let slot = match slots.entry((key)(&item)) {
                        Entry::Occupied(occupied) => *occupied.get(),
                        Entry::Vacant(vacant) => {
                            groups.push(Group {
                                key: vacant.key().clone(),
                                members: Vec::new(),
                            });
                            *vacant.insert(groups.len() - 1)
                        }
                    };
                    groups[slot].members.push((element)(item));
                }
                groups.into_iter()
            })
        })
    }
}
