//! Fast-path descriptor for sequences backed by a fixed, randomly-indexable collection.
//!
//! A [`FastPath`] remembers the original backing slice, the index range still in view, and the
//! conjunction of every filter applied so far. Operators that can preserve it (filter, take, skip)
//! return a new descriptor over the same backing instead of wrapping the previous iterator.

use std::ops::Range;
use std::sync::Arc;

use smallvec::SmallVec;

/// Shared element predicate.
pub(crate) type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Fused filter clauses, evaluated left to right and short-circuiting on the first failure.
pub(crate) struct Conjunction<T> {
    clauses: SmallVec<[Predicate<T>; 4]>,
}

impl<T> Conjunction<T> {
    pub(crate) fn test(&self, item: &T) -> bool {
        self.clauses.iter().all(|clause| clause(item))
    }

    pub(crate) fn len(&self) -> usize {
        self.clauses.len()
    }
}

/// Backing collection, the range of it still in view, and the accumulated predicate.
pub(crate) struct FastPath<T> {
    backing: Arc<[T]>,
    range: Range<usize>,
    conjunction: Option<Arc<Conjunction<T>>>,
}

impl<T> Clone for FastPath<T> {
    fn clone(&self) -> Self {
        Self {
            backing: Arc::clone(&self.backing),
            range: self.range.clone(),
            conjunction: self.conjunction.clone(),
        }
    }
}

impl<T> FastPath<T> {
    pub(crate) fn new(backing: Arc<[T]>) -> Self {
        let range = 0..backing.len();
        Self {
            backing,
            range,
            conjunction: None,
        }
    }

    /// No filter has been fused in, so every element in range is yielded.
    pub(crate) fn is_pure(&self) -> bool {
        self.conjunction.is_none()
    }

    /// Number of backing elements in view, before filtering.
    pub(crate) fn span(&self) -> usize {
        self.range.len()
    }

    /// Backing elements in view, before filtering.
    pub(crate) fn window(&self) -> &[T] {
        &self.backing[self.range.clone()]
    }

    pub(crate) fn admits(&self, item: &T) -> bool {
        self.conjunction
            .as_ref()
            .is_none_or(|conjunction| conjunction.test(item))
    }

    pub(crate) fn clause_count(&self) -> usize {
        self.conjunction.as_ref().map_or(0, |c| c.len())
    }

    /// Fuses `predicate` into the accumulated conjunction. The backing collection is unchanged.
    pub(crate) fn with_clause(self, predicate: Predicate<T>) -> Self {
        let mut clauses = self
            .conjunction
            .as_ref()
            .map(|conjunction| conjunction.clauses.clone())
            .unwrap_or_default();
        clauses.push(predicate);
        Self {
            backing: self.backing,
            range: self.range,
            conjunction: Some(Arc::new(Conjunction { clauses })),
        }
    }

    /// Narrows the view by dropping the first `count` elements. Only meaningful when pure.
    pub(crate) fn skip(self, count: usize) -> Self {
        debug_assert!(self.is_pure());
        let start = self.range.start.saturating_add(count).min(self.range.end);
        Self {
            range: start..self.range.end,
            ..self
        }
    }

    /// Narrows the view to the first `count` elements. Only meaningful when pure.
    pub(crate) fn take(self, count: usize) -> Self {
        debug_assert!(self.is_pure());
        let end = self.range.start.saturating_add(count).min(self.range.end);
        Self {
            range: self.range.start..end,
            ..self
        }
    }

    pub(crate) fn iter(&self) -> FastIter<T> {
        FastIter {
            backing: Arc::clone(&self.backing),
            front: self.range.start,
            back: self.range.end,
            conjunction: self.conjunction.clone(),
        }
    }
}

impl<T> FastPath<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Backing elements at in-view offsets `offset, offset + step, ...`, before filtering.
    ///
    /// Used to hand each concurrent worker a disjoint static share of the backing collection. The
    /// worker applies [`FastPath::admits`] itself, so a panicking clause is isolated per element.
    pub(crate) fn stride(
        &self,
        offset: usize,
        step: usize,
    ) -> impl Iterator<Item = T> + Send + use<T> {
        let backing = Arc::clone(&self.backing);
        (self.range.start.saturating_add(offset)..self.range.end)
            .step_by(step.max(1))
            .map(move |idx| backing[idx].clone())
    }
}

/// Single flat scan over a [`FastPath`], cloning out each admitted element.
pub(crate) struct FastIter<T> {
    backing: Arc<[T]>,
    front: usize,
    back: usize,
    conjunction: Option<Arc<Conjunction<T>>>,
}

impl<T> FastIter<T> {
    fn admits(&self, idx: usize) -> bool {
        self.conjunction
            .as_ref()
            .is_none_or(|conjunction| conjunction.test(&self.backing[idx]))
    }
}

impl<T> Iterator for FastIter<T>
where
    T: Clone,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        while self.front < self.back {
            let idx = self.front;
            self.front += 1;
            if self.admits(idx) {
                return Some(self.backing[idx].clone());
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        if self.conjunction.is_none() {
            (remaining, Some(remaining))
        } else {
            (0, Some(remaining))
        }
    }
}

impl<T> DoubleEndedIterator for FastIter<T>
where
    T: Clone,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        while self.front < self.back {
            self.back -= 1;
            let idx = self.back;
            if self.admits(idx) {
                return Some(self.backing[idx].clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fast(items: &[i32]) -> FastPath<i32> {
        FastPath::new(Arc::from(items))
    }

    #[test]
    fn test_clauses_stay_flat() {
        let mut path = fast(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        for modulus in [2, 3, 5] {
            path = path.with_clause(Arc::new(move |x: &i32| x % modulus != 0));
        }
        assert_eq!(3, path.clause_count());
        assert_eq!(vec![1, 7], path.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_skip_take_are_views() {
        let path = fast(&[1, 2, 3, 4, 5]).skip(1).take(3);
        assert_eq!(&[2, 3, 4], path.window());
        assert_eq!(vec![2, 3, 4], path.iter().collect::<Vec<_>>());

        let past_end = fast(&[1, 2, 3]).skip(10);
        assert_eq!(0, past_end.span());
        assert_eq!(None, past_end.iter().next());
    }

    #[test]
    fn test_next_back_respects_clauses() {
        let path = fast(&[1, 2, 3, 4, 5, 6]).with_clause(Arc::new(|x: &i32| x % 2 == 1));
        assert_eq!(vec![5, 3, 1], path.iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_stride_partitions() {
        let path = fast(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]).skip(1);
        let mut all = (0..3).flat_map(|w| path.stride(w, 3)).collect::<Vec<_>>();
        all.sort_unstable();
        assert_eq!(vec![1, 2, 3, 4, 5, 6, 7, 8, 9], all);
        assert_eq!(vec![1, 4, 7], path.stride(0, 3).collect::<Vec<_>>());
    }

    #[test]
    fn test_stride_leaves_clauses_to_the_worker() {
        let path = fast(&[0, 1, 2, 3, 4, 5]).with_clause(Arc::new(|x: &i32| x % 2 == 0));
        let share = path.stride(1, 2).collect::<Vec<_>>();
        assert_eq!(vec![1, 3, 5], share);
        assert!(share.iter().all(|x| !path.admits(x)));
    }
}
