//! Reusable buffers for repeated materialization.

use std::sync::{Mutex, PoisonError};

/// Thread-safe pool of reusable `Vec<T>` buffers.
///
/// Buffers come back from [`BufferPool::release`] emptied but with their capacity intact, and are
/// handed out again by [`BufferPool::acquire`]. Holding a buffer never blocks other callers.
#[derive(Debug)]
pub struct BufferPool<T> {
    free: Mutex<Vec<Vec<T>>>,
    max_retained: usize,
}

impl<T> Default for BufferPool<T> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETAINED)
    }
}

impl<T> BufferPool<T> {
    /// Retention limit used by [`BufferPool::default`].
    pub const DEFAULT_MAX_RETAINED: usize = 64;

    /// Creates a pool which keeps at most `max_retained` idle buffers.
    pub fn new(max_retained: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            max_retained,
        }
    }

    /// An empty buffer with capacity for at least `min_capacity` elements.
    ///
    /// Reuses a retained buffer which is already large enough if there is one, else grows the most
    /// recently released buffer, else allocates.
    pub fn acquire(&self, min_capacity: usize) -> Vec<T> {
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        let reused = match free.iter().rposition(|buf| buf.capacity() >= min_capacity) {
            Some(idx) => Some(free.swap_remove(idx)),
            None => free.pop(),
        };
        drop(free);

        match reused {
            Some(mut buf) => {
                buf.reserve(min_capacity);
                tracing::trace!(capacity = buf.capacity(), "Reusing pooled buffer.");
                buf
            }
            None => Vec::with_capacity(min_capacity),
        }
    }

    /// Returns `buf` to the pool. Its contents are dropped; its capacity is kept for reuse.
    pub fn release(&self, mut buf: Vec<T>) {
        if buf.capacity() == 0 {
            return;
        }
        buf.clear();
        let mut free = self.free.lock().unwrap_or_else(PoisonError::into_inner);
        if free.len() < self.max_retained {
            free.push(buf);
        } else {
            tracing::trace!(
                max_retained = self.max_retained,
                "Pool full, dropping buffer."
            );
        }
    }

    /// Number of idle buffers currently retained.
    pub fn idle(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_release_then_acquire_reuses_capacity() {
        let pool = BufferPool::<u64>::default();
        let mut buf = pool.acquire(100);
        assert!(buf.capacity() >= 100);
        buf.extend(0..50);
        let ptr = buf.as_ptr();
        pool.release(buf);
        assert_eq!(1, pool.idle());

        let again = pool.acquire(10);
        assert!(again.is_empty());
        assert_eq!(ptr, again.as_ptr());
        assert_eq!(0, pool.idle());
    }

    #[test]
    fn test_retention_limit() {
        let pool = BufferPool::<u8>::new(1);
        pool.release(Vec::with_capacity(4));
        pool.release(Vec::with_capacity(4));
        assert_eq!(1, pool.idle());
        pool.release(Vec::new());
        assert_eq!(1, pool.idle());
    }
}
