//! Recycling pool for sample buffers
//!
//! The decode thread acquires buffers from the pool, the consumer drops the
//! samples that own them, and dropped buffers flow back into the free list.
//! [`SamplePool::reset`] invalidates every outstanding buffer: anything
//! acquired before the reset is freed on drop instead of being recycled.

use parking_lot::Mutex;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Weak};

/// Default number of buffers that may be in flight at once
pub const DEFAULT_POOL_CAPACITY: usize = 32;

struct PoolState<T> {
    free: Vec<T>,
    in_flight: usize,
    capacity: usize,
    generation: u64,
}

/// Thread-safe pool of reusable objects.
///
/// Cloning the pool yields another handle to the same free list.
pub struct SamplePool<T> {
    state: Arc<Mutex<PoolState<T>>>,
}

impl<T> Clone for SamplePool<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Default + Send> SamplePool<T> {
    /// Creates a pool that allows at most `capacity` objects in flight
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(PoolState {
                free: Vec::new(),
                in_flight: 0,
                capacity,
                generation: 0,
            })),
        }
    }

    /// Hands out a recycled or newly constructed object.
    ///
    /// Returns `None` when `capacity` objects are already in flight.
    /// The caller must reinitialize the object; recycled objects keep
    /// whatever state they were returned with.
    pub fn acquire(&self) -> Option<Pooled<T>> {
        let mut state = self.state.lock();

        if state.in_flight >= state.capacity {
            tracing::trace!(in_flight = state.in_flight, "sample pool exhausted");
            return None;
        }

        let value = state.free.pop().unwrap_or_default();
        state.in_flight += 1;

        Some(Pooled {
            value: ManuallyDrop::new(value),
            generation: state.generation,
            pool: Arc::downgrade(&self.state),
        })
    }

    /// Like [`acquire`](Self::acquire), but reports exhaustion as an error
    pub fn try_acquire(&self) -> crate::Result<Pooled<T>> {
        self.acquire()
            .ok_or_else(|| crate::Error::PoolExhausted(self.outstanding()))
    }

    /// Drops the free list and forgets all outstanding objects
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.free.clear();
        state.in_flight = 0;
        state.generation += 1;
    }

    /// Number of objects acquired since the last reset and not yet returned
    pub fn outstanding(&self) -> usize {
        self.state.lock().in_flight
    }

    /// Number of objects ready for reuse
    pub fn free_count(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Maximum number of objects in flight
    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }
}

impl<T: Default + Send> Default for SamplePool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

/// An object on loan from a [`SamplePool`].
///
/// Returns itself to the pool on drop, unless the pool was reset or
/// destroyed in the meantime.
pub struct Pooled<T> {
    value: ManuallyDrop<T>,
    generation: u64,
    pool: Weak<Mutex<PoolState<T>>>,
}

impl<T> Pooled<T> {
    /// Wraps a value that does not belong to any pool
    pub fn detached(value: T) -> Self {
        Self {
            value: ManuallyDrop::new(value),
            generation: 0,
            pool: Weak::new(),
        }
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled")
            .field("value", &*self.value)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<T> Drop for Pooled<T> {
    fn drop(&mut self) {
        // SAFETY: `value` is never touched again after this point
        let value = unsafe { ManuallyDrop::take(&mut self.value) };
        let Some(pool) = self.pool.upgrade() else {
            return;
        };

        let mut state = pool.lock();
        if state.generation != self.generation {
            return;
        }

        state.in_flight = state.in_flight.saturating_sub(1);
        if state.free.len() < state.capacity {
            state.free.push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_recycle() {
        let pool: SamplePool<Vec<u8>> = SamplePool::new(4);

        let mut buffer = pool.acquire().unwrap();
        buffer.resize(16, 7);
        assert_eq!(pool.outstanding(), 1);

        drop(buffer);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.free_count(), 1);

        // recycled objects keep their allocation
        let buffer = pool.acquire().unwrap();
        assert_eq!(buffer.len(), 16);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_exhaustion() {
        let pool: SamplePool<Vec<u8>> = SamplePool::new(2);

        let a = pool.acquire();
        let b = pool.acquire();
        assert!(a.is_some() && b.is_some());
        assert!(pool.acquire().is_none());
        assert!(matches!(pool.try_acquire(), Err(crate::Error::PoolExhausted(2))));

        drop(a);
        assert!(pool.acquire().is_some());
    }

    #[test]
    fn test_reset_invalidates_outstanding() {
        let pool: SamplePool<Vec<u8>> = SamplePool::new(4);

        let stale = pool.acquire().unwrap();
        let _kept = pool.acquire().unwrap();
        pool.reset();
        assert_eq!(pool.outstanding(), 0);

        // stale objects are freed rather than recycled
        drop(stale);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_objects_outlive_pool() {
        let pool: SamplePool<Vec<u8>> = SamplePool::new(1);
        let buffer = pool.acquire().unwrap();
        drop(pool);
        drop(buffer);
    }

    #[test]
    fn test_detached_objects() {
        let mut value = Pooled::detached(vec![1u8, 2, 3]);
        value.push(4);
        assert_eq!(value.len(), 4);
    }
}
