// Bounded recycling of body/fixture proxies

use crate::config::PoolConfig;
use log::trace;

/// A proxy that can be recycled through an [`ObjectPool`]
///
/// The pool calls [`reset`](Poolable::reset) itself on every `free`, and
/// hands instances out only through [`create`](Poolable::create) or
/// [`rebind`](Poolable::rebind). A partially reset proxy is never observable.
pub trait Poolable {
    /// Everything a live proxy needs to be fully initialized
    type Init;

    /// Build a fresh instance
    fn create(init: Self::Init) -> Self;

    /// Bind a previously reset instance to a new tenant
    fn rebind(&mut self, init: Self::Init);

    /// Drop every trace of the previous tenant: lists, user data, identity
    fn reset(&mut self);
}

/// Free list of reset proxies with an optional retention cap
pub struct ObjectPool<T> {
    /// Reset instances ready for reuse
    free: Vec<T>,

    /// Maximum number of retained instances
    max: usize,

    /// Highest number of free instances ever retained
    peak: usize,
}

impl<T: Poolable> ObjectPool<T> {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            free: Vec::with_capacity(config.initial_capacity.min(config.max)),
            max: config.max,
            peak: 0,
        }
    }

    /// Take a recycled instance, or build a new one when the pool is empty
    pub fn obtain(&mut self, init: T::Init) -> T {
        match self.free.pop() {
            Some(mut item) => {
                item.rebind(init);
                item
            }
            None => T::create(init),
        }
    }

    /// Reset and retain an instance; beyond the cap it is simply dropped
    pub fn free(&mut self, mut item: T) {
        item.reset();
        if self.free.len() < self.max {
            self.free.push(item);
            self.peak = self.peak.max(self.free.len());
        } else {
            trace!("pool full ({}), discarding instance", self.max);
        }
    }

    /// Number of instances waiting for reuse
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Drop every retained instance
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Probe {
        id: u32,
        items: Vec<u32>,
        generation: u32,
    }

    impl Poolable for Probe {
        type Init = u32;

        fn create(id: u32) -> Self {
            Self {
                id,
                items: Vec::new(),
                generation: 0,
            }
        }

        fn rebind(&mut self, id: u32) {
            self.id = id;
            self.generation += 1;
        }

        fn reset(&mut self) {
            self.items.clear();
        }
    }

    fn pool(max: usize) -> ObjectPool<Probe> {
        ObjectPool::new(PoolConfig {
            initial_capacity: 4,
            max,
        })
    }

    #[test]
    fn test_obtain_reuses_freed_instance() {
        let mut pool = pool(8);
        let mut item = pool.obtain(1);
        item.items.extend([1, 2, 3]);
        pool.free(item);
        assert_eq!(pool.free_count(), 1);

        let item = pool.obtain(2);
        assert_eq!(item.id, 2);
        assert_eq!(item.generation, 1, "Instance should have been recycled");
        assert!(item.items.is_empty(), "Recycled instance must be reset");
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_free_respects_cap() {
        let mut pool = pool(2);
        let items: Vec<_> = (0..5).map(|i| pool.obtain(i)).collect();
        for item in items {
            pool.free(item);
        }

        assert_eq!(pool.free_count(), 2);
        assert_eq!(pool.peak(), 2);
        assert_eq!(pool.max(), 2);
    }

    #[test]
    fn test_zero_cap_never_retains() {
        let mut pool = pool(0);
        let item = pool.obtain(1);
        pool.free(item);
        assert_eq!(pool.free_count(), 0);
    }
}
