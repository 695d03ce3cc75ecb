//! A generic object pool for pooled component storage (spec section 4.3).
//!
//! Acquiring a pooled value returns a freshly reset instance, preferring a
//! previously released one; releasing resets the value in place and returns
//! it to the free list. The pool can be prewarmed to avoid allocation spikes
//! during gameplay, and optionally auto-resizes past its configured maximum
//! rather than rejecting callers.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::component::Reset;

/// Pool sizing and overflow behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolConfig {
    pub initial_size: usize,
    pub max_size: usize,
    /// When `true`, acquiring past `max_size` allocates a new value instead
    /// of failing; the overflow is counted in [`PoolStatistics::overflow_allocations`].
    pub auto_resize: bool,
    pub enable_metrics: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: 16,
            max_size: 256,
            auto_resize: true,
            enable_metrics: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PoolStatistics {
    pub acquired: u64,
    pub released: u64,
    pub current_size: usize,
    pub peak_size: usize,
    pub overflow_allocations: u64,
}

/// A pool of reusable `T` values.
pub struct Pool<T: Reset + Default> {
    config: PoolConfig,
    free: Vec<T>,
    stats: PoolStatistics,
}

impl<T: Reset + Default> Pool<T> {
    pub fn new(config: PoolConfig) -> Self {
        let mut free = Vec::with_capacity(config.initial_size);
        for _ in 0..config.initial_size {
            free.push(T::default());
        }
        let current_size = free.len();
        Self {
            config,
            free,
            stats: PoolStatistics {
                current_size,
                peak_size: current_size,
                ..Default::default()
            },
        }
    }

    /// Grow the free list to at least `count` values, without handing any
    /// of them out.
    pub fn prewarm(&mut self, count: usize) {
        while self.free.len() < count {
            self.free.push(T::default());
        }
        self.stats.current_size = self.free.len();
        self.stats.peak_size = self.stats.peak_size.max(self.stats.current_size);
    }

    /// Take a value out of the pool, allocating fresh if the free list is
    /// empty. If `auto_resize` is disabled and the pool is already at
    /// `max_size` with nothing free, this still allocates (there is no
    /// bounded failure mode for callers -- capacity is advisory) but is
    /// logged and counted as overflow. Overflow is counted against the
    /// number of instances currently live (acquired minus released), not
    /// against every free-list miss -- a pool can be emptied and refilled
    /// many times within `max_size` without ever overflowing.
    pub fn acquire(&mut self) -> T {
        self.stats.acquired += 1;
        if let Some(value) = self.free.pop() {
            self.stats.current_size = self.free.len();
            return value;
        }
        let live_out = self.stats.acquired - self.stats.released;
        if live_out as usize > self.config.max_size {
            if !self.config.auto_resize {
                warn!(
                    max_size = self.config.max_size,
                    "pool exceeded max_size with auto_resize disabled; allocating anyway"
                );
            }
            self.stats.overflow_allocations += 1;
            if self.config.enable_metrics {
                debug!(overflow = self.stats.overflow_allocations, "pool overflow allocation");
            }
        }
        T::default()
    }

    /// Reset `value` in place and return it to the free list, unless doing
    /// so would exceed `max_size` (in which case it is simply dropped).
    pub fn release(&mut self, mut value: T) {
        self.stats.released += 1;
        value.reset();
        if self.free.len() < self.config.max_size {
            self.free.push(value);
            self.stats.current_size = self.free.len();
            self.stats.peak_size = self.stats.peak_size.max(self.stats.current_size);
        }
    }

    pub fn clear(&mut self) {
        self.free.clear();
        self.stats.current_size = 0;
    }

    pub fn statistics(&self) -> PoolStatistics {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Dummy(u32);

    impl Reset for Dummy {
        fn reset(&mut self) {
            self.0 = 0;
        }
    }

    #[test]
    fn prewarm_fills_free_list() {
        let mut pool: Pool<Dummy> = Pool::new(PoolConfig {
            initial_size: 0,
            ..Default::default()
        });
        pool.prewarm(5);
        assert_eq!(pool.statistics().current_size, 5);
    }

    #[test]
    fn released_values_are_reset_before_reuse() {
        let mut pool: Pool<Dummy> = Pool::new(PoolConfig {
            initial_size: 1,
            ..Default::default()
        });
        let mut value = pool.acquire();
        value.0 = 42;
        pool.release(value);
        let reacquired = pool.acquire();
        assert_eq!(reacquired.0, 0);
    }

    #[test]
    fn overflow_past_max_size_is_counted() {
        let mut pool: Pool<Dummy> = Pool::new(PoolConfig {
            initial_size: 0,
            max_size: 1,
            auto_resize: true,
            enable_metrics: true,
        });
        let _a = pool.acquire();
        let _b = pool.acquire();
        // Only the second acquire pushes live-out count (2) past max_size (1).
        assert_eq!(pool.statistics().overflow_allocations, 1);
    }

    #[test]
    fn acquire_release_cycles_within_max_size_never_overflow() {
        let mut pool: Pool<Dummy> = Pool::new(PoolConfig {
            initial_size: 0,
            max_size: 1,
            auto_resize: true,
            enable_metrics: true,
        });
        for _ in 0..10 {
            let value = pool.acquire();
            pool.release(value);
        }
        assert_eq!(pool.statistics().overflow_allocations, 0);
    }

    #[test]
    fn release_beyond_max_size_is_dropped_not_retained() {
        let mut pool: Pool<Dummy> = Pool::new(PoolConfig {
            initial_size: 0,
            max_size: 1,
            auto_resize: true,
            enable_metrics: false,
        });
        pool.release(Dummy(1));
        pool.release(Dummy(2));
        assert_eq!(pool.statistics().current_size, 1);
    }
}
