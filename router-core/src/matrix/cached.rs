//! Memoizing matrix wrapper

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use super::Matrix;
use crate::error::Result;

/// Memoizes lookups of an inner [`Matrix`], keyed by the ordered
/// `(origin, target)` pair
///
/// Shared by every task solving against the same problem. Two concurrent
/// first lookups of a pair may both reach the inner matrix; the inner lookup
/// is pure, so whichever write lands last stores the same value. Failed
/// lookups are not memoized.
pub struct CachedMatrix {
    inner: Arc<dyn Matrix>,
    distances: RwLock<HashMap<(i64, i64), f64>>,
    times: RwLock<HashMap<(i64, i64), i64>>,
}

impl CachedMatrix {
    pub fn new(inner: Arc<dyn Matrix>) -> Self {
        Self {
            inner,
            distances: RwLock::new(HashMap::new()),
            times: RwLock::new(HashMap::new()),
        }
    }

    /// Number of memoized distance pairs
    pub fn cached_pairs(&self) -> usize {
        self.distances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn memoized<K, V>(
    table: &RwLock<HashMap<K, V>>,
    key: K,
    compute: impl FnOnce() -> Result<V>,
) -> Result<V>
where
    K: Eq + Hash,
    V: Copy,
{
    if let Some(value) = table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Ok(*value);
    }

    // Computed outside the lock so a slow inner matrix never blocks readers
    let value = compute()?;
    table
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, value);
    Ok(value)
}

impl Matrix for CachedMatrix {
    fn distance(&self, origin_id: i64, target_id: i64) -> Result<f64> {
        memoized(&self.distances, (origin_id, target_id), || {
            self.inner.distance(origin_id, target_id)
        })
    }

    fn time(&self, origin_id: i64, target_id: i64) -> Result<i64> {
        memoized(&self.times, (origin_id, target_id), || {
            self.inner.time(origin_id, target_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Grid matrix that counts how often it is queried
    struct CountingMatrix {
        size: i64,
        distance_calls: AtomicUsize,
        time_calls: AtomicUsize,
    }

    impl CountingMatrix {
        fn new(size: i64) -> Self {
            Self {
                size,
                distance_calls: AtomicUsize::new(0),
                time_calls: AtomicUsize::new(0),
            }
        }

        fn check(&self, id: i64) -> Result<()> {
            if (0..self.size).contains(&id) {
                Ok(())
            } else {
                Err(Error::unknown_location(id))
            }
        }
    }

    impl Matrix for CountingMatrix {
        fn distance(&self, origin_id: i64, target_id: i64) -> Result<f64> {
            self.distance_calls.fetch_add(1, Ordering::SeqCst);
            self.check(origin_id)?;
            self.check(target_id)?;
            Ok((origin_id * 10 + target_id) as f64 + 0.5)
        }

        fn time(&self, origin_id: i64, target_id: i64) -> Result<i64> {
            self.time_calls.fetch_add(1, Ordering::SeqCst);
            self.check(origin_id)?;
            self.check(target_id)?;
            Ok(origin_id * 1000 + target_id)
        }
    }

    #[test]
    fn test_cached_values_match_inner() {
        let inner = Arc::new(CountingMatrix::new(4));
        let cached = CachedMatrix::new(inner.clone());

        for a in 0..4 {
            for b in 0..4 {
                for _ in 0..3 {
                    assert_eq!(cached.distance(a, b).unwrap(), inner.distance(a, b).unwrap());
                    assert_eq!(cached.time(a, b).unwrap(), inner.time(a, b).unwrap());
                }
            }
        }
    }

    #[test]
    fn test_inner_invoked_once_per_pair() {
        let inner = Arc::new(CountingMatrix::new(3));
        let cached = CachedMatrix::new(inner.clone());

        for _ in 0..5 {
            cached.distance(0, 1).unwrap();
            cached.distance(1, 0).unwrap();
            cached.time(2, 1).unwrap();
        }

        assert_eq!(inner.distance_calls.load(Ordering::SeqCst), 2);
        assert_eq!(inner.time_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cached.cached_pairs(), 2);
    }

    #[test]
    fn test_self_pair_delegates_to_inner() {
        let cached = CachedMatrix::new(Arc::new(CountingMatrix::new(3)));
        assert_eq!(cached.distance(2, 2).unwrap(), 22.5);
        assert_eq!(cached.time(1, 1).unwrap(), 1001);
    }

    #[test]
    fn test_unknown_location_is_not_found_and_not_cached() {
        let inner = Arc::new(CountingMatrix::new(2));
        let cached = CachedMatrix::new(inner.clone());

        assert!(cached.distance(0, 5).unwrap_err().is_not_found());
        assert!(cached.distance(0, 5).unwrap_err().is_not_found());
        assert_eq!(inner.distance_calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cached_pairs(), 0);
    }

    #[test]
    fn test_concurrent_lookups() {
        let inner = Arc::new(CountingMatrix::new(8));
        let cached = Arc::new(CachedMatrix::new(inner.clone()));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let cached = Arc::clone(&cached);
                scope.spawn(move || {
                    for a in 0..8 {
                        for b in 0..8 {
                            let expected = (a * 10 + b) as f64 + 0.5;
                            assert_eq!(cached.distance(a, b).unwrap(), expected);
                        }
                    }
                });
            }
        });

        assert_eq!(cached.cached_pairs(), 64);
        // Racing first lookups may compute a pair more than once, never less
        let calls = inner.distance_calls.load(Ordering::SeqCst);
        assert!((64..=8 * 64).contains(&calls));
    }
}
