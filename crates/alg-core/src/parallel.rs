//! Fork-join loops over independent items with cooperative cancellation
//!
//! Loops check the [`CancellationToken`] before each item and report
//! [`AlgorithmError::Cancelled`] after the join. Per-item state is never
//! shared; results combine only through [`ParallelExecutor::parallel_reduce`].

use crate::config::ParallelConfig;
use crate::error::{AlgorithmError, FrameworkError};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Fresh, not cancelled
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag before a new run
    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs loops on a worker pool, or inline when parallelism is off
#[derive(Clone, Default)]
pub struct ParallelExecutor {
    pool: Option<Arc<ThreadPool>>,
}

impl fmt::Debug for ParallelExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelExecutor")
            .field("threads", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .finish()
    }
}

impl ParallelExecutor {
    /// Executor that runs everything on the calling thread
    #[inline]
    #[must_use]
    pub fn sequential() -> Self {
        Self { pool: None }
    }

    /// Executor backed by a dedicated pool
    ///
    /// # Errors
    /// `FrameworkError::ThreadPool` if the pool cannot start
    pub fn with_threads(threads: Option<usize>) -> Result<Self, FrameworkError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("alg-worker-{i}"));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        Ok(Self {
            pool: Some(Arc::new(builder.build()?)),
        })
    }

    /// Executor matching `[parallel]`
    ///
    /// # Errors
    /// `FrameworkError::ThreadPool` if the pool cannot start
    pub fn from_config(config: &ParallelConfig) -> Result<Self, FrameworkError> {
        if !config.enabled || config.threads == Some(1) {
            return Ok(Self::sequential());
        }
        Self::with_threads(config.threads)
    }

    /// Worker count (1 when sequential)
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.as_ref().map_or(1, |p| p.current_num_threads())
    }

    /// Whether loops run on a pool
    #[inline]
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Run `body(i)` for every `i` in `0..count`
    ///
    /// # Errors
    /// - the first error returned by `body`
    /// - `AlgorithmError::Cancelled` if the token was set during the loop
    pub fn parallel_for<F>(
        &self,
        count: usize,
        token: &CancellationToken,
        label: &str,
        body: F,
    ) -> Result<(), AlgorithmError>
    where
        F: Fn(usize) -> Result<(), AlgorithmError> + Send + Sync,
    {
        let step = |i: usize| {
            if token.is_cancelled() {
                return Ok(());
            }
            body(i)
        };
        match &self.pool {
            Some(pool) => pool.install(|| (0..count).into_par_iter().try_for_each(step)),
            None => (0..count).try_for_each(step),
        }?;
        check_cancelled(token, label)
    }

    /// Run `body(i, item)` for every item, each item visited by one worker
    ///
    /// # Errors
    /// Same as [`parallel_for`](Self::parallel_for)
    pub fn for_each_mut<T, F>(
        &self,
        items: &mut [T],
        token: &CancellationToken,
        label: &str,
        body: F,
    ) -> Result<(), AlgorithmError>
    where
        T: Send,
        F: Fn(usize, &mut T) -> Result<(), AlgorithmError> + Send + Sync,
    {
        let step = |(i, item): (usize, &mut T)| {
            if token.is_cancelled() {
                return Ok(());
            }
            body(i, item)
        };
        match &self.pool {
            Some(pool) => {
                pool.install(|| items.par_iter_mut().enumerate().try_for_each(step))
            }
            None => items.iter_mut().enumerate().try_for_each(step),
        }?;
        check_cancelled(token, label)
    }

    /// Map every index and merge the results
    ///
    /// Each worker folds into its own accumulator starting from `identity`;
    /// accumulators are merged after the join. `merge` must be associative.
    ///
    /// # Errors
    /// Same as [`parallel_for`](Self::parallel_for)
    pub fn parallel_reduce<A, M, R>(
        &self,
        count: usize,
        token: &CancellationToken,
        label: &str,
        identity: A,
        map: M,
        merge: R,
    ) -> Result<A, AlgorithmError>
    where
        A: Clone + Send + Sync,
        M: Fn(usize) -> Result<A, AlgorithmError> + Send + Sync,
        R: Fn(A, A) -> A + Send + Sync,
    {
        let result = match &self.pool {
            Some(pool) => pool.install(|| {
                (0..count)
                    .into_par_iter()
                    .filter(|_| !token.is_cancelled())
                    .map(&map)
                    .try_reduce(|| identity.clone(), |a, b| Ok(merge(a, b)))
            }),
            None => (0..count)
                .filter(|_| !token.is_cancelled())
                .map(&map)
                .try_fold(
                    identity,
                    |acc, item: Result<A, AlgorithmError>| -> Result<A, AlgorithmError> {
                        Ok(merge(acc, item?))
                    },
                ),
        }?;
        check_cancelled(token, label)?;
        Ok(result)
    }
}

fn check_cancelled(token: &CancellationToken, label: &str) -> Result<(), AlgorithmError> {
    if token.is_cancelled() {
        tracing::warn!(algorithm = label, "cancelled");
        return Err(AlgorithmError::Cancelled(label.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::AtomicUsize;

    fn executors() -> Vec<ParallelExecutor> {
        vec![
            ParallelExecutor::sequential(),
            ParallelExecutor::with_threads(Some(4)).unwrap(),
        ]
    }

    #[test]
    fn parallel_for_visits_every_index() {
        for exec in executors() {
            let hits = AtomicUsize::new(0);
            exec.parallel_for(100, &CancellationToken::new(), "test", |_| {
                hits.fetch_add(1, Ordering::Relaxed);
                Ok(())
            })
            .unwrap();
            assert_eq!(hits.load(Ordering::Relaxed), 100);
        }
    }

    #[test]
    fn parallel_for_propagates_errors() {
        for exec in executors() {
            let result = exec.parallel_for(10, &CancellationToken::new(), "test", |i| {
                if i == 7 {
                    Err(AlgorithmError::runtime("bad index"))
                } else {
                    Ok(())
                }
            });
            assert!(matches!(result, Err(AlgorithmError::Runtime(_))));
        }
    }

    #[test]
    fn cancellation_reported_after_join() {
        for exec in executors() {
            let token = CancellationToken::new();
            let result = exec.parallel_for(1000, &token, "test", |i| {
                if i == 3 {
                    token.cancel();
                }
                Ok(())
            });
            assert!(matches!(result, Err(AlgorithmError::Cancelled(_))));
        }
    }

    #[test]
    fn pre_cancelled_token_skips_work() {
        let token = CancellationToken::new();
        token.cancel();
        let hits = AtomicUsize::new(0);
        let result = ParallelExecutor::sequential().parallel_for(10, &token, "test", |_| {
            hits.fetch_add(1, Ordering::Relaxed);
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(hits.load(Ordering::Relaxed), 0);
        token.reset();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn for_each_mut_writes_each_item() {
        for exec in executors() {
            let mut items = vec![0_usize; 64];
            exec.for_each_mut(&mut items, &CancellationToken::new(), "test", |i, item| {
                *item = i * 2;
                Ok(())
            })
            .unwrap();
            assert!(items.iter().enumerate().all(|(i, v)| *v == i * 2));
        }
    }

    #[test]
    fn from_config_respects_switch() {
        let off = ParallelConfig {
            enabled: false,
            threads: Some(4),
        };
        assert!(!ParallelExecutor::from_config(&off).unwrap().is_parallel());
        let on = ParallelConfig {
            enabled: true,
            threads: Some(2),
        };
        assert_eq!(ParallelExecutor::from_config(&on).unwrap().threads(), 2);
    }

    proptest! {
        #[test]
        fn reduce_matches_sequential_sum(count in 0usize..500) {
            let pool = ParallelExecutor::with_threads(Some(3)).unwrap();
            let token = CancellationToken::new();
            let parallel = pool
                .parallel_reduce(count, &token, "sum", 0u64, |i| Ok(i as u64), |a, b| a + b)
                .unwrap();
            let sequential = ParallelExecutor::sequential()
                .parallel_reduce(count, &token, "sum", 0u64, |i| Ok(i as u64), |a, b| a + b)
                .unwrap();
            let expected: u64 = (0..count as u64).sum();
            prop_assert_eq!(parallel, expected);
            prop_assert_eq!(sequential, expected);
        }
    }
}
