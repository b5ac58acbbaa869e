/// Parallel processing utilities

use crate::PlasClassError;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Resolve a configured thread count; 0 means every logical CPU.
pub fn resolve_threads(threads: usize) -> usize {
    if threads == 0 {
        num_cpus::get()
    } else {
        threads
    }
}

/// Build a private worker pool. The pool lives as long as the returned
/// value, so callers own its teardown.
pub fn build_worker_pool(threads: usize) -> Result<ThreadPool, PlasClassError> {
    let threads = resolve_threads(threads);
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("plasclass-worker-{}", i))
        .build()
        .map_err(|e| PlasClassError::Worker(format!("failed to build thread pool: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_threads() {
        assert_eq!(resolve_threads(3), 3);
        assert!(resolve_threads(0) >= 1);
    }

    #[test]
    fn test_pool_has_requested_size() {
        let pool = build_worker_pool(2).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
    }
}
