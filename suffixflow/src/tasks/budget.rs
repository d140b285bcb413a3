//! Worker budget arithmetic.

/// Workers handed to each of `tasks` concurrent calls.
///
/// `floor(budget / tasks) + 1`, which over-subscribes slightly; the pool
/// itself still caps how many calls run at once.
#[must_use]
pub fn worker_share(budget: usize, tasks: usize) -> usize {
    budget / tasks.max(1) + 1
}

/// Number of pool slots for `tasks` calls under `budget`, never below one.
#[must_use]
pub fn pool_size(budget: usize, tasks: usize) -> usize {
    budget.min(tasks).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_share() {
        assert_eq!(worker_share(30, 3), 11);
        assert_eq!(worker_share(4, 8), 1);
        assert_eq!(worker_share(8, 1), 9);
        assert_eq!(worker_share(8, 0), 9);
    }

    #[test]
    fn test_pool_size() {
        assert_eq!(pool_size(30, 3), 3);
        assert_eq!(pool_size(2, 10), 2);
        assert_eq!(pool_size(0, 10), 1);
        assert_eq!(pool_size(4, 0), 1);
    }
}
