//! Lock-free FIFO work queue shared by a fixed set of workers

use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free work queue distributing items to workers in input order.
///
/// Workers call [`next()`](WorkQueue::next) to atomically claim the next item
/// together with its position in the original list.
pub struct WorkQueue<S> {
    items: Vec<S>,
    cursor: AtomicUsize,
}

impl<S> WorkQueue<S> {
    pub fn new(items: Vec<S>) -> Self {
        log::debug!("{} items in work queue", items.len());
        Self {
            items,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Claim the next item (lock-free)
    pub fn next(&self) -> Option<(usize, &S)> {
        let i = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.items.get(i).map(|item| (i, item))
    }

    /// Items nobody has claimed yet, with their positions
    pub fn unclaimed(&self) -> impl Iterator<Item = (usize, &S)> {
        let start = self.cursor.load(Ordering::SeqCst).min(self.items.len());
        self.items.iter().enumerate().skip(start)
    }

    /// Total items in queue
    pub fn total(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_in_order_with_index() {
        let q = WorkQueue::new(vec!["a", "b", "c"]);
        assert_eq!(q.total(), 3);
        assert_eq!(q.next(), Some((0, &"a")));
        assert_eq!(q.next(), Some((1, &"b")));
        assert_eq!(q.next(), Some((2, &"c")));
        assert_eq!(q.next(), None);
        assert_eq!(q.next(), None);
    }

    #[test]
    fn unclaimed_after_partial_drain() {
        let q = WorkQueue::new(vec![10, 20, 30, 40]);
        q.next();
        let rest: Vec<_> = q.unclaimed().map(|(i, v)| (i, *v)).collect();
        assert_eq!(rest, vec![(1, 20), (2, 30), (3, 40)]);
    }

    #[test]
    fn unclaimed_empty_after_overrun() {
        let q = WorkQueue::new(vec![1]);
        q.next();
        q.next();
        q.next();
        assert_eq!(q.unclaimed().count(), 0);
    }

    #[test]
    fn empty_queue() {
        let q: WorkQueue<i32> = WorkQueue::new(vec![]);
        assert_eq!(q.total(), 0);
        assert_eq!(q.next(), None);
    }

    #[test]
    fn concurrent_claims_are_unique() {
        let q = WorkQueue::new((0..1000).collect::<Vec<_>>());
        let seen = std::sync::Mutex::new(Vec::new());
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while let Some((i, _)) = q.next() {
                        seen.lock().unwrap().push(i);
                    }
                });
            }
        });
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..1000).collect::<Vec<_>>());
    }
}
