//! Worker pool

use std::collections::{HashSet, VecDeque};
use std::net::SocketAddr;

/// Confirmed workers in round-robin order. Each address appears once.
#[derive(Clone, Debug, Default)]
pub struct WorkerPool {
    queue: VecDeque<SocketAddr>,
    members: HashSet<SocketAddr>,
}

impl WorkerPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worker at the back of the rotation. Returns false if it is
    /// already in the pool.
    ///
    /// * `worker` - Worker address.
    pub fn add(&mut self, worker: SocketAddr) -> bool {
        if !self.members.insert(worker) {
            return false;
        }
        self.queue.push_back(worker);
        true
    }

    /// Returns the worker at the head of the rotation and moves it to the
    /// back.
    pub fn next_worker(&mut self) -> Option<SocketAddr> {
        let worker = self.queue.pop_front()?;
        self.queue.push_back(worker);
        Some(worker)
    }

    /// Returns true if the worker is in the pool.
    pub fn contains(&self, worker: &SocketAddr) -> bool {
        self.members.contains(worker)
    }

    /// Returns the number of workers.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no worker has confirmed yet.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut pool = WorkerPool::new();
        assert!(pool.is_empty());
        assert!(pool.add(addr(1)));
        assert!(pool.add(addr(2)));
        assert!(!pool.add(addr(1)));
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(&addr(2)));
        assert!(!pool.contains(&addr(3)));
    }

    #[test]
    fn rotates() {
        let mut pool = WorkerPool::new();
        assert_eq!(pool.next_worker(), None);
        pool.add(addr(1));
        pool.add(addr(2));
        pool.add(addr(3));
        let order: Vec<u16> = (0..7).filter_map(|_| pool.next_worker()).map(|a| a.port()).collect();
        assert_eq!(order, vec![1, 2, 3, 1, 2, 3, 1]);
    }
}
