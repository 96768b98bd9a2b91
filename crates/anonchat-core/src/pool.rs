//! Waiting Pool
//!
//! Insertion-ordered set of participants looking for a partner. Each
//! participant appears at most once.

use std::collections::{HashSet, VecDeque};

use crate::types::ParticipantId;

#[derive(Debug, Default)]
pub struct WaitingPool {
    queue: VecDeque<ParticipantId>,
    members: HashSet<ParticipantId>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, participant: ParticipantId) -> bool {
        self.members.contains(&participant)
    }

    /// Append at the tail. Returns false if already waiting.
    pub fn push_back(&mut self, participant: ParticipantId) -> bool {
        if !self.members.insert(participant) {
            return false;
        }
        self.queue.push_back(participant);
        true
    }

    /// Remove a participant wherever it sits. Returns false if absent.
    pub fn remove(&mut self, participant: ParticipantId) -> bool {
        if !self.members.remove(&participant) {
            return false;
        }
        if let Some(index) = self.queue.iter().position(|&p| p == participant) {
            self.queue.remove(index);
        }
        true
    }

    /// Oldest waiting participant satisfying `predicate`
    pub fn find<F>(&self, mut predicate: F) -> Option<ParticipantId>
    where
        F: FnMut(ParticipantId) -> bool,
    {
        self.queue.iter().copied().find(|&p| predicate(p))
    }

    /// Waiting participants, oldest first
    pub fn iter(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.queue.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(pool: &WaitingPool) -> Vec<u64> {
        pool.iter().map(|p| p.as_u64()).collect()
    }

    #[test]
    fn preserves_insertion_order_and_uniqueness() {
        let mut pool = WaitingPool::new();
        assert!(pool.push_back(ParticipantId::new(1)));
        assert!(pool.push_back(ParticipantId::new(2)));
        assert!(!pool.push_back(ParticipantId::new(1)));
        assert!(pool.push_back(ParticipantId::new(3)));

        assert_eq!(ids(&pool), vec![1, 2, 3]);
    }

    #[test]
    fn remove_from_middle_keeps_order() {
        let mut pool = WaitingPool::new();
        for raw in 1..=4 {
            pool.push_back(ParticipantId::new(raw));
        }
        assert!(pool.remove(ParticipantId::new(2)));
        assert!(!pool.remove(ParticipantId::new(2)));
        assert_eq!(ids(&pool), vec![1, 3, 4]);
        assert!(!pool.contains(ParticipantId::new(2)));
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn find_scans_oldest_first() {
        let mut pool = WaitingPool::new();
        for raw in [10, 11, 12, 13] {
            pool.push_back(ParticipantId::new(raw));
        }
        let odd = pool.find(|p| p.as_u64() % 2 == 1);
        assert_eq!(odd, Some(ParticipantId::new(11)));
        assert_eq!(pool.find(|p| p.as_u64() > 100), None);
    }
}
