//! Outbound priority queue (§4.4): ordered by `(priority, enqueue
//! sequence)`. Three tiers — *system* (discovery, clock sync), *user*
//! (API-originated commands), *background* (periodic polls) — FIFO
//! within a tier.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Priority tier for an outbound transaction. Ordered low-to-high for
/// `Ord` purposes so that `System` sorts ahead of `User` ahead of
/// `Background` in the max-heap below (see [`QueuedItem::cmp`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Background,
    User,
    System,
}

struct QueuedItem<T> {
    priority: Priority,
    sequence: u64,
    item: T,
}

impl<T> PartialEq for QueuedItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}
impl<T> Eq for QueuedItem<T> {}

impl<T> PartialOrd for QueuedItem<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for QueuedItem<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first; within a tier, lower sequence (older) first.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// A priority queue of outbound transactions, FIFO within a tier.
pub struct TransactionQueue<T> {
    heap: BinaryHeap<QueuedItem<T>>,
    next_sequence: u64,
}

impl<T> Default for TransactionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TransactionQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    pub fn push(&mut self, priority: Priority, item: T) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(QueuedItem {
            priority,
            sequence,
            item,
        });
    }

    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|q| q.item)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_priority_pops_first() {
        let mut q = TransactionQueue::new();
        q.push(Priority::Background, "poll");
        q.push(Priority::System, "discover");
        q.push(Priority::User, "set-circuit");
        assert_eq!(q.pop(), Some("discover"));
        assert_eq!(q.pop(), Some("set-circuit"));
        assert_eq!(q.pop(), Some("poll"));
    }

    #[test]
    fn fifo_within_a_tier() {
        let mut q = TransactionQueue::new();
        q.push(Priority::User, "first");
        q.push(Priority::User, "second");
        q.push(Priority::User, "third");
        assert_eq!(q.pop(), Some("first"));
        assert_eq!(q.pop(), Some("second"));
        assert_eq!(q.pop(), Some("third"));
    }
}
