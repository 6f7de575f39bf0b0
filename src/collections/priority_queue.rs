//! Binary-heap priority queue with decrease-key
//!
//! `std::collections::BinaryHeap` cannot change the priority of an element
//! already in the heap, which Dijkstra needs. This heap tags every entry with
//! its insertion sequence and keeps two side indexes: sequence to heap slot,
//! and value to the sequences of its queued entries. `insert` always adds an
//! entry; `upsert` moves the most recently inserted entry of a value.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Cannot extract from an empty priority queue")]
    Empty,
}

/// Comparator deciding which priority is closer to the top.
/// `Ordering::Less` means the left priority is extracted first.
pub type Comparator<P> = fn(&P, &P) -> Ordering;

#[derive(Debug, Clone)]
struct Entry<P, T> {
    priority: P,
    value: T,
    /// Insertion sequence, breaks ties between equal priorities
    seq: u64,
}

#[derive(Debug, Clone)]
pub struct PriorityQueue<P, T> {
    heap: Vec<Entry<P, T>>,
    /// seq -> heap slot
    slots: HashMap<u64, usize>,
    /// value -> seqs of its queued entries, oldest first
    entries_of: HashMap<T, Vec<u64>>,
    compare: Comparator<P>,
    next_seq: u64,
}

impl<P: Ord, T: Eq + Hash + Clone> Default for PriorityQueue<P, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Ord, T: Eq + Hash + Clone> PriorityQueue<P, T> {
    /// Min-priority-first queue
    pub fn new() -> Self {
        Self::with_comparator(P::cmp)
    }

    /// Max-priority-first queue
    pub fn max_first() -> Self {
        Self::with_comparator(|a, b| b.cmp(a))
    }
}

impl<P, T: Eq + Hash + Clone> PriorityQueue<P, T> {
    pub fn with_comparator(compare: Comparator<P>) -> Self {
        Self {
            heap: Vec::new(),
            slots: HashMap::new(),
            entries_of: HashMap::new(),
            compare,
            next_seq: 0,
        }
    }

    /// Add `value` with `priority`. A value may be queued more than once.
    pub fn insert(&mut self, priority: P, value: T) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let slot = self.heap.len();
        self.slots.insert(seq, slot);
        self.entries_of.entry(value.clone()).or_default().push(seq);
        self.heap.push(Entry {
            priority,
            value,
            seq,
        });
        self.sift_up(slot);
    }

    /// Re-prioritize the latest queued entry of `value`, or insert it
    pub fn upsert(&mut self, priority: P, value: T) {
        match self.latest_slot(&value) {
            Some(slot) => {
                self.heap[slot].priority = priority;
                let slot = self.sift_up(slot);
                self.sift_down(slot);
            }
            None => self.insert(priority, value),
        }
    }

    /// Remove and return the element closest to the top
    pub fn extract_top(&mut self) -> Result<(P, T), QueueError> {
        if self.heap.is_empty() {
            return Err(QueueError::Empty);
        }

        let last = self.heap.len() - 1;
        self.swap(0, last);
        let top = self.heap.pop().ok_or(QueueError::Empty)?;
        self.slots.remove(&top.seq);
        if let Some(seqs) = self.entries_of.get_mut(&top.value) {
            seqs.retain(|&seq| seq != top.seq);
            if seqs.is_empty() {
                self.entries_of.remove(&top.value);
            }
        }
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Ok((top.priority, top.value))
    }

    pub fn peek(&self) -> Option<(&P, &T)> {
        self.heap.first().map(|e| (&e.priority, &e.value))
    }

    pub fn contains(&self, value: &T) -> bool {
        self.entries_of.contains_key(value)
    }

    /// Priority of the latest queued entry of `value`
    pub fn priority_of(&self, value: &T) -> Option<&P> {
        self.latest_slot(value).map(|slot| &self.heap[slot].priority)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn latest_slot(&self, value: &T) -> Option<usize> {
        let seq = self.entries_of.get(value)?.last()?;
        self.slots.get(seq).copied()
    }

    fn precedes(&self, a: usize, b: usize) -> bool {
        let (left, right) = (&self.heap[a], &self.heap[b]);
        match (self.compare)(&left.priority, &right.priority) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => left.seq < right.seq,
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        self.slots.insert(self.heap[a].seq, a);
        self.slots.insert(self.heap[b].seq, b);
    }

    fn sift_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.precedes(slot, parent) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
        slot
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut best = slot;
            if left < len && self.precedes(left, best) {
                best = left;
            }
            if right < len && self.precedes(right, best) {
                best = right;
            }
            if best == slot {
                return;
            }
            self.swap(slot, best);
            slot = best;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn drain<P, T: Eq + Hash + Clone>(queue: &mut PriorityQueue<P, T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok((_, value)) = queue.extract_top() {
            out.push(value);
        }
        out
    }

    #[test]
    fn test_extracts_in_priority_order() {
        let mut queue = PriorityQueue::new();
        for (priority, value) in [(5, "e"), (1, "a"), (4, "d"), (2, "b"), (3, "c")] {
            queue.insert(priority, value);
        }

        assert_eq!(queue.len(), 5);
        assert_eq!(drain(&mut queue), vec!["a", "b", "c", "d", "e"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_max_first_comparator() {
        let mut queue = PriorityQueue::max_first();
        for (priority, value) in [(5u32, 'e'), (1, 'a'), (9, 'z'), (3, 'c')] {
            queue.insert(priority, value);
        }

        assert_eq!(drain(&mut queue), vec!['z', 'e', 'c', 'a']);
    }

    #[test]
    fn test_empty_extract_fails() {
        let mut queue: PriorityQueue<u64, &str> = PriorityQueue::new();
        assert_eq!(queue.extract_top(), Err(QueueError::Empty));
    }

    #[test]
    fn test_upsert_decreases_key_without_growing() {
        let mut queue = PriorityQueue::new();
        queue.insert(10u64, "far");
        queue.insert(5, "mid");
        queue.insert(7, "near");

        queue.upsert(1, "far");

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.priority_of(&"far"), Some(&1));
        assert_eq!(queue.peek(), Some((&1, &"far")));
        assert_eq!(drain(&mut queue), vec!["far", "mid", "near"]);
    }

    #[test]
    fn test_upsert_increases_key() {
        let mut queue = PriorityQueue::new();
        queue.insert(1u64, "a");
        queue.insert(2, "b");
        queue.insert(3, "c");

        queue.upsert(10, "a");

        assert_eq!(queue.len(), 3);
        assert_eq!(drain(&mut queue), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_upsert_inserts_new_value() {
        let mut queue = PriorityQueue::new();
        queue.upsert(3u64, "x");
        assert!(queue.contains(&"x"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_equal_priorities_follow_insertion() {
        let mut queue = PriorityQueue::new();
        for value in ["first", "second", "third"] {
            queue.insert(0u64, value);
        }
        assert_eq!(drain(&mut queue), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_many_elements_stay_ordered() {
        let mut queue = PriorityQueue::new();
        for i in 0..100u64 {
            queue.insert((i * 37) % 101, i);
        }
        for i in (0..100u64).step_by(3) {
            queue.upsert(0, i);
        }

        let mut last = None;
        while let Ok((priority, _)) = queue.extract_top() {
            if let Some(prev) = last {
                assert!(prev <= priority);
            }
            last = Some(priority);
        }
    }

    #[test]
    fn test_insert_keeps_duplicate_values() {
        let mut queue = PriorityQueue::new();
        queue.insert(2u64, "x");
        queue.insert(1, "x");
        queue.insert(3, "y");

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.priority_of(&"x"), Some(&1));
        assert_eq!(queue.extract_top(), Ok((1, "x")));
        assert!(queue.contains(&"x"));
        assert_eq!(queue.extract_top(), Ok((2, "x")));
        assert!(!queue.contains(&"x"));
        assert_eq!(queue.extract_top(), Ok((3, "y")));
        assert_eq!(queue.extract_top(), Err(QueueError::Empty));
    }

    #[test]
    fn test_upsert_moves_latest_duplicate() {
        let mut queue = PriorityQueue::new();
        queue.insert(5u64, "x");
        queue.insert(6, "x");
        queue.insert(4, "y");

        queue.upsert(1, "x");

        assert_eq!(queue.len(), 3);
        let drained: Vec<(u64, &str)> = std::iter::from_fn(|| queue.extract_top().ok()).collect();
        assert_eq!(drained, vec![(1, "x"), (4, "y"), (5, "x")]);
    }
}
