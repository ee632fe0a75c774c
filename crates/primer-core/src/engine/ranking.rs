use crate::core::models::pair::PrimerPair;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

// Heap entry ordered so that the worst pair sits at the top.
#[derive(Debug)]
struct Ranked(PrimerPair);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank_cmp(&other.0)
    }
}

/// Keeps the best `capacity` pairs seen so far.
///
/// Offering a pair costs `O(log capacity)`; the pair is dropped immediately when
/// the ranker is full and the pair is no better than the current worst.
#[derive(Debug)]
pub struct PairRanker {
    capacity: usize,
    heap: BinaryHeap<Ranked>,
}

impl PairRanker {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity.saturating_add(1).min(1024)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    /// Quality of the worst kept pair.
    pub fn worst_quality(&self) -> Option<f64> {
        self.heap.peek().map(|r| r.0.quality)
    }

    /// Offers a pair; returns whether it was kept.
    pub fn offer(&mut self, pair: PrimerPair) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.is_full() {
            match self.heap.peek() {
                Some(worst) if pair.rank_cmp(&worst.0) == Ordering::Less => {
                    self.heap.pop();
                }
                _ => return false,
            }
        }
        self.heap.push(Ranked(pair));
        true
    }

    /// The kept pairs, best first.
    pub fn into_sorted(self) -> Vec<PrimerPair> {
        self.heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
    }
}
