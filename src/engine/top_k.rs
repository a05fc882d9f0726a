//! Bounded best-K candidate set.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::candidate::rank_order;
use crate::settings::EnigmaSettings;

/// A settings value with its score, ordered best first.
#[derive(Debug, Clone)]
pub(crate) struct Scored {
    pub score: f64,
    pub settings: EnigmaSettings,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_order(self.score, &self.settings, other.score, &other.settings)
    }
}

/// Keeps the `capacity` best entries seen.
///
/// The heap top is the worst retained entry, so eviction is `O(log K)`.
/// Because entries are totally ordered, the retained set does not depend on
/// insertion order.
#[derive(Debug)]
pub(crate) struct TopK {
    capacity: usize,
    heap: BinaryHeap<Scored>,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Cheap pre-check so callers only build settings for scores that can
    /// enter the set.
    #[inline]
    pub fn admits(&self, score: f64) -> bool {
        self.heap.len() < self.capacity || self.heap.peek().is_some_and(|worst| score >= worst.score)
    }

    pub fn push(&mut self, entry: Scored) {
        self.heap.push(entry);
        if self.heap.len() > self.capacity {
            self.heap.pop();
        }
    }

    pub fn merge(&mut self, other: Self) {
        for entry in other.heap {
            self.push(entry);
        }
    }

    /// Entries best first.
    pub fn into_sorted_vec(self) -> Vec<Scored> {
        self.heap.into_sorted_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ReflectorId, RotorId};

    fn entry(score: f64, positions: &str) -> Scored {
        Scored {
            score,
            settings: EnigmaSettings::builder()
                .rotors([RotorId::I, RotorId::II, RotorId::III])
                .reflector(ReflectorId::B)
                .positions(positions)
                .build()
                .unwrap(),
        }
    }

    #[test]
    fn keeps_best_entries() {
        let mut top = TopK::new(2);
        top.push(entry(1.0, "AAA"));
        top.push(entry(3.0, "AAB"));
        assert!(top.admits(1.0));
        assert!(!top.admits(0.5));
        top.push(entry(2.0, "AAC"));
        let scores: Vec<f64> = top.into_sorted_vec().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![3.0, 2.0]);
    }

    #[test]
    fn ties_evict_larger_settings() {
        let mut top = TopK::new(1);
        top.push(entry(1.0, "AAC"));
        top.push(entry(1.0, "AAB"));
        let kept = top.into_sorted_vec();
        assert_eq!(kept.len(), 1);
        assert!(kept[0].settings.to_string().contains("AAB"));
    }

    #[test]
    fn merge_is_order_independent() {
        let entries = [(1.0, "AAA"), (5.0, "ABA"), (5.0, "AAB"), (2.0, "BAA"), (4.0, "CAA")];

        let mut left = TopK::new(3);
        let mut right = TopK::new(3);
        for (i, (s, p)) in entries.iter().enumerate() {
            if i % 2 == 0 {
                left.push(entry(*s, p));
            } else {
                right.push(entry(*s, p));
            }
        }
        left.merge(right);

        let mut reversed = TopK::new(3);
        for (s, p) in entries.iter().rev() {
            reversed.push(entry(*s, p));
        }

        let a: Vec<String> = left.into_sorted_vec().iter().map(|e| e.settings.to_string()).collect();
        let b: Vec<String> = reversed.into_sorted_vec().iter().map(|e| e.settings.to_string()).collect();
        assert_eq!(a, b);
        assert!(a[0].contains("AAB"));
    }
}
