//! Bounded top-k selection shared by all strategies.
//!
//! Results are ordered ascending by score with ties broken by record id
//! ascending, so two identical queries over an unmodified collection
//! return byte-identical result lists.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use strata_core::types::{QueryResult, VectorRecord};

/// A scored candidate during a scan. Borrows the record id so pushing a
/// candidate that will not survive the cut costs nothing.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<'a> {
    pub score: f64,
    pub id: &'a str,
    pub position: usize,
}

impl Candidate<'_> {
    fn rank_cmp(&self, other: &Self) -> Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.id.cmp(other.id))
    }
}

impl PartialEq for Candidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.rank_cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate<'_> {}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate<'_> {
    // BinaryHeap is a max-heap: the worst surviving candidate (largest
    // score, then largest id) sits on top and is evicted first.
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank_cmp(other)
    }
}

/// Bounded selection of the k best candidates, O(n log k).
pub(crate) struct TopK<'a> {
    k: usize,
    heap: BinaryHeap<Candidate<'a>>,
}

impl<'a> TopK<'a> {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    pub fn push(&mut self, candidate: Candidate<'a>) {
        if self.heap.len() == self.k {
            match self.heap.peek() {
                Some(worst) if candidate.rank_cmp(worst) == Ordering::Less => {
                    self.heap.pop();
                }
                _ => return,
            }
        }
        self.heap.push(candidate);
    }

    /// Drain into ascending (score, id) order.
    pub fn into_sorted(self) -> Vec<Candidate<'a>> {
        let mut out = self.heap.into_vec();
        out.sort_by(|a, b| a.rank_cmp(b));
        out
    }
}

/// Materialize ranked candidates into caller-facing results, snapshotting
/// content and metadata from the backing records.
pub(crate) fn to_results(candidates: Vec<Candidate<'_>>, records: &[VectorRecord]) -> Vec<QueryResult> {
    candidates
        .into_iter()
        .map(|c| {
            let record = &records[c.position];
            QueryResult {
                record_id: record.id.clone(),
                score: c.score,
                content: record.content.clone(),
                metadata: record.metadata.clone(),
            }
        })
        .collect()
}

/// Ranked results plus the abstract charge the scan incurred.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: Vec<QueryResult>,
    pub unit_cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_k_best_in_ascending_order() {
        let ids = ["e", "d", "c", "b", "a"];
        let mut topk = TopK::new(3);
        for (i, id) in ids.iter().enumerate() {
            topk.push(Candidate {
                score: (5 - i) as f64,
                id,
                position: i,
            });
        }
        let sorted = topk.into_sorted();
        let scores: Vec<f64> = sorted.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn ties_break_by_id_ascending() {
        let mut topk = TopK::new(2);
        for (id, position) in [("zz", 0), ("aa", 1), ("mm", 2)] {
            topk.push(Candidate {
                score: 0.5,
                id,
                position,
            });
        }
        let sorted = topk.into_sorted();
        let ids: Vec<&str> = sorted.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["aa", "mm"]);
    }
}
