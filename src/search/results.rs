use std::collections::BinaryHeap;
use std::cmp::Ordering;
use crate::core::error::Error;
use crate::core::types::DocId;

/// Document with relevance score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredResult {
    pub doc_id: DocId,
    pub score: f32,
}

/// Search results container
///
/// `skipped` carries the diagnostic when a query could not be parsed; the
/// hit list is then empty.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub hits: Vec<ScoredResult>,
    pub total_hits: usize,
    pub max_score: f32,
    pub took_ms: u64,
    pub skipped: Option<Error>,
}

impl SearchResults {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn skipped(error: Error) -> Self {
        SearchResults {
            skipped: Some(error),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.hits.iter().map(|hit| hit.doc_id).collect()
    }
}

// Heap order: the worst kept result sits on top
#[derive(Debug, Clone, Copy)]
struct Ranked(ScoredResult);

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
        // Lower score is worse; on equal scores the larger doc id is worse
        other.0.score.total_cmp(&self.0.score)
            .then_with(|| self.0.doc_id.cmp(&other.0.doc_id))
    }
}

/// Top-K collector for efficient result collection
pub struct TopKCollector {
    heap: BinaryHeap<Ranked>,
    k: usize,
    total_collected: usize,
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector {
            heap: BinaryHeap::with_capacity(k + 1),
            k,
            total_collected: 0,
        }
    }

    pub fn collect(&mut self, doc_id: DocId, score: f32) {
        self.total_collected += 1;
        if self.k == 0 {
            return;
        }

        let candidate = Ranked(ScoredResult { doc_id, score });
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if self.heap.peek().is_some_and(|worst| candidate < *worst) {
            self.heap.pop();
            self.heap.push(candidate);
        }
    }

    pub fn total_collected(&self) -> usize {
        self.total_collected
    }

    /// Best first: score descending, then doc id ascending.
    pub fn into_results(self) -> Vec<ScoredResult> {
        self.heap.into_sorted_vec().into_iter().map(|ranked| ranked.0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_best_k_with_doc_id_tie_break() {
        let mut collector = TopKCollector::new(3);
        for (doc, score) in [(5, 1.0), (2, 3.0), (9, 2.0), (1, 2.0), (7, 0.5), (3, 2.0)] {
            collector.collect(DocId(doc), score);
        }
        assert_eq!(collector.total_collected(), 6);

        let ranked: Vec<(u64, f32)> = collector.into_results().iter().map(|r| (r.doc_id.0, r.score)).collect();
        assert_eq!(ranked, vec![(2, 3.0), (1, 2.0), (3, 2.0)]);
    }

    #[test]
    fn fewer_hits_than_k() {
        let mut collector = TopKCollector::new(10);
        collector.collect(DocId(4), 0.1);
        collector.collect(DocId(8), 0.9);
        let ids: Vec<u64> = collector.into_results().iter().map(|r| r.doc_id.0).collect();
        assert_eq!(ids, vec![8, 4]);
    }
}
