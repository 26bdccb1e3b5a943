//! Scored search candidate.
//!
//! Borrows its record from the working set; candidates live for one ranking
//! pass and are never stored.

/// A record paired with its relevance score and its position in fetch order.
/// `position` is the tie-break that keeps ranking deterministic.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a, R> {
    pub record: &'a R,
    pub score: f64,
    pub position: usize,
}

impl<'a, R> ScoredCandidate<'a, R> {
    pub fn new(record: &'a R, score: f64, position: usize) -> Self {
        Self { record, score, position }
    }

    /// Only candidates with a positive score survive filtering
    pub fn is_match(&self) -> bool {
        self.score > 0.0
    }

    /// Descending by score, then ascending by fetch order
    pub fn rank_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.position.cmp(&other.position))
    }
}
