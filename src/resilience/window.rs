//! Count-based sliding window of call outcomes.
//!
//! # Responsibilities
//! - Remember the verdict of the last N calls (ring semantics)
//! - Report the failure rate over what is currently held
//!
//! Not synchronized; the owning breaker guards it.

use serde::Serialize;

/// Verdict of one completed (or timed-out) call attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    Failure,
}

/// Fixed-capacity ring buffer of outcomes.
#[derive(Debug, Clone)]
pub struct OutcomeWindow {
    slots: Vec<Outcome>,
    capacity: usize,
    /// Index of the oldest entry once the ring is full.
    head: usize,
    failures: usize,
}

impl OutcomeWindow {
    /// Create an empty window. A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
            failures: 0,
        }
    }

    /// Append an outcome, overwriting the oldest one when full.
    pub fn record(&mut self, outcome: Outcome) {
        if self.slots.len() < self.capacity {
            self.slots.push(outcome);
        } else {
            let evicted = std::mem::replace(&mut self.slots[self.head], outcome);
            if evicted == Outcome::Failure {
                self.failures -= 1;
            }
            self.head = (self.head + 1) % self.capacity;
        }

        if outcome == Outcome::Failure {
            self.failures += 1;
        }
    }

    /// Failure percentage (0-100) over the held entries; 0 when empty.
    pub fn failure_rate(&self) -> u8 {
        let len = self.slots.len();
        if len == 0 {
            return 0;
        }
        // failures <= len, so the result is at most 100
        (self.failures * 100 / len) as u8
    }

    /// Number of outcomes currently held (never above capacity).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all history, starting a fresh measurement period.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
        self.failures = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_reports_zero() {
        let window = OutcomeWindow::new(4);
        assert!(window.is_empty());
        assert_eq!(window.failure_rate(), 0);
    }

    #[test]
    fn test_rate_before_first_fill() {
        let mut window = OutcomeWindow::new(4);
        window.record(Outcome::Success);
        window.record(Outcome::Failure);
        window.record(Outcome::Failure);

        assert_eq!(window.len(), 3);
        assert!(!window.is_full());
        assert_eq!(window.failure_rate(), 66);
    }

    #[test]
    fn test_ring_overwrites_oldest() {
        let mut window = OutcomeWindow::new(2);
        window.record(Outcome::Failure);
        window.record(Outcome::Failure);
        assert_eq!(window.failure_rate(), 100);

        // Evicts the first failure
        window.record(Outcome::Success);
        assert_eq!(window.len(), 2);
        assert_eq!(window.failures(), 1);
        assert_eq!(window.failure_rate(), 50);

        // Evicts the second failure
        window.record(Outcome::Success);
        assert_eq!(window.failures(), 0);
        assert_eq!(window.failure_rate(), 0);
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        let mut window = OutcomeWindow::new(3);
        for i in 0..50 {
            let outcome = if i % 3 == 0 { Outcome::Failure } else { Outcome::Success };
            window.record(outcome);
            assert!(window.len() <= window.capacity());
            assert!(window.failures() <= window.len());
        }
    }

    #[test]
    fn test_clear() {
        let mut window = OutcomeWindow::new(2);
        window.record(Outcome::Failure);
        window.record(Outcome::Failure);
        window.clear();

        assert!(window.is_empty());
        assert_eq!(window.failure_rate(), 0);

        window.record(Outcome::Success);
        assert_eq!(window.len(), 1);
        assert_eq!(window.failures(), 0);
    }

    #[test]
    fn test_zero_capacity_is_bumped() {
        let mut window = OutcomeWindow::new(0);
        window.record(Outcome::Failure);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.failure_rate(), 100);
    }
}
