//! Fixed-capacity ring buffer for per-rig histories.
//!
//! One shared type backs the motion predictor's samples, the oscillation
//! window, and the debug path history. Push is O(1) amortized; the oldest
//! entry is evicted once capacity is reached.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct History<T> {
    buf: VecDeque<T>,
    cap: usize,
}

impl<T> History<T> {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(cap.max(1)),
            cap: cap.max(1),
        }
    }

    pub fn push(&mut self, item: T) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(item);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.buf.back()
    }

    /// Oldest-to-newest iteration.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.buf.iter()
    }

    /// The `n` most recent entries, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.buf.len().saturating_sub(n);
        self.buf.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Drop entries from the front while `pred` holds (e.g. expired samples).
    pub fn evict_while(&mut self, mut pred: impl FnMut(&T) -> bool) {
        while let Some(front) = self.buf.front() {
            if pred(front) {
                self.buf.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_evicts_oldest() {
        let mut h = History::new(3);
        for i in 0..5 {
            h.push(i);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut h = History::new(8);
        for i in 0..6 {
            h.push(i);
        }
        assert_eq!(h.recent(3).copied().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn evict_while_stops_at_first_keeper() {
        let mut h = History::new(8);
        for i in 0..6 {
            h.push(i);
        }
        h.evict_while(|&v| v < 4);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), vec![4, 5]);
    }
}
