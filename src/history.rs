//! Fixed-length pitch history with a lower-median read-out.

use stride_core::lower_median;

/// Sliding window of the last `len` values, oldest at index 0.
///
/// The history starts zeroed, so medians taken before `len` appends lean
/// toward zero.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    history: Vec<f32>,
    scratch: Vec<f32>,
}

impl HistoryBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            history: vec![0.0; len],
            scratch: vec![0.0; len],
        }
    }

    /// Drop the oldest value and store `value` as the newest.
    pub fn append(&mut self, value: f32) {
        if self.history.is_empty() {
            return;
        }
        self.history.rotate_left(1);
        if let Some(last) = self.history.last_mut() {
            *last = value;
        }
    }

    /// Lower-middle order statistic of the window (index `(len - 1) / 2`
    /// after sorting). Never averages, never reorders the history.
    pub fn median(&mut self) -> f32 {
        self.scratch.copy_from_slice(&self.history);
        lower_median(&mut self.scratch)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Chronological view, oldest first.
    pub fn as_slice(&self) -> &[f32] {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.fill(0.0);
    }
}
