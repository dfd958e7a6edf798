use itertools::{Itertools, MinMaxResult};
use std::collections::VecDeque;

/// Fixed-capacity FIFO window over the most recent barometric altitude samples.
///
/// Pushing into a full window evicts the oldest sample, so the window never holds more than
/// `capacity` values and never reallocates after construction.
#[derive(Debug, Clone)]
pub struct AltitudeHistory {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl AltitudeHistory {
    pub fn new(capacity: usize) -> Self {
        Self { samples: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, altitude_m: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(altitude_m);
    }

    pub fn len(&self) -> usize { self.samples.len() }
    pub fn capacity(&self) -> usize { self.capacity }
    pub fn is_full(&self) -> bool { self.capacity > 0 && self.samples.len() == self.capacity }
    pub fn clear(&mut self) { self.samples.clear(); }
    pub fn iter(&self) -> impl Iterator<Item = &f64> { self.samples.iter() }

    /// Oldest minus newest sample. Positive while descending, `0.0` for an empty window.
    pub fn drop_magnitude(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(oldest), Some(newest)) => oldest - newest,
            _ => 0.0,
        }
    }

    /// Spread (max - min) over the window, `0.0` for fewer than two samples.
    pub fn stability_band(&self) -> f64 {
        match self.samples.iter().minmax() {
            MinMaxResult::MinMax(min, max) => max - min,
            MinMaxResult::NoElements | MinMaxResult::OneElement(_) => 0.0,
        }
    }
}
