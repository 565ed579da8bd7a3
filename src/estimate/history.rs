// src/estimate/history.rs

//! Bounded run-duration history and its recency-biased weight vector.

use std::collections::VecDeque;

use crate::config::EstimatorSection;

/// Knobs for the weighting rule.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSettings {
    /// Number of remembered runs.
    pub capacity: usize,
    /// Share of the slots (most recent first) that get the high weight.
    pub high_weight_fraction: f64,
    /// Combined weight of the high slots.
    pub high_weight: f64,
}

impl Default for WeightSettings {
    fn default() -> Self {
        Self::from_config(&EstimatorSection::default())
    }
}

impl WeightSettings {
    pub fn from_config(cfg: &EstimatorSection) -> Self {
        Self {
            capacity: cfg.history_capacity,
            high_weight_fraction: cfg.high_weight_fraction,
            high_weight: cfg.high_weight,
        }
    }

    /// Number of high-weight slots: `capacity * fraction`, at least one.
    pub fn high_slots(&self) -> usize {
        // Nudge past float noise such as 0.29 * 100 = 28.999999999999996.
        let raw = (self.capacity as f64 * self.high_weight_fraction + 1e-9).floor();
        (raw as usize).max(1)
    }
}

/// One weight per history slot, most recent slot first.
///
/// Unpopulated slots carry zero weight once the history holds two or more
/// runs, so the populated weights alone sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    weights: Vec<f64>,
}

impl WeightVector {
    pub fn uniform(capacity: usize) -> Self {
        let w = if capacity == 0 { 0.0 } else { 1.0 / capacity as f64 };
        Self {
            weights: vec![w; capacity],
        }
    }

    /// Weights for a history currently holding `size` runs.
    ///
    /// The first `k` slots share `high_weight`, the remaining populated
    /// slots share `1 - high_weight`. With the default settings `k == 1`,
    /// so the newest run weighs 0.9 and the other `size - 1` runs split 0.1.
    /// If every populated slot is a high slot the weights are uniform.
    pub fn for_size(settings: &WeightSettings, size: usize) -> Self {
        let capacity = settings.capacity;
        let size = size.min(capacity);
        if size < 2 {
            return Self::uniform(capacity);
        }

        let high = settings.high_slots().min(size);
        let mut weights = vec![0.0; capacity];

        if high == size {
            let w = 1.0 / size as f64;
            weights[..size].iter_mut().for_each(|slot| *slot = w);
        } else {
            let high_each = settings.high_weight / high as f64;
            let low_each = (1.0 - settings.high_weight) / (size - high) as f64;
            for (i, slot) in weights[..size].iter_mut().enumerate() {
                *slot = if i < high { high_each } else { low_each };
            }
        }

        Self { weights }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    /// Sum of the first `populated` weights.
    pub fn populated_sum(&self, populated: usize) -> f64 {
        self.weights.iter().take(populated).sum()
    }
}

/// Past run durations in milliseconds, most recent first.
///
/// Holds at most `capacity` entries; recording into a full history evicts
/// the oldest run.
#[derive(Debug, Clone)]
pub struct RunHistory {
    settings: WeightSettings,
    runs: VecDeque<f64>,
    weights: WeightVector,
}

impl RunHistory {
    pub fn new(settings: WeightSettings) -> Self {
        let capacity = settings.capacity;
        Self {
            settings,
            runs: VecDeque::with_capacity(capacity),
            weights: WeightVector::uniform(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.settings.capacity
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Durations in milliseconds, most recent first.
    pub fn durations(&self) -> impl Iterator<Item = f64> + '_ {
        self.runs.iter().copied()
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    /// Record a finished run.
    pub fn record(&mut self, duration_ms: f64) {
        if self.settings.capacity == 0 {
            return;
        }
        if self.runs.len() >= self.settings.capacity {
            self.runs.pop_back();
        }
        self.runs.push_front(duration_ms.max(0.0));

        if self.runs.len() >= 2 {
            self.weights = WeightVector::for_size(&self.settings, self.runs.len());
        }
    }

    /// Weighted estimate of the next run, in milliseconds.
    ///
    /// Zero when fewer than two runs are known.
    pub fn estimate_ms(&self) -> f64 {
        if self.runs.len() < 2 {
            return 0.0;
        }
        self.runs
            .iter()
            .zip(self.weights.as_slice())
            .map(|(run, weight)| run * weight)
            .sum()
    }

    /// Forget every run and reset the weights.
    pub fn clear(&mut self) {
        self.runs.clear();
        self.weights = WeightVector::uniform(self.settings.capacity);
    }
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::new(WeightSettings::default())
    }
}
