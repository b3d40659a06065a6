//! Stepwise running-average sample filter with a step-threshold bypass: a
//! sudden large change (a load dropped on the platform) skips the average
//! and snaps straight to the new reading, instead of being smoothed away.

use serde::{Deserialize, Serialize};

/// Filter tuning, persisted per sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FilterConfig {
    /// Running-average window, 1..=16 samples.
    pub window: u8,
    /// A sample-to-sample delta larger than this many countby units bypasses
    /// the average entirely.
    pub step_threshold_d: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            window: 4,
            step_threshold_d: 20.0,
        }
    }
}

/// Running state for one sensor's filter.
#[derive(Debug, Clone)]
pub struct Filter {
    config: FilterConfig,
    history: [f32; 16],
    len: usize,
    head: usize,
    average: f32,
}

impl Filter {
    pub fn new(config: FilterConfig) -> Self {
        Filter {
            config,
            history: [0.0; 16],
            len: 0,
            head: 0,
            average: 0.0,
        }
    }

    pub fn reconfigure(&mut self, config: FilterConfig) {
        self.config = config;
        self.len = 0;
        self.head = 0;
    }

    /// Feed one new raw ADC-count sample. `counts_per_countby` converts
    /// `step_threshold_d` (expressed in countby units) into the same ADC-count
    /// domain as `raw` -- comparing a raw ADC delta straight against a
    /// weight-unit threshold would make the step bypass fire on ordinary ADC
    /// noise. Returns the filtered value, still in ADC counts.
    pub fn push(&mut self, raw: f32, counts_per_countby: f32) -> f32 {
        let window = self.config.window.clamp(1, 16) as usize;

        if self.len > 0 {
            let step = (raw - self.average).abs();
            let threshold = self.config.step_threshold_d * counts_per_countby.max(f32::MIN_POSITIVE);
            if step > threshold {
                self.len = 0;
                self.head = 0;
            }
        }

        self.history[self.head] = raw;
        self.head = (self.head + 1) % window;
        if self.len < window {
            self.len += 1;
        }

        let sum: f32 = self.history[..self.len].iter().sum();
        self.average = sum / self.len as f32;
        self.average
    }

    pub fn current(&self) -> f32 {
        self.average
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_within_window() {
        let mut f = Filter::new(FilterConfig {
            window: 4,
            step_threshold_d: 1000.0,
        });
        f.push(10.0, 1.0);
        f.push(20.0, 1.0);
        f.push(30.0, 1.0);
        let avg = f.push(40.0, 1.0);
        assert!((avg - 25.0).abs() < 1e-6);
    }

    #[test]
    fn step_bypass_snaps_to_new_load() {
        let mut f = Filter::new(FilterConfig {
            window: 4,
            step_threshold_d: 5.0,
        });
        for _ in 0..4 {
            f.push(10.0, 1.0);
        }
        assert!((f.current() - 10.0).abs() < 1e-6);
        let jumped = f.push(500.0, 1.0);
        assert!((jumped - 500.0).abs() < 1e-6);
    }
}
