//! Totaling engine: seven ways a sequence of individual weighments can be
//! accumulated into a running total, selected per sensor by [`TotalMode`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum TotalMode {
    /// Totaling engine is off; weighments are never accumulated.
    Disabled,
    /// Accumulates as soon as a stable load above the threshold appears,
    /// re-arming once the load returns below threshold (no stillness
    /// required on the way down).
    AutoLoad,
    /// Accumulates a stable load above threshold, then waits for the
    /// platform to settle back near zero before re-arming -- the
    /// traditional "remove load, add next load" batch cycle.
    AutoNormal,
    /// Tracks the highest reading reached while loaded and accumulates the
    /// peak, not whatever the reading happens to be when it settles.
    AutoPeak,
    /// For hoppers/silos being emptied: accumulates the amount removed
    /// (the last stable "full" reading) once the load drops back near zero.
    LoadDrop,
    /// Accumulates only when the caller signals an explicit operator accept
    /// of the current stable, above-threshold reading.
    OnAccept,
    /// Accumulates only on an explicit total command carrying its own
    /// value, independent of threshold or motion.
    OnCommand,
}

impl TotalMode {
    /// Stable byte encoding for persistence (`LcTotalMotionOpMode`).
    pub fn as_u8(self) -> u8 {
        match self {
            TotalMode::Disabled => 0,
            TotalMode::AutoLoad => 1,
            TotalMode::AutoNormal => 2,
            TotalMode::AutoPeak => 3,
            TotalMode::LoadDrop => 4,
            TotalMode::OnAccept => 5,
            TotalMode::OnCommand => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalState {
    pub mode: TotalMode,
    pub accumulator: f64,
    pub count: u32,
    pub sum_sq: f64,
    pub max_total: f32,
    pub min_total: f32,
    /// Milliseconds a reading must hold above `threshold` (and off motion)
    /// before `AutoLoad`/`AutoNormal`/`OnAccept` will accept it. Zero means
    /// accept as soon as the threshold is crossed.
    pub min_stable_ms: u32,
    phase: Phase,
    peak: f32,
    last_stable: f32,
    stable_ms: u32,
}

impl TotalState {
    pub fn new(mode: TotalMode) -> Self {
        TotalState {
            mode,
            accumulator: 0.0,
            count: 0,
            sum_sq: 0.0,
            max_total: 0.0,
            min_total: 0.0,
            min_stable_ms: 0,
            phase: Phase::Idle,
            peak: 0.0,
            last_stable: 0.0,
            stable_ms: 0,
        }
    }

    fn accept(&mut self, value: f32) -> Option<f32> {
        self.accumulator += value as f64;
        self.sum_sq += (value as f64) * (value as f64);
        if self.count == 0 {
            self.max_total = value;
            self.min_total = value;
        } else {
            self.max_total = self.max_total.max(value);
            self.min_total = self.min_total.min(value);
        }
        self.count += 1;
        Some(value)
    }

    /// Advance one tick. `threshold_d` is the loaded/unloaded boundary in
    /// countby units; `accept_requested` / `command_value` are operator
    /// inputs only [`TotalMode::OnAccept`] / [`TotalMode::OnCommand`] act on.
    /// Returns the value just totaled, if any.
    pub fn tick(
        &mut self,
        elapsed_ms: u32,
        gross_value: f32,
        countby_d: f32,
        threshold_d: f32,
        in_motion: bool,
        accept_requested: bool,
        command_value: Option<f32>,
    ) -> Option<f32> {
        let threshold = threshold_d * countby_d;

        if gross_value > threshold && !in_motion {
            self.stable_ms = self.stable_ms.saturating_add(elapsed_ms);
        } else {
            self.stable_ms = 0;
        }
        let stable_enough = self.stable_ms >= self.min_stable_ms;

        match self.mode {
            TotalMode::Disabled => None,

            TotalMode::AutoLoad => match self.phase {
                Phase::Idle if gross_value > threshold && !in_motion && stable_enough => {
                    self.phase = Phase::Loaded;
                    self.accept(gross_value)
                }
                Phase::Loaded if gross_value <= threshold => {
                    self.phase = Phase::Idle;
                    None
                }
                _ => None,
            },

            TotalMode::AutoNormal => match self.phase {
                Phase::Idle if gross_value > threshold && !in_motion && stable_enough => {
                    self.phase = Phase::Loaded;
                    self.accept(gross_value)
                }
                Phase::Loaded if gross_value <= threshold * 0.1 && !in_motion => {
                    self.phase = Phase::Idle;
                    None
                }
                _ => None,
            },

            TotalMode::AutoPeak => {
                if gross_value > threshold {
                    if self.phase == Phase::Idle {
                        self.phase = Phase::Loaded;
                        self.peak = gross_value;
                    } else if gross_value > self.peak {
                        self.peak = gross_value;
                    }
                    None
                } else if self.phase == Phase::Loaded && gross_value <= threshold * 0.1 && !in_motion {
                    self.phase = Phase::Idle;
                    let peak = self.peak;
                    self.peak = 0.0;
                    self.accept(peak)
                } else {
                    None
                }
            }

            TotalMode::LoadDrop => {
                if gross_value > threshold && !in_motion {
                    self.phase = Phase::Loaded;
                    self.last_stable = gross_value;
                    None
                } else if self.phase == Phase::Loaded && gross_value <= threshold * 0.1 && !in_motion {
                    self.phase = Phase::Idle;
                    let dropped = self.last_stable;
                    self.last_stable = 0.0;
                    self.accept(dropped)
                } else {
                    None
                }
            }

            TotalMode::OnAccept => {
                if accept_requested && !in_motion && gross_value > threshold {
                    self.accept(gross_value)
                } else {
                    None
                }
            }

            TotalMode::OnCommand => command_value.and_then(|v| self.accept(v)),
        }
    }

    pub fn clear(&mut self) {
        self.accumulator = 0.0;
        self.count = 0;
        self.sum_sq = 0.0;
        self.max_total = 0.0;
        self.min_total = 0.0;
        self.phase = Phase::Idle;
        self.peak = 0.0;
        self.last_stable = 0.0;
        self.stable_ms = 0;
    }

    /// Remove the last totaled amount (undo one accumulation).
    pub fn remove_last(&mut self, value: f32) {
        self.accumulator -= value as f64;
        self.count = self.count.saturating_sub(1);
    }
}
