//! Tare: keyed-in tare weight, push-button (pending) tare capture, and
//! auto-clear when the net weight returns to (near) zero.
//!
//! Resolved open question (tare/zero pending time): a pending tare or zero
//! capture requires the reading to sit still for
//! `max(user_pending_ms, 3*filter_interval_ms + 500ms)` before it commits --
//! long enough to outlast the filter's own settling time regardless of how
//! aggressively the operator configured the pending timeout.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum TareMode {
    Gross,
    Net,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingTare {
    required_ms: u32,
    still_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TareState {
    pub mode: TareMode,
    pub tare_value: f32,
    pending: Option<PendingTare>,
    /// Net weight must fall to within this many countby units of zero for
    /// auto-clear to fire.
    pub auto_clear_band_d: f32,
    pub auto_clear_enabled: bool,
}

/// `max(user_pending_ms, 3*filter_interval_ms + 500)`, the settle time a
/// pending tare or zero capture must hold before committing.
pub fn required_settle_ms(user_pending_ms: u32, filter_interval_ms: u32) -> u32 {
    user_pending_ms.max(3 * filter_interval_ms + 500)
}

impl TareState {
    pub fn new() -> Self {
        TareState {
            mode: TareMode::Gross,
            tare_value: 0.0,
            pending: None,
            auto_clear_band_d: 1.0,
            auto_clear_enabled: false,
        }
    }

    /// Keyed-in tare: takes effect immediately, no settle time needed since
    /// it is an operator-entered constant, not a live capture.
    pub fn tare_set(&mut self, value: f32) {
        self.tare_value = value;
        self.mode = TareMode::Net;
    }

    /// Push-button tare: begin a pending capture of the current gross
    /// weight, requiring `required_ms` of stillness before committing.
    pub fn tare_gross_begin(&mut self, required_ms: u32) {
        self.pending = Some(PendingTare {
            required_ms,
            still_ms: 0,
        });
    }

    /// Advance the pending capture by `elapsed_ms`. `in_motion` resets the
    /// stillness counter. Returns `true` the tick the capture commits.
    pub fn tick_pending(&mut self, elapsed_ms: u32, gross_value: f32, in_motion: bool) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        if in_motion {
            pending.still_ms = 0;
            return false;
        }
        pending.still_ms += elapsed_ms;
        if pending.still_ms >= pending.required_ms {
            self.tare_value = gross_value;
            self.mode = TareMode::Net;
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn toggle_net_gross(&mut self) {
        self.mode = match self.mode {
            TareMode::Gross => TareMode::Net,
            TareMode::Net => TareMode::Gross,
        };
    }

    pub fn clear(&mut self) {
        self.tare_value = 0.0;
        self.mode = TareMode::Gross;
        self.pending = None;
    }

    pub fn net_value(&self, gross_value: f32) -> f32 {
        gross_value - self.tare_value
    }

    pub fn display_value(&self, gross_value: f32) -> f32 {
        match self.mode {
            TareMode::Gross => gross_value,
            TareMode::Net => self.net_value(gross_value),
        }
    }

    /// Auto-clear: when enabled and the net weight settles within
    /// `auto_clear_band_d` countby units of zero, drop the tare and return
    /// to gross mode. Returns `true` if it fired.
    pub fn tick_auto_clear(&mut self, gross_value: f32, countby_d: f32, in_motion: bool) -> bool {
        if !self.auto_clear_enabled || in_motion || self.mode != TareMode::Net || self.tare_value == 0.0 {
            return false;
        }
        if self.net_value(gross_value).abs() <= self.auto_clear_band_d * countby_d {
            self.clear();
            true
        } else {
            false
        }
    }
}

impl Default for TareState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_in_tare_is_immediate() {
        let mut t = TareState::new();
        t.tare_set(50.0);
        assert_eq!(t.mode, TareMode::Net);
        assert_eq!(t.display_value(150.0), 100.0);
    }

    #[test]
    fn pending_tare_needs_stillness() {
        let mut t = TareState::new();
        t.tare_gross_begin(1000);
        assert!(!t.tick_pending(400, 80.0, false));
        assert!(!t.tick_pending(400, 80.0, true)); // motion resets
        assert!(!t.tick_pending(999, 80.0, false));
        assert!(t.tick_pending(1, 80.0, false));
        assert_eq!(t.tare_value, 80.0);
    }

    #[test]
    fn settle_time_floor_outlasts_filter() {
        assert_eq!(required_settle_ms(100, 200), 1100);
        assert_eq!(required_settle_ms(5000, 200), 5000);
    }

    #[test]
    fn auto_clear_fires_near_zero_net() {
        let mut t = TareState::new();
        t.auto_clear_enabled = true;
        t.tare_set(100.0);
        assert!(!t.tick_auto_clear(100.4, 1.0, false));
        assert!(t.tick_auto_clear(100.0, 1.0, false));
        assert_eq!(t.mode, TareMode::Gross);
        assert_eq!(t.tare_value, 0.0);
    }
}
