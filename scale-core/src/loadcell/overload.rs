//! Overload / underload / out-of-range checks and the service counters that
//! ride on top of them (lift counts, overload counts), with the hysteresis
//! needed so one physical event doesn't get counted twice.

use serde::{Deserialize, Serialize};

/// Overload engages `overload_margin_d` countby units over capacity, reduced
/// by however far the zero reference has drifted past 5% of capacity (the
/// classic "9 divisions over capacity" NTEP/OIML rule becomes a configurable
/// margin here rather than a hardcoded 9, with the zero-drift reduction spec
/// requires layered on top).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OverloadParams {
    pub overload_margin_d: f32,
    /// Underload engages below this percentage of capacity, applied to the
    /// un-zeroed (raw) reading -- a near-zero raw signal on a scale set up
    /// for a large capacity usually means a disconnected or broken cell.
    pub pcent_cap_underload: f32,
    /// Gross weight above which a "lift" is recognized for the service
    /// counter, in countby units.
    pub lift_threshold_d: f32,
    /// Counter must drop back below `lift_threshold_d - lift_hysteresis_d`
    /// before a new lift can be counted.
    pub lift_hysteresis_d: f32,
}

impl Default for OverloadParams {
    fn default() -> Self {
        OverloadParams {
            overload_margin_d: 8.0,
            pcent_cap_underload: 1.0,
            lift_threshold_d: 10.0,
            lift_hysteresis_d: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeCheck {
    pub overload: bool,
    pub underload: bool,
}

/// `overloadThresholdWt = capacity + overload_margin_d*cb - max(0, zeroWt -
/// 0.05*capacity)`; the reduction term is skipped while the sensor is still
/// awaiting its power-up zero, since `zero_wt` isn't a settled reference yet.
/// Underload compares the *un-zeroed* reading against a percentage of
/// capacity, independent of the overload threshold.
pub fn check_range(
    raw_value: f32,
    gross_value: f32,
    capacity: f32,
    countby_d: f32,
    zero_wt: f32,
    zero_on_power_up: bool,
    params: &OverloadParams,
) -> RangeCheck {
    let reduction = if zero_on_power_up {
        0.0
    } else {
        (zero_wt - 0.05 * capacity).max(0.0)
    };
    let overload_threshold = capacity + params.overload_margin_d * countby_d - reduction;
    let underload_threshold = capacity * (params.pcent_cap_underload / 100.0);
    RangeCheck {
        overload: gross_value >= overload_threshold,
        underload: raw_value < underload_threshold,
    }
}

/// Fixed service-ack intervals: every 2^14 lifts, every 2^10 overloads.
const LIFT_SERVICE_INTERVAL: u32 = 1 << 14;
const OVERLOAD_SERVICE_INTERVAL: u32 = 1 << 10;

/// Lift and overload service counters. Saturates at `u32::MAX` rather than
/// wrapping, and raises an acknowledge-needed flag every time a counter
/// crosses its fixed service interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceCounters {
    /// Lifetime lift count, never reset by a service acknowledge.
    pub user_lift_count: u32,
    pub lift_count: u32,
    pub overload_count: u32,
    armed_for_lift: bool,
    armed_for_overload: bool,
    pub ack_needed: bool,
}

impl ServiceCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(
        &mut self,
        gross_value: f32,
        raw_value: f32,
        capacity: f32,
        countby_d: f32,
        range: RangeCheck,
        params: &OverloadParams,
    ) {
        let lift_on = gross_value > params.lift_threshold_d * countby_d;
        let lift_off = gross_value < (params.lift_threshold_d - params.lift_hysteresis_d) * countby_d;

        if lift_on && self.armed_for_lift {
            self.lift_count = self.lift_count.saturating_add(1);
            self.user_lift_count = self.user_lift_count.saturating_add(1);
            self.armed_for_lift = false;
            if self.lift_count % LIFT_SERVICE_INTERVAL == 0 {
                self.ack_needed = true;
            }
        } else if lift_off {
            self.armed_for_lift = true;
        }

        if range.overload && self.armed_for_overload {
            self.overload_count = self.overload_count.saturating_add(1);
            self.armed_for_overload = false;
            if self.overload_count % OVERLOAD_SERVICE_INTERVAL == 0 {
                self.ack_needed = true;
            }
        } else if raw_value <= 0.75 * capacity {
            self.armed_for_overload = true;
        }
    }

    pub fn acknowledge(&mut self) {
        self.ack_needed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overload_engages_past_threshold_minus_zero_drift() {
        let params = OverloadParams::default();
        // capacity=1000, cb=1, zero_wt=0 -> threshold = 1000 + 8 = 1008
        let r = check_range(1010.0, 1010.0, 1000.0, 1.0, 0.0, false, &params);
        assert!(r.overload);
        let r = check_range(1007.0, 1007.0, 1000.0, 1.0, 0.0, false, &params);
        assert!(!r.overload);
    }

    #[test]
    fn overload_threshold_shrinks_with_zero_drift() {
        let params = OverloadParams::default();
        // zero has drifted to 100 (10% of capacity, 5% over the free margin)
        // -> threshold = 1000 + 8 - (100 - 50) = 958
        let r = check_range(960.0, 960.0, 1000.0, 1.0, 100.0, false, &params);
        assert!(r.overload);
        let r = check_range(950.0, 950.0, 1000.0, 1.0, 100.0, false, &params);
        assert!(!r.overload);
    }

    #[test]
    fn zero_drift_reduction_skipped_during_power_up_zero() {
        let params = OverloadParams::default();
        let r = check_range(1005.0, 1005.0, 1000.0, 1.0, 100.0, true, &params);
        assert!(!r.overload);
    }

    #[test]
    fn underload_compares_raw_reading_to_capacity_percentage() {
        let params = OverloadParams::default();
        // capacity=1000, pcent_cap_underload=1.0 -> threshold=10
        let r = check_range(5.0, 5.0, 1000.0, 1.0, 0.0, false, &params);
        assert!(r.underload);
        let r = check_range(15.0, 15.0, 1000.0, 1.0, 0.0, false, &params);
        assert!(!r.underload);
    }

    #[test]
    fn lift_counter_needs_hysteresis_reset() {
        let params = OverloadParams::default();
        let mut counters = ServiceCounters::new();
        counters.armed_for_lift = true;
        let range = RangeCheck {
            overload: false,
            underload: false,
        };
        counters.tick(50.0, 50.0, 1000.0, 1.0, range, &params);
        assert_eq!(counters.lift_count, 1);
        assert_eq!(counters.user_lift_count, 1);
        // staying loaded doesn't count again
        counters.tick(55.0, 55.0, 1000.0, 1.0, range, &params);
        assert_eq!(counters.lift_count, 1);
        // must drop below threshold - hysteresis before it can re-arm
        counters.tick(1.0, 1.0, 1000.0, 1.0, range, &params);
        counters.tick(50.0, 50.0, 1000.0, 1.0, range, &params);
        assert_eq!(counters.lift_count, 2);
        assert_eq!(counters.user_lift_count, 2);
    }

    #[test]
    fn overload_counter_requests_ack_at_fixed_interval() {
        let params = OverloadParams::default();
        let mut counters = ServiceCounters::new();
        counters.overload_count = OVERLOAD_SERVICE_INTERVAL - 1;
        counters.armed_for_overload = true;
        let range = RangeCheck {
            overload: true,
            underload: false,
        };
        counters.tick(1010.0, 1010.0, 1000.0, 1.0, range, &params);
        assert_eq!(counters.overload_count, OVERLOAD_SERVICE_INTERVAL);
        assert!(counters.ack_needed);
        counters.acknowledge();
        assert!(!counters.ack_needed);
    }
}
