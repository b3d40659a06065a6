//! A single loadcell sensor: owns its filter, calibration table, zero/tare
//! engines, motion detector, overload checks and totaling state, and runs
//! them in the fixed order spec.md 4.1 prescribes every tick.

pub mod motion;
pub mod overload;
pub mod status;
pub mod tare;
pub mod total;
pub mod zero;

use crate::calibration::SensorCal;
use crate::filter::{Filter, FilterConfig};
use crate::sensor::{RawSample, SampleStatus, SensorFeature, SensorId};
use crate::setpoint::SetpointBank;
use crate::standard::LegalForTradeMode;

use motion::MotionDetector;
use overload::{check_range, OverloadParams, ServiceCounters};
use status::{Status, Status2, Status3};
use tare::TareState;
use total::{TotalMode, TotalState};
use zero::ZeroState;

/// One tick's worth of derived readings, the value a `scale-service`
/// consumer publishes. `gross_unfiltered` and `peak_hold`/`new_peak` ride
/// outside the status bitflags -- `status`/`status2`/`status3` are each a
/// fully packed byte with no spare bits for them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub gross: f32,
    pub net: f32,
    pub displayed: f32,
    /// Gross weight computed straight from this tick's unfiltered ADC
    /// sample, bypassing the running-average filter entirely.
    pub gross_unfiltered: f32,
    /// Highest gross weight reached since the last peak reset, tracked off
    /// the ADC layer's own `max_raw_adc_count` rather than the filtered
    /// reading.
    pub peak_hold: f32,
    /// True only on the tick `peak_hold` advances.
    pub new_peak: bool,
    pub status: Status,
    pub status2: Status2,
    pub status3: Status3,
}

pub struct Loadcell {
    pub id: SensorId,
    pub feature: SensorFeature,
    pub legal_mode: LegalForTradeMode,
    pub cal: SensorCal,
    pub filter: Filter,
    pub zero: ZeroState,
    pub tare: TareState,
    pub motion: MotionDetector,
    pub overload_params: OverloadParams,
    pub counters: ServiceCounters,
    pub total: TotalState,
    pub setpoints: SetpointBank,
    /// Elapsed-tick accumulator for pending captures; callers supply the
    /// millisecond delta each tick, see [`Loadcell::tick`].
    pub filter_interval_ms: u32,
    pub user_pending_ms: u32,
    peak_hold_wt: f32,
}

impl Loadcell {
    pub fn new(id: SensorId, legal_mode: LegalForTradeMode, cal: SensorCal) -> Self {
        Loadcell {
            id,
            feature: SensorFeature::ENABLED,
            legal_mode,
            cal,
            filter: Filter::new(FilterConfig::default()),
            zero: ZeroState::new(),
            tare: TareState::new(),
            motion: MotionDetector::new(),
            overload_params: OverloadParams::default(),
            counters: ServiceCounters::new(),
            total: TotalState::new(TotalMode::Disabled),
            setpoints: SetpointBank::new(),
            filter_interval_ms: 100,
            user_pending_ms: 500,
            peak_hold_wt: 0.0,
        }
    }

    /// Run one pass of the fixed pipeline: compute -> motion -> total ->
    /// zero/AZM -> center-of-zero -> pending-zero -> pending-tare ->
    /// overload/range -> rounding. `elapsed_ms` is the time since the
    /// previous call. Setpoints are evaluated by
    /// [`crate::plant::Plant`], not here, since a setpoint may reference
    /// any sensor in the plant.
    pub fn tick(&mut self, elapsed_ms: u32, sample: RawSample) -> Reading {
        let params = self.legal_mode.params();
        let countby_d = self.cal.countby.f_value;

        // 1. Compute: filter, transfer function, unfiltered/peak readings.
        // `zero_offset` is snapshotted once up front so the zero/AZM step
        // further down -- which may move `zero_adc` -- can never reach back
        // and change the gross weight this same tick is reporting.
        let filtered_adc = if sample.status.contains(SampleStatus::GOT_ADC_CNT) {
            self.filter.push(sample.cur_adc_count as f32, self.cal.adc_counts_per_countby()) as i32
        } else {
            self.filter.current() as i32
        };
        let raw_value = self.cal.adc_to_value(filtered_adc);
        let zero_offset = self.zero_offset();
        let gross = raw_value - zero_offset;

        let gross_unfiltered = if sample.status.contains(SampleStatus::GOT_UNFILTERED_ADC_CNT) {
            self.cal.adc_to_value(sample.cur_raw_adc_count) - zero_offset
        } else {
            gross
        };

        let peak_candidate = self.cal.adc_to_value(sample.max_raw_adc_count) - zero_offset;
        let new_peak = peak_candidate > self.peak_hold_wt;
        if new_peak {
            self.peak_hold_wt = peak_candidate;
        }

        // 2. Motion.
        let in_motion = self.motion.tick(elapsed_ms, gross, countby_d, &params);

        // 3. Total.
        self.total.tick(elapsed_ms, gross, countby_d, self.overload_params.lift_threshold_d, in_motion, false, None);

        // 4. Zero / AZM.
        let azm_enabled = self.feature.contains(SensorFeature::ENABLED) && self.legal_mode.allows_azm();
        self.zero.tick_azm(elapsed_ms, filtered_adc, gross, countby_d, &params, azm_enabled);

        // 5. Center-of-zero: a distinct, tighter band than AZM's
        // (quarter-countby, widened to 4 countby while peak-holding), and
        // only while settled.
        let quarter_cb = if self.total.mode == TotalMode::AutoPeak { 4.0 } else { 0.25 };
        let coz_reference = self.tare.display_value(gross);
        let center_of_zero = !in_motion && coz_reference.abs() <= quarter_cb * countby_d;

        // 6. Pending zero.
        self.zero
            .tick_pending(elapsed_ms, filtered_adc, gross, self.cal.capacity, countby_d, &params, in_motion);

        // 7. Pending tare, then auto-clear.
        self.tare.tick_pending(elapsed_ms, gross, in_motion);
        self.tare.tick_auto_clear(gross, countby_d, in_motion);

        let net = self.tare.net_value(gross);
        let displayed_raw = self.tare.display_value(gross);
        let displayed = self.cal.countby.round(displayed_raw);

        // Overload / underload / range.
        let range = check_range(
            raw_value,
            gross,
            self.cal.capacity,
            countby_d,
            zero_offset,
            self.zero.awaiting_power_up_zero,
            &self.overload_params,
        );
        self.counters.tick(gross, raw_value, self.cal.capacity, countby_d, range, &self.overload_params);

        let mut status = Status::empty();
        if range.overload {
            log::warn!(target: "scale_core::loadcell", "sensor {}: overload, gross={:.2} capacity={:.2}", self.id.0, gross, self.cal.capacity);
            status |= Status::OVERLOAD;
        }
        if range.underload {
            status |= Status::UNDERLOAD;
        }
        if in_motion {
            status |= Status::IN_MOTION;
        }
        if center_of_zero {
            status |= Status::CENTER_OF_ZERO;
        }
        if self.tare.mode == tare::TareMode::Net {
            status |= Status::NET_MODE;
            status |= Status::TARE_ACTIVE;
        }
        if !self.cal.status.has_usable_transfer_function() {
            status |= Status::UNCALIBRATED;
        }

        let mut status2 = Status2::empty();
        if self.tare.has_pending() {
            status2 |= Status2::TARE_PENDING;
        }
        if self.zero.has_pending() {
            status2 |= Status2::ZERO_PENDING;
        }
        if self.zero.awaiting_power_up_zero {
            status2 |= Status2::POWER_UP_ZERO_FAILED;
        }
        if azm_enabled {
            status2 |= Status2::AZM_ACTIVE;
        }
        if self.counters.ack_needed {
            status2 |= Status2::SERVICE_COUNTER_ACK_NEEDED;
        }

        // Setpoints can reference any sensor in the plant, so `Plant::tick`
        // fills in `status3` after every sensor has run; this tick reports
        // none engaged.
        let status3 = Status3::empty();

        Reading {
            gross,
            net,
            displayed,
            gross_unfiltered,
            peak_hold: self.peak_hold_wt,
            new_peak,
            status,
            status2,
            status3,
        }
    }

    fn zero_offset(&self) -> f32 {
        self.cal.adc_to_value(self.zero.zero_adc)
    }

    pub fn required_settle_ms(&self) -> u32 {
        tare::required_settle_ms(self.user_pending_ms, self.filter_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{RawSample, SampleStatus};
    use crate::units::WeightUnit;

    fn calibrated_cell() -> Loadcell {
        let mut cal = SensorCal::new(WeightUnit::Lb);
        cal.capacity = 1000.0;
        cal.adc_cnt = [0, 10_000, 20_000, 20_000, 20_000];
        cal.value = [0.0, 500.0, 1000.0, 1000.0, 1000.0];
        cal.status = crate::calibration::CalStatus::Completed;
        Loadcell::new(SensorId(0), LegalForTradeMode::Industry, cal)
    }

    fn sample(adc: i32) -> RawSample {
        RawSample {
            cur_adc_count: adc,
            cur_raw_adc_count: adc,
            max_raw_adc_count: adc,
            status: SampleStatus::GOT_ADC_CNT | SampleStatus::GOT_UNFILTERED_ADC_CNT,
        }
    }

    #[test]
    fn tick_produces_calibrated_gross_weight() {
        let mut lc = calibrated_cell();
        for _ in 0..5 {
            lc.tick(100, sample(10_000));
        }
        let r = lc.tick(100, sample(10_000));
        assert!((r.gross - 500.0).abs() < 1.0);
    }

    #[test]
    fn overload_flag_sets_past_capacity() {
        let mut lc = calibrated_cell();
        // 25_000 extrapolates past the calibrated span to 1250, clear of the
        // corrected capacity + 8*countby (1008) threshold.
        for _ in 0..5 {
            lc.tick(100, sample(25_000));
        }
        let r = lc.tick(100, sample(25_000));
        assert!(r.status.contains(Status::OVERLOAD));
    }

    #[test]
    fn peak_hold_tracks_highest_reading_and_flags_new_peak() {
        let mut lc = calibrated_cell();
        lc.tick(100, sample(10_000));
        let r = lc.tick(100, sample(15_000));
        assert!(r.new_peak);
        assert!((r.peak_hold - 750.0).abs() < 1.0);
        // dropping back down doesn't lower the held peak or flag a new one.
        let r = lc.tick(100, sample(10_000));
        assert!(!r.new_peak);
        assert!((r.peak_hold - 750.0).abs() < 1.0);
    }

    #[test]
    fn gross_unfiltered_bypasses_the_running_average() {
        let mut lc = calibrated_cell();
        // Warm the filter on zero, then step up by less than the filter's
        // step-bypass threshold -- the running average only partially
        // catches up, but the unfiltered reading reports the jump in full.
        for _ in 0..4 {
            lc.tick(100, sample(0));
        }
        let r = lc.tick(100, sample(300));
        assert!((r.gross_unfiltered - 15.0).abs() < 0.5);
        assert!(r.gross_unfiltered > r.gross);
    }

    #[test]
    fn center_of_zero_uses_a_tighter_band_than_azm_and_requires_settled() {
        let mut lc = calibrated_cell();
        // countby_d is 1.0 here, so quarter-countby is 0.25 -- well inside
        // AZM's much wider default band but still asserts once settled.
        lc.tick(0, sample(0));
        for _ in 0..20 {
            lc.tick(1000, sample(0));
        }
        let r = lc.tick(1000, sample(0));
        assert!(r.status.contains(Status::CENTER_OF_ZERO));
    }

    #[test]
    fn zero_by_command_in_motion_reports_pending_until_settled() {
        let mut lc = calibrated_cell();
        // Large swings keep the motion detector engaged.
        lc.tick(100, sample(10_000));
        lc.tick(100, sample(0));
        lc.zero
            .zero_by_command(0, 0.0, lc.cal.capacity, lc.cal.countby.f_value, &lc.legal_mode.params(), true, lc.required_settle_ms())
            .unwrap();
        let r = lc.tick(100, sample(0));
        assert!(r.status2.contains(Status2::ZERO_PENDING));
    }
}
