//! Calibration table: a piecewise-linear transfer function from filtered ADC
//! counts to physical units, built point-by-point from operator-entered
//! reference loads, and the state machine that gates how points may be
//! entered.

use crate::countby::Countby;
use crate::error::CalError;
use crate::units::WeightUnit;

/// One zero point plus up to four span points.
pub const MAX_CAL_POINTS: usize = 5;

/// ADC counts must differ by at least this much to be considered a
/// different calibration point ("same load" guard).
const CAL_ADC_DELTA: i32 = 500;

/// Calibration progress, replacing the original firmware's magic byte values
/// (`UNCAL=255`, `COMPLETED=254`, span counts `0..=4`) with an explicit sum
/// type. `Building { count }` tracks the number of unique span points
/// entered so far (0 means only the zero point has been set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalStatus {
    Uncal,
    GotUnitCap,
    GotCountby,
    Building { count: u8 },
    Completed,
}

impl CalStatus {
    /// Whether the pipeline can compute a weight from this table right now
    /// (spec.md 4.1 step 2: "current cal table has >=2 valid points or is
    /// COMPLETED").
    pub fn has_usable_transfer_function(self) -> bool {
        matches!(self, CalStatus::Completed) || matches!(self, CalStatus::Building { count } if count >= 1)
    }

    /// Stable byte encoding for persistence, matching the original firmware's
    /// magic values (`UNCAL=255`, `COMPLETED=254`) so a persisted cal record
    /// can be told apart from a building one (`count` itself, `0..=4`).
    pub fn as_u8(self) -> u8 {
        match self {
            CalStatus::Uncal => 255,
            CalStatus::GotUnitCap => 253,
            CalStatus::GotCountby => 252,
            CalStatus::Building { count } => count,
            CalStatus::Completed => 254,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub adc: i32,
    pub value: f32,
}

/// A sensor's calibration table: `capacity`, a normalized `countby`, the
/// calibration state, the temperature at which it was built, and up to
/// [`MAX_CAL_POINTS`] `(adcCnt, value)` pairs. When the table is not yet
/// full, trailing entries duplicate the last valid point -- the "end
/// marker" convention `adc_to_value` relies on.
#[derive(Debug, Clone)]
pub struct SensorCal {
    pub capacity: f32,
    pub countby: Countby,
    pub status: CalStatus,
    pub temperature_k: f32,
    pub adc_cnt: [i32; MAX_CAL_POINTS],
    pub value: [f32; MAX_CAL_POINTS],
}

impl SensorCal {
    pub fn new(unit: WeightUnit) -> Self {
        SensorCal {
            capacity: 10_000.0,
            countby: Countby::new_raw(1.0, unit),
            status: CalStatus::Uncal,
            temperature_k: 0.0,
            adc_cnt: [0; MAX_CAL_POINTS],
            value: [0.0; MAX_CAL_POINTS],
        }
    }

    fn clear_points(&mut self) {
        self.adc_cnt = [0; MAX_CAL_POINTS];
        self.value = [0.0; MAX_CAL_POINTS];
    }

    /// `cal_allows_new_cal`: start a fresh calibration. Allowed only from
    /// `Completed`/`Uncal`.
    pub fn new_cal(&mut self, unit: WeightUnit, capacity: f32) -> Result<(), CalError> {
        match self.status {
            CalStatus::Completed | CalStatus::Uncal => {
                self.clear_points();
                self.countby = Countby::new_raw(self.countby.f_value, unit);
                self.capacity = capacity;
                self.status = CalStatus::GotUnitCap;
                Ok(())
            }
            _ => {
                log::warn!(target: "scale_core::calibration", "new_cal rejected, status={:?}", self.status);
                Err(CalError::NotAllow)
            }
        }
    }

    /// `cal_normalize_input_cal_countby`: normalize the user-entered
    /// countby. Allowed only at `GotUnitCap`.
    pub fn normalize_countby(&mut self, raw_countby: f32) -> Result<(), CalError> {
        match self.status {
            CalStatus::GotUnitCap => {
                self.countby = Countby::new_raw(raw_countby, self.countby.unit);
                self.status = CalStatus::GotCountby;
                Ok(())
            }
            CalStatus::Uncal | CalStatus::Completed => Err(CalError::WrongCalSequence),
            _ => Err(CalError::WrongCalSequence),
        }
    }

    /// `cal_zero_point`: insert the zero point. Allowed only at `GotCountby`
    /// and only for an enabled sensor (checked by the caller, which owns
    /// enable state).
    pub fn zero_point(&mut self, adc_zero: i32) -> Result<(), CalError> {
        match self.status {
            CalStatus::GotCountby => {
                self.clear_points();
                self.adc_cnt[0] = adc_zero;
                self.value[0] = 0.0;
                self.status = CalStatus::Building { count: 0 };
                Ok(())
            }
            _ => Err(CalError::WrongCalSequence),
        }
    }

    /// `cal_build_table`: insert a span point. See spec.md 4.3.
    pub fn build_table(&mut self, adc: i32, value: f32) -> Result<(), CalError> {
        if !matches!(self.status, CalStatus::Building { .. }) {
            return Err(CalError::WrongCalSequence);
        }
        if value > self.capacity * 1.1 {
            return Err(CalError::TestLoadGtCapacity);
        }

        let d = self.countby.f_value;
        let mut already_exists = false;
        for i in 0..MAX_CAL_POINTS {
            if self.value[i] >= value - d && self.value[i] <= value + d {
                self.value[i] = value;
                self.adc_cnt[i] = adc;
                already_exists = true;
            } else {
                if self.adc_cnt[i] >= adc - CAL_ADC_DELTA && self.adc_cnt[i] <= adc + CAL_ADC_DELTA {
                    return Err(CalError::DifferentValueOnSameLoad);
                }
                if i > 0 {
                    let d_adc = self.adc_cnt[i] - self.adc_cnt[i - 1];
                    if d_adc > 0 {
                        let d_val = self.value[i] - self.value[i - 1];
                        if d_val.abs() > 0.00001 {
                            let counts_per_d = (d_adc as f32 / d_val) * self.countby.f_value;
                            if counts_per_d < 3.9999 {
                                return Err(CalError::LessThan4CntPerD);
                            }
                        }
                    }
                }
            }
        }

        if !already_exists {
            self.insert_new_point(adc, value);
        }

        let mut unique = 0u8;
        for i in 0..MAX_CAL_POINTS - 1 {
            if self.adc_cnt[i + 1] != self.adc_cnt[i] {
                unique += 1;
            }
        }
        self.status = CalStatus::Building { count: unique };
        Ok(())
    }

    fn insert_new_point(&mut self, adc: i32, value: f32) {
        let last = MAX_CAL_POINTS - 1;
        let table_full = self.value[last] != self.value[last - 1];

        if !table_full {
            // find first duplicated ("empty") slot
            let mut first_empty = last;
            for i in 0..last {
                if self.value[i] == self.value[i + 1] {
                    first_empty = i + 1;
                    break;
                }
            }
            if value >= self.value[last] {
                for i in first_empty..MAX_CAL_POINTS {
                    self.value[i] = value;
                    self.adc_cnt[i] = adc;
                }
            } else {
                let mut locate = first_empty - 1;
                loop {
                    if locate == 0 || value > self.value[locate - 1] {
                        self.value[locate] = value;
                        self.adc_cnt[locate] = adc;
                        break;
                    }
                    self.value[locate] = self.value[locate - 1];
                    self.adc_cnt[locate] = self.adc_cnt[locate - 1];
                    locate -= 1;
                }
            }
        } else if value >= self.value[last] {
            self.value[last] = value;
            self.adc_cnt[last] = adc;
        } else {
            for i in 0..last {
                if value > self.value[i] && value < self.value[i + 1] {
                    if i == 0 {
                        self.value[1] = value;
                        self.adc_cnt[1] = adc;
                    } else if i == MAX_CAL_POINTS - 2 {
                        self.value[MAX_CAL_POINTS - 2] = value;
                        self.adc_cnt[MAX_CAL_POINTS - 2] = adc;
                    } else if (value - self.value[i]) < (self.value[i + 1] - value) {
                        self.value[i] = value;
                        self.adc_cnt[i] = adc;
                    } else {
                        self.value[i + 1] = value;
                        self.adc_cnt[i + 1] = adc;
                    }
                    break;
                }
            }
        }
    }

    /// `cal_save_exit`: promote to `Completed`.
    pub fn save_exit(&mut self) -> Result<(), CalError> {
        match self.status {
            CalStatus::Building { count } if count >= 1 => {
                self.status = CalStatus::Completed;
                Ok(())
            }
            CalStatus::Building { .. } => Err(CalError::FailedCal),
            _ => Err(CalError::WrongCalSequence),
        }
    }

    /// `adc_to_value`: piecewise-linear interpolation, extrapolating on the
    /// last real segment when `adc` is outside the table.
    pub fn adc_to_value(&self, adc: i32) -> f32 {
        let table = &self.adc_cnt;
        let values = &self.value;

        let mut i = 0usize;
        let mut offset_index;
        let mut got_slope = false;
        loop {
            if i >= MAX_CAL_POINTS || adc <= table[i] {
                break;
            }
            if i > 1 && table[i] == table[i - 1] {
                i -= 2;
                offset_index = i;
                got_slope = true;
                break;
            }
            i += 1;
        }

        if !got_slope {
            if i > MAX_CAL_POINTS - 1 {
                i -= 1;
                offset_index = i;
                i -= 1;
            } else if i > 0 {
                i -= 1;
                offset_index = i;
            } else {
                offset_index = i;
            }
        } else {
            offset_index = i;
        }

        let base_adc = table[offset_index];
        let rel_adc = adc - base_adc;
        let span_adc = table[i + 1] - table[i];
        let slope = if span_adc == 0 {
            1.0
        } else {
            (values[i + 1] - values[i]) / span_adc as f32
        };
        rel_adc as f32 * slope + values[offset_index]
    }

    /// Inverse of `adc_to_value` within the segment that brackets `value`;
    /// used only by the round-trip test law in spec.md 8.
    pub fn value_to_adc(&self, value: f32) -> i32 {
        let mut lo = 0usize;
        while lo + 1 < MAX_CAL_POINTS && self.value[lo + 1] <= value && self.adc_cnt[lo + 1] != self.adc_cnt[lo]
        {
            lo += 1;
        }
        let hi = (lo + 1).min(MAX_CAL_POINTS - 1);
        let span_adc = self.adc_cnt[hi] - self.adc_cnt[lo];
        let span_val = self.value[hi] - self.value[lo];
        if span_val.abs() < f32::EPSILON {
            return self.adc_cnt[lo];
        }
        let slope = span_adc as f32 / span_val;
        self.adc_cnt[lo] + ((value - self.value[lo]) * slope) as i32
    }

    /// ADC counts per countby unit, taken from the first real span of the
    /// table. Lets callers (the sample filter's step-threshold bypass) compare
    /// an ADC-domain delta against a quantity expressed in countby units
    /// without going through the full piecewise transfer function.
    pub fn adc_counts_per_countby(&self) -> f32 {
        let span_adc = (self.adc_cnt[1] - self.adc_cnt[0]) as f32;
        let span_val = self.value[1] - self.value[0];
        if span_val.abs() < f32::EPSILON {
            1.0
        } else {
            (span_adc / span_val) * self.countby.f_value
        }
    }

    /// Diagnostic Rcal string, variant A: the Rcal ADC reading mapped
    /// through this same calibration table.
    pub fn rcal_string_variant_a(&self, rcal_adc: i32) -> String {
        format!("{:.2}", self.adc_to_value(rcal_adc))
    }

    /// Diagnostic Rcal string, variant B: ADC counts at 10% of capacity,
    /// derived from the first two cal points.
    pub fn rcal_string_variant_b(&self) -> String {
        if self.adc_cnt[1] == self.adc_cnt[0] {
            return "n/a".to_string();
        }
        let span_adc = (self.adc_cnt[1] - self.adc_cnt[0]) as f32;
        let span_val = self.value[1] - self.value[0];
        let counts_at_10pct = if span_val.abs() < f32::EPSILON {
            0.0
        } else {
            span_adc * (0.1 * self.capacity) / span_val
        };
        format!("{:.0}", counts_at_10pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_0_100_200() -> SensorCal {
        let mut cal = SensorCal::new(WeightUnit::Lb);
        cal.adc_cnt = [0, 10_000, 20_000, 20_000, 20_000];
        cal.value = [0.0, 100.0, 200.0, 200.0, 200.0];
        cal.status = CalStatus::Completed;
        cal
    }

    #[test]
    fn interpolates_mid_segment() {
        let cal = table_0_100_200();
        assert!((cal.adc_to_value(15_000) - 150.0).abs() < 1e-3);
    }

    #[test]
    fn extrapolates_past_last_real_segment() {
        let cal = table_0_100_200();
        assert!((cal.adc_to_value(25_000) - 250.0).abs() < 1e-3);
    }

    #[test]
    fn build_table_rejects_wrong_sequence() {
        let mut cal = SensorCal::new(WeightUnit::Lb);
        assert_eq!(cal.build_table(1000, 50.0), Err(CalError::WrongCalSequence));
        // nothing mutated
        assert_eq!(cal.adc_cnt, [0; MAX_CAL_POINTS]);
    }

    #[test]
    fn build_table_rejects_test_load_over_capacity() {
        let mut cal = SensorCal::new(WeightUnit::Lb);
        cal.capacity = 100.0;
        cal.status = CalStatus::Building { count: 0 };
        assert_eq!(cal.build_table(5_000, 115.0), Err(CalError::TestLoadGtCapacity));
    }

    #[test]
    fn build_table_rejects_same_load_different_value() {
        let mut cal = SensorCal::new(WeightUnit::Lb);
        cal.capacity = 1000.0;
        cal.adc_cnt[0] = 0;
        cal.value[0] = 0.0;
        cal.status = CalStatus::Building { count: 0 };
        cal.build_table(10_000, 100.0).unwrap();
        let err = cal.build_table(10_200, 105.0).unwrap_err();
        assert_eq!(err, CalError::DifferentValueOnSameLoad);
    }

    #[test]
    fn build_table_rejects_shallow_slope() {
        let mut cal = SensorCal::new(WeightUnit::Lb);
        cal.capacity = 1_000_000.0;
        cal.countby = Countby::new_raw(1.0, WeightUnit::Lb);
        cal.status = CalStatus::Building { count: 0 };
        // zero point at adc 0
        cal.build_table(100_000, 1000.0).unwrap();
        // span of 1 adc count per unit value -> less than 4 counts/d
        let err = cal.build_table(100_003, 1001.0).unwrap_err();
        assert_eq!(err, CalError::LessThan4CntPerD);
    }

    #[test]
    fn save_exit_requires_at_least_one_span_point() {
        let mut cal = SensorCal::new(WeightUnit::Lb);
        cal.status = CalStatus::Building { count: 0 };
        assert_eq!(cal.save_exit(), Err(CalError::FailedCal));
        cal.status = CalStatus::Building { count: 1 };
        assert_eq!(cal.save_exit(), Ok(()));
        assert_eq!(cal.status, CalStatus::Completed);
    }
}
