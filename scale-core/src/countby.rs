//! Countby: the smallest displayable weight increment, always of the form
//! `{1,2,5}*10^k`.

use crate::units::WeightUnit;
use serde::{Deserialize, Serialize};

/// A normalized countby: `iValue in {1,2,5}`, `fValue = iValue * 10^(-decPt)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Countby {
    pub i_value: u16,
    pub dec_pt: i8,
    pub f_value: f32,
    pub unit: WeightUnit,
}

impl Countby {
    pub fn new_raw(f_value: f32, unit: WeightUnit) -> Self {
        let mut cb = Countby {
            i_value: 0,
            dec_pt: 0,
            f_value,
            unit,
        };
        cb.normalize_input();
        cb
    }

    /// `cal_normalize_countby`: normalizes `i_value`/`dec_pt` in place assuming
    /// `f_value` already holds the scaled-up integer-ish countby candidate.
    fn normalize_countby(&mut self) {
        let mut guard = 0;
        while self.i_value == 0 {
            self.f_value *= 10.0;
            self.i_value = self.f_value as u16;
            self.dec_pt += 1;
            guard += 1;
            if guard > 20 {
                break;
            }
        }
        while self.i_value >= 10 {
            self.f_value /= 10.0;
            self.i_value /= 10;
            self.dec_pt -= 1;
        }
        if self.f_value > 5.0 {
            self.i_value = 1;
            self.dec_pt -= 1;
        } else if self.f_value > 2.0 {
            self.i_value = 5;
        } else if self.f_value > 1.0 {
            self.i_value = 2;
        } else {
            self.i_value = 1;
        }
    }

    /// `cal_scale_float_type_countby`: rescale `f_value` back to its real
    /// magnitude given `dec_pt` moves of the decimal point.
    fn scale_float_type(&mut self) {
        let mut d = self.dec_pt;
        while d > 0 {
            self.f_value /= 10.0;
            d -= 1;
        }
        while d < 0 {
            self.f_value *= 10.0;
            d += 1;
        }
    }

    /// `cal_normalize_input_countby`: the user-facing entry point. Takes
    /// whatever is currently in `f_value`, ignores any stale `i_value`/`dec_pt`,
    /// and produces the canonical `{1,2,5}*10^k` triple.
    pub fn normalize_input(&mut self) {
        self.i_value = self.f_value as u16;
        self.dec_pt = 0;
        self.normalize_countby();
        self.f_value = self.i_value as f32;
        self.scale_float_type();
    }

    /// Round a value to this countby's resolution (nearest multiple of
    /// `f_value`, half away from zero as the firmware's `float_round`).
    pub fn round(&self, value: f32) -> f32 {
        if self.f_value == 0.0 {
            return value;
        }
        let steps = value / self.f_value;
        let rounded = if steps >= 0.0 {
            (steps + 0.5).floor()
        } else {
            (steps - 0.5).ceil()
        };
        rounded * self.f_value
    }

    /// Rescale this countby into another weight unit using the display
    /// (capacity) conversion table, then re-normalize to `{1,2,5}*10^k`.
    pub fn convert_capacity(&self, to: WeightUnit) -> Countby {
        let factor = self.unit.convert_capacity(to);
        Countby::new_raw(self.f_value * factor, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_0_037_to_5en2() {
        let cb = Countby::new_raw(0.037, WeightUnit::Lb);
        assert_eq!(cb.i_value, 5);
        assert_eq!(cb.dec_pt, 2);
        assert!((cb.f_value - 0.05).abs() < 1e-6);
    }

    #[test]
    fn normalize_round_trip_is_idempotent() {
        let cb = Countby::new_raw(0.037, WeightUnit::Lb);
        let scaled = Countby::new_raw(cb.f_value, WeightUnit::Lb);
        let again = Countby::new_raw(scaled.f_value, WeightUnit::Lb);
        assert_eq!(again.i_value, scaled.i_value);
        assert_eq!(again.dec_pt, scaled.dec_pt);
        assert!((again.f_value - scaled.f_value).abs() < 1e-9);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        let cb = Countby::new_raw(1.0, WeightUnit::Lb);
        assert_eq!(cb.round(2.5), 3.0);
        assert_eq!(cb.round(-2.5), -3.0);
        assert_eq!(cb.round(2.4), 2.0);
    }
}
