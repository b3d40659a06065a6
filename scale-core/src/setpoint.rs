//! Eight-setpoint evaluator with hysteresis, driving the `status3` bits.
//!
//! A setpoint can reference any sensor in the plant, not just the one it's
//! attached to -- so evaluation happens at [`crate::plant::Plant`] level,
//! where every sensor's latest values are available, rather than inside a
//! single [`crate::loadcell::Loadcell::tick`].

use serde::{Deserialize, Serialize};

use crate::sensor::SensorId;

pub const NUM_SETPOINTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum SetpointSource {
    Gross,
    Net,
    Total,
    /// Count of weighments accumulated into the referenced sensor's total.
    TotalCount,
    /// Lifetime lift count (service counter) of the referenced sensor.
    LiftCount,
}

/// Which direction crossing the threshold engages the setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum Comparison {
    /// Engages when the source value rises above the threshold (the
    /// "fill to X" case).
    Greater,
    /// Engages when the source value falls below the threshold (the
    /// "alarm if under X" case).
    Less,
}

/// One sensor's values, as read by a setpoint evaluating against it -- the
/// lookup a setpoint's `sensor_id` resolves to each tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorValues {
    pub gross: f32,
    pub net: f32,
    pub total: f64,
    pub total_count: u32,
    pub lift_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Setpoint {
    pub enabled: bool,
    /// Sensor this setpoint reads from -- need not be the sensor it is
    /// stored on.
    pub sensor_id: SensorId,
    pub source: SetpointSource,
    pub logic: Comparison,
    /// Engages when the source value crosses this threshold (direction per
    /// `logic`).
    pub on_value: f32,
    /// Disengages when the source value recrosses this threshold; for a
    /// `Greater` setpoint this must be `<= on_value`, for a `Less` setpoint
    /// `>= on_value`, to avoid chattering at the boundary.
    pub off_value: f32,
}

impl Default for Setpoint {
    fn default() -> Self {
        Setpoint {
            enabled: false,
            sensor_id: SensorId(0),
            source: SetpointSource::Gross,
            logic: Comparison::Greater,
            on_value: 0.0,
            off_value: 0.0,
        }
    }
}

impl Setpoint {
    fn source_value(&self, values: SensorValues) -> f32 {
        match self.source {
            SetpointSource::Gross => values.gross,
            SetpointSource::Net => values.net,
            SetpointSource::Total => values.total as f32,
            SetpointSource::TotalCount => values.total_count as f32,
            SetpointSource::LiftCount => values.lift_count as f32,
        }
    }

    /// Evaluate with hysteresis: `was_active` is the previous tick's state.
    pub fn evaluate(&self, values: SensorValues, was_active: bool) -> bool {
        if !self.enabled {
            return false;
        }
        let value = self.source_value(values);
        let threshold = if was_active { self.off_value } else { self.on_value };
        match self.logic {
            Comparison::Greater => value > threshold,
            Comparison::Less => value < threshold,
        }
    }
}

/// All eight setpoints for one sensor, plus their latched state so
/// `process_all` can apply hysteresis correctly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointBank {
    pub points: [Setpoint; NUM_SETPOINTS],
    active: [bool; NUM_SETPOINTS],
}

impl SetpointBank {
    pub fn new() -> Self {
        SetpointBank {
            points: [Setpoint::default(); NUM_SETPOINTS],
            active: [false; NUM_SETPOINTS],
        }
    }

    /// Evaluate every setpoint against its own `sensor_id`'s values, resolved
    /// through `lookup`, and return the resulting bitmask (bit 0 = setpoint
    /// 1). A sensor that `lookup` can't resolve evaluates against all-zero
    /// values rather than panicking.
    pub fn process_all(&mut self, mut lookup: impl FnMut(SensorId) -> Option<SensorValues>) -> u8 {
        let mut mask = 0u8;
        for i in 0..NUM_SETPOINTS {
            let values = lookup(self.points[i].sensor_id).unwrap_or_default();
            let active = self.points[i].evaluate(values, self.active[i]);
            self.active[i] = active;
            if active {
                mask |= 1 << i;
            }
        }
        mask
    }
}

impl Default for SetpointBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(gross: f32) -> SensorValues {
        SensorValues {
            gross,
            ..Default::default()
        }
    }

    #[test]
    fn hysteresis_prevents_chatter_at_boundary() {
        let mut bank = SetpointBank::new();
        bank.points[0] = Setpoint {
            enabled: true,
            sensor_id: SensorId(0),
            source: SetpointSource::Gross,
            logic: Comparison::Greater,
            on_value: 100.0,
            off_value: 90.0,
        };
        assert_eq!(bank.process_all(|_| Some(values(95.0))), 0);
        assert_eq!(bank.process_all(|_| Some(values(101.0))), 1);
        // drifts down, but stays above off_value -> stays active
        assert_eq!(bank.process_all(|_| Some(values(95.0))), 1);
        assert_eq!(bank.process_all(|_| Some(values(89.0))), 0);
    }

    #[test]
    fn less_than_logic_engages_below_threshold() {
        let mut bank = SetpointBank::new();
        bank.points[0] = Setpoint {
            enabled: true,
            sensor_id: SensorId(0),
            source: SetpointSource::Gross,
            logic: Comparison::Less,
            on_value: 10.0,
            off_value: 15.0,
        };
        assert_eq!(bank.process_all(|_| Some(values(20.0))), 0);
        assert_eq!(bank.process_all(|_| Some(values(5.0))), 1);
        // rises but stays under off_value -> stays active
        assert_eq!(bank.process_all(|_| Some(values(12.0))), 1);
        assert_eq!(bank.process_all(|_| Some(values(16.0))), 0);
    }

    #[test]
    fn disabled_setpoint_never_engages() {
        let mut bank = SetpointBank::new();
        bank.points[0] = Setpoint {
            enabled: false,
            sensor_id: SensorId(0),
            source: SetpointSource::Gross,
            logic: Comparison::Greater,
            on_value: 1.0,
            off_value: 0.0,
        };
        assert_eq!(bank.process_all(|_| Some(values(1000.0))), 0);
    }

    #[test]
    fn setpoint_can_reference_a_different_sensor() {
        let mut bank = SetpointBank::new();
        bank.points[0] = Setpoint {
            enabled: true,
            sensor_id: SensorId(3),
            source: SetpointSource::Gross,
            logic: Comparison::Greater,
            on_value: 50.0,
            off_value: 40.0,
        };
        let mask = bank.process_all(|id| if id == SensorId(3) { Some(values(60.0)) } else { Some(values(0.0)) });
        assert_eq!(mask, 1);
    }

    #[test]
    fn total_count_and_lift_count_sources() {
        let mut bank = SetpointBank::new();
        bank.points[0] = Setpoint {
            enabled: true,
            sensor_id: SensorId(0),
            source: SetpointSource::TotalCount,
            logic: Comparison::Greater,
            on_value: 2.0,
            off_value: 2.0,
        };
        bank.points[1] = Setpoint {
            enabled: true,
            sensor_id: SensorId(0),
            source: SetpointSource::LiftCount,
            logic: Comparison::Greater,
            on_value: 5.0,
            off_value: 5.0,
        };
        let sample = SensorValues {
            total_count: 3,
            lift_count: 1,
            ..Default::default()
        };
        let mask = bank.process_all(|_| Some(sample));
        assert_eq!(mask, 0b01);
    }

    #[test]
    fn unresolved_sensor_evaluates_against_zero() {
        let mut bank = SetpointBank::new();
        bank.points[0] = Setpoint {
            enabled: true,
            sensor_id: SensorId(9),
            source: SetpointSource::Gross,
            logic: Comparison::Greater,
            on_value: 1.0,
            off_value: 0.0,
        };
        assert_eq!(bank.process_all(|_| None), 0);
    }

    #[test]
    fn unit_change_is_just_a_threshold_rescale_by_the_caller() {
        // The bank itself is unit-agnostic: converting thresholds to a new
        // unit is the caller's job (scale by WeightUnit::convert_capacity)
        // before storing them back into `Setpoint::on_value`/`off_value`.
        let mut sp = Setpoint {
            enabled: true,
            sensor_id: SensorId(0),
            source: SetpointSource::Gross,
            logic: Comparison::Greater,
            on_value: 10.0,
            off_value: 9.0,
        };
        let factor = crate::units::WeightUnit::Lb.convert_capacity(crate::units::WeightUnit::Kg);
        sp.on_value *= factor;
        sp.off_value *= factor;
        assert_eq!(sp.on_value, 5.0);
    }
}
