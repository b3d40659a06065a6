//! `Plant`: the top-level aggregate that owns every sensor, dispatches the
//! per-tick pipeline, and is the only thing in this crate that indexes by
//! [`SensorId`] instead of holding a reference.

use crate::adc::SampleSource;
use crate::loadcell::status::Status3;
use crate::loadcell::{Loadcell, Reading};
use crate::power::{PowerMonitor, PowerState};
use crate::sensor::SensorId;
use crate::setpoint::SensorValues;
use crate::units::WeightUnit;
use crate::vsensor::{self, Program, VSensorInput};

/// A virtual math sensor: no ADC input of its own, just a compiled formula
/// over other (physical) sensors' readings, expressed in its own unit.
pub struct VirtualSensor {
    pub id: SensorId,
    pub program: Program,
    pub unit: WeightUnit,
}

/// The one physical sensor sample a virtual sensor's formula, or a
/// cross-sensor setpoint, may look up.
#[derive(Debug, Clone, Copy)]
struct SensorSample {
    gross: f32,
    net: f32,
    unit: WeightUnit,
    status: crate::loadcell::status::Status,
}

#[derive(Default)]
pub struct Plant {
    sensors: Vec<Loadcell>,
    vsensors: Vec<VirtualSensor>,
    power: Option<PowerMonitor>,
    last_sample: std::collections::HashMap<SensorId, SensorSample>,
}

impl Plant {
    pub fn new() -> Self {
        Plant {
            sensors: Vec::new(),
            vsensors: Vec::new(),
            power: None,
            last_sample: std::collections::HashMap::new(),
        }
    }

    pub fn add_sensor(&mut self, sensor: Loadcell) {
        self.sensors.push(sensor);
    }

    pub fn add_virtual_sensor(&mut self, id: SensorId, formula: &str, unit: WeightUnit) -> Result<(), crate::error::CommandError> {
        let program = vsensor::compile(formula)?;
        self.vsensors.push(VirtualSensor { id, program, unit });
        Ok(())
    }

    pub fn set_power_monitor(&mut self, monitor: PowerMonitor) {
        self.power = Some(monitor);
    }

    pub fn sensor(&self, id: SensorId) -> Option<&Loadcell> {
        self.sensors.iter().find(|s| s.id == id)
    }

    pub fn sensor_mut(&mut self, id: SensorId) -> Option<&mut Loadcell> {
        self.sensors.iter_mut().find(|s| s.id == id)
    }

    /// Run one full pass: every physical sensor's pipeline, then every
    /// virtual sensor's evaluation against the freshly updated readings,
    /// then every sensor's setpoints (which may reference any other
    /// sensor's values), then the power monitor. `source` supplies this
    /// tick's raw samples.
    pub fn tick(&mut self, elapsed_ms: u32, source: &mut dyn SampleSource, supply_volts: Option<f32>) -> Vec<(SensorId, Reading)> {
        let mut results = Vec::with_capacity(self.sensors.len() + self.vsensors.len());
        let mut result_index = std::collections::HashMap::with_capacity(self.sensors.len());
        let mut sensor_values = std::collections::HashMap::with_capacity(self.sensors.len());

        for sensor in &mut self.sensors {
            let Some(sample) = source.sample(sensor.id) else {
                continue;
            };
            let reading = sensor.tick(elapsed_ms, sample);
            self.last_sample.insert(
                sensor.id,
                SensorSample {
                    gross: reading.gross,
                    net: reading.net,
                    unit: sensor.cal.countby.unit,
                    status: reading.status,
                },
            );
            sensor_values.insert(
                sensor.id,
                SensorValues {
                    gross: reading.gross,
                    net: reading.net,
                    total: sensor.total.accumulator,
                    total_count: sensor.total.count,
                    lift_count: sensor.counters.lift_count,
                },
            );
            result_index.insert(sensor.id, results.len());
            results.push((sensor.id, reading));
        }

        for vsensor in &self.vsensors {
            let last_sample = &self.last_sample;
            let evaluated = vsensor::evaluate(&vsensor.program, |id| {
                last_sample.get(&id).map(|s| VSensorInput {
                    value: s.gross,
                    unit_factor: s.unit.convert_capacity(vsensor.unit),
                    status: s.status,
                })
            });
            if let Some((value, status)) = evaluated {
                results.push((
                    vsensor.id,
                    Reading {
                        gross: value,
                        net: value,
                        displayed: value,
                        gross_unfiltered: value,
                        peak_hold: value,
                        new_peak: false,
                        status,
                        status2: crate::loadcell::status::Status2::empty(),
                        status3: Status3::empty(),
                    },
                ));
            }
        }

        for sensor in &mut self.sensors {
            let Some(&idx) = result_index.get(&sensor.id) else {
                continue;
            };
            let values = &sensor_values;
            let mask = sensor.setpoints.process_all(|id| values.get(&id).copied());
            results[idx].1.status3 = Status3::from_bits_truncate(mask);
        }

        if let (Some(monitor), Some(volts)) = (self.power.as_mut(), supply_volts) {
            monitor.tick(volts);
        }

        results
    }

    pub fn power_state(&self) -> Option<PowerState> {
        self.power.as_ref().map(|m| m.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adc::ScriptedSource;
    use crate::calibration::{CalStatus, SensorCal};
    use crate::standard::LegalForTradeMode;
    use crate::units::WeightUnit;

    fn cal(capacity: f32) -> SensorCal {
        let mut cal = SensorCal::new(WeightUnit::Lb);
        cal.capacity = capacity;
        cal.adc_cnt = [0, 10_000, 20_000, 20_000, 20_000];
        cal.value = [0.0, capacity / 2.0, capacity, capacity, capacity];
        cal.status = CalStatus::Completed;
        cal
    }

    #[test]
    fn virtual_sensor_sums_two_physical_sensors() {
        let mut plant = Plant::new();
        plant.add_sensor(Loadcell::new(SensorId(1), LegalForTradeMode::Industry, cal(1000.0)));
        plant.add_sensor(Loadcell::new(SensorId(2), LegalForTradeMode::Industry, cal(1000.0)));
        plant.add_virtual_sensor(SensorId(10), "1+2", WeightUnit::Lb).unwrap();

        let mut source = ScriptedSource::new()
            .with_script(SensorId(1), vec![10_000])
            .with_script(SensorId(2), vec![10_000]);

        let mut last = Vec::new();
        for _ in 0..6 {
            last = plant.tick(100, &mut source, None);
        }
        let vsensor_reading = last.iter().find(|(id, _)| *id == SensorId(10)).unwrap();
        assert!((vsensor_reading.1.gross - 1000.0).abs() < 1.0);
    }

    #[test]
    fn virtual_sensor_converts_each_input_into_its_own_unit() {
        let mut plant = Plant::new();
        plant.add_sensor(Loadcell::new(SensorId(1), LegalForTradeMode::Industry, cal(1000.0)));
        plant.add_virtual_sensor(SensorId(10), "1", WeightUnit::Kg).unwrap();

        let mut source = ScriptedSource::new().with_script(SensorId(1), vec![20_000]);
        let mut last = Vec::new();
        for _ in 0..6 {
            last = plant.tick(100, &mut source, None);
        }
        // Physical sensor 1 is calibrated in Lb and reads 1000 Lb; the
        // math sensor reports it in Kg.
        let vsensor_reading = last.iter().find(|(id, _)| *id == SensorId(10)).unwrap();
        let expected = 1000.0 * WeightUnit::Lb.convert_capacity(WeightUnit::Kg);
        assert!((vsensor_reading.1.gross - expected).abs() < 1.0);
    }

    #[test]
    fn missing_sample_skips_sensor_without_panic() {
        let mut plant = Plant::new();
        plant.add_sensor(Loadcell::new(SensorId(1), LegalForTradeMode::Industry, cal(1000.0)));
        let mut source = ScriptedSource::new();
        let readings = plant.tick(100, &mut source, None);
        assert!(readings.is_empty());
    }

    #[test]
    fn setpoint_evaluates_against_a_different_sensor() {
        let mut plant = Plant::new();
        let mut lc0 = Loadcell::new(SensorId(0), LegalForTradeMode::Industry, cal(1000.0));
        lc0.setpoints.points[0] = crate::setpoint::Setpoint {
            enabled: true,
            sensor_id: SensorId(1),
            source: crate::setpoint::SetpointSource::Gross,
            logic: crate::setpoint::Comparison::Greater,
            on_value: 500.0,
            off_value: 400.0,
        };
        plant.add_sensor(lc0);
        plant.add_sensor(Loadcell::new(SensorId(1), LegalForTradeMode::Industry, cal(1000.0)));

        let mut source = ScriptedSource::new()
            .with_script(SensorId(0), vec![0])
            .with_script(SensorId(1), vec![20_000]);

        let mut last = Vec::new();
        for _ in 0..6 {
            last = plant.tick(100, &mut source, None);
        }
        let reading0 = &last.iter().find(|(id, _)| *id == SensorId(0)).unwrap().1;
        assert!(reading0.status3.contains(Status3::SETPOINT_1));
    }
}
