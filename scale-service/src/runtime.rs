//! Glues `scale-core`'s `Plant` to the D-Bus command surface: translates
//! each `is.centroid.Scale` method into the matching `scale-core` call,
//! tracking the last raw ADC counts per sensor so zero/tare captures have
//! something to act on between ticks.

use std::collections::HashMap;

use scale_core::calibration::SensorCal;
use scale_core::error::{CommandError, ScaleError};
use scale_core::loadcell::{Loadcell, Reading};
use scale_core::sensor::SensorId;
use scale_core::units::WeightUnit;
use scale_core::Plant;

pub struct Runtime {
    pub plant: Plant,
    last_adc: HashMap<SensorId, i32>,
    last_reading: HashMap<SensorId, Reading>,
}

impl Runtime {
    pub fn new(plant: Plant) -> Self {
        Runtime {
            plant,
            last_adc: HashMap::new(),
            last_reading: HashMap::new(),
        }
    }

    pub fn note_tick(&mut self, id: SensorId, adc: i32, reading: Reading) {
        self.last_adc.insert(id, adc);
        self.last_reading.insert(id, reading);
    }

    fn sensor_mut(&mut self, id: SensorId) -> Result<&mut Loadcell, ScaleError> {
        self.plant
            .sensor_mut(id)
            .ok_or(ScaleError::Command(CommandError::InvalidSensorNumber))
    }

    pub fn zero_by_command(&mut self, id: SensorId) -> Result<(), ScaleError> {
        let adc = *self.last_adc.get(&id).unwrap_or(&0);
        let reading = self.last_reading.get(&id).copied();
        let sensor = self.sensor_mut(id)?;
        let gross = reading.map(|r| r.gross).unwrap_or(0.0);
        let params = sensor.legal_mode.params();
        let in_motion = reading.map(|r| r.status.contains(scale_core::loadcell::status::Status::IN_MOTION)).unwrap_or(true);
        let required_ms = sensor.required_settle_ms();
        sensor
            .zero
            .zero_by_command(adc, gross, sensor.cal.capacity, sensor.cal.countby.f_value, &params, in_motion, required_ms)
            .map_err(ScaleError::from)
    }

    pub fn zero_undo(&mut self, id: SensorId) -> Result<(), ScaleError> {
        self.sensor_mut(id)?.zero.undo().map_err(ScaleError::from)
    }

    pub fn tare_gross_begin(&mut self, id: SensorId) -> Result<(), ScaleError> {
        let sensor = self.sensor_mut(id)?;
        let settle = sensor.required_settle_ms();
        sensor.tare.tare_gross_begin(settle);
        Ok(())
    }

    pub fn tare_set(&mut self, id: SensorId, value: f32) -> Result<(), ScaleError> {
        self.sensor_mut(id)?.tare.tare_set(value);
        Ok(())
    }

    pub fn toggle_net_gross(&mut self, id: SensorId) -> Result<(), ScaleError> {
        self.sensor_mut(id)?.tare.toggle_net_gross();
        Ok(())
    }

    pub fn change_unit(&mut self, id: SensorId, unit: WeightUnit) -> Result<(), ScaleError> {
        let sensor = self.sensor_mut(id)?;
        if !sensor.legal_mode.allows_unit_change() {
            return Err(ScaleError::Command(CommandError::FeatureNotSupport));
        }
        sensor.cal.capacity = sensor.cal.capacity * sensor.cal.countby.unit.convert_capacity(unit);
        sensor.cal.countby = sensor.cal.countby.convert_capacity(unit);
        Ok(())
    }

    pub fn total_clear(&mut self, id: SensorId) -> Result<(), ScaleError> {
        self.sensor_mut(id)?.total.clear();
        Ok(())
    }

    pub fn total_remove_last(&mut self, id: SensorId, value: f32) -> Result<(), ScaleError> {
        self.sensor_mut(id)?.total.remove_last(value);
        Ok(())
    }

    pub fn total_command(&mut self, id: SensorId, value: f32) -> Result<(), ScaleError> {
        let sensor = self.sensor_mut(id)?;
        sensor.total.tick(0, 0.0, sensor.cal.countby.f_value, 0.0, false, false, Some(value));
        Ok(())
    }

    pub fn cal_new(&mut self, id: SensorId, unit: WeightUnit, capacity: f32) -> Result<(), ScaleError> {
        self.sensor_mut(id)?.cal.new_cal(unit, capacity).map_err(ScaleError::from)
    }

    pub fn cal_countby(&mut self, id: SensorId, countby: f32) -> Result<(), ScaleError> {
        self.sensor_mut(id)?
            .cal
            .normalize_countby(countby)
            .map_err(ScaleError::from)
    }

    pub fn cal_zero_point(&mut self, id: SensorId) -> Result<(), ScaleError> {
        let adc = *self.last_adc.get(&id).unwrap_or(&0);
        self.sensor_mut(id)?.cal.zero_point(adc).map_err(ScaleError::from)
    }

    pub fn cal_add_point(&mut self, id: SensorId, test_load: f32) -> Result<(), ScaleError> {
        let adc = *self.last_adc.get(&id).unwrap_or(&0);
        self.sensor_mut(id)?
            .cal
            .build_table(adc, test_load)
            .map_err(ScaleError::from)
    }

    pub fn cal_save_exit(&mut self, id: SensorId) -> Result<(), ScaleError> {
        self.sensor_mut(id)?.cal.save_exit().map_err(ScaleError::from)
    }
}

/// Build the default single-sensor `Plant` described by a [`crate::config::ScaleConfig`].
pub fn plant_from_config(config: &crate::config::ScaleConfig) -> Plant {
    let mut plant = Plant::new();
    for sensor_cfg in &config.sensors {
        if !sensor_cfg.math_formula.is_empty() {
            let _ = plant.add_virtual_sensor(SensorId(sensor_cfg.id), &sensor_cfg.math_formula, sensor_cfg.unit);
            continue;
        }
        let mut cal = SensorCal::new(sensor_cfg.unit);
        cal.capacity = sensor_cfg.capacity;
        cal.countby = scale_core::countby::Countby::new_raw(sensor_cfg.countby, sensor_cfg.unit);
        let mut sensor = Loadcell::new(SensorId(sensor_cfg.id), sensor_cfg.legal_mode, cal);
        sensor.feature = sensor_cfg.feature();
        sensor.filter.reconfigure(sensor_cfg.filter);
        sensor.overload_params = sensor_cfg.overload;
        sensor.total = scale_core::loadcell::total::TotalState::new(sensor_cfg.total_mode);
        plant.add_sensor(sensor);
    }
    plant
}
