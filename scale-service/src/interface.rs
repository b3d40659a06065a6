//! The `is.centroid.Scale` D-Bus surface: one method per command spec.md's
//! command-surface table names at design level, each translated to a
//! concrete `zbus::fdo::Error` on failure the way `OperationsClient` does in
//! the teacher's operations service.

use std::sync::Arc;

use parking_lot::RwLock;
use scale_core::sensor::SensorId;
use scale_core::units::WeightUnit;
use zbus::interface;

use crate::runtime::Runtime;

pub struct ScaleInterface {
    pub runtime: Arc<RwLock<Runtime>>,
}

fn to_fdo<E: std::fmt::Display>(err: E) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(err.to_string())
}

#[interface(name = "is.centroid.Scale")]
impl ScaleInterface {
    /// Capture the current gross reading as the new zero reference.
    async fn zero(&self, sensor: u8) -> zbus::fdo::Result<()> {
        self.runtime.write().zero_by_command(SensorId(sensor)).map_err(to_fdo)
    }

    /// Undo the last zero capture.
    async fn zero_undo(&self, sensor: u8) -> zbus::fdo::Result<()> {
        self.runtime.write().zero_undo(SensorId(sensor)).map_err(to_fdo)
    }

    /// Begin a push-button tare capture (commits once the reading settles).
    async fn tare_gross(&self, sensor: u8) -> zbus::fdo::Result<()> {
        self.runtime.write().tare_gross_begin(SensorId(sensor)).map_err(to_fdo)
    }

    /// Key in a known tare weight directly.
    async fn tare_set(&self, sensor: u8, value: f64) -> zbus::fdo::Result<()> {
        self.runtime.write().tare_set(SensorId(sensor), value as f32).map_err(to_fdo)
    }

    async fn toggle_net_gross(&self, sensor: u8) -> zbus::fdo::Result<()> {
        self.runtime.write().toggle_net_gross(SensorId(sensor)).map_err(to_fdo)
    }

    /// Switch the sensor's display unit, refused if the legal-for-trade mode
    /// forbids unit changes.
    async fn change_unit(&self, sensor: u8, unit: u8) -> zbus::fdo::Result<()> {
        let unit = decode_unit(unit)?;
        self.runtime.write().change_unit(SensorId(sensor), unit).map_err(to_fdo)
    }

    async fn total_clear(&self, sensor: u8) -> zbus::fdo::Result<()> {
        self.runtime.write().total_clear(SensorId(sensor)).map_err(to_fdo)
    }

    async fn total_remove_last(&self, sensor: u8, value: f64) -> zbus::fdo::Result<()> {
        self.runtime
            .write()
            .total_remove_last(SensorId(sensor), value as f32)
            .map_err(to_fdo)
    }

    async fn total_command_total(&self, sensor: u8, value: f64) -> zbus::fdo::Result<()> {
        self.runtime
            .write()
            .total_command(SensorId(sensor), value as f32)
            .map_err(to_fdo)
    }

    /// Start a fresh calibration for `sensor` at the given unit and
    /// capacity.
    async fn cal_new(&self, sensor: u8, unit: u8, capacity: f64) -> zbus::fdo::Result<()> {
        let unit = decode_unit(unit)?;
        self.runtime
            .write()
            .cal_new(SensorId(sensor), unit, capacity as f32)
            .map_err(to_fdo)
    }

    async fn cal_countby(&self, sensor: u8, countby: f64) -> zbus::fdo::Result<()> {
        self.runtime
            .write()
            .cal_countby(SensorId(sensor), countby as f32)
            .map_err(to_fdo)
    }

    async fn cal_zero_point(&self, sensor: u8) -> zbus::fdo::Result<()> {
        self.runtime.write().cal_zero_point(SensorId(sensor)).map_err(to_fdo)
    }

    async fn cal_add_point(&self, sensor: u8, test_load: f64) -> zbus::fdo::Result<()> {
        self.runtime
            .write()
            .cal_add_point(SensorId(sensor), test_load as f32)
            .map_err(to_fdo)
    }

    async fn cal_save_exit(&self, sensor: u8) -> zbus::fdo::Result<()> {
        self.runtime.write().cal_save_exit(SensorId(sensor)).map_err(to_fdo)
    }
}

fn decode_unit(code: u8) -> zbus::fdo::Result<WeightUnit> {
    match code {
        0 => Ok(WeightUnit::Lb),
        1 => Ok(WeightUnit::Kg),
        2 => Ok(WeightUnit::Ton),
        3 => Ok(WeightUnit::MTon),
        4 => Ok(WeightUnit::Oz),
        5 => Ok(WeightUnit::G),
        6 => Ok(WeightUnit::KiloNewton),
        other => Err(zbus::fdo::Error::Failed(format!("unknown unit code {other}"))),
    }
}
