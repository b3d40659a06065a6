//! Measurement core for an industrial scale: ADC sample filtering,
//! piecewise-linear calibration, unit conversion, zero/tare, motion
//! detection, overload/underload checks, rounding, totaling, setpoints and
//! a virtual math sensor.
//!
//! This crate is synchronous and allocation-light by design: every public
//! function returns within one call, there are no suspension points, and it
//! knows nothing about D-Bus, tokio or EtherCAT. A host process (see the
//! sibling `scale-service` crate) owns the runtime, persistence backend and
//! wire protocol around it.

pub mod adc;
pub mod calibration;
pub mod countby;
pub mod error;
pub mod filter;
pub mod loadcell;
pub mod persistence;
pub mod plant;
pub mod power;
pub mod sensor;
pub mod setpoint;
pub mod standard;
pub mod units;
pub mod vsensor;

pub use plant::Plant;
pub use sensor::SensorId;
