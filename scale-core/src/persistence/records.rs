//! Persisted record layouts. Each record pairs its payload with a CRC
//! computed over that payload, matching the original firmware's
//! encode-then-one-write discipline: nothing is written until the whole
//! record (payload + CRC) is ready in a buffer.

use super::crc::{crc16_xmodem, crc8_dallas_ff};
use crate::countby::Countby;
use crate::setpoint::Setpoint;
use crate::standard::LegalForTradeMode;
use serde::{Deserialize, Serialize};

/// A sensor's calibration table: capacity, countby, calibration progress,
/// the temperature it was built at, and the up-to-5-point ADC/value table,
/// CRC16-protected (the widest record in the table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CalTableRecord {
    pub capacity: f32,
    pub countby: Countby,
    pub status: u8,
    pub temperature: f32,
    pub adc_cnt: [i32; crate::calibration::MAX_CAL_POINTS],
    pub value: [f32; crate::calibration::MAX_CAL_POINTS],
}

impl CalTableRecord {
    fn payload_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&self.capacity.to_le_bytes());
        buf.extend_from_slice(&self.countby.f_value.to_le_bytes());
        buf.push(self.status);
        buf.extend_from_slice(&self.temperature.to_le_bytes());
        for v in self.adc_cnt {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        for v in self.value {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    pub fn crc(&self) -> u16 {
        crc16_xmodem(&self.payload_bytes())
    }
}

/// Per-sensor feature flags (spec.md 3), persisted alongside capacity and
/// countby since a re-cal doesn't imply re-enabling RCAL/totaling/etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SensorFeatureRecord {
    pub feature: u16,
}

impl SensorFeatureRecord {
    pub fn crc(&self) -> u8 {
        crc8_dallas_ff(&self.feature.to_le_bytes())
    }
}

/// Persisted totaling-engine mode and the lift threshold it gates
/// acceptance on, one byte plus a float -- small enough for the 8-bit CRC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LcTotalMotionOpModeRecord {
    pub total_mode: u8,
    pub min_stable_ms: u32,
}

impl LcTotalMotionOpModeRecord {
    pub fn crc(&self) -> u8 {
        let mut buf = [0u8; 5];
        buf[0] = self.total_mode;
        buf[1..].copy_from_slice(&self.min_stable_ms.to_le_bytes());
        crc8_dallas_ff(&buf)
    }
}

/// Whether Automatic Zero Maintenance is enabled for a sensor -- persisted
/// separately from `ScaleStandardModeRecord` since AZM can be toggled
/// without changing the legal-for-trade mode itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LcStandardModeAzmRecord {
    pub azm_enabled: bool,
}

impl LcStandardModeAzmRecord {
    pub fn crc(&self) -> u8 {
        crc8_dallas_ff(&[self.azm_enabled as u8])
    }
}

/// Per-sensor mode byte: which legal-for-trade rules it runs under.
/// Small enough to ride on the 8-bit Dallas CRC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ScaleStandardModeRecord {
    pub mode: LegalForTradeMode,
}

impl ScaleStandardModeRecord {
    pub fn crc(&self) -> u8 {
        crc8_dallas_ff(&[self.mode.as_u8()])
    }
}

/// Listener / broadcast routing: which serial or RF listener index each
/// sensor's unsolicited report goes to, one byte per listener slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListenerSettings {
    pub routes: Vec<u8>,
}

impl ListenerSettings {
    pub fn crc(&self) -> u8 {
        crc8_dallas_ff(&self.routes)
    }
}

/// Persisted service counters for one sensor: lifetime lift count, the
/// service-acknowledgeable lift count, overload count, and the hysteresis
/// arming state each needs to survive a restart without double-counting
/// the event that was in progress at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ServiceCounterRecord {
    pub user_lift_count: u32,
    pub lift_count: u32,
    pub overload_count: u32,
    pub armed_for_lift: bool,
    pub armed_for_overload: bool,
    pub ack_needed: bool,
}

impl ServiceCounterRecord {
    pub fn crc(&self) -> u8 {
        let mut buf = [0u8; 15];
        buf[..4].copy_from_slice(&self.user_lift_count.to_le_bytes());
        buf[4..8].copy_from_slice(&self.lift_count.to_le_bytes());
        buf[8..12].copy_from_slice(&self.overload_count.to_le_bytes());
        buf[12] = self.armed_for_lift as u8;
        buf[13] = self.armed_for_overload as u8;
        buf[14] = self.ack_needed as u8;
        crc8_dallas_ff(&buf)
    }
}

/// All eight setpoints for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SetpointBlockRecord {
    pub points: [Setpoint; crate::setpoint::NUM_SETPOINTS],
}
