//! Sensor identity and the raw ADC sample a [`crate::filter`] consumes.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Index into `Plant`'s per-sensor arrays. Sensors never hold pointers to
/// each other -- they hold a `SensorId` and look the peer up through the
/// owning `Plant`, the same index-not-pointer discipline the teacher's
/// `ArrayVec<Box<dyn Device>, MAX_SUBDEVICES>` bus enforces for its devices.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, schemars::JsonSchema,
)]
pub struct SensorId(pub u8);

/// Physical loadcell channels, zero-indexed: `lc0`/`lc1` each get three
/// calibration-table temperature zones, `lc2`/`lc3` one each. A math sensor's
/// formula may only reference one of these; it can never reference another
/// math sensor.
pub const MAX_LOADCELL: u8 = 4;

bitflags! {
    /// Per-sample status produced by the ADC layer, consumed by the filter
    /// stage. Mirrors the original firmware's `GOT_ADC_CNT` /
    /// `GOT_UNFILTER_ADC_CNT` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SampleStatus: u8 {
        /// A fresh filtered ADC count is available this tick.
        const GOT_ADC_CNT = 0b0000_0001;
        /// A fresh unfiltered (raw) ADC count is available this tick.
        const GOT_UNFILTERED_ADC_CNT = 0b0000_0010;
        /// The ADC hardware reported a fault (open input, over-range input).
        const ADC_FAULT = 0b0000_0100;
    }
}

/// One raw reading plus its status, as handed up from the ADC layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub cur_adc_count: i32,
    pub cur_raw_adc_count: i32,
    pub max_raw_adc_count: i32,
    pub status: SampleStatus,
}

bitflags! {
    /// Per-sensor feature flags (spec.md 3, `SensorFeature`), persisted
    /// alongside capacity/countby.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SensorFeature: u16 {
        const ENABLED = 0b0000_0000_0001;
        const HAS_RCAL = 0b0000_0000_0010;
        const HAS_TOTAL = 0b0000_0000_0100;
        const HAS_ZERO_ON_POWER_UP = 0b0000_0000_1000;
        const IS_VIRTUAL_MATH = 0b0000_0001_0000;
    }
}
