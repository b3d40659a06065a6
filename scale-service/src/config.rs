//! Persisted configuration, mirrored from the NV-memory scalars the
//! original firmware kept per sensor: capacity, countby, legal-for-trade
//! mode, filter tuning, and the zero/tare/overload/totaling parameters
//! `scale-core` itself stays agnostic of.

use scale_core::filter::FilterConfig;
use scale_core::loadcell::overload::OverloadParams;
use scale_core::loadcell::total::TotalMode;
use scale_core::sensor::SensorFeature;
use scale_core::standard::LegalForTradeMode;
use scale_core::units::WeightUnit;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SensorConfig {
    #[schemars(description = "Sensor index, matches the physical or virtual channel number")]
    pub id: u8,
    #[schemars(description = "Full-scale capacity in `unit`")]
    pub capacity: f32,
    #[schemars(description = "Smallest displayable increment, normalized to {1,2,5}*10^k")]
    pub countby: f32,
    pub unit: WeightUnit,
    pub legal_mode: LegalForTradeMode,
    #[schemars(description = "Formula for a virtual math sensor, e.g. \"1+2-3\"; empty for a physical sensor")]
    pub math_formula: String,
    pub filter: FilterConfig,
    pub overload: OverloadParams,
    pub total_mode: TotalMode,
    #[schemars(description = "Bitflags: enabled, has-rcal, has-total, zero-on-power-up, is-virtual-math")]
    pub feature_bits: u16,
}

impl SensorConfig {
    pub fn feature(&self) -> SensorFeature {
        SensorFeature::from_bits_truncate(self.feature_bits)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScaleConfig {
    #[schemars(description = "Main tick interval, milliseconds")]
    pub tick_interval_ms: u32,
    #[schemars(description = "Under-voltage warning threshold, volts")]
    pub power_warning_volts: f32,
    #[schemars(description = "Under-voltage shutdown threshold, volts")]
    pub power_shutdown_volts: f32,
    pub sensors: Vec<SensorConfig>,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        ScaleConfig {
            tick_interval_ms: 100,
            power_warning_volts: 11.0,
            power_shutdown_volts: 10.0,
            sensors: vec![SensorConfig {
                id: 1,
                capacity: 1000.0,
                countby: 0.5,
                unit: WeightUnit::Lb,
                legal_mode: LegalForTradeMode::Industry,
                math_formula: String::new(),
                filter: FilterConfig::default(),
                overload: OverloadParams::default(),
                total_mode: TotalMode::Disabled,
                feature_bits: SensorFeature::ENABLED.bits(),
            }],
        }
    }
}
