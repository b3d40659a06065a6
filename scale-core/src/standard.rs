//! Legal-for-trade mode and the per-mode zero/motion parameter sets that the
//! zero, AZM and motion-detection logic read from.

use serde::{Deserialize, Serialize};

/// Which weights-and-measures rule set a sensor operates under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum LegalForTradeMode {
    /// No legal-for-trade restrictions; the widest bands, manual zero only.
    Industry,
    /// US NTEP (Handbook 44).
    Ntep,
    /// European OIML R76.
    Oiml,
    /// Single-unit, legal-for-trade, no unit switching permitted.
    OneUnit,
}

/// Zero/AZM/motion parameters for one legal-for-trade mode, expressed in
/// countby units ("d") so they scale with whatever countby a sensor has.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ScaleStandardParams {
    /// Automatic Zero Maintenance sampling interval, milliseconds.
    pub azm_interval_ms: u32,
    /// AZM only acts within this many countby units of true zero.
    pub azm_band_d: f32,
    /// Zero-by-command is refused outside +/- this band (as a fraction of
    /// capacity; e.g. 0.02 = 2%).
    pub zero_band_fraction: f32,
    /// Power-up zero capture is refused outside this +/- band.
    pub power_up_zero_band_hi_fraction: f32,
    pub power_up_zero_band_lo_fraction: f32,
    /// Motion must clear (weight held within `motion_window_d`) for this
    /// long before a reading is considered stable, milliseconds.
    pub motion_no_motion_ms: u32,
    /// Band, in countby units, a held weight must stay inside to count as
    /// "no motion".
    pub motion_window_d: f32,
}

impl LegalForTradeMode {
    /// Stable byte encoding for persistence (not a `repr` cast, so the enum
    /// is free to be reordered without quietly changing saved records).
    pub fn as_u8(self) -> u8 {
        match self {
            LegalForTradeMode::Industry => 0,
            LegalForTradeMode::Ntep => 1,
            LegalForTradeMode::Oiml => 2,
            LegalForTradeMode::OneUnit => 3,
        }
    }

    pub fn params(self) -> ScaleStandardParams {
        match self {
            LegalForTradeMode::Industry => ScaleStandardParams {
                azm_interval_ms: 500,
                azm_band_d: 4.0,
                zero_band_fraction: 0.10,
                power_up_zero_band_hi_fraction: 0.10,
                power_up_zero_band_lo_fraction: 0.10,
                motion_no_motion_ms: 500,
                motion_window_d: 1.0,
            },
            LegalForTradeMode::Ntep => ScaleStandardParams {
                azm_interval_ms: 500,
                azm_band_d: 0.5,
                zero_band_fraction: 0.02,
                power_up_zero_band_hi_fraction: 0.02,
                power_up_zero_band_lo_fraction: 0.02,
                motion_no_motion_ms: 1000,
                motion_window_d: 1.0,
            },
            LegalForTradeMode::Oiml => ScaleStandardParams {
                azm_interval_ms: 500,
                azm_band_d: 0.25,
                zero_band_fraction: 0.02,
                power_up_zero_band_hi_fraction: 0.20,
                power_up_zero_band_lo_fraction: 0.20,
                motion_no_motion_ms: 1000,
                motion_window_d: 1.0,
            },
            LegalForTradeMode::OneUnit => ScaleStandardParams {
                azm_interval_ms: 500,
                azm_band_d: 0.5,
                zero_band_fraction: 0.02,
                power_up_zero_band_hi_fraction: 0.02,
                power_up_zero_band_lo_fraction: 0.02,
                motion_no_motion_ms: 1000,
                motion_window_d: 1.0,
            },
        }
    }

    /// Whether the unit may be changed while weighing. Only legal-for-trade
    /// `OneUnit` forbids it outright; the others allow it (spec.md 4 design
    /// notes on unit conversion being always available to Industry/NTEP/OIML
    /// multi-unit sensors).
    pub fn allows_unit_change(self) -> bool {
        !matches!(self, LegalForTradeMode::OneUnit)
    }

    /// Whether automatic (non-command) zero capture is permitted at all.
    pub fn allows_azm(self) -> bool {
        !matches!(self, LegalForTradeMode::Industry)
    }
}
