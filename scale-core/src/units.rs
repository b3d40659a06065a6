//! Unit codes and the "true" vs "display capacity" conversion tables.
//!
//! Two tables exist on purpose: `WeightUnit::convert` gives the physically
//! correct factor, while `WeightUnit::convert_capacity` gives the rounded
//! factor the industry uses for capacity/countby labels (1 lb display-converts
//! to 0.5 kg, not 0.45359 kg). Keep both; do not collapse them.

use serde::{Deserialize, Serialize};

pub const NUM_WEIGHT_UNITS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[repr(u8)]
pub enum WeightUnit {
    Lb = 0,
    Kg = 1,
    Ton = 2,
    MTon = 3,
    Oz = 4,
    G = 5,
    KiloNewton = 6,
}

impl WeightUnit {
    const ALL: [WeightUnit; NUM_WEIGHT_UNITS] = [
        WeightUnit::Lb,
        WeightUnit::Kg,
        WeightUnit::Ton,
        WeightUnit::MTon,
        WeightUnit::Oz,
        WeightUnit::G,
        WeightUnit::KiloNewton,
    ];

    fn idx(self) -> usize {
        self as u8 as usize
    }

    /// Physically correct from->to conversion factor.
    pub fn convert(self, to: WeightUnit) -> f32 {
        TRUE_TABLE[self.idx()][to.idx()]
    }

    /// from->to factor squared, for propagating variance-like quantities
    /// (sum of squares in the totaling engine) across a unit change.
    pub fn convert_squared(self, to: WeightUnit) -> f32 {
        TRUE_SQUARE_TABLE[self.idx()][to.idx()]
    }

    /// Industry "display capacity" from->to conversion factor: rounded so
    /// capacity/countby labels line up (1 lb <-> 0.5 kg), not physically exact.
    pub fn convert_capacity(self, to: WeightUnit) -> f32 {
        DISPLAY_CAPACITY_TABLE[self.idx()][to.idx()]
    }
}

#[rustfmt::skip]
const TRUE_TABLE: [[f32; NUM_WEIGHT_UNITS]; NUM_WEIGHT_UNITS] = [
    //            LB            KG             TON            MTON           OZ             G              KN
    /* LB  */ [1.0,          0.45359,       0.0005,        0.00045359,    16.0,          453.59,        0.00444822246],
    /* KG  */ [2.204623,     1.0,           0.0011023,     0.001,         35.273968,     1000.0,        0.009806703],
    /* TON */ [2000.0,       907.1847,      1.0,           0.9071847,     32000.0,       907184.7,      8.89644493],
    /* MTON*/ [2204.623,     1000.0,        1.102311,      1.0,           35273.968,     1000000.0,     9.806703],
    /* OZ  */ [0.0625,       0.0283494,     0.00003125,    0.00002835,    1.0,           28.349375,     2.780139e-4],
    /* G   */ [0.0022046,    0.001,         0.0000011023,  0.000001,      0.035273968,   1.0,           9.806703e-6],
    /* KN  */ [224.8089,     101.971068951, 0.11240445,    0.101971,      3596.9424,     101971.0,      1.0],
];

#[rustfmt::skip]
const TRUE_SQUARE_TABLE: [[f32; NUM_WEIGHT_UNITS]; NUM_WEIGHT_UNITS] = [
    /* LB  */ [1.0,           0.2057438881,  0.00000025,     2.057438881e-7, 256.0,             205743.8881,      1.9786683e-5],
    /* KG  */ [4.860362572129,1.0,           1.21506529e-6,  1.0e-6,         1244.252818465024, 1.0e+6,           9.6171426e-5],
    /* TON */ [4.0e+6,        8.2298407991409e+5, 1.0,       8.2298407991409e-1, 1.024e+9,      8.2298407991409e+11, 79.1467325],
    /* MTON*/ [4.860362572129e+6, 1.0e+6,    1.215089540721, 1.0,            1.244252818465024e+9, 1.0e+12,       96171426.0],
    /* OZ  */ [3.90625e-3,    8.0368848036e-4, 9.765625e-10, 8.037225e-10,   1.0,               803.687062890625, 7.729173e-8],
    /* G   */ [4.86026116e-6, 1.0e-6,        1.21506529e-12, 1.0e-12,        1.244252818465024e-3, 1.0,           9.6171426e-11],
    /* KN  */ [50539.04151921, 10398.0989,   0.01263476,     0.013980989,    12937994.6,        10398098903.0,    1.0],
];

#[rustfmt::skip]
const DISPLAY_CAPACITY_TABLE: [[f32; NUM_WEIGHT_UNITS]; NUM_WEIGHT_UNITS] = [
    /* LB  */ [1.0,      0.5,          0.0005,   0.0005,       16.0,    500.0,     0.00490336],
    /* KG  */ [2.0,      1.0,          0.001,    0.001,        32.0,    1000.0,    0.009806703],
    /* TON */ [2000.0,   1000.0,       1.0,      1.0,          32000.0, 1000000.0, 9.806703],
    /* MTON*/ [2000.0,   1000.0,       1.0,      1.0,          32000.0, 1000000.0, 9.806703],
    /* OZ  */ [0.0625,   0.03124987,   0.00003125, 0.00003124987, 1.0,  31.24987,  3.064579e-4],
    /* G   */ [0.002,    0.001,        0.000001, 0.000001,     0.032,   1.0,       9.806703e-6],
    /* KN  */ [203.942137902, 101.971068951, 0.101971, 0.101971, 3263.0742, 101971.0, 1.0],
];

/// Temperature units, independent small conversion (additive, not multiplicative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[repr(u8)]
pub enum TemperatureUnit {
    Celsius = 0,
    Fahrenheit = 1,
    Kelvin = 2,
}

impl TemperatureUnit {
    pub fn convert(self, to: TemperatureUnit, value: f32) -> f32 {
        let celsius = match self {
            TemperatureUnit::Celsius => value,
            TemperatureUnit::Fahrenheit => (value - 32.0) * (5.0 / 9.0),
            TemperatureUnit::Kelvin => value - 273.15,
        };
        match to {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * (9.0 / 5.0) + 32.0,
            TemperatureUnit::Kelvin => celsius + 273.15,
        }
    }
}

/// Voltage monitors only ever report Volts; kept as its own unit code so the
/// `SensorValueUnit` enum below can address every sensor kind uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VoltageUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum UnitCode {
    Weight(WeightUnit),
    Temperature(TemperatureUnit),
    Volt,
}
