//! Status bitflags for a loadcell reading. Kept as three byte-sized sets,
//! mirroring the original firmware's `status`/`status2`/`status3` bytes, so a
//! `scale-service` consumer can publish them as three `u8` signals without
//! reshaping anything.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        const OVERLOAD = 0b0000_0001;
        const UNDERLOAD = 0b0000_0010;
        const IN_MOTION = 0b0000_0100;
        const CENTER_OF_ZERO = 0b0000_1000;
        const NET_MODE = 0b0001_0000;
        const UNCALIBRATED = 0b0010_0000;
        const OUT_OF_RANGE = 0b0100_0000;
        const TARE_ACTIVE = 0b1000_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status2: u8 {
        const ZERO_PENDING = 0b0000_0001;
        const TARE_PENDING = 0b0000_0010;
        const TOTAL_PENDING = 0b0000_0100;
        const AZM_ACTIVE = 0b0000_1000;
        const POWER_UP_ZERO_FAILED = 0b0001_0000;
        const SERVICE_COUNTER_ACK_NEEDED = 0b0010_0000;
        const OVER_CAPACITY_LATCHED = 0b0100_0000;
        const MATH_SENSOR_INPUT_ERROR = 0b1000_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status3: u8 {
        const SETPOINT_1 = 0b0000_0001;
        const SETPOINT_2 = 0b0000_0010;
        const SETPOINT_3 = 0b0000_0100;
        const SETPOINT_4 = 0b0000_1000;
        const SETPOINT_5 = 0b0001_0000;
        const SETPOINT_6 = 0b0010_0000;
        const SETPOINT_7 = 0b0100_0000;
        const SETPOINT_8 = 0b1000_0000;
    }
}
