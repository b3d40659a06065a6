//! Motion (stability) detection.
//!
//! Resolved open question (motion timeout across legal-for-trade modes): the
//! no-motion timer clears the in-motion flag the same way in every mode
//! (Industry/NTEP/OIML/OneUnit) -- once the reading has held inside
//! `motion_window_d` for `motion_no_motion_ms`, motion clears uniformly.
//! Only the band width and timeout differ per mode (see
//! [`crate::standard::ScaleStandardParams`]); there is no separate
//! legal-for-trade-specific clearing rule.

use crate::standard::ScaleStandardParams;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionDetector {
    last_value: f32,
    still_ms: u32,
    in_motion: bool,
    initialized: bool,
}

impl MotionDetector {
    pub fn new() -> Self {
        MotionDetector {
            last_value: 0.0,
            still_ms: 0,
            in_motion: true,
            initialized: false,
        }
    }

    /// Feed one new gross (or net, callers choose) value. Returns the
    /// updated in-motion flag.
    pub fn tick(&mut self, elapsed_ms: u32, value: f32, countby_d: f32, params: &ScaleStandardParams) -> bool {
        if !self.initialized {
            self.last_value = value;
            self.initialized = true;
            self.still_ms = 0;
            self.in_motion = true;
            return self.in_motion;
        }

        let delta = (value - self.last_value).abs();

        if delta > params.motion_window_d * countby_d {
            self.last_value = value;
            self.still_ms = 0;
            self.in_motion = true;
            return self.in_motion;
        }

        self.still_ms += elapsed_ms;
        if self.still_ms >= params.motion_no_motion_ms {
            // The reference point only moves once stillness is confirmed, so
            // slow drift away from it keeps accumulating delta instead of
            // being re-zeroed every tick.
            self.last_value = value;
            self.still_ms = 0;
            self.in_motion = false;
        }
        self.in_motion
    }

    pub fn in_motion(&self) -> bool {
        self.in_motion
    }

    /// Small-motion flag used by power-save logic: true once stillness has
    /// held for at least half the no-motion timeout, even if the full
    /// timeout (and therefore `in_motion() == false`) hasn't been reached
    /// yet.
    pub fn settling(&self, params: &ScaleStandardParams) -> bool {
        self.still_ms >= params.motion_no_motion_ms / 2
    }
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new()
    }
}
