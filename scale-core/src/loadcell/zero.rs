//! Zero and Automatic Zero Maintenance (AZM).
//!
//! Resolved open question (zero on power-up, "+8d margin"): the +8 countby
//! margin used by the original firmware to tolerate drift at power-up only
//! widens the acceptance band during the power-up zero capture window, never
//! for a zero-by-command issued later in the session.
//!
//! Resolved open question (AZM while in motion): AZM does not require the
//! "no motion" condition -- it runs every `azm_interval_ms` regardless of
//! the motion flag, nudging the displayed zero only when the reading sits
//! inside `azm_band_d` of true zero.

use crate::error::CommandError;
use crate::standard::ScaleStandardParams;

/// Extra slack, in countby units, applied only during the power-up zero
/// capture window.
const POWER_UP_ZERO_MARGIN_D: f32 = 8.0;

/// A zero-by-command issued while the platform is in motion: armed instead of
/// refused, and committed once the reading has held still for `required_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingZero {
    required_ms: u32,
    still_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZeroState {
    /// ADC counts captured as the current zero reference.
    pub zero_adc: i32,
    /// Previous zero reference, restored by `undo`.
    pub undo_adc: Option<i32>,
    /// Milliseconds accumulated since the last AZM sample.
    pub azm_timer_ms: u32,
    /// True until the first successful zero capture (command or power-up)
    /// completes for this session.
    pub awaiting_power_up_zero: bool,
    pending: Option<PendingZero>,
}

impl ZeroState {
    pub fn new() -> Self {
        ZeroState {
            zero_adc: 0,
            undo_adc: None,
            azm_timer_ms: 0,
            awaiting_power_up_zero: true,
            pending: None,
        }
    }

    fn within_band(gross_value: f32, capacity: f32, fraction: f32, extra_d: f32, countby_d: f32) -> bool {
        gross_value.abs() <= capacity * fraction + extra_d * countby_d
    }

    /// Manual zero-by-command. While in motion, arms a pending capture
    /// (`required_ms` is `max(userPendingTime, 3*filterPeriod+0.5s)`, see
    /// [`crate::loadcell::tare::required_settle_ms`]) instead of refusing
    /// outright -- [`Self::tick_pending`] commits it once the reading
    /// settles. Outside motion, commits immediately if within the mode's
    /// zero band.
    pub fn zero_by_command(
        &mut self,
        current_adc: i32,
        gross_value: f32,
        capacity: f32,
        countby_d: f32,
        params: &ScaleStandardParams,
        in_motion: bool,
        required_ms: u32,
    ) -> Result<(), CommandError> {
        if in_motion {
            self.pending = Some(PendingZero {
                required_ms,
                still_ms: 0,
            });
            return Ok(());
        }
        if !Self::within_band(gross_value, capacity, params.zero_band_fraction, 0.0, countby_d) {
            return Err(CommandError::OutRangeInput);
        }
        self.undo_adc = Some(self.zero_adc);
        self.zero_adc = current_adc;
        self.awaiting_power_up_zero = false;
        self.pending = None;
        Ok(())
    }

    /// Advance a pending command-zero by `elapsed_ms`, called once per tick.
    /// Motion resets the stillness counter. Returns `true` the tick it
    /// commits.
    pub fn tick_pending(
        &mut self,
        elapsed_ms: u32,
        current_adc: i32,
        gross_value: f32,
        capacity: f32,
        countby_d: f32,
        params: &ScaleStandardParams,
        in_motion: bool,
    ) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        if in_motion {
            pending.still_ms = 0;
            return false;
        }
        pending.still_ms += elapsed_ms;
        if pending.still_ms < pending.required_ms {
            return false;
        }
        self.pending = None;
        if !Self::within_band(gross_value, capacity, params.zero_band_fraction, 0.0, countby_d) {
            return false;
        }
        self.undo_adc = Some(self.zero_adc);
        self.zero_adc = current_adc;
        self.awaiting_power_up_zero = false;
        true
    }

    pub fn cancel_pending(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Power-up zero capture: same band check as a command zero, widened by
    /// [`POWER_UP_ZERO_MARGIN_D`], run once automatically at boot if the
    /// sensor has the power-up-zero feature enabled.
    pub fn zero_on_power_up(
        &mut self,
        current_adc: i32,
        gross_value: f32,
        capacity: f32,
        countby_d: f32,
        params: &ScaleStandardParams,
    ) -> Result<(), CommandError> {
        if !self.awaiting_power_up_zero {
            return Err(CommandError::NotAllowInState);
        }
        if !Self::within_band(
            gross_value,
            capacity,
            params.power_up_zero_band_hi_fraction.max(params.power_up_zero_band_lo_fraction),
            POWER_UP_ZERO_MARGIN_D,
            countby_d,
        ) {
            return Err(CommandError::OutRangeInput);
        }
        self.zero_adc = current_adc;
        self.awaiting_power_up_zero = false;
        Ok(())
    }

    /// Automatic Zero Maintenance: called once per tick with the elapsed
    /// milliseconds since the last call. Nudges `zero_adc` toward
    /// `current_adc` when due and the reading is within `azm_band_d`, with
    /// no motion precondition.
    pub fn tick_azm(
        &mut self,
        elapsed_ms: u32,
        current_adc: i32,
        gross_value: f32,
        countby_d: f32,
        params: &ScaleStandardParams,
        azm_enabled: bool,
    ) -> bool {
        if !azm_enabled {
            self.azm_timer_ms = 0;
            return false;
        }
        self.azm_timer_ms += elapsed_ms;
        if self.azm_timer_ms < params.azm_interval_ms {
            return false;
        }
        self.azm_timer_ms = 0;
        if gross_value.abs() <= params.azm_band_d * countby_d {
            self.zero_adc = current_adc;
            return true;
        }
        false
    }

    /// Undo the last command or power-up zero, restoring the previous
    /// reference. Only one level of undo is kept, matching spec.md 4.2.
    pub fn undo(&mut self) -> Result<(), CommandError> {
        match self.undo_adc.take() {
            Some(prev) => {
                self.zero_adc = prev;
                Ok(())
            }
            None => Err(CommandError::NotAllowInState),
        }
    }
}

impl Default for ZeroState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard::LegalForTradeMode;

    #[test]
    fn command_zero_arms_pending_in_motion() {
        let mut z = ZeroState::new();
        let params = LegalForTradeMode::Ntep.params();
        z.zero_by_command(1000, 5.0, 1000.0, 1.0, &params, true, 1000).unwrap();
        assert!(z.has_pending());
        assert_eq!(z.zero_adc, 0);
    }

    #[test]
    fn pending_zero_commits_once_settled() {
        let mut z = ZeroState::new();
        let params = LegalForTradeMode::Ntep.params();
        z.zero_by_command(1000, 5.0, 1000.0, 1.0, &params, true, 1000).unwrap();
        assert!(!z.tick_pending(400, 1000, 5.0, 1000.0, 1.0, &params, false));
        assert!(!z.tick_pending(400, 1000, 5.0, 1000.0, 1.0, &params, true)); // motion resets
        assert!(!z.tick_pending(999, 1000, 5.0, 1000.0, 1.0, &params, false));
        assert!(z.tick_pending(1, 1000, 5.0, 1000.0, 1.0, &params, false));
        assert_eq!(z.zero_adc, 1000);
        assert!(!z.has_pending());
    }

    #[test]
    fn command_zero_rejected_out_of_band() {
        let mut z = ZeroState::new();
        let params = LegalForTradeMode::Ntep.params();
        let err = z
            .zero_by_command(1000, 500.0, 1000.0, 1.0, &params, false, 1000)
            .unwrap_err();
        assert_eq!(err, CommandError::OutRangeInput);
    }

    #[test]
    fn command_zero_accepts_and_sets_undo() {
        let mut z = ZeroState::new();
        let params = LegalForTradeMode::Ntep.params();
        z.zero_by_command(1000, 1.0, 1000.0, 1.0, &params, false, 1000).unwrap();
        assert_eq!(z.zero_adc, 1000);
        assert_eq!(z.undo_adc, Some(0));
    }

    #[test]
    fn undo_restores_previous_zero() {
        let mut z = ZeroState::new();
        let params = LegalForTradeMode::Ntep.params();
        z.zero_by_command(1000, 1.0, 1000.0, 1.0, &params, false, 1000).unwrap();
        z.undo().unwrap();
        assert_eq!(z.zero_adc, 0);
        assert_eq!(z.undo().unwrap_err(), CommandError::NotAllowInState);
    }

    #[test]
    fn azm_does_not_require_stillness() {
        let mut z = ZeroState::new();
        let params = LegalForTradeMode::Ntep.params();
        let moved = z.tick_azm(params.azm_interval_ms, 1, 0.1, 1.0, &params, true);
        assert!(moved);
        assert_eq!(z.zero_adc, 1);
    }

    #[test]
    fn azm_skips_outside_band() {
        let mut z = ZeroState::new();
        let params = LegalForTradeMode::Ntep.params();
        let moved = z.tick_azm(params.azm_interval_ms, 500, 50.0, 1.0, &params, true);
        assert!(!moved);
        assert_eq!(z.zero_adc, 0);
    }
}
