//! Under-voltage annunciation: a two-threshold state machine the host polls
//! once per tick alongside the sensors. Only toggles status and a shutdown
//! request; driving a display or actually cutting power is a collaborator's
//! job.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Normal,
    Warning,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerMonitor {
    pub warning_volts: f32,
    pub shutdown_volts: f32,
    /// Volts must recover above `warning_volts + recovery_hysteresis_volts`
    /// to leave `Warning` and return to `Normal`.
    pub recovery_hysteresis_volts: f32,
    state: PowerState,
}

impl PowerMonitor {
    pub fn new(warning_volts: f32, shutdown_volts: f32) -> Self {
        PowerMonitor {
            warning_volts,
            shutdown_volts,
            recovery_hysteresis_volts: 0.2,
            state: PowerState::Normal,
        }
    }

    /// Feed one voltage sample, return the resulting state. `Shutdown` is
    /// sticky: once entered, only a fresh [`PowerMonitor`] (i.e. a power
    /// cycle) can leave it.
    pub fn tick(&mut self, volts: f32) -> PowerState {
        if self.state == PowerState::Shutdown {
            return self.state;
        }

        self.state = if volts <= self.shutdown_volts {
            PowerState::Shutdown
        } else if volts <= self.warning_volts {
            PowerState::Warning
        } else if self.state == PowerState::Warning
            && volts < self.warning_volts + self.recovery_hysteresis_volts
        {
            PowerState::Warning
        } else {
            PowerState::Normal
        };
        self.state
    }

    pub fn state(&self) -> PowerState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warns_below_threshold_then_shuts_down_lower() {
        let mut m = PowerMonitor::new(11.0, 10.0);
        assert_eq!(m.tick(12.0), PowerState::Normal);
        assert_eq!(m.tick(10.5), PowerState::Warning);
        assert_eq!(m.tick(9.5), PowerState::Shutdown);
    }

    #[test]
    fn shutdown_is_sticky() {
        let mut m = PowerMonitor::new(11.0, 10.0);
        m.tick(9.0);
        assert_eq!(m.tick(20.0), PowerState::Shutdown);
    }

    #[test]
    fn warning_recovery_needs_hysteresis_margin() {
        let mut m = PowerMonitor::new(11.0, 10.0);
        m.tick(10.5);
        assert_eq!(m.tick(11.05), PowerState::Warning);
        assert_eq!(m.tick(11.3), PowerState::Normal);
    }
}
