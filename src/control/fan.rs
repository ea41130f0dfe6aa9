//! Fan speed control policy.
//!
//! The fan controller IC closes the speed loop itself; this policy only
//! decides whether it is seeking a target.  Every bus write goes through
//! the retry executor, and the rail/LED follow only after the controller
//! accepted the write, so the loop is never half-enabled.

use log::{info, warn};

use crate::app::ports::{ActuatorPort, FanControllerPort, FanSetup};
use crate::config::SystemConfig;
use crate::error::{BusError, Error, InputError};
use crate::retry::retry;

pub struct FanControl {
    active: bool,
    target: f64,
    min: f64,
    max: f64,
    setup: FanSetup,
    attempts: u8,
}

impl FanControl {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            active: false,
            target: config.default_fan_target(),
            min: config.fan_speed_min_rpm,
            max: config.fan_speed_max_rpm,
            setup: FanSetup {
                min_speed_rpm: config.fan_speed_abs_min_rpm,
                spin_up_drive_percent: config.fan_spin_up_drive_percent,
                spin_up_min_speed_rpm: config.fan_speed_abs_min_rpm,
                min_drive_percent: config.fan_min_drive_percent,
            },
            attempts: config.retry_attempts,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Apply the one-time controller setup.
    pub fn configure(&self, fan: &mut impl FanControllerPort) -> Result<(), BusError> {
        retry(self.attempts, || fan.configure(&self.setup))
    }

    pub fn enable(
        &mut self,
        hw: &mut (impl FanControllerPort + ActuatorPort),
    ) -> Result<(), BusError> {
        let target = self.target;
        retry(self.attempts, || hw.set_target_speed(target))?;
        hw.set_fan_power(true);
        hw.set_fan_led(true);
        self.active = true;
        info!("Fan: control enabled, target {:.0} RPM", target);
        Ok(())
    }

    pub fn disable(
        &mut self,
        hw: &mut (impl FanControllerPort + ActuatorPort),
    ) -> Result<(), BusError> {
        retry(self.attempts, || hw.set_target_speed(0.0))?;
        hw.set_fan_power(false);
        hw.set_fan_led(false);
        self.active = false;
        info!("Fan: control disabled");
        Ok(())
    }

    /// Store a new target; push it to the controller when the loop is active.
    ///
    /// The target is kept even when the push fails; the next enable
    /// writes it again.
    pub fn set_target(
        &mut self,
        value: f64,
        fan: &mut impl FanControllerPort,
    ) -> Result<(), Error> {
        InputError::check(value, self.min, self.max)?;
        self.target = value;
        info!("Fan: target {:.0} RPM", value);
        if self.active {
            retry(self.attempts, || fan.set_target_speed(value)).inspect_err(|e| {
                warn!("Fan: controller rejected new target: {}", e);
            })?;
        }
        Ok(())
    }
}
