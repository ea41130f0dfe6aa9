//! System configuration parameters
//!
//! All tunable parameters for the chamber. Supplied at construction of the
//! [`ChamberService`](crate::app::service::ChamberService); the simulation
//! binary loads them from a JSON file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Humidity ---
    /// Lowest accepted humidity target (%RH)
    pub humidity_min_percent: f64,
    /// Highest accepted humidity target (%RH)
    pub humidity_max_percent: f64,
    /// Controller output magnitude below which the pump stays off
    pub pump_duty_min: u8,
    /// Controller output magnitude at which the pump saturates to full duty
    pub pump_duty_max: u8,
    /// PID gains
    pub humidity_kp: f64,
    pub humidity_ki: f64,
    pub humidity_kd: f64,

    // --- Fan ---
    /// Lowest accepted fan target (RPM)
    pub fan_speed_min_rpm: f64,
    /// Highest accepted fan target (RPM)
    pub fan_speed_max_rpm: f64,
    /// Speed below which the controller treats the fan as stalled (RPM)
    pub fan_speed_abs_min_rpm: f64,
    /// Minimum drive the fan controller may apply (0-100%)
    pub fan_min_drive_percent: u8,
    /// Drive applied while spinning the fan up (0-100%)
    pub fan_spin_up_drive_percent: u8,

    // --- Keypad / UI ---
    /// Length of the hold-to-stop gesture (milliseconds)
    pub key_hold_duration_ms: u16,
    /// Press duration after which the keypad reports a hold edge (milliseconds)
    pub keypad_hold_delay_ms: u16,
    /// Show the temperature row on the readings screen
    pub show_temperature: bool,

    // --- Acquisition ---
    /// DAQ period (milliseconds)
    pub daq_period_ms: u32,
    /// Delay between humidity trigger and fetch (milliseconds)
    pub humidity_settle_ms: u32,
    /// Attempts per bus operation before giving up
    pub retry_attempts: u8,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Humidity
            humidity_min_percent: 0.0,
            humidity_max_percent: 100.0,
            pump_duty_min: 60,
            pump_duty_max: 255,
            humidity_kp: 20.0,
            humidity_ki: 0.2,
            humidity_kd: 0.0,

            // Fan
            fan_speed_min_rpm: 1000.0,
            fan_speed_max_rpm: 9800.0,
            fan_speed_abs_min_rpm: 500.0,
            fan_min_drive_percent: 30,
            fan_spin_up_drive_percent: 30,

            // Keypad / UI
            key_hold_duration_ms: 3000,
            keypad_hold_delay_ms: 500,
            show_temperature: false,

            // Acquisition
            daq_period_ms: 1000,
            humidity_settle_ms: 315, // 15 ms high-repeatability conversion + 300 ms margin
            retry_attempts: crate::retry::MAX_ATTEMPTS,
        }
    }
}

impl SystemConfig {
    /// Default humidity target: midpoint of the accepted range.
    pub fn default_humidity_target(&self) -> f64 {
        (self.humidity_min_percent + self.humidity_max_percent) / 2.0
    }

    /// Default fan target: top of the accepted range.
    pub fn default_fan_target(&self) -> f64 {
        self.fan_speed_max_rpm
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            self.humidity_min_percent,
            self.humidity_max_percent,
            self.humidity_kp,
            self.humidity_ki,
            self.humidity_kd,
            self.fan_speed_min_rpm,
            self.fan_speed_max_rpm,
            self.fan_speed_abs_min_rpm,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationFailed("values must be finite"));
        }
        if self.humidity_min_percent >= self.humidity_max_percent {
            return Err(ConfigError::ValidationFailed(
                "humidity_min_percent must be below humidity_max_percent",
            ));
        }
        if self.pump_duty_min == 0 {
            return Err(ConfigError::ValidationFailed("pump_duty_min must be at least 1"));
        }
        if self.pump_duty_min > self.pump_duty_max {
            return Err(ConfigError::ValidationFailed(
                "pump_duty_min must not exceed pump_duty_max",
            ));
        }
        if self.fan_speed_min_rpm >= self.fan_speed_max_rpm {
            return Err(ConfigError::ValidationFailed(
                "fan_speed_min_rpm must be below fan_speed_max_rpm",
            ));
        }
        if self.fan_speed_abs_min_rpm > self.fan_speed_min_rpm {
            return Err(ConfigError::ValidationFailed(
                "fan_speed_abs_min_rpm must not exceed fan_speed_min_rpm",
            ));
        }
        if self.fan_min_drive_percent > 100 || self.fan_spin_up_drive_percent > 100 {
            return Err(ConfigError::ValidationFailed("fan drive must be 0-100%"));
        }
        if self.key_hold_duration_ms < 1000 {
            return Err(ConfigError::ValidationFailed(
                "key_hold_duration_ms must be at least 1000",
            ));
        }
        if self.daq_period_ms == 0 || self.humidity_settle_ms >= self.daq_period_ms {
            return Err(ConfigError::ValidationFailed(
                "humidity_settle_ms must be shorter than daq_period_ms",
            ));
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::ValidationFailed("retry_attempts must be at least 1"));
        }
        Ok(())
    }
}
