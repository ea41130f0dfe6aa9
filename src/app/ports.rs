//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ChamberService (domain)
//! ```
//!
//! Driven adapters (sensor, fan controller, outputs, display, serial,
//! event sinks, storage) implement these traits.  The
//! [`ChamberService`](super::service::ChamberService) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! Bus-backed ports return typed [`BusError`]s; the core retries them
//! through [`retry`](crate::retry::retry) and never escalates a failure
//! beyond `ok = false`.

use crate::calibration::{CalibrationPoint, CalibrationSlot};
use crate::error::{BusError, StorageError};

// ───────────────────────────────────────────────────────────────
// Humidity sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Measurement repeatability; higher repeatability needs a longer settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeatability {
    Low,
    Medium,
    High,
}

/// One completed humidity/temperature conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumidityMeasurement {
    /// Calibrated relative humidity (%RH).
    pub relative_humidity: f64,
    /// Temperature (°C).
    pub temperature_c: f64,
}

/// Two-phase humidity sensor with on-board two-point calibration.
pub trait HumiditySensorPort {
    /// Start a conversion.  The result is available after the settle time.
    fn trigger_measurement(&mut self, repeatability: Repeatability) -> Result<(), BusError>;

    /// Read back the conversion started by the last trigger.
    fn fetch_measurement(&mut self) -> Result<HumidityMeasurement, BusError>;

    /// Uncalibrated humidity of the last successful fetch.
    fn raw_humidity(&self) -> f64;

    /// Stored calibration point, `None` if absent or unreadable.
    fn saved_calibration(&self, slot: CalibrationSlot) -> Option<CalibrationPoint>;

    /// Persist a calibration point and apply it to subsequent fetches.
    fn save_calibration(
        &mut self,
        slot: CalibrationSlot,
        point: CalibrationPoint,
    ) -> Result<(), StorageError>;

    /// Delete both calibration points.
    fn reset_calibration(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Fan controller port (driven adapter: domain ↔ fan controller IC)
// ───────────────────────────────────────────────────────────────

/// One-time fan controller setup applied at start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanSetup {
    pub min_speed_rpm: f64,
    pub spin_up_drive_percent: u8,
    pub spin_up_min_speed_rpm: f64,
    pub min_drive_percent: u8,
}

/// Closed-loop fan speed controller with tachometer.
pub trait FanControllerPort {
    fn configure(&mut self, setup: &FanSetup) -> Result<(), BusError>;

    /// Set the speed the controller seeks.  Zero stops seeking.
    fn set_target_speed(&mut self, rpm: f64) -> Result<(), BusError>;

    /// Tachometer reading (RPM).
    fn fetch_speed(&mut self) -> Result<f64, BusError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Pump PWM duty (0–255).
    fn set_pump_duty(&mut self, duty: u8);

    /// Valve routing air through the desiccant.
    fn set_dry_valve(&mut self, open: bool);

    /// Valve routing air through the water reservoir.
    fn set_wet_valve(&mut self, open: bool);

    /// Fan power rail.
    fn set_fan_power(&mut self, on: bool);

    fn set_humidity_led(&mut self, on: bool);

    fn set_fan_led(&mut self, on: bool);

    /// Pump off, valves closed, fan rail off, LEDs off.
    fn all_off(&mut self) {
        self.set_pump_duty(0);
        self.set_wet_valve(false);
        self.set_dry_valve(false);
        self.set_fan_power(false);
        self.set_humidity_led(false);
        self.set_fan_led(false);
    }
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → character display)
// ───────────────────────────────────────────────────────────────

/// 20×4 character display addressed by column/row.
pub trait DisplayPort {
    fn clear(&mut self);

    fn set_cursor(&mut self, col: u8, row: u8);

    fn print_str(&mut self, text: &str);

    fn print_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.print_str(c.encode_utf8(&mut buf));
    }

    /// Print `value` with a fixed number of decimal places.
    fn print_number(&mut self, value: f64, decimals: u8) {
        let text = crate::ui::layout::format_number(value, decimals);
        self.print_str(&text);
    }

    /// Blink the cell under the cursor (input prompt).
    fn set_blink(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Serial port (driven adapter: domain ↔ host link)
// ───────────────────────────────────────────────────────────────

/// Byte-level, non-blocking host link.
pub trait SerialPort {
    /// Next received byte, `None` when the receive buffer is empty.
    fn read_byte(&mut self) -> Option<u8>;

    fn write_all(&mut self, bytes: &[u8]);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ flash / EEPROM)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Keys are namespaced to prevent collisions between subsystems.
/// Write operations MUST be atomic; no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}
