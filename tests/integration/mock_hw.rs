//! Mock hardware adapter for integration tests.
//!
//! Records every actuator and bus call so tests can assert on the full
//! command history without touching real peripherals.  Sensor and fan
//! results are scripted through public fields.

use humidosh::app::events::AppEvent;
use humidosh::app::ports::{
    ActuatorPort, EventSink, FanControllerPort, FanSetup, HumidityMeasurement,
    HumiditySensorPort, Repeatability,
};
use humidosh::calibration::{CalibrationPoint, CalibrationSlot};
use humidosh::error::{BusError, StorageError};

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    Trigger,
    Fetch,
    FanConfigure,
    FanTarget(f64),
    FanFetch,
    Pump(u8),
    DryValve(bool),
    WetValve(bool),
    FanPower(bool),
    HumidityLed(bool),
    FanLed(bool),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<HwCall>,
    /// Humidity the sensor reports; `None` makes every transaction fail.
    pub humidity: Option<f64>,
    pub temperature: f64,
    /// Raw reading reported alongside the calibrated one.
    pub raw_humidity: f64,
    /// Fan speed the tachometer reports; `None` makes it fail.
    pub fan_rpm: Option<f64>,
    /// Fail this many fan target writes before accepting.
    pub fan_target_failures: u32,
    pub calibration: [Option<CalibrationPoint>; 2],
    pub storage_fails: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            humidity: Some(45.0),
            temperature: 22.0,
            raw_humidity: 44.0,
            fan_rpm: Some(1200.0),
            fan_target_failures: 0,
            calibration: [None, None],
            storage_fails: false,
        }
    }

    pub fn count(&self, call: &HwCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn pump_duty(&self) -> u8 {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                HwCall::Pump(duty) => Some(*duty),
                _ => None,
            })
            .unwrap_or(0)
    }

    fn last_level(&self, pick: impl Fn(&HwCall) -> Option<bool>) -> bool {
        self.calls.iter().rev().find_map(pick).unwrap_or(false)
    }

    pub fn wet_valve_open(&self) -> bool {
        self.last_level(|c| match c {
            HwCall::WetValve(open) => Some(*open),
            _ => None,
        })
    }

    pub fn dry_valve_open(&self) -> bool {
        self.last_level(|c| match c {
            HwCall::DryValve(open) => Some(*open),
            _ => None,
        })
    }

    pub fn fan_powered(&self) -> bool {
        self.last_level(|c| match c {
            HwCall::FanPower(on) => Some(*on),
            _ => None,
        })
    }

    pub fn humidity_led(&self) -> bool {
        self.last_level(|c| match c {
            HwCall::HumidityLed(on) => Some(*on),
            _ => None,
        })
    }

    pub fn fan_led(&self) -> bool {
        self.last_level(|c| match c {
            HwCall::FanLed(on) => Some(*on),
            _ => None,
        })
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl HumiditySensorPort for MockHardware {
    fn trigger_measurement(&mut self, _repeatability: Repeatability) -> Result<(), BusError> {
        self.calls.push(HwCall::Trigger);
        match self.humidity {
            Some(_) => Ok(()),
            None => Err(BusError::Nack),
        }
    }

    fn fetch_measurement(&mut self) -> Result<HumidityMeasurement, BusError> {
        self.calls.push(HwCall::Fetch);
        self.humidity
            .map(|relative_humidity| HumidityMeasurement {
                relative_humidity,
                temperature_c: self.temperature,
            })
            .ok_or(BusError::Nack)
    }

    fn raw_humidity(&self) -> f64 {
        self.raw_humidity
    }

    fn saved_calibration(&self, slot: CalibrationSlot) -> Option<CalibrationPoint> {
        self.calibration[slot.index()]
    }

    fn save_calibration(
        &mut self,
        slot: CalibrationSlot,
        point: CalibrationPoint,
    ) -> Result<(), StorageError> {
        if self.storage_fails {
            return Err(StorageError::IoError);
        }
        self.calibration[slot.index()] = Some(point);
        Ok(())
    }

    fn reset_calibration(&mut self) -> Result<(), StorageError> {
        if self.storage_fails {
            return Err(StorageError::IoError);
        }
        self.calibration = [None, None];
        Ok(())
    }
}

impl FanControllerPort for MockHardware {
    fn configure(&mut self, _setup: &FanSetup) -> Result<(), BusError> {
        self.calls.push(HwCall::FanConfigure);
        Ok(())
    }

    fn set_target_speed(&mut self, rpm: f64) -> Result<(), BusError> {
        self.calls.push(HwCall::FanTarget(rpm));
        if self.fan_target_failures > 0 {
            self.fan_target_failures -= 1;
            return Err(BusError::Timeout);
        }
        Ok(())
    }

    fn fetch_speed(&mut self) -> Result<f64, BusError> {
        self.calls.push(HwCall::FanFetch);
        self.fan_rpm.ok_or(BusError::Crc)
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump_duty(&mut self, duty: u8) {
        self.calls.push(HwCall::Pump(duty));
    }

    fn set_dry_valve(&mut self, open: bool) {
        self.calls.push(HwCall::DryValve(open));
    }

    fn set_wet_valve(&mut self, open: bool) {
        self.calls.push(HwCall::WetValve(open));
    }

    fn set_fan_power(&mut self, on: bool) {
        self.calls.push(HwCall::FanPower(on));
    }

    fn set_humidity_led(&mut self, on: bool) {
        self.calls.push(HwCall::HumidityLed(on));
    }

    fn set_fan_led(&mut self, on: bool) {
        self.calls.push(HwCall::FanLed(on));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, event: &AppEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
