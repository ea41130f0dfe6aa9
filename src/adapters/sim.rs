//! Host simulation of the chamber.
//!
//! A first-order plant model stands in for the air loop: the pump pushes
//! air through the wet or dry branch, the chamber leaks toward ambient,
//! and the fan follows its target with a one-second lag.  Simulated
//! peripherals share the plant through `Rc<RefCell<_>>`:
//!
//! | Adapter              | Implements                 |
//! |----------------------|----------------------------|
//! | `SimHumiditySensor`  | HumiditySensorPort         |
//! | `SimFanController`   | FanControllerPort          |
//! | `SimPwm`             | `embedded_hal` SetDutyCycle|
//! | `SimOutput`          | `embedded_hal` OutputPin   |

use core::cell::RefCell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use log::{debug, info};

use crate::app::ports::{
    FanControllerPort, FanSetup, HumidityMeasurement, HumiditySensorPort, Repeatability,
    StoragePort,
};
use crate::calibration::{CalibrationPoint, CalibrationSlot, CalibrationStore, TwoPointCalibration};
use crate::error::{BusError, StorageError};

/// %RH per second at full pump duty through one branch.
const BRANCH_RATE: f64 = 1.5;
/// Fraction of the gap to ambient closed per second.
const LEAK_RATE: f64 = 0.01;
/// Fan response time constant (seconds).
const FAN_TAU_S: f64 = 1.0;

// ── Plant ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Plant {
    /// True chamber humidity (%RH).
    pub humidity: f64,
    pub temperature_c: f64,
    pub ambient_humidity: f64,
    pub pump_duty: u8,
    pub wet_valve_open: bool,
    pub dry_valve_open: bool,
    /// Fan rail level; the rail is active low.
    pub fan_rail_high: bool,
    pub fan_target_rpm: f64,
    pub fan_rpm: f64,
    pub humidity_led: bool,
    pub fan_led: bool,
    /// Make every sensor transaction fail.
    pub sensor_offline: bool,
}

impl Default for Plant {
    fn default() -> Self {
        Self {
            humidity: 40.0,
            temperature_c: 22.0,
            ambient_humidity: 40.0,
            pump_duty: 0,
            wet_valve_open: false,
            dry_valve_open: false,
            fan_rail_high: true,
            fan_target_rpm: 0.0,
            fan_rpm: 0.0,
            humidity_led: false,
            fan_led: false,
            sensor_offline: false,
        }
    }
}

impl Plant {
    pub fn fan_powered(&self) -> bool {
        !self.fan_rail_high
    }

    /// Advance the model by `dt_ms`.
    pub fn step(&mut self, dt_ms: u32) {
        let dt = f64::from(dt_ms) / 1000.0;
        let flow = f64::from(self.pump_duty) / 255.0;

        let mut rate = (self.ambient_humidity - self.humidity) * LEAK_RATE;
        if self.wet_valve_open {
            rate += BRANCH_RATE * flow;
        }
        if self.dry_valve_open {
            rate -= BRANCH_RATE * flow;
        }
        self.humidity = (self.humidity + rate * dt).clamp(0.0, 100.0);

        let seek = if self.fan_powered() { self.fan_target_rpm } else { 0.0 };
        let alpha = (dt / FAN_TAU_S).min(1.0);
        self.fan_rpm += (seek - self.fan_rpm) * alpha;
    }
}

pub type SharedPlant = Rc<RefCell<Plant>>;

pub fn shared_plant(plant: Plant) -> SharedPlant {
    Rc::new(RefCell::new(plant))
}

// ── Humidity sensor ───────────────────────────────────────────

/// Sensor with a gain/offset error, so calibration has something to fix.
pub struct SimHumiditySensor<S: StoragePort> {
    plant: SharedPlant,
    store: CalibrationStore<S>,
    calibration: TwoPointCalibration,
    triggered: bool,
    last_raw: f64,
}

impl<S: StoragePort> SimHumiditySensor<S> {
    pub const GAIN: f64 = 0.97;
    pub const OFFSET: f64 = 1.0;

    /// Loads stored calibration from `storage`.
    pub fn new(plant: SharedPlant, storage: S) -> Self {
        let store = CalibrationStore::new(storage);
        let calibration = store.load();
        Self {
            plant,
            store,
            calibration,
            triggered: false,
            last_raw: 0.0,
        }
    }

    pub fn calibration(&self) -> &TwoPointCalibration {
        &self.calibration
    }

    pub fn storage(&self) -> &S {
        self.store.storage()
    }

    fn online(&self) -> Result<(), BusError> {
        if self.plant.borrow().sensor_offline {
            Err(BusError::Nack)
        } else {
            Ok(())
        }
    }
}

impl<S: StoragePort> HumiditySensorPort for SimHumiditySensor<S> {
    fn trigger_measurement(&mut self, _repeatability: Repeatability) -> Result<(), BusError> {
        self.online()?;
        self.triggered = true;
        Ok(())
    }

    fn fetch_measurement(&mut self) -> Result<HumidityMeasurement, BusError> {
        self.online()?;
        if !core::mem::take(&mut self.triggered) {
            return Err(BusError::NotReady);
        }
        let plant = self.plant.borrow();
        let raw = (plant.humidity * Self::GAIN + Self::OFFSET).clamp(0.0, 100.0);
        self.last_raw = raw;
        Ok(HumidityMeasurement {
            relative_humidity: self.calibration.apply(raw).clamp(0.0, 100.0),
            temperature_c: plant.temperature_c,
        })
    }

    fn raw_humidity(&self) -> f64 {
        self.last_raw
    }

    fn saved_calibration(&self, slot: CalibrationSlot) -> Option<CalibrationPoint> {
        self.calibration.point(slot)
    }

    fn save_calibration(
        &mut self,
        slot: CalibrationSlot,
        point: CalibrationPoint,
    ) -> Result<(), StorageError> {
        let mut next = self.calibration;
        next.set(slot, point);
        self.store.save(&next)?;
        self.calibration = next;
        Ok(())
    }

    fn reset_calibration(&mut self) -> Result<(), StorageError> {
        self.store.clear()?;
        self.calibration.clear();
        Ok(())
    }
}

// ── Fan controller ────────────────────────────────────────────

pub struct SimFanController {
    plant: SharedPlant,
    setup: Option<FanSetup>,
}

impl SimFanController {
    pub fn new(plant: SharedPlant) -> Self {
        Self { plant, setup: None }
    }

    pub fn setup(&self) -> Option<FanSetup> {
        self.setup
    }
}

impl FanControllerPort for SimFanController {
    fn configure(&mut self, setup: &FanSetup) -> Result<(), BusError> {
        info!(
            "SimFan: min {:.0} RPM, spin-up {}%, min drive {}%",
            setup.min_speed_rpm, setup.spin_up_drive_percent, setup.min_drive_percent
        );
        self.setup = Some(*setup);
        Ok(())
    }

    fn set_target_speed(&mut self, rpm: f64) -> Result<(), BusError> {
        debug!("SimFan: target {:.0} RPM", rpm);
        self.plant.borrow_mut().fan_target_rpm = rpm;
        Ok(())
    }

    fn fetch_speed(&mut self) -> Result<f64, BusError> {
        Ok(self.plant.borrow().fan_rpm)
    }
}

// ── embedded-hal outputs ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    DryValve,
    WetValve,
    FanRail,
    HumidityLed,
    FanLed,
}

/// A plant-backed GPIO.
pub struct SimOutput {
    plant: SharedPlant,
    line: Line,
}

impl SimOutput {
    pub fn new(plant: SharedPlant, line: Line) -> Self {
        Self { plant, line }
    }

    fn set(&mut self, high: bool) {
        let mut plant = self.plant.borrow_mut();
        match self.line {
            Line::DryValve => plant.dry_valve_open = high,
            Line::WetValve => plant.wet_valve_open = high,
            Line::FanRail => plant.fan_rail_high = high,
            Line::HumidityLed => plant.humidity_led = high,
            Line::FanLed => plant.fan_led = high,
        }
    }
}

impl digital::ErrorType for SimOutput {
    type Error = Infallible;
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set(true);
        Ok(())
    }
}

/// Pump PWM channel with an 8-bit range.
pub struct SimPwm {
    plant: SharedPlant,
}

impl SimPwm {
    pub fn new(plant: SharedPlant) -> Self {
        Self { plant }
    }
}

impl pwm::ErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.plant.borrow_mut().pump_duty = duty.min(255) as u8;
        Ok(())
    }
}
