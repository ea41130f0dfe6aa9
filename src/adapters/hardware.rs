//! Hardware adapter: bridges peripherals to domain port traits.
//!
//! [`HalActuators`] drives the chamber outputs through `embedded-hal`
//! traits, so the same code runs on any HAL that implements them (and
//! on the simulator's pins).  [`HardwareAdapter`] bundles a sensor, a
//! fan controller and the outputs into the single `hw` value the
//! service's tick expects.

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use log::warn;

use crate::app::ports::{
    ActuatorPort, FanControllerPort, FanSetup, HumidityMeasurement, HumiditySensorPort,
    Repeatability,
};
use crate::calibration::{CalibrationPoint, CalibrationSlot};
use crate::error::{BusError, StorageError};

/// Full-scale pump duty as seen by the control policy.
const PUMP_DUTY_FULL_SCALE: u16 = 255;

/// Digital outputs of the chamber board.
pub struct OutputPins<P> {
    pub dry_valve: P,
    pub wet_valve: P,
    /// Fan supply rail, switched by a P-channel MOSFET (active low).
    pub fan_rail: P,
    pub humidity_led: P,
    pub fan_led: P,
}

/// [`ActuatorPort`] over an `embedded-hal` PWM channel and output pins.
///
/// Pin errors cannot be reported through the port; they are logged and
/// the output keeps its previous level.
pub struct HalActuators<M, P> {
    pump: M,
    pins: OutputPins<P>,
}

impl<M: SetDutyCycle, P: OutputPin> HalActuators<M, P> {
    pub fn new(pump: M, pins: OutputPins<P>) -> Self {
        Self { pump, pins }
    }

    pub fn release(self) -> (M, OutputPins<P>) {
        (self.pump, self.pins)
    }
}

fn drive(pin: &mut impl OutputPin, high: bool, name: &str) {
    let result = if high { pin.set_high() } else { pin.set_low() };
    if let Err(e) = result {
        warn!("{name}: pin write failed: {:?}", digital::Error::kind(&e));
    }
}

impl<M: SetDutyCycle, P: OutputPin> ActuatorPort for HalActuators<M, P> {
    fn set_pump_duty(&mut self, duty: u8) {
        if let Err(e) = self
            .pump
            .set_duty_cycle_fraction(u16::from(duty), PUMP_DUTY_FULL_SCALE)
        {
            warn!("pump: PWM write failed: {:?}", pwm::Error::kind(&e));
        }
    }

    fn set_dry_valve(&mut self, open: bool) {
        drive(&mut self.pins.dry_valve, open, "dry valve");
    }

    fn set_wet_valve(&mut self, open: bool) {
        drive(&mut self.pins.wet_valve, open, "wet valve");
    }

    fn set_fan_power(&mut self, on: bool) {
        drive(&mut self.pins.fan_rail, !on, "fan rail");
    }

    fn set_humidity_led(&mut self, on: bool) {
        drive(&mut self.pins.humidity_led, on, "humidity LED");
    }

    fn set_fan_led(&mut self, on: bool) {
        drive(&mut self.pins.fan_led, on, "fan LED");
    }
}

/// Concrete adapter that combines all hardware behind the port traits.
pub struct HardwareAdapter<S, F, A> {
    pub sensor: S,
    pub fan: F,
    pub outputs: A,
}

impl<S, F, A> HardwareAdapter<S, F, A> {
    pub fn new(sensor: S, fan: F, outputs: A) -> Self {
        Self {
            sensor,
            fan,
            outputs,
        }
    }
}

// ── HumiditySensorPort implementation ─────────────────────────

impl<S: HumiditySensorPort, F, A> HumiditySensorPort for HardwareAdapter<S, F, A> {
    fn trigger_measurement(&mut self, repeatability: Repeatability) -> Result<(), BusError> {
        self.sensor.trigger_measurement(repeatability)
    }

    fn fetch_measurement(&mut self) -> Result<HumidityMeasurement, BusError> {
        self.sensor.fetch_measurement()
    }

    fn raw_humidity(&self) -> f64 {
        self.sensor.raw_humidity()
    }

    fn saved_calibration(&self, slot: CalibrationSlot) -> Option<CalibrationPoint> {
        self.sensor.saved_calibration(slot)
    }

    fn save_calibration(
        &mut self,
        slot: CalibrationSlot,
        point: CalibrationPoint,
    ) -> Result<(), StorageError> {
        self.sensor.save_calibration(slot, point)
    }

    fn reset_calibration(&mut self) -> Result<(), StorageError> {
        self.sensor.reset_calibration()
    }
}

// ── FanControllerPort implementation ──────────────────────────

impl<S, F: FanControllerPort, A> FanControllerPort for HardwareAdapter<S, F, A> {
    fn configure(&mut self, setup: &FanSetup) -> Result<(), BusError> {
        self.fan.configure(setup)
    }

    fn set_target_speed(&mut self, rpm: f64) -> Result<(), BusError> {
        self.fan.set_target_speed(rpm)
    }

    fn fetch_speed(&mut self) -> Result<f64, BusError> {
        self.fan.fetch_speed()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<S, F, A: ActuatorPort> ActuatorPort for HardwareAdapter<S, F, A> {
    fn set_pump_duty(&mut self, duty: u8) {
        self.outputs.set_pump_duty(duty);
    }

    fn set_dry_valve(&mut self, open: bool) {
        self.outputs.set_dry_valve(open);
    }

    fn set_wet_valve(&mut self, open: bool) {
        self.outputs.set_wet_valve(open);
    }

    fn set_fan_power(&mut self, on: bool) {
        self.outputs.set_fan_power(on);
    }

    fn set_humidity_led(&mut self, on: bool) {
        self.outputs.set_humidity_led(on);
    }

    fn set_fan_led(&mut self, on: bool) {
        self.outputs.set_fan_led(on);
    }

    fn all_off(&mut self) {
        self.outputs.all_off();
    }
}
