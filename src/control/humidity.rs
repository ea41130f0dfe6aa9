//! Humidity control policy.
//!
//! Turns the regulator's signed output into pump duty and valve routing:
//!
//! ```text
//!  output  ──────────┬──────────────┬──────────────┬──────────▶
//!          ≤ -duty_min   deadband    ≥ duty_min
//!          dry valve     pump off    wet valve
//!          pump |O|      valves shut pump |O|
//! ```
//!
//! The pump saturates to 255 once `|O| ≥ duty_max`.  While the humidity
//! reading is not ok the loop parks in [`HumidityLoopState::Recovering`]
//! with every actuator off; the first fresh reading after recovery only
//! reseeds the regulator, actuation resumes on the next one.

use log::{info, warn};

use crate::app::ports::ActuatorPort;
use crate::config::SystemConfig;
use crate::error::InputError;
use crate::scheduler::Reading;

use super::pid::{PidController, Regulator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumidityLoopState {
    Inactive,
    Active,
    /// Active, but the last humidity acquisition failed.
    Recovering,
}

/// Actuator levels produced by one controller output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actuation {
    pub pump_duty: u8,
    pub wet_valve_open: bool,
    pub dry_valve_open: bool,
}

impl Actuation {
    pub const OFF: Self = Self {
        pump_duty: 0,
        wet_valve_open: false,
        dry_valve_open: false,
    };

    fn apply(self, act: &mut impl ActuatorPort) {
        // Close before open so both valves are never open together.
        if !self.wet_valve_open {
            act.set_wet_valve(false);
        }
        if !self.dry_valve_open {
            act.set_dry_valve(false);
        }
        if self.wet_valve_open {
            act.set_wet_valve(true);
        }
        if self.dry_valve_open {
            act.set_dry_valve(true);
        }
        act.set_pump_duty(self.pump_duty);
    }
}

/// Map a controller output onto the pump and valves.
pub fn actuation_for(output: f64, duty_min: u8, duty_max: u8) -> Actuation {
    let magnitude = output.abs();
    let pump_duty = if magnitude >= f64::from(duty_max) {
        u8::MAX
    } else {
        magnitude.min(255.0) as u8
    };
    if output >= f64::from(duty_min) {
        Actuation {
            pump_duty,
            wet_valve_open: true,
            dry_valve_open: false,
        }
    } else if output <= -f64::from(duty_min) {
        Actuation {
            pump_duty,
            wet_valve_open: false,
            dry_valve_open: true,
        }
    } else {
        Actuation::OFF
    }
}

pub struct HumidityControl<R: Regulator = PidController> {
    state: HumidityLoopState,
    regulator: R,
    target: f64,
    min: f64,
    max: f64,
    duty_min: u8,
    duty_max: u8,
    last_actuation: Actuation,
}

/// Regulator output range, one full PWM step either way.
const OUTPUT_LIMIT: f64 = 255.0;

impl HumidityControl<PidController> {
    pub fn new(config: &SystemConfig) -> Self {
        let target = config.default_humidity_target();
        let mut regulator = PidController::new(
            config.humidity_kp,
            config.humidity_ki,
            config.humidity_kd,
            target,
        );
        regulator.set_limits(-OUTPUT_LIMIT, OUTPUT_LIMIT);
        Self::with_regulator(config, regulator)
    }
}

impl<R: Regulator> HumidityControl<R> {
    pub fn with_regulator(config: &SystemConfig, mut regulator: R) -> Self {
        let target = config.default_humidity_target();
        regulator.set_target(target);
        Self {
            state: HumidityLoopState::Inactive,
            regulator,
            target,
            min: config.humidity_min_percent,
            max: config.humidity_max_percent,
            duty_min: config.pump_duty_min,
            duty_max: config.pump_duty_max,
            last_actuation: Actuation::OFF,
        }
    }

    pub fn state(&self) -> HumidityLoopState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != HumidityLoopState::Inactive
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn last_actuation(&self) -> Actuation {
        self.last_actuation
    }

    pub fn regulator(&self) -> &R {
        &self.regulator
    }

    /// Accept a new target inside `[min, max]`.
    pub fn set_target(&mut self, value: f64) -> Result<(), InputError> {
        InputError::check(value, self.min, self.max)?;
        self.target = value;
        self.regulator.set_target(value);
        info!("Humidity: target {:.1}%", value);
        Ok(())
    }

    pub fn enable(&mut self, act: &mut impl ActuatorPort) {
        act.set_humidity_led(true);
        self.regulator.reset();
        self.state = HumidityLoopState::Active;
        info!("Humidity: control enabled, target {:.1}%", self.target);
    }

    pub fn disable(&mut self, act: &mut impl ActuatorPort) {
        act.set_humidity_led(false);
        self.drive(Actuation::OFF, act);
        self.state = HumidityLoopState::Inactive;
        info!("Humidity: control disabled");
    }

    /// Run one control step against the latest humidity reading.
    pub fn tick(&mut self, now_ms: u32, humidity: &mut Reading, act: &mut impl ActuatorPort) {
        if self.state == HumidityLoopState::Inactive {
            return;
        }

        let Some(value) = humidity.value() else {
            if self.state == HumidityLoopState::Active {
                warn!("Humidity: reading lost, pump and valves off");
                self.state = HumidityLoopState::Recovering;
                self.drive(Actuation::OFF, act);
            }
            return;
        };

        if !humidity.take_fresh_for_control() {
            return;
        }

        if self.state == HumidityLoopState::Recovering {
            self.regulator.seed(value, now_ms);
            self.state = HumidityLoopState::Active;
            info!("Humidity: reading recovered, controller reseeded at {:.1}%", value);
            return;
        }

        let output = self.regulator.compute(value, now_ms);
        self.drive(actuation_for(output, self.duty_min, self.duty_max), act);
    }

    fn drive(&mut self, actuation: Actuation, act: &mut impl ActuatorPort) {
        actuation.apply(act);
        self.last_actuation = actuation;
    }
}
