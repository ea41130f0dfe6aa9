//! Data-acquisition scheduler.
//!
//! Humidity conversions are two-phase: the sensor is triggered at the
//! start of each period and read back once its settle time has passed.
//! The fan tachometer is read in the same tick as the humidity fetch.
//!
//! ```text
//!  period boundary                              next boundary
//!  │                                            │
//!  ▼                                            ▼
//!  ├── trigger ──── settle ────┬── fetch RH/T ───┼── trigger ── …
//!  │   (retried)               │   fetch RPM     │
//!  │                           │   (retried)     │
//!  t0                      t0 + settle       t0 + period
//! ```
//!
//! Every acquisition result lands in a [`Reading`]: `ok` plus two
//! one-shot fresh flags, one consumed by the display and one by the
//! humidity controller.  A failed acquisition clears both flags and sets
//! `ok = false`; it is never escalated further.  All time comparisons use
//! wrapping `u32` millisecond arithmetic.

use log::debug;

use crate::app::ports::{FanControllerPort, HumiditySensorPort, Repeatability};
use crate::config::SystemConfig;
use crate::retry::retry;

// ═══════════════════════════════════════════════════════════════
//  Readings
// ═══════════════════════════════════════════════════════════════

/// Latest acquisition result for one sensed quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    value: f64,
    ok: bool,
    fresh_for_print: bool,
    fresh_for_control: bool,
}

impl Reading {
    pub const fn new() -> Self {
        Self {
            value: 0.0,
            ok: false,
            fresh_for_print: false,
            fresh_for_control: false,
        }
    }

    /// The value, or `None` when the last acquisition failed.
    pub fn value(&self) -> Option<f64> {
        self.ok.then_some(self.value)
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Consume the display's fresh flag.
    pub fn take_fresh_for_print(&mut self) -> bool {
        core::mem::take(&mut self.fresh_for_print)
    }

    /// Consume the controller's fresh flag.
    pub fn take_fresh_for_control(&mut self) -> bool {
        core::mem::take(&mut self.fresh_for_control)
    }

    /// Store a successful acquisition.  `for_control` raises the
    /// controller's flag as well as the display's.
    pub fn record(&mut self, value: f64, for_control: bool) {
        self.value = value;
        self.ok = true;
        self.fresh_for_print = true;
        self.fresh_for_control = for_control;
    }

    /// Store a failed acquisition.
    pub fn record_failure(&mut self) {
        self.ok = false;
        self.fresh_for_print = false;
        self.fresh_for_control = false;
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::new()
    }
}

/// All sensed quantities.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readings {
    pub humidity: Reading,
    pub temperature: Reading,
    pub fan_speed: Reading,
}

/// Outcome of one completed acquisition (fetch phase).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquisition {
    pub humidity_ok: bool,
    pub fan_ok: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy)]
struct PendingFetch {
    triggered_at_ms: u32,
    trigger_ok: bool,
}

pub struct DaqScheduler {
    period_ms: u32,
    settle_ms: u32,
    attempts: u8,
    repeatability: Repeatability,
    last_trigger_ms: Option<u32>,
    pending: Option<PendingFetch>,
}

impl DaqScheduler {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            period_ms: config.daq_period_ms,
            settle_ms: config.humidity_settle_ms,
            attempts: config.retry_attempts,
            repeatability: Repeatability::High,
            last_trigger_ms: None,
            pending: None,
        }
    }

    /// Advance acquisition timing.
    ///
    /// The first call triggers immediately.  Returns `Some` on the tick
    /// that completed a fetch.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl HumiditySensorPort + FanControllerPort),
        readings: &mut Readings,
    ) -> Option<Acquisition> {
        let mut completed = None;

        if let Some(pending) = self.pending {
            if now_ms.wrapping_sub(pending.triggered_at_ms) >= self.settle_ms {
                self.pending = None;
                completed = Some(self.fetch(pending.trigger_ok, hw, readings));
            }
        }

        let due = self
            .last_trigger_ms
            .is_none_or(|t| now_ms.wrapping_sub(t) >= self.period_ms);
        if due && self.pending.is_none() {
            self.last_trigger_ms = Some(now_ms);
            let repeatability = self.repeatability;
            let trigger_ok = match retry(self.attempts, || hw.trigger_measurement(repeatability)) {
                Ok(()) => true,
                Err(e) => {
                    debug!("DAQ: humidity trigger failed: {}", e);
                    false
                }
            };
            self.pending = Some(PendingFetch {
                triggered_at_ms: now_ms,
                trigger_ok,
            });
        }

        completed
    }

    fn fetch(
        &self,
        trigger_ok: bool,
        hw: &mut (impl HumiditySensorPort + FanControllerPort),
        readings: &mut Readings,
    ) -> Acquisition {
        let measurement = if trigger_ok {
            retry(self.attempts, || hw.fetch_measurement())
                .inspect_err(|e| debug!("DAQ: humidity fetch failed: {}", e))
                .ok()
        } else {
            None
        };
        let humidity_ok = match measurement {
            Some(m) => {
                readings.humidity.record(m.relative_humidity, true);
                readings.temperature.record(m.temperature_c, false);
                true
            }
            None => {
                readings.humidity.record_failure();
                readings.temperature.record_failure();
                false
            }
        };

        let fan_ok = match retry(self.attempts, || hw.fetch_speed()) {
            Ok(rpm) => {
                readings.fan_speed.record(rpm, false);
                true
            }
            Err(e) => {
                debug!("DAQ: fan speed fetch failed: {}", e);
                readings.fan_speed.record_failure();
                false
            }
        };

        Acquisition {
            humidity_ok,
            fan_ok,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
