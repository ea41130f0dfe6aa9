//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr via `env_logger` in the simulator).  A host
//! link adapter would implement the same trait.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::serial::telemetry::TelemetryData;

/// Adapter that logs every [`AppEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

struct Field(Option<f64>, usize);

impl core::fmt::Display for Field {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.*}", self.1, v),
            None => f.write_str("--"),
        }
    }
}

fn log_telemetry(t: &TelemetryData) {
    debug!(
        "TELEM | RH={}% T={}\u{00b0}C | fan={}RPM | targets RH={} fan={}",
        Field(t.humidity, 1),
        Field(t.temperature, 1),
        Field(t.fan_speed, 0),
        Field(t.humidity_target, 1),
        Field(t.fan_target, 0),
    );
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => log_telemetry(t),
            AppEvent::Started => info!("START | outputs safe"),
            AppEvent::ControlStarted(control) => info!("CONTROL | {:?} started", control),
            AppEvent::ControlStopped(control) => info!("CONTROL | {:?} stopped", control),
            AppEvent::ControlStartFailed(control) => {
                warn!("CONTROL | {:?} failed to start", control)
            }
            AppEvent::SensorFault(quantity) => warn!("SENSOR | {:?} unavailable", quantity),
            AppEvent::SensorRecovered(quantity) => info!("SENSOR | {:?} recovered", quantity),
            AppEvent::TargetUpdated { control, value } => {
                info!("TARGET | {:?} = {}", control, value)
            }
            AppEvent::InputRejected { control, error } => {
                warn!("TARGET | {:?} rejected: {}", control, error)
            }
            AppEvent::CalibrationSaved(slot) => info!("CAL | point {} saved", slot.number()),
            AppEvent::CalibrationCleared => info!("CAL | cleared"),
            AppEvent::TelemetryStreaming(on) => info!("SERIAL | streaming={}", on),
        }
    }
}
