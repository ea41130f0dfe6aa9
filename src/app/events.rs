//! Outbound application events.
//!
//! The [`ChamberService`](super::service::ChamberService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (log to the console, forward to a host).

use crate::calibration::CalibrationSlot;
use crate::error::InputError;
use crate::serial::telemetry::TelemetryData;

use super::commands::ControlLoop;

/// Sensed quantities tracked by the DAQ scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Humidity,
    FanSpeed,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started and actuators are in their safe state.
    Started,

    ControlStarted(ControlLoop),

    ControlStopped(ControlLoop),

    /// Enabling a loop failed (fan controller did not accept the target).
    ControlStartFailed(ControlLoop),

    /// An acquisition exhausted its retries after previously succeeding.
    SensorFault(Quantity),

    /// An acquisition succeeded after previously failing.
    SensorRecovered(Quantity),

    TargetUpdated { control: ControlLoop, value: f64 },

    InputRejected { control: ControlLoop, error: InputError },

    CalibrationSaved(CalibrationSlot),

    CalibrationCleared,

    /// Host telemetry streaming switched on or off.
    TelemetryStreaming(bool),

    /// Snapshot sent to the host after an acquisition.
    Telemetry(TelemetryData),
}
