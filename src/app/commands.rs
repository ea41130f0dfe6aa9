//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (keypad UI,
//! serial host, tests) that the
//! [`ChamberService`](super::service::ChamberService) interprets and acts upon.

use crate::calibration::CalibrationSlot;

/// The two closed loops the chamber runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlLoop {
    Humidity,
    FanSpeed,
}

impl ControlLoop {
    pub const fn index(self) -> usize {
        match self {
            Self::Humidity => 0,
            Self::FanSpeed => 1,
        }
    }
}

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Stream a telemetry frame after every acquisition.
    StartTelemetry,

    /// Stop streaming telemetry.
    StopTelemetry,

    StartControl(ControlLoop),

    StopControl(ControlLoop),

    /// Store a new target after range validation.
    SetTarget { control: ControlLoop, value: f64 },

    /// Pair `reference` with the current raw humidity reading.
    SaveCalibration {
        slot: CalibrationSlot,
        reference: f64,
    },

    /// Delete both calibration points.
    ResetCalibration,
}
