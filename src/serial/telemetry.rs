//! Outbound frames: telemetry snapshots and command acknowledgements.
//!
//! ```text
//! ^d|<rh>|<temp>|<rpm>|<rh target>|<rpm target>@\n
//! ^r|<command>|<y|n>@\n
//! ```
//!
//! A failed reading is sent as `e`, the target of an inactive loop as `i`.

use core::fmt::Write;

use heapless::String;

use super::frame::{END, EOL, SEPARATOR, START};
use crate::error::FrameError;
use crate::scheduler::Readings;
use crate::ui::layout::round_half_away;

pub const TELEMETRY_SELECTOR: char = 'd';
pub const ACK_SELECTOR: char = 'r';
pub const ACK_SUCCESS: char = 'y';
pub const ACK_FAILURE: char = 'n';
pub const ERROR_MARKER: char = 'e';
pub const INACTIVE_MARKER: char = 'i';

const HUMIDITY_DECIMALS: u8 = 1;
const TEMPERATURE_DECIMALS: u8 = 1;
const FAN_DECIMALS: u8 = 0;

pub type OutFrame = String<96>;

/// One telemetry snapshot.  `None` readings are failed acquisitions,
/// `None` targets belong to inactive loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
    pub fan_speed: Option<f64>,
    pub humidity_target: Option<f64>,
    pub fan_target: Option<f64>,
}

impl TelemetryData {
    /// Build from the latest readings.  Temperature comes from the
    /// humidity sensor, so it is only reported alongside a good humidity.
    pub fn snapshot(
        readings: &Readings,
        humidity_target: Option<f64>,
        fan_target: Option<f64>,
    ) -> Self {
        let humidity = readings.humidity.value();
        Self {
            humidity,
            temperature: humidity.and(readings.temperature.value()),
            fan_speed: readings.fan_speed.value(),
            humidity_target,
            fan_target,
        }
    }
}

fn push(out: &mut OutFrame, c: char) -> Result<(), FrameError> {
    out.push(c).map_err(|_| FrameError::Overflow)
}

fn push_field(
    out: &mut OutFrame,
    value: Option<f64>,
    decimals: u8,
    missing: char,
) -> Result<(), FrameError> {
    push(out, char::from(SEPARATOR))?;
    match value {
        Some(v) => write!(
            out,
            "{:.*}",
            usize::from(decimals),
            round_half_away(v, decimals)
        )
        .map_err(|_| FrameError::Overflow),
        None => push(out, missing),
    }
}

fn finish(out: &mut OutFrame) -> Result<(), FrameError> {
    push(out, char::from(END))?;
    push(out, char::from(EOL))
}

/// Encode a telemetry frame.  Fails with [`FrameError::Overflow`] rather
/// than sending a truncated line.
pub fn encode_telemetry(data: &TelemetryData) -> Result<OutFrame, FrameError> {
    let mut out = OutFrame::new();
    push(&mut out, char::from(START))?;
    push(&mut out, TELEMETRY_SELECTOR)?;
    push_field(&mut out, data.humidity, HUMIDITY_DECIMALS, ERROR_MARKER)?;
    push_field(&mut out, data.temperature, TEMPERATURE_DECIMALS, ERROR_MARKER)?;
    push_field(&mut out, data.fan_speed, FAN_DECIMALS, ERROR_MARKER)?;
    push_field(&mut out, data.humidity_target, HUMIDITY_DECIMALS, INACTIVE_MARKER)?;
    push_field(&mut out, data.fan_target, FAN_DECIMALS, INACTIVE_MARKER)?;
    finish(&mut out)?;
    Ok(out)
}

/// Acknowledge the command selected by `command`.
pub fn encode_ack(command: u8, ok: bool) -> Result<OutFrame, FrameError> {
    let mut out = OutFrame::new();
    push(&mut out, char::from(START))?;
    push(&mut out, ACK_SELECTOR)?;
    push(&mut out, char::from(SEPARATOR))?;
    push(&mut out, char::from(command))?;
    push(&mut out, char::from(SEPARATOR))?;
    push(&mut out, if ok { ACK_SUCCESS } else { ACK_FAILURE })?;
    finish(&mut out)?;
    Ok(out)
}
