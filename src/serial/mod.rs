//! Host serial link: inbound command frames, outbound telemetry and acks.

pub mod frame;
pub mod telemetry;

use log::{debug, warn};

use crate::app::ports::SerialPort;
use frame::{FrameReader, InboundCommand};
use telemetry::{TelemetryData, encode_ack, encode_telemetry};

/// Framing state of one serial port.
pub struct SerialLink {
    reader: FrameReader,
    streaming: bool,
}

impl SerialLink {
    pub fn new() -> Self {
        Self {
            reader: FrameReader::new(),
            streaming: false,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn set_streaming(&mut self, on: bool) {
        self.streaming = on;
    }

    /// Drain received bytes up to the next well-formed command.
    /// Malformed lines are dropped.
    pub fn poll(&mut self, port: &mut impl SerialPort) -> Option<InboundCommand> {
        while let Some(byte) = port.read_byte() {
            match self.reader.feed(byte) {
                Some(Ok(command)) => return Some(command),
                Some(Err(e)) => debug!("serial: frame dropped: {e}"),
                None => {}
            }
        }
        None
    }

    pub fn send_telemetry(&self, port: &mut impl SerialPort, data: &TelemetryData) {
        match encode_telemetry(data) {
            Ok(frame) => port.write_all(frame.as_bytes()),
            Err(e) => warn!("serial: telemetry not sent: {e}"),
        }
    }

    pub fn send_ack(&self, port: &mut impl SerialPort, command: u8, ok: bool) {
        match encode_ack(command, ok) {
            Ok(frame) => port.write_all(frame.as_bytes()),
            Err(e) => warn!("serial: ack not sent: {e}"),
        }
    }
}

impl Default for SerialLink {
    fn default() -> Self {
        Self::new()
    }
}
