//! In-memory serial port.
//!
//! Received bytes are queued with [`BufferedSerial::push_rx`]; everything
//! the firmware writes accumulates until [`BufferedSerial::take_tx`].
//! The simulator bridges it to stdin/stdout, tests inspect it directly.

use std::collections::VecDeque;

use crate::app::ports::SerialPort;

#[derive(Debug, Default)]
pub struct BufferedSerial {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl BufferedSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Drain everything written so far.
    pub fn take_tx(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }

    /// Written output split into lines, terminators kept.
    pub fn take_lines(&mut self) -> Vec<String> {
        String::from_utf8_lossy(&self.take_tx())
            .split_inclusive('\n')
            .map(str::to_owned)
            .collect()
    }
}

impl SerialPort for BufferedSerial {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) {
        self.tx.extend_from_slice(bytes);
    }
}
