//! Line-oriented command framing.
//!
//! Wire format (one frame per line):
//! ```text
//! ┌───┬──────────┬───┬─────────┬───┬─────┬───┬────┐
//! │ ^ │ selector │ | │ param 0 │ | │ ... │ @ │ \n │
//! └───┴──────────┴───┴─────────┴───┴─────┴───┴────┘
//! ```
//!
//! The selector is a single byte naming the command, which fixes the
//! exact number of parameters.  Empty fragments (`||`) are skipped.
//! Nothing may follow `@` before the line terminator.
//!
//! [`FrameReader`] accumulates bytes from a non-blocking port and yields
//! one parse result per terminated line.  A byte other than `^` at the
//! start of a line is rejected on its own, so the reader resynchronises
//! on the next `^`.

use crate::app::commands::AppCommand;
use crate::error::FrameError;

pub const START: u8 = b'^';
pub const SEPARATOR: u8 = b'|';
pub const END: u8 = b'@';
pub const EOL: u8 = b'\n';

/// Longest accepted line, delimiters included, terminator excluded.
pub const MAX_FRAME_LEN: usize = 128;
/// Longest accepted fragment.
pub const MAX_FRAGMENT_LEN: usize = 20;
/// Most parameters any command may carry.
pub const MAX_PARAMS: usize = 4;

pub type Fragment = heapless::Vec<u8, MAX_FRAGMENT_LEN>;

/// Host → device commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `d`: stream telemetry after every acquisition.
    StartTelemetry,
    /// `s`: stop streaming.
    StopTelemetry,
}

impl CommandKind {
    pub const fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            b'd' => Some(Self::StartTelemetry),
            b's' => Some(Self::StopTelemetry),
            _ => None,
        }
    }

    pub const fn selector(self) -> u8 {
        match self {
            Self::StartTelemetry => b'd',
            Self::StopTelemetry => b's',
        }
    }

    pub const fn param_count(self) -> u8 {
        match self {
            Self::StartTelemetry | Self::StopTelemetry => 0,
        }
    }

    /// Parameter count for a selector, `None` when unknown.
    pub fn expected_params(selector: u8) -> Option<u8> {
        Self::from_selector(selector).map(Self::param_count)
    }

    pub const fn app_command(self) -> AppCommand {
        match self {
            Self::StartTelemetry => AppCommand::StartTelemetry,
            Self::StopTelemetry => AppCommand::StopTelemetry,
        }
    }
}

/// A successfully parsed frame.  Parameters are indexed from 0; the
/// selector is not a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    selector: u8,
    params: heapless::Vec<Fragment, MAX_PARAMS>,
}

impl InboundCommand {
    pub fn selector(&self) -> u8 {
        self.selector
    }

    pub fn kind(&self) -> Option<CommandKind> {
        CommandKind::from_selector(self.selector)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn fragment(&self, index: usize) -> Option<&str> {
        self.params
            .get(index)
            .and_then(|f| core::str::from_utf8(f).ok())
    }
}

/// Parse one line (terminator stripped) against the built-in command set.
pub fn parse_frame(line: &[u8]) -> Result<InboundCommand, FrameError> {
    parse_frame_with(line, CommandKind::expected_params)
}

/// Parse one line, looking up each selector's parameter count in
/// `expected_params`.
pub fn parse_frame_with(
    line: &[u8],
    expected_params: impl Fn(u8) -> Option<u8>,
) -> Result<InboundCommand, FrameError> {
    if line.first() != Some(&START) {
        return Err(FrameError::MissingStart);
    }
    if line.len() > MAX_FRAME_LEN {
        return Err(FrameError::Overflow);
    }
    let end = line
        .iter()
        .position(|&b| b == END)
        .ok_or(FrameError::MissingEnd)?;
    if end + 1 != line.len() {
        return Err(FrameError::TrailingData);
    }

    let mut fragments = line[1..end]
        .split(|&b| b == SEPARATOR)
        .filter(|f| !f.is_empty());

    let selector = match fragments.next() {
        None => return Err(FrameError::Empty),
        Some(&[byte]) => byte,
        Some(other) => return Err(FrameError::UnknownCommand(other[0])),
    };
    let expected = expected_params(selector).ok_or(FrameError::UnknownCommand(selector))?;
    if usize::from(expected) > MAX_PARAMS {
        return Err(FrameError::Overflow);
    }

    let mut params = heapless::Vec::new();
    for fragment in fragments.by_ref().take(usize::from(expected)) {
        let fragment = Fragment::from_slice(fragment).map_err(|()| FrameError::Overflow)?;
        params.push(fragment).map_err(|_| FrameError::Overflow)?;
    }

    let found = params.len() as u8;
    if found < expected {
        return Err(FrameError::MissingParameters { expected, found });
    }
    if fragments.next().is_some() {
        return Err(FrameError::ExtraParameters { expected });
    }

    Ok(InboundCommand { selector, params })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    /// Between lines.
    Idle,
    /// Inside a line that started with `^`.
    Collecting,
    /// Skipping to the end of a line already known to be bad.
    Discarding(FrameError),
}

/// Streaming line assembler in front of [`parse_frame`].
pub struct FrameReader {
    state: ReaderState,
    line: heapless::Vec<u8, MAX_FRAME_LEN>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            state: ReaderState::Idle,
            line: heapless::Vec::new(),
        }
    }

    /// Feed one byte.  Returns a result whenever a line completes, and
    /// an immediate [`FrameError::MissingStart`] for stray bytes.
    pub fn feed(&mut self, byte: u8) -> Option<Result<InboundCommand, FrameError>> {
        match self.state {
            ReaderState::Idle => match byte {
                START => {
                    self.line.clear();
                    // Capacity is at least one byte.
                    self.line.push(byte).ok();
                    self.state = ReaderState::Collecting;
                    None
                }
                EOL | b'\r' => None,
                _ => Some(Err(FrameError::MissingStart)),
            },
            ReaderState::Collecting => {
                if byte == EOL {
                    self.state = ReaderState::Idle;
                    return Some(parse_frame(&self.line));
                }
                if self.line.push(byte).is_err() {
                    self.state = ReaderState::Discarding(FrameError::Overflow);
                }
                None
            }
            ReaderState::Discarding(error) => {
                if byte == EOL {
                    self.state = ReaderState::Idle;
                    return Some(Err(error));
                }
                None
            }
        }
    }

    /// Drop any partial line.
    pub fn reset(&mut self) {
        self.state = ReaderState::Idle;
        self.line.clear();
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}
