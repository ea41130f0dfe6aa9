//! Error types for the HumidOSH firmware core.
//!
//! Every subsystem has its own small `Copy` enum; the unified [`Error`]
//! is what [`ChamberService::handle_command`](crate::app::service::ChamberService::handle_command)
//! reports back to the surface that issued the command.  None of these are
//! fatal: a failed bus transaction degrades to `ok = false`, a rejected
//! input routes to an error screen, a bad frame is dropped.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// A sensor or fan-controller bus transaction failed after retries.
    Bus(BusError),
    /// A user or host supplied value was outside its configured range.
    Input(InputError),
    /// An inbound serial frame was malformed.
    Frame(FrameError),
    /// Calibration storage could not be read or written.
    Storage(StorageError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Input(e) => write!(f, "input: {e}"),
            Self::Frame(e) => write!(f, "frame: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

/// Transient failure of a single bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Device did not acknowledge its address or a data byte.
    Nack,
    /// Transaction did not complete in time.
    Timeout,
    /// Payload checksum mismatch.
    Crc,
    /// Measurement requested before a trigger was accepted.
    NotReady,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nack => write!(f, "no acknowledge"),
            Self::Timeout => write!(f, "timeout"),
            Self::Crc => write!(f, "checksum mismatch"),
            Self::NotReady => write!(f, "measurement not ready"),
        }
    }
}

impl core::error::Error for BusError {}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

/// A target value fell outside the configured `[min, max]` range.
/// Carries the violated limit so the UI can display it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputError {
    BelowMinimum { min: f64 },
    AboveMaximum { max: f64 },
}

impl InputError {
    /// Check `value` against an inclusive range.
    pub fn check(value: f64, min: f64, max: f64) -> core::result::Result<(), Self> {
        if value > max {
            Err(Self::AboveMaximum { max })
        } else if value < min {
            Err(Self::BelowMinimum { min })
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowMinimum { min } => write!(f, "below minimum {min}"),
            Self::AboveMaximum { max } => write!(f, "above maximum {max}"),
        }
    }
}

impl core::error::Error for InputError {}

impl From<InputError> for Error {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}

// ---------------------------------------------------------------------------
// Serial frame errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// First byte of the line was not the start delimiter.
    MissingStart,
    /// No end delimiter on the line.
    MissingEnd,
    /// Bytes between the end delimiter and the line terminator.
    TrailingData,
    /// No command selector between the delimiters.
    Empty,
    /// Selector byte does not name a known command.
    UnknownCommand(u8),
    /// Fewer parameter fragments than the command requires.
    MissingParameters { expected: u8, found: u8 },
    /// More parameter fragments than the command accepts.
    ExtraParameters { expected: u8 },
    /// Line or fragment exceeded its buffer.
    Overflow,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStart => write!(f, "missing start delimiter"),
            Self::MissingEnd => write!(f, "missing end delimiter"),
            Self::TrailingData => write!(f, "data after end delimiter"),
            Self::Empty => write!(f, "empty frame"),
            Self::UnknownCommand(c) => write!(f, "unknown command 0x{c:02x}"),
            Self::MissingParameters { expected, found } => {
                write!(f, "expected {expected} parameters, found {found}")
            }
            Self::ExtraParameters { expected } => {
                write!(f, "more than {expected} parameters")
            }
            Self::Overflow => write!(f, "frame too long"),
        }
    }
}

impl core::error::Error for FrameError {}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Self::Frame(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

/// Errors from [`StoragePort`](crate::app::ports::StoragePort) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Destination buffer or partition is too small.
    Full,
    /// Generic I/O error.
    IoError,
    /// Stored blob failed to decode.
    Corrupted,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "stored data corrupted"),
        }
    }
}

impl core::error::Error for StorageError {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;
