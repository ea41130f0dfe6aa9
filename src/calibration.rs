//! Two-point humidity calibration.
//!
//! Each point pairs a raw sensor reading with a reference value measured
//! by a trusted instrument (typically a saturated salt solution).
//!
//! | stored points | correction                           |
//! |---------------|--------------------------------------|
//! | both          | straight line through both points     |
//! | one           | constant offset `reference - raw`     |
//! | none          | identity                              |
//!
//! Points are persisted as one versioned postcard blob through a
//! [`StoragePort`].  A missing, unreadable or non-finite blob loads as
//! "no calibration", never as an error the caller has to handle.

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::StoragePort;
use crate::error::StorageError;

const NAMESPACE: &str = "humidosh";
const KEY: &str = "rh_cal";
const FORMAT_VERSION: u8 = 1;
const BLOB_CAPACITY: usize = 64;

/// A raw/reference pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub raw: f64,
    pub reference: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationSlot {
    Point1,
    Point2,
}

impl CalibrationSlot {
    pub const fn index(self) -> usize {
        match self {
            Self::Point1 => 0,
            Self::Point2 => 1,
        }
    }

    /// 1-based number shown to the user.
    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TwoPointCalibration {
    points: [Option<CalibrationPoint>; 2],
}

impl TwoPointCalibration {
    pub fn point(&self, slot: CalibrationSlot) -> Option<CalibrationPoint> {
        self.points[slot.index()]
    }

    pub fn set(&mut self, slot: CalibrationSlot, point: CalibrationPoint) {
        self.points[slot.index()] = Some(point);
    }

    pub fn clear(&mut self) {
        self.points = [None, None];
    }

    /// Correct a raw reading.
    pub fn apply(&self, raw: f64) -> f64 {
        match self.points {
            [Some(a), Some(b)] if (b.raw - a.raw).abs() > f64::EPSILON => {
                a.reference + (raw - a.raw) * (b.reference - a.reference) / (b.raw - a.raw)
            }
            [Some(p), _] | [None, Some(p)] => raw + (p.reference - p.raw),
            [None, None] => raw,
        }
    }

    fn is_finite(&self) -> bool {
        self.points
            .iter()
            .flatten()
            .all(|p| p.raw.is_finite() && p.reference.is_finite())
    }
}

// ───────────────────────────────────────────────────────────────
// Persistence
// ───────────────────────────────────────────────────────────────

/// Loads and saves a [`TwoPointCalibration`] through a [`StoragePort`].
pub struct CalibrationStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> CalibrationStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the stored calibration; absent or corrupt data yields no points.
    pub fn load(&self) -> TwoPointCalibration {
        if !self.storage.exists(NAMESPACE, KEY) {
            debug!("Calibration: nothing stored");
            return TwoPointCalibration::default();
        }
        let mut buf = [0u8; BLOB_CAPACITY];
        let len = match self.storage.read(NAMESPACE, KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => return TwoPointCalibration::default(),
            Err(e) => {
                warn!("Calibration: read failed: {}", e);
                return TwoPointCalibration::default();
            }
        };
        match decode(&buf[..len]) {
            Ok(cal) => cal,
            Err(e) => {
                error!("Calibration: stored data unusable ({}), ignoring", e);
                TwoPointCalibration::default()
            }
        }
    }

    pub fn save(&mut self, cal: &TwoPointCalibration) -> Result<(), StorageError> {
        let payload = postcard::to_allocvec(cal).map_err(|_| StorageError::Corrupted)?;
        let mut blob = Vec::with_capacity(payload.len() + 1);
        blob.push(FORMAT_VERSION);
        blob.extend_from_slice(&payload);
        self.storage.write(NAMESPACE, KEY, &blob)?;
        info!("Calibration: saved ({} bytes)", blob.len());
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.delete(NAMESPACE, KEY)?;
        info!("Calibration: cleared");
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn decode(bytes: &[u8]) -> Result<TwoPointCalibration, StorageError> {
    let (&version, payload) = bytes.split_first().ok_or(StorageError::Corrupted)?;
    if version != FORMAT_VERSION {
        return Err(StorageError::Corrupted);
    }
    let cal: TwoPointCalibration =
        postcard::from_bytes(payload).map_err(|_| StorageError::Corrupted)?;
    if !cal.is_finite() {
        return Err(StorageError::Corrupted);
    }
    Ok(cal)
}
