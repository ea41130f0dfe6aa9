//! Bounded retry for fallible bus transactions.
//!
//! Attempts run back to back with no delay; the transaction's own duration
//! is the only pacing.  The wrapped operation is responsible for leaving
//! consistent state when it fails part-way.

use log::debug;

/// Default attempt budget for every bus operation.
pub const MAX_ATTEMPTS: u8 = 10;

/// Call `op` until it succeeds or `attempts` calls have failed.
///
/// Returns the first success, or the error of the final attempt.
/// An `attempts` of zero is treated as one.
pub fn retry<T, E>(attempts: u8, mut op: impl FnMut() -> Result<T, E>) -> Result<T, E> {
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => {
                if attempt > 1 {
                    debug!("retry: succeeded on attempt {}/{}", attempt, attempts);
                }
                return Ok(value);
            }
            Err(e) if attempt >= attempts => return Err(e),
            Err(_) => attempt += 1,
        }
    }
}
