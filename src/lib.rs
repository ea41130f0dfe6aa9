//! HumidOSH chamber firmware library.
//!
//! Humidity and fan-speed control for a water-activity chamber: a
//! two-phase acquisition scheduler, a PID humidity loop driving a pump
//! and two valves, closed-loop fan control, a keypad/character-display
//! UI and a framed serial link to a host.  Everything touching hardware
//! goes through the port traits in [`app::ports`]; [`adapters`] holds
//! the host-side implementations used by the simulator and tests.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod calibration;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod retry;
pub mod scheduler;
pub mod serial;
pub mod ui;
