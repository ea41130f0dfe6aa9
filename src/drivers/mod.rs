//! Input drivers.

pub mod keypad;
