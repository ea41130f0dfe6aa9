//! Closed-loop control: humidity (pump + valves) and fan speed.

pub mod fan;
pub mod humidity;
pub mod pid;
