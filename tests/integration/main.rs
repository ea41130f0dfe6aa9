//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no real
//! hardware required.

mod bench;
mod mock_hw;
mod serial_tests;
mod service_tests;
mod ui_flow_tests;
