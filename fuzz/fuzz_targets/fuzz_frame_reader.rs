//! Fuzz target: `FrameReader::feed`
//!
//! Drives arbitrary byte sequences into the streaming frame reader and
//! asserts that it never panics, that every accepted command is one the
//! link knows, and that a reset always leaves it able to parse a clean
//! frame.
//!
//! cargo fuzz run fuzz_frame_reader

#![no_main]

use humidosh::serial::frame::{CommandKind, FrameReader, parse_frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = parse_frame(data);

    let mut reader = FrameReader::new();
    for &byte in data {
        if let Some(Ok(command)) = reader.feed(byte) {
            let kind = CommandKind::from_selector(command.selector());
            assert!(kind.is_some(), "reader accepted an unknown selector");
            assert_eq!(command.param_count(), 0);
        }
    }

    reader.reset();
    let mut last = None;
    for &byte in b"^s@\n" {
        last = reader.feed(byte);
    }
    assert!(matches!(last, Some(Ok(_))), "reader did not recover after reset");
});
