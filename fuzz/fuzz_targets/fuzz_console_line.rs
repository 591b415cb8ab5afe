//! Fuzz target: console line parser
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Accepted probe requests stay within the console's duration bounds
//!
//! cargo fuzz run fuzz_console_line

#![no_main]

use core::time::Duration;

use doorctl::adapters::console::{ConsoleRequest, MAX_PROBE_SECS};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    if let Ok(ConsoleRequest::Probe(opts)) = line.parse::<ConsoleRequest>() {
        assert!(opts.duration > Duration::ZERO);
        assert!(opts.duration <= Duration::from_secs(MAX_PROBE_SECS));
        assert!(opts.samples() >= 1);
    }
});
