//! Fuzz target: `DoorConfig::from_json`
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Every accepted config passes `validate()` and yields a usable INA219
//!   calibration
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use doorctl::config::DoorConfig;
use doorctl::sensors::ina219;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(cfg) = DoorConfig::from_json(json) {
        assert!(cfg.validate().is_ok());
        assert!(cfg.max_actuation() >= cfg.poll_interval());
        assert!(ina219::calibration(cfg.ina219.shunt_ohms, cfg.ina219.max_expected_amps).is_ok());
    }
});
