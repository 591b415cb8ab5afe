//! Configuration parsing as the binary sees it at boot.

use doorctl::config::DoorConfig;
use doorctl::error::Error;
use doorctl::fsm::DoorStateMachine;
use doorctl::sensors::ina219::{BusRange, Gain};

use crate::mock_hw::{ScriptedSensor, mock_actuator};

#[test]
fn partial_json_keeps_defaults_for_missing_fields() {
    let json = r#"{"max_actuation_ms": 30000, "ina219": {"bus_range": "V32"}}"#;
    let cfg = DoorConfig::from_json(json).unwrap();
    assert_eq!(cfg.max_actuation_ms, 30_000);
    assert_eq!(cfg.pulse_ms, 100);
    assert_eq!(cfg.ina219.bus_range, BusRange::V32);
    assert_eq!(cfg.ina219.gain, Gain::Div8);
    assert_eq!(cfg.ina219.address, 0x40);
}

#[test]
fn invalid_json_is_a_config_error() {
    assert!(matches!(DoorConfig::from_json("{"), Err(Error::Config(_))));
    assert!(matches!(
        DoorConfig::from_json(r#"{"poll_interval_ms": 0}"#),
        Err(Error::Config(_))
    ));
}

#[test]
fn state_machine_refuses_an_invalid_config() {
    let (actuator, pins) = mock_actuator();
    let cfg = DoorConfig {
        max_actuation_ms: 10,
        poll_interval_ms: 100,
        ..DoorConfig::default()
    };
    assert!(DoorStateMachine::new(actuator, ScriptedSensor::default(), cfg).is_err());
    assert!(pins.lock().unwrap().is_empty(), "no line may move");
}
