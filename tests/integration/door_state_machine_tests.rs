//! End-to-end door behaviour: real state machine and relay driver over
//! recording pins and a scripted current sensor.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

use doorctl::app::ports::{ActuatorLine, Level, StateListener};
use doorctl::error::SensorError;
use doorctl::fsm::DoorStateMachine;
use doorctl::fsm::states::DoorState::{self, Closed, Closing, Open, Opening};

use crate::mock_hw::{
    MockDoor, RecordingListener, ScriptedSensor, fast_config, mock_actuator, rig, wait_for_state,
};

const LONG: u32 = 60_000;

#[test]
fn completes_on_falling_edge_at_fourth_poll() {
    let sensor = ScriptedSensor::new(&[0.0, 0.2, 0.2, 0.05], 0.0);
    let rig = rig(sensor.clone(), fast_config(LONG));

    let reads_at_commit = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&reads_at_commit);
    let probe = sensor.clone();
    rig.door
        .subscribe(Arc::new(move |_from: DoorState, to: DoorState| {
            if to == Open {
                seen.lock().unwrap().push(probe.reads());
            }
        }))
        .unwrap();

    rig.door.open_door().unwrap();
    assert_eq!(rig.door.state(), Opening);
    rig.wait_for(Open);

    assert_eq!(*reads_at_commit.lock().unwrap(), [4]);
    assert_eq!(rig.listener.events(), [(Closed, Opening), (Opening, Open)]);

    // The monitor exits after committing.
    thread::sleep(Duration::from_millis(20));
    assert_eq!(sensor.reads(), 4);
    assert!(!rig.door.is_monitoring());
}

#[test]
fn times_out_no_earlier_than_max_actuation() {
    let rig = rig(ScriptedSensor::new(&[], 0.0), fast_config(100));

    let start = Instant::now();
    rig.door.close_door().unwrap();
    rig.wait_for(Closed);
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert_eq!(rig.listener.events(), [(Closed, Closing), (Closing, Closed)]);
}

#[test]
fn sensor_errors_fall_back_to_timeout() {
    let sensor = ScriptedSensor::new(&[0.5], 0.0);
    for _ in 0..1000 {
        sensor.push_error(SensorError::I2cReadFailed);
    }
    let rig = rig(sensor, fast_config(80));

    rig.door.open_door().unwrap();
    rig.wait_for(Open);
    assert_eq!(rig.listener.events(), [(Closed, Opening), (Opening, Open)]);
}

#[test]
fn reversal_never_commits_the_cancelled_target() {
    let sensor = ScriptedSensor::new(&[0.5], 0.5);
    let rig = rig(sensor.clone(), fast_config(LONG));

    rig.door.open_door().unwrap();
    thread::sleep(Duration::from_millis(20));
    rig.door.close_door().unwrap();
    assert_eq!(rig.door.state(), Closing);

    // Motor still running toward closed; nothing may commit yet.
    thread::sleep(Duration::from_millis(30));
    assert_eq!(rig.door.state(), Closing);

    sensor.push(&[0.0]);
    rig.wait_for(Closed);
    assert_eq!(
        rig.listener.events(),
        [(Closed, Opening), (Opening, Closing), (Closing, Closed)]
    );
    assert_eq!(rig.pulses(ActuatorLine::Open), 1);
    assert_eq!(rig.pulses(ActuatorLine::Close), 1);
}

#[test]
fn only_one_monitor_reads_at_a_time() {
    let sensor = ScriptedSensor::new(&[], 0.5);
    let rig = rig(sensor.clone(), fast_config(LONG));

    for i in 0..6 {
        if i % 2 == 0 {
            rig.door.open_door().unwrap();
        } else {
            rig.door.close_door().unwrap();
        }
        thread::sleep(Duration::from_millis(10));
    }

    // Once a newer monitor starts reading, an older one never reads again.
    let readers = sensor.readers();
    let mut retired = HashSet::new();
    for pair in readers.windows(2) {
        assert!(!retired.contains(&pair[1]), "cancelled monitor kept polling");
        if pair[0] != pair[1] {
            retired.insert(pair[0]);
        }
    }
    assert!(retired.len() >= 4, "expected a monitor per command");
}

#[test]
fn repeated_open_pulses_again_and_returns_to_open() {
    let sensor = ScriptedSensor::new(&[0.4, 0.0], 0.0);
    let rig = rig(sensor.clone(), fast_config(LONG));

    rig.door.open_door().unwrap();
    rig.wait_for(Open);

    sensor.push(&[0.4, 0.0]);
    rig.door.open_door().unwrap();
    assert_eq!(rig.door.state(), Opening);
    rig.wait_for(Open);

    assert_eq!(rig.pulses(ActuatorLine::Open), 2);
    assert_eq!(
        rig.listener.events(),
        [(Closed, Opening), (Opening, Open), (Open, Opening), (Opening, Open)]
    );
}

#[test]
fn observers_see_a_full_cycle_in_order() {
    let sensor = ScriptedSensor::new(&[0.3, 0.3, 0.0], 0.0);
    let rig = rig(sensor.clone(), fast_config(LONG));

    rig.door.open_door().unwrap();
    rig.wait_for(Open);
    sensor.push(&[0.3, 0.0]);
    rig.door.close_door().unwrap();
    rig.wait_for(Closed);

    assert_eq!(
        rig.listener.events(),
        [(Closed, Opening), (Opening, Open), (Open, Closing), (Closing, Closed)]
    );
}

#[test]
fn reissued_open_while_opening_pulses_again_and_commits_once() {
    let sensor = ScriptedSensor::new(&[], 0.5);
    let rig = rig(sensor.clone(), fast_config(LONG));

    rig.door.open_door().unwrap();
    thread::sleep(Duration::from_millis(20));
    rig.door.open_door().unwrap();
    assert_eq!(rig.door.state(), Opening);

    // Let the second monitor latch the running motor before it stops.
    thread::sleep(Duration::from_millis(20));
    sensor.push(&[0.0]);
    rig.wait_for(Open);
    thread::sleep(Duration::from_millis(20));

    assert_eq!(rig.pulses(ActuatorLine::Open), 2);
    assert_eq!(rig.pulses(ActuatorLine::Close), 0);
    assert_eq!(rig.listener.events(), [(Closed, Opening), (Opening, Open)]);
    assert!(!rig.door.is_monitoring());
}

#[test]
fn pulse_never_energises_both_coils() {
    let rig = rig(ScriptedSensor::new(&[], 0.0), fast_config(LONG));
    rig.door.open_door().unwrap();
    rig.door.close_door().unwrap();

    let mut high = HashSet::new();
    for &(line, level) in rig.pins.lock().unwrap().iter() {
        match level {
            Level::High => {
                assert!(!high.contains(&line.other()), "both lines HIGH");
                high.insert(line);
            }
            Level::Low => {
                high.remove(&line);
            }
        }
    }
    assert!(high.is_empty(), "a line was left HIGH");
}

#[test]
fn unsubscribed_listener_hears_nothing() {
    let rig = rig(ScriptedSensor::new(&[0.3, 0.0], 0.0), fast_config(LONG));
    let extra = RecordingListener::default();
    let id = rig.door.subscribe(Arc::new(extra.clone())).unwrap();
    assert!(rig.door.unsubscribe(id));
    assert!(!rig.door.unsubscribe(id));

    rig.door.open_door().unwrap();
    rig.wait_for(Open);
    assert!(extra.events().is_empty());
    assert_eq!(rig.listener.events().len(), 2);
}

/// Closes the door as soon as it reports `Open`, from the monitor thread.
struct AutoClose(OnceLock<Weak<MockDoor>>);

impl StateListener for AutoClose {
    fn on_state_change(&self, _from: DoorState, to: DoorState) {
        if to == Open {
            if let Some(door) = self.0.get().and_then(Weak::upgrade) {
                door.close_door().unwrap();
            }
        }
    }
}

#[test]
fn listener_may_command_from_the_monitor_thread() {
    let sensor = ScriptedSensor::new(&[0.5, 0.0, 0.5, 0.0], 0.0);
    let (actuator, _pins) = mock_actuator();
    let door = Arc::new(DoorStateMachine::new(actuator, sensor, fast_config(LONG)).unwrap());

    let events = RecordingListener::default();
    door.subscribe(Arc::new(events.clone())).unwrap();
    let auto = Arc::new(AutoClose(OnceLock::new()));
    let _ = auto.0.set(Arc::downgrade(&door));
    door.subscribe(auto).unwrap();

    door.open_door().unwrap();
    wait_for_state(&door, Closed, Duration::from_secs(5));
    assert_eq!(
        events.events(),
        [(Closed, Opening), (Opening, Open), (Open, Closing), (Closing, Closed)]
    );
}

#[test]
fn commanding_listener_registered_first_does_not_reorder_events() {
    let sensor = ScriptedSensor::new(&[0.5, 0.0, 0.5, 0.0], 0.0);
    let (actuator, _pins) = mock_actuator();
    let door = Arc::new(DoorStateMachine::new(actuator, sensor, fast_config(LONG)).unwrap());

    let auto = Arc::new(AutoClose(OnceLock::new()));
    let _ = auto.0.set(Arc::downgrade(&door));
    door.subscribe(auto).unwrap();
    let events = RecordingListener::default();
    door.subscribe(Arc::new(events.clone())).unwrap();

    door.open_door().unwrap();
    wait_for_state(&door, Closed, Duration::from_secs(5));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(
        events.events(),
        [(Closed, Opening), (Opening, Open), (Open, Closing), (Closing, Closed)]
    );
}
