//! Mock hardware for integration tests.
//!
//! Recording GPIO pins and a scripted current sensor, so tests can drive
//! the real [`ActuatorDriver`] and [`DoorStateMachine`] and assert on the
//! full pin history and read pattern without touching hardware.

use core::convert::Infallible;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use doorctl::app::ports::{ActuatorLine, CurrentSensorPort, Level, StateListener};
use doorctl::config::DoorConfig;
use doorctl::drivers::actuator::ActuatorDriver;
use doorctl::error::SensorError;
use doorctl::fsm::DoorStateMachine;
use doorctl::fsm::states::DoorState;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

// ── GPIO ──────────────────────────────────────────────────────

pub type PinLog = Arc<Mutex<Vec<(ActuatorLine, Level)>>>;

pub struct RecordingPin {
    line: ActuatorLine,
    log: PinLog,
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.log.lock().unwrap().push((self.line, Level::Low));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.log.lock().unwrap().push((self.line, Level::High));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

// ── Current sensor ────────────────────────────────────────────

#[derive(Default)]
struct Script {
    queue: VecDeque<Result<f32, SensorError>>,
    tail: f32,
    readers: Vec<ThreadId>,
}

/// Replays queued readings, then repeats `tail`.  Clones share the script
/// so the test keeps a handle after the sensor moves into the door.
#[derive(Clone, Default)]
pub struct ScriptedSensor(Arc<Mutex<Script>>);

#[allow(dead_code)]
impl ScriptedSensor {
    pub fn new(readings: &[f32], tail: f32) -> Self {
        let sensor = Self::default();
        sensor.0.lock().unwrap().tail = tail;
        sensor.push(readings);
        sensor
    }

    pub fn push(&self, readings: &[f32]) {
        self.0.lock().unwrap().queue.extend(readings.iter().copied().map(Ok));
    }

    pub fn push_error(&self, e: SensorError) {
        self.0.lock().unwrap().queue.push_back(Err(e));
    }

    pub fn reads(&self) -> usize {
        self.0.lock().unwrap().readers.len()
    }

    /// Thread that performed each read, in order.
    pub fn readers(&self) -> Vec<ThreadId> {
        self.0.lock().unwrap().readers.clone()
    }
}

impl CurrentSensorPort for ScriptedSensor {
    fn read_current(&mut self) -> Result<f32, SensorError> {
        let mut script = self.0.lock().unwrap();
        script.readers.push(thread::current().id());
        let tail = script.tail;
        script.queue.pop_front().unwrap_or(Ok(tail))
    }
}

// ── Listener ──────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingListener(Arc<Mutex<Vec<(DoorState, DoorState)>>>);

impl RecordingListener {
    pub fn events(&self) -> Vec<(DoorState, DoorState)> {
        self.0.lock().unwrap().clone()
    }
}

impl StateListener for RecordingListener {
    fn on_state_change(&self, from: DoorState, to: DoorState) {
        self.0.lock().unwrap().push((from, to));
    }
}

// ── Door assembly ─────────────────────────────────────────────

pub type MockDoor = DoorStateMachine<ActuatorDriver<RecordingPin, NoopDelay>, ScriptedSensor>;

pub struct Rig {
    pub door: MockDoor,
    pub pins: PinLog,
    pub sensor: ScriptedSensor,
    pub listener: RecordingListener,
}

/// Millisecond pulses and polls; `max_actuation_ms` as given.
pub fn fast_config(max_actuation_ms: u32) -> DoorConfig {
    DoorConfig {
        pulse_ms: 1,
        poll_interval_ms: 2,
        max_actuation_ms,
        ..DoorConfig::default()
    }
}

/// Relay driver over recording pins; the log starts empty.
pub fn mock_actuator() -> (ActuatorDriver<RecordingPin, NoopDelay>, PinLog) {
    let pins: PinLog = Arc::default();
    let actuator = ActuatorDriver::new(
        RecordingPin {
            line: ActuatorLine::Open,
            log: Arc::clone(&pins),
        },
        RecordingPin {
            line: ActuatorLine::Close,
            log: Arc::clone(&pins),
        },
        NoopDelay,
    )
    .unwrap();
    pins.lock().unwrap().clear();
    (actuator, pins)
}

pub fn rig(sensor: ScriptedSensor, config: DoorConfig) -> Rig {
    let (actuator, pins) = mock_actuator();
    let door = DoorStateMachine::new(actuator, sensor.clone(), config).unwrap();
    let listener = RecordingListener::default();
    door.subscribe(Arc::new(listener.clone())).unwrap();
    Rig {
        door,
        pins,
        sensor,
        listener,
    }
}

impl Rig {
    /// Number of HIGH pulses seen on `line`.
    pub fn pulses(&self, line: ActuatorLine) -> usize {
        self.pins
            .lock()
            .unwrap()
            .iter()
            .filter(|&&(l, level)| l == line && level == Level::High)
            .count()
    }

    pub fn wait_for(&self, want: DoorState) {
        wait_for_state(&self.door, want, Duration::from_secs(5));
    }
}

pub fn wait_for_state(door: &MockDoor, want: DoorState, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while door.state() != want {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {want}, still {}",
            door.state()
        );
        thread::sleep(Duration::from_millis(1));
    }
}
