//! Door state machine.
//!
//! ```text
//!            open_door()                monitor: falling edge / timeout
//!  Closed ───────────────▶ Opening ───────────────────────────────▶ Open
//!    ▲                      │  ▲                                     │
//!    │          close_door()│  │open_door()                          │
//!    │                      ▼  │                                     │
//!    └─────────────────── Closing ◀──────────────────────────────────┘
//!  monitor: falling edge / timeout            close_door()
//! ```
//!
//! Two threads of control touch the state:
//!
//! - the **command thread** (callers of [`DoorStateMachine::open_door`] /
//!   [`DoorStateMachine::close_door`]) holds the command lock for the whole
//!   cancel → pulse → spawn sequence and commits `Opening`/`Closing`;
//! - at most one **monitor thread** commits `Open`/`Closed` and exits.
//!
//! Every commit is appended to a per-instance delivery queue under the
//! state mutex.  Whichever thread finds no delivery in progress drains the
//! queue; any other committer (including a listener that issues a command
//! from inside its callback) only enqueues.  Listeners therefore run
//! outside the state mutex yet see transitions in commit order.

pub mod cancel;
pub mod monitor;
pub mod states;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};

use crate::app::commands::DoorCommand;
use crate::app::events::DoorStatus;
use crate::app::observers::{ListenerId, ObserverSet};
use crate::app::ports::{ActuatorLine, ActuatorPort, CurrentSensorPort, StateListener};
use crate::config::DoorConfig;
use crate::drivers::task_pin::{self, Core};
use crate::error::{Error, Result};
use cancel::CancelToken;
use monitor::{MotionDetector, MotionMonitor, MotionOutcome};
use states::DoorState;

/// FreeRTOS priority for the monitor task (above idle, below protocol stacks).
const MONITOR_PRIORITY: u8 = 5;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Shared state (command thread + monitor thread)
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StateCell {
    state: DoorState,
    /// Committed transitions not yet delivered, oldest first.
    pending: VecDeque<(DoorState, DoorState)>,
    delivering: bool,
}

struct Shared {
    cell: Mutex<StateCell>,
    observers: ObserverSet,
}

/// Releases the delivery role if a listener panics mid-delivery.
struct DeliveryGuard<'a>(&'a Shared);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            let mut cell = lock(&self.0.cell);
            cell.delivering = false;
            cell.pending.clear();
        }
    }
}

impl Shared {
    fn state(&self) -> DoorState {
        lock(&self.cell).state
    }

    /// The single state-mutation path for commands and monitors alike.
    fn transition(&self, to: DoorState) {
        {
            let mut cell = lock(&self.cell);
            let from = core::mem::replace(&mut cell.state, to);
            if from == to {
                debug!("Door state unchanged: {}", to);
                return;
            }
            info!("Door state: {} -> {}", from, to);
            cell.pending.push_back((from, to));
            if cell.delivering {
                // The delivering thread picks this up after its current round.
                return;
            }
            cell.delivering = true;
        }

        let _guard = DeliveryGuard(self);
        loop {
            let (from, to) = {
                let mut cell = lock(&self.cell);
                match cell.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        cell.delivering = false;
                        return;
                    }
                }
            };
            self.observers.notify(from, to);
        }
    }
}

// ---------------------------------------------------------------------------
// Monitor handle
// ---------------------------------------------------------------------------

struct MonitorHandle {
    cancel: CancelToken,
    thread: JoinHandle<()>,
    target: DoorState,
}

impl MonitorHandle {
    /// Request cancellation and wait for the monitor thread to exit.
    fn cancel_and_join(self) {
        self.cancel.cancel();

        // A listener running on the monitor thread issued this command; the
        // monitor has already committed and is unwinding, so there is
        // nothing to wait for (joining would deadlock).
        if self.thread.thread().id() == thread::current().id() {
            return;
        }

        if self.thread.join().is_err() {
            warn!(
                "Motion monitor toward {} panicked; treating it as exited",
                self.target
            );
        }
    }
}

// ---------------------------------------------------------------------------
// DoorStateMachine
// ---------------------------------------------------------------------------

/// Held under the command lock.
struct Control<A> {
    actuator: A,
    monitor: Option<MonitorHandle>,
}

/// Owns the door state, drives the relay lines and supervises the motion
/// monitor.  One instance per physical door; share it behind an `Arc`.
pub struct DoorStateMachine<A, S> {
    control: Mutex<Control<A>>,
    shared: Arc<Shared>,
    sensor: Arc<Mutex<S>>,
    config: DoorConfig,
}

impl<A, S> DoorStateMachine<A, S>
where
    A: ActuatorPort,
    S: CurrentSensorPort + Send + 'static,
{
    /// Build a state machine in the `Closed` state.  No line is pulsed and
    /// no monitor runs until the first command.
    pub fn new(actuator: A, sensor: S, config: DoorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            control: Mutex::new(Control {
                actuator,
                monitor: None,
            }),
            shared: Arc::new(Shared {
                cell: Mutex::new(StateCell::default()),
                observers: ObserverSet::new(),
            }),
            sensor: Arc::new(Mutex::new(sensor)),
            config,
        })
    }

    // ── Commands ──────────────────────────────────────────────

    /// Pulse the open line and monitor travel toward `Open`.
    ///
    /// Blocks while the previous monitor winds down and for the pulse width.
    /// If the monitor thread cannot be started the door is committed to
    /// `Open` straight away and [`Error::Spawn`] is returned.
    pub fn open_door(&self) -> Result<()> {
        self.actuate(DoorCommand::Open)
    }

    /// Pulse the close line and monitor travel toward `Closed`.
    pub fn close_door(&self) -> Result<()> {
        self.actuate(DoorCommand::Close)
    }

    pub fn handle_command(&self, cmd: DoorCommand) -> Result<()> {
        self.actuate(cmd)
    }

    // ── Queries ───────────────────────────────────────────────

    /// Latest committed state.  Never waits on a running command.
    pub fn state(&self) -> DoorState {
        self.shared.state()
    }

    pub fn status(&self) -> DoorStatus {
        DoorStatus::new(self.state())
    }

    pub fn config(&self) -> &DoorConfig {
        &self.config
    }

    /// One current reading, taken between monitor polls.
    pub fn read_current(&self) -> Result<f32> {
        Ok(lock(&self.sensor).read_current()?)
    }

    /// Run `f` with exclusive access to the current sensor if no motion
    /// monitor is running; `None` otherwise.
    ///
    /// The command lock is held for the whole call, so a command issued
    /// meanwhile waits until `f` returns instead of starting a monitor that
    /// could not read the sensor.
    pub fn with_idle_sensor<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        let control = lock(&self.control);
        if control.monitor.as_ref().is_some_and(|m| !m.thread.is_finished()) {
            return None;
        }
        let result = f(&mut lock(&self.sensor));
        drop(control);
        Some(result)
    }

    /// Whether a motion monitor is still polling.  Waits for any command
    /// in progress.
    pub fn is_monitoring(&self) -> bool {
        lock(&self.control)
            .monitor
            .as_ref()
            .is_some_and(|m| !m.thread.is_finished())
    }

    // ── Observers ─────────────────────────────────────────────

    pub fn subscribe(&self, listener: Arc<dyn StateListener>) -> Result<ListenerId> {
        self.shared.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.shared.observers.unsubscribe(id)
    }

    // ── Internal ──────────────────────────────────────────────

    fn actuate(&self, cmd: DoorCommand) -> Result<()> {
        let mut control = lock(&self.control);

        if let Some(previous) = control.monitor.take() {
            debug!("Cancelling motion monitor toward {}", previous.target);
            previous.cancel_and_join();
        }

        let line = match cmd {
            DoorCommand::Open => ActuatorLine::Open,
            DoorCommand::Close => ActuatorLine::Close,
        };
        info!("Door {:?}: pulsing {:?} line for {} ms", cmd, line, self.config.pulse_ms);
        control
            .actuator
            .pulse(line, self.config.pulse())
            .inspect_err(|e| error!("Actuation failed: {}", e))?;

        self.shared.transition(cmd.moving_state());
        match self.spawn_monitor(cmd.target_state()) {
            Ok(monitor) => {
                control.monitor = Some(monitor);
                Ok(())
            }
            Err(e) => {
                // The relay has latched; without a monitor nothing would ever
                // leave the transient state.
                warn!("No motion monitor; assuming {}", cmd.target_state());
                self.shared.transition(cmd.target_state());
                Err(e)
            }
        }
    }

    fn spawn_monitor(&self, target: DoorState) -> Result<MonitorHandle> {
        let cancel = CancelToken::new();
        let monitor = MotionMonitor::new(
            Arc::clone(&self.sensor),
            MotionDetector::from_config(&self.config),
            self.config.poll_interval(),
            cancel.clone(),
        );
        let shared = Arc::clone(&self.shared);
        let max_actuation_ms = self.config.max_actuation_ms;

        let thread = task_pin::spawn_on_core(
            Core::App,
            MONITOR_PRIORITY,
            self.config.monitor_stack_kb,
            "door-monitor\0",
            move || match monitor.run() {
                Some(MotionOutcome::Stopped) => shared.transition(target),
                Some(MotionOutcome::TimedOut) => {
                    warn!(
                        "No end-of-travel current edge within {} ms; assuming {}",
                        max_actuation_ms, target
                    );
                    shared.transition(target);
                }
                None => {}
            },
        )
        .map_err(|e| {
            error!("Failed to spawn motion monitor: {}", e);
            Error::Spawn
        })?;

        Ok(MonitorHandle {
            cancel,
            thread,
            target,
        })
    }
}

impl<A, S> Drop for DoorStateMachine<A, S> {
    fn drop(&mut self) {
        let control = self
            .control
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(monitor) = control.monitor.take() {
            monitor.cancel_and_join();
        }
    }
}
