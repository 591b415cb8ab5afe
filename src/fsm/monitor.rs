//! Current-sensing motion monitor.
//!
//! The door has no end-of-travel switches.  Motion is inferred from the
//! actuator motor's current draw: a rising edge above the threshold marks
//! the start of travel and the following falling edge marks its end.  A
//! timeout bounds the transient phase when no edge is ever seen (sensor
//! fault, jammed mechanism, motor never started).
//!
//! ```text
//!  current
//!    ▲        ┌──────────────┐
//!    │        │              │
//!  th┼ ─ ─ ─ ─│─ ─ ─ ─ ─ ─ ─ │─ ─ ─   motion latched on the rise,
//!    │  ──────┘              └─────   completion on the fall
//!    └──────────────────────────────▶ t
//! ```
//!
//! [`MotionDetector`] is the pure decision step; [`MotionMonitor`] is the
//! polling loop run on the monitor thread.

use core::time::Duration;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use log::{debug, error};

use super::cancel::CancelToken;
use crate::app::ports::CurrentSensorPort;
use crate::config::DoorConfig;

/// Why the monitor stopped polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// Current fell back to or below the threshold after exceeding it.
    Stopped,
    /// Maximum actuation time elapsed without a falling edge.
    TimedOut,
}

/// Rising/falling-edge detector with a timeout fallback.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    threshold_amps: f32,
    max_actuation: Duration,
    motion_detected: bool,
}

impl MotionDetector {
    pub fn new(threshold_amps: f32, max_actuation: Duration) -> Self {
        Self {
            threshold_amps,
            max_actuation,
            motion_detected: false,
        }
    }

    pub fn from_config(config: &DoorConfig) -> Self {
        Self::new(config.current_threshold_amps, config.max_actuation())
    }

    /// Whether current above the threshold has been seen.
    pub fn motion_detected(&self) -> bool {
        self.motion_detected
    }

    /// Feed one poll result.  `reading` is `None` when the sensor read
    /// failed; `elapsed` is measured from the start of monitoring.
    ///
    /// Returns `Some` when monitoring should end.
    pub fn observe(&mut self, reading: Option<f32>, elapsed: Duration) -> Option<MotionOutcome> {
        if let Some(amps) = reading {
            if amps > self.threshold_amps {
                self.motion_detected = true;
            } else if amps <= self.threshold_amps && self.motion_detected {
                return Some(MotionOutcome::Stopped);
            }
            // NaN compares false both ways and falls through to the timeout.
        }

        if elapsed > self.max_actuation {
            Some(MotionOutcome::TimedOut)
        } else {
            None
        }
    }
}

/// One monitoring run, bound to a single door command.
pub struct MotionMonitor<S> {
    sensor: Arc<Mutex<S>>,
    detector: MotionDetector,
    poll_interval: Duration,
    cancel: CancelToken,
}

impl<S: CurrentSensorPort> MotionMonitor<S> {
    pub fn new(
        sensor: Arc<Mutex<S>>,
        detector: MotionDetector,
        poll_interval: Duration,
        cancel: CancelToken,
    ) -> Self {
        Self {
            sensor,
            detector,
            poll_interval,
            cancel,
        }
    }

    /// Poll until motion stops, the timeout expires, or the run is
    /// cancelled (`None`).  A read already in progress completes first, but
    /// its outcome is dropped if the run was cancelled meanwhile.
    pub fn run(mut self) -> Option<MotionOutcome> {
        let started = Instant::now();
        let mut polls: u32 = 0;

        loop {
            if !self.cancel.sleep(self.poll_interval) {
                debug!("Motion monitor cancelled after {} polls", polls);
                return None;
            }
            polls = polls.saturating_add(1);

            let reading = match self
                .sensor
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .read_current()
            {
                Ok(amps) => {
                    debug!("poll {}: {:.3} A", polls, amps);
                    Some(amps)
                }
                Err(e) => {
                    error!("Error reading actuator current: {}", e);
                    None
                }
            };

            if self.cancel.is_cancelled() {
                debug!("Motion monitor cancelled during poll {}", polls);
                return None;
            }

            if let Some(outcome) = self.detector.observe(reading, started.elapsed()) {
                debug!(
                    "Motion monitor finished: {:?} after {} polls ({} ms)",
                    outcome,
                    polls,
                    started.elapsed().as_millis()
                );
                return Some(outcome);
            }
        }
    }
}
