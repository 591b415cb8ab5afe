//! Latching relay driver (DPDT latching relay, two coil lines).
//!
//! A momentary HIGH pulse on the open line latches the relay so the motor
//! drives the door open; a pulse on the close line latches it the other
//! way.  The relay holds its position with both lines LOW.
//!
//! ## Safety contract
//!
//! Both coils must never be energised together.  Every operation forces
//! the other line LOW first, and all of them run under one lock shared by
//! every clone of the driver, so no two actuations interleave mid-pulse.
//! Other code that needs the same pins goes through
//! [`ActuatorDriver::with_lines`] to take that lock too.

use core::time::Duration;
use std::sync::{Arc, Mutex, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin};
use log::{debug, error};

use crate::app::ports::{ActuatorLine, ActuatorPort, Level};
use crate::error::ActuatorError;

/// The two relay coil outputs.
pub struct RelayLines<P> {
    open: P,
    close: P,
}

impl<P: OutputPin> RelayLines<P> {
    /// Drive `line` to `level`.  Raising a line first lowers the other one.
    pub fn set_level(&mut self, line: ActuatorLine, level: Level) -> Result<(), ActuatorError> {
        if level == Level::High {
            Self::write(self.pin_mut(line.other()), Level::Low)?;
        }
        Self::write(self.pin_mut(line), level)
    }

    /// Both coils de-energised.
    pub fn all_low(&mut self) -> Result<(), ActuatorError> {
        Self::write(&mut self.open, Level::Low)?;
        Self::write(&mut self.close, Level::Low)
    }

    fn pin_mut(&mut self, line: ActuatorLine) -> &mut P {
        match line {
            ActuatorLine::Open => &mut self.open,
            ActuatorLine::Close => &mut self.close,
        }
    }

    fn write(pin: &mut P, level: Level) -> Result<(), ActuatorError> {
        let res = match level {
            Level::Low => pin.set_low(),
            Level::High => pin.set_high(),
        };
        res.map_err(|e| {
            error!("GPIO write {:?} failed: {:?}", level, e.kind());
            ActuatorError::GpioWriteFailed
        })
    }
}

/// Exclusive owner of the relay lines.  Cheap to clone; clones share the
/// lines and the lock.
pub struct ActuatorDriver<P, D> {
    lines: Arc<Mutex<RelayLines<P>>>,
    delay: D,
}

impl<P, D: Clone> Clone for ActuatorDriver<P, D> {
    fn clone(&self) -> Self {
        Self {
            lines: Arc::clone(&self.lines),
            delay: self.delay.clone(),
        }
    }
}

impl<P: OutputPin, D: DelayNs> ActuatorDriver<P, D> {
    /// Take ownership of both lines and drive them LOW.
    pub fn new(open: P, close: P, delay: D) -> Result<Self, ActuatorError> {
        let mut lines = RelayLines { open, close };
        lines.all_low()?;
        Ok(Self {
            lines: Arc::new(Mutex::new(lines)),
            delay,
        })
    }

    /// Run `f` with exclusive access to the lines.
    pub fn with_lines<R>(&self, f: impl FnOnce(&mut RelayLines<P>) -> R) -> R {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut lines)
    }
}

impl<P: OutputPin, D: DelayNs> ActuatorPort for ActuatorDriver<P, D> {
    fn pulse(&mut self, line: ActuatorLine, duration: Duration) -> Result<(), ActuatorError> {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);

        lines.all_low()?;
        if let Err(e) = lines.set_level(line, Level::High) {
            // Best effort: never leave a coil energised after a failure.
            let _ = lines.all_low();
            return Err(e);
        }
        debug!("{:?} line HIGH for {} ms", line, duration.as_millis());
        self.delay
            .delay_us(u32::try_from(duration.as_micros()).unwrap_or(u32::MAX));
        lines.set_level(line, Level::Low)
    }

    fn set_level(&mut self, line: ActuatorLine, level: Level) -> Result<(), ActuatorError> {
        self.with_lines(|lines| lines.set_level(line, level))
    }
}

/// Blocking delay backed by `std::thread::sleep` (FreeRTOS `vTaskDelay`
/// under ESP-IDF std).
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
