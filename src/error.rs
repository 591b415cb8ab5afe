//! Unified error types for the door controller.
//!
//! A single `Error` enum that every subsystem converts into, so callers of
//! the state machine handle one type.  All variants are `Copy` so they can
//! be returned from the command path and the monitor thread without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The current sensor could not be read or configured.
    Sensor(SensorError),
    /// An actuator line could not be driven.
    Actuator(ActuatorError),
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
    /// The motion monitor thread could not be created.
    Spawn,
    /// The listener registry is at capacity.
    ListenersFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn => write!(f, "monitor thread spawn failed"),
            Self::ListenersFull => write!(f, "listener registry full"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C register read failed (NACK, arbitration loss, bus fault).
    I2cReadFailed,
    /// I2C register write failed.
    I2cWriteFailed,
    /// The INA219 math overflow flag is set; current/power are invalid.
    Overflow,
    /// Shunt/current parameters produce an unusable calibration value.
    InvalidCalibration,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2cReadFailed => write!(f, "I2C read failed"),
            Self::I2cWriteFailed => write!(f, "I2C write failed"),
            Self::Overflow => write!(f, "math overflow"),
            Self::InvalidCalibration => write!(f, "invalid calibration"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl std::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
