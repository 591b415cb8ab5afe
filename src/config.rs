//! System configuration parameters
//!
//! All tunable parameters for the door controller.  The current threshold
//! and actuation timeout are hardware-calibration values (measure them with
//! [`CurrentProbe`](crate::sensors::probe::CurrentProbe)), not core logic.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sensors::ina219::{self, AdcSetting, BusRange, Gain};

/// Core door controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    // --- Actuation ---
    /// Width of the relay pulse on either line (milliseconds)
    pub pulse_ms: u32,

    // --- Motion monitor ---
    /// Interval between current samples while the door moves (milliseconds)
    pub poll_interval_ms: u32,
    /// Current (amperes) above which the actuator motor is considered running
    pub current_threshold_amps: f32,
    /// Upper bound on one actuation before the target state is forced (milliseconds)
    pub max_actuation_ms: u32,
    /// Stack size for the monitor thread (KiB)
    pub monitor_stack_kb: usize,

    // --- Sensor ---
    pub ina219: Ina219Config,
}

/// INA219 power monitor parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Ina219Config {
    /// 7-bit I2C address (0x40 with A0/A1 grounded)
    pub address: u8,
    /// Shunt resistance in ohms
    pub shunt_ohms: f32,
    /// Largest current the calibration must represent (amperes)
    pub max_expected_amps: f32,
    pub bus_range: BusRange,
    pub gain: Gain,
    pub bus_adc: AdcSetting,
    pub shunt_adc: AdcSetting,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            pulse_ms: 100,

            // 10 Hz
            poll_interval_ms: 100,
            current_threshold_amps: 0.1,
            // Measured full travel is well under 50 s.
            max_actuation_ms: 50_000,
            monitor_stack_kb: 8,

            ina219: Ina219Config::default(),
        }
    }
}

impl Default for Ina219Config {
    fn default() -> Self {
        Self {
            address: 0x40,
            shunt_ohms: 0.1,
            max_expected_amps: 3.2,
            bus_range: BusRange::V16,
            gain: Gain::Div8,
            bus_adc: AdcSetting::Bits12,
            shunt_adc: AdcSetting::Samples128,
        }
    }
}

impl DoorConfig {
    /// Parse a JSON document and validate it.  Missing fields take their
    /// default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the controller misbehave.  Invalid
    /// ranges are rejected, never clamped.
    pub fn validate(&self) -> Result<()> {
        if self.pulse_ms == 0 {
            return Err(Error::Config("pulse_ms must be non-zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be non-zero"));
        }
        if !(self.current_threshold_amps.is_finite() && self.current_threshold_amps >= 0.0) {
            return Err(Error::Config("current_threshold_amps must be finite and >= 0"));
        }
        if self.max_actuation_ms < self.poll_interval_ms {
            return Err(Error::Config("max_actuation_ms must be >= poll_interval_ms"));
        }
        if self.monitor_stack_kb < 2 {
            return Err(Error::Config("monitor_stack_kb must be >= 2"));
        }
        self.ina219.validate()
    }

    pub fn pulse(&self) -> Duration {
        Duration::from_millis(u64::from(self.pulse_ms))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }

    pub fn max_actuation(&self) -> Duration {
        Duration::from_millis(u64::from(self.max_actuation_ms))
    }
}

impl Ina219Config {
    pub fn validate(&self) -> Result<()> {
        if !(0x40..=0x4F).contains(&self.address) {
            return Err(Error::Config("ina219.address must be in 0x40..=0x4F"));
        }
        if !(self.shunt_ohms.is_finite() && self.shunt_ohms > 0.0) {
            return Err(Error::Config("ina219.shunt_ohms must be > 0"));
        }
        if !(self.max_expected_amps.is_finite() && self.max_expected_amps > 0.0) {
            return Err(Error::Config("ina219.max_expected_amps must be > 0"));
        }
        // Largest shunt drop must fit the selected PGA range.  The default
        // 3.2 A * 0.1 ohm sits exactly at full scale, so allow f32 rounding.
        let drop = self.max_expected_amps * self.shunt_ohms;
        if drop > self.gain.full_scale_volts() * (1.0 + 1e-4) {
            return Err(Error::Config("ina219.gain range below max shunt voltage"));
        }
        ina219::calibration(self.shunt_ohms, self.max_expected_amps)
            .map_err(|_| Error::Config("ina219 calibration out of range"))?;
        Ok(())
    }
}
