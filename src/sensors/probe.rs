//! Bench sampler for the actuator current monitor.
//!
//! Reads the INA219 at a fixed interval for a fixed duration and emits one
//! tab-separated row per sample, preceded by a header line.  Used while
//! tuning the motion threshold: run it, move the door by hand or with a
//! command, and paste the output into a spreadsheet.
//!
//! ```text
//! Time    Current   Bus        Shunt
//! 0       0.001953  12.004000  0.000190
//! 100     0.412109  11.872000  0.041210
//! ```

use core::fmt::Write as _;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{error, info};

use super::ina219::Ina219;
use crate::error::SensorError;

/// Formatted line buffer.  Four numeric columns fit comfortably.
pub type Line = heapless::String<96>;

/// What to sample and for how long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeOptions {
    pub duration: Duration,
    pub interval: Duration,
    pub bus_voltage: bool,
    pub shunt_voltage: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
            interval: Duration::from_millis(100),
            bus_voltage: false,
            shunt_voltage: false,
        }
    }
}

impl ProbeOptions {
    /// Number of sample slots in the run (at least one).
    pub fn samples(&self) -> u64 {
        let interval = self.interval.as_millis().max(1);
        let n = self.duration.as_millis().div_ceil(interval);
        u64::try_from(n).unwrap_or(u64::MAX).max(1)
    }

    pub fn header(&self) -> Line {
        let mut line = Line::new();
        let _ = line.push_str("Time\tCurrent");
        if self.bus_voltage {
            let _ = line.push_str("\tBus");
        }
        if self.shunt_voltage {
            let _ = line.push_str("\tShunt");
        }
        line
    }
}

/// One sample.  Voltage columns are `None` when not requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeRow {
    pub elapsed_ms: u64,
    pub current: f32,
    pub bus: Option<f32>,
    pub shunt: Option<f32>,
}

impl ProbeRow {
    pub fn to_line(&self) -> Line {
        let mut line = Line::new();
        let _ = write!(line, "{}\t{:.6}", self.elapsed_ms, self.current);
        if let Some(v) = self.bus {
            let _ = write!(line, "\t{:.6}", v);
        }
        if let Some(v) = self.shunt {
            let _ = write!(line, "\t{:.6}", v);
        }
        line
    }
}

pub struct CurrentProbe<'a, I2C, D> {
    sensor: &'a mut Ina219<I2C>,
    delay: D,
}

impl<'a, I2C: I2c, D: DelayNs> CurrentProbe<'a, I2C, D> {
    pub fn new(sensor: &'a mut Ina219<I2C>, delay: D) -> Self {
        Self { sensor, delay }
    }

    /// Take one sample with the columns `opts` asks for.
    pub fn sample(
        &mut self,
        opts: &ProbeOptions,
        elapsed_ms: u64,
    ) -> Result<ProbeRow, SensorError> {
        let current = self.sensor.read_current()?;
        let bus = if opts.bus_voltage {
            Some(self.sensor.read_bus_voltage()?)
        } else {
            None
        };
        let shunt = if opts.shunt_voltage {
            Some(self.sensor.read_shunt_voltage()?)
        } else {
            None
        };
        Ok(ProbeRow {
            elapsed_ms,
            current,
            bus,
            shunt,
        })
    }

    /// Run the whole session, handing the header and each row to `emit`.
    /// A failed sample is logged and skipped.  Returns the number of rows
    /// emitted.
    pub fn run(&mut self, opts: &ProbeOptions, mut emit: impl FnMut(&str)) -> u64 {
        let interval_ms = u64::try_from(opts.interval.as_millis()).unwrap_or(u64::MAX);
        let slots = opts.samples();
        info!(
            "Probing current for {} ms every {} ms",
            opts.duration.as_millis(),
            interval_ms
        );

        emit(&opts.header());
        let mut emitted = 0;
        for i in 0..slots {
            let elapsed_ms = i.saturating_mul(interval_ms);
            match self.sample(opts, elapsed_ms) {
                Ok(row) => {
                    emit(&row.to_line());
                    emitted += 1;
                }
                Err(e) => error!("Probe sample at {} ms failed: {}", elapsed_ms, e),
            }
            if i + 1 < slots {
                self.delay.delay_ms(u32::try_from(interval_ms).unwrap_or(u32::MAX));
            }
        }
        info!("Probe finished: {}/{} samples", emitted, slots);
        emitted
    }
}
