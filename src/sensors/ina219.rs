//! INA219 high-side current / power monitor driver (I2C).
//!
//! Measures the actuator motor current through a shunt resistor.  At
//! construction the driver programs the configuration register (bus range,
//! PGA gain, ADC resolution/averaging, continuous shunt+bus conversion) and
//! the calibration register derived from the shunt value and the largest
//! expected current, so the chip's current register reads directly in
//! multiples of [`Ina219::current_lsb`].
//!
//! Register map (all big-endian 16-bit):
//!
//! | Addr | Register      |
//! |------|---------------|
//! | 0x00 | Configuration |
//! | 0x01 | Shunt voltage |
//! | 0x02 | Bus voltage   |
//! | 0x03 | Power         |
//! | 0x04 | Current       |
//! | 0x05 | Calibration   |

use embedded_hal::i2c::{Error as _, I2c};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::CurrentSensorPort;
use crate::config::Ina219Config;
use crate::error::SensorError;

pub const REG_CONFIG: u8 = 0x00;
pub const REG_SHUNT_VOLTAGE: u8 = 0x01;
pub const REG_BUS_VOLTAGE: u8 = 0x02;
pub const REG_CURRENT: u8 = 0x04;
pub const REG_CALIBRATION: u8 = 0x05;

/// Continuous shunt and bus conversion.
const MODE_SHUNT_BUS_CONTINUOUS: u16 = 0b111;
/// Fixed scaling constant from the datasheet calibration equation.
const CAL_SCALE: f32 = 0.040_96;
const SHUNT_LSB_VOLTS: f32 = 10e-6;
const BUS_LSB_VOLTS: f32 = 4e-3;
const BUS_OVF: u16 = 0b01;

/// Bus voltage full-scale range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusRange {
    V16,
    V32,
}

/// Shunt PGA gain and range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gain {
    /// ±40 mV
    Div1,
    /// ±80 mV
    Div2,
    /// ±160 mV
    Div4,
    /// ±320 mV
    Div8,
}

impl Gain {
    pub fn full_scale_volts(self) -> f32 {
        match self {
            Self::Div1 => 0.04,
            Self::Div2 => 0.08,
            Self::Div4 => 0.16,
            Self::Div8 => 0.32,
        }
    }

    fn bits(self) -> u16 {
        match self {
            Self::Div1 => 0b00,
            Self::Div2 => 0b01,
            Self::Div4 => 0b10,
            Self::Div8 => 0b11,
        }
    }
}

/// ADC resolution (single sample) or averaging (12-bit samples).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum AdcSetting {
    Bits9 = 0x0,
    Bits10 = 0x1,
    Bits11 = 0x2,
    Bits12 = 0x3,
    Samples2 = 0x9,
    Samples4 = 0xA,
    Samples8 = 0xB,
    Samples16 = 0xC,
    Samples32 = 0xD,
    Samples64 = 0xE,
    Samples128 = 0xF,
}

/// Configuration register value for the given settings.
pub fn config_register(cfg: &Ina219Config) -> u16 {
    let brng = match cfg.bus_range {
        BusRange::V16 => 0,
        BusRange::V32 => 1,
    };
    (brng << 13)
        | (cfg.gain.bits() << 11)
        | ((cfg.bus_adc as u16) << 7)
        | ((cfg.shunt_adc as u16) << 3)
        | MODE_SHUNT_BUS_CONTINUOUS
}

/// Calibration register value and the resulting current LSB (A/bit).
pub fn calibration(shunt_ohms: f32, max_expected_amps: f32) -> Result<(u16, f32), SensorError> {
    let ideal_lsb = max_expected_amps / 32_768.0;
    let cal = (CAL_SCALE / (ideal_lsb * shunt_ohms)).trunc();
    if !(cal.is_finite() && cal >= 2.0 && cal <= f32::from(u16::MAX)) {
        return Err(SensorError::InvalidCalibration);
    }
    // Bit 0 is read-only and always zero.
    let cal = (cal as u16) & !1;
    let current_lsb = CAL_SCALE / (f32::from(cal) * shunt_ohms);
    Ok((cal, current_lsb))
}

pub struct Ina219<I2C> {
    i2c: I2C,
    address: u8,
    calibration: u16,
    current_lsb: f32,
}

impl<I2C: I2c> Ina219<I2C> {
    /// Program configuration and calibration registers.
    pub fn new(i2c: I2C, cfg: &Ina219Config) -> Result<Self, SensorError> {
        let (calibration, current_lsb) = calibration(cfg.shunt_ohms, cfg.max_expected_amps)?;
        let mut dev = Self {
            i2c,
            address: cfg.address,
            calibration,
            current_lsb,
        };
        dev.write_register(REG_CONFIG, config_register(cfg))?;
        dev.write_register(REG_CALIBRATION, calibration)?;
        info!(
            "INA219 @0x{:02x}: cal={} lsb={:.3e} A",
            dev.address, calibration, current_lsb
        );
        Ok(dev)
    }

    pub fn calibration(&self) -> u16 {
        self.calibration
    }

    pub fn current_lsb(&self) -> f32 {
        self.current_lsb
    }

    /// Current through the shunt in amperes (signed).
    pub fn read_current(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_CURRENT)? as i16;
        Ok(f32::from(raw) * self.current_lsb)
    }

    /// Bus voltage in volts.  Fails with [`SensorError::Overflow`] when the
    /// conversion overflowed.
    pub fn read_bus_voltage(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_BUS_VOLTAGE)?;
        if raw & BUS_OVF != 0 {
            return Err(SensorError::Overflow);
        }
        Ok(f32::from(raw >> 3) * BUS_LSB_VOLTS)
    }

    /// Shunt voltage in volts (signed).
    pub fn read_shunt_voltage(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_SHUNT_VOLTAGE)? as i16;
        Ok(f32::from(raw) * SHUNT_LSB_VOLTS)
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|e| {
                warn!("INA219 read reg 0x{:02x}: {:?}", reg, e.kind());
                SensorError::I2cReadFailed
            })?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_register(&mut self, reg: u8, value: u16) -> Result<(), SensorError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c.write(self.address, &[reg, hi, lo]).map_err(|e| {
            warn!("INA219 write reg 0x{:02x}: {:?}", reg, e.kind());
            SensorError::I2cWriteFailed
        })
    }
}

impl<I2C: I2c> CurrentSensorPort for Ina219<I2C> {
    fn read_current(&mut self) -> Result<f32, SensorError> {
        Ina219::read_current(self)
    }
}
