//! Sensor subsystem.
//!
//! [`ina219::Ina219`] measures the actuator motor current and is the
//! production [`CurrentSensorPort`](crate::app::ports::CurrentSensorPort);
//! [`probe::CurrentProbe`] drives it directly for bench sampling.

pub mod ina219;
pub mod probe;
