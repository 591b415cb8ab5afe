//! Actuator drivers and thread helpers.

pub mod actuator;
pub mod task_pin;
