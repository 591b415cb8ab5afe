//! Line-oriented serial console.
//!
//! One request per line:
//!
//! ```text
//! open | close             pulse the line, reply with the new status
//! state | status           reply with the current status
//! current                  one motor current reading in amps
//! probe [secs] [-bv] [-sv] sample the current sensor (default 10 s)
//! help | ?                 list commands
//! ```
//!
//! Status replies use the same JSON shape as state notifications.

use core::fmt;
use core::str::FromStr;
use core::time::Duration;

use log::warn;

use crate::app::commands::DoorCommand;
use crate::app::ports::{ActuatorPort, CurrentSensorPort};
use crate::fsm::DoorStateMachine;
use crate::sensors::probe::ProbeOptions;

pub const HELP: &str =
    "commands: open | close | state | current | probe [secs] [-bv] [-sv] | help";

/// Longest probe session the console accepts.
pub const MAX_PROBE_SECS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleRequest {
    Door(DoorCommand),
    Status,
    Current,
    Probe(ProbeOptions),
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    Empty,
    Unknown,
    BadArgument(&'static str),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::Unknown => write!(f, "unknown command (try \"help\")"),
            Self::BadArgument(msg) => write!(f, "bad argument: {msg}"),
        }
    }
}

impl FromStr for ConsoleRequest {
    type Err = ConsoleError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().ok_or(ConsoleError::Empty)?;

        if let Ok(cmd) = head.parse::<DoorCommand>() {
            return match words.next() {
                None => Ok(Self::Door(cmd)),
                Some(_) => Err(ConsoleError::BadArgument("door commands take no arguments")),
            };
        }

        match head.to_ascii_lowercase().as_str() {
            "state" | "status" => Ok(Self::Status),
            "current" => Ok(Self::Current),
            "help" | "?" => Ok(Self::Help),
            "probe" => parse_probe(words).map(Self::Probe),
            _ => Err(ConsoleError::Unknown),
        }
    }
}

fn parse_probe<'a>(args: impl Iterator<Item = &'a str>) -> Result<ProbeOptions, ConsoleError> {
    let mut opts = ProbeOptions::default();
    for arg in args {
        match arg {
            "-bv" => opts.bus_voltage = true,
            "-sv" => opts.shunt_voltage = true,
            secs => {
                let secs: u64 = secs
                    .parse()
                    .map_err(|_| ConsoleError::BadArgument("duration must be whole seconds"))?;
                if secs == 0 || secs > MAX_PROBE_SECS {
                    return Err(ConsoleError::BadArgument("duration out of range"));
                }
                opts.duration = Duration::from_secs(secs);
            }
        }
    }
    Ok(opts)
}

/// Execute `request` and write the reply lines to `out`.
///
/// `probe` runs with exclusive access to the sensor; it is not called while
/// a motion monitor is running, and door commands wait until it returns.
pub fn respond<A, S>(
    door: &DoorStateMachine<A, S>,
    request: ConsoleRequest,
    out: &mut dyn FnMut(&str),
    probe: impl FnOnce(&mut S, &ProbeOptions, &mut dyn FnMut(&str)),
) where
    A: ActuatorPort,
    S: CurrentSensorPort + Send + 'static,
{
    match request {
        ConsoleRequest::Door(cmd) => match door.handle_command(cmd) {
            Ok(()) => out(&door.status().to_json()),
            Err(e) => {
                warn!("Console {:?} rejected: {}", cmd, e);
                out(&format!("error: {e}"));
            }
        },
        ConsoleRequest::Status => out(&door.status().to_json()),
        ConsoleRequest::Help => out(HELP),
        ConsoleRequest::Current => match door.read_current() {
            Ok(amps) => out(&format!("{amps:.3} A")),
            Err(e) => {
                warn!("Console current read failed: {}", e);
                out(&format!("error: {e}"));
            }
        },
        ConsoleRequest::Probe(opts) => {
            if door
                .with_idle_sensor(|sensor| probe(sensor, &opts, &mut *out))
                .is_none()
            {
                out("busy");
            }
        }
    }
}
