//! Door controller firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Adapters (outer ring)                    │
//! │                                                          │
//! │  UART console        LogStateListener                    │
//! │  (requests)          (StateListener)                     │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ───────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │        DoorStateMachine (pure logic + monitor)     │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                                                          │
//! │  ActuatorDriver (GPIO 4 / 17)   Ina219 (I2C0)            │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{OutputPin as _, PinDriver};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use doorctl::adapters::console::{self, ConsoleRequest};
use doorctl::adapters::log_sink::LogStateListener;
use doorctl::config::DoorConfig;
use doorctl::drivers::actuator::ActuatorDriver;
use doorctl::fsm::DoorStateMachine;
use doorctl::pins;
use doorctl::sensors::ina219::Ina219;
use doorctl::sensors::probe::CurrentProbe;

/// Build-time configuration override (JSON), e.g.
/// `DOORCTL_CONFIG='{"max_actuation_ms":30000}' cargo build`.
const CONFIG_OVERRIDE: Option<&str> = option_env!("DOORCTL_CONFIG");

fn load_config() -> DoorConfig {
    match CONFIG_OVERRIDE {
        Some(json) => DoorConfig::from_json(json).unwrap_or_else(|e| {
            warn!("DOORCTL_CONFIG rejected ({}), using defaults", e);
            DoorConfig::default()
        }),
        None => DoorConfig::default(),
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("doorctl v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config();
    info!(
        "Config: pulse={}ms poll={}ms threshold={:.3}A max={}ms",
        config.pulse_ms,
        config.poll_interval_ms,
        config.current_threshold_amps,
        config.max_actuation_ms
    );

    // ── 2. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;

    info!(
        "Relay lines: open=GPIO{} close=GPIO{}",
        pins::OPEN_LINE_GPIO,
        pins::CLOSE_LINE_GPIO
    );
    let open_line = PinDriver::output(peripherals.pins.gpio4.downgrade_output())?;
    let close_line = PinDriver::output(peripherals.pins.gpio17.downgrade_output())?;
    let actuator = ActuatorDriver::new(open_line, close_line, FreeRtos)?;

    info!(
        "INA219: SDA=GPIO{} SCL=GPIO{} @ {} Hz",
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
        pins::I2C_BAUD_HZ
    );
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ)),
    )?;
    let sensor = Ina219::new(i2c, &config.ina219)?;

    // ── 3. Door core + listeners ──────────────────────────────
    let door = DoorStateMachine::new(actuator, sensor, config)?;
    door.subscribe(Arc::new(LogStateListener::new()))?;
    info!("Door ready: {}", door.status().to_json());

    // ── 4. Console loop ───────────────────────────────────────
    println!("{}", console::HELP);
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => {
                // UART console has no data yet.
                FreeRtos::delay_ms(50);
                continue;
            }
            Ok(_) => {}
        }

        let request = match line.parse::<ConsoleRequest>() {
            Ok(request) => request,
            Err(console::ConsoleError::Empty) => continue,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };

        console::respond(
            &door,
            request,
            &mut |reply: &str| println!("{reply}"),
            |ina, opts, out| {
                CurrentProbe::new(ina, FreeRtos).run(opts, |row| out(row));
            },
        );

        // Let the logger drain before the next prompt.
        std::thread::sleep(Duration::from_millis(10));
    }
}
