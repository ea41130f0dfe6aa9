//! HumidOSH chamber simulator: main entry point
//!
//! Runs the chamber core against a simulated plant, with stdin standing
//! in for both the keypad and the host serial link.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    CharDisplay    BufferedSerial   FileStorage│
//! │  (Sim sensor+fan,   (DisplayPort)  (SerialPort)     (cal data) │
//! │   HAL outputs)      LogEventSink   MonotonicClock              │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ChamberService (pure logic)                 │    │
//! │  │  DAQ · humidity PID · fan · UI · serial framing        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Console
//!
//! | Input              | Effect                                      |
//! |--------------------|---------------------------------------------|
//! | `^d@`, `^s@`, ...  | Host frame, fed to the serial receiver      |
//! | `12.5s`            | Tap each key in turn                        |
//! | `h@3500`           | Hold one key for 3500 ms                    |
//! | `!sensor off/on`   | Take the humidity sensor off / on the bus   |
//! | `!show`            | Dump the display                            |
//! | `!quit`            | Exit                                        |

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{debug, info, warn};

use humidosh::adapters::display::CharDisplay;
use humidosh::adapters::hardware::{HalActuators, HardwareAdapter, OutputPins};
use humidosh::adapters::log_sink::LogEventSink;
use humidosh::adapters::serial::BufferedSerial;
use humidosh::adapters::sim::{
    Line, Plant, SimFanController, SimHumiditySensor, SimOutput, SimPwm, shared_plant,
};
use humidosh::adapters::storage::FileStorage;
use humidosh::adapters::time::MonotonicClock;
use humidosh::app::service::ChamberService;
use humidosh::config::SystemConfig;
use humidosh::drivers::keypad::{Key, KeypadTracker};
use humidosh::ui::ScreenPage;

/// Main loop period.
const LOOP_PERIOD_MS: u64 = 10;
/// How long a tapped key stays down.
const TAP_MS: u32 = 60;
const DATA_DIR: &str = "humidosh-data";

// ── Console ───────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum ConsoleInput {
    Frame(String),
    Keys(Vec<(Key, u32)>),
    Sensor(bool),
    Show,
    Quit,
}

fn parse_console(line: &str) -> Option<ConsoleInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with('^') {
        return Some(ConsoleInput::Frame(line.to_string()));
    }
    if let Some(cmd) = line.strip_prefix('!') {
        return match cmd.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["sensor", "off"] => Some(ConsoleInput::Sensor(false)),
            ["sensor", "on"] => Some(ConsoleInput::Sensor(true)),
            ["show"] => Some(ConsoleInput::Show),
            ["quit"] => Some(ConsoleInput::Quit),
            _ => {
                warn!("Console: unknown command {:?}", line);
                None
            }
        };
    }

    let mut keys = Vec::new();
    for token in line.split_whitespace() {
        if let Some((key, ms)) = token.split_once('@') {
            let mut chars = key.chars();
            let (Some(c), None) = (chars.next(), chars.next()) else {
                warn!("Console: hold needs exactly one key, got {:?}", token);
                return None;
            };
            let (Some(key), Ok(ms)) = (Key::from_char(c), ms.parse::<u32>()) else {
                warn!("Console: bad hold {:?}", token);
                return None;
            };
            keys.push((key, ms));
            continue;
        }
        for c in token.chars() {
            match Key::from_char(c) {
                Some(key) => keys.push((key, TAP_MS)),
                None => warn!("Console: no key {:?}", c),
            }
        }
    }
    (!keys.is_empty()).then_some(ConsoleInput::Keys(keys))
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Plays queued key presses back as "currently pressed" samples, with
/// one released sample between consecutive presses.
#[derive(Default)]
struct KeyScript {
    queue: VecDeque<(Key, u32)>,
    current: Option<(Key, u32)>,
    gap: bool,
}

impl KeyScript {
    fn extend(&mut self, keys: Vec<(Key, u32)>) {
        self.queue.extend(keys);
    }

    fn sample(&mut self, now_ms: u32) -> Option<Key> {
        if let Some((key, release_at)) = self.current {
            if now_ms.wrapping_sub(release_at) < u32::MAX / 2 {
                self.current = None;
                self.gap = true;
            } else {
                return Some(key);
            }
        }
        if core::mem::take(&mut self.gap) {
            return None;
        }
        let (key, ms) = self.queue.pop_front()?;
        self.current = Some((key, now_ms.wrapping_add(ms)));
        Some(key)
    }
}

fn load_config() -> Result<SystemConfig> {
    let Some(path) = std::env::args().nth(1) else {
        info!("Config: defaults");
        return Ok(SystemConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: SystemConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
    config.validate().with_context(|| format!("validating {path}"))?;
    info!("Config loaded from {}", path);
    Ok(config)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  HumidOSH simulator v{}           ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Config ─────────────────────────────────────────────
    let config = load_config()?;

    // ── 3. Construct adapters ─────────────────────────────────
    let storage = FileStorage::open(DATA_DIR).context("opening calibration storage")?;
    let plant = shared_plant(Plant::default());
    let pins = OutputPins {
        dry_valve: SimOutput::new(plant.clone(), Line::DryValve),
        wet_valve: SimOutput::new(plant.clone(), Line::WetValve),
        fan_rail: SimOutput::new(plant.clone(), Line::FanRail),
        humidity_led: SimOutput::new(plant.clone(), Line::HumidityLed),
        fan_led: SimOutput::new(plant.clone(), Line::FanLed),
    };
    let mut hw = HardwareAdapter::new(
        SimHumiditySensor::new(plant.clone(), storage),
        SimFanController::new(plant.clone()),
        HalActuators::new(SimPwm::new(plant.clone()), pins),
    );
    let mut display = CharDisplay::new();
    let mut serial = BufferedSerial::new();
    let mut log_sink = LogEventSink::new();
    let clock = MonotonicClock::new();
    let mut keypad = KeypadTracker::new(config.keypad_hold_delay_ms);
    let mut script = KeyScript::default();
    let console = spawn_stdin_reader();

    // ── 4. Construct app service ──────────────────────────────
    let mut app = ChamberService::new(config);
    let mut last_ms = clock.now_ms();
    app.start(last_ms, &mut hw, &mut display, &mut log_sink);

    let mut last_page = ScreenPage::Readings;
    let mut last_text = display.text();
    let mut console_open = true;

    // ── 5. Event loop ─────────────────────────────────────────
    loop {
        std::thread::sleep(Duration::from_millis(LOOP_PERIOD_MS));
        let now_ms = clock.now_ms();
        plant.borrow_mut().step(now_ms.wrapping_sub(last_ms));
        last_ms = now_ms;

        while console_open {
            match console.try_recv() {
                Ok(line) => match parse_console(&line) {
                    Some(ConsoleInput::Frame(frame)) => {
                        serial.push_rx(frame.as_bytes());
                        serial.push_rx(b"\n");
                    }
                    Some(ConsoleInput::Keys(keys)) => script.extend(keys),
                    Some(ConsoleInput::Sensor(online)) => {
                        plant.borrow_mut().sensor_offline = !online;
                        info!("Sim: humidity sensor {}", if online { "online" } else { "offline" });
                    }
                    Some(ConsoleInput::Show) => {
                        for row in 0..4 {
                            info!("│{}│", display.row_text(row));
                        }
                        info!(
                            "Humidity loop {:?} target {:.1}%, fan loop {} target {:.0} RPM",
                            app.humidity_control().state(),
                            app.humidity_control().target(),
                            if app.fan_control().is_active() { "on" } else { "off" },
                            app.fan_control().target()
                        );
                    }
                    Some(ConsoleInput::Quit) => {
                        info!(
                            "Shutting down after {} ticks ({} s)",
                            app.tick_count(),
                            clock.uptime_secs()
                        );
                        return Ok(());
                    }
                    None => {}
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Console: stdin closed");
                    console_open = false;
                }
            }
        }

        for event in keypad.update(now_ms, script.sample(now_ms)) {
            debug!("Key {:?} '{}'", event.edge, event.key.to_char());
            app.handle_key(event, now_ms, &mut hw, &mut log_sink);
        }

        app.tick(now_ms, &mut hw, &mut display, &mut log_sink);
        app.poll_serial(&mut serial, &mut hw, &mut log_sink);

        let tx = serial.take_tx();
        if !tx.is_empty() {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&tx)?;
            stdout.flush()?;
        }

        let page = app.ui().page();
        if page != last_page {
            info!("Screen: {}", page.name());
            last_page = page;
        }
        let text = display.text();
        if text != last_text {
            debug!("Display:\n{}", text);
            last_text = text;
        }
    }
}
