//! Test bench: a [`ChamberService`] wired to mock hardware, an in-memory
//! character display and serial port, advanced in 10 ms steps the way
//! the firmware's main loop runs it.

use humidosh::adapters::display::CharDisplay;
use humidosh::adapters::serial::BufferedSerial;
use humidosh::app::service::ChamberService;
use humidosh::config::SystemConfig;
use humidosh::control::pid::{PidController, Regulator};
use humidosh::drivers::keypad::{Key, KeyEdge, KeyEvent};
use humidosh::ui::ScreenPage;

use crate::mock_hw::{MockHardware, RecordingSink};

pub const STEP_MS: u32 = 10;

/// Regulator that always answers with a fixed output.
#[derive(Debug, Default)]
pub struct FixedOutput {
    pub output: f64,
    pub computes: u32,
    pub seeds: u32,
}

impl Regulator for FixedOutput {
    fn set_target(&mut self, _setpoint: f64) {}

    fn reset(&mut self) {}

    fn seed(&mut self, _input: f64, _now_ms: u32) {
        self.seeds += 1;
    }

    fn compute(&mut self, _input: f64, _now_ms: u32) -> f64 {
        self.computes += 1;
        self.output
    }
}

pub struct Bench<R: Regulator = PidController> {
    pub app: ChamberService<R>,
    pub hw: MockHardware,
    pub display: CharDisplay,
    pub serial: BufferedSerial,
    pub sink: RecordingSink,
    pub now: u32,
}

#[allow(dead_code)]
impl Bench<PidController> {
    pub fn new() -> Self {
        Self::with_config(SystemConfig::default())
    }

    pub fn with_config(config: SystemConfig) -> Self {
        Self::started(ChamberService::new(config), 0)
    }
}

#[allow(dead_code)]
impl Bench<FixedOutput> {
    pub fn with_output(output: f64) -> Self {
        let regulator = FixedOutput {
            output,
            ..FixedOutput::default()
        };
        Self::started(
            ChamberService::with_regulator(SystemConfig::default(), regulator),
            0,
        )
    }
}

#[allow(dead_code)]
impl<R: Regulator> Bench<R> {
    pub fn started(app: ChamberService<R>, now: u32) -> Self {
        let mut bench = Self {
            app,
            hw: MockHardware::new(),
            display: CharDisplay::new(),
            serial: BufferedSerial::new(),
            sink: RecordingSink::new(),
            now,
        };
        bench
            .app
            .start(now, &mut bench.hw, &mut bench.display, &mut bench.sink);
        bench
    }

    /// One main-loop pass.
    pub fn step(&mut self) {
        self.now = self.now.wrapping_add(STEP_MS);
        self.app
            .tick(self.now, &mut self.hw, &mut self.display, &mut self.sink);
        self.app
            .poll_serial(&mut self.serial, &mut self.hw, &mut self.sink);
    }

    pub fn run_for(&mut self, ms: u32) {
        for _ in 0..ms / STEP_MS {
            self.step();
        }
    }

    pub fn key(&mut self, key: Key, edge: KeyEdge) {
        self.app
            .handle_key(KeyEvent::new(key, edge), self.now, &mut self.hw, &mut self.sink);
    }

    /// Press, one step, release, one step.
    pub fn tap(&mut self, key: Key) {
        self.key(key, KeyEdge::Pressed);
        self.step();
        self.key(key, KeyEdge::Released);
        self.step();
    }

    pub fn type_str(&mut self, keys: &str) {
        for c in keys.chars() {
            let key = Key::from_char(c).unwrap_or_else(|| panic!("no key for {c:?}"));
            self.tap(key);
        }
    }

    pub fn page(&self) -> ScreenPage {
        self.app.ui().page()
    }

    /// Queue a host line (terminator added).
    pub fn send(&mut self, line: &str) {
        self.serial.push_rx(line.as_bytes());
        self.serial.push_rx(b"\n");
    }

    pub fn lines(&mut self) -> Vec<String> {
        self.serial.take_lines()
    }
}
