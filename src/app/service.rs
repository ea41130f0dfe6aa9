//! Application service: the hexagonal core.
//!
//! [`ChamberService`] owns the acquisition scheduler, both control
//! policies, the keypad/display state machine and the serial link.  All
//! I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  HumiditySensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!   FanControllerPort ◀──▶│        ChamberService        │
//!        ActuatorPort ◀── │ DAQ · humidity · fan · UI    │ ──▶ DisplayPort
//!          SerialPort ◀──▶└──────────────────────────────┘
//! ```
//!
//! Per tick: the scheduler refreshes readings, the humidity policy
//! consumes the controller's fresh flag, then the UI consumes the
//! display's flag and draws.  Components only see each other through
//! [`ChamberView`] snapshots and [`AppCommand`]s.

use log::{info, warn};

use crate::calibration::{CalibrationPoint, CalibrationSlot};
use crate::config::SystemConfig;
use crate::control::fan::FanControl;
use crate::control::humidity::HumidityControl;
use crate::control::pid::{PidController, Regulator};
use crate::drivers::keypad::KeyEvent;
use crate::error::{BusError, Error};
use crate::scheduler::{DaqScheduler, Readings};
use crate::serial::SerialLink;
use crate::serial::telemetry::TelemetryData;
use crate::ui::{ChamberView, Ui};

use super::commands::{AppCommand, ControlLoop};
use super::events::{AppEvent, Quantity};
use super::ports::{
    ActuatorPort, DisplayPort, EventSink, FanControllerPort, HumiditySensorPort, SerialPort,
};

// ───────────────────────────────────────────────────────────────
// ChamberService
// ───────────────────────────────────────────────────────────────

pub struct ChamberService<R: Regulator = PidController> {
    config: SystemConfig,
    daq: DaqScheduler,
    readings: Readings,
    humidity: HumidityControl<R>,
    fan: FanControl,
    ui: Ui,
    link: SerialLink,
    /// An acquisition completed while streaming; flushed by `poll_serial`.
    telemetry_pending: bool,
    /// Last acquisition health per quantity, for fault/recovery edges.
    healthy: [bool; 2],
    tick_count: u64,
}

impl ChamberService<PidController> {
    pub fn new(config: SystemConfig) -> Self {
        let humidity = HumidityControl::new(&config);
        Self::build(config, humidity)
    }
}

impl<R: Regulator> ChamberService<R> {
    /// Construct with a custom humidity regulator.
    pub fn with_regulator(config: SystemConfig, regulator: R) -> Self {
        let humidity = HumidityControl::with_regulator(&config, regulator);
        Self::build(config, humidity)
    }

    fn build(config: SystemConfig, humidity: HumidityControl<R>) -> Self {
        Self {
            daq: DaqScheduler::new(&config),
            readings: Readings::default(),
            humidity,
            fan: FanControl::new(&config),
            ui: Ui::new(&config),
            link: SerialLink::new(),
            telemetry_pending: false,
            healthy: [true; 2],
            tick_count: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output to its safe state, set up the fan controller
    /// and draw the first screen.
    pub fn start(
        &mut self,
        now_ms: u32,
        hw: &mut (impl HumiditySensorPort + FanControllerPort + ActuatorPort),
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        hw.all_off();
        if let Err(e) = self.fan.configure(hw) {
            warn!("Fan: controller setup failed: {}", e);
        }
        let view = self.view(hw);
        self.ui.update(now_ms, &mut self.readings, &view, display);
        sink.emit(&AppEvent::Started);
        info!("ChamberService started");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one cycle: acquisition → humidity control → UI.
    ///
    /// The `hw` parameter satisfies all three hardware ports; this avoids
    /// a double mutable borrow while keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hw: &mut (impl HumiditySensorPort + FanControllerPort + ActuatorPort),
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        if let Some(acquisition) = self.daq.tick(now_ms, hw, &mut self.readings) {
            self.note_health(Quantity::Humidity, acquisition.humidity_ok, sink);
            self.note_health(Quantity::FanSpeed, acquisition.fan_ok, sink);
            if self.link.is_streaming() {
                self.telemetry_pending = true;
            }
        }

        self.humidity.tick(now_ms, &mut self.readings.humidity, hw);

        let view = self.view(hw);
        if let Some(cmd) = self.ui.update(now_ms, &mut self.readings, &view, display) {
            self.run_ui_command(cmd, hw, sink);
        }
    }

    /// Feed one keypad edge to the UI and execute whatever it asks for.
    pub fn handle_key(
        &mut self,
        event: KeyEvent,
        now_ms: u32,
        hw: &mut (impl HumiditySensorPort + FanControllerPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        let view = self.view(hw);
        let cmd = self.ui.handle_key(event, now_ms, &view);
        if let Some((control, error)) = self.ui.take_rejection() {
            sink.emit(&AppEvent::InputRejected { control, error });
        }
        if let Some(cmd) = cmd {
            self.run_ui_command(cmd, hw, sink);
        }
    }

    /// Answer pending host frames and flush telemetry.
    pub fn poll_serial(
        &mut self,
        port: &mut impl SerialPort,
        hw: &mut (impl HumiditySensorPort + FanControllerPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        while let Some(frame) = self.link.poll(port) {
            let ok = match frame.kind() {
                Some(kind) => self.handle_command(kind.app_command(), hw, sink).is_ok(),
                None => false,
            };
            self.link.send_ack(port, frame.selector(), ok);
        }

        if core::mem::take(&mut self.telemetry_pending) && self.link.is_streaming() {
            let data = self.telemetry();
            self.link.send_telemetry(port, &data);
            sink.emit(&AppEvent::Telemetry(data));
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Execute a command from the keypad, the host or a test.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut (impl HumiditySensorPort + FanControllerPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        match cmd {
            AppCommand::StartTelemetry | AppCommand::StopTelemetry => {
                let on = cmd == AppCommand::StartTelemetry;
                self.link.set_streaming(on);
                if !on {
                    self.telemetry_pending = false;
                }
                info!("Serial: telemetry streaming {}", if on { "on" } else { "off" });
                sink.emit(&AppEvent::TelemetryStreaming(on));
            }

            AppCommand::StartControl(ControlLoop::Humidity) => {
                if !self.humidity.is_active() {
                    self.humidity.enable(hw);
                    sink.emit(&AppEvent::ControlStarted(ControlLoop::Humidity));
                }
            }
            AppCommand::StartControl(ControlLoop::FanSpeed) => {
                if !self.fan.is_active() {
                    if let Err(e) = self.fan.enable(hw) {
                        warn!("Fan: control start failed: {}", e);
                        sink.emit(&AppEvent::ControlStartFailed(ControlLoop::FanSpeed));
                        return Err(e.into());
                    }
                    sink.emit(&AppEvent::ControlStarted(ControlLoop::FanSpeed));
                }
            }

            AppCommand::StopControl(ControlLoop::Humidity) => {
                if self.humidity.is_active() {
                    self.humidity.disable(hw);
                    sink.emit(&AppEvent::ControlStopped(ControlLoop::Humidity));
                }
            }
            AppCommand::StopControl(ControlLoop::FanSpeed) => {
                if self.fan.is_active() {
                    self.fan
                        .disable(hw)
                        .inspect_err(|e| warn!("Fan: control stop failed: {}", e))?;
                    sink.emit(&AppEvent::ControlStopped(ControlLoop::FanSpeed));
                }
            }

            AppCommand::SetTarget { control, value } => {
                let result = match control {
                    ControlLoop::Humidity => self.humidity.set_target(value).map_err(Error::from),
                    ControlLoop::FanSpeed => self.fan.set_target(value, hw),
                };
                match result {
                    Err(Error::Input(error)) => {
                        warn!("{:?} target {} rejected: {}", control, value, error);
                        sink.emit(&AppEvent::InputRejected { control, error });
                        return Err(Error::Input(error));
                    }
                    // The target is stored even when the controller write failed.
                    other => {
                        sink.emit(&AppEvent::TargetUpdated { control, value });
                        other?;
                    }
                }
            }

            AppCommand::SaveCalibration { slot, reference } => {
                self.save_calibration(slot, reference, hw)?;
                sink.emit(&AppEvent::CalibrationSaved(slot));
            }
            AppCommand::ResetCalibration => {
                hw.reset_calibration()
                    .inspect_err(|e| warn!("Calibration: reset failed: {}", e))?;
                info!("Calibration: cleared");
                sink.emit(&AppEvent::CalibrationCleared);
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Telemetry snapshot of the latest readings and active targets.
    pub fn telemetry(&self) -> TelemetryData {
        TelemetryData::snapshot(
            &self.readings,
            self.humidity.is_active().then_some(self.humidity.target()),
            self.fan.is_active().then_some(self.fan.target()),
        )
    }

    pub fn readings(&self) -> &Readings {
        &self.readings
    }

    pub fn humidity_control(&self) -> &HumidityControl<R> {
        &self.humidity
    }

    pub fn fan_control(&self) -> &FanControl {
        &self.fan
    }

    pub fn ui(&self) -> &Ui {
        &self.ui
    }

    pub fn is_streaming(&self) -> bool {
        self.link.is_streaming()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn view(&self, hw: &impl HumiditySensorPort) -> ChamberView {
        ChamberView {
            humidity_control_active: self.humidity.is_active(),
            fan_control_active: self.fan.is_active(),
            humidity_target: self.humidity.target(),
            fan_target: self.fan.target(),
            raw_humidity: hw.raw_humidity(),
            calibration: [
                hw.saved_calibration(CalibrationSlot::Point1),
                hw.saved_calibration(CalibrationSlot::Point2),
            ],
        }
    }

    /// UI commands have no caller to report to; failures are logged
    /// and surfaced through events.
    fn run_ui_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut (impl HumiditySensorPort + FanControllerPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        if let Err(e) = self.handle_command(cmd, hw, sink) {
            warn!("UI command {:?} failed: {}", cmd, e);
        }
    }

    fn save_calibration(
        &mut self,
        slot: CalibrationSlot,
        reference: f64,
        hw: &mut impl HumiditySensorPort,
    ) -> Result<(), Error> {
        if !self.readings.humidity.is_ok() {
            warn!("Calibration: no valid raw reading for point {}", slot.number());
            return Err(BusError::NotReady.into());
        }
        let point = CalibrationPoint {
            raw: hw.raw_humidity(),
            reference,
        };
        hw.save_calibration(slot, point)
            .inspect_err(|e| warn!("Calibration: saving point {} failed: {}", slot.number(), e))?;
        info!(
            "Calibration: point {} saved (raw {:.1}, ref {:.1})",
            slot.number(),
            point.raw,
            point.reference
        );
        Ok(())
    }

    fn note_health(&mut self, quantity: Quantity, ok: bool, sink: &mut impl EventSink) {
        let slot = match quantity {
            Quantity::Humidity => 0,
            Quantity::FanSpeed => 1,
        };
        if self.healthy[slot] == ok {
            return;
        }
        self.healthy[slot] = ok;
        if ok {
            info!("DAQ: {:?} acquisition recovered", quantity);
            sink.emit(&AppEvent::SensorRecovered(quantity));
        } else {
            warn!("DAQ: {:?} acquisition failed after retries", quantity);
            sink.emit(&AppEvent::SensorFault(quantity));
        }
    }
}
