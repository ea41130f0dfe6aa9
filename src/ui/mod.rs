//! Keypad/display state machine.
//!
//! ```text
//!            ┌──────── s ────────┐
//!            ▼                   │
//!        READINGS ──s──▶ HUMIDITY_ADJUST ──s──▶ FAN_SPEED_ADJUST ──s──▶ CALIBRATION
//!         │    ▲              │    ▲                  │    ▲              │  │  │
//!    hold │    │ release/     │    │ flash            │    │ flash     1/2│ 3│  │s
//!         ▼    │ done         ▼    │ done             ▼    │ done         ▼  │  ▼
//!         HOLD ┘        MAX/MIN_VALUE_ERROR     MAX/MIN_VALUE_ERROR  CAL_POINT │ READINGS
//!                                                                   CAL_RESET ◀┘
//! ```
//!
//! The machine is split in two halves, the same way every tick of the
//! service is:
//!
//! * [`Ui::handle_key`] applies one key edge.  It only changes state and
//!   may return an [`AppCommand`] for the service to execute.
//! * [`Ui::update`] runs timers (indicator blink, hold countdown, limit
//!   flashing, reset timeout) and draws.  A screen's static layout and
//!   current values are drawn once on entry; afterwards only changed
//!   fields are rewritten.

pub mod editor;
pub mod layout;

use log::{debug, info};

use crate::app::commands::{AppCommand, ControlLoop};
use crate::app::ports::DisplayPort;
use crate::calibration::{CalibrationPoint, CalibrationSlot};
use crate::config::SystemConfig;
use crate::drivers::keypad::{Key, KeyEdge, KeyEvent};
use crate::error::InputError;
use crate::scheduler::{Reading, Readings};

use editor::{FieldSpec, InputEditor};
use layout::{
    ERROR_MARKER, NOT_AVAILABLE, integer_digits, print_at, print_number_right_aligned,
    print_right_aligned,
};

// ---------------------------------------------------------------------------
// Timing and geometry
// ---------------------------------------------------------------------------

const INDICATOR_PERIOD_MS: u32 = 500;
const CALIBRATION_RESET_TIMEOUT_MS: u32 = 2000;
const LIMIT_FLASH_PERIOD_MS: u32 = 700;
const LIMIT_FLASH_COUNT: u8 = 6;

const READING_RIGHT_COL: u8 = 15;
const READING_WIDTH: u8 = 7;
const ROW_TEMPERATURE: u8 = 1;
const ROW_HUMIDITY: u8 = 2;
const ROW_FAN: u8 = 3;

const INPUT_RIGHT_COL: u8 = 19;
const INPUT_ROW: u8 = 3;
const INPUT_WIDTH: u8 = 4;
const OLD_TARGET_WIDTH: u8 = 8;
const OLD_TARGET_ROW: u8 = 2;

const RAW_WIDTH: u8 = 5;
const RAW_ROW: u8 = 2;

const HOLD_SECONDS_RIGHT_COL: u8 = 3;
const HOLD_SECONDS_ROW: u8 = 2;

const HUMIDITY_DECIMALS: u8 = 1;
const TEMPERATURE_DECIMALS: u8 = 1;
const FAN_DECIMALS: u8 = 0;

const DASHES: &str = "--------------------";
const STARS: &str = "********************";
const INDICATOR_LEFT: &str = ">>  ";
const INDICATOR_RIGHT: &str = "  >>";
const INDICATOR_IDLE: &str = "IDLE";
const FLASHER_LEFT: &str = ">>>>>";
const FLASHER_RIGHT: &str = "<<<<<";
const FLASHER_OFF: &str = "     ";

// ---------------------------------------------------------------------------
// Screen identity
// ---------------------------------------------------------------------------

/// The nine screens, without their per-screen data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenPage {
    Readings,
    HumidityAdjust,
    FanSpeedAdjust,
    Calibration,
    CalibrationPoint,
    CalibrationReset,
    Hold,
    MinValueError,
    MaxValueError,
}

impl ScreenPage {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Readings => "Readings",
            Self::HumidityAdjust => "HumidityAdjust",
            Self::FanSpeedAdjust => "FanSpeedAdjust",
            Self::Calibration => "Calibration",
            Self::CalibrationPoint => "CalibrationPoint",
            Self::CalibrationReset => "CalibrationReset",
            Self::Hold => "Hold",
            Self::MinValueError => "MinValueError",
            Self::MaxValueError => "MaxValueError",
        }
    }
}

/// What the UI needs to know about the rest of the chamber.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChamberView {
    pub humidity_control_active: bool,
    pub fan_control_active: bool,
    pub humidity_target: f64,
    pub fan_target: f64,
    /// Latest uncalibrated humidity, shown while calibrating.
    pub raw_humidity: f64,
    pub calibration: [Option<CalibrationPoint>; 2],
}

impl ChamberView {
    fn is_active(&self, control: ControlLoop) -> bool {
        match control {
            ControlLoop::Humidity => self.humidity_control_active,
            ControlLoop::FanSpeed => self.fan_control_active,
        }
    }

    fn target(&self, control: ControlLoop) -> f64 {
        match control {
            ControlLoop::Humidity => self.humidity_target,
            ControlLoop::FanSpeed => self.fan_target,
        }
    }
}

/// An in-progress hold-to-stop gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldGesture {
    pub target: ControlLoop,
    pub key: Key,
    pub started_at_ms: u32,
    pub seconds_remaining: u8,
}

// ---------------------------------------------------------------------------
// Per-screen data
// ---------------------------------------------------------------------------

/// What a value field currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shown {
    Nothing,
    Value,
    Error,
    NotAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ReadingsPage {
    indicator_left: bool,
    indicator_since_ms: u32,
    humidity: Shown,
    temperature: Shown,
    fan: Shown,
}

impl ReadingsPage {
    const fn new() -> Self {
        Self {
            indicator_left: true,
            indicator_since_ms: 0,
            humidity: Shown::Nothing,
            temperature: Shown::Nothing,
            fan: Shown::Nothing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LimitFlash {
    control: ControlLoop,
    limit: f64,
    started_at_ms: u32,
    flashes: u8,
    flasher_on: bool,
}

impl LimitFlash {
    const fn new(control: ControlLoop, limit: f64, now_ms: u32) -> Self {
        Self {
            control,
            limit,
            started_at_ms: now_ms,
            flashes: 0,
            flasher_on: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Screen {
    Readings(ReadingsPage),
    HumidityAdjust,
    FanSpeedAdjust,
    Calibration,
    CalibrationPoint { slot: CalibrationSlot, raw: Shown },
    CalibrationReset { shown_at_ms: u32 },
    Hold(HoldGesture),
    MinValueError(LimitFlash),
    MaxValueError(LimitFlash),
}

impl Screen {
    const fn page(&self) -> ScreenPage {
        match self {
            Self::Readings(_) => ScreenPage::Readings,
            Self::HumidityAdjust => ScreenPage::HumidityAdjust,
            Self::FanSpeedAdjust => ScreenPage::FanSpeedAdjust,
            Self::Calibration => ScreenPage::Calibration,
            Self::CalibrationPoint { .. } => ScreenPage::CalibrationPoint,
            Self::CalibrationReset { .. } => ScreenPage::CalibrationReset,
            Self::Hold(_) => ScreenPage::Hold,
            Self::MinValueError(_) => ScreenPage::MinValueError,
            Self::MaxValueError(_) => ScreenPage::MaxValueError,
        }
    }

    const fn adjust(control: ControlLoop) -> Self {
        match control {
            ControlLoop::Humidity => Self::HumidityAdjust,
            ControlLoop::FanSpeed => Self::FanSpeedAdjust,
        }
    }
}

const fn field_for(control: ControlLoop) -> FieldSpec {
    match control {
        ControlLoop::Humidity => FieldSpec::HUMIDITY,
        ControlLoop::FanSpeed => FieldSpec::FAN_SPEED,
    }
}

const fn decimals_for(control: ControlLoop) -> u8 {
    match control {
        ControlLoop::Humidity => HUMIDITY_DECIMALS,
        ControlLoop::FanSpeed => FAN_DECIMALS,
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub struct Ui {
    screen: Screen,
    /// Set on every transition; the next `update` draws the new screen.
    entered: bool,
    editor: InputEditor,
    input_changed: bool,
    humidity_range: (f64, f64),
    fan_range: (f64, f64),
    hold_duration_ms: u16,
    show_temperature: bool,
    /// Key whose hold edge arrived while its loop was idle.
    held_key: Option<Key>,
    /// Per loop: stopped by a completed hold whose key is still down.
    recently_stopped: [bool; 2],
    rejection: Option<(ControlLoop, InputError)>,
}

impl Ui {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            screen: Screen::Readings(ReadingsPage::new()),
            entered: true,
            editor: InputEditor::new(),
            input_changed: false,
            humidity_range: (config.humidity_min_percent, config.humidity_max_percent),
            fan_range: (config.fan_speed_min_rpm, config.fan_speed_max_rpm),
            hold_duration_ms: config.key_hold_duration_ms,
            show_temperature: config.show_temperature,
            held_key: None,
            recently_stopped: [false; 2],
            rejection: None,
        }
    }

    pub fn page(&self) -> ScreenPage {
        self.screen.page()
    }

    pub fn editor(&self) -> &InputEditor {
        &self.editor
    }

    /// The hold gesture in progress, if the hold screen is up.
    pub fn hold(&self) -> Option<HoldGesture> {
        match self.screen {
            Screen::Hold(gesture) => Some(gesture),
            _ => None,
        }
    }

    /// The last out-of-range entry, consumed by the caller.
    pub fn take_rejection(&mut self) -> Option<(ControlLoop, InputError)> {
        self.rejection.take()
    }

    /// Apply one key edge.
    pub fn handle_key(
        &mut self,
        event: KeyEvent,
        now_ms: u32,
        view: &ChamberView,
    ) -> Option<AppCommand> {
        debug!("UI: {:?} {:?} on {}", event.key, event.edge, self.page().name());

        match self.screen {
            Screen::Readings(_) => self.readings_key(event, now_ms, view),
            Screen::HumidityAdjust => self.adjust_key(ControlLoop::Humidity, event, now_ms),
            Screen::FanSpeedAdjust => self.adjust_key(ControlLoop::FanSpeed, event, now_ms),
            Screen::Calibration => {
                if event.edge == KeyEdge::Pressed {
                    match event.key {
                        Key::Digit(1) => self.enter_calibration_point(CalibrationSlot::Point1),
                        Key::Digit(2) => self.enter_calibration_point(CalibrationSlot::Point2),
                        Key::Digit(3) => {
                            self.transition(Screen::CalibrationReset { shown_at_ms: now_ms })
                        }
                        Key::Settings => self.transition(Screen::Readings(ReadingsPage::new())),
                        _ => {}
                    }
                }
                None
            }
            Screen::CalibrationPoint { slot, .. } => self.calibration_point_key(slot, event),
            Screen::CalibrationReset { .. } => {
                if event.edge == KeyEdge::Pressed && event.key == Key::Digit(5) {
                    info!("UI: calibration reset confirmed");
                    self.transition(Screen::Calibration);
                    return Some(AppCommand::ResetCalibration);
                }
                None
            }
            Screen::Hold(gesture) => {
                if event.edge == KeyEdge::Released && event.key == gesture.key {
                    info!("UI: hold on {:?} abandoned", gesture.target);
                    self.transition(Screen::Readings(ReadingsPage::new()));
                }
                None
            }
            Screen::MinValueError(_) | Screen::MaxValueError(_) => None,
        }
    }

    /// Run timers and redraw.  May return a command when a hold completes.
    pub fn update(
        &mut self,
        now_ms: u32,
        readings: &mut Readings,
        view: &ChamberView,
        display: &mut impl DisplayPort,
    ) -> Option<AppCommand> {
        if core::mem::take(&mut self.entered) {
            self.input_changed = false;
            self.draw_screen(now_ms, readings, view, display);
            return None;
        }

        match self.screen {
            Screen::Readings(mut page) => {
                refresh_readings(&mut page, now_ms, readings, view, self.show_temperature, display);
                self.screen = Screen::Readings(page);
                None
            }
            Screen::HumidityAdjust | Screen::FanSpeedAdjust => {
                if core::mem::take(&mut self.input_changed) {
                    self.draw_input(display);
                }
                None
            }
            Screen::Calibration => None,
            Screen::CalibrationPoint { slot, mut raw } => {
                let raw_redrawn = refresh_raw(&mut raw, &mut readings.humidity, view, display);
                self.screen = Screen::CalibrationPoint { slot, raw };
                if core::mem::take(&mut self.input_changed) || raw_redrawn {
                    self.draw_input(display);
                }
                None
            }
            Screen::CalibrationReset { shown_at_ms } => {
                if now_ms.wrapping_sub(shown_at_ms) >= CALIBRATION_RESET_TIMEOUT_MS {
                    debug!("UI: calibration reset timed out");
                    self.transition(Screen::Calibration);
                }
                None
            }
            Screen::Hold(gesture) => self.update_hold(gesture, now_ms, display),
            Screen::MinValueError(mut flash) => {
                if step_flash(&mut flash, now_ms, display) {
                    self.end_flash(flash.control);
                } else {
                    self.screen = Screen::MinValueError(flash);
                }
                None
            }
            Screen::MaxValueError(mut flash) => {
                if step_flash(&mut flash, now_ms, display) {
                    self.end_flash(flash.control);
                } else {
                    self.screen = Screen::MaxValueError(flash);
                }
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Key handlers
    // -----------------------------------------------------------------------

    fn readings_key(
        &mut self,
        event: KeyEvent,
        now_ms: u32,
        view: &ChamberView,
    ) -> Option<AppCommand> {
        let control = match event.key {
            Key::Settings => {
                if event.edge == KeyEdge::Pressed {
                    self.editor.reset();
                    self.transition(Screen::HumidityAdjust);
                }
                return None;
            }
            Key::HumidityToggle => ControlLoop::Humidity,
            Key::FanToggle => ControlLoop::FanSpeed,
            _ => return None,
        };
        let active = view.is_active(control);

        match event.edge {
            KeyEdge::Pressed => None,
            KeyEdge::Held => {
                if active {
                    let seconds = (self.hold_duration_ms / 1000).max(1) as u8;
                    info!("UI: hold to stop {:?} ({}s)", control, seconds);
                    self.transition(Screen::Hold(HoldGesture {
                        target: control,
                        key: event.key,
                        started_at_ms: now_ms,
                        seconds_remaining: seconds,
                    }));
                } else {
                    self.held_key = Some(event.key);
                }
                None
            }
            KeyEdge::Released => {
                let was_held = self.held_key.take() == Some(event.key);
                let recently_stopped = core::mem::take(&mut self.recently_stopped[control.index()]);
                if active || was_held || recently_stopped {
                    None
                } else {
                    Some(AppCommand::StartControl(control))
                }
            }
        }
    }

    fn adjust_key(
        &mut self,
        control: ControlLoop,
        event: KeyEvent,
        now_ms: u32,
    ) -> Option<AppCommand> {
        if event.edge != KeyEdge::Pressed {
            return None;
        }
        if event.key == Key::Settings {
            return self.commit_target(control, now_ms);
        }
        self.edit(event.key, field_for(control));
        None
    }

    fn calibration_point_key(
        &mut self,
        slot: CalibrationSlot,
        event: KeyEvent,
    ) -> Option<AppCommand> {
        if event.edge != KeyEdge::Pressed {
            return None;
        }
        if event.key != Key::Settings {
            self.edit(event.key, FieldSpec::HUMIDITY);
            return None;
        }

        let command = (!self.editor.is_empty()).then(|| AppCommand::SaveCalibration {
            slot,
            reference: self.editor.value(),
        });
        self.editor.reset();
        self.transition(Screen::Calibration);
        command
    }

    fn edit(&mut self, key: Key, field: FieldSpec) {
        let changed = match key {
            Key::Digit(d) => self.editor.push_digit(d, field),
            Key::Decimal => self.editor.push_decimal(field),
            Key::Delete => self.editor.delete(),
            _ => false,
        };
        self.input_changed |= changed;
    }

    /// Validate the entry and move on.  An empty entry keeps the target.
    fn commit_target(&mut self, control: ControlLoop, now_ms: u32) -> Option<AppCommand> {
        let next = match control {
            ControlLoop::Humidity => Screen::FanSpeedAdjust,
            ControlLoop::FanSpeed => Screen::Calibration,
        };

        if self.editor.is_empty() {
            self.transition(next);
            return None;
        }

        let value = self.editor.value();
        let (min, max) = match control {
            ControlLoop::Humidity => self.humidity_range,
            ControlLoop::FanSpeed => self.fan_range,
        };

        match InputError::check(value, min, max) {
            Ok(()) => {
                self.editor.reset();
                self.transition(next);
                Some(AppCommand::SetTarget { control, value })
            }
            Err(error) => {
                info!("UI: {:?} target {} rejected: {}", control, value, error);
                self.rejection = Some((control, error));
                let screen = match error {
                    InputError::AboveMaximum { max } => {
                        Screen::MaxValueError(LimitFlash::new(control, max, now_ms))
                    }
                    InputError::BelowMinimum { min } => {
                        Screen::MinValueError(LimitFlash::new(control, min, now_ms))
                    }
                };
                self.transition(screen);
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Timed screens
    // -----------------------------------------------------------------------

    fn update_hold(
        &mut self,
        mut gesture: HoldGesture,
        now_ms: u32,
        display: &mut impl DisplayPort,
    ) -> Option<AppCommand> {
        let elapsed = now_ms.wrapping_sub(gesture.started_at_ms);
        let duration = u32::from(self.hold_duration_ms);
        let before = gesture.seconds_remaining;

        while gesture.seconds_remaining > 0
            && elapsed.saturating_add(u32::from(gesture.seconds_remaining - 1) * 1000) >= duration
        {
            gesture.seconds_remaining -= 1;
        }

        if gesture.seconds_remaining == 0 {
            info!("UI: hold complete, stopping {:?}", gesture.target);
            self.recently_stopped[gesture.target.index()] = true;
            self.transition(Screen::Readings(ReadingsPage::new()));
            return Some(AppCommand::StopControl(gesture.target));
        }

        if gesture.seconds_remaining != before {
            draw_hold_seconds(display, gesture.seconds_remaining);
        }
        self.screen = Screen::Hold(gesture);
        None
    }

    fn end_flash(&mut self, control: ControlLoop) {
        self.editor.reset();
        self.transition(Screen::adjust(control));
    }

    // -----------------------------------------------------------------------
    // Transitions and drawing
    // -----------------------------------------------------------------------

    fn enter_calibration_point(&mut self, slot: CalibrationSlot) {
        self.editor.reset();
        self.transition(Screen::CalibrationPoint {
            slot,
            raw: Shown::Nothing,
        });
    }

    fn transition(&mut self, next: Screen) {
        debug!("UI transition: {} -> {}", self.page().name(), next.page().name());
        self.screen = next;
        self.entered = true;
    }

    fn draw_screen(
        &mut self,
        now_ms: u32,
        readings: &mut Readings,
        view: &ChamberView,
        display: &mut impl DisplayPort,
    ) {
        display.set_blink(false);
        display.clear();

        match self.screen {
            Screen::Readings(_) => {
                print_at(display, 6, 0, "Readings");
                if self.show_temperature {
                    print_at(display, 7, ROW_TEMPERATURE, "T:        C");
                } else {
                    print_at(display, 0, ROW_TEMPERATURE, DASHES);
                }
                print_at(display, 6, ROW_HUMIDITY, "RH:        %");
                print_at(display, 5, ROW_FAN, "Fan:        RPM");

                let mut page = ReadingsPage {
                    indicator_since_ms: now_ms,
                    ..ReadingsPage::new()
                };
                draw_indicators(display, view, page.indicator_left);
                refresh_readings(&mut page, now_ms, readings, view, self.show_temperature, display);
                self.screen = Screen::Readings(page);
            }
            Screen::HumidityAdjust => self.draw_adjust(ControlLoop::Humidity, view, display),
            Screen::FanSpeedAdjust => self.draw_adjust(ControlLoop::FanSpeed, view, display),
            Screen::Calibration => {
                print_at(display, 0, 0, "---RH calibration---");
                print_at(display, 0, 1, "Press 1 for point 1");
                print_at(display, 0, 2, "Press 2 for point 2");
                print_at(display, 0, 3, "Press 3 to reset all");
            }
            Screen::CalibrationPoint { slot, .. } => {
                print_at(display, 0, 0, "------Point  -------");
                display.set_cursor(12, 0);
                display.print_number(f64::from(slot.number()), 0);
                print_at(display, 0, 1, "raw:      ref.:");
                match view.calibration[slot.index()] {
                    Some(point) => {
                        print_number_right_aligned(display, point.raw, HUMIDITY_DECIMALS, 4, 8, 1);
                        print_number_right_aligned(
                            display,
                            point.reference,
                            HUMIDITY_DECIMALS,
                            RAW_WIDTH,
                            19,
                            1,
                        );
                    }
                    None => {
                        print_at(display, 5, 1, NOT_AVAILABLE);
                        print_at(display, 16, 1, NOT_AVAILABLE);
                    }
                }
                print_at(display, 3, RAW_ROW, "New raw RH:");
                print_at(display, 2, INPUT_ROW, "New ref. RH:");

                let mut raw = Shown::Nothing;
                refresh_raw(&mut raw, &mut readings.humidity, view, display);
                self.screen = Screen::CalibrationPoint { slot, raw };
                self.draw_input(display);
            }
            Screen::CalibrationReset { .. } => {
                print_at(display, 1, 0, "Reset calibration?");
                print_at(display, 0, 1, "This will delete all");
                print_at(display, 1, 2, "calibration data!!");
                print_at(display, 0, 3, "--Press 5 to reset--");
                self.screen = Screen::CalibrationReset { shown_at_ms: now_ms };
            }
            Screen::Hold(gesture) => {
                print_at(display, 0, 0, STARS);
                print_at(display, 2, 1, "Hold button for");
                print_at(display, 6, HOLD_SECONDS_ROW, "second(s)");
                print_at(display, 0, 3, STARS);
                draw_hold_seconds(display, gesture.seconds_remaining);
            }
            Screen::MinValueError(flash) => draw_limit(display, "Minimum value is", &flash),
            Screen::MaxValueError(flash) => draw_limit(display, "Maximum value is", &flash),
        }
    }

    fn draw_adjust(
        &self,
        control: ControlLoop,
        view: &ChamberView,
        display: &mut impl DisplayPort,
    ) {
        match control {
            ControlLoop::Humidity => print_at(display, 0, 0, "Relative humidity(%)"),
            ControlLoop::FanSpeed => print_at(display, 2, 0, "Fan speed (RPM)"),
        }
        print_at(display, 0, 1, DASHES);
        print_at(display, 0, OLD_TARGET_ROW, "Old target:");
        print_number_right_aligned(
            display,
            view.target(control),
            decimals_for(control),
            OLD_TARGET_WIDTH,
            INPUT_RIGHT_COL,
            OLD_TARGET_ROW,
        );
        print_at(display, 0, INPUT_ROW, "New target:");
        self.draw_input(display);
    }

    /// Rewrite the input field and park the blinking cursor.
    fn draw_input(&self, display: &mut impl DisplayPort) {
        print_right_aligned(
            display,
            self.editor.text(),
            INPUT_WIDTH,
            INPUT_RIGHT_COL,
            INPUT_ROW,
        );
        display.set_cursor(INPUT_RIGHT_COL, INPUT_ROW);
        display.set_blink(true);
    }
}

// ---------------------------------------------------------------------------
// Field refresh helpers
// ---------------------------------------------------------------------------

/// Redraw one reading when it is fresh or its last drawn state is stale.
fn refresh_field(
    display: &mut impl DisplayPort,
    reading: &mut Reading,
    shown: &mut Shown,
    decimals: u8,
    row: u8,
) {
    match reading.value() {
        Some(value) => {
            if reading.take_fresh_for_print() || *shown != Shown::Value {
                print_number_right_aligned(
                    display,
                    value,
                    decimals,
                    READING_WIDTH,
                    READING_RIGHT_COL,
                    row,
                );
                *shown = Shown::Value;
            }
        }
        None => {
            if *shown != Shown::Error {
                print_right_aligned(display, ERROR_MARKER, READING_WIDTH, READING_RIGHT_COL, row);
                *shown = Shown::Error;
            }
        }
    }
}

fn refresh_readings(
    page: &mut ReadingsPage,
    now_ms: u32,
    readings: &mut Readings,
    view: &ChamberView,
    show_temperature: bool,
    display: &mut impl DisplayPort,
) {
    if now_ms.wrapping_sub(page.indicator_since_ms) >= INDICATOR_PERIOD_MS {
        page.indicator_left = !page.indicator_left;
        page.indicator_since_ms = now_ms;
        draw_indicators(display, view, page.indicator_left);
    }

    refresh_field(
        display,
        &mut readings.humidity,
        &mut page.humidity,
        HUMIDITY_DECIMALS,
        ROW_HUMIDITY,
    );
    if show_temperature {
        refresh_field(
            display,
            &mut readings.temperature,
            &mut page.temperature,
            TEMPERATURE_DECIMALS,
            ROW_TEMPERATURE,
        );
    }

    if view.fan_control_active {
        refresh_field(display, &mut readings.fan_speed, &mut page.fan, FAN_DECIMALS, ROW_FAN);
    } else if page.fan != Shown::NotAvailable {
        print_right_aligned(display, NOT_AVAILABLE, READING_WIDTH, READING_RIGHT_COL, ROW_FAN);
        page.fan = Shown::NotAvailable;
    }
}

/// Redraw the live raw humidity.  Returns `true` when the cursor moved.
fn refresh_raw(
    shown: &mut Shown,
    humidity: &mut Reading,
    view: &ChamberView,
    display: &mut impl DisplayPort,
) -> bool {
    if humidity.is_ok() {
        if humidity.take_fresh_for_print() || *shown != Shown::Value {
            display.set_blink(false);
            print_number_right_aligned(
                display,
                view.raw_humidity,
                HUMIDITY_DECIMALS,
                RAW_WIDTH,
                INPUT_RIGHT_COL,
                RAW_ROW,
            );
            *shown = Shown::Value;
            return true;
        }
    } else if *shown != Shown::Error {
        display.set_blink(false);
        print_right_aligned(display, ERROR_MARKER, RAW_WIDTH, INPUT_RIGHT_COL, RAW_ROW);
        *shown = Shown::Error;
        return true;
    }
    false
}

fn draw_indicators(display: &mut impl DisplayPort, view: &ChamberView, left: bool) {
    let running = if left { INDICATOR_LEFT } else { INDICATOR_RIGHT };
    let humidity = if view.humidity_control_active { running } else { INDICATOR_IDLE };
    let fan = if view.fan_control_active { running } else { INDICATOR_IDLE };
    print_at(display, 0, ROW_HUMIDITY, humidity);
    print_at(display, 0, ROW_FAN, fan);
}

fn draw_hold_seconds(display: &mut impl DisplayPort, seconds: u8) {
    print_number_right_aligned(
        display,
        f64::from(seconds),
        0,
        2,
        HOLD_SECONDS_RIGHT_COL,
        HOLD_SECONDS_ROW,
    );
}

fn draw_limit(display: &mut impl DisplayPort, title: &str, flash: &LimitFlash) {
    print_at(display, 0, 0, STARS);
    print_at(display, 2, 1, title);
    draw_flasher(display, flash.flasher_on);

    let decimals = decimals_for(flash.control);
    let chars = integer_digits(flash.limit) + if decimals > 0 { decimals + 1 } else { 0 };
    display.set_cursor(10u8.saturating_sub(1 + chars / 2), 2);
    display.print_number(flash.limit, decimals);
    print_at(display, 0, 3, STARS);
}

fn draw_flasher(display: &mut impl DisplayPort, on: bool) {
    let (left, right) = if on {
        (FLASHER_LEFT, FLASHER_RIGHT)
    } else {
        (FLASHER_OFF, FLASHER_OFF)
    };
    print_at(display, 0, 2, left);
    print_at(display, 15, 2, right);
}

/// Advance the flash animation.  Returns `true` once it has finished.
fn step_flash(flash: &mut LimitFlash, now_ms: u32, display: &mut impl DisplayPort) -> bool {
    let due = u32::from(flash.flashes + 1) * LIMIT_FLASH_PERIOD_MS;
    if now_ms.wrapping_sub(flash.started_at_ms) < due {
        return false;
    }
    flash.flashes += 1;
    if flash.flashes >= LIMIT_FLASH_COUNT {
        return true;
    }
    flash.flasher_on = !flash.flasher_on;
    draw_flasher(display, flash.flasher_on);
    false
}
