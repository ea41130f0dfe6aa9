//! Keypad flows through the full service: start/stop gestures, target
//! entry, limit screens and calibration.

use humidosh::app::commands::ControlLoop;
use humidosh::app::events::AppEvent;
use humidosh::calibration::CalibrationPoint;
use humidosh::drivers::keypad::{Key, KeyEdge};
use humidosh::error::InputError;
use humidosh::ui::ScreenPage;

use crate::bench::Bench;

const H: Key = Key::HumidityToggle;
const F: Key = Key::FanToggle;

// ── Start / stop ──────────────────────────────────────────────

#[test]
fn short_press_starts_control() {
    let mut b = Bench::new();
    b.tap(H);
    assert!(b.app.humidity_control().is_active());
    assert!(b.sink.contains(&AppEvent::ControlStarted(ControlLoop::Humidity)));

    b.tap(F);
    assert!(b.app.fan_control().is_active());
    assert!(b.hw.fan_powered());
}

#[test]
fn short_press_on_active_loop_does_nothing() {
    let mut b = Bench::new();
    b.tap(H);
    b.tap(H);
    assert!(b.app.humidity_control().is_active());
    assert_eq!(
        b.sink.count(&AppEvent::ControlStarted(ControlLoop::Humidity)),
        1
    );
    assert!(!b.sink.contains(&AppEvent::ControlStopped(ControlLoop::Humidity)));
}

#[test]
fn hold_for_full_duration_stops_control() {
    let mut b = Bench::new();
    b.tap(H);

    b.key(H, KeyEdge::Pressed);
    b.key(H, KeyEdge::Held);
    b.step();
    assert_eq!(b.page(), ScreenPage::Hold);
    assert!(b.display.contains("Hold button for"));

    b.run_for(2980);
    assert_eq!(b.app.ui().hold().map(|g| g.seconds_remaining), Some(1));
    assert!(b.app.humidity_control().is_active());

    b.step();
    assert_eq!(b.page(), ScreenPage::Readings);
    assert!(!b.app.humidity_control().is_active());
    assert!(b.sink.contains(&AppEvent::ControlStopped(ControlLoop::Humidity)));

    // Letting go afterwards must not restart the loop.
    b.key(H, KeyEdge::Released);
    b.step();
    assert!(!b.app.humidity_control().is_active());
}

#[test]
fn early_release_cancels_hold() {
    let mut b = Bench::new();
    b.tap(F);

    b.key(F, KeyEdge::Pressed);
    b.key(F, KeyEdge::Held);
    b.run_for(1500);
    assert_eq!(b.app.ui().hold().map(|g| g.seconds_remaining), Some(2));

    b.key(F, KeyEdge::Released);
    b.step();
    assert_eq!(b.page(), ScreenPage::Readings);
    assert!(b.app.fan_control().is_active());

    b.run_for(3000);
    assert!(b.app.fan_control().is_active());
}

#[test]
fn long_press_on_idle_loop_does_not_start_it() {
    let mut b = Bench::new();
    b.key(H, KeyEdge::Pressed);
    b.key(H, KeyEdge::Held);
    b.run_for(1000);
    b.key(H, KeyEdge::Released);
    b.step();
    assert_eq!(b.page(), ScreenPage::Readings);
    assert!(!b.app.humidity_control().is_active());
}

// ── Target entry ──────────────────────────────────────────────

#[test]
fn settings_key_walks_every_menu() {
    let mut b = Bench::new();
    b.tap(Key::Settings);
    assert_eq!(b.page(), ScreenPage::HumidityAdjust);
    assert!(b.display.contains("Relative humidity(%)"));

    b.type_str("55");
    b.tap(Key::Settings);
    assert_eq!(b.page(), ScreenPage::FanSpeedAdjust);
    assert_eq!(b.app.humidity_control().target(), 55.0);
    assert!(b.sink.contains(&AppEvent::TargetUpdated {
        control: ControlLoop::Humidity,
        value: 55.0,
    }));

    b.tap(Key::Settings);
    assert_eq!(b.page(), ScreenPage::Calibration);
    assert_eq!(b.app.fan_control().target(), 9800.0);

    b.tap(Key::Settings);
    assert_eq!(b.page(), ScreenPage::Readings);
}

#[test]
fn decimal_entry_and_delete() {
    let mut b = Bench::new();
    b.tap(Key::Settings);
    b.type_str("50.55");
    assert_eq!(b.app.ui().editor().text(), "50.5");

    b.type_str("d");
    assert_eq!(b.app.ui().editor().text(), "50.");
    b.type_str("d");
    assert_eq!(b.app.ui().editor().text(), "50");
    assert!(b.display.row_text(3).ends_with("  50"));

    b.tap(Key::Settings);
    assert_eq!(b.app.humidity_control().target(), 50.0);
}

#[test]
fn value_above_maximum_flashes_then_returns() {
    let mut b = Bench::new();
    b.tap(Key::Settings);
    b.type_str("150");
    b.tap(Key::Settings);

    assert_eq!(b.page(), ScreenPage::MaxValueError);
    assert!(b.display.contains("Maximum value is"));
    assert!(b.display.contains("100.0"));
    assert!(b.sink.contains(&AppEvent::InputRejected {
        control: ControlLoop::Humidity,
        error: InputError::AboveMaximum { max: 100.0 },
    }));
    assert_eq!(b.app.humidity_control().target(), 50.0);

    // Keys are ignored while flashing.
    b.tap(Key::Settings);
    assert_eq!(b.page(), ScreenPage::MaxValueError);

    b.run_for(4300);
    assert_eq!(b.page(), ScreenPage::HumidityAdjust);
    assert!(b.app.ui().editor().is_empty());
}

#[test]
fn fan_value_below_minimum_flashes() {
    let mut b = Bench::new();
    b.tap(Key::Settings);
    b.tap(Key::Settings);
    b.type_str("500");
    b.tap(Key::Settings);

    assert_eq!(b.page(), ScreenPage::MinValueError);
    assert!(b.display.contains("Minimum value is"));
    assert!(b.display.contains("1000"));
    assert_eq!(b.app.fan_control().target(), 9800.0);

    b.run_for(4300);
    assert_eq!(b.page(), ScreenPage::FanSpeedAdjust);
}

// ── Calibration ───────────────────────────────────────────────

fn open_calibration(b: &mut Bench) {
    for _ in 0..3 {
        b.tap(Key::Settings);
    }
    assert_eq!(b.page(), ScreenPage::Calibration);
}

#[test]
fn calibration_point_is_saved_from_keypad() {
    let mut b = Bench::new();
    b.run_for(400);
    open_calibration(&mut b);

    b.tap(Key::Digit(1));
    assert_eq!(b.page(), ScreenPage::CalibrationPoint);
    assert!(b.display.contains("N/A"));
    assert!(b.display.contains("44.0"));

    b.type_str("75.3");
    b.tap(Key::Settings);
    assert_eq!(b.page(), ScreenPage::Calibration);
    assert_eq!(
        b.hw.calibration[0],
        Some(CalibrationPoint {
            raw: 44.0,
            reference: 75.3,
        })
    );

    // The stored point is shown next time.
    b.tap(Key::Digit(1));
    assert!(b.display.contains("75.3"));
    assert!(!b.display.contains("N/A"));
}

#[test]
fn empty_calibration_entry_saves_nothing() {
    let mut b = Bench::new();
    b.run_for(400);
    open_calibration(&mut b);
    b.tap(Key::Digit(2));
    b.tap(Key::Settings);
    assert_eq!(b.page(), ScreenPage::Calibration);
    assert_eq!(b.hw.calibration, [None, None]);
}

#[test]
fn calibration_reset_needs_confirmation() {
    let mut b = Bench::new();
    b.hw.calibration[0] = Some(CalibrationPoint {
        raw: 44.0,
        reference: 45.0,
    });
    open_calibration(&mut b);

    b.tap(Key::Digit(3));
    assert_eq!(b.page(), ScreenPage::CalibrationReset);
    b.tap(Key::Digit(4));
    assert_eq!(b.page(), ScreenPage::CalibrationReset);

    b.tap(Key::Digit(5));
    assert_eq!(b.page(), ScreenPage::Calibration);
    assert_eq!(b.hw.calibration, [None, None]);
    assert!(b.sink.contains(&AppEvent::CalibrationCleared));
}

#[test]
fn calibration_reset_times_out() {
    let mut b = Bench::new();
    b.hw.calibration[1] = Some(CalibrationPoint {
        raw: 80.0,
        reference: 75.3,
    });
    open_calibration(&mut b);

    b.tap(Key::Digit(3));
    b.run_for(2100);
    assert_eq!(b.page(), ScreenPage::Calibration);
    assert!(b.hw.calibration[1].is_some());
    assert!(!b.sink.contains(&AppEvent::CalibrationCleared));
}
