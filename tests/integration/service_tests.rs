//! Integration tests for the ChamberService → DAQ → control → actuators
//! pipeline.
//!
//! These run on the host and verify acquisition timing, both control
//! loops and the command surface without any real hardware.

use humidosh::app::commands::{AppCommand, ControlLoop};
use humidosh::app::events::{AppEvent, Quantity};
use humidosh::calibration::{CalibrationPoint, CalibrationSlot};
use humidosh::control::humidity::HumidityLoopState;
use humidosh::error::{BusError, Error, InputError, StorageError};

use crate::bench::Bench;
use crate::mock_hw::HwCall;

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_parks_outputs_and_configures_fan() {
    let b = Bench::new();

    assert_eq!(
        &b.hw.calls[..7],
        &[
            HwCall::Pump(0),
            HwCall::WetValve(false),
            HwCall::DryValve(false),
            HwCall::FanPower(false),
            HwCall::HumidityLed(false),
            HwCall::FanLed(false),
            HwCall::FanConfigure,
        ]
    );
    assert_eq!(b.sink.events, vec![AppEvent::Started]);
    assert!(b.display.contains("Readings"));
    assert!(!b.app.humidity_control().is_active());
    assert!(!b.app.fan_control().is_active());
}

// ── Acquisition ───────────────────────────────────────────────

#[test]
fn humidity_is_fetched_only_after_settle() {
    let mut b = Bench::new();

    b.run_for(320);
    assert_eq!(b.hw.count(&HwCall::Trigger), 1);
    assert_eq!(b.hw.count(&HwCall::Fetch), 0);
    assert_eq!(b.app.readings().humidity.value(), None);

    b.step();
    assert_eq!(b.hw.count(&HwCall::Fetch), 1);
    assert_eq!(b.hw.count(&HwCall::FanFetch), 1);
    assert_eq!(b.app.readings().humidity.value(), Some(45.0));
    assert_eq!(b.app.readings().temperature.value(), Some(22.0));
    assert_eq!(b.app.readings().fan_speed.value(), Some(1200.0));
    assert!(b.display.contains("45.0"));
    // The tachometer is only meaningful while the controller drives the fan.
    assert!(b.display.contains("N/A"));
    assert!(!b.display.contains("1200"));
}

#[test]
fn fan_speed_is_shown_once_fan_control_runs() {
    let mut b = Bench::new();
    b.tap(humidosh::drivers::keypad::Key::FanToggle);
    assert!(b.app.fan_control().is_active());

    b.run_for(320);
    assert_eq!(b.hw.count(&HwCall::FanFetch), 1);
    assert!(b.display.contains("1200"));
    assert!(!b.display.contains("N/A"));
}

#[test]
fn acquisition_repeats_every_period() {
    let mut b = Bench::new();
    b.run_for(3000);
    assert_eq!(b.hw.count(&HwCall::Trigger), 3);
    assert_eq!(b.hw.count(&HwCall::Fetch), 3);
}

#[test]
fn failing_sensor_exhausts_retries_and_reports_fault() {
    let mut b = Bench::new();
    b.hw.humidity = None;

    b.run_for(400);
    assert_eq!(b.hw.count(&HwCall::Trigger), 10);
    // No fetch without an accepted trigger.
    assert_eq!(b.hw.count(&HwCall::Fetch), 0);
    assert_eq!(b.app.readings().humidity.value(), None);
    assert!(b.sink.contains(&AppEvent::SensorFault(Quantity::Humidity)));
    assert!(!b.sink.contains(&AppEvent::SensorFault(Quantity::FanSpeed)));
    assert!(b.display.contains("ERROR"));

    b.hw.humidity = Some(47.0);
    b.run_for(1000);
    assert!(b.sink.contains(&AppEvent::SensorRecovered(Quantity::Humidity)));
    assert_eq!(b.app.readings().humidity.value(), Some(47.0));
    assert_eq!(b.sink.count(&AppEvent::SensorFault(Quantity::Humidity)), 1);
}

// ── Humidity control ──────────────────────────────────────────

#[test]
fn positive_output_opens_wet_valve() {
    let mut b = Bench::with_output(120.0);
    b.app
        .handle_command(AppCommand::StartControl(ControlLoop::Humidity), &mut b.hw, &mut b.sink)
        .unwrap();
    assert!(b.sink.contains(&AppEvent::ControlStarted(ControlLoop::Humidity)));
    assert!(b.hw.humidity_led());

    // No valid reading yet: the first one only seeds the regulator.
    b.run_for(400);
    assert_eq!(b.app.humidity_control().regulator().seeds, 1);
    assert_eq!(b.app.humidity_control().regulator().computes, 0);
    assert_eq!(b.hw.pump_duty(), 0);

    b.run_for(1000);
    assert_eq!(b.app.humidity_control().regulator().computes, 1);
    assert_eq!(b.hw.pump_duty(), 120);
    assert!(b.hw.wet_valve_open());
    assert!(!b.hw.dry_valve_open());
}

#[test]
fn negative_output_opens_dry_valve() {
    let mut b = Bench::with_output(-80.0);
    b.app
        .handle_command(AppCommand::StartControl(ControlLoop::Humidity), &mut b.hw, &mut b.sink)
        .unwrap();
    b.run_for(1400);
    assert_eq!(b.hw.pump_duty(), 80);
    assert!(b.hw.dry_valve_open());
    assert!(!b.hw.wet_valve_open());
}

#[test]
fn small_output_stays_in_deadband() {
    let mut b = Bench::with_output(30.0);
    b.app
        .handle_command(AppCommand::StartControl(ControlLoop::Humidity), &mut b.hw, &mut b.sink)
        .unwrap();
    b.run_for(2400);
    assert_eq!(b.app.humidity_control().regulator().computes, 2);
    assert_eq!(b.hw.pump_duty(), 0);
    assert!(!b.hw.wet_valve_open());
    assert!(!b.hw.dry_valve_open());
}

#[test]
fn lost_reading_parks_actuators_then_reseeds() {
    let mut b = Bench::with_output(120.0);
    b.app
        .handle_command(AppCommand::StartControl(ControlLoop::Humidity), &mut b.hw, &mut b.sink)
        .unwrap();
    b.run_for(1400);
    assert_eq!(b.hw.pump_duty(), 120);

    b.hw.humidity = None;
    b.run_for(1000);
    assert_eq!(b.app.humidity_control().state(), HumidityLoopState::Recovering);
    assert_eq!(b.hw.pump_duty(), 0);
    assert!(!b.hw.wet_valve_open());

    b.hw.humidity = Some(48.0);
    b.run_for(1000);
    assert_eq!(b.app.humidity_control().state(), HumidityLoopState::Active);
    assert_eq!(b.app.humidity_control().regulator().seeds, 2);
    assert_eq!(b.app.humidity_control().regulator().computes, 1);
    assert_eq!(b.hw.pump_duty(), 0);

    b.run_for(1000);
    assert_eq!(b.app.humidity_control().regulator().computes, 2);
    assert_eq!(b.hw.pump_duty(), 120);
}

#[test]
fn stopping_humidity_control_closes_everything() {
    let mut b = Bench::with_output(200.0);
    b.app
        .handle_command(AppCommand::StartControl(ControlLoop::Humidity), &mut b.hw, &mut b.sink)
        .unwrap();
    b.run_for(1400);
    assert!(b.hw.wet_valve_open());

    b.app
        .handle_command(AppCommand::StopControl(ControlLoop::Humidity), &mut b.hw, &mut b.sink)
        .unwrap();
    assert!(b.sink.contains(&AppEvent::ControlStopped(ControlLoop::Humidity)));
    assert_eq!(b.hw.pump_duty(), 0);
    assert!(!b.hw.wet_valve_open());
    assert!(!b.hw.humidity_led());

    let computes = b.app.humidity_control().regulator().computes;
    b.run_for(2000);
    assert_eq!(b.app.humidity_control().regulator().computes, computes);
}

// ── Fan control ───────────────────────────────────────────────

#[test]
fn fan_start_and_stop() {
    let mut b = Bench::new();
    b.app
        .handle_command(AppCommand::StartControl(ControlLoop::FanSpeed), &mut b.hw, &mut b.sink)
        .unwrap();
    assert_eq!(b.hw.count(&HwCall::FanTarget(9800.0)), 1);
    assert!(b.hw.fan_powered());
    assert!(b.hw.fan_led());
    assert!(b.sink.contains(&AppEvent::ControlStarted(ControlLoop::FanSpeed)));

    b.app
        .handle_command(AppCommand::StopControl(ControlLoop::FanSpeed), &mut b.hw, &mut b.sink)
        .unwrap();
    assert_eq!(b.hw.count(&HwCall::FanTarget(0.0)), 1);
    assert!(!b.hw.fan_powered());
    assert!(!b.hw.fan_led());
    assert!(!b.app.fan_control().is_active());
}

#[test]
fn fan_start_fails_after_ten_attempts() {
    let mut b = Bench::new();
    b.hw.fan_target_failures = 10;

    let result = b.app.handle_command(
        AppCommand::StartControl(ControlLoop::FanSpeed),
        &mut b.hw,
        &mut b.sink,
    );
    assert_eq!(result, Err(Error::Bus(BusError::Timeout)));
    assert_eq!(b.hw.count(&HwCall::FanTarget(9800.0)), 10);
    assert!(!b.hw.fan_powered());
    assert!(!b.app.fan_control().is_active());
    assert!(b.sink.contains(&AppEvent::ControlStartFailed(ControlLoop::FanSpeed)));
}

#[test]
fn fan_start_succeeds_on_last_attempt() {
    let mut b = Bench::new();
    b.hw.fan_target_failures = 9;
    b.app
        .handle_command(AppCommand::StartControl(ControlLoop::FanSpeed), &mut b.hw, &mut b.sink)
        .unwrap();
    assert_eq!(b.hw.count(&HwCall::FanTarget(9800.0)), 10);
    assert!(b.app.fan_control().is_active());
}

#[test]
fn fan_target_is_pushed_while_active() {
    let mut b = Bench::new();
    b.app
        .handle_command(
            AppCommand::SetTarget {
                control: ControlLoop::FanSpeed,
                value: 3000.0,
            },
            &mut b.hw,
            &mut b.sink,
        )
        .unwrap();
    // Idle loop: stored, not pushed.
    assert_eq!(b.hw.count(&HwCall::FanTarget(3000.0)), 0);

    b.app
        .handle_command(AppCommand::StartControl(ControlLoop::FanSpeed), &mut b.hw, &mut b.sink)
        .unwrap();
    assert_eq!(b.hw.count(&HwCall::FanTarget(3000.0)), 1);

    b.app
        .handle_command(
            AppCommand::SetTarget {
                control: ControlLoop::FanSpeed,
                value: 4500.0,
            },
            &mut b.hw,
            &mut b.sink,
        )
        .unwrap();
    assert_eq!(b.hw.count(&HwCall::FanTarget(4500.0)), 1);
    assert!(b.sink.contains(&AppEvent::TargetUpdated {
        control: ControlLoop::FanSpeed,
        value: 4500.0,
    }));
}

// ── Targets ───────────────────────────────────────────────────

#[test]
fn humidity_target_range_is_inclusive() {
    fn set(b: &mut Bench, value: f64) -> Result<(), Error> {
        b.app.handle_command(
            AppCommand::SetTarget {
                control: ControlLoop::Humidity,
                value,
            },
            &mut b.hw,
            &mut b.sink,
        )
    }

    let mut b = Bench::new();

    assert_eq!(
        set(&mut b, 150.0),
        Err(Error::Input(InputError::AboveMaximum { max: 100.0 }))
    );
    assert_eq!(b.app.humidity_control().target(), 50.0);
    assert!(b.sink.contains(&AppEvent::InputRejected {
        control: ControlLoop::Humidity,
        error: InputError::AboveMaximum { max: 100.0 },
    }));

    assert_eq!(set(&mut b, 100.0), Ok(()));
    assert_eq!(b.app.humidity_control().target(), 100.0);
    assert_eq!(set(&mut b, 0.0), Ok(()));
    assert_eq!(b.app.humidity_control().target(), 0.0);
}

// ── Calibration ───────────────────────────────────────────────

#[test]
fn calibration_needs_a_valid_reading() {
    let mut b = Bench::new();
    let save = AppCommand::SaveCalibration {
        slot: CalibrationSlot::Point1,
        reference: 75.3,
    };

    assert_eq!(
        b.app.handle_command(save, &mut b.hw, &mut b.sink),
        Err(Error::Bus(BusError::NotReady))
    );
    assert_eq!(b.hw.calibration, [None, None]);

    b.run_for(400);
    b.app.handle_command(save, &mut b.hw, &mut b.sink).unwrap();
    assert_eq!(
        b.hw.calibration[0],
        Some(CalibrationPoint {
            raw: 44.0,
            reference: 75.3,
        })
    );
    assert!(b.sink.contains(&AppEvent::CalibrationSaved(CalibrationSlot::Point1)));

    b.app
        .handle_command(AppCommand::ResetCalibration, &mut b.hw, &mut b.sink)
        .unwrap();
    assert_eq!(b.hw.calibration, [None, None]);
    assert!(b.sink.contains(&AppEvent::CalibrationCleared));
}

#[test]
fn calibration_storage_failure_is_reported() {
    let mut b = Bench::new();
    b.run_for(400);
    b.hw.storage_fails = true;

    let result = b.app.handle_command(
        AppCommand::SaveCalibration {
            slot: CalibrationSlot::Point2,
            reference: 11.3,
        },
        &mut b.hw,
        &mut b.sink,
    );
    assert_eq!(result, Err(Error::Storage(StorageError::IoError)));
    assert!(!b.sink.contains(&AppEvent::CalibrationSaved(CalibrationSlot::Point2)));
}

#[test]
fn tick_count_advances() {
    let mut b = Bench::new();
    b.run_for(100);
    assert_eq!(b.app.tick_count(), 10);
}
