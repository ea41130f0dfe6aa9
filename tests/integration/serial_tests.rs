//! Integration tests for the host serial link: command frames in,
//! acknowledgements and telemetry out.

use humidosh::app::commands::{AppCommand, ControlLoop};
use humidosh::app::events::AppEvent;

use crate::bench::Bench;

#[test]
fn start_command_is_acknowledged() {
    let mut b = Bench::new();
    b.send("^d@");
    b.step();

    assert_eq!(b.lines(), vec!["^r|d|y@\n"]);
    assert!(b.app.is_streaming());
    assert!(b.sink.contains(&AppEvent::TelemetryStreaming(true)));
}

#[test]
fn telemetry_follows_every_acquisition() {
    let mut b = Bench::new();
    b.send("^d@");
    b.run_for(400);
    assert_eq!(b.lines(), vec!["^r|d|y@\n", "^d|45.0|22.0|1200|i|i@\n"]);

    b.hw.humidity = Some(46.27);
    b.run_for(1000);
    assert_eq!(b.lines(), vec!["^d|46.3|22.0|1200|i|i@\n"]);
    assert_eq!(
        b.sink
            .events
            .iter()
            .filter(|e| matches!(e, AppEvent::Telemetry(_)))
            .count(),
        2
    );
}

#[test]
fn telemetry_reports_active_targets_and_failed_readings() {
    let mut b = Bench::new();
    b.hw.fan_rpm = None;
    b.app
        .handle_command(AppCommand::StartControl(ControlLoop::Humidity), &mut b.hw, &mut b.sink)
        .unwrap();
    b.send("^d@");
    b.run_for(400);
    assert_eq!(b.lines(), vec!["^r|d|y@\n", "^d|45.0|22.0|e|50.0|i@\n"]);
}

#[test]
fn failed_humidity_hides_temperature() {
    let mut b = Bench::new();
    b.hw.humidity = None;
    b.app
        .handle_command(AppCommand::StartControl(ControlLoop::FanSpeed), &mut b.hw, &mut b.sink)
        .unwrap();
    b.send("^d@");
    b.run_for(400);
    assert_eq!(b.lines(), vec!["^r|d|y@\n", "^d|e|e|1200|i|9800@\n"]);
}

#[test]
fn stop_command_ends_streaming() {
    let mut b = Bench::new();
    b.send("^d@");
    b.run_for(400);
    b.lines();

    b.send("^s@");
    b.run_for(2000);
    assert_eq!(b.lines(), vec!["^r|s|y@\n"]);
    assert!(!b.app.is_streaming());
    assert!(b.sink.contains(&AppEvent::TelemetryStreaming(false)));
}

#[test]
fn nothing_is_sent_unless_streaming() {
    let mut b = Bench::new();
    b.run_for(3000);
    assert!(b.lines().is_empty());
}

#[test]
fn malformed_frames_are_dropped_silently() {
    let mut b = Bench::new();
    for line in ["^x@", "d@", "^d@garbage", "^d|1@", "^d", "^@"] {
        b.send(line);
    }
    b.step();
    assert!(b.lines().is_empty());
    assert!(!b.app.is_streaming());

    // The reader resynchronises on the next start delimiter.
    b.send("^d@");
    b.step();
    assert_eq!(b.lines(), vec!["^r|d|y@\n"]);
}

#[test]
fn frame_split_across_polls() {
    let mut b = Bench::new();
    b.serial.push_rx(b"^");
    b.step();
    b.serial.push_rx(b"s");
    b.step();
    assert!(b.lines().is_empty());

    b.serial.push_rx(b"@\n");
    b.step();
    assert_eq!(b.lines(), vec!["^r|s|y@\n"]);
}

#[test]
fn carriage_returns_are_tolerated_between_lines() {
    let mut b = Bench::new();
    b.serial.push_rx(b"^d@\n\r\n^s@\n");
    b.step();
    assert_eq!(b.lines(), vec!["^r|d|y@\n", "^r|s|y@\n"]);
}
