//! Integration tests for the BridgeService → driver → robot pipeline.
//!
//! These run on the host against the simulated robot and verify command
//! dispatch, status reporting and the telemetry cadence end to end.

use crate::mock_hw::{RecordingSink, TestBridge, started_bridge};

use roombridge::adapters::sim_robot::{OiMode, RobotAction, SimRobot};
use roombridge::app::commands::RobotCommand;
use roombridge::app::events::AppEvent;
use roombridge::app::ports::RestartReason;
use roombridge::drivers::roomba::SensorPacket;
use roombridge::drivers::songs::imperial_march;
use roombridge::sensors::Channel;

const COMMANDS: &str = "roomba/commands";
const STATUS: &str = "roomba/status";

fn robot(bridge: &TestBridge) -> &SimRobot {
    bridge.driver().port()
}

fn robot_mut(bridge: &mut TestBridge) -> &mut SimRobot {
    bridge.driver_mut().port_mut()
}

fn send(bridge: &mut TestBridge, sink: &mut RecordingSink, payload: &str) {
    robot_mut(bridge).clear_actions();
    bridge.handle_message(COMMANDS, payload.as_bytes(), sink);
}

fn stock_battery(bridge: &mut TestBridge) {
    let r = robot_mut(bridge);
    r.set_sensor(SensorPacket::Capacity, 2100);
    r.set_sensor(SensorPacket::Charge, 1050);
    r.set_sensor(SensorPacket::ChargingState, 2);
    r.set_sensor(SensorPacket::Voltage, 16_430);
    r.set_sensor(SensorPacket::Current, (-1200i16) as u16);
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn start_announces_presence_and_wakes_robot() {
    let (bridge, _clock, sink) = started_bridge();

    assert_eq!(bridge.broker().published_on("online"), ["roomba-test"]);
    assert_eq!(bridge.broker().subscriptions, [COMMANDS]);
    assert_eq!(bridge.broker().client_ids.len(), 1);
    assert!(bridge.broker().client_ids[0].starts_with("esp32Roomba-"));
    assert_eq!(robot(&bridge).mode(), OiMode::Passive);
    assert!(sink.events.contains(&AppEvent::Started));
}

// ── Command dispatch ──────────────────────────────────────────

#[test]
fn start_cleans_and_reports_cleaning() {
    let (mut bridge, _clock, mut sink) = started_bridge();
    send(&mut bridge, &mut sink, "start");

    assert_eq!(
        robot(&bridge).actions(),
        [RobotAction::Start, RobotAction::Safe, RobotAction::Clean]
    );
    assert_eq!(bridge.broker().published_on(STATUS), ["cleaning"]);
    assert!(sink.events.contains(&AppEvent::CommandHandled(RobotCommand::Start)));
}

#[test]
fn stop_seeks_dock() {
    let (mut bridge, _clock, mut sink) = started_bridge();
    send(&mut bridge, &mut sink, "stop");

    assert_eq!(
        robot(&bridge).actions(),
        [RobotAction::Start, RobotAction::Safe, RobotAction::SeekDock]
    );
    assert_eq!(bridge.broker().published_on(STATUS), ["dock"]);
}

#[test]
fn power_turns_robot_off() {
    let (mut bridge, _clock, mut sink) = started_bridge();
    send(&mut bridge, &mut sink, "power");

    assert_eq!(
        robot(&bridge).actions(),
        [RobotAction::Start, RobotAction::PowerDown]
    );
    assert_eq!(robot(&bridge).mode(), OiMode::Off);
    assert_eq!(bridge.broker().published_on(STATUS), ["power"]);
}

#[test]
fn commands_arrive_through_the_broker_on_tick() {
    let (mut bridge, _clock, mut sink) = started_bridge();
    robot_mut(&mut bridge).clear_actions();
    bridge.broker_mut().deliver(COMMANDS, b"start");

    bridge.tick(&mut (), &mut sink);

    assert!(robot(&bridge).actions().contains(&RobotAction::Clean));
    assert_eq!(bridge.broker().published_on(STATUS), ["cleaning"]);
    assert!(bridge.broker().inbound.is_empty());
}

#[test]
fn only_exact_payloads_are_commands() {
    for payload in ["Start", "start ", " start", "START", "clean", ""] {
        let (mut bridge, _clock, mut sink) = started_bridge();
        send(&mut bridge, &mut sink, payload);
        assert!(robot(&bridge).actions().is_empty(), "payload {payload:?}");
        assert!(bridge.broker().published_on(STATUS).is_empty());
    }
}

#[test]
fn messages_on_other_topics_are_ignored() {
    let (mut bridge, _clock, mut sink) = started_bridge();
    robot_mut(&mut bridge).clear_actions();
    bridge.handle_message(STATUS, b"start", &mut sink);
    bridge.handle_message("roomba/commands/extra", b"start", &mut sink);

    assert!(robot(&bridge).actions().is_empty());
    assert!(bridge.broker().published_on(STATUS).is_empty());
}

#[test]
fn non_utf8_payload_is_ignored() {
    let (mut bridge, _clock, mut sink) = started_bridge();
    robot_mut(&mut bridge).clear_actions();
    bridge.handle_message(COMMANDS, &[0xff, 0xfe, b's'], &mut sink);
    assert!(robot(&bridge).actions().is_empty());
}

#[test]
fn imperial_loads_and_plays_all_four_parts() {
    let (mut bridge, clock, mut sink) = started_bridge();
    let before = clock.now();
    send(&mut bridge, &mut sink, "imperial");

    use RobotAction::*;
    assert_eq!(
        robot(&bridge).actions(),
        [
            Start,
            LoadSong(1),
            LoadSong(2),
            Full,
            PlaySong(1),
            Full,
            PlaySong(2),
            LoadSong(3),
            LoadSong(4),
            Full,
            PlaySong(3),
            Full,
            PlaySong(4),
            Start,
        ]
    );

    let expected: Vec<_> = imperial_march()
        .into_iter()
        .map(|p| (p.slot, p.sequence))
        .collect();
    assert_eq!(robot(&bridge).played(), expected.as_slice());

    // Playback is waited out in full.
    let tune_ms: u64 = expected.iter().map(|(_, s)| u64::from(s.duration_ms())).sum();
    assert!(clock.now() - before >= tune_ms);
    assert!(bridge.broker().published_on(STATUS).is_empty());
}

#[test]
fn restart_command_restarts_immediately() {
    let (mut bridge, _clock, mut sink) = started_bridge();
    send(&mut bridge, &mut sink, "restart");

    assert_eq!(bridge.system().restarts, [RestartReason::Commanded]);
    assert!(robot(&bridge).actions().is_empty());
    assert!(sink
        .events
        .contains(&AppEvent::RestartRequested(RestartReason::Commanded)));
}

#[test]
fn serial_failure_aborts_without_status() {
    let (mut bridge, _clock, mut sink) = started_bridge();
    robot_mut(&mut bridge).set_write_failure(true);
    send(&mut bridge, &mut sink, "start");

    assert!(bridge.broker().published_on(STATUS).is_empty());
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::CommandFailed { command: RobotCommand::Start, .. }
    )));
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_publishes_once_per_interval() {
    let (mut bridge, clock, mut sink) = started_bridge();
    stock_battery(&mut bridge);

    bridge.tick(&mut (), &mut sink);
    assert!(bridge.broker().published_on("roomba/battery/capacity").is_empty());

    clock.set(10_000);
    bridge.tick(&mut (), &mut sink);
    bridge.tick(&mut (), &mut sink);

    let broker = bridge.broker();
    assert_eq!(broker.published_on("roomba/battery/percentage"), ["50"]);
    assert_eq!(broker.published_on("roomba/battery/capacity"), ["2100"]);
    assert_eq!(broker.published_on("roomba/battery/charge"), ["1050"]);
    assert_eq!(broker.published_on("roomba/battery/voltage"), ["16.43"]);
    assert_eq!(broker.published_on("roomba/battery/current"), ["-1200"]);
    assert_eq!(broker.published_on("roomba/charge"), ["2"]);

    clock.advance(10_000);
    bridge.tick(&mut (), &mut sink);
    assert_eq!(bridge.broker().published_on("roomba/battery/capacity").len(), 2);
}

#[test]
fn garbage_capacity_is_reported_and_discarded() {
    let (mut bridge, clock, mut sink) = started_bridge();
    stock_battery(&mut bridge);
    clock.set(10_000);
    bridge.tick(&mut (), &mut sink);
    assert_eq!(bridge.battery().capacity_mah, 2100);

    robot_mut(&mut bridge).set_sensor(SensorPacket::Capacity, 6210);
    clock.advance(10_000);
    bridge.tick(&mut (), &mut sink);

    assert_eq!(bridge.battery().capacity_mah, 2100);
    let debug = bridge.broker().published_on("roomba/debug");
    assert_eq!(debug.len(), 1);
    assert!(debug[0].contains("6210"));
    assert_eq!(
        bridge.broker().published_on("roomba/battery/capacity"),
        ["2100", "2100"]
    );
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ReadingRejected(r) if r.channel == Channel::Capacity
    )));
}

#[test]
fn unanswered_query_keeps_last_value() {
    let (mut bridge, clock, mut sink) = started_bridge();
    stock_battery(&mut bridge);
    clock.set(10_000);
    bridge.tick(&mut (), &mut sink);

    let r = robot_mut(&mut bridge);
    r.set_sensor(SensorPacket::Capacity, 3000);
    r.drop_responses(1);
    clock.advance(10_000);
    bridge.tick(&mut (), &mut sink);

    assert_eq!(bridge.battery().capacity_mah, 2100);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::ReadFailed(f) if f.channel == Channel::Capacity
    )));
    assert!(bridge.broker().published_on("roomba/debug").is_empty());
}

#[test]
fn implausible_voltage_and_current_are_reported_together() {
    let (mut bridge, clock, mut sink) = started_bridge();
    stock_battery(&mut bridge);
    clock.set(10_000);
    bridge.tick(&mut (), &mut sink);

    let r = robot_mut(&mut bridge);
    r.set_sensor(SensorPacket::Voltage, 65_535);
    r.set_sensor(SensorPacket::Current, i16::MIN as u16);
    clock.advance(10_000);
    bridge.tick(&mut (), &mut sink);

    let broker = bridge.broker();
    assert_eq!(
        broker.published_on("roomba/debug"),
        ["Voltage : 65.54", "Current : -32768"]
    );
    assert_eq!(broker.published_on("roomba/battery/voltage"), ["16.43", "16.43"]);
    assert_eq!(broker.published_on("roomba/battery/current"), ["-1200", "-1200"]);
}

#[test]
fn percentage_uses_committed_capacity_when_capacity_is_rejected() {
    let (mut bridge, clock, mut sink) = started_bridge();
    stock_battery(&mut bridge);
    clock.set(10_000);
    bridge.tick(&mut (), &mut sink);

    let r = robot_mut(&mut bridge);
    r.set_sensor(SensorPacket::Capacity, 6210);
    r.set_sensor(SensorPacket::Charge, 1575);
    clock.advance(10_000);
    bridge.tick(&mut (), &mut sink);

    let broker = bridge.broker();
    assert_eq!(broker.published_on("roomba/debug"), ["Capacity : 6210"]);
    assert_eq!(broker.published_on("roomba/battery/capacity"), ["2100", "2100"]);
    assert_eq!(broker.published_on("roomba/battery/charge"), ["1050", "1575"]);
    assert_eq!(broker.published_on("roomba/battery/percentage"), ["50", "75"]);
}
