//! The bridge over the library's own host simulations of the WiFi station
//! and the MQTT session, instead of the scripted mocks.

use crate::mock_hw::{MockClock, MockSystem, RecordingSink};

use roombridge::adapters::mqtt::{MqttAdapter, WILL_PAYLOAD};
use roombridge::adapters::sim_robot::SimRobot;
use roombridge::adapters::wifi::WifiAdapter;
use roombridge::app::events::{AppEvent, Link};
use roombridge::app::ports::RestartReason;
use roombridge::app::service::BridgeService;
use roombridge::config::BridgeConfig;

type SimBridge = BridgeService<SimRobot, WifiAdapter, MqttAdapter, MockClock, MockSystem>;

const COMMANDS: &str = "roomba/commands";
const STATUS: &str = "roomba/status";

fn sim_bridge() -> (SimBridge, MockClock, RecordingSink) {
    let config = BridgeConfig::default();
    let broker = MqttAdapter::new(&config.topics.status);
    let clock = MockClock::new();
    let mut bridge = BridgeService::new(
        config,
        SimRobot::new(),
        WifiAdapter::new(),
        broker,
        clock.clone(),
        MockSystem::default(),
    );
    let mut sink = RecordingSink::default();
    assert!(bridge.start("roomba-test", &mut sink));
    (bridge, clock, sink)
}

#[test]
fn start_associates_and_opens_one_session() {
    let (bridge, _clock, _sink) = sim_bridge();

    assert_eq!(bridge.network().attempts(), 1);
    assert_eq!(bridge.broker().client_ids().len(), 1);
    assert_eq!(bridge.broker().subscriptions(), [COMMANDS]);
    assert_eq!(bridge.broker().published_on("online"), ["roomba-test"]);
}

#[test]
fn dropped_session_reconnects_with_new_id_and_resubscribes() {
    let (mut bridge, _clock, mut sink) = sim_bridge();

    bridge.broker_mut().drop_session();
    bridge.tick(&mut (), &mut sink);

    let broker = bridge.broker();
    assert_eq!(broker.published_on(STATUS), [WILL_PAYLOAD]);
    assert_eq!(broker.client_ids().len(), 2);
    assert_ne!(broker.client_ids()[0], broker.client_ids()[1]);
    assert_eq!(broker.subscriptions(), [COMMANDS, COMMANDS]);
    assert!(bridge.system().restarts.is_empty());
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::LinkRestored { link: Link::Broker, .. }
    )));
}

#[test]
fn refused_sessions_end_in_broker_restart() {
    let (mut bridge, clock, mut sink) = sim_bridge();
    let lost_at = clock.now();

    bridge.broker_mut().set_accepting(false);
    bridge.broker_mut().drop_session();
    bridge.tick(&mut (), &mut sink);

    assert_eq!(bridge.system().restarts, [RestartReason::BrokerTimeout]);
    assert!(clock.now() - lost_at >= 119_000);
    assert!(bridge.broker().client_ids().len() > 1_000);
    assert_eq!(bridge.broker().subscriptions(), [COMMANDS]);
}

#[test]
fn lost_station_that_never_reassociates_restarts() {
    let (mut bridge, _clock, mut sink) = sim_bridge();

    bridge.network_mut().set_reconnect_succeeds(false);
    bridge.network_mut().set_connected(false);
    bridge.tick(&mut (), &mut sink);

    assert_eq!(bridge.system().restarts, [RestartReason::NetworkTimeout]);
    assert!(bridge.network().attempts() > 100);
}
