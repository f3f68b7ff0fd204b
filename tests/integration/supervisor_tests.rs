//! Integration tests for link supervision through the BridgeService.
//!
//! Outages are scripted against the virtual clock, so minutes of downtime
//! run instantly and restart timing can be asserted to the millisecond.

use crate::mock_hw::{RecordingSink, bridge_with, started_bridge};

use roombridge::app::events::{AppEvent, Link};
use roombridge::app::ports::RestartReason;
use roombridge::config::BridgeConfig;
use roombridge::supervisor::LinkState;

#[test]
fn network_outage_shorter_than_timeout_recovers() {
    let (mut bridge, clock) = bridge_with(BridgeConfig::default());
    bridge.network_mut().add_outage(0, Some(10_000));
    let mut sink = RecordingSink::default();

    assert!(bridge.start("roomba-test", &mut sink));

    assert!(bridge.system().restarts.is_empty());
    assert!(sink.events.contains(&AppEvent::LinkRestored {
        link: Link::Network,
        down_ms: 10_000,
    }));
    assert_eq!(bridge.network_supervisor().state(), LinkState::Up);
    assert!(bridge.network().reconnects >= 100);
    assert!(clock.now() >= 10_000);
}

#[test]
fn network_outage_at_timeout_restarts_once() {
    let (mut bridge, clock) = bridge_with(BridgeConfig::default());
    bridge.network_mut().add_outage(0, None);
    let mut sink = RecordingSink::default();

    assert!(!bridge.start("roomba-test", &mut sink));

    assert_eq!(bridge.system().restarts, [RestartReason::NetworkTimeout]);
    assert_eq!(clock.now(), 15_000);
    // Nothing else happened once the restart was requested.
    assert!(bridge.broker().client_ids.is_empty());
    assert!(!sink.events.contains(&AppEvent::Started));
}

#[test]
fn broker_that_never_returns_restarts_at_exactly_the_timeout() {
    let (mut bridge, clock, mut sink) = started_bridge();

    clock.set(1_000);
    bridge.tick(&mut (), &mut sink);
    bridge.broker_mut().add_outage(1_000, None);
    let attempts_before = bridge.broker().client_ids.len();

    bridge.tick(&mut (), &mut sink);

    assert_eq!(bridge.system().restarts, [RestartReason::BrokerTimeout]);
    assert_eq!(clock.now(), 121_000);
    // One connect attempt per 100 ms retry slot.
    assert_eq!(bridge.broker().client_ids.len() - attempts_before, 1_200);
    assert!(sink
        .events
        .contains(&AppEvent::RestartRequested(RestartReason::BrokerTimeout)));
}

#[test]
fn broker_blip_reconnects_with_fresh_client_id() {
    let (mut bridge, clock, mut sink) = started_bridge();
    let first_id = bridge.broker().client_ids[0].clone();

    clock.set(1_000);
    bridge.tick(&mut (), &mut sink);
    bridge.broker_mut().add_outage(1_000, Some(3_000));
    bridge.tick(&mut (), &mut sink);

    assert!(bridge.system().restarts.is_empty());
    assert!(sink.events.contains(&AppEvent::LinkRestored {
        link: Link::Broker,
        down_ms: 2_000,
    }));

    let broker = bridge.broker();
    let last_id = broker.client_ids.last().unwrap();
    assert!(last_id.starts_with("esp32Roomba-"));
    assert_ne!(*last_id, first_id);
    // Re-subscribed after the new session came up.
    assert_eq!(broker.subscriptions, ["roomba/commands", "roomba/commands"]);
}

#[test]
fn healthy_links_cost_no_time() {
    let (mut bridge, clock, mut sink) = started_bridge();
    clock.set(1_000);
    bridge.tick(&mut (), &mut sink);
    assert_eq!(clock.now(), 1_000);
    assert_eq!(bridge.broker().client_ids.len(), 1);
}
