//! Mock adapters for integration tests.
//!
//! A virtual clock that advances only when something waits, links whose
//! outages are scripted against that clock, a broker that records every
//! publish, and a system port that records restart requests.  The robot
//! itself is the library's `SimRobot`.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use roombridge::adapters::sim_robot::SimRobot;
use roombridge::app::events::AppEvent;
use roombridge::app::ports::{
    BrokerPort, EventSink, InboundMessage, NetworkPort, RestartReason, SystemPort, TimePort,
};
use roombridge::app::service::BridgeService;
use roombridge::config::BridgeConfig;
use roombridge::error::CommsError;

pub type TestBridge = BridgeService<SimRobot, MockNetwork, MockBroker, MockClock, MockSystem>;

// ── MockClock ─────────────────────────────────────────────────

/// Shared virtual clock.  Clones observe the same time.
#[derive(Clone, Default)]
pub struct MockClock {
    now: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl DelayNs for MockClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns) / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

impl TimePort for MockClock {
    fn now_ms(&self) -> u64 {
        self.now()
    }
}

/// Half-open outage `[from, until)`; `until == None` never ends.
#[derive(Clone, Copy, Debug)]
pub struct Outage {
    pub from: u64,
    pub until: Option<u64>,
}

impl Outage {
    fn covers(&self, now: u64) -> bool {
        now >= self.from && self.until.is_none_or(|end| now < end)
    }
}

// ── MockNetwork ───────────────────────────────────────────────

pub struct MockNetwork {
    clock: MockClock,
    outages: Vec<Outage>,
    pub reconnects: u32,
}

#[allow(dead_code)]
impl MockNetwork {
    pub fn new(clock: &MockClock) -> Self {
        Self {
            clock: clock.clone(),
            outages: Vec::new(),
            reconnects: 0,
        }
    }

    pub fn add_outage(&mut self, from: u64, until: Option<u64>) {
        self.outages.push(Outage { from, until });
    }
}

impl NetworkPort for MockNetwork {
    fn is_connected(&self) -> bool {
        let now = self.clock.now();
        !self.outages.iter().any(|o| o.covers(now))
    }

    fn reconnect(&mut self) -> Result<(), CommsError> {
        self.reconnects += 1;
        Ok(())
    }
}

// ── MockBroker ────────────────────────────────────────────────

pub struct MockBroker {
    clock: MockClock,
    outages: Vec<Outage>,
    session: bool,
    pub client_ids: Vec<String>,
    pub subscriptions: Vec<String>,
    pub published: Vec<(String, String)>,
    pub inbound: VecDeque<InboundMessage>,
}

#[allow(dead_code)]
impl MockBroker {
    pub fn new(clock: &MockClock) -> Self {
        Self {
            clock: clock.clone(),
            outages: Vec::new(),
            session: false,
            client_ids: Vec::new(),
            subscriptions: Vec::new(),
            published: Vec::new(),
            inbound: VecDeque::new(),
        }
    }

    /// The broker is unreachable for the window; any live session drops.
    pub fn add_outage(&mut self, from: u64, until: Option<u64>) {
        self.outages.push(Outage { from, until });
    }

    pub fn deliver(&mut self, topic: &str, payload: &[u8]) {
        let msg = InboundMessage::new(topic, payload).expect("message fits");
        self.inbound.push_back(msg);
    }

    pub fn published_on(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.as_str())
            .collect()
    }

    fn reachable(&self) -> bool {
        let now = self.clock.now();
        !self.outages.iter().any(|o| o.covers(now))
    }
}

impl BrokerPort for MockBroker {
    fn is_connected(&self) -> bool {
        self.session && self.reachable()
    }

    fn connect(&mut self, client_id: &str) -> Result<(), CommsError> {
        self.client_ids.push(client_id.to_owned());
        self.session = self.reachable();
        if self.session {
            Ok(())
        } else {
            Err(CommsError::MqttConnectFailed)
        }
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if !self.is_connected() {
            return Err(CommsError::NotConnected);
        }
        self.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if !self.is_connected() {
            return Err(CommsError::NotConnected);
        }
        self.published.push((topic.to_owned(), payload.to_owned()));
        Ok(())
    }

    fn poll(&mut self) -> Option<InboundMessage> {
        self.inbound.pop_front()
    }
}

// ── MockSystem ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockSystem {
    pub restarts: Vec<RestartReason>,
    counter: u32,
}

impl SystemPort for MockSystem {
    fn restart(&mut self, reason: RestartReason) {
        self.restarts.push(reason);
    }

    fn random_u32(&mut self) -> u32 {
        self.counter = self.counter.wrapping_add(0x9e37);
        self.counter
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Assembly ──────────────────────────────────────────────────

/// A bridge over fresh mocks and an idle simulated robot, not yet started.
pub fn bridge_with(config: BridgeConfig) -> (TestBridge, MockClock) {
    let clock = MockClock::new();
    let bridge = BridgeService::new(
        config,
        SimRobot::new(),
        MockNetwork::new(&clock),
        MockBroker::new(&clock),
        clock.clone(),
        MockSystem::default(),
    );
    (bridge, clock)
}

/// Default-configured bridge, started as `roomba-test`.
#[allow(dead_code)]
pub fn started_bridge() -> (TestBridge, MockClock, RecordingSink) {
    let (mut bridge, clock) = bridge_with(BridgeConfig::default());
    let mut sink = RecordingSink::default();
    assert!(bridge.start("roomba-test", &mut sink));
    (bridge, clock, sink)
}
