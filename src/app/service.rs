//! Bridge service: the hexagonal core.
//!
//! [`BridgeService`] owns the robot driver, the battery monitor, both link
//! supervisors and every port.  One call to [`BridgeService::tick`] runs a
//! full loop iteration: supervise links, poll housekeeping, pump inbound
//! commands, and sample/publish telemetry when due.
//!
//! ```text
//!  NetworkPort ──▶ ┌────────────────────────────┐ ──▶ BrokerPort (publish)
//!  BrokerPort  ──▶ │        BridgeService        │
//!                  │ Supervisors · Dispatcher ·  │ ──▶ SerialPort (robot)
//!  TimePort    ──▶ │ BatteryMonitor · Telemetry  │ ──▶ EventSink
//!                  └────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::{BridgeConfig, MqttConfig};
use crate::drivers::roomba::RoombaDriver;
use crate::drivers::songs::imperial_march;
use crate::error::DeviceError;
use crate::sensors::{BatteryMonitor, BatterySnapshot};
use crate::supervisor::{LinkSupervisor, Verdict};
use crate::telemetry;

use super::commands::RobotCommand;
use super::events::{AppEvent, Link};
use super::ports::{
    BrokerPort, EventSink, Housekeeping, LinkPort, NetworkPort, RestartReason, SerialPort,
    SystemPort, TimePort,
};

/// Pause between announcing presence and waking the robot.
const STARTUP_SETTLE_MS: u32 = 50;

// ───────────────────────────────────────────────────────────────
// Link wrappers for the supervisor
// ───────────────────────────────────────────────────────────────

struct NetworkLink<'a, N: NetworkPort>(&'a mut N);

impl<N: NetworkPort> LinkPort for NetworkLink<'_, N> {
    fn probe(&mut self) -> bool {
        self.0.is_connected()
    }

    fn reconnect(&mut self) {
        if let Err(e) = self.0.reconnect() {
            debug!("WiFi reconnect: {}", e);
        }
    }
}

/// Broker session: every attempt uses a fresh client id, re-registers the
/// last will (inside the adapter) and re-subscribes to the command topic.
struct BrokerLink<'a, B: BrokerPort, S: SystemPort> {
    broker: &'a mut B,
    system: &'a mut S,
    mqtt: &'a MqttConfig,
    commands_topic: &'a str,
}

impl<B: BrokerPort, S: SystemPort> LinkPort for BrokerLink<'_, B, S> {
    fn probe(&mut self) -> bool {
        self.broker.is_connected()
    }

    fn reconnect(&mut self) {
        let client_id = client_id(&self.mqtt.client_id_prefix, self.system.random_u32());
        if let Err(e) = self.broker.connect(&client_id) {
            debug!("MQTT connect as {}: {}", client_id, e);
            return;
        }
        match self.broker.subscribe(self.commands_topic) {
            Ok(()) => info!("MQTT connected as {}", client_id),
            Err(e) => warn!("MQTT subscribe to {} failed: {}", self.commands_topic, e),
        }
    }
}

/// `<prefix><random 16-bit hex>`.
pub fn client_id(prefix: &str, random: u32) -> String {
    format!("{}{:x}", prefix, random as u16)
}

fn publish_or_warn(broker: &mut impl BrokerPort, topic: &str, payload: &str) {
    if let Err(e) = broker.publish(topic, payload) {
        warn!("publish to {} failed: {}", topic, e);
    }
}

// ───────────────────────────────────────────────────────────────
// BridgeService
// ───────────────────────────────────────────────────────────────

pub struct BridgeService<P, N, B, T, S>
where
    P: SerialPort,
    N: NetworkPort,
    B: BrokerPort,
    T: TimePort,
    S: SystemPort,
{
    config: BridgeConfig,
    driver: RoombaDriver<P>,
    network: N,
    broker: B,
    time: T,
    system: S,
    battery: BatteryMonitor,
    network_watch: LinkSupervisor,
    broker_watch: LinkSupervisor,
    last_publish_ms: u64,
}

impl<P, N, B, T, S> BridgeService<P, N, B, T, S>
where
    P: SerialPort,
    N: NetworkPort,
    B: BrokerPort,
    T: TimePort,
    S: SystemPort,
{
    pub fn new(config: BridgeConfig, serial: P, network: N, broker: B, time: T, system: S) -> Self {
        let driver = RoombaDriver::new(serial, &config.robot);
        let battery = BatteryMonitor::new(config.limits);
        let network_watch =
            LinkSupervisor::new("WiFi", config.network_timeout_ms, config.reconnect_retry_ms);
        let broker_watch =
            LinkSupervisor::new("MQTT", config.broker_timeout_ms, config.reconnect_retry_ms);
        Self {
            config,
            driver,
            network,
            broker,
            time,
            system,
            battery,
            network_watch,
            broker_watch,
            last_publish_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring both links up, announce `hostname` on the presence topic and
    /// wake the robot.  Returns `false` if a link could not be established
    /// and a restart was requested instead.
    pub fn start(&mut self, hostname: &str, sink: &mut impl EventSink) -> bool {
        if !self.supervise_links(sink) {
            return false;
        }

        publish_or_warn(&mut self.broker, &self.config.topics.presence, hostname);
        self.time.delay_ms(STARTUP_SETTLE_MS);

        if let Err(e) = self.driver.start(&mut self.time) {
            warn!("robot wake failed: {}", e);
        }

        sink.emit(&AppEvent::Started);
        info!("bridge started as {}", hostname);
        true
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One loop iteration: links → housekeeping → inbound commands →
    /// telemetry if due.  Nothing after a restart request runs.
    pub fn tick(&mut self, housekeeping: &mut impl Housekeeping, sink: &mut impl EventSink) {
        if !self.supervise_links(sink) {
            return;
        }

        housekeeping.poll();

        while let Some(msg) = self.broker.poll() {
            self.handle_message(&msg.topic, &msg.payload, sink);
        }

        if self.telemetry_due() {
            self.sample_and_publish(sink);
        }
    }

    fn supervise_links(&mut self, sink: &mut impl EventSink) -> bool {
        let verdict = self
            .network_watch
            .check(&mut NetworkLink(&mut self.network), &mut self.time);
        if !self.apply_verdict(Link::Network, verdict, sink) {
            return false;
        }

        let mut link = BrokerLink {
            broker: &mut self.broker,
            system: &mut self.system,
            mqtt: &self.config.mqtt,
            commands_topic: &self.config.topics.commands,
        };
        let verdict = self.broker_watch.check(&mut link, &mut self.time);
        self.apply_verdict(Link::Broker, verdict, sink)
    }

    fn apply_verdict(&mut self, link: Link, verdict: Verdict, sink: &mut impl EventSink) -> bool {
        match verdict {
            Verdict::Up => true,
            Verdict::Recovered { down_ms } => {
                sink.emit(&AppEvent::LinkRestored { link, down_ms });
                true
            }
            Verdict::Restart { .. } => {
                let reason = match link {
                    Link::Network => RestartReason::NetworkTimeout,
                    Link::Broker => RestartReason::BrokerTimeout,
                };
                self.restart(reason, sink);
                false
            }
        }
    }

    fn restart(&mut self, reason: RestartReason, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::RestartRequested(reason));
        self.system.restart(reason);
    }

    // ── Command handling ──────────────────────────────────────

    /// Dispatch one inbound message.  Anything other than a known payload
    /// on the command topic is ignored.
    pub fn handle_message(&mut self, topic: &str, payload: &[u8], sink: &mut impl EventSink) {
        if topic != self.config.topics.commands {
            debug!("ignoring message on {}", topic);
            return;
        }
        let Some(command) = RobotCommand::parse(payload) else {
            debug!("ignoring command {:?}", String::from_utf8_lossy(payload));
            return;
        };
        self.dispatch(command, sink);
    }

    /// Run `command` on the robot and publish its status on success.
    pub fn dispatch(&mut self, command: RobotCommand, sink: &mut impl EventSink) {
        info!("command {:?}", command);
        if command == RobotCommand::Restart {
            self.restart(RestartReason::Commanded, sink);
            return;
        }

        match self.execute(command) {
            Ok(()) => {
                if let Some(status) = command.status() {
                    publish_or_warn(&mut self.broker, &self.config.topics.status, status);
                }
                sink.emit(&AppEvent::CommandHandled(command));
            }
            Err(error) => {
                warn!("command {:?} aborted: {}", command, error);
                sink.emit(&AppEvent::CommandFailed { command, error });
            }
        }
    }

    fn execute(&mut self, command: RobotCommand) -> Result<(), DeviceError> {
        let driver = &mut self.driver;
        let time = &mut self.time;
        match command {
            RobotCommand::Start => {
                driver.start(time)?;
                driver.safe_mode(time)?;
                driver.clean(time)
            }
            RobotCommand::Dock => {
                driver.start(time)?;
                driver.safe_mode(time)?;
                driver.dock(time)
            }
            RobotCommand::PowerOff => {
                driver.start(time)?;
                driver.power_off(time)
            }
            RobotCommand::PlayAnthem => self.play_anthem(),
            RobotCommand::Restart => Ok(()),
        }
    }

    /// Program and play the four-part tune.  Parts are loaded two at a
    /// time; each is played from Full mode and waited out before the next.
    /// Blocks the loop for the length of the tune.
    fn play_anthem(&mut self) -> Result<(), DeviceError> {
        let driver = &mut self.driver;
        let time = &mut self.time;
        let [a, b, c, d] = imperial_march();

        driver.start(time)?;
        for pair in [[a, b], [c, d]] {
            for part in &pair {
                driver.load_song(part.slot, &part.sequence, time)?;
            }
            for part in &pair {
                driver.full_mode(time)?;
                driver.play_song(part.slot, time)?;
                time.delay_ms(part.sequence.duration_ms());
            }
        }
        driver.start(time)
    }

    // ── Telemetry ─────────────────────────────────────────────

    fn telemetry_due(&self) -> bool {
        self.time.now_ms().saturating_sub(self.last_publish_ms) >= self.config.telemetry_interval_ms
    }

    /// Sample every battery channel, report rejected readings on the debug
    /// topic, then publish the committed values.
    pub fn sample_and_publish(&mut self, sink: &mut impl EventSink) {
        let report = self.battery.sample_all(&mut self.driver, &mut self.time);

        for rejection in &report.rejected {
            publish_or_warn(
                &mut self.broker,
                &self.config.topics.debug,
                &rejection.to_string(),
            );
            sink.emit(&AppEvent::ReadingRejected(*rejection));
        }
        for failure in &report.failed {
            sink.emit(&AppEvent::ReadFailed(*failure));
        }

        let snapshot = self.battery.snapshot();
        for msg in telemetry::messages(&self.config.topics, &snapshot) {
            publish_or_warn(&mut self.broker, msg.topic, &msg.payload);
        }
        sink.emit(&AppEvent::Telemetry(snapshot));

        self.last_publish_ms = self.time.now_ms();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn battery(&self) -> BatterySnapshot {
        self.battery.snapshot()
    }

    pub fn driver(&self) -> &RoombaDriver<P> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut RoombaDriver<P> {
        &mut self.driver
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    pub fn time(&self) -> &T {
        &self.time
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    pub fn network_supervisor(&self) -> &LinkSupervisor {
        &self.network_watch
    }

    pub fn broker_supervisor(&self) -> &LinkSupervisor {
        &self.broker_watch
    }
}
