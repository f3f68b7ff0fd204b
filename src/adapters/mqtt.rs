//! MQTT session adapter.
//!
//! Implements [`BrokerPort`].  Every [`BrokerPort::connect`] tears down the
//! previous client and opens a new one under the given client id, with the
//! last-will message (`disconnected` on the status topic) registered.
//!
//! Inbound messages arrive on the client's event thread.  They are pushed
//! into an [`Inbox`], a bounded channel plus a connected flag, and drained
//! by the main loop through [`BrokerPort::poll`].  A full inbox drops the
//! message with a warning rather than blocking the event thread.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` from `esp_idf_svc::mqtt`.
//! - **all other targets**: an in-memory broker that records publishes.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};

use crate::app::ports::{BrokerPort, InboundMessage};
use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    Details, EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration, QoS,
};

/// Messages that may wait between two loop ticks.
pub const INBOX_DEPTH: usize = 8;

/// Last-will payload published by the broker when the session dies.
pub const WILL_PAYLOAD: &str = "disconnected";

// ───────────────────────────────────────────────────────────────
// Inbox (event thread → main loop)
// ───────────────────────────────────────────────────────────────

pub struct Inbox {
    queue: Channel<CriticalSectionRawMutex, InboundMessage, INBOX_DEPTH>,
    connected: AtomicBool,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub const fn new() -> Self {
        Self {
            queue: Channel::new(),
            connected: AtomicBool::new(false),
        }
    }

    pub fn push(&self, topic: &str, payload: &[u8]) {
        let Some(msg) = InboundMessage::new(topic, payload) else {
            warn!("MQTT: dropping oversized message on {}", topic);
            return;
        };
        if self.queue.try_send(msg).is_err() {
            warn!("MQTT: inbox full, dropping message on {}", topic);
        }
    }

    pub fn take(&self) -> Option<InboundMessage> {
        self.queue.try_receive().ok()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF client
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct MqttAdapter {
    url: String,
    username: Option<String>,
    password: Option<String>,
    will_topic: String,
    connect_timeout_ms: u32,
    client: Option<EspMqttClient<'static>>,
    inbox: Arc<Inbox>,
}

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    /// Poll interval while waiting for the session to come up.
    const CONNECT_POLL_MS: u32 = 50;

    pub fn new(
        url: String,
        credentials: &crate::config::Credentials,
        will_topic: &str,
        connect_timeout_ms: u32,
    ) -> Self {
        Self {
            url,
            username: credentials.mqtt_user.clone(),
            password: credentials.mqtt_password.clone(),
            will_topic: will_topic.to_owned(),
            connect_timeout_ms,
            client: None,
            inbox: Arc::new(Inbox::new()),
        }
    }

    fn on_event(inbox: &Inbox, payload: EventPayload<'_, esp_idf_svc::sys::EspError>) {
        match payload {
            EventPayload::Connected(_) => inbox.set_connected(true),
            EventPayload::Disconnected => inbox.set_connected(false),
            EventPayload::Received {
                topic: Some(topic),
                data,
                details: Details::Complete,
                ..
            } => inbox.push(topic, data),
            EventPayload::Error(e) => warn!("MQTT: client error: {:?}", e),
            _ => {}
        }
    }
}

#[cfg(target_os = "espidf")]
impl BrokerPort for MqttAdapter {
    fn is_connected(&self) -> bool {
        self.client.is_some() && self.inbox.is_connected()
    }

    fn connect(&mut self, client_id: &str) -> Result<(), CommsError> {
        use esp_idf_svc::hal::delay::FreeRtos;

        self.client = None;
        self.inbox.set_connected(false);

        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            username: self.username.as_deref(),
            password: self.password.as_deref(),
            lwt: Some(LwtConfiguration {
                topic: &self.will_topic,
                payload: WILL_PAYLOAD.as_bytes(),
                qos: QoS::AtMostOnce,
                retain: false,
            }),
            ..Default::default()
        };
        let inbox = Arc::clone(&self.inbox);
        let client = EspMqttClient::new_cb(&self.url, &conf, move |event| {
            Self::on_event(&inbox, event.payload());
        })
        .map_err(|e| {
            warn!("MQTT: client create failed: {}", e);
            CommsError::MqttConnectFailed
        })?;
        self.client = Some(client);

        let mut waited = 0;
        while !self.inbox.is_connected() {
            if waited >= self.connect_timeout_ms {
                return Err(CommsError::MqttConnectFailed);
            }
            FreeRtos::delay_ms(Self::CONNECT_POLL_MS);
            waited += Self::CONNECT_POLL_MS;
        }
        info!("MQTT: session up as {}", client_id);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
        client
            .subscribe(topic, QoS::AtMostOnce)
            .map(|_| ())
            .map_err(|_| CommsError::MqttSubscribeFailed)
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .map(|_| ())
            .map_err(|_| CommsError::MqttPublishFailed)
    }

    fn poll(&mut self) -> Option<InboundMessage> {
        self.inbox.take()
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// In-memory broker session.  Accepts connections unless told otherwise,
/// records every publish, and delivers test messages through the same
/// [`Inbox`] the real client uses.
#[cfg(not(target_os = "espidf"))]
pub struct MqttAdapter {
    will_topic: String,
    inbox: Arc<Inbox>,
    accept: bool,
    client_ids: Vec<String>,
    subscriptions: Vec<String>,
    published: Vec<(String, String)>,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn new(will_topic: &str) -> Self {
        Self {
            will_topic: will_topic.to_owned(),
            inbox: Arc::new(Inbox::new()),
            accept: true,
            client_ids: Vec::new(),
            subscriptions: Vec::new(),
            published: Vec::new(),
        }
    }

    /// Whether future connects succeed.
    pub fn set_accepting(&mut self, accept: bool) {
        self.accept = accept;
    }

    /// Drop the current session uncleanly.  The broker publishes the last
    /// will on the status topic.
    pub fn drop_session(&mut self) {
        if self.inbox.is_connected() {
            self.inbox.set_connected(false);
            self.published
                .push((self.will_topic.clone(), WILL_PAYLOAD.to_owned()));
        }
    }

    /// Queue an inbound message, as the client's event thread would.
    pub fn deliver(&self, topic: &str, payload: &[u8]) {
        self.inbox.push(topic, payload);
    }

    pub fn client_ids(&self) -> &[String] {
        &self.client_ids
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn published(&self) -> &[(String, String)] {
        &self.published
    }

    /// Payloads published on `topic`, oldest first.
    pub fn published_on(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.as_str())
            .collect()
    }
}

#[cfg(not(target_os = "espidf"))]
impl BrokerPort for MqttAdapter {
    fn is_connected(&self) -> bool {
        self.inbox.is_connected()
    }

    fn connect(&mut self, client_id: &str) -> Result<(), CommsError> {
        self.client_ids.push(client_id.to_owned());
        if !self.accept {
            return Err(CommsError::MqttConnectFailed);
        }
        self.inbox.set_connected(true);
        info!("MQTT(sim): session up as {}", client_id);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), CommsError> {
        if !self.inbox.is_connected() {
            return Err(CommsError::NotConnected);
        }
        self.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if !self.inbox.is_connected() {
            return Err(CommsError::NotConnected);
        }
        self.published.push((topic.to_owned(), payload.to_owned()));
        Ok(())
    }

    fn poll(&mut self) -> Option<InboundMessage> {
        self.inbox.take()
    }
}
