//! Connectivity watchdog.
//!
//! One [`LinkSupervisor`] per link (WiFi station, broker session).  Each tick
//! the bridge calls [`LinkSupervisor::check`]; a healthy link returns at
//! once.  A dead link is retried in place at `retry_ms` cadence until it
//! comes back or has been down for `timeout_ms`, at which point the caller
//! is told to restart the chip.
//!
//! ```text
//!            probe ok
//!   ┌────┐ ◀──────────── ┌──────────────────┐
//!   │ Up │               │ Down { since_ms } │──▶ Restart (down ≥ timeout)
//!   └────┘ ────────────▶ └──────────────────┘
//!            probe fails
//! ```
//!
//! `since_ms` is the last instant the link was seen up, not the instant the
//! failure was noticed, so time spent elsewhere in the loop counts against
//! the budget.
//!
//! `retry_ms` is the pause between attempts, not the attempt period.  A
//! reconnect that itself blocks stretches the cycle: on device a broker
//! connect waits up to `MqttConfig::connect_timeout_ms` (5 s), so an
//! unreachable broker is retried about every 5.1 s and the 120 s budget
//! covers roughly two dozen attempts.

use log::{error, info, warn};

use crate::app::ports::{LinkPort, TimePort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Up,
    Down { since_ms: u64 },
}

/// Result of one [`LinkSupervisor::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Link was already up.
    Up,
    /// Link was down and came back.
    Recovered { down_ms: u64 },
    /// Link stayed down for the whole budget.  The caller must restart.
    Restart { down_ms: u64 },
}

pub struct LinkSupervisor {
    name: &'static str,
    timeout_ms: u64,
    retry_ms: u32,
    state: LinkState,
    last_up_ms: u64,
}

impl LinkSupervisor {
    pub fn new(name: &'static str, timeout_ms: u64, retry_ms: u32) -> Self {
        Self {
            name,
            timeout_ms,
            retry_ms,
            state: LinkState::Up,
            last_up_ms: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Probe `link` and, if it is down, keep reconnecting until it recovers
    /// or the timeout expires.  Blocks through `time` between attempts.
    pub fn check(&mut self, link: &mut impl LinkPort, time: &mut impl TimePort) -> Verdict {
        if link.probe() {
            return self.mark_up(time.now_ms());
        }

        let since_ms = match self.state {
            LinkState::Down { since_ms } => since_ms,
            LinkState::Up => {
                warn!("{} link lost", self.name);
                self.last_up_ms
            }
        };
        self.state = LinkState::Down { since_ms };

        loop {
            let now = time.now_ms();
            let down_ms = now.saturating_sub(since_ms);
            if down_ms >= self.timeout_ms {
                error!(
                    "{} link down for {} ms (limit {} ms), restarting",
                    self.name, down_ms, self.timeout_ms
                );
                return Verdict::Restart { down_ms };
            }

            link.reconnect();
            if link.probe() {
                return self.mark_up(time.now_ms());
            }

            time.delay_ms(self.retry_ms);
        }
    }

    fn mark_up(&mut self, now: u64) -> Verdict {
        self.last_up_ms = now;
        match core::mem::replace(&mut self.state, LinkState::Up) {
            LinkState::Up => Verdict::Up,
            LinkState::Down { since_ms } => {
                let down_ms = now.saturating_sub(since_ms);
                info!("{} link restored after {} ms", self.name, down_ms);
                Verdict::Recovered { down_ms }
            }
        }
    }
}
