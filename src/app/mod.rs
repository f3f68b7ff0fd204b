//! Application core: domain logic behind port traits.
//!
//! This module contains the bridge's behaviour: link supervision
//! orchestration, command dispatch, and the sample/publish cadence.
//! All interaction with the robot, the radio and the chip happens through
//! **port traits** defined in [`ports`], keeping this layer testable on the
//! host with a virtual clock.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
