//! Fuzz target: simulated robot frame decoding
//!
//! Feeds arbitrary Open Interface byte streams to `SimRobot` in randomly
//! sized writes and asserts that it never panics and only ever holds
//! well-formed songs.
//!
//! cargo fuzz run fuzz_oi_frames

#![no_main]

use libfuzzer_sys::fuzz_target;
use roombridge::adapters::sim_robot::SimRobot;
use roombridge::app::ports::SerialPort;
use roombridge::drivers::songs::{MAX_NOTES, MAX_SLOT};

fuzz_target!(|data: &[u8]| {
    let Some((&split, stream)) = data.split_first() else {
        return;
    };
    let chunk = usize::from(split % 16) + 1;

    let mut robot = SimRobot::new();
    for part in stream.chunks(chunk) {
        let _ = robot.write_all(part);
    }

    for slot in 0..=MAX_SLOT {
        if let Some(song) = robot.slot(slot) {
            assert!(!song.is_empty() && song.len() <= MAX_NOTES);
        }
    }
    let mut buf = [0u8; 64];
    let _ = robot.read(&mut buf, 0);
});
