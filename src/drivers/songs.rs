//! Tone sequences for the robot's song slots.
//!
//! A song is up to 16 (note, duration) pairs.  Notes are MIDI numbers
//! (31–127); anything below 31 plays as a rest.  Durations are in 1/64 s.

use crate::error::DeviceError;

/// Most notes a single song slot holds.
pub const MAX_NOTES: usize = 16;
/// Highest song slot number.
pub const MAX_SLOT: u8 = 4;

/// Duration unit: 1/64 s.
const TICK_US: u64 = 15_625;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub pitch: u8,
    /// Length in 1/64 s.
    pub duration: u8,
}

/// An ordered, validated list of notes that fits one song slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToneSequence {
    notes: heapless::Vec<Note, MAX_NOTES>,
}

impl ToneSequence {
    /// Build from (pitch, duration) pairs.
    pub fn from_pairs(pairs: &[(u8, u8)]) -> Result<Self, DeviceError> {
        if pairs.is_empty() || pairs.len() > MAX_NOTES {
            return Err(DeviceError::InvalidSongLength(pairs.len()));
        }
        let notes = pairs
            .iter()
            .map(|&(pitch, duration)| Note { pitch, duration })
            .collect();
        Ok(Self { notes })
    }

    /// Build from a fixed table known to fit a slot.
    fn from_table(pairs: &[(u8, u8)]) -> Self {
        let notes = pairs
            .iter()
            .take(MAX_NOTES)
            .map(|&(pitch, duration)| Note { pitch, duration })
            .collect();
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// How long the robot is busy playing this sequence.
    pub fn duration_ms(&self) -> u32 {
        let ticks: u64 = self.notes.iter().map(|n| u64::from(n.duration)).sum();
        (ticks * TICK_US / 1000) as u32
    }
}

// ---------------------------------------------------------------------------
// Imperial March, split over four slots
// ---------------------------------------------------------------------------

const IMPERIAL_A: [(u8, u8); 9] = [
    (55, 32), (55, 32), (55, 32), (51, 24), (58, 8), (55, 32), (51, 24), (58, 8), (55, 64),
];
const IMPERIAL_B: [(u8, u8); 9] = [
    (62, 32), (62, 32), (62, 32), (63, 24), (58, 8), (54, 32), (51, 24), (58, 8), (55, 64),
];
// Note pairs only.  Slot and length travel in the Song frame header, so
// (3, 12) and (4, 14) are not part of C and D.
const IMPERIAL_C: [(u8, u8); 12] = [
    (67, 32), (55, 24), (55, 8), (67, 32), (66, 24), (65, 8),
    (64, 8), (63, 8), (64, 16), (30, 16), (56, 16), (61, 32),
];
const IMPERIAL_D: [(u8, u8); 14] = [
    (60, 24), (59, 8), (58, 8), (57, 8), (58, 16), (10, 16), (52, 16),
    (54, 32), (51, 24), (58, 8), (55, 32), (51, 24), (58, 8), (55, 64),
];

/// One part of a multi-slot tune.
#[derive(Debug, Clone)]
pub struct SongPart {
    pub slot: u8,
    pub sequence: ToneSequence,
}

/// The four parts of the Imperial March, in playback order, bound to
/// slots 1–4.
pub fn imperial_march() -> [SongPart; 4] {
    let part = |slot, pairs: &[(u8, u8)]| SongPart {
        slot,
        sequence: ToneSequence::from_table(pairs),
    };
    [
        part(1, &IMPERIAL_A[..]),
        part(2, &IMPERIAL_B[..]),
        part(3, &IMPERIAL_C[..]),
        part(4, &IMPERIAL_D[..]),
    ]
}
