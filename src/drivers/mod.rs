//! Robot protocol driver and the tunes it can program.

pub mod roomba;
pub mod songs;
