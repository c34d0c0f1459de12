//! audio - PulseAudio playback of Scream PCM
//!
//! Turns the Scream format header into a native sample spec and channel
//! map, and keeps a PulseAudio playback stream open that matches it.

pub mod backend;
pub mod channel_map;
pub mod format;
#[cfg(test)]
mod mock_backend;
pub mod output;
mod play;
pub mod pulse_device;

pub use play::{PlayConfig, Player};
