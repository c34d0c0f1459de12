//! The host audio server as seen by the output adapter.
//!
//! `PulseOutput` only talks to the server through these traits, so the
//! reconfiguration policy can be driven against any implementation.

use thiserror::Error;

use super::channel_map::ChannelMap;
use super::format::{BufferAttr, SampleSpec};

/// Failure reported by the audio server, carrying its message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Everything needed to open one playback stream.
#[derive(Debug, Clone)]
pub struct StreamParams<'a> {
    pub app_name: &'a str,
    pub stream_name: &'a str,
    pub spec: SampleSpec,
    pub channel_map: &'a ChannelMap,
    pub buffer_attr: BufferAttr,
}

/// An open playback stream. Dropping it closes the stream.
pub trait PlaybackStream {
    /// Write interleaved PCM in the stream's sample format; blocks until the
    /// server has accepted it.
    fn write(&mut self, data: &[u8]) -> Result<(), BackendError>;
}

pub trait OutputBackend {
    type Stream: PlaybackStream;

    /// Open the client connection to the server.
    fn connect(&mut self, app_name: &str) -> Result<(), BackendError>;

    /// Register the named output the streams will be published under.
    fn register_port(&mut self, name: &str) -> Result<(), BackendError>;

    /// Convert a duration into a buffer size in bytes for `spec`.
    fn usec_to_bytes(&self, usec: u64, spec: &SampleSpec) -> usize;

    /// Whether the server accepts `map` as a channel map at all.
    fn is_valid_map(&self, map: &ChannelMap) -> bool;

    /// The server's default WAVEEX layout for `channels`, padded with
    /// auxiliary positions. Empty when the count cannot be represented.
    fn fallback_map(&self, channels: u8) -> ChannelMap;

    /// Whether `spec` is playable and `map` describes its channels.
    fn is_compatible(&self, map: &ChannelMap, spec: &SampleSpec) -> bool;

    fn open_stream(&mut self, params: &StreamParams<'_>) -> Result<Self::Stream, BackendError>;

    /// Close the client connection. Must be safe to call when not connected.
    fn disconnect(&mut self);
}
