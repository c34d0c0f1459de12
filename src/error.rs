//! Error types for the PulseAudio output.
//!
//! Only `InvalidArgument`, `BackendUnavailable` and `WriteFailed` ever leave
//! the output adapter. The remaining variants describe conditions that the
//! adapter absorbs into its suspended state; they are built for logging.

use thiserror::Error;

use crate::audio::backend::BackendError;

#[derive(Error, Debug)]
pub enum Error {
    /// Rejected arguments to `PulseOutput::init`
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The audio server client could not be opened
    #[error("Unable to connect to PulseAudio: {0}")]
    BackendUnavailable(#[source] BackendError),

    /// The named output port/stream could not be registered
    #[error("Unable to register output port '{name}': {source}")]
    PortRegistrationFailed {
        name: String,
        #[source]
        source: BackendError,
    },

    /// Sample size outside 16/24/32 bits
    #[error("Unsupported sample size {0}")]
    UnsupportedSampleSize(u8),

    /// Channel map invalid or incompatible with the sample spec
    #[error("Incompatible channel mapping for {channels} channels")]
    InvalidChannelMap { channels: u8 },

    /// Playback stream could not be opened for the derived format
    #[error("Unable to open stream with sample rate {rate}, sample size {sample_size} and {channels} channels: {source}")]
    StreamOpenFailed {
        rate: u32,
        sample_size: u8,
        channels: u8,
        #[source]
        source: BackendError,
    },

    /// Writing PCM to the open stream failed; the adapter has torn itself down
    #[error("Stream write failed: {0}")]
    WriteFailed(#[source] BackendError),
}

pub type Result<T> = std::result::Result<T, Error>;
