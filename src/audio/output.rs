//! Output adapter: plays Scream chunks, reopening the playback stream
//! whenever the format header changes.
//!
//! The adapter is synchronous and owned by a single thread. Every failure
//! that can be blamed on a not-yet-valid format leaves it *suspended*:
//! chunks are dropped silently until the next format change. Only a client
//! connection failure in [`PulseOutput::init`] and a stream write failure in
//! [`PulseOutput::send`] are reported to the caller.

use crate::error::{Error, Result};
use crate::protocol::{AudioChunk, ReceiverFormat};

use super::backend::{OutputBackend, PlaybackStream, StreamParams};
use super::channel_map::ChannelMap;
use super::format::{BufferAttr, SampleFormat, SampleSpec, decode_sample_rate};

/// Client name the audio server shows for us.
pub const APP_NAME: &str = "Scream";

pub struct PulseOutput<B: OutputBackend> {
    backend: B,
    connected: bool,
    stream: Option<B::Stream>,
    last_format: ReceiverFormat,
    spec: SampleSpec,
    channel_map: ChannelMap,
    buffer_attr: BufferAttr,
    latency_ms: u32,
    port_name: String,
}

impl<B: OutputBackend> PulseOutput<B> {
    /// Connect to the audio server and register the output port.
    ///
    /// No stream is opened yet; the first chunk always differs from the
    /// baseline format and triggers that.
    pub fn init(mut backend: B, latency_ms: u32, port_name: &str) -> Result<Self> {
        if latency_ms == 0 {
            return Err(Error::InvalidArgument("latency must be greater than 0 ms".into()));
        }
        if port_name.is_empty() {
            return Err(Error::InvalidArgument("output port name must not be empty".into()));
        }

        let spec = SampleSpec::BASELINE;
        let tlength = backend.usec_to_bytes(latency_usec(latency_ms), &spec);
        let buffer_attr = BufferAttr::with_target_length(tlength);

        backend.connect(APP_NAME).map_err(Error::BackendUnavailable)?;

        if let Err(source) = backend.register_port(port_name) {
            let err = Error::PortRegistrationFailed {
                name: port_name.to_string(),
                source,
            };
            log::warn!("{}", err);
        }

        log::info!(
            "PulseAudio output initialized: port=\"{}\", latency={}ms, tlength={} bytes",
            port_name,
            latency_ms,
            buffer_attr.tlength,
        );

        Ok(Self {
            backend,
            connected: true,
            stream: None,
            last_format: ReceiverFormat::SENTINEL,
            spec,
            channel_map: ChannelMap::stereo(),
            buffer_attr,
            latency_ms,
            port_name: port_name.to_string(),
        })
    }

    /// Play one chunk, reconfiguring first if its format differs from the
    /// previous one.
    pub fn send(&mut self, chunk: &AudioChunk) -> Result<()> {
        if chunk.format != self.last_format {
            self.reconfigure(chunk.format);
        }

        if self.spec.rate == 0 {
            return Ok(());
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        if let Err(e) = stream.write(&chunk.audio) {
            log::error!("PulseAudio write failed: {}", e);
            self.teardown();
            return Err(Error::WriteFailed(e));
        }
        Ok(())
    }

    /// Close the stream and the client connection. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        self.stream = None;
        if self.connected {
            self.backend.disconnect();
            self.connected = false;
        }
        self.spec.rate = 0;
    }

    /// True while chunks are actually being played.
    pub fn is_active(&self) -> bool {
        self.spec.rate > 0 && self.stream.is_some()
    }

    pub fn sample_spec(&self) -> &SampleSpec {
        &self.spec
    }

    pub fn channel_map(&self) -> &ChannelMap {
        &self.channel_map
    }

    pub fn buffer_attr(&self) -> &BufferAttr {
        &self.buffer_attr
    }

    /// Write failure: drop everything and forget the format so the next
    /// chunk, even with the same header, reconnects and reopens.
    fn teardown(&mut self) {
        self.shutdown();
        self.last_format = ReceiverFormat::SENTINEL;
    }

    fn reconfigure(&mut self, format: ReceiverFormat) {
        self.last_format = format;

        self.spec.channels = format.channels;
        self.spec.rate = decode_sample_rate(format.sample_rate);
        match SampleFormat::from_sample_size(format.sample_size) {
            Some(sample_format) => self.spec.format = sample_format,
            None => {
                log::warn!(
                    "{}, not playing until next format switch.",
                    Error::UnsupportedSampleSize(format.sample_size)
                );
                self.spec.rate = 0;
            }
        }

        self.channel_map = match format.channels {
            1 => ChannelMap::mono(),
            2 => ChannelMap::stereo(),
            channels => ChannelMap::from_speaker_mask(channels, format.channel_map),
        };
        if !self.backend.is_valid_map(&self.channel_map) {
            log::warn!("Invalid channel mapping, falling back to CHANNEL_MAP_WAVEEX.");
            self.channel_map = self.backend.fallback_map(format.channels);
        }
        if !self.backend.is_compatible(&self.channel_map, &self.spec) {
            log::warn!("{}", Error::InvalidChannelMap { channels: format.channels });
            self.spec.rate = 0;
        }

        if self.spec.rate == 0 {
            return;
        }

        // The old stream must be gone before the server sees the new one
        self.stream = None;
        if !self.connected {
            if let Err(e) = self.backend.connect(APP_NAME) {
                log::error!(
                    "{}, not playing until next format switch.",
                    Error::BackendUnavailable(e)
                );
                self.spec.rate = 0;
                return;
            }
            self.connected = true;
            if let Err(source) = self.backend.register_port(&self.port_name) {
                let err = Error::PortRegistrationFailed {
                    name: self.port_name.clone(),
                    source,
                };
                log::warn!("{}", err);
            }
        }

        // Sample spec changed, so the byte size of the requested latency did too
        let tlength = self
            .backend
            .usec_to_bytes(latency_usec(self.latency_ms), &self.spec);
        self.buffer_attr = BufferAttr::with_target_length(tlength);

        let params = StreamParams {
            app_name: APP_NAME,
            stream_name: &self.port_name,
            spec: self.spec,
            channel_map: &self.channel_map,
            buffer_attr: self.buffer_attr,
        };
        match self.backend.open_stream(&params) {
            Ok(stream) => {
                self.stream = Some(stream);
                log::info!(
                    "Switched format to sample rate {}, sample size {} and {} channels.",
                    self.spec.rate,
                    format.sample_size,
                    format.channels
                );
            }
            Err(source) => {
                let err = Error::StreamOpenFailed {
                    rate: self.spec.rate,
                    sample_size: format.sample_size,
                    channels: format.channels,
                    source,
                };
                log::error!("{}, not playing until next format switch.", err);
                self.spec.rate = 0;
            }
        }
    }
}

impl<B: OutputBackend> Drop for PulseOutput<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn latency_usec(latency_ms: u32) -> u64 {
    u64::from(latency_ms) * 1000
}
