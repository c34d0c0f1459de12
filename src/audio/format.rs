//! Native sample spec and buffer attributes derived from the Scream header.

/// Signed little-endian PCM layouts Scream can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    S16Le,
    S24Le,
    S32Le,
}

impl SampleFormat {
    pub fn from_sample_size(bits: u8) -> Option<Self> {
        match bits {
            16 => Some(SampleFormat::S16Le),
            24 => Some(SampleFormat::S24Le),
            32 => Some(SampleFormat::S32Le),
            _ => None,
        }
    }
}

/// Decode the packed rate byte: bit 7 selects 44.1 kHz over 48 kHz, the low
/// seven bits are the multiplier. A zero multiplier yields 0 (no playback).
pub fn decode_sample_rate(code: u8) -> u32 {
    let base = if code >= 128 { 44100 } else { 48000 };
    base * u32::from(code % 128)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpec {
    pub format: SampleFormat,
    pub rate: u32,
    pub channels: u8,
}

impl SampleSpec {
    /// 16-bit stereo at 44.1 kHz, used until the first real format arrives.
    pub const BASELINE: SampleSpec = SampleSpec {
        format: SampleFormat::S16Le,
        rate: 44100,
        channels: 2,
    };
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// Playback buffer metrics. `u32::MAX` leaves a field to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferAttr {
    pub maxlength: u32,
    pub tlength: u32,
    pub prebuf: u32,
    pub minreq: u32,
    pub fragsize: u32,
}

impl BufferAttr {
    /// Only the target length is pinned; it is the requested latency in bytes.
    pub fn with_target_length(tlength: usize) -> Self {
        Self {
            maxlength: u32::MAX,
            tlength: u32::try_from(tlength).unwrap_or(u32::MAX),
            prebuf: u32::MAX,
            minreq: u32::MAX,
            fragsize: u32::MAX,
        }
    }
}
