//! Scream packet layout: a 5-byte format header followed by interleaved PCM.
//!
//! | byte | field |
//! |------|-------|
//! | 0    | sample rate code (bit 7: 44.1 kHz base, bits 0-6: multiplier) |
//! | 1    | sample size in bits |
//! | 2    | channel count |
//! | 3-4  | speaker position mask, little endian |

use bytes::Bytes;

pub const HEADER_SIZE: usize = 5;

/// Format descriptor carried by every packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverFormat {
    pub sample_rate: u8,
    pub sample_size: u8,
    pub channels: u8,
    pub channel_map: u16,
}

impl ReceiverFormat {
    /// Placeholder that never matches a real stream, so the first packet
    /// always reconfigures the output.
    pub const SENTINEL: ReceiverFormat = ReceiverFormat {
        sample_rate: 0,
        sample_size: 0,
        channels: 2,
        channel_map: 0x0003,
    };

    pub fn from_header(header: [u8; HEADER_SIZE]) -> Self {
        Self {
            sample_rate: header[0],
            sample_size: header[1],
            channels: header[2],
            channel_map: u16::from_le_bytes([header[3], header[4]]),
        }
    }
}

/// One decoded block of audio together with its format.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub format: ReceiverFormat,
    pub audio: Bytes,
}

impl AudioChunk {
    pub fn new(format: ReceiverFormat, audio: impl Into<Bytes>) -> Self {
        Self {
            format,
            audio: audio.into(),
        }
    }
}

/// Split a datagram into format and PCM payload.
///
/// Returns `None` when the datagram carries no audio after the header.
pub fn parse_packet(packet: &[u8]) -> Option<AudioChunk> {
    if packet.len() <= HEADER_SIZE {
        return None;
    }
    let (header, audio) = packet.split_at(HEADER_SIZE);
    let header: [u8; HEADER_SIZE] = header.try_into().ok()?;
    Some(AudioChunk::new(
        ReceiverFormat::from_header(header),
        Bytes::copy_from_slice(audio),
    ))
}
