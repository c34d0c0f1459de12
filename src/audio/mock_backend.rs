//! Recording backend for driving `PulseOutput` without an audio server.
//!
//! Map and spec rules follow libpulse closely enough for the adapter's
//! decisions: at most 32 channels, rates up to 768 kHz, WAVEEX fallback.

use std::cell::RefCell;
use std::rc::Rc;

use super::backend::{BackendError, OutputBackend, PlaybackStream, StreamParams};
use super::channel_map::{ChannelMap, ChannelPosition};
use super::format::{BufferAttr, SampleFormat, SampleSpec};
use super::output::APP_NAME;

const RATE_MAX: u32 = 48000 * 16;
const CHANNELS_MAX: u8 = 32;

/// WAVEFORMATEXTENSIBLE default order for up to 18 channels.
const WAVEEX_ORDER: [ChannelPosition; 18] = [
    ChannelPosition::FrontLeft,
    ChannelPosition::FrontRight,
    ChannelPosition::FrontCenter,
    ChannelPosition::Lfe,
    ChannelPosition::RearLeft,
    ChannelPosition::RearRight,
    ChannelPosition::FrontLeftOfCenter,
    ChannelPosition::FrontRightOfCenter,
    ChannelPosition::RearCenter,
    ChannelPosition::SideLeft,
    ChannelPosition::SideRight,
    ChannelPosition::TopCenter,
    ChannelPosition::TopFrontLeft,
    ChannelPosition::TopFrontCenter,
    ChannelPosition::TopFrontRight,
    ChannelPosition::TopRearLeft,
    ChannelPosition::TopRearCenter,
    ChannelPosition::TopRearRight,
];

/// Channel counts with a complete WAVEEX layout of their own.
const WAVEEX_COUNTS: [u8; 10] = [2, 3, 4, 6, 8, 9, 11, 12, 15, 18];

fn bytes_per_sample(format: SampleFormat) -> usize {
    match format {
        SampleFormat::S16Le => 2,
        SampleFormat::S24Le => 3,
        SampleFormat::S32Le => 4,
    }
}

fn spec_is_valid(spec: &SampleSpec) -> bool {
    (1..=RATE_MAX).contains(&spec.rate) && (1..=CHANNELS_MAX).contains(&spec.channels)
}

#[derive(Debug, Clone)]
pub struct OpenedStream {
    pub stream_name: String,
    pub spec: SampleSpec,
    pub channel_map: ChannelMap,
    pub buffer_attr: BufferAttr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    Open,
    Close,
}

/// What the backend was asked to do, plus switches to make it fail.
#[derive(Default)]
pub struct Recorder {
    pub connects: usize,
    pub disconnects: usize,
    pub opens: Vec<OpenedStream>,
    pub stream_events: Vec<StreamEvent>,
    pub writes: Vec<Vec<u8>>,
    pub fail_connect: bool,
    pub fail_register: bool,
    pub fail_open: bool,
    pub fail_write: bool,
    /// Treat every channel map as invalid, forcing the WAVEEX fallback.
    pub reject_maps: bool,
}

#[derive(Default, Clone)]
pub struct MockBackend {
    pub log: Rc<RefCell<Recorder>>,
}

pub struct MockStream {
    log: Rc<RefCell<Recorder>>,
}

impl PlaybackStream for MockStream {
    fn write(&mut self, data: &[u8]) -> Result<(), BackendError> {
        let mut log = self.log.borrow_mut();
        if log.fail_write {
            return Err(BackendError::new("Connection terminated"));
        }
        log.writes.push(data.to_vec());
        Ok(())
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.log.borrow_mut().stream_events.push(StreamEvent::Close);
    }
}

impl OutputBackend for MockBackend {
    type Stream = MockStream;

    fn connect(&mut self, app_name: &str) -> Result<(), BackendError> {
        assert_eq!(app_name, APP_NAME);
        let mut log = self.log.borrow_mut();
        if log.fail_connect {
            return Err(BackendError::new("Connection refused"));
        }
        log.connects += 1;
        Ok(())
    }

    fn register_port(&mut self, _name: &str) -> Result<(), BackendError> {
        if self.log.borrow().fail_register {
            return Err(BackendError::new("port exists"));
        }
        Ok(())
    }

    fn usec_to_bytes(&self, usec: u64, spec: &SampleSpec) -> usize {
        let frames = usec * u64::from(spec.rate) / 1_000_000;
        frames as usize * bytes_per_sample(spec.format) * usize::from(spec.channels)
    }

    fn is_valid_map(&self, map: &ChannelMap) -> bool {
        !self.log.borrow().reject_maps
            && (1..=usize::from(CHANNELS_MAX)).contains(&map.len())
            && map.positions().iter().all(|position| match position {
                ChannelPosition::Aux(n) => *n < CHANNELS_MAX,
                _ => true,
            })
    }

    fn fallback_map(&self, channels: u8) -> ChannelMap {
        if channels == 0 || channels > CHANNELS_MAX {
            return ChannelMap::default();
        }
        if channels == 1 {
            return ChannelMap::mono();
        }
        let base = WAVEEX_COUNTS
            .iter()
            .copied()
            .filter(|&count| count <= channels)
            .max()
            .unwrap_or(2);
        let mut positions = WAVEEX_ORDER[..usize::from(base)].to_vec();
        positions.extend((0..channels - base).map(ChannelPosition::Aux));
        ChannelMap::from_positions(positions)
    }

    fn is_compatible(&self, map: &ChannelMap, spec: &SampleSpec) -> bool {
        spec_is_valid(spec)
            && (1..=usize::from(CHANNELS_MAX)).contains(&map.len())
            && usize::from(spec.channels) == map.len()
    }

    fn open_stream(&mut self, params: &StreamParams<'_>) -> Result<MockStream, BackendError> {
        let mut log = self.log.borrow_mut();
        if log.fail_open {
            return Err(BackendError::new("Invalid argument"));
        }
        log.opens.push(OpenedStream {
            stream_name: params.stream_name.to_string(),
            spec: params.spec,
            channel_map: params.channel_map.clone(),
            buffer_attr: params.buffer_attr,
        });
        log.stream_events.push(StreamEvent::Open);
        Ok(MockStream {
            log: self.log.clone(),
        })
    }

    fn disconnect(&mut self) {
        self.log.borrow_mut().disconnects += 1;
    }
}
