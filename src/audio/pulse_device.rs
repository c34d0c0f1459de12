//! PulseAudio client and playback stream wrappers.

use libpulse_binding as pulse;
use libpulse_simple_binding::Simple;
use pulse::channelmap::{Map, MapDef, Position};
use pulse::context::{Context, FlagSet as ContextFlagSet, State as ContextState};
use pulse::def::BufferAttr as PaBufferAttr;
use pulse::error::PAErr;
use pulse::mainloop::standard::{IterateResult, Mainloop};
use pulse::proplist::{Proplist, properties};
use pulse::sample::{Format, Spec};
use pulse::stream::Direction;
use pulse::time::MicroSeconds;

use super::backend::{BackendError, OutputBackend, PlaybackStream, StreamParams};
use super::channel_map::{ChannelMap, ChannelPosition};
use super::format::{BufferAttr, SampleFormat, SampleSpec};

const ICON_ENV: &str = "PULSE_PROP_application.icon_name";
const ICON_NAME: &str = "audio-card";

const AUX_POSITIONS: [Position; 32] = [
    Position::Aux0, Position::Aux1, Position::Aux2, Position::Aux3,
    Position::Aux4, Position::Aux5, Position::Aux6, Position::Aux7,
    Position::Aux8, Position::Aux9, Position::Aux10, Position::Aux11,
    Position::Aux12, Position::Aux13, Position::Aux14, Position::Aux15,
    Position::Aux16, Position::Aux17, Position::Aux18, Position::Aux19,
    Position::Aux20, Position::Aux21, Position::Aux22, Position::Aux23,
    Position::Aux24, Position::Aux25, Position::Aux26, Position::Aux27,
    Position::Aux28, Position::Aux29, Position::Aux30, Position::Aux31,
];

/// Ask PulseAudio to show the sound card icon for our streams, unless the
/// user already chose one.
///
/// Mutates the process environment, so it must run before any other thread
/// is started.
pub fn set_icon_hint() {
    if std::env::var_os(ICON_ENV).is_none() {
        // SAFETY: called from `main` while the process is still single-threaded.
        unsafe { std::env::set_var(ICON_ENV, ICON_NAME) };
    }
}

fn pa_error(err: PAErr) -> BackendError {
    BackendError::new(
        err.to_string()
            .unwrap_or_else(|| format!("PulseAudio error {}", err.0)),
    )
}

fn to_pa_spec(spec: &SampleSpec) -> Spec {
    let format = match spec.format {
        SampleFormat::S16Le => Format::S16le,
        SampleFormat::S24Le => Format::S24le,
        SampleFormat::S32Le => Format::S32le,
    };
    Spec {
        format,
        rate: spec.rate,
        channels: spec.channels,
    }
}

fn to_pa_position(position: ChannelPosition) -> Position {
    match position {
        ChannelPosition::Mono => Position::Mono,
        ChannelPosition::FrontLeft => Position::FrontLeft,
        ChannelPosition::FrontRight => Position::FrontRight,
        ChannelPosition::FrontCenter => Position::FrontCenter,
        ChannelPosition::Lfe => Position::Lfe,
        ChannelPosition::RearLeft => Position::RearLeft,
        ChannelPosition::RearRight => Position::RearRight,
        ChannelPosition::FrontLeftOfCenter => Position::FrontLeftOfCenter,
        ChannelPosition::FrontRightOfCenter => Position::FrontRightOfCenter,
        ChannelPosition::RearCenter => Position::RearCenter,
        ChannelPosition::SideLeft => Position::SideLeft,
        ChannelPosition::SideRight => Position::SideRight,
        ChannelPosition::TopCenter => Position::TopCenter,
        ChannelPosition::TopFrontLeft => Position::TopFrontLeft,
        ChannelPosition::TopFrontCenter => Position::TopFrontCenter,
        ChannelPosition::TopFrontRight => Position::TopFrontRight,
        ChannelPosition::TopRearLeft => Position::TopRearLeft,
        ChannelPosition::TopRearCenter => Position::TopRearCenter,
        ChannelPosition::TopRearRight => Position::TopRearRight,
        ChannelPosition::Aux(n) => AUX_POSITIONS
            .get(usize::from(n))
            .copied()
            .unwrap_or(Position::Invalid),
    }
}

fn from_pa_position(position: Position) -> Option<ChannelPosition> {
    let position = match position {
        Position::Mono => ChannelPosition::Mono,
        Position::FrontLeft => ChannelPosition::FrontLeft,
        Position::FrontRight => ChannelPosition::FrontRight,
        Position::FrontCenter => ChannelPosition::FrontCenter,
        Position::Lfe => ChannelPosition::Lfe,
        Position::RearLeft => ChannelPosition::RearLeft,
        Position::RearRight => ChannelPosition::RearRight,
        Position::FrontLeftOfCenter => ChannelPosition::FrontLeftOfCenter,
        Position::FrontRightOfCenter => ChannelPosition::FrontRightOfCenter,
        Position::RearCenter => ChannelPosition::RearCenter,
        Position::SideLeft => ChannelPosition::SideLeft,
        Position::SideRight => ChannelPosition::SideRight,
        Position::TopCenter => ChannelPosition::TopCenter,
        Position::TopFrontLeft => ChannelPosition::TopFrontLeft,
        Position::TopFrontCenter => ChannelPosition::TopFrontCenter,
        Position::TopFrontRight => ChannelPosition::TopFrontRight,
        Position::TopRearLeft => ChannelPosition::TopRearLeft,
        Position::TopRearCenter => ChannelPosition::TopRearCenter,
        Position::TopRearRight => ChannelPosition::TopRearRight,
        other => {
            let n = AUX_POSITIONS.iter().position(|&aux| aux == other)?;
            ChannelPosition::Aux(n as u8)
        }
    };
    Some(position)
}

/// `None` when the map has more channels than libpulse can hold.
fn to_pa_channel_map(map: &ChannelMap) -> Option<Map> {
    if map.len() > Spec::CHANNELS_MAX as usize {
        return None;
    }
    let mut pa_map = Map::default();
    pa_map.init();
    pa_map.set_len(map.len() as u8);
    for (slot, &position) in pa_map.get_mut().iter_mut().zip(map.positions()) {
        *slot = to_pa_position(position);
    }
    Some(pa_map)
}

fn to_pa_buffer_attr(attr: &BufferAttr) -> PaBufferAttr {
    PaBufferAttr {
        maxlength: attr.maxlength,
        tlength: attr.tlength,
        prebuf: attr.prebuf,
        minreq: attr.minreq,
        fragsize: attr.fragsize,
    }
}

// ======================== Client connection ========================

struct Client {
    // Declared before the mainloop so it is dropped first.
    context: Context,
    #[allow(dead_code)]
    mainloop: Mainloop,
}

/// Connection to the PulseAudio server.
#[derive(Default)]
pub struct PulseBackend {
    client: Option<Client>,
}

impl PulseBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputBackend for PulseBackend {
    type Stream = PulseStream;

    fn connect(&mut self, app_name: &str) -> Result<(), BackendError> {
        self.disconnect();

        let mut proplist =
            Proplist::new().ok_or_else(|| BackendError::new("Failed to allocate proplist"))?;
        // Properties are cosmetic, a failure to set them is not worth reporting.
        let _ = proplist.set_str(properties::APPLICATION_NAME, app_name);
        let _ = proplist.set_str(properties::APPLICATION_ICON_NAME, ICON_NAME);

        let mut mainloop =
            Mainloop::new().ok_or_else(|| BackendError::new("Failed to create mainloop"))?;
        let mut context = Context::new_with_proplist(&mainloop, app_name, &proplist)
            .ok_or_else(|| BackendError::new("Failed to create context"))?;

        context
            .connect(None, ContextFlagSet::NOFLAGS, None)
            .map_err(pa_error)?;

        loop {
            match mainloop.iterate(true) {
                IterateResult::Success(_) => {}
                IterateResult::Quit(_) => {
                    return Err(BackendError::new("Mainloop quit while connecting"));
                }
                IterateResult::Err(e) => return Err(pa_error(e)),
            }
            match context.get_state() {
                ContextState::Ready => break,
                ContextState::Failed | ContextState::Terminated => {
                    return Err(pa_error(context.errno()));
                }
                _ => {}
            }
        }

        log::info!("Connected to PulseAudio as \"{}\"", app_name);
        self.client = Some(Client { context, mainloop });
        Ok(())
    }

    /// PulseAudio has no port registry: streams carry their name when they
    /// are opened. This only checks the name can be passed to the server.
    fn register_port(&mut self, name: &str) -> Result<(), BackendError> {
        if self.client.is_none() {
            return Err(BackendError::new("not connected"));
        }
        if name.is_empty() || name.contains('\0') {
            return Err(BackendError::new(format!("invalid stream name {:?}", name)));
        }
        Ok(())
    }

    fn usec_to_bytes(&self, usec: u64, spec: &SampleSpec) -> usize {
        to_pa_spec(spec).usec_to_bytes(MicroSeconds(usec))
    }

    fn is_valid_map(&self, map: &ChannelMap) -> bool {
        to_pa_channel_map(map).is_some_and(|pa_map| pa_map.is_valid())
    }

    fn fallback_map(&self, channels: u8) -> ChannelMap {
        if channels == 0 || channels as usize > Spec::CHANNELS_MAX as usize {
            return ChannelMap::default();
        }
        let mut pa_map = Map::default();
        let _ = pa_map.init_extend(channels.into(), MapDef::WAVEEx);
        pa_map
            .get()
            .iter()
            .map(|&position| from_pa_position(position))
            .collect::<Option<Vec<_>>>()
            .map(ChannelMap::from_positions)
            .unwrap_or_default()
    }

    fn is_compatible(&self, map: &ChannelMap, spec: &SampleSpec) -> bool {
        let spec = to_pa_spec(spec);
        // libpulse logs an assertion for invalid input, so check that first
        spec.is_valid()
            && to_pa_channel_map(map).is_some_and(|pa_map| {
                pa_map.is_valid() && pa_map.is_compatible_with_sample_spec(&spec)
            })
    }

    fn open_stream(&mut self, params: &StreamParams<'_>) -> Result<PulseStream, BackendError> {
        let spec = to_pa_spec(&params.spec);
        let channel_map = to_pa_channel_map(params.channel_map)
            .ok_or_else(|| BackendError::new("too many channels"))?;
        let buffer_attr = to_pa_buffer_attr(&params.buffer_attr);

        let simple = Simple::new(
            None,
            params.app_name,
            Direction::Playback,
            None,
            params.stream_name,
            &spec,
            Some(&channel_map),
            Some(&buffer_attr),
        )
        .map_err(pa_error)?;

        Ok(PulseStream { simple })
    }

    fn disconnect(&mut self) {
        if let Some(mut client) = self.client.take() {
            client.context.disconnect();
            log::debug!("Disconnected from PulseAudio");
        }
    }
}

impl Drop for PulseBackend {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// ======================== Playback stream ========================

pub struct PulseStream {
    simple: Simple,
}

impl PlaybackStream for PulseStream {
    fn write(&mut self, data: &[u8]) -> Result<(), BackendError> {
        self.simple.write(data).map_err(pa_error)
    }
}
