//! Translation of the Windows speaker position mask (`SPEAKER_*` bits from
//! ksmedia.h) into audio server channel positions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPosition {
    Mono,
    FrontLeft,
    FrontRight,
    FrontCenter,
    Lfe,
    RearLeft,
    RearRight,
    FrontLeftOfCenter,
    FrontRightOfCenter,
    RearCenter,
    SideLeft,
    SideRight,
    TopCenter,
    TopFrontLeft,
    TopFrontCenter,
    TopFrontRight,
    TopRearLeft,
    TopRearCenter,
    TopRearRight,
    Aux(u8),
}

/// Speaker mask bits 0..=10 in ksmedia.h order. The `SPEAKER_TOP_*` bits
/// above 10 are never consulted.
const SPEAKER_POSITIONS: [(ChannelPosition, &str); 11] = [
    (ChannelPosition::FrontLeft, "Front Left"),
    (ChannelPosition::FrontRight, "Front Right"),
    (ChannelPosition::FrontCenter, "Front Center"),
    (ChannelPosition::Lfe, "LFE / Subwoofer"),
    (ChannelPosition::RearLeft, "Rear Left"),
    (ChannelPosition::RearRight, "Rear Right"),
    (ChannelPosition::FrontLeftOfCenter, "Front-Left Center"),
    (ChannelPosition::FrontRightOfCenter, "Front-Right Center"),
    (ChannelPosition::RearCenter, "Rear Center"),
    (ChannelPosition::SideLeft, "Side Left"),
    (ChannelPosition::SideRight, "Side Right"),
];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelMap {
    positions: Vec<ChannelPosition>,
}

impl ChannelMap {
    pub fn mono() -> Self {
        Self {
            positions: vec![ChannelPosition::Mono],
        }
    }

    pub fn stereo() -> Self {
        Self {
            positions: vec![ChannelPosition::FrontLeft, ChannelPosition::FrontRight],
        }
    }

    /// Build a map for more than two channels by consuming one set bit of
    /// `mask` per channel, lowest bit first. Channels left over once bits
    /// 0..=10 are exhausted are placed at front center.
    pub fn from_speaker_mask(channels: u8, mask: u16) -> Self {
        let mut positions = Vec::with_capacity(usize::from(channels));
        let mut cursor = 0;

        for channel in 0..channels {
            let bit = (cursor..SPEAKER_POSITIONS.len()).find(|&bit| (mask >> bit) & 1 == 1);
            match bit {
                Some(bit) => {
                    cursor = bit + 1;
                    let (position, name) = SPEAKER_POSITIONS[bit];
                    log::info!("Channel {} mapped to {}", channel, name);
                    positions.push(position);
                }
                None => {
                    log::warn!(
                        "Channel {} could not be mapped. Falling back to 'center'.",
                        channel
                    );
                    positions.push(ChannelPosition::FrontCenter);
                }
            }
        }

        Self { positions }
    }

    pub fn from_positions(positions: Vec<ChannelPosition>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[ChannelPosition] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }
}
