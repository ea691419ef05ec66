//! Transport port identities.
//!
//! A link's numeric identity is the first argument cell of its `cpu`
//! reference, which names an LPASS port. The constants below follow the
//! DSP port numbering shared with the board description; only the ports
//! this card treats specially are named.
//!
//! ```rust
//! use reachcard_core::{PortClass, PortId};
//!
//! assert_eq!(PortId::TX_CODEC_DMA_TX_3.class(), PortClass::HeadsetCapture);
//! assert!(matches!(PortId::DISPLAY_PORT_RX_1.class(), PortClass::DisplaySink(s) if s.index() == 1));
//! ```

use std::fmt;

use crate::error::TopologyError;

/// Numeric identity of a transport port (the link id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub u32);

impl PortId {
    /// Primary MI2S playback.
    pub const PRIMARY_MI2S_RX: PortId = PortId(16);
    /// Primary MI2S capture.
    pub const PRIMARY_MI2S_TX: PortId = PortId(17);
    /// Secondary MI2S playback.
    pub const SECONDARY_MI2S_RX: PortId = PortId(18);
    /// Secondary MI2S capture.
    pub const SECONDARY_MI2S_TX: PortId = PortId(19);
    /// Tertiary MI2S playback.
    pub const TERTIARY_MI2S_RX: PortId = PortId(20);
    /// Tertiary MI2S capture.
    pub const TERTIARY_MI2S_TX: PortId = PortId(21);
    /// First display port sink. Display port ids are not contiguous.
    pub const DISPLAY_PORT_RX_0: PortId = PortId(104);
    /// WSA speaker path 0.
    pub const WSA_CODEC_DMA_RX_0: PortId = PortId(105);
    /// WSA speaker path 1.
    pub const WSA_CODEC_DMA_RX_1: PortId = PortId(107);
    /// VA macro capture 0.
    pub const VA_CODEC_DMA_TX_0: PortId = PortId(110);
    /// RX macro playback 0.
    pub const RX_CODEC_DMA_RX_0: PortId = PortId(113);
    /// TX macro capture 0.
    pub const TX_CODEC_DMA_TX_0: PortId = PortId(114);
    /// TX macro capture 1.
    pub const TX_CODEC_DMA_TX_1: PortId = PortId(116);
    /// TX macro capture 2.
    pub const TX_CODEC_DMA_TX_2: PortId = PortId(118);
    /// TX macro capture 3.
    pub const TX_CODEC_DMA_TX_3: PortId = PortId(120);
    /// Second display port sink; sinks 1..=7 are contiguous from here.
    pub const DISPLAY_PORT_RX_1: PortId = PortId(129);
    /// Last display port sink.
    pub const DISPLAY_PORT_RX_7: PortId = PortId(135);

    /// Raw numeric value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Classify this port for session policy and init dispatch.
    pub fn class(self) -> PortClass {
        match self {
            Self::WSA_CODEC_DMA_RX_0 | Self::WSA_CODEC_DMA_RX_1 => PortClass::Speaker,
            Self::DISPLAY_PORT_RX_0 => PortClass::DisplaySink(DisplaySink(0)),
            PortId(id)
                if (Self::DISPLAY_PORT_RX_1.0..=Self::DISPLAY_PORT_RX_7.0).contains(&id) =>
            {
                PortClass::DisplaySink(DisplaySink((id - Self::DISPLAY_PORT_RX_1.0 + 1) as u8))
            }
            Self::TX_CODEC_DMA_TX_0
            | Self::TX_CODEC_DMA_TX_1
            | Self::TX_CODEC_DMA_TX_2
            | Self::TX_CODEC_DMA_TX_3 => PortClass::HeadsetCapture,
            _ => PortClass::Other,
        }
    }

    /// Whether hw_params pins this port to mono.
    pub fn is_mono_capture(self) -> bool {
        self.class() == PortClass::HeadsetCapture
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PortId {
    fn from(value: u32) -> Self {
        PortId(value)
    }
}

/// Session-policy class of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortClass {
    /// WSA speaker amplifier path; gets the volume policy on init.
    Speaker,
    /// Display port sink with its own AV-out jack.
    DisplaySink(DisplaySink),
    /// TX macro capture port; shares the headset jack and records mono.
    HeadsetCapture,
    /// Everything else.
    Other,
}

/// Index of a display port sink, always in `0..DisplaySink::COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplaySink(u8);

impl DisplaySink {
    /// Number of display sinks a card can expose.
    pub const COUNT: usize = 8;

    /// Validate a raw sink index.
    pub fn new(index: usize) -> Result<Self, TopologyError> {
        if index < Self::COUNT {
            Ok(DisplaySink(index as u8))
        } else {
            Err(TopologyError::SinkOutOfRange {
                index,
                count: Self::COUNT,
            })
        }
    }

    /// The sink index as a `usize`, suitable for table lookup.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Name of this sink's jack and DAPM widget, e.g. `DP3 Jack`.
    pub fn jack_name(self) -> String {
        format!("DP{} Jack", self.0)
    }

    /// All sinks in index order.
    pub fn all() -> impl Iterator<Item = DisplaySink> {
        (0..Self::COUNT as u8).map(DisplaySink)
    }
}
