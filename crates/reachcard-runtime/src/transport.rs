//! Bus transport abstraction.
//!
//! Backend links stream over a shared multi-endpoint serial bus. Lane
//! allocation and synchronisation belong to the transport layer; the card
//! only asks for a stream when a session negotiates its parameters and hands
//! it back at shutdown. [`BusTransport`] is that seam.
//!
//! ## Session fixup
//!
//! Backend streams run at a fixed format regardless of what the frontend
//! negotiated: 48 kHz, stereo, except the TX macro capture ports which are
//! mono. [`HwParams::fixup`] applies this before any stream is requested.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use reachcard_core::{Link, PortId};

use crate::error::TransportError;

/// Sample rate every backend stream runs at.
pub const FIXED_RATE: u32 = 48_000;
/// Channel count of playback and non-TX-macro capture backends.
pub const STEREO: u32 = 2;
/// Channel count of TX macro capture backends.
pub const MONO: u32 = 1;

/// Stream direction of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Towards the codec.
    #[default]
    Playback,
    /// From the codec.
    Capture,
}

/// An inclusive range of acceptable values for one hardware parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    /// Lowest acceptable value.
    pub min: u32,
    /// Highest acceptable value.
    pub max: u32,
}

impl Interval {
    /// A range holding exactly one value.
    pub const fn fixed(value: u32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// A range from `min` to `max`.
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// The single value, if the range is pinned.
    pub fn value(&self) -> Option<u32> {
        (self.min == self.max).then_some(self.min)
    }
}

/// Hardware parameter constraints of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HwParams {
    /// Stream direction.
    pub direction: Direction,
    /// Sample rate in Hz.
    pub rate: Interval,
    /// Channel count.
    pub channels: Interval,
    /// Bits per sample.
    pub sample_bits: u32,
}

impl Default for HwParams {
    fn default() -> Self {
        Self {
            direction: Direction::Playback,
            rate: Interval::new(8_000, 192_000),
            channels: Interval::new(1, 8),
            sample_bits: 16,
        }
    }
}

impl HwParams {
    /// Unconstrained parameters for a direction.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }

    /// Pin rate and channel count for a backend on `port`.
    ///
    /// The pinned values replace whatever was negotiated upstream.
    pub fn fixup(mut self, port: PortId) -> Self {
        self.rate = Interval::fixed(FIXED_RATE);
        self.channels = if port.is_mono_capture() {
            Interval::fixed(MONO)
        } else {
            Interval::fixed(STEREO)
        };
        self
    }
}

/// Opaque bus-stream reservation.
///
/// Holding a handle means the transport has reserved a stream for one link.
/// The inner value is whatever the transport needs to find its stream again.
#[derive(Clone)]
pub struct StreamHandle {
    id: u64,
    inner: Arc<dyn Any + Send + Sync>,
}

impl StreamHandle {
    /// Wrap a transport-specific stream object.
    pub fn new<T: Any + Send + Sync>(id: u64, stream: T) -> Self {
        Self {
            id,
            inner: Arc::new(stream),
        }
    }

    /// Transport-assigned identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Borrow the transport-specific stream object.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for StreamHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// The physical bus transport as seen by the card.
///
/// Calls may block inside the transport but are never cancelled by the
/// card; failures surface synchronously.
pub trait BusTransport: Send + Sync {
    /// Human-readable name of the transport (e.g. "soundwire", "mock").
    fn name(&self) -> &str;

    /// Set up per-session transport state when a link starts up.
    fn open_stream(&self, link: &Link) -> Result<(), TransportError> {
        let _ = link;
        Ok(())
    }

    /// Reserve a bus stream for `link` with already fixed-up parameters.
    fn allocate_stream(&self, link: &Link, params: &HwParams)
    -> Result<StreamHandle, TransportError>;

    /// Prepare and enable a reserved stream.
    fn prepare_stream(&self, handle: &StreamHandle) -> Result<(), TransportError> {
        let _ = handle;
        Ok(())
    }

    /// Disable and deprepare a prepared stream.
    fn deprepare_stream(&self, handle: &StreamHandle) -> Result<(), TransportError> {
        let _ = handle;
        Ok(())
    }

    /// Give a reservation back.
    fn release_stream(&self, handle: StreamHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixup_pins_stereo_48k() {
        let params = HwParams::new(Direction::Playback).fixup(PortId::RX_CODEC_DMA_RX_0);
        assert_eq!(params.rate.value(), Some(48_000));
        assert_eq!(params.channels.value(), Some(2));
    }

    #[test]
    fn fixup_pins_tx_macro_to_mono() {
        for port in [
            PortId::TX_CODEC_DMA_TX_0,
            PortId::TX_CODEC_DMA_TX_1,
            PortId::TX_CODEC_DMA_TX_2,
            PortId::TX_CODEC_DMA_TX_3,
        ] {
            let params = HwParams::new(Direction::Capture).fixup(port);
            assert_eq!(params.channels, Interval::fixed(1), "port {port}");
            assert_eq!(params.rate, Interval::fixed(48_000), "port {port}");
        }
    }

    #[test]
    fn fixup_overrides_negotiated_values() {
        let negotiated = HwParams {
            direction: Direction::Capture,
            rate: Interval::fixed(96_000),
            channels: Interval::fixed(6),
            sample_bits: 24,
        };
        let fixed = negotiated.fixup(PortId::VA_CODEC_DMA_TX_0);
        assert_eq!(fixed.rate.value(), Some(48_000));
        assert_eq!(fixed.channels.value(), Some(2));
        assert_eq!(fixed.sample_bits, 24);
    }

    #[test]
    fn handle_identity() {
        let a = StreamHandle::new(1, "lane0");
        let b = a.clone();
        let c = StreamHandle::new(1, "lane0");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.downcast_ref::<&str>(), Some(&"lane0"));
    }
}
