//! Canonical link names.
//!
//! The DSP graph addresses backend links by fixed names, so the declared
//! `link-name` of a record is only advisory. Once a link's port id is known
//! its name is rewritten to the canonical one. MI2S ports exist in two
//! flavours (plain LPAIF and the SDR variant used by headset boards); the
//! declared name selects between them through [`NameVariant`].

use crate::port::PortId;

/// Which physical MI2S flavour a declared name asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameVariant {
    /// Plain LPAIF interface.
    #[default]
    Standard,
    /// LPAIF_SDR interface, selected by an `HS` marker in the declared name.
    Headset,
}

impl NameVariant {
    /// Marker substring that selects the headset variant.
    pub const HEADSET_MARKER: &'static str = "HS";

    /// Decide the variant from a declared link name.
    pub fn from_declared(name: &str) -> Self {
        if name.contains(Self::HEADSET_MARKER) {
            NameVariant::Headset
        } else {
            NameVariant::Standard
        }
    }

    /// Whether this is the headset variant.
    pub const fn has_headset_variant(self) -> bool {
        matches!(self, NameVariant::Headset)
    }
}

/// Canonical name for a recognised port, `None` for anything else.
pub fn canonical_name(port: PortId, variant: NameVariant) -> Option<&'static str> {
    let sdr = variant.has_headset_variant();
    let name = match port {
        PortId::WSA_CODEC_DMA_RX_0 => "CODEC_DMA-LPAIF_WSA-RX-0",
        PortId::VA_CODEC_DMA_TX_0 => "CODEC_DMA-LPAIF_VA-TX-0",
        PortId::RX_CODEC_DMA_RX_0 => "CODEC_DMA-LPAIF_RXTX-RX-0",
        PortId::TX_CODEC_DMA_TX_0 => "CODEC_DMA-LPAIF_RXTX-TX-0",
        PortId::TX_CODEC_DMA_TX_3 => "CODEC_DMA-LPAIF_RXTX-TX-3",
        PortId::PRIMARY_MI2S_RX if sdr => "MI2S-LPAIF_SDR-RX-PRIMARY",
        PortId::PRIMARY_MI2S_RX => "MI2S-LPAIF-RX-PRIMARY",
        PortId::PRIMARY_MI2S_TX if sdr => "MI2S-LPAIF_SDR-TX-PRIMARY",
        PortId::PRIMARY_MI2S_TX => "MI2S-LPAIF-TX-PRIMARY",
        PortId::SECONDARY_MI2S_RX if sdr => "MI2S-LPAIF_SDR-RX-SECONDARY",
        PortId::SECONDARY_MI2S_RX => "MI2S-LPAIF-RX-SECONDARY",
        PortId::SECONDARY_MI2S_TX if sdr => "MI2S-LPAIF_SDR-TX-SECONDARY",
        PortId::SECONDARY_MI2S_TX => "MI2S-LPAIF-TX-SECONDARY",
        PortId::TERTIARY_MI2S_RX if sdr => "MI2S-LPAIF_SDR-RX-TERTIARY",
        PortId::TERTIARY_MI2S_RX => "MI2S-LPAIF-RX-TERTIARY",
        PortId::TERTIARY_MI2S_TX if sdr => "MI2S-LPAIF_SDR-TX-TERTIARY",
        PortId::TERTIARY_MI2S_TX => "MI2S-LPAIF-TX-TERTIARY",
        _ => return None,
    };
    Some(name)
}

/// Canonicalize a declared link name for the given port.
///
/// Unrecognised ports keep their declared name.
pub fn canonicalize(port: PortId, declared: &str) -> String {
    canonical_name(port, NameVariant::from_declared(declared))
        .map_or_else(|| declared.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_dma_ports_ignore_marker() {
        assert_eq!(
            canonicalize(PortId::TX_CODEC_DMA_TX_3, "HS capture"),
            "CODEC_DMA-LPAIF_RXTX-TX-3"
        );
        assert_eq!(
            canonicalize(PortId::WSA_CODEC_DMA_RX_0, "Speaker Playback"),
            "CODEC_DMA-LPAIF_WSA-RX-0"
        );
    }

    #[test]
    fn mi2s_branches_on_marker() {
        assert_eq!(
            canonicalize(PortId::PRIMARY_MI2S_RX, "HS0 MI2S Playback"),
            "MI2S-LPAIF_SDR-RX-PRIMARY"
        );
        assert_eq!(
            canonicalize(PortId::PRIMARY_MI2S_RX, "MI2S Playback"),
            "MI2S-LPAIF-RX-PRIMARY"
        );
        assert_eq!(
            canonicalize(PortId::TERTIARY_MI2S_TX, "HS2 Capture"),
            "MI2S-LPAIF_SDR-TX-TERTIARY"
        );
    }

    #[test]
    fn marker_is_case_sensitive() {
        assert_eq!(NameVariant::from_declared("hs0 playback"), NameVariant::Standard);
        assert_eq!(NameVariant::from_declared("xHSx"), NameVariant::Headset);
    }

    #[test]
    fn unknown_port_passes_through() {
        assert_eq!(canonicalize(PortId(1), "MultiMedia1"), "MultiMedia1");
        assert_eq!(canonical_name(PortId::DISPLAY_PORT_RX_0, NameVariant::Standard), None);
    }
}
