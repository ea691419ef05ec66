//! Resolved links.

use crate::canonical::NameVariant;
use crate::port::{PortClass, PortId};

/// Component name of the pass-through codec.
pub const DUMMY_CODEC_COMPONENT: &str = "snd-soc-dummy";
/// DAI name of the pass-through codec.
pub const DUMMY_CODEC_DAI: &str = "snd-soc-dummy-dai";

/// Whether a link is exposed to applications or bound to hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkRole {
    /// Exposes PCM to applications and routes through DPCM.
    Frontend,
    /// Bound to a physical transport and codec.
    Backend,
}

/// How the link's PCM is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PcmMode {
    /// Fixed hardware binding without a raw PCM device.
    Direct,
    /// Routed through the dynamic PCM layer.
    Dynamic,
}

/// A resolved DAI on some provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DaiBinding {
    /// Providing node, which is also the owning component.
    pub node: String,
    /// DAI name on that provider.
    pub dai_name: String,
}

/// The codec side of a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecBinding {
    /// No codec declared; the pass-through dummy stands in.
    Dummy,
    /// Codec DAIs from the description, in declaration order. Never empty.
    Real(Vec<DaiBinding>),
}

impl CodecBinding {
    /// Whether this is the dummy codec.
    pub fn is_dummy(&self) -> bool {
        matches!(self, CodecBinding::Dummy)
    }

    /// Number of codec DAIs; the dummy counts as one.
    pub fn len(&self) -> usize {
        match self {
            CodecBinding::Dummy => 1,
            CodecBinding::Real(dais) => dais.len(),
        }
    }

    /// Always false: a link has at least the dummy codec.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Real codec DAIs, empty for the dummy.
    pub fn dais(&self) -> &[DaiBinding] {
        match self {
            CodecBinding::Dummy => &[],
            CodecBinding::Real(dais) => dais,
        }
    }

    /// DAI names, using the dummy's name for the dummy.
    pub fn dai_names(&self) -> Vec<&str> {
        match self {
            CodecBinding::Dummy => vec![DUMMY_CODEC_DAI],
            CodecBinding::Real(dais) => dais.iter().map(|d| d.dai_name.as_str()).collect(),
        }
    }
}

/// The platform (DMA) side of a link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformBinding {
    /// Platform node.
    pub node: String,
    /// Whether the description named it, rather than inheriting the cpu node.
    pub explicit: bool,
}

/// Raw scheduling flags handed to the audio framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinkFlags {
    /// No PCM device is created for this link (DPCM backend).
    pub no_pcm: bool,
    /// Skip the power-down delay when the stream stops.
    pub ignore_pmdown_time: bool,
    /// Keep the link running across system suspend.
    pub ignore_suspend: bool,
    /// Callbacks may sleep.
    pub nonatomic: bool,
    /// Link is a DPCM frontend.
    pub dynamic: bool,
}

/// One entry of the card's link table.
///
/// Built once by [`TopologyResolver`](crate::TopologyResolver) and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub(crate) id: PortId,
    pub(crate) name: String,
    pub(crate) declared_name: String,
    pub(crate) variant: NameVariant,
    pub(crate) role: LinkRole,
    pub(crate) pcm_mode: PcmMode,
    pub(crate) cpu: DaiBinding,
    pub(crate) codecs: CodecBinding,
    pub(crate) platform: PlatformBinding,
    pub(crate) flags: LinkFlags,
}

impl Link {
    /// Port id; the link's stable identity.
    pub fn id(&self) -> PortId {
        self.id
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stream name; always the canonical name.
    pub fn stream_name(&self) -> &str {
        &self.name
    }

    /// Name as declared in the description.
    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    /// MI2S flavour picked from the declared name.
    pub fn variant(&self) -> NameVariant {
        self.variant
    }

    /// Frontend or backend.
    pub fn role(&self) -> LinkRole {
        self.role
    }

    /// Direct or dynamic PCM.
    pub fn pcm_mode(&self) -> PcmMode {
        self.pcm_mode
    }

    /// Transport (cpu) DAI.
    pub fn cpu(&self) -> &DaiBinding {
        &self.cpu
    }

    /// Codec DAIs.
    pub fn codecs(&self) -> &CodecBinding {
        &self.codecs
    }

    /// Platform binding.
    pub fn platform(&self) -> &PlatformBinding {
        &self.platform
    }

    /// Scheduling flags.
    pub fn flags(&self) -> LinkFlags {
        self.flags
    }

    /// Session-policy class of the port.
    pub fn class(&self) -> PortClass {
        self.id.class()
    }

    /// Whether the session callbacks are attached to this link.
    ///
    /// Callbacks go to DPCM backends and to every link with a codec; the
    /// dummy counts as one, so every resolved link qualifies.
    pub fn has_ops(&self) -> bool {
        self.flags.no_pcm || !self.codecs.is_empty()
    }

    /// Distinct codec components, in first-seen order.
    pub fn codec_components(&self) -> Vec<&str> {
        let mut components: Vec<&str> = Vec::new();
        for dai in self.codecs.dais() {
            if !components.contains(&dai.node.as_str()) {
                components.push(&dai.node);
            }
        }
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dai(node: &str, name: &str) -> DaiBinding {
        DaiBinding {
            node: node.to_string(),
            dai_name: name.to_string(),
        }
    }

    #[test]
    fn dummy_codec_counts_as_one() {
        let codecs = CodecBinding::Dummy;
        assert_eq!(codecs.len(), 1);
        assert!(codecs.dais().is_empty());
        assert_eq!(codecs.dai_names(), vec![DUMMY_CODEC_DAI]);
    }

    #[test]
    fn codec_components_deduplicated() {
        let link = Link {
            id: PortId::TX_CODEC_DMA_TX_3,
            name: "CODEC_DMA-LPAIF_RXTX-TX-3".to_string(),
            declared_name: "WCD Capture".to_string(),
            variant: NameVariant::Standard,
            role: LinkRole::Backend,
            pcm_mode: PcmMode::Direct,
            cpu: dai("q6apmbedai", "TX_CODEC_DMA_TX_3"),
            codecs: CodecBinding::Real(vec![
                dai("wcd938x", "wcd938x-tx"),
                dai("swr2", "swr2-tx"),
                dai("wcd938x", "wcd938x-mbhc"),
            ]),
            platform: PlatformBinding {
                node: "q6apm".to_string(),
                explicit: true,
            },
            flags: LinkFlags::default(),
        };
        assert_eq!(link.codec_components(), vec!["wcd938x", "swr2"]);
        assert!(link.has_ops());
        assert_eq!(link.stream_name(), link.name());
    }
}
