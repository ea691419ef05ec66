//! Property-based tests for canonicalization and link resolution.
//!
//! Verifies the invariants every resolved link must satisfy regardless of
//! the declared name, port id or codec layout.

use proptest::prelude::*;
use reachcard_core::{
    CodecBinding, DaiLookup, DaiRef, EndpointRecord, LinkRole, LookupFailure, NameVariant,
    PcmMode, PortId, TopologyResolver, canonicalize,
};

/// Accepts every reference; the DAI name echoes the node and first cell.
struct AnyProvider;

impl DaiLookup for AnyProvider {
    fn dai_name(&self, reference: &DaiRef) -> Result<String, LookupFailure> {
        Ok(format!("{}:{}", reference.node, reference.first_cell().unwrap_or(0)))
    }
}

fn record(name: &str, port: u32, codecs: usize, platform: bool) -> EndpointRecord {
    let mut record = EndpointRecord::new(name, DaiRef::new("q6apmbedai", [port]));
    for i in 0..codecs {
        record = record.with_codec(DaiRef::new(format!("codec{i}"), [i as u32]));
    }
    if platform {
        record = record.with_platform("q6apm");
    }
    record
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Canonicalizing the same input twice gives the same name.
    #[test]
    fn canonicalize_is_deterministic(port in 0u32..160, name in "[A-Za-z0-9 ]{1,24}") {
        let first = canonicalize(PortId(port), &name);
        let second = canonicalize(PortId(port), &name);
        prop_assert_eq!(first, second);
    }

    /// Only the headset marker changes the MI2S flavour.
    #[test]
    fn marker_selects_sdr_variant(port in 16u32..22, name in "[a-z0-9 ]{0,16}") {
        let plain = canonicalize(PortId(port), &name);
        let headset = canonicalize(PortId(port), &format!("{name}HS"));
        prop_assert!(plain.starts_with("MI2S-LPAIF-"), "got {}", plain);
        prop_assert!(headset.starts_with("MI2S-LPAIF_SDR-"), "got {}", headset);
        prop_assert_eq!(NameVariant::from_declared(&name), NameVariant::Standard);
    }

    /// Records without a codec child become dynamic frontends on the dummy codec.
    #[test]
    fn codecless_records_are_dynamic_frontends(
        port in 0u32..160,
        name in "[A-Za-z][A-Za-z0-9 ]{0,20}",
        platform in any::<bool>(),
    ) {
        let resolver = TopologyResolver::new(AnyProvider);
        let link = resolver.resolve_one(0, &record(&name, port, 0, platform)).unwrap();
        prop_assert_eq!(link.pcm_mode(), PcmMode::Dynamic);
        prop_assert_eq!(link.role(), LinkRole::Frontend);
        prop_assert_eq!(link.codecs(), &CodecBinding::Dummy);
        prop_assert!(link.flags().dynamic);
        prop_assert!(link.flags().ignore_suspend && link.flags().nonatomic);
    }

    /// Codec plus platform always yields a direct backend without raw PCM.
    #[test]
    fn codec_and_platform_make_direct_backends(
        port in 0u32..160,
        name in "[A-Za-z][A-Za-z0-9 ]{0,20}",
        codecs in 1usize..4,
    ) {
        let resolver = TopologyResolver::new(AnyProvider);
        let link = resolver.resolve_one(0, &record(&name, port, codecs, true)).unwrap();
        prop_assert_eq!(link.pcm_mode(), PcmMode::Direct);
        prop_assert_eq!(link.role(), LinkRole::Backend);
        prop_assert!(link.flags().no_pcm);
        prop_assert!(link.flags().ignore_pmdown_time);
        prop_assert_eq!(link.codecs().dais().len(), codecs);
        prop_assert_eq!(link.stream_name(), link.name());
        prop_assert_eq!(link.id(), PortId(port));
    }
}
