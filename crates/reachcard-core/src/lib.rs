//! Link topology resolution for AudioReach-style sound cards.
//!
//! A card is described as a flat list of endpoint records, one per DAI
//! link. This crate turns those records into a typed [`LinkTable`]:
//!
//! - **Port identities**: [`PortId`] and its [`PortClass`] drive session policy
//! - **Canonical names**: [`canonicalize`] maps a port id to the name the DSP
//!   graph expects, choosing the MI2S flavour through [`NameVariant`]
//! - **Resolution**: [`TopologyResolver`] classifies each link as frontend or
//!   backend, binds its transport, codec and platform, and sets its flags
//!
//! # Example
//!
//! ```rust
//! use reachcard_core::{
//!     DaiLookup, DaiRef, EndpointRecord, LinkRole, LookupFailure, PcmMode, TopologyResolver,
//! };
//!
//! struct Providers;
//!
//! impl DaiLookup for Providers {
//!     fn dai_name(&self, reference: &DaiRef) -> Result<String, LookupFailure> {
//!         Ok(format!("{}-{:?}", reference.node, reference.first_cell()))
//!     }
//! }
//!
//! let records = [
//!     EndpointRecord::new("MultiMedia1", DaiRef::new("q6apmbedai", [1])),
//!     EndpointRecord::new("WCD Capture", DaiRef::new("q6apmbedai", [114]))
//!         .with_codec(DaiRef::new("wcd938x", [1]))
//!         .with_platform("q6apm"),
//! ];
//!
//! let table = TopologyResolver::new(Providers).resolve(&records).unwrap();
//! let capture = table.by_name("CODEC_DMA-LPAIF_RXTX-TX-0").unwrap();
//! assert_eq!(capture.role(), LinkRole::Backend);
//! assert_eq!(capture.pcm_mode(), PcmMode::Direct);
//! ```

mod canonical;
mod error;
mod link;
mod port;
mod record;
mod resolve;

pub use canonical::{NameVariant, canonical_name, canonicalize};
pub use error::{DaiSelector, TopologyError};
pub use link::{
    CodecBinding, DUMMY_CODEC_COMPONENT, DUMMY_CODEC_DAI, DaiBinding, Link, LinkFlags, LinkRole,
    PcmMode, PlatformBinding,
};
pub use port::{DisplaySink, PortClass, PortId};
pub use record::{DaiRef, EndpointRecord};
pub use resolve::{DaiLookup, LinkTable, LookupFailure, TopologyResolver};
