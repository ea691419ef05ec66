//! Link topology resolution.
//!
//! [`TopologyResolver`] walks the endpoint records in order and turns each
//! into a [`Link`]:
//!
//! 1. the `cpu` child is mandatory and its first argument cell is the link id;
//! 2. the platform defaults to the cpu node unless the record names one;
//! 3. a codec child makes the link codec-bearing, and together with an
//!    explicit platform a DPCM backend (`no_pcm`, `ignore_pmdown_time`);
//!    no codec makes it a DPCM frontend on the dummy codec;
//! 4. explicit platform or missing codec relaxes scheduling
//!    (`ignore_suspend`, `nonatomic`);
//! 5. the declared name is replaced by the canonical one for the port.
//!
//! The first failing record aborts the whole resolve.

use std::collections::HashMap;

use crate::canonical::{NameVariant, canonicalize};
use crate::error::{DaiSelector, TopologyError};
use crate::link::{CodecBinding, DaiBinding, Link, LinkFlags, LinkRole, PcmMode, PlatformBinding};
use crate::port::PortId;
use crate::record::{DaiRef, EndpointRecord};

/// Why a DAI reference could not be translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    /// The referenced node provides no DAIs.
    UnknownProvider,
    /// The provider exists but has no DAI matching the reference.
    UnknownDai {
        /// Number of DAIs the provider exposes.
        available: usize,
    },
}

/// Translates DAI references into DAI names.
///
/// This is the card framework's view of the registered DAI providers.
pub trait DaiLookup {
    /// Name of the DAI that `reference` selects.
    fn dai_name(&self, reference: &DaiRef) -> Result<String, LookupFailure>;
}

impl<L: DaiLookup + ?Sized> DaiLookup for &L {
    fn dai_name(&self, reference: &DaiRef) -> Result<String, LookupFailure> {
        (**self).dai_name(reference)
    }
}

/// Ordered link table of a card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: Vec<Link>,
}

impl LinkTable {
    /// Number of links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Link with the given id.
    pub fn get(&self, id: PortId) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Link with the given canonical name.
    pub fn by_name(&self, name: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Links in description order.
    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.links.iter()
    }

    /// Canonical names in description order.
    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(Link::name).collect()
    }
}

impl<'a> IntoIterator for &'a LinkTable {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

impl IntoIterator for LinkTable {
    type Item = Link;
    type IntoIter = std::vec::IntoIter<Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.into_iter()
    }
}

/// Resolves endpoint records against a set of DAI providers.
#[derive(Debug)]
pub struct TopologyResolver<L> {
    lookup: L,
}

impl<L: DaiLookup> TopologyResolver<L> {
    /// Create a resolver over the given provider lookup.
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Resolve all records, in order, into a link table.
    pub fn resolve(&self, records: &[EndpointRecord]) -> Result<LinkTable, TopologyError> {
        let mut links = Vec::with_capacity(records.len());
        let mut seen: HashMap<PortId, usize> = HashMap::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            let link = self.resolve_one(position, record)?;
            if let Some(&earlier) = seen.get(&link.id) {
                let first: &Link = &links[earlier];
                return Err(TopologyError::DuplicatePort {
                    id: link.id.get(),
                    first: first.name.clone(),
                    second: record.name.clone(),
                });
            }
            seen.insert(link.id, links.len());
            links.push(link);
        }

        tracing::debug!(links = links.len(), "topology resolved");
        Ok(LinkTable { links })
    }

    /// Resolve a single record.
    pub fn resolve_one(
        &self,
        position: usize,
        record: &EndpointRecord,
    ) -> Result<Link, TopologyError> {
        let declared = record.name.as_str();
        if declared.is_empty() {
            return Err(TopologyError::MissingName { position });
        }

        let Some(cpu_ref) = record.cpu.as_ref() else {
            tracing::error!(link = declared, "can't find cpu node");
            return Err(TopologyError::MissingTransport {
                link: declared.to_string(),
            });
        };
        let Some(raw_id) = cpu_ref.first_cell() else {
            return Err(TopologyError::MissingPortId {
                link: declared.to_string(),
                node: cpu_ref.node.clone(),
            });
        };
        let id = PortId(raw_id);
        let cpu = self.bind(declared, cpu_ref)?;

        tracing::debug!(
            link = declared,
            id = raw_id,
            cpu_dai = %cpu.dai_name,
            platform = record.platform.as_deref().unwrap_or(cpu_ref.node.as_str()),
            "before canonicalization"
        );

        let platform = match &record.platform {
            Some(node) => PlatformBinding {
                node: node.clone(),
                explicit: true,
            },
            None => PlatformBinding {
                node: cpu_ref.node.clone(),
                explicit: false,
            },
        };

        let mut flags = LinkFlags::default();
        let (codecs, role, pcm_mode) = match &record.codecs {
            Some(refs) => {
                if refs.is_empty() {
                    return Err(TopologyError::EmptyCodec {
                        link: declared.to_string(),
                    });
                }
                let dais = refs
                    .iter()
                    .map(|r| self.bind(declared, r))
                    .collect::<Result<Vec<_>, _>>()?;
                if platform.explicit {
                    flags.no_pcm = true;
                    flags.ignore_pmdown_time = true;
                    (CodecBinding::Real(dais), LinkRole::Backend, PcmMode::Direct)
                } else {
                    (CodecBinding::Real(dais), LinkRole::Frontend, PcmMode::Dynamic)
                }
            }
            None => {
                flags.dynamic = true;
                (CodecBinding::Dummy, LinkRole::Frontend, PcmMode::Dynamic)
            }
        };

        if platform.explicit || codecs.is_dummy() {
            flags.ignore_suspend = true;
            flags.nonatomic = true;
        }

        let name = canonicalize(id, declared);
        tracing::debug!(
            link = %name,
            declared,
            id = raw_id,
            role = ?role,
            pcm = ?pcm_mode,
            codecs = codecs.len(),
            platform = %platform.node,
            "after canonicalization"
        );

        Ok(Link {
            id,
            name,
            declared_name: declared.to_string(),
            variant: NameVariant::from_declared(declared),
            role,
            pcm_mode,
            cpu,
            codecs,
            platform,
            flags,
        })
    }

    fn bind(&self, link: &str, reference: &DaiRef) -> Result<DaiBinding, TopologyError> {
        match self.lookup.dai_name(reference) {
            Ok(dai_name) => Ok(DaiBinding {
                node: reference.node.clone(),
                dai_name,
            }),
            Err(LookupFailure::UnknownProvider) => {
                tracing::error!(link, node = %reference.node, "DAI provider not found");
                Err(TopologyError::UnknownProvider {
                    link: link.to_string(),
                    node: reference.node.clone(),
                })
            }
            Err(LookupFailure::UnknownDai { available }) => {
                tracing::error!(link, node = %reference.node, "DAI not found");
                Err(TopologyError::UnknownDai {
                    link: link.to_string(),
                    node: reference.node.clone(),
                    dai: reference
                        .first_cell()
                        .map_or(DaiSelector::Sole, DaiSelector::Id),
                    available,
                })
            }
        }
    }
}
