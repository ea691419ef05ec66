//! DAI provider table.
//!
//! Stands in for the DAIs registered by the platform and codec drivers.
//! Each provider node lists its DAIs in order; a DAI may carry an explicit
//! id, otherwise its position is its id. A reference with no argument cells
//! selects the provider's only DAI.

use std::collections::BTreeMap;

use reachcard_core::{DaiLookup, DaiRef, LookupFailure};
use serde::{Deserialize, Serialize};

/// One DAI of a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaiEntry {
    /// DAI name.
    pub name: String,
    /// Id selected by the first argument cell; defaults to the position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

impl DaiEntry {
    /// A DAI selected by position.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    /// A DAI with an explicit id.
    pub fn with_id(name: impl Into<String>, id: u32) -> Self {
        Self {
            name: name.into(),
            id: Some(id),
        }
    }
}

/// A node exposing DAIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaiProvider {
    /// Node name, as referenced from links.
    pub node: String,
    /// DAIs in declaration order.
    #[serde(default)]
    pub dais: Vec<DaiEntry>,
}

impl DaiProvider {
    fn find(&self, reference: &DaiRef) -> Option<&DaiEntry> {
        match reference.first_cell() {
            None => match self.dais.as_slice() {
                [only] => Some(only),
                _ => None,
            },
            Some(cell) => self
                .dais
                .iter()
                .enumerate()
                .find(|(position, dai)| dai.id.unwrap_or(*position as u32) == cell)
                .map(|(_, dai)| dai),
        }
    }
}

/// Every DAI provider of a card, keyed by node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderTable {
    providers: BTreeMap<String, DaiProvider>,
}

impl ProviderTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a provider.
    pub fn insert(&mut self, provider: DaiProvider) {
        self.providers.insert(provider.node.clone(), provider);
    }

    /// Look up a provider by node.
    pub fn get(&self, node: &str) -> Option<&DaiProvider> {
        self.providers.get(node)
    }

    /// Number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the table has no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl FromIterator<DaiProvider> for ProviderTable {
    fn from_iter<I: IntoIterator<Item = DaiProvider>>(iter: I) -> Self {
        let mut table = Self::new();
        for provider in iter {
            table.insert(provider);
        }
        table
    }
}

impl DaiLookup for ProviderTable {
    fn dai_name(&self, reference: &DaiRef) -> Result<String, LookupFailure> {
        let provider = self
            .providers
            .get(&reference.node)
            .ok_or(LookupFailure::UnknownProvider)?;
        provider
            .find(reference)
            .map(|dai| dai.name.clone())
            .ok_or(LookupFailure::UnknownDai {
                available: provider.dais.len(),
            })
    }
}
