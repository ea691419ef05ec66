//! Error types for topology resolution.

use std::fmt;

use thiserror::Error;

/// How a DAI reference selects a DAI on its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaiSelector {
    /// By the first argument cell.
    Id(u32),
    /// No argument cells: the provider's only DAI.
    Sole,
}

impl fmt::Display for DaiSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaiSelector::Id(id) => write!(f, "#{id}"),
            DaiSelector::Sole => f.write_str("(sole)"),
        }
    }
}

/// Errors raised while turning endpoint records into a link table.
///
/// Any of these aborts the whole resolve; there is no partial topology.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// A record carried no link name.
    #[error("endpoint record #{position} has no link name")]
    MissingName {
        /// Zero-based position of the record in the description.
        position: usize,
    },

    /// A record has no `cpu` child.
    #[error("{link}: can't find cpu node")]
    MissingTransport {
        /// Declared name of the link.
        link: String,
    },

    /// The `cpu` reference has no argument cell to take the port id from.
    #[error("{link}: cpu reference to '{node}' has no argument cells")]
    MissingPortId {
        /// Declared name of the link.
        link: String,
        /// Node the reference points at.
        node: String,
    },

    /// A referenced DAI provider is not known to the card.
    #[error("{link}: DAI provider '{node}' not found")]
    UnknownProvider {
        /// Declared name of the link.
        link: String,
        /// Node the reference points at.
        node: String,
    },

    /// A DAI reference names a DAI the provider does not expose.
    #[error("{link}: '{node}' has no DAI {dai} ({available} DAIs)")]
    UnknownDai {
        /// Declared name of the link.
        link: String,
        /// Provider node.
        node: String,
        /// How the reference selected the DAI.
        dai: DaiSelector,
        /// Number of DAIs the provider exposes.
        available: usize,
    },

    /// A codec child was present but listed no DAIs.
    #[error("{link}: codec node lists no DAIs")]
    EmptyCodec {
        /// Declared name of the link.
        link: String,
    },

    /// Two records resolved to the same port id.
    #[error("port id {id} is used by both '{first}' and '{second}'")]
    DuplicatePort {
        /// The shared port id.
        id: u32,
        /// Canonical name of the earlier link.
        first: String,
        /// Declared name of the later record.
        second: String,
    },

    /// A display sink index outside the card's sink table.
    #[error("display sink index {index} out of range (card has {count} sinks)")]
    SinkOutOfRange {
        /// Requested sink index.
        index: usize,
        /// Number of sinks.
        count: usize,
    },
}
