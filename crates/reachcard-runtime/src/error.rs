//! Error types for card bring-up and session operations.

use reachcard_core::{PortId, TopologyError};
use thiserror::Error;

use crate::session::SessionState;

/// Failure reported by the bus transport layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No free lane or stream slot on the bus.
    #[error("bus resources exhausted: {0}")]
    Exhausted(String),

    /// The transport hardware reported a fault.
    #[error("transport fault: {0}")]
    Hardware(String),
}

/// Failure reported by the jack subsystem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JackError {
    /// The component does not take jack events. Not fatal.
    #[error("component '{component}' does not support jacks")]
    NotSupported {
        /// Component that declined the jack.
        component: String,
    },

    /// Any other jack subsystem failure.
    #[error("jack subsystem error: {0}")]
    Backend(String),
}

/// Failure reported by the mixer control layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// No control with this name exists on the card.
    #[error("control '{0}' not found")]
    NotFound(String),

    /// The control exists but refused the limit.
    #[error("control '{control}' rejected limit: {reason}")]
    Rejected {
        /// Control name.
        control: String,
        /// Reason given by the control layer.
        reason: String,
    },
}

/// Errors surfaced to the hosting framework by card and session operations.
#[derive(Debug, Error)]
pub enum CardError {
    /// The card description could not be resolved.
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),

    /// A stream was acquired twice for the same link without a release.
    #[error("{link}: bus stream already held for port {id}")]
    TransportBusy {
        /// Canonical link name.
        link: String,
        /// Port id of the link.
        id: PortId,
    },

    /// The transport could not allocate a stream for the session.
    #[error("{link}: bus stream allocation failed: {source}")]
    TransportAllocationFailed {
        /// Canonical link name.
        link: String,
        /// Transport failure.
        #[source]
        source: TransportError,
    },

    /// A transport call other than allocation failed.
    #[error("{link}: transport {operation} failed: {source}")]
    TransportFailed {
        /// Canonical link name.
        link: String,
        /// Operation that failed.
        operation: &'static str,
        /// Transport failure.
        #[source]
        source: TransportError,
    },

    /// A jack could not be created or its buttons bound.
    #[error("unable to add {jack}: {source}")]
    JackCreationFailed {
        /// Jack name.
        jack: String,
        /// Jack subsystem failure.
        #[source]
        source: JackError,
    },

    /// A codec component rejected the jack with a fatal error.
    #[error("failed to set {jack} on '{component}': {source}")]
    JackPropagationFailed {
        /// Jack name.
        jack: String,
        /// Component that failed.
        component: String,
        /// Jack subsystem failure.
        #[source]
        source: JackError,
    },

    /// A lifecycle callback arrived in a state that does not allow it.
    #[error("{link}: {operation} not allowed in state {state:?}")]
    InvalidTransition {
        /// Canonical link name.
        link: String,
        /// Current session state.
        state: SessionState,
        /// Callback that was refused.
        operation: &'static str,
    },

    /// No link with session callbacks has this id.
    #[error("no session for port {0}")]
    UnknownLink(PortId),
}

impl CardError {
    /// Whether the error leaves the session usable for a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CardError::TransportAllocationFailed { .. } | CardError::TransportFailed { .. }
        )
    }
}
