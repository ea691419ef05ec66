//! Per-link bus-stream bookkeeping.
//!
//! The card keeps one slot per link id holding the link's bus-stream
//! reservation and whether it has been prepared. Links that share a physical
//! bus lane still get separate slots; lane arbitration is the transport's
//! business.
//!
//! Acquisition reserves the slot under the lock before calling into the
//! transport, so two racing `acquire`s for one id cannot both allocate.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use reachcard_core::{Link, PortId};

use crate::error::{CardError, TransportError};
use crate::transport::{BusTransport, HwParams, StreamHandle};

#[derive(Debug, Default)]
struct StreamSlot {
    handle: Option<StreamHandle>,
    prepared: bool,
    allocating: bool,
}

impl StreamSlot {
    fn is_free(&self) -> bool {
        self.handle.is_none() && !self.allocating
    }
}

/// Table of bus-stream reservations keyed by link id.
pub struct StreamRuntimeRegistry {
    transport: Arc<dyn BusTransport>,
    slots: Mutex<HashMap<PortId, StreamSlot>>,
}

impl StreamRuntimeRegistry {
    /// Create an empty registry on top of a transport.
    pub fn new(transport: Arc<dyn BusTransport>) -> Self {
        Self {
            transport,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The transport streams are allocated from.
    pub fn transport(&self) -> &Arc<dyn BusTransport> {
        &self.transport
    }

    /// Reserve a bus stream for `link`.
    ///
    /// Fails with [`CardError::TransportBusy`] if the link already holds a
    /// stream. A transport failure leaves the slot free for a retry.
    pub fn acquire(&self, link: &Link, params: &HwParams) -> Result<StreamHandle, CardError> {
        let id = link.id();
        {
            let mut slots = self.slots.lock();
            let slot = slots.entry(id).or_default();
            if !slot.is_free() {
                tracing::error!(link = link.name(), id = id.get(), "bus stream already held");
                return Err(CardError::TransportBusy {
                    link: link.name().to_string(),
                    id,
                });
            }
            slot.allocating = true;
        }

        let result = self.transport.allocate_stream(link, params);

        let mut slots = self.slots.lock();
        let slot = slots.entry(id).or_default();
        slot.allocating = false;
        match result {
            Ok(handle) => {
                tracing::debug!(link = link.name(), stream = handle.id(), "bus stream acquired");
                slot.handle = Some(handle.clone());
                slot.prepared = false;
                Ok(handle)
            }
            Err(source) => {
                tracing::error!(link = link.name(), error = %source, "bus stream allocation failed");
                Err(CardError::TransportAllocationFailed {
                    link: link.name().to_string(),
                    source,
                })
            }
        }
    }

    /// Prepare the link's stream. No-op if it is already prepared.
    ///
    /// Returns `true` if the stream went from configured to prepared.
    pub fn mark_prepared(&self, link: &Link) -> Result<bool, CardError> {
        let id = link.id();
        let handle = {
            let slots = self.slots.lock();
            match slots.get(&id) {
                Some(StreamSlot { prepared: true, .. }) => return Ok(false),
                Some(StreamSlot {
                    handle: Some(handle),
                    ..
                }) => handle.clone(),
                _ => {
                    return Err(CardError::TransportFailed {
                        link: link.name().to_string(),
                        operation: "prepare",
                        source: TransportError::Hardware("no stream allocated".to_string()),
                    });
                }
            }
        };

        self.transport
            .prepare_stream(&handle)
            .map_err(|source| CardError::TransportFailed {
                link: link.name().to_string(),
                operation: "prepare",
                source,
            })?;

        if let Some(slot) = self.slots.lock().get_mut(&id) {
            slot.prepared = true;
        }
        Ok(true)
    }

    /// Drop the prepared state of the link's stream.
    ///
    /// Tolerates a stream that was never prepared. Transport errors while
    /// depreparing are logged; the flag is cleared regardless.
    pub fn clear_prepared(&self, link: &Link) -> bool {
        let handle = {
            let mut slots = self.slots.lock();
            match slots.get_mut(&link.id()) {
                Some(slot) if slot.prepared => {
                    slot.prepared = false;
                    slot.handle.clone()
                }
                _ => return false,
            }
        };

        if let Some(handle) = handle
            && let Err(err) = self.transport.deprepare_stream(&handle)
        {
            tracing::warn!(link = link.name(), error = %err, "bus stream deprepare failed");
        }
        true
    }

    /// Release the link's stream, if any. Safe to call repeatedly.
    ///
    /// Returns `true` if a stream was handed back to the transport.
    pub fn release(&self, id: PortId) -> bool {
        let handle = {
            let mut slots = self.slots.lock();
            match slots.get_mut(&id) {
                Some(slot) => {
                    slot.prepared = false;
                    slot.handle.take()
                }
                None => None,
            }
        };

        match handle {
            Some(handle) => {
                tracing::debug!(id = id.get(), stream = handle.id(), "bus stream released");
                self.transport.release_stream(handle);
                true
            }
            None => false,
        }
    }

    /// The link's current stream, if any.
    pub fn handle(&self, id: PortId) -> Option<StreamHandle> {
        self.slots.lock().get(&id).and_then(|s| s.handle.clone())
    }

    /// Whether the link's stream is prepared.
    pub fn is_prepared(&self, id: PortId) -> bool {
        self.slots.lock().get(&id).is_some_and(|s| s.prepared)
    }

    /// Number of links currently holding a stream.
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|s| s.handle.is_some())
            .count()
    }
}

impl std::fmt::Debug for StreamRuntimeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRuntimeRegistry")
            .field("transport", &self.transport.name())
            .field("active", &self.active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockTransport, backend_link};
    use crate::transport::Direction;

    fn registry() -> (Arc<MockTransport>, StreamRuntimeRegistry) {
        let transport = Arc::new(MockTransport::new());
        let registry = StreamRuntimeRegistry::new(transport.clone());
        (transport, registry)
    }

    #[test]
    fn double_acquire_is_busy() {
        let (transport, registry) = registry();
        let link = backend_link(PortId::RX_CODEC_DMA_RX_0, &["wcd938x"]).unwrap();
        let params = HwParams::new(Direction::Playback);

        registry.acquire(&link, &params).unwrap();
        let err = registry.acquire(&link, &params).unwrap_err();
        assert!(matches!(err, CardError::TransportBusy { id, .. } if id == link.id()));
        assert_eq!(transport.allocations(), 1);
    }

    #[test]
    fn release_is_idempotent() {
        let (transport, registry) = registry();
        let link = backend_link(PortId::RX_CODEC_DMA_RX_0, &["wcd938x"]).unwrap();

        assert!(!registry.release(link.id()));
        registry.acquire(&link, &HwParams::default()).unwrap();
        assert!(registry.release(link.id()));
        assert!(!registry.release(link.id()));
        assert!(!registry.release(link.id()));
        assert_eq!(transport.releases(), 1);
        assert_eq!(registry.active(), 0);

        registry.acquire(&link, &HwParams::default()).unwrap();
        assert_eq!(registry.active(), 1);
    }

    #[test]
    fn links_sharing_a_lane_get_separate_slots() {
        let (_transport, registry) = registry();
        let rx = backend_link(PortId::RX_CODEC_DMA_RX_0, &["wcd938x"]).unwrap();
        let tx = backend_link(PortId::TX_CODEC_DMA_TX_0, &["wcd938x"]).unwrap();

        let a = registry.acquire(&rx, &HwParams::default()).unwrap();
        let b = registry.acquire(&tx, &HwParams::default()).unwrap();
        assert_ne!(a, b);
        registry.release(rx.id());
        assert!(registry.handle(tx.id()).is_some());
    }

    #[test]
    fn failed_allocation_leaves_slot_free() {
        let (transport, registry) = registry();
        let link = backend_link(PortId::PRIMARY_MI2S_RX, &["wcd938x"]).unwrap();
        transport.fail_next_allocations(1);

        let err = registry.acquire(&link, &HwParams::default()).unwrap_err();
        assert!(matches!(err, CardError::TransportAllocationFailed { .. }));
        assert!(registry.handle(link.id()).is_none());

        registry.acquire(&link, &HwParams::default()).unwrap();
        assert!(registry.handle(link.id()).is_some());
    }

    #[test]
    fn prepare_flag_toggles() {
        let (transport, registry) = registry();
        let link = backend_link(PortId::RX_CODEC_DMA_RX_0, &["wcd938x"]).unwrap();
        registry.acquire(&link, &HwParams::default()).unwrap();

        assert!(registry.mark_prepared(&link).unwrap());
        assert!(!registry.mark_prepared(&link).unwrap());
        assert!(registry.is_prepared(link.id()));
        assert_eq!(transport.prepares(), 1);

        assert!(registry.clear_prepared(&link));
        assert!(!registry.clear_prepared(&link));
        assert!(!registry.is_prepared(link.id()));
        assert_eq!(transport.deprepares(), 1);
    }

    #[test]
    fn prepare_without_stream_fails() {
        let (_transport, registry) = registry();
        let link = backend_link(PortId::RX_CODEC_DMA_RX_0, &["wcd938x"]).unwrap();
        assert!(matches!(
            registry.mark_prepared(&link),
            Err(CardError::TransportFailed { operation: "prepare", .. })
        ));
    }
}
