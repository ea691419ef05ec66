//! Property-based tests for registry bookkeeping and session fixup.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use reachcard_core::PortId;
use reachcard_runtime::mock::{MockJackBackend, MockTransport, backend_link};
use reachcard_runtime::{
    AccessoryJackManager, CardError, Direction, HwParams, Interval, StreamRuntimeRegistry,
};

#[derive(Debug, Clone, Copy)]
enum Op {
    Acquire(usize),
    Release(usize),
}

const PORTS: [u32; 4] = [113, 114, 105, 16];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..PORTS.len()).prop_map(Op::Acquire),
        (0..PORTS.len()).prop_map(Op::Release),
    ]
}

proptest! {
    /// The registry agrees with a set model: acquire succeeds exactly when
    /// the id is not held, release never fails.
    #[test]
    fn registry_matches_model(ops in prop::collection::vec(op(), 0..64)) {
        let transport = Arc::new(MockTransport::new());
        let registry = StreamRuntimeRegistry::new(transport.clone());
        let links: Vec<_> = PORTS.iter().map(|&p| backend_link(PortId(p), &["wcd938x"]).unwrap()).collect();
        let mut held = HashSet::new();

        for op in ops {
            match op {
                Op::Acquire(i) => {
                    let result = registry.acquire(&links[i], &HwParams::default());
                    if held.insert(i) {
                        prop_assert!(result.is_ok());
                    } else {
                        let busy = matches!(result, Err(CardError::TransportBusy { .. }));
                        prop_assert!(busy);
                    }
                }
                Op::Release(i) => {
                    prop_assert_eq!(registry.release(links[i].id()), held.remove(&i));
                }
            }
            prop_assert_eq!(registry.active(), held.len());
        }
        prop_assert_eq!(transport.outstanding(), held.len());
    }

    /// Fixup always pins 48 kHz, and mono only on the TX macro ports.
    #[test]
    fn fixup_pins_format(
        port in 0u32..200,
        min_rate in 1u32..400_000,
        channels in 1u32..32,
        capture in any::<bool>(),
    ) {
        let direction = if capture { Direction::Capture } else { Direction::Playback };
        let request = HwParams {
            direction,
            rate: Interval::new(min_rate, min_rate.saturating_mul(2)),
            channels: Interval::fixed(channels),
            sample_bits: 16,
        };
        let id = PortId(port);
        let fixed = request.fixup(id);
        prop_assert_eq!(fixed.rate, Interval::fixed(48_000));
        let expected = if matches!(port, 114 | 116 | 118 | 120) { 1 } else { 2 };
        prop_assert_eq!(fixed.channels, Interval::fixed(expected));
        prop_assert_eq!(fixed.direction, direction);
    }

    /// However many times the headset jack is requested, it is created once
    /// with exactly four key bindings.
    #[test]
    fn headset_jack_created_once(calls in 1usize..20) {
        let backend = Arc::new(MockJackBackend::new());
        let manager = AccessoryJackManager::new(backend.clone());
        for _ in 0..calls {
            manager.ensure_headset_jack(&["wcd938x"]).unwrap();
        }
        prop_assert_eq!(backend.created_total(), 1);
        prop_assert_eq!(backend.bound_keys().len(), 4);
        prop_assert_eq!(backend.propagations("wcd938x"), calls);
    }

    /// Each display jack request creates a new jack.
    #[test]
    fn display_jack_recreated_every_time(sink in 0usize..8, calls in 1usize..10) {
        let backend = Arc::new(MockJackBackend::new());
        let manager = AccessoryJackManager::new(backend.clone());
        for _ in 0..calls {
            manager.ensure_display_jack(sink, &["dp"]).unwrap();
        }
        prop_assert_eq!(backend.created(&format!("DP{sink} Jack")), calls);
    }
}
