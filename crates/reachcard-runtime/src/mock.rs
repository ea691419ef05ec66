//! In-memory collaborators for driving a card without hardware.
//!
//! Each mock records what the card asked of it and can be told to fail,
//! so lifecycle behaviour can be checked end to end. The CLI `simulate`
//! command runs on top of these as well.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use reachcard_core::{
    DaiLookup, DaiRef, EndpointRecord, Link, LookupFailure, PortId, TopologyError, TopologyResolver,
};

use crate::error::{ControlError, JackError, TransportError};
use crate::jack::{JackBackend, JackHandle, JackMask, JackPin, KeyCode};
use crate::transport::{BusTransport, HwParams, StreamHandle};
use crate::volume::MixerControls;

/// Bus transport that hands out numbered streams.
#[derive(Debug, Default)]
pub struct MockTransport {
    next_id: AtomicU64,
    opens: AtomicUsize,
    allocations: AtomicUsize,
    releases: AtomicUsize,
    prepares: AtomicUsize,
    deprepares: AtomicUsize,
    failing_allocations: AtomicUsize,
    last_params: Mutex<Option<HwParams>>,
}

impl MockTransport {
    /// A transport where every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` allocations fail with [`TransportError::Exhausted`].
    pub fn fail_next_allocations(&self, count: usize) {
        self.failing_allocations.store(count, Ordering::SeqCst);
    }

    /// Sessions opened.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Successful allocations.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Streams handed back.
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Streams prepared.
    pub fn prepares(&self) -> usize {
        self.prepares.load(Ordering::SeqCst)
    }

    /// Streams deprepared.
    pub fn deprepares(&self) -> usize {
        self.deprepares.load(Ordering::SeqCst)
    }

    /// Streams currently allocated and not yet released.
    pub fn outstanding(&self) -> usize {
        self.allocations().saturating_sub(self.releases())
    }

    /// Parameters of the most recent allocation request.
    pub fn last_params(&self) -> Option<HwParams> {
        *self.last_params.lock()
    }
}

impl BusTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    fn open_stream(&self, _link: &Link) -> Result<(), TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn allocate_stream(
        &self,
        link: &Link,
        params: &HwParams,
    ) -> Result<StreamHandle, TransportError> {
        *self.last_params.lock() = Some(*params);
        let failed = self
            .failing_allocations
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(TransportError::Exhausted(format!(
                "no free lane for {}",
                link.name()
            )));
        }
        self.allocations.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(StreamHandle::new(id, link.id()))
    }

    fn prepare_stream(&self, _handle: &StreamHandle) -> Result<(), TransportError> {
        self.prepares.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn deprepare_stream(&self, _handle: &StreamHandle) -> Result<(), TransportError> {
        self.deprepares.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release_stream(&self, _handle: StreamHandle) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct JackLog {
    next_id: u64,
    created: Vec<JackHandle>,
    bound: Vec<(u64, JackMask, KeyCode)>,
    propagations: HashMap<String, usize>,
    unsupported: HashSet<String>,
    failing: HashSet<String>,
    fail_creation: bool,
    failing_bindings: usize,
}

/// Jack subsystem that records every jack, key binding and propagation.
#[derive(Debug, Default)]
pub struct MockJackBackend {
    log: Mutex<JackLog>,
}

impl MockJackBackend {
    /// A backend where every component accepts jacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `component` answer [`JackError::NotSupported`].
    pub fn mark_unsupported(&self, component: &str) {
        self.log.lock().unsupported.insert(component.to_string());
    }

    /// Make `component` fail with a fatal error.
    pub fn mark_failing(&self, component: &str) {
        self.log.lock().failing.insert(component.to_string());
    }

    /// Make jack creation fail until switched back.
    pub fn fail_creation(&self, fail: bool) {
        self.log.lock().fail_creation = fail;
    }

    /// Make the next `count` button bindings fail.
    pub fn fail_next_bindings(&self, count: usize) {
        self.log.lock().failing_bindings = count;
    }

    /// How many jacks named `name` were created.
    pub fn created(&self, name: &str) -> usize {
        self.log
            .lock()
            .created
            .iter()
            .filter(|j| j.name() == name)
            .count()
    }

    /// Total jacks created.
    pub fn created_total(&self) -> usize {
        self.log.lock().created.len()
    }

    /// Every jack created, in order.
    pub fn jacks(&self) -> Vec<JackHandle> {
        self.log.lock().created.clone()
    }

    /// Key bindings as `(jack id, button, key)`.
    pub fn bound_keys(&self) -> Vec<(u64, JackMask, KeyCode)> {
        self.log.lock().bound.clone()
    }

    /// How many jacks `component` accepted.
    pub fn propagations(&self, component: &str) -> usize {
        self.log
            .lock()
            .propagations
            .get(component)
            .copied()
            .unwrap_or(0)
    }
}

impl JackBackend for MockJackBackend {
    fn create_jack(
        &self,
        name: &str,
        mask: JackMask,
        _pins: &[JackPin],
    ) -> Result<JackHandle, JackError> {
        let mut log = self.log.lock();
        if log.fail_creation {
            return Err(JackError::Backend("out of memory".to_string()));
        }
        let jack = JackHandle::new(log.next_id, name, mask);
        log.next_id += 1;
        log.created.push(jack.clone());
        Ok(jack)
    }

    fn bind_button_key(
        &self,
        jack: &JackHandle,
        button: JackMask,
        key: KeyCode,
    ) -> Result<(), JackError> {
        let mut log = self.log.lock();
        if log.failing_bindings > 0 {
            log.failing_bindings -= 1;
            return Err(JackError::Backend("input device busy".to_string()));
        }
        log.bound.push((jack.id(), button, key));
        Ok(())
    }

    fn set_component_jack(&self, component: &str, _jack: &JackHandle) -> Result<(), JackError> {
        let mut log = self.log.lock();
        if log.unsupported.contains(component) {
            return Err(JackError::NotSupported {
                component: component.to_string(),
            });
        }
        if log.failing.contains(component) {
            return Err(JackError::Backend(format!("{component} rejected jack")));
        }
        *log.propagations.entry(component.to_string()).or_default() += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MixerState {
    removed: HashSet<String>,
    limits: BTreeMap<String, u32>,
}

/// Mixer that accepts any control unless it has been removed.
#[derive(Debug, Default)]
pub struct MockMixer {
    state: Mutex<MixerState>,
}

impl MockMixer {
    /// A mixer exposing every control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `control` does not exist.
    pub fn remove_control(&self, control: &str) {
        self.state.lock().removed.insert(control.to_string());
    }

    /// Limit applied to `control`, if any.
    pub fn limit_of(&self, control: &str) -> Option<u32> {
        self.state.lock().limits.get(control).copied()
    }

    /// All applied limits.
    pub fn limits(&self) -> BTreeMap<String, u32> {
        self.state.lock().limits.clone()
    }
}

impl MixerControls for MockMixer {
    fn limit_volume(&self, control: &str, max: u32) -> Result<(), ControlError> {
        let mut state = self.state.lock();
        if state.removed.contains(control) {
            return Err(ControlError::NotFound(control.to_string()));
        }
        state.limits.insert(control.to_string(), max);
        Ok(())
    }
}

/// DAI lookup that knows every node and names DAIs `<node>-dai<n>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProviders;

impl DaiLookup for MockProviders {
    fn dai_name(&self, reference: &DaiRef) -> Result<String, LookupFailure> {
        Ok(format!(
            "{}-dai{}",
            reference.node,
            reference.first_cell().unwrap_or(0)
        ))
    }
}

/// Resolve a codec-bearing backend link on `port` through [`MockProviders`].
///
/// Errors are those of [`TopologyResolver::resolve_one`].
///
/// With no codecs the link comes out as a dummy-codec frontend.
pub fn backend_link(port: PortId, codecs: &[&str]) -> Result<Link, TopologyError> {
    let mut record = EndpointRecord::new(
        format!("port {port}"),
        DaiRef::new("q6apmbedai", [port.get()]),
    );
    for (n, codec) in codecs.iter().enumerate() {
        record = record.with_codec(DaiRef::new(*codec, [n as u32]));
    }
    if !codecs.is_empty() {
        record = record.with_platform("q6apm");
    }
    TopologyResolver::new(MockProviders).resolve_one(0, &record)
}
