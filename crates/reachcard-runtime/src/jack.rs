//! Accessory jacks.
//!
//! Two kinds of jack are surfaced to user space:
//!
//! - one **headset jack** shared by the whole card, created the first time
//!   any non-display link initialises, with four of its button slots mapped
//!   to media keys, and handed to the codecs of TX macro capture links;
//! - one **display jack** per display port sink, recreated whenever that
//!   sink's link initialises.
//!
//! A jack is handed to each codec component it is meant for. Components that cannot report jack events answer
//! [`JackError::NotSupported`], which is skipped.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use parking_lot::Mutex;
use reachcard_core::DisplaySink;

use crate::error::{CardError, JackError};

bitflags! {
    /// What a jack can report.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct JackMask: u32 {
        /// Headphones plugged.
        const HEADPHONE = 0x0001;
        /// Microphone plugged.
        const MICROPHONE = 0x0002;
        /// Line out plugged.
        const LINEOUT = 0x0004;
        /// Mechanical switch.
        const MECHANICAL = 0x0008;
        /// Video out plugged.
        const VIDEOOUT = 0x0010;
        /// Line in plugged.
        const LINEIN = 0x0020;
        /// Button slot 5.
        const BTN_5 = 0x0200;
        /// Button slot 4.
        const BTN_4 = 0x0400;
        /// Button slot 3.
        const BTN_3 = 0x0800;
        /// Button slot 2.
        const BTN_2 = 0x1000;
        /// Button slot 1.
        const BTN_1 = 0x2000;
        /// Button slot 0.
        const BTN_0 = 0x4000;

        /// Headset: headphone and microphone.
        const HEADSET = Self::HEADPHONE.bits() | Self::MICROPHONE.bits();
        /// Audio-video out, as on a display port.
        const AVOUT = Self::LINEOUT.bits() | Self::VIDEOOUT.bits();
    }
}

impl JackMask {
    /// Capabilities of the shared headset jack.
    pub const HEADSET_JACK: JackMask = JackMask::HEADSET
        .union(JackMask::LINEOUT)
        .union(JackMask::MECHANICAL)
        .union(JackMask::BTN_0)
        .union(JackMask::BTN_1)
        .union(JackMask::BTN_2)
        .union(JackMask::BTN_3)
        .union(JackMask::BTN_4);
}

/// Input key code delivered for a jack button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u16);

impl KeyCode {
    /// Volume down.
    pub const VOLUMEDOWN: KeyCode = KeyCode(114);
    /// Volume up.
    pub const VOLUMEUP: KeyCode = KeyCode(115);
    /// Media play/pause.
    pub const MEDIA: KeyCode = KeyCode(226);
    /// Voice assistant.
    pub const VOICECOMMAND: KeyCode = KeyCode(0x246);
}

/// Headset button slots and their keys. `BTN_4` is reserved but unbound.
pub const HEADSET_BUTTONS: [(JackMask, KeyCode); 4] = [
    (JackMask::BTN_0, KeyCode::MEDIA),
    (JackMask::BTN_1, KeyCode::VOICECOMMAND),
    (JackMask::BTN_2, KeyCode::VOLUMEUP),
    (JackMask::BTN_3, KeyCode::VOLUMEDOWN),
];

/// Name of the shared headset jack.
pub const HEADSET_JACK_NAME: &str = "Headset Jack";

/// A DAPM pin a jack drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JackPin {
    /// Widget name.
    pub pin: &'static str,
    /// Jack bits that switch the pin.
    pub mask: JackMask,
}

/// Pins of the shared headset jack.
pub const HEADSET_PINS: [JackPin; 2] = [
    JackPin {
        pin: "Mic Jack",
        mask: JackMask::MICROPHONE,
    },
    JackPin {
        pin: "Headphone Jack",
        mask: JackMask::HEADPHONE,
    },
];

/// A jack created by the jack subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JackHandle {
    id: u64,
    name: String,
    mask: JackMask,
}

impl JackHandle {
    /// Describe a jack the subsystem just created.
    pub fn new(id: u64, name: impl Into<String>, mask: JackMask) -> Self {
        Self {
            id,
            name: name.into(),
            mask,
        }
    }

    /// Subsystem-assigned identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Jack name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capability mask.
    pub fn mask(&self) -> JackMask {
        self.mask
    }
}

/// The jack subsystem as seen by the card.
pub trait JackBackend: Send + Sync {
    /// Create a jack with the given capabilities and pins.
    fn create_jack(
        &self,
        name: &str,
        mask: JackMask,
        pins: &[JackPin],
    ) -> Result<JackHandle, JackError>;

    /// Map a button slot of `jack` to an input key.
    fn bind_button_key(
        &self,
        jack: &JackHandle,
        button: JackMask,
        key: KeyCode,
    ) -> Result<(), JackError>;

    /// Hand `jack` to a codec component so it can report events on it.
    fn set_component_jack(&self, component: &str, jack: &JackHandle) -> Result<(), JackError>;
}

/// Owner of the card's headset and display jacks.
pub struct AccessoryJackManager {
    backend: Arc<dyn JackBackend>,
    headset: Mutex<Option<JackHandle>>,
    display: Mutex<[Option<JackHandle>; DisplaySink::COUNT]>,
}

impl AccessoryJackManager {
    /// Create a manager with no jacks yet.
    pub fn new(backend: Arc<dyn JackBackend>) -> Self {
        Self {
            backend,
            headset: Mutex::new(None),
            display: Mutex::new(Default::default()),
        }
    }

    /// Create the display jack for `sink_index` and hand it to `components`.
    ///
    /// The jack is created anew on every call; each sink is configured
    /// independently of the others.
    pub fn ensure_display_jack(
        &self,
        sink_index: usize,
        components: &[&str],
    ) -> Result<JackHandle, CardError> {
        let sink = DisplaySink::new(sink_index)?;
        let name = sink.jack_name();

        let jack = {
            let mut display = self.display.lock();
            let jack = self
                .backend
                .create_jack(&name, JackMask::AVOUT, &[])
                .map_err(|source| {
                    tracing::error!(jack = %name, error = %source, "unable to add display jack");
                    CardError::JackCreationFailed {
                        jack: name.clone(),
                        source,
                    }
                })?;
            display[sink.index()] = Some(jack.clone());
            jack
        };
        tracing::info!(jack = %name, sink = sink.index(), "display jack created");

        self.propagate(&jack, components)?;
        Ok(jack)
    }

    /// Return the shared headset jack, creating it on first use, and hand it
    /// to `components`.
    ///
    /// Concurrent first callers serialise on the jack lock; exactly one of
    /// them creates the jack and binds its buttons. A button that cannot be
    /// bound is logged and left unmapped; the jack is kept either way.
    pub fn ensure_headset_jack(&self, components: &[&str]) -> Result<JackHandle, CardError> {
        let jack = {
            let mut headset = self.headset.lock();
            match headset.as_ref() {
                Some(jack) => jack.clone(),
                None => {
                    let jack = self.create_headset_jack()?;
                    *headset = Some(jack.clone());
                    self.bind_headset_buttons(&jack);
                    jack
                }
            }
        };

        self.propagate(&jack, components)?;
        Ok(jack)
    }

    fn create_headset_jack(&self) -> Result<JackHandle, CardError> {
        let jack = self
            .backend
            .create_jack(HEADSET_JACK_NAME, JackMask::HEADSET_JACK, &HEADSET_PINS)
            .map_err(|source| {
                tracing::error!(error = %source, "unable to add headset jack");
                CardError::JackCreationFailed {
                    jack: HEADSET_JACK_NAME.to_string(),
                    source,
                }
            })?;
        tracing::info!(jack = jack.name(), id = jack.id(), "headset jack created");
        Ok(jack)
    }

    fn bind_headset_buttons(&self, jack: &JackHandle) {
        for (button, key) in HEADSET_BUTTONS {
            if let Err(error) = self.backend.bind_button_key(jack, button, key) {
                tracing::warn!(
                    jack = jack.name(),
                    ?button,
                    key = key.0,
                    %error,
                    "unable to map headset button"
                );
            }
        }
    }

    fn propagate(&self, jack: &JackHandle, components: &[&str]) -> Result<(), CardError> {
        for &component in components {
            match self.backend.set_component_jack(component, jack) {
                Ok(()) => {}
                Err(JackError::NotSupported { .. }) => {
                    tracing::warn!(component, jack = jack.name(), "component does not support jacks");
                }
                Err(source) => {
                    tracing::warn!(component, jack = jack.name(), error = %source, "failed to set jack");
                    return Err(CardError::JackPropagationFailed {
                        jack: jack.name().to_string(),
                        component: component.to_string(),
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    /// The headset jack, if it has been created.
    pub fn headset_jack(&self) -> Option<JackHandle> {
        self.headset.lock().clone()
    }

    /// The most recent jack of a display sink, if any.
    pub fn display_jack(&self, sink: DisplaySink) -> Option<JackHandle> {
        self.display.lock()[sink.index()].clone()
    }
}

impl fmt::Debug for AccessoryJackManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessoryJackManager")
            .field("headset", &self.headset.lock().as_ref().map(JackHandle::id))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockJackBackend;
    use reachcard_core::TopologyError;

    fn manager() -> (Arc<MockJackBackend>, AccessoryJackManager) {
        let backend = Arc::new(MockJackBackend::new());
        let manager = AccessoryJackManager::new(backend.clone());
        (backend, manager)
    }

    #[test]
    fn headset_mask_reserves_five_buttons() {
        let mask = JackMask::HEADSET_JACK;
        assert!(mask.contains(JackMask::HEADSET | JackMask::LINEOUT | JackMask::MECHANICAL));
        assert!(mask.contains(JackMask::BTN_4));
        assert!(!mask.contains(JackMask::BTN_5));
        assert!(HEADSET_BUTTONS.iter().all(|(b, _)| *b != JackMask::BTN_4));
    }

    #[test]
    fn headset_created_once() {
        let (backend, manager) = manager();
        for _ in 0..5 {
            manager.ensure_headset_jack(&["wcd938x"]).unwrap();
        }
        assert_eq!(backend.created(HEADSET_JACK_NAME), 1);
        assert_eq!(backend.bound_keys().len(), 4);
        assert_eq!(backend.propagations("wcd938x"), 5);
        assert!(manager.headset_jack().is_some());
    }

    #[test]
    fn headset_keys() {
        let (backend, manager) = manager();
        manager.ensure_headset_jack(&[]).unwrap();
        let keys: Vec<_> = backend.bound_keys().into_iter().map(|(_, b, k)| (b, k)).collect();
        assert_eq!(keys, HEADSET_BUTTONS.to_vec());
    }

    #[test]
    fn display_jack_recreated() {
        let (backend, manager) = manager();
        let first = manager.ensure_display_jack(3, &["dp"]).unwrap();
        let second = manager.ensure_display_jack(3, &["dp"]).unwrap();
        assert_eq!(backend.created("DP3 Jack"), 2);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.mask(), JackMask::AVOUT);
        assert_eq!(
            manager.display_jack(DisplaySink::new(3).unwrap()),
            Some(second)
        );
        assert!(manager.display_jack(DisplaySink::new(2).unwrap()).is_none());
    }

    #[test]
    fn display_index_bounds_checked() {
        let (backend, manager) = manager();
        let err = manager.ensure_display_jack(8, &["dp"]).unwrap_err();
        assert!(matches!(
            err,
            CardError::Topology(TopologyError::SinkOutOfRange { index: 8, .. })
        ));
        assert_eq!(backend.created("DP8 Jack"), 0);
    }

    #[test]
    fn unsupported_component_skipped() {
        let (backend, manager) = manager();
        backend.mark_unsupported("swr2");
        manager.ensure_headset_jack(&["swr2", "wcd938x"]).unwrap();
        assert_eq!(backend.propagations("wcd938x"), 1);
        assert_eq!(backend.propagations("swr2"), 0);
    }

    #[test]
    fn failing_component_is_fatal() {
        let (backend, manager) = manager();
        backend.mark_failing("wcd938x");
        let err = manager.ensure_display_jack(0, &["wcd938x", "dp"]).unwrap_err();
        assert!(matches!(err, CardError::JackPropagationFailed { ref component, .. } if component == "wcd938x"));
        assert_eq!(backend.propagations("dp"), 0);
    }

    #[test]
    fn failed_button_binding_keeps_the_jack() {
        let (backend, manager) = manager();
        backend.fail_next_bindings(1);
        let first = manager.ensure_headset_jack(&["wcd938x"]).unwrap();
        let second = manager.ensure_headset_jack(&["wcd938x"]).unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.created(HEADSET_JACK_NAME), 1);
        assert_eq!(backend.bound_keys().len(), 3);
        assert_eq!(backend.propagations("wcd938x"), 2);
    }

    #[test]
    fn creation_failure_leaves_headset_unset() {
        let (backend, manager) = manager();
        backend.fail_creation(true);
        let err = manager.ensure_headset_jack(&["wcd938x"]).unwrap_err();
        assert!(matches!(err, CardError::JackCreationFailed { .. }));
        assert!(manager.headset_jack().is_none());

        backend.fail_creation(false);
        manager.ensure_headset_jack(&["wcd938x"]).unwrap();
        assert_eq!(backend.created(HEADSET_JACK_NAME), 1);
    }
}
