//! The sound card object.
//!
//! A [`SoundCard`] owns the resolved link table, the state shared between
//! links (bus-stream registry, accessory jacks, volume policy) and one
//! [`LinkSession`] per link. It is built once
//! at bring-up and handed to the hosting framework through
//! [`SoundCard::registration`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Once;
use reachcard_core::{DaiLookup, DisplaySink, EndpointRecord, LinkTable, PortId, TopologyResolver};

use crate::error::CardError;
use crate::jack::{AccessoryJackManager, JackBackend};
use crate::registry::StreamRuntimeRegistry;
use crate::session::{InitAction, LinkSession};
use crate::transport::BusTransport;
use crate::volume::{MixerControls, VolumePolicy};

/// DAPM widget template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Headphone output.
    Headphone,
    /// Microphone input.
    Microphone,
    /// Speaker output.
    Speaker,
    /// Line input or output.
    Line,
}

impl WidgetKind {
    /// Parse a template name as written in a card description.
    pub fn from_template(template: &str) -> Option<Self> {
        match template {
            "Headphone" => Some(Self::Headphone),
            "Microphone" => Some(Self::Microphone),
            "Speaker" => Some(Self::Speaker),
            "Line" => Some(Self::Line),
            _ => None,
        }
    }

    /// Template name.
    pub fn template(self) -> &'static str {
        match self {
            Self::Headphone => "Headphone",
            Self::Microphone => "Microphone",
            Self::Speaker => "Speaker",
            Self::Line => "Line",
        }
    }
}

/// A board-level DAPM widget.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Widget {
    /// Template.
    pub kind: WidgetKind,
    /// Widget name.
    pub name: String,
}

impl Widget {
    /// Create a widget.
    pub fn new(kind: WidgetKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// A routing pair: audio flows from `source` into `sink`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    /// Destination widget.
    pub sink: String,
    /// Source widget.
    pub source: String,
}

impl Route {
    /// Create a route.
    pub fn new(sink: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            sink: sink.into(),
            source: source.into(),
        }
    }
}

/// Widgets registered when a description declares none.
pub fn default_widgets() -> Vec<Widget> {
    let mut widgets = vec![
        Widget::new(WidgetKind::Headphone, "Headphone Jack"),
        Widget::new(WidgetKind::Microphone, "Mic Jack"),
    ];
    widgets.extend(DisplaySink::all().map(|s| Widget::new(WidgetKind::Speaker, s.jack_name())));
    widgets
}

/// Card-level data passed through to the hosting framework.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardMetadata {
    /// Card (model) name.
    pub name: String,
    /// Driver name derived from the compatible string.
    pub driver_name: String,
    /// Declared widgets; empty means the defaults.
    pub widgets: Vec<Widget>,
    /// Routing pairs.
    pub routes: Vec<Route>,
    /// Widgets exposed as pin switches.
    pub pin_switches: Vec<String>,
    /// Auxiliary device nodes.
    pub aux_devs: Vec<String>,
}

impl CardMetadata {
    /// The widgets to register: the declared ones, or [`default_widgets`].
    pub fn effective_widgets(&self) -> Vec<Widget> {
        if self.widgets.is_empty() {
            default_widgets()
        } else {
            self.widgets.clone()
        }
    }
}

/// Everything the hosting framework needs to register the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRegistration {
    /// Card name.
    pub name: String,
    /// Driver name.
    pub driver_name: String,
    /// Widgets, defaults applied.
    pub widgets: Vec<Widget>,
    /// Routing pairs.
    pub routes: Vec<Route>,
    /// Pin switches.
    pub pin_switches: Vec<String>,
    /// Auxiliary devices.
    pub aux_devs: Vec<String>,
    /// Canonical link names, in table order.
    pub links: Vec<String>,
}

/// External collaborators the card drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Bus transport.
    pub transport: Arc<dyn BusTransport>,
    /// Jack subsystem.
    pub jacks: Arc<dyn JackBackend>,
    /// Mixer controls.
    pub mixer: Arc<dyn MixerControls>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("transport", &self.transport.name())
            .finish_non_exhaustive()
    }
}

/// State shared by every link of one card.
pub(crate) struct CardShared {
    pub(crate) registry: StreamRuntimeRegistry,
    pub(crate) jacks: AccessoryJackManager,
    pub(crate) mixer: Arc<dyn MixerControls>,
    pub(crate) volume: VolumePolicy,
    pub(crate) volume_once: Once,
}

impl CardShared {
    pub(crate) fn new(
        transport: Arc<dyn BusTransport>,
        jacks: Arc<dyn JackBackend>,
        mixer: Arc<dyn MixerControls>,
        volume: VolumePolicy,
    ) -> Self {
        Self {
            registry: StreamRuntimeRegistry::new(transport),
            jacks: AccessoryJackManager::new(jacks),
            mixer,
            volume,
            volume_once: Once::new(),
        }
    }
}

/// Outcome of `init` for one link.
#[derive(Debug)]
pub struct LinkInit {
    /// Port id.
    pub id: PortId,
    /// Canonical link name.
    pub link: String,
    /// What init did, or why it failed.
    pub outcome: Result<InitAction, CardError>,
}

/// A resolved, runnable sound card.
pub struct SoundCard {
    metadata: CardMetadata,
    links: LinkTable,
    shared: Arc<CardShared>,
    sessions: BTreeMap<PortId, LinkSession>,
}

impl SoundCard {
    /// Assemble a card from an already resolved link table.
    pub fn new(
        metadata: CardMetadata,
        links: LinkTable,
        collaborators: Collaborators,
        policy: VolumePolicy,
    ) -> Self {
        let shared = Arc::new(CardShared::new(
            collaborators.transport,
            collaborators.jacks,
            collaborators.mixer,
            policy,
        ));
        let sessions = links
            .iter()
            .filter(|link| link.has_ops())
            .map(|link| (link.id(), LinkSession::new(link.clone(), shared.clone())))
            .collect();
        Self {
            metadata,
            links,
            shared,
            sessions,
        }
    }

    /// Resolve `records` and assemble the card.
    ///
    /// Any topology error aborts the bring-up; no partial card is built.
    pub fn bring_up<L: DaiLookup>(
        metadata: CardMetadata,
        records: &[EndpointRecord],
        lookup: L,
        collaborators: Collaborators,
        policy: VolumePolicy,
    ) -> Result<Self, CardError> {
        let links = TopologyResolver::new(lookup)
            .resolve(records)
            .inspect_err(|err| {
                tracing::error!(card = %metadata.name, error = %err, "card bring-up failed");
            })?;
        let card = Self::new(metadata, links, collaborators, policy);
        tracing::info!(
            card = %card.metadata.name,
            driver = %card.metadata.driver_name,
            links = card.links.len(),
            backends = card.sessions.len(),
            "card brought up"
        );
        Ok(card)
    }

    /// Run `init` on every link with session callbacks, in port order.
    ///
    /// A failing link does not stop the others; its error is reported in
    /// its [`LinkInit`].
    pub fn init_links(&self) -> Vec<LinkInit> {
        self.sessions
            .values()
            .map(|session| {
                let outcome = session.init();
                if let Err(err) = &outcome {
                    tracing::error!(link = session.link().name(), error = %err, "link init failed");
                }
                LinkInit {
                    id: session.link().id(),
                    link: session.link().name().to_string(),
                    outcome,
                }
            })
            .collect()
    }

    /// The session of a link with session callbacks.
    pub fn session(&self, id: PortId) -> Result<&LinkSession, CardError> {
        self.sessions.get(&id).ok_or(CardError::UnknownLink(id))
    }

    /// The session of a link, looked up by canonical name.
    pub fn session_by_name(&self, name: &str) -> Option<&LinkSession> {
        let link = self.links.by_name(name)?;
        self.sessions.get(&link.id())
    }

    /// All sessions, in port order.
    pub fn sessions(&self) -> impl Iterator<Item = &LinkSession> {
        self.sessions.values()
    }

    /// The resolved link table.
    pub fn links(&self) -> &LinkTable {
        &self.links
    }

    /// Card-level data.
    pub fn metadata(&self) -> &CardMetadata {
        &self.metadata
    }

    /// Bus-stream bookkeeping.
    pub fn registry(&self) -> &StreamRuntimeRegistry {
        &self.shared.registry
    }

    /// Accessory jacks.
    pub fn jacks(&self) -> &AccessoryJackManager {
        &self.shared.jacks
    }

    /// Data for the hosting framework's registration call.
    pub fn registration(&self) -> CardRegistration {
        let registration = CardRegistration {
            name: self.metadata.name.clone(),
            driver_name: self.metadata.driver_name.clone(),
            widgets: self.metadata.effective_widgets(),
            routes: self.metadata.routes.clone(),
            pin_switches: self.metadata.pin_switches.clone(),
            aux_devs: self.metadata.aux_devs.clone(),
            links: self.links.names().into_iter().map(str::to_string).collect(),
        };
        tracing::info!(
            card = %registration.name,
            widgets = registration.widgets.len(),
            routes = registration.routes.len(),
            links = registration.links.len(),
            "card registered"
        );
        registration
    }
}

impl fmt::Debug for SoundCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundCard")
            .field("name", &self.metadata.name)
            .field("links", &self.links.len())
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}
