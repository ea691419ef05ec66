//! Session runtime for reachcard sound cards.
//!
//! This crate provides:
//!
//! - **Card object**: [`SoundCard`] built from a resolved link table, with
//!   pass-through registration data ([`CardRegistration`])
//! - **Session lifecycle**: [`LinkSession`] per link, driven through
//!   `startup`, `hw_params`, `prepare`, `trigger`, `hw_free` and `shutdown`
//! - **Bus streams**: [`StreamRuntimeRegistry`] on top of a [`BusTransport`]
//! - **Accessory jacks**: [`AccessoryJackManager`] on top of a [`JackBackend`]
//! - **Speaker protection**: [`VolumePolicy`] applied through [`MixerControls`]
//!
//! The [`mock`] module has in-memory collaborators for running a card
//! without hardware.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use reachcard_core::{DaiRef, EndpointRecord, PortId};
//! use reachcard_runtime::mock::{MockJackBackend, MockMixer, MockProviders, MockTransport};
//! use reachcard_runtime::{
//!     CardMetadata, Collaborators, Direction, HwParams, SoundCard, TriggerCommand, VolumePolicy,
//! };
//!
//! let records = [EndpointRecord::new("WCD Playback", DaiRef::new("q6apmbedai", [113]))
//!     .with_codec(DaiRef::new("wcd938x", [0]))
//!     .with_platform("q6apm")];
//!
//! let collaborators = Collaborators {
//!     transport: Arc::new(MockTransport::new()),
//!     jacks: Arc::new(MockJackBackend::new()),
//!     mixer: Arc::new(MockMixer::new()),
//! };
//! let card = SoundCard::bring_up(
//!     CardMetadata::default(),
//!     &records,
//!     MockProviders,
//!     collaborators,
//!     VolumePolicy::default(),
//! )?;
//!
//! let session = card.session(PortId::RX_CODEC_DMA_RX_0)?;
//! session.startup()?;
//! let fixed = session.hw_params(HwParams::new(Direction::Playback))?;
//! assert_eq!(fixed.rate.value(), Some(48_000));
//! session.prepare()?;
//! session.trigger(TriggerCommand::Start)?;
//! session.shutdown();
//! # Ok::<(), reachcard_runtime::CardError>(())
//! ```

mod card;
mod error;
mod jack;
pub mod mock;
mod registry;
mod session;
mod transport;
mod volume;

pub use card::{
    CardMetadata, CardRegistration, Collaborators, LinkInit, Route, SoundCard, Widget, WidgetKind,
    default_widgets,
};
pub use error::{CardError, ControlError, JackError, TransportError};
pub use jack::{
    AccessoryJackManager, HEADSET_BUTTONS, HEADSET_JACK_NAME, HEADSET_PINS, JackBackend,
    JackHandle, JackMask, JackPin, KeyCode,
};
pub use registry::StreamRuntimeRegistry;
pub use session::{InitAction, LinkSession, SessionState, TriggerCommand};
pub use transport::{BusTransport, Direction, FIXED_RATE, HwParams, Interval, MONO, STEREO, StreamHandle};
pub use volume::{MixerControls, VolumeLimit, VolumePolicy};
