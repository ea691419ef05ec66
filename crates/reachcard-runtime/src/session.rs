//! Per-link session lifecycle.
//!
//! Each link owns a [`LinkSession`] that the hosting framework drives
//! through the PCM callbacks:
//!
//! ```text
//!            startup        hw_params        prepare        trigger(Start)
//!   Idle ───────────▶ Starting ─────▶ Configured ─────▶ Prepared ─────▶ Running
//!    ▲                                    ▲  ▲              │ ▲              │
//!    │                                    │  └── hw_free ───┘ └─trigger(Stop)┘
//!    └──────────────── shutdown (from any state) ─────────────────────────────┘
//! ```
//!
//! The framework never calls into one link's session concurrently, but
//! different links run in parallel; all state shared between links lives in
//! the card's registry and jack manager.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use reachcard_core::{Link, PortClass};

use crate::card::CardShared;
use crate::error::CardError;
use crate::transport::HwParams;

/// Where a link is in its session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// No session.
    #[default]
    Idle,
    /// Started up, parameters not yet negotiated.
    Starting,
    /// Parameters fixed and bus stream held.
    Configured,
    /// Bus stream prepared.
    Prepared,
    /// Streaming.
    Running,
}

/// Start or stop a prepared stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerCommand {
    /// Prepared to running.
    Start,
    /// Running back to prepared.
    Stop,
}

/// What `init` did for a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitAction {
    /// Speaker volume limits were applied (or had been already). The shared
    /// headset jack is set up as well but not handed to the speaker codecs.
    VolumeLimited,
    /// A display jack was (re)created.
    DisplayJack(String),
    /// The shared headset jack was set up or reused.
    HeadsetJack {
        /// Jack name.
        jack: String,
        /// Whether the jack was handed to the link's codec components.
        attached: bool,
    },
}

/// Lifecycle coordinator for one link.
pub struct LinkSession {
    link: Link,
    state: Mutex<SessionState>,
    shared: Arc<CardShared>,
}

impl LinkSession {
    pub(crate) fn new(link: Link, shared: Arc<CardShared>) -> Self {
        Self {
            link,
            state: Mutex::new(SessionState::Idle),
            shared,
        }
    }

    /// The link this session drives.
    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    fn refuse(&self, state: SessionState, operation: &'static str) -> CardError {
        tracing::error!(link = self.link.name(), ?state, operation, "invalid session transition");
        CardError::InvalidTransition {
            link: self.link.name().to_string(),
            state,
            operation,
        }
    }

    /// One-time setup when the link is first brought up.
    ///
    /// Display sinks get their own jack. Every other link makes sure the
    /// shared headset jack exists; only headset capture links hand it to
    /// their codec components.
    pub fn init(&self) -> Result<InitAction, CardError> {
        let class = self.link.class();
        if let PortClass::DisplaySink(sink) = class {
            let jack = self
                .shared
                .jacks
                .ensure_display_jack(sink.index(), &self.link.codec_components())?;
            return Ok(InitAction::DisplayJack(jack.name().to_string()));
        }

        if class == PortClass::Speaker {
            let shared = &self.shared;
            shared.volume_once.call_once(|| {
                shared.volume.apply(shared.mixer.as_ref());
            });
        }

        let components = match class {
            PortClass::HeadsetCapture => self.link.codec_components(),
            _ => Vec::new(),
        };
        let jack = self.shared.jacks.ensure_headset_jack(&components)?;
        if class == PortClass::Speaker {
            return Ok(InitAction::VolumeLimited);
        }
        Ok(InitAction::HeadsetJack {
            jack: jack.name().to_string(),
            attached: !components.is_empty(),
        })
    }

    /// Open a session: `Idle` to `Starting`.
    pub fn startup(&self) -> Result<(), CardError> {
        let mut state = self.state.lock();
        if *state != SessionState::Idle {
            return Err(self.refuse(*state, "startup"));
        }
        self.shared
            .registry
            .transport()
            .open_stream(&self.link)
            .map_err(|source| CardError::TransportFailed {
                link: self.link.name().to_string(),
                operation: "startup",
                source,
            })?;
        *state = SessionState::Starting;
        tracing::debug!(link = self.link.name(), "session started");
        Ok(())
    }

    /// Fix up the parameters and reserve the bus stream.
    ///
    /// Returns the fixed-up parameters. On failure the session stays where
    /// it was so the caller may retry.
    pub fn hw_params(&self, params: HwParams) -> Result<HwParams, CardError> {
        let mut state = self.state.lock();
        match *state {
            SessionState::Starting | SessionState::Configured | SessionState::Prepared => {}
            other => return Err(self.refuse(other, "hw_params")),
        }

        let fixed = params.fixup(self.link.id());
        self.shared.registry.acquire(&self.link, &fixed)?;
        *state = SessionState::Configured;
        tracing::debug!(
            link = self.link.name(),
            rate = fixed.rate.min,
            channels = fixed.channels.min,
            "session configured"
        );
        Ok(fixed)
    }

    /// Prepare the bus stream. Repeating it while prepared is a no-op.
    pub fn prepare(&self) -> Result<(), CardError> {
        let mut state = self.state.lock();
        match *state {
            SessionState::Prepared => Ok(()),
            SessionState::Configured => {
                self.shared.registry.mark_prepared(&self.link)?;
                *state = SessionState::Prepared;
                Ok(())
            }
            other => Err(self.refuse(other, "prepare")),
        }
    }

    /// Start or stop a prepared stream.
    pub fn trigger(&self, command: TriggerCommand) -> Result<(), CardError> {
        let mut state = self.state.lock();
        match (command, *state) {
            (TriggerCommand::Start, SessionState::Prepared) => {
                *state = SessionState::Running;
                Ok(())
            }
            (TriggerCommand::Stop, SessionState::Running) => {
                *state = SessionState::Prepared;
                Ok(())
            }
            (TriggerCommand::Start, other) => Err(self.refuse(other, "trigger start")),
            (TriggerCommand::Stop, other) => Err(self.refuse(other, "trigger stop")),
        }
    }

    /// Undo `prepare`, keeping the bus stream. Tolerates an unprepared stream.
    pub fn hw_free(&self) -> Result<(), CardError> {
        let mut state = self.state.lock();
        self.shared.registry.clear_prepared(&self.link);
        if matches!(
            *state,
            SessionState::Prepared | SessionState::Running | SessionState::Configured
        ) {
            *state = SessionState::Configured;
        }
        Ok(())
    }

    /// Close the session from any state and release the bus stream.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        let released = self.shared.registry.release(self.link.id());
        *state = SessionState::Idle;
        tracing::debug!(link = self.link.name(), released, "session shut down");
    }
}

impl fmt::Debug for LinkSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkSession")
            .field("link", &self.link.name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
