//! Speaker volume limits.
//!
//! Until active speaker protection is in place the WSA digital volume is
//! capped at -3 dB and the PA gain at 0 dB. The limits are applied once,
//! when the first speaker backend initialises.

use crate::error::ControlError;

/// A ceiling for one mixer control.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VolumeLimit {
    /// Mixer control name.
    pub control: String,
    /// Highest raw value the control may take.
    pub max: u32,
}

impl VolumeLimit {
    /// Limit `control` to `max`.
    pub fn new(control: impl Into<String>, max: u32) -> Self {
        Self {
            control: control.into(),
            max,
        }
    }
}

/// Volume limits applied to the speaker path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumePolicy {
    limits: Vec<VolumeLimit>,
}

impl Default for VolumePolicy {
    fn default() -> Self {
        Self {
            limits: vec![
                VolumeLimit::new("WSA_RX0 Digital Volume", 81),
                VolumeLimit::new("WSA_RX1 Digital Volume", 81),
                VolumeLimit::new("SpkrLeft PA Volume", 17),
                VolumeLimit::new("SpkrRight PA Volume", 17),
            ],
        }
    }
}

impl VolumePolicy {
    /// A policy with the given limits.
    pub fn new(limits: Vec<VolumeLimit>) -> Self {
        Self { limits }
    }

    /// A policy that limits nothing.
    pub fn none() -> Self {
        Self { limits: Vec::new() }
    }

    /// The limits, in application order.
    pub fn limits(&self) -> &[VolumeLimit] {
        &self.limits
    }

    /// Apply every limit. A rejected limit is logged and skipped.
    ///
    /// Returns the number of limits the mixer accepted.
    pub fn apply(&self, mixer: &dyn MixerControls) -> usize {
        let mut applied = 0;
        for limit in &self.limits {
            match mixer.limit_volume(&limit.control, limit.max) {
                Ok(()) => applied += 1,
                Err(err) => {
                    tracing::warn!(control = %limit.control, max = limit.max, error = %err, "volume limit not applied");
                }
            }
        }
        tracing::info!(applied, total = self.limits.len(), "speaker volume limits applied");
        applied
    }
}

/// Mixer control access needed by the card.
pub trait MixerControls: Send + Sync {
    /// Cap the maximum value of a volume control.
    fn limit_volume(&self, control: &str, max: u32) -> Result<(), ControlError>;
}
