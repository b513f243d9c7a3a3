//! Pulse reasons and the downstream pulse callback.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// Why the ambient display was asked to pulse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum PulseReason {
    Intent,
    Notification,
    SensorSigMotion,
    SensorPickup,
    SensorDoubleTap,
}

impl PulseReason {
    /// Stable integer code used in doze logs.
    pub fn code(self) -> i32 {
        match self {
            PulseReason::Intent => 0,
            PulseReason::Notification => 1,
            PulseReason::SensorSigMotion => 2,
            PulseReason::SensorPickup => 3,
            PulseReason::SensorDoubleTap => 4,
        }
    }
}

/// Receives every trigger fire.
///
/// Called while the coordinator holds the wake lock.
pub trait PulseCallback: Send + Sync {
    fn on_sensor_pulse(&self, reason: PulseReason, sensor_performed_prox_check: bool) -> Result<()>;
}
