//! Sensor registry interface and sensor resolution.
//!
//! The registry is the platform service that knows which sensors exist and
//! accepts one-shot trigger registrations. Triggers never talk to hardware
//! directly; they resolve a [`SensorHandle`] once and then register/cancel
//! against the registry with their [`ListenerId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumString};

/// Coarse sensor category a platform can supply a default sensor for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SensorCategory {
    Proximity,
    SignificantMotion,
    PickUpGesture,
    /// Vendor sensors only addressable through their string type.
    Vendor,
}

impl SensorCategory {
    /// Platform sensor type number.
    pub fn code(self) -> i32 {
        match self {
            SensorCategory::Proximity => 8,
            SensorCategory::SignificantMotion => 17,
            SensorCategory::PickUpGesture => 25,
            SensorCategory::Vendor => 65536,
        }
    }
}

/// Concrete sensor as enumerated by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorHandle {
    pub handle: i32,
    pub name: String,
    pub category: SensorCategory,
    /// Unique type string, e.g. `android.sensor.pick_up_gesture`.
    pub string_type: String,
}

impl fmt::Display for SensorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Sensor name=\"{}\", type={}, handle={}}}",
            self.name, self.string_type, self.handle
        )
    }
}

/// Identifies a trigger listener to the registry.
///
/// The registry hands this id back with every fire so the owner can route
/// the event to the right trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub usize);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Platform sensor service.
///
/// Implementations are treated as thread-safe. Fires are not delivered
/// through this trait: the platform dispatcher posts them onto the owner's
/// queue (see [`crate::dispatch`]).
pub trait SensorRegistry: Send + Sync {
    /// All sensors, in enumeration order.
    fn sensors(&self) -> Vec<SensorHandle>;

    /// Platform default sensor for a category.
    fn default_sensor(&self, category: SensorCategory) -> Option<SensorHandle>;

    /// Arm a one-shot trigger. Returns whether the registry accepted it.
    fn request_trigger(&self, listener: ListenerId, sensor: &SensorHandle) -> bool;

    /// Cancel an armed trigger. Returns whether a registration was removed.
    fn cancel_trigger(&self, listener: ListenerId, sensor: &SensorHandle) -> bool;
}

pub fn resolve_by_category(
    registry: &dyn SensorRegistry,
    category: SensorCategory,
) -> Option<SensorHandle> {
    registry.default_sensor(category)
}

/// First sensor whose string type equals `type_id`. Empty ids never match.
pub fn resolve_by_type_string(registry: &dyn SensorRegistry, type_id: &str) -> Option<SensorHandle> {
    if type_id.is_empty() {
        return None;
    }
    registry
        .sensors()
        .into_iter()
        .find(|sensor| sensor.string_type == type_id)
}
