//! Trigger sensors for ambient display pulses.
//!
//! This module resolves gesture sensors through the platform registry, keeps
//! each one-shot trigger armed while it is wanted, and funnels fires into a
//! single pulse callback.

pub mod coordinator;
pub mod event;
pub mod registry;
pub mod trigger;

pub use coordinator::DozeSensors;
pub use event::TriggerEvent;
pub use registry::{ListenerId, SensorCategory, SensorHandle, SensorRegistry};
pub use trigger::{SensorRequirement, SensorServices, SensorSource, TriggerSensor};
