//! One-shot trigger sensor state machine.
//!
//! A [`TriggerSensor`] decides whether its sensor should be armed with the
//! registry and re-derives that decision whenever any input changes. The
//! registry drops a one-shot registration as soon as it fires, so every fire
//! ends with a re-evaluation that re-arms the sensor if it is still wanted.

use super::event::TriggerEvent;
use super::registry::{
    ListenerId, SensorCategory, SensorHandle, SensorRegistry, resolve_by_category,
    resolve_by_type_string,
};
use crate::error::Result;
use crate::metrics::{MetricsAction, MetricsSink};
use crate::power::{WakeLock, WakeLockGuard};
use crate::pulse::{PulseCallback, PulseReason};
use crate::settings::{SettingsStore, SettingsWatch, UserScope};
use crate::subtype_matcher::SubtypeMatcher;
use log::{debug, warn};
use std::fmt;
use std::sync::Arc;

/// How a requirement finds its sensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorSource {
    /// Platform default sensor for the category.
    Category(SensorCategory),
    /// First enumerated sensor with this exact string type.
    TypeString(String),
}

/// Static description of one gesture trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorRequirement {
    pub source: SensorSource,
    /// Per-user setting that must be on for the trigger to arm.
    pub setting: Option<String>,
    /// Whether device policy supports this gesture at all.
    pub configured: bool,
    pub reason: PulseReason,
}

impl SensorRequirement {
    pub fn by_category(category: SensorCategory, reason: PulseReason) -> Self {
        Self {
            source: SensorSource::Category(category),
            setting: None,
            configured: true,
            reason,
        }
    }

    pub fn by_type_string(type_id: impl Into<String>, reason: PulseReason) -> Self {
        Self {
            source: SensorSource::TypeString(type_id.into()),
            setting: None,
            configured: true,
            reason,
        }
    }

    pub fn gated_by(mut self, setting: impl Into<String>) -> Self {
        self.setting = Some(setting.into());
        self
    }

    pub fn configured(mut self, configured: bool) -> Self {
        self.configured = configured;
        self
    }

    pub fn resolve(&self, registry: &dyn SensorRegistry) -> Option<SensorHandle> {
        match &self.source {
            SensorSource::Category(category) => resolve_by_category(registry, *category),
            SensorSource::TypeString(type_id) => resolve_by_type_string(registry, type_id),
        }
    }
}

/// External collaborators shared by every trigger of one coordinator.
pub struct SensorServices {
    pub registry: Arc<dyn SensorRegistry>,
    pub settings: Arc<dyn SettingsStore>,
    pub wake_lock: Arc<dyn WakeLock>,
    pub metrics: Arc<dyn MetricsSink>,
    pub callback: Arc<dyn PulseCallback>,
    /// Pickup subtypes whose hardware already checked proximity.
    pub pickup_prox_matcher: SubtypeMatcher,
}

pub struct TriggerSensor {
    listener: ListenerId,
    sensor: Option<SensorHandle>,
    setting: Option<String>,
    configured: bool,
    reason: PulseReason,
    requested: bool,
    registered: bool,
    disabled: bool,
    services: Arc<SensorServices>,
}

impl TriggerSensor {
    /// Resolve the requirement's sensor. An unresolved sensor leaves the
    /// trigger permanently unarmable.
    pub fn new(
        listener: ListenerId,
        requirement: SensorRequirement,
        services: Arc<SensorServices>,
    ) -> Self {
        let sensor = requirement.resolve(services.registry.as_ref());
        if sensor.is_none() {
            debug!(
                "[Doze] no sensor for {:?}, {} stays disarmed",
                requirement.source, requirement.reason
            );
        }
        Self {
            listener,
            sensor,
            setting: requirement.setting.filter(|key| !key.is_empty()),
            configured: requirement.configured,
            reason: requirement.reason,
            requested: false,
            registered: false,
            disabled: false,
            services,
        }
    }

    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    pub fn sensor(&self) -> Option<&SensorHandle> {
        self.sensor.as_ref()
    }

    pub fn setting(&self) -> Option<&str> {
        self.setting.as_deref()
    }

    pub fn reason(&self) -> PulseReason {
        self.reason
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_listening(&mut self, listen: bool) {
        if self.requested == listen {
            return;
        }
        self.requested = listen;
        self.update_listener();
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        if self.disabled == disabled {
            return;
        }
        self.disabled = disabled;
        self.update_listener();
    }

    /// Bring registry state in line with what is currently wanted.
    ///
    /// Safe to call redundantly: once consistent, no registry call is made.
    pub fn update_listener(&mut self) {
        let want = self.configured
            && self.sensor.is_some()
            && self.requested
            && !self.disabled
            && self.enabled_by_setting();

        let Some(sensor) = self.sensor.as_ref() else {
            return;
        };

        if want && !self.registered {
            self.registered = self.services.registry.request_trigger(self.listener, sensor);
            debug!(
                "[Doze] request_trigger {} for {}: {}",
                sensor.name, self.reason, self.registered
            );
        } else if !want && self.registered {
            let cancelled = self.services.registry.cancel_trigger(self.listener, sensor);
            if cancelled {
                debug!("[Doze] cancel_trigger {} for {}", sensor.name, self.reason);
            } else {
                warn!(
                    "[Doze] cancel_trigger {} for {} not confirmed, marking unregistered",
                    sensor.name, self.reason
                );
            }
            self.registered = false;
        }
    }

    /// Gating setting for the active user, on when unset or ungated.
    pub fn enabled_by_setting(&self) -> bool {
        let Some(key) = self.setting.as_deref() else {
            return true;
        };
        let settings = &self.services.settings;
        settings.get_bool_for_user(key, settings.current_user(), true)
    }

    /// Handle a one-shot fire: pulse, then re-arm.
    ///
    /// The wake lock is held for the whole call and released on every exit
    /// path. A callback error is returned after re-arming.
    pub fn on_fire(&mut self, event: &TriggerEvent) -> Result<()> {
        let services = Arc::clone(&self.services);
        let _wake_lock = WakeLockGuard::acquire(services.wake_lock.as_ref());
        debug!("[Doze] on_trigger: {}", event);

        let mut sensor_performs_prox_check = false;
        if let Some(sensor) = &self.sensor
            && sensor.category == SensorCategory::PickUpGesture
        {
            let subtype = event.subtype();
            services.metrics.action(MetricsAction::AmbientGesture, subtype);
            sensor_performs_prox_check = services.pickup_prox_matcher.matches(subtype);
        }

        self.registered = false;
        let result = services
            .callback
            .on_sensor_pulse(self.reason, sensor_performs_prox_check);
        // One-shot: re-arm so the next gesture fires too.
        self.update_listener();
        result
    }

    /// Subscribe the shared watch to this trigger's gating setting.
    pub fn register_settings_observer(&self, watch: &mut SettingsWatch) {
        if !self.configured {
            return;
        }
        if let Some(key) = self.setting.as_deref() {
            watch.attach(self.services.settings.as_ref(), key, UserScope::All);
        }
    }
}

impl fmt::Display for TriggerSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{registered={}, requested={}, disabled={}, configured={}, sensor=",
            self.registered, self.requested, self.disabled, self.configured
        )?;
        match &self.sensor {
            Some(sensor) => write!(f, "{sensor}}}"),
            None => write!(f, "null}}"),
        }
    }
}

impl fmt::Debug for TriggerSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerSensor")
            .field("listener", &self.listener)
            .field("reason", &self.reason)
            .field("sensor", &self.sensor)
            .field("setting", &self.setting)
            .field("configured", &self.configured)
            .field("requested", &self.requested)
            .field("registered", &self.registered)
            .field("disabled", &self.disabled)
            .finish()
    }
}
