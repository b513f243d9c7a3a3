//! Doze sensor coordinator.
//!
//! Owns the fixed list of trigger sensors for the ambient display and the
//! single settings observer they share. All entry points take `&mut self`:
//! the owner serializes calls, fires and settings changes onto one queue.

use super::event::TriggerEvent;
use super::registry::{ListenerId, SensorCategory, SensorRegistry};
use super::trigger::{SensorRequirement, SensorServices, TriggerSensor};
use crate::config::DozeConfig;
use crate::error::Result;
use crate::metrics::MetricsSink;
use crate::power::WakeLock;
use crate::pulse::{PulseCallback, PulseReason};
use crate::settings::{
    DOZE_PULSE_ON_DOUBLE_TAP, DOZE_PULSE_ON_PICK_UP, SettingChange, SettingsStore, SettingsWatch,
};
use log::{debug, info, warn};
use std::sync::Arc;

/// Position of the pickup trigger in [`DozeSensors::fixed_requirements`].
const PICKUP_INDEX: usize = 1;

pub struct DozeSensors {
    services: Arc<SensorServices>,
    sensors: Vec<TriggerSensor>,
    /// Trigger suppressed while the proximity sensor is in use.
    proximity_sensitive: Option<usize>,
    watch: SettingsWatch,
}

impl DozeSensors {
    /// Build the standard significant-motion, pickup and double-tap triggers.
    pub fn new(
        config: &DozeConfig,
        registry: Arc<dyn SensorRegistry>,
        settings: Arc<dyn SettingsStore>,
        wake_lock: Arc<dyn WakeLock>,
        metrics: Arc<dyn MetricsSink>,
        callback: Arc<dyn PulseCallback>,
    ) -> Result<Self> {
        let services = SensorServices {
            registry,
            settings,
            wake_lock,
            metrics,
            callback,
            pickup_prox_matcher: config.pickup_prox_matcher()?,
        };
        Ok(Self::with_requirements(
            services,
            Self::fixed_requirements(config),
            Some(PICKUP_INDEX),
        ))
    }

    /// Build a coordinator over arbitrary requirements. Listener ids are
    /// the requirement positions.
    pub fn with_requirements(
        services: SensorServices,
        requirements: Vec<SensorRequirement>,
        proximity_sensitive: Option<usize>,
    ) -> Self {
        let services = Arc::new(services);
        let sensors: Vec<TriggerSensor> = requirements
            .into_iter()
            .enumerate()
            .map(|(index, requirement)| {
                TriggerSensor::new(ListenerId(index), requirement, services.clone())
            })
            .collect();
        let proximity_sensitive = proximity_sensitive.filter(|index| *index < sensors.len());

        info!(
            "[Doze] {} trigger sensor(s), {} resolved",
            sensors.len(),
            sensors.iter().filter(|s| s.sensor().is_some()).count()
        );

        Self {
            services,
            sensors,
            proximity_sensitive,
            watch: SettingsWatch::new(),
        }
    }

    pub fn fixed_requirements(config: &DozeConfig) -> Vec<SensorRequirement> {
        vec![
            SensorRequirement::by_category(
                SensorCategory::SignificantMotion,
                PulseReason::SensorSigMotion,
            )
            .configured(config.pulse_on_sig_motion),
            SensorRequirement::by_category(SensorCategory::PickUpGesture, PulseReason::SensorPickup)
                .gated_by(DOZE_PULSE_ON_PICK_UP)
                .configured(config.pulse_on_pickup_available()),
            SensorRequirement::by_type_string(
                config.double_tap_sensor_type.clone(),
                PulseReason::SensorDoubleTap,
            )
            .gated_by(DOZE_PULSE_ON_DOUBLE_TAP),
        ]
    }

    pub fn sensors(&self) -> &[TriggerSensor] {
        &self.sensors
    }

    pub fn sensor(&self, listener: ListenerId) -> Option<&TriggerSensor> {
        self.sensors.get(listener.0)
    }

    pub fn settings_watch(&self) -> &SettingsWatch {
        &self.watch
    }

    pub fn set_listen(&mut self, listen: bool) {
        debug!("[Doze] set_listen {}", listen);
        for sensor in &mut self.sensors {
            sensor.set_listening(listen);
            if listen {
                sensor.register_settings_observer(&mut self.watch);
            }
        }
        if !listen {
            self.watch.detach_all(self.services.settings.as_ref());
        }
    }

    /// Disarm then re-arm everything, for when registry state may be stale.
    pub fn reregister_all_sensors(&mut self) {
        for sensor in &mut self.sensors {
            sensor.set_listening(false);
        }
        for sensor in &mut self.sensors {
            sensor.set_listening(true);
        }
    }

    pub fn on_user_switched(&mut self) {
        debug!(
            "[Doze] user switched to {}",
            self.services.settings.current_user()
        );
        self.update_all();
    }

    pub fn set_disable_sensors_interfering_with_proximity(&mut self, disable: bool) {
        if let Some(index) = self.proximity_sensitive {
            self.sensors[index].set_disabled(disable);
        }
    }

    /// Settings-change notification from the shared observer.
    pub fn on_settings_changed(&mut self, change: &SettingChange) {
        let current_user = self.services.settings.current_user();
        if !self.watch.is_relevant(change, current_user) {
            debug!(
                "[Doze] ignoring change of {} for {} (active {})",
                change.key, change.user, current_user
            );
            return;
        }
        self.update_all();
    }

    /// Route a registry fire to its trigger.
    ///
    /// Fires for unknown listeners, or for triggers that were disarmed while
    /// the fire was queued, are dropped.
    pub fn on_trigger(&mut self, listener: ListenerId, event: &TriggerEvent) -> Result<()> {
        let Some(sensor) = self.sensors.get_mut(listener.0) else {
            warn!("[Doze] fire for unknown {}", listener);
            return Ok(());
        };
        if !sensor.is_registered() {
            debug!("[Doze] dropping stale fire for {}: {}", listener, event);
            return Ok(());
        }
        sensor.on_fire(event)
    }

    /// One line per trigger, for diagnostics.
    pub fn dump(&self) -> String {
        self.sensors
            .iter()
            .map(|sensor| format!("  {}: {}\n", sensor.reason(), sensor))
            .collect()
    }

    fn update_all(&mut self) {
        for sensor in &mut self.sensors {
            sensor.update_listener();
        }
    }
}

impl Drop for DozeSensors {
    fn drop(&mut self) {
        self.set_listen(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::simulation::{
        CountingWakeLock, InMemorySensorRegistry, InMemorySettings, RecordingMetricsSink,
        RecordingPulseCallback,
    };
    use crate::settings::{UserId, UserScope};
    use crate::subtype_matcher::SubtypeMatcher;

    const DOUBLE_TAP: &str = "vendor.double_tap";

    struct Harness {
        registry: Arc<InMemorySensorRegistry>,
        settings: Arc<InMemorySettings>,
        wake_lock: Arc<CountingWakeLock>,
        callback: Arc<RecordingPulseCallback>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                registry: Arc::new(InMemorySensorRegistry::with_default_sensors(DOUBLE_TAP)),
                settings: Arc::new(InMemorySettings::new(UserId::SYSTEM)),
                wake_lock: Arc::new(CountingWakeLock::new()),
                callback: Arc::new(RecordingPulseCallback::new()),
            }
        }

        fn services(&self) -> SensorServices {
            SensorServices {
                registry: self.registry.clone(),
                settings: self.settings.clone(),
                wake_lock: self.wake_lock.clone(),
                metrics: Arc::new(RecordingMetricsSink::new()),
                callback: self.callback.clone(),
                pickup_prox_matcher: SubtypeMatcher::none(),
            }
        }

        fn standard(&self, config: &DozeConfig) -> DozeSensors {
            DozeSensors::new(
                config,
                self.registry.clone(),
                self.settings.clone(),
                self.wake_lock.clone(),
                Arc::new(RecordingMetricsSink::new()),
                self.callback.clone(),
            )
            .unwrap()
        }

        /// Trigger A gated by "x", trigger B ungated. A is proximity sensitive.
        fn two_triggers(&self) -> DozeSensors {
            DozeSensors::with_requirements(
                self.services(),
                vec![
                    SensorRequirement::by_category(
                        SensorCategory::PickUpGesture,
                        PulseReason::SensorPickup,
                    )
                    .gated_by("x"),
                    SensorRequirement::by_category(
                        SensorCategory::SignificantMotion,
                        PulseReason::SensorSigMotion,
                    ),
                ],
                Some(0),
            )
        }
    }

    const A: ListenerId = ListenerId(0);
    const B: ListenerId = ListenerId(1);

    #[test]
    fn test_settings_change_disarms_only_gated_trigger() {
        let h = Harness::new();
        let mut doze = h.two_triggers();

        doze.set_listen(true);
        assert_eq!(h.registry.request_calls_for(A), 1);
        assert_eq!(h.registry.request_calls_for(B), 1);

        h.settings.put_bool("x", UserId::SYSTEM, false);
        doze.on_settings_changed(&SettingChange::new("x", UserId::SYSTEM));
        assert_eq!(h.registry.cancel_calls_for(A), 1);
        assert_eq!(h.registry.cancel_calls_for(B), 0);

        let event = h.registry.fire(B, vec![]).unwrap();
        doze.on_trigger(B, &event).unwrap();
        assert_eq!(h.callback.pulses(), vec![(PulseReason::SensorSigMotion, false)]);
        assert_eq!(h.registry.request_calls_for(B), 2);
        assert!(doze.sensor(B).unwrap().is_registered());
    }

    #[test]
    fn test_settings_change_for_other_user_is_ignored() {
        let h = Harness::new();
        let mut doze = h.two_triggers();
        doze.set_listen(true);

        h.settings.put_bool("x", UserId::SYSTEM, false);
        doze.on_settings_changed(&SettingChange::new("x", UserId(10)));

        assert_eq!(h.registry.cancel_calls(), 0);
        assert!(doze.sensor(A).unwrap().is_registered());
    }

    #[test]
    fn test_proximity_interference_disable_is_idempotent() {
        let h = Harness::new();
        let mut doze = h.two_triggers();
        doze.set_listen(true);

        doze.set_disable_sensors_interfering_with_proximity(true);
        assert_eq!(h.registry.cancel_calls_for(A), 1);

        doze.set_disable_sensors_interfering_with_proximity(true);
        assert_eq!(h.registry.cancel_calls(), 1);
        assert_eq!(h.registry.request_calls(), 2);
        assert!(doze.sensor(B).unwrap().is_registered());

        doze.set_disable_sensors_interfering_with_proximity(false);
        assert!(doze.sensor(A).unwrap().is_registered());
    }

    #[test]
    fn test_listen_toggle_does_not_duplicate_subscriptions() {
        let h = Harness::new();
        let mut doze = h.two_triggers();
        let observer = doze.settings_watch().observer();

        doze.set_listen(true);
        doze.set_listen(true);
        assert_eq!(h.settings.register_calls(), 1);

        doze.set_listen(false);
        assert_eq!(h.settings.unregister_calls(), 1);
        assert!(h.settings.observer_keys(observer).is_empty());
        assert!(!h.registry.is_armed(A));
        assert!(!h.registry.is_armed(B));

        doze.set_listen(true);
        assert_eq!(h.settings.observer_keys(observer), vec!["x"]);
        assert_eq!(h.settings.observer_scope(observer, "x"), Some(UserScope::All));
        assert_eq!(h.registry.armed_listeners(), vec![A, B]);
    }

    #[test]
    fn test_reregister_cycles_every_trigger() {
        let h = Harness::new();
        let mut doze = h.two_triggers();
        doze.set_listen(true);

        doze.reregister_all_sensors();
        assert_eq!(h.registry.cancel_calls(), 2);
        assert_eq!(h.registry.request_calls(), 4);
        assert_eq!(h.registry.armed_listeners(), vec![A, B]);
    }

    #[test]
    fn test_user_switch_reads_new_user_setting() {
        let h = Harness::new();
        let mut doze = h.two_triggers();
        h.settings.put_bool("x", UserId(10), false);
        doze.set_listen(true);
        assert!(doze.sensor(A).unwrap().is_registered());

        h.settings.switch_user(UserId(10));
        doze.on_user_switched();
        assert!(!doze.sensor(A).unwrap().is_registered());
        assert!(doze.sensor(A).unwrap().is_requested());

        h.settings.switch_user(UserId::SYSTEM);
        doze.on_user_switched();
        assert!(doze.sensor(A).unwrap().is_registered());
    }

    #[test]
    fn test_stale_and_unknown_fires_are_dropped() {
        let h = Harness::new();
        let mut doze = h.two_triggers();
        let sensor = h
            .registry
            .default_sensor(SensorCategory::SignificantMotion)
            .unwrap();
        let event = TriggerEvent::new(sensor, 0, vec![]);

        doze.on_trigger(B, &event).unwrap();
        doze.on_trigger(ListenerId(9), &event).unwrap();

        assert!(h.callback.pulses().is_empty());
        assert_eq!(h.wake_lock.acquire_count(), 0);
    }

    #[test]
    fn test_standard_triggers_follow_config() {
        let h = Harness::new();
        let config = DozeConfig {
            pulse_on_sig_motion: false,
            double_tap_sensor_type: DOUBLE_TAP.to_string(),
            ..DozeConfig::default()
        };
        let mut doze = h.standard(&config);
        doze.set_listen(true);

        let reasons: Vec<PulseReason> = doze.sensors().iter().map(|s| s.reason()).collect();
        assert_eq!(
            reasons,
            vec![
                PulseReason::SensorSigMotion,
                PulseReason::SensorPickup,
                PulseReason::SensorDoubleTap
            ]
        );
        // Significant motion is not configured
        assert_eq!(h.registry.armed_listeners(), vec![ListenerId(1), ListenerId(2)]);

        let mut keys = h.settings.observer_keys(doze.settings_watch().observer());
        keys.sort();
        assert_eq!(keys, vec![DOZE_PULSE_ON_DOUBLE_TAP, DOZE_PULSE_ON_PICK_UP]);

        doze.set_disable_sensors_interfering_with_proximity(true);
        assert_eq!(h.registry.armed_listeners(), vec![ListenerId(2)]);
    }

    #[test]
    fn test_missing_double_tap_type_stays_disarmed() {
        let h = Harness::new();
        let mut doze = h.standard(&DozeConfig::default());
        doze.set_listen(true);

        assert!(doze.sensor(ListenerId(2)).unwrap().sensor().is_none());
        assert_eq!(h.registry.armed_listeners(), vec![ListenerId(1)]);
    }

    #[test]
    fn test_invalid_matcher_spec_fails_construction() {
        let h = Harness::new();
        let config = DozeConfig {
            pickup_subtype_performs_prox_check: "1".to_string(),
            ..DozeConfig::default()
        };
        let result = DozeSensors::new(
            &config,
            h.registry.clone(),
            h.settings.clone(),
            h.wake_lock.clone(),
            Arc::new(RecordingMetricsSink::new()),
            h.callback.clone(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_drop_disarms_and_unsubscribes() {
        let h = Harness::new();
        let mut doze = h.two_triggers();
        let observer = doze.settings_watch().observer();
        doze.set_listen(true);

        drop(doze);
        assert!(h.registry.armed_listeners().is_empty());
        assert!(h.settings.observer_keys(observer).is_empty());
    }

    #[test]
    fn test_dump_lists_every_trigger() {
        let h = Harness::new();
        let doze = h.two_triggers();
        let dump = doze.dump();
        assert_eq!(dump.lines().count(), 2);
        assert!(dump.contains("sensor_pickup: {registered=false"));
    }
}
