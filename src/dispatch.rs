//! Serialized event queue in front of [`DozeSensors`].
//!
//! Registry fires, settings notifications and owner commands can come from
//! different tasks. They are all posted to one channel and applied in order
//! by a single loop that owns the coordinator, so trigger state is never
//! touched concurrently.

use crate::sensors::{DozeSensors, ListenerId, TriggerEvent};
use crate::settings::SettingChange;
use log::{error, info};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum DozeEvent {
    Trigger {
        listener: ListenerId,
        event: TriggerEvent,
    },
    SettingChanged(SettingChange),
    UserSwitched,
    Listen(bool),
    Reregister,
    ProximityInterference(bool),
}

/// Apply one event. Callback failures are logged and swallowed.
pub fn apply(sensors: &mut DozeSensors, event: DozeEvent) {
    match event {
        DozeEvent::Trigger { listener, event } => {
            if let Err(e) = sensors.on_trigger(listener, &event) {
                error!("[Doze] pulse for {} failed: {}", listener, e);
            }
        }
        DozeEvent::SettingChanged(change) => sensors.on_settings_changed(&change),
        DozeEvent::UserSwitched => sensors.on_user_switched(),
        DozeEvent::Listen(listen) => sensors.set_listen(listen),
        DozeEvent::Reregister => sensors.reregister_all_sensors(),
        DozeEvent::ProximityInterference(disable) => {
            sensors.set_disable_sensors_interfering_with_proximity(disable)
        }
    }
}

/// Drain `events` into `sensors` until every sender is dropped.
///
/// Stops listening before handing the coordinator back.
pub async fn run_dispatch(
    mut sensors: DozeSensors,
    mut events: mpsc::UnboundedReceiver<DozeEvent>,
) -> DozeSensors {
    info!("[Doze] dispatch loop started");
    while let Some(event) = events.recv().await {
        apply(&mut sensors, event);
    }
    sensors.set_listen(false);
    info!("[Doze] dispatch loop stopped");
    sensors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::simulation::{
        CountingWakeLock, InMemorySensorRegistry, InMemorySettings, RecordingMetricsSink,
        RecordingPulseCallback,
    };
    use crate::pulse::PulseReason;
    use crate::sensors::{SensorCategory, SensorRequirement, SensorServices};
    use crate::settings::UserId;
    use crate::subtype_matcher::SubtypeMatcher;
    use std::sync::Arc;

    fn coordinator(
        registry: Arc<InMemorySensorRegistry>,
        settings: Arc<InMemorySettings>,
        callback: Arc<RecordingPulseCallback>,
    ) -> DozeSensors {
        let services = SensorServices {
            registry,
            settings,
            wake_lock: Arc::new(CountingWakeLock::new()),
            metrics: Arc::new(RecordingMetricsSink::new()),
            callback,
            pickup_prox_matcher: SubtypeMatcher::parse("*").unwrap(),
        };
        DozeSensors::with_requirements(
            services,
            vec![
                SensorRequirement::by_category(
                    SensorCategory::PickUpGesture,
                    PulseReason::SensorPickup,
                )
                .gated_by("x"),
            ],
            Some(0),
        )
    }

    #[test]
    fn test_events_applied_in_order() {
        let registry = Arc::new(InMemorySensorRegistry::with_default_sensors("vendor.tap"));
        let settings = Arc::new(InMemorySettings::new(UserId::SYSTEM));
        let callback = Arc::new(RecordingPulseCallback::new());
        let mut sensors = coordinator(registry.clone(), settings.clone(), callback.clone());
        apply(&mut sensors, DozeEvent::Listen(true));

        let (tx, rx) = mpsc::unbounded_channel();
        let event = registry.fire(ListenerId(0), vec![5.0]).unwrap();
        tx.send(DozeEvent::Trigger {
            listener: ListenerId(0),
            event,
        })
        .unwrap();
        tx.send(DozeEvent::Listen(true)).unwrap();
        tx.send(DozeEvent::ProximityInterference(true)).unwrap();
        drop(tx);

        let sensors = tokio_test::block_on(run_dispatch(sensors, rx));

        assert_eq!(callback.pulses(), vec![(PulseReason::SensorPickup, true)]);
        // Re-armed after the fire, then disabled, then stopped
        assert_eq!(registry.request_calls(), 2);
        assert_eq!(registry.cancel_calls(), 1);
        assert!(registry.armed_listeners().is_empty());
        assert!(!sensors.sensor(ListenerId(0)).unwrap().is_requested());
        assert_eq!(settings.unregister_calls(), 1);
    }

    #[test]
    fn test_callback_failure_does_not_stop_loop() {
        let registry = Arc::new(InMemorySensorRegistry::with_default_sensors("vendor.tap"));
        let settings = Arc::new(InMemorySettings::new(UserId::SYSTEM));
        let callback = Arc::new(RecordingPulseCallback::new());
        callback.set_failing(true);
        let mut sensors = coordinator(registry.clone(), settings.clone(), callback.clone());
        apply(&mut sensors, DozeEvent::Listen(true));

        let (tx, rx) = mpsc::unbounded_channel();
        let first = registry.fire(ListenerId(0), vec![]).unwrap();
        tx.send(DozeEvent::Trigger {
            listener: ListenerId(0),
            event: first,
        })
        .unwrap();
        tx.send(DozeEvent::Reregister).unwrap();
        drop(tx);

        let sensors = tokio_test::block_on(run_dispatch(sensors, rx));
        assert_eq!(callback.pulses().len(), 1);
        // listen, re-arm after fire, reregister
        assert_eq!(registry.request_calls(), 3);
        assert!(!sensors.sensor(ListenerId(0)).unwrap().is_registered());
    }

    #[test]
    fn test_setting_change_through_queue() {
        let registry = Arc::new(InMemorySensorRegistry::with_default_sensors("vendor.tap"));
        let settings = Arc::new(InMemorySettings::new(UserId::SYSTEM));
        let callback = Arc::new(RecordingPulseCallback::new());
        let mut sensors = coordinator(registry.clone(), settings.clone(), callback);
        apply(&mut sensors, DozeEvent::Listen(true));
        assert!(registry.is_armed(ListenerId(0)));

        let notified = settings.put_bool("x", UserId::SYSTEM, false);
        assert_eq!(notified, vec![sensors.settings_watch().observer()]);
        apply(
            &mut sensors,
            DozeEvent::SettingChanged(SettingChange::new("x", UserId::SYSTEM)),
        );
        assert!(!registry.is_armed(ListenerId(0)));

        settings.put_bool("x", UserId::SYSTEM, true);
        apply(&mut sensors, DozeEvent::UserSwitched);
        assert!(registry.is_armed(ListenerId(0)));
    }
}
