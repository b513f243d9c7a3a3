use crate::sensors::{ListenerId, SensorCategory, SensorHandle, SensorRegistry, TriggerEvent};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Default)]
struct RegistryState {
    armed: BTreeMap<ListenerId, SensorHandle>,
    requests: HashMap<ListenerId, usize>,
    cancels: HashMap<ListenerId, usize>,
}

/// Sensor registry backed by a fixed sensor list.
///
/// Registrations are one-shot: [`fire`](Self::fire) removes the listener's
/// registration before handing back the event.
pub struct InMemorySensorRegistry {
    sensors: Vec<SensorHandle>,
    state: Mutex<RegistryState>,
    accepting: AtomicBool,
    cancel_confirms: AtomicBool,
}

impl InMemorySensorRegistry {
    pub fn new(sensors: Vec<SensorHandle>) -> Self {
        Self {
            sensors,
            state: Mutex::new(RegistryState::default()),
            accepting: AtomicBool::new(true),
            cancel_confirms: AtomicBool::new(true),
        }
    }

    /// Significant motion, pickup, and a vendor double tap sensor typed `double_tap_type`.
    pub fn with_default_sensors(double_tap_type: &str) -> Self {
        Self::new(vec![
            SensorHandle {
                handle: 1,
                name: "Significant Motion".to_string(),
                category: SensorCategory::SignificantMotion,
                string_type: "android.sensor.significant_motion".to_string(),
            },
            SensorHandle {
                handle: 2,
                name: "Pickup Gesture".to_string(),
                category: SensorCategory::PickUpGesture,
                string_type: "android.sensor.pick_up_gesture".to_string(),
            },
            SensorHandle {
                handle: 3,
                name: "Double Tap".to_string(),
                category: SensorCategory::Vendor,
                string_type: double_tap_type.to_string(),
            },
        ])
    }

    /// Reject (`false`) or accept future trigger requests.
    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::SeqCst);
    }

    /// When `false`, cancels report failure and leave the registration in place.
    pub fn set_cancel_confirms(&self, confirms: bool) {
        self.cancel_confirms.store(confirms, Ordering::SeqCst);
    }

    pub fn is_armed(&self, listener: ListenerId) -> bool {
        self.state.lock().armed.contains_key(&listener)
    }

    pub fn armed_listeners(&self) -> Vec<ListenerId> {
        self.state.lock().armed.keys().copied().collect()
    }

    pub fn request_calls(&self) -> usize {
        self.state.lock().requests.values().sum()
    }

    pub fn cancel_calls(&self) -> usize {
        self.state.lock().cancels.values().sum()
    }

    pub fn request_calls_for(&self, listener: ListenerId) -> usize {
        self.state.lock().requests.get(&listener).copied().unwrap_or(0)
    }

    pub fn cancel_calls_for(&self, listener: ListenerId) -> usize {
        self.state.lock().cancels.get(&listener).copied().unwrap_or(0)
    }

    /// Fire an armed listener, consuming its registration.
    ///
    /// Returns `None` if the listener was not armed.
    pub fn fire(&self, listener: ListenerId, values: Vec<f32>) -> Option<TriggerEvent> {
        let sensor = self.state.lock().armed.remove(&listener)?;
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Some(TriggerEvent::new(sensor, timestamp_ns, values))
    }
}

impl SensorRegistry for InMemorySensorRegistry {
    fn sensors(&self) -> Vec<SensorHandle> {
        self.sensors.clone()
    }

    fn default_sensor(&self, category: SensorCategory) -> Option<SensorHandle> {
        self.sensors
            .iter()
            .find(|sensor| sensor.category == category)
            .cloned()
    }

    fn request_trigger(&self, listener: ListenerId, sensor: &SensorHandle) -> bool {
        let accepting = self.accepting.load(Ordering::SeqCst);
        let mut state = self.state.lock();
        *state.requests.entry(listener).or_default() += 1;
        if !accepting {
            return false;
        }
        state.armed.insert(listener, sensor.clone());
        true
    }

    fn cancel_trigger(&self, listener: ListenerId, _sensor: &SensorHandle) -> bool {
        let confirms = self.cancel_confirms.load(Ordering::SeqCst);
        let mut state = self.state.lock();
        *state.cancels.entry(listener).or_default() += 1;
        if !confirms {
            return false;
        }
        state.armed.remove(&listener).is_some()
    }
}
