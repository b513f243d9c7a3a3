//! Sensor simulation for testing.
//!
//! Provides simulated gesture fires and settings flips for development.

use super::{InMemorySensorRegistry, InMemorySettings};
use crate::dispatch::DozeEvent;
use crate::settings::{DOZE_PULSE_ON_PICK_UP, SettingChange, SettingsStore};
use log::info;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

/// Every this many ticks the pickup setting is flipped.
const SETTING_FLIP_TICKS: u64 = 5;

/// Spawn a task that fires a random armed sensor on every tick.
///
/// Every few ticks it also flips the pickup setting for the active user and
/// posts the change notification. The task ends once the dispatch queue is
/// gone.
pub fn run_sensor_simulation(
    registry: Arc<InMemorySensorRegistry>,
    settings: Arc<InMemorySettings>,
    events: UnboundedSender<DozeEvent>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(period);
        let mut tick: u64 = 0;
        loop {
            interval.tick().await;
            tick += 1;

            let armed = registry.armed_listeners();
            let fired = {
                let mut rng = rand::thread_rng();
                armed.choose(&mut rng).copied().and_then(|listener| {
                    let subtype = rng.gen_range(0..4) as f32;
                    registry
                        .fire(listener, vec![subtype])
                        .map(|event| (listener, event))
                })
            };
            if let Some((listener, event)) = fired {
                info!("[Sim] {} fired: {}", listener, event);
                if events.send(DozeEvent::Trigger { listener, event }).is_err() {
                    break;
                }
            }

            if tick % SETTING_FLIP_TICKS == 0 {
                let user = settings.current_user();
                let value = !settings.get_bool_for_user(DOZE_PULSE_ON_PICK_UP, user, true);
                let notified = settings.put_bool(DOZE_PULSE_ON_PICK_UP, user, value);
                info!("[Sim] {} set to {} for {}", DOZE_PULSE_ON_PICK_UP, value, user);
                if !notified.is_empty() {
                    let change = SettingChange::new(DOZE_PULSE_ON_PICK_UP, user);
                    if events.send(DozeEvent::SettingChanged(change)).is_err() {
                        break;
                    }
                }
            }
        }
    })
}
