use crate::error::{DozeError, Result};
use crate::metrics::{MetricsAction, MetricsSink};
use crate::power::WakeLock;
use crate::pulse::{PulseCallback, PulseReason};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Wake lock that only counts.
#[derive(Default)]
pub struct CountingWakeLock {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl CountingWakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn is_held(&self) -> bool {
        self.acquire_count() > self.release_count()
    }
}

impl WakeLock for CountingWakeLock {
    fn acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingMetricsSink {
    actions: Mutex<Vec<(MetricsAction, i32)>>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> Vec<(MetricsAction, i32)> {
        self.actions.lock().clone()
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn action(&self, action: MetricsAction, subtype: i32) {
        self.actions.lock().push((action, subtype));
    }
}

/// Pulse callback that records every pulse and can be told to fail.
#[derive(Default)]
pub struct RecordingPulseCallback {
    pulses: Mutex<Vec<(PulseReason, bool)>>,
    failing: AtomicBool,
    panicking: AtomicBool,
}

impl RecordingPulseCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulses(&self) -> Vec<(PulseReason, bool)> {
        self.pulses.lock().clone()
    }

    /// Return an error from every pulse after recording it.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Panic from every pulse after recording it.
    pub fn set_panicking(&self, panicking: bool) {
        self.panicking.store(panicking, Ordering::SeqCst);
    }
}

impl PulseCallback for RecordingPulseCallback {
    fn on_sensor_pulse(&self, reason: PulseReason, sensor_performed_prox_check: bool) -> Result<()> {
        self.pulses.lock().push((reason, sensor_performed_prox_check));
        if self.panicking.load(Ordering::SeqCst) {
            panic!("pulse callback panicked for {reason}");
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(DozeError::PulseCallbackFailed(format!(
                "rejected pulse for {reason}"
            )));
        }
        Ok(())
    }
}
