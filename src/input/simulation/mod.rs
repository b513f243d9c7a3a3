//! In-memory platform services for development and testing.
//!
//! Each service keeps its state behind `parking_lot` locks or atomics so it
//! can be shared between the dispatch loop and a simulation task, and counts
//! the calls it receives so tests can assert on them.

mod registry;
mod sensors;
mod services;
mod settings;

pub use registry::InMemorySensorRegistry;
pub use sensors::run_sensor_simulation;
pub use services::{CountingWakeLock, RecordingMetricsSink, RecordingPulseCallback};
pub use settings::InMemorySettings;
