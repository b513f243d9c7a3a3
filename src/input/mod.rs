//! Input sources that feed the doze sensors.
//!
//! Current input sources:
//! - `simulation`: in-memory platform services and a simulated fire loop

pub mod simulation;
