//! Doze sensors library.
//!
//! This library keeps the ambient display's one-shot gesture sensors
//! (significant motion, pickup, double tap) armed according to device
//! policy, per-user settings and runtime suppression, and turns their fires
//! into pulse requests.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod metrics;
pub mod power;
pub mod pulse;
pub mod sensors;
pub mod settings;
pub mod subtype_matcher;
