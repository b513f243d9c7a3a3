//! Per-user boolean settings consumed by the doze triggers.
//!
//! The store itself (persistence, user management) lives outside this crate;
//! triggers only read a boolean for the active user and subscribe to change
//! notifications through [`SettingsWatch`].

pub mod watch;

pub use watch::SettingsWatch;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Gates pickup-gesture pulses.
pub const DOZE_PULSE_ON_PICK_UP: &str = "doze_pulse_on_pick_up";
/// Gates double-tap pulses.
pub const DOZE_PULSE_ON_DOUBLE_TAP: &str = "doze_pulse_on_double_tap";

/// Content URI a setting key is published under.
pub fn setting_uri(key: &str) -> String {
    format!("content://settings/secure/{key}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl UserId {
    pub const SYSTEM: UserId = UserId(0);
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Which users' changes an observer wants to hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserScope {
    All,
    Current,
}

/// Identity of one change observer registered with a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

/// Change notification delivered by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingChange {
    pub key: String,
    pub user: UserId,
}

impl SettingChange {
    pub fn new(key: impl Into<String>, user: UserId) -> Self {
        Self {
            key: key.into(),
            user,
        }
    }
}

/// Per-user boolean setting store.
pub trait SettingsStore: Send + Sync {
    /// The user whose settings currently apply.
    fn current_user(&self) -> UserId;

    /// Stored boolean for `key` and `user`, or `default` when unset.
    fn get_bool_for_user(&self, key: &str, user: UserId, default: bool) -> bool;

    /// Subscribe `observer` to changes of `key`.
    fn register_observer(&self, observer: ObserverId, key: &str, scope: UserScope);

    /// Drop every subscription held by `observer`.
    fn unregister_observer(&self, observer: ObserverId);
}
