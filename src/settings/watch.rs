//! Shared settings-change subscription for one coordinator.
//!
//! All triggers share a single observer identity. Attaching the same key
//! twice is a no-op, and detaching tears the whole observer down with one
//! unsubscribe call.

use super::{ObserverId, SettingChange, SettingsStore, UserId, UserScope};
use log::debug;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBSERVER_ID: AtomicU64 = AtomicU64::new(1);

pub struct SettingsWatch {
    observer: ObserverId,
    keys: BTreeSet<String>,
}

impl SettingsWatch {
    pub fn new() -> Self {
        Self {
            observer: ObserverId(NEXT_OBSERVER_ID.fetch_add(1, Ordering::Relaxed)),
            keys: BTreeSet::new(),
        }
    }

    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    /// Whether the observer currently holds any subscription.
    pub fn is_subscribed(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn is_watching(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Subscribe to `key` unless already subscribed.
    pub fn attach(&mut self, store: &dyn SettingsStore, key: &str, scope: UserScope) {
        if self.keys.contains(key) {
            return;
        }
        debug!(
            "[Settings] observer {} watching {}",
            self.observer.0,
            super::setting_uri(key)
        );
        store.register_observer(self.observer, key, scope);
        self.keys.insert(key.to_string());
    }

    /// Unsubscribe everything at once.
    pub fn detach_all(&mut self, store: &dyn SettingsStore) {
        if self.keys.is_empty() {
            return;
        }
        debug!(
            "[Settings] observer {} dropping {} key(s)",
            self.observer.0,
            self.keys.len()
        );
        store.unregister_observer(self.observer);
        self.keys.clear();
    }

    /// Whether a change notification should cause re-evaluation.
    ///
    /// Changes made on behalf of users other than the active one are dropped.
    pub fn is_relevant(&self, change: &SettingChange, current_user: UserId) -> bool {
        change.user == current_user
    }
}

impl Default for SettingsWatch {
    fn default() -> Self {
        Self::new()
    }
}
