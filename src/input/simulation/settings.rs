use crate::settings::{ObserverId, SettingsStore, UserId, UserScope};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-user boolean settings held in memory.
pub struct InMemorySettings {
    current_user: RwLock<UserId>,
    values: RwLock<HashMap<(String, UserId), bool>>,
    observers: RwLock<HashMap<ObserverId, BTreeMap<String, UserScope>>>,
    register_calls: AtomicUsize,
    unregister_calls: AtomicUsize,
}

impl InMemorySettings {
    pub fn new(current_user: UserId) -> Self {
        Self {
            current_user: RwLock::new(current_user),
            values: RwLock::new(HashMap::new()),
            observers: RwLock::new(HashMap::new()),
            register_calls: AtomicUsize::new(0),
            unregister_calls: AtomicUsize::new(0),
        }
    }

    /// Store a value and return the observers that should hear about it.
    pub fn put_bool(&self, key: &str, user: UserId, value: bool) -> Vec<ObserverId> {
        self.values.write().insert((key.to_string(), user), value);

        let current = *self.current_user.read();
        let mut notified: Vec<ObserverId> = self
            .observers
            .read()
            .iter()
            .filter(|(_, keys)| match keys.get(key) {
                Some(UserScope::All) => true,
                Some(UserScope::Current) => user == current,
                None => false,
            })
            .map(|(observer, _)| *observer)
            .collect();
        notified.sort();
        notified
    }

    pub fn switch_user(&self, user: UserId) {
        *self.current_user.write() = user;
    }

    /// Keys `observer` is subscribed to, sorted.
    pub fn observer_keys(&self, observer: ObserverId) -> Vec<String> {
        self.observers
            .read()
            .get(&observer)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn observer_scope(&self, observer: ObserverId, key: &str) -> Option<UserScope> {
        self.observers
            .read()
            .get(&observer)
            .and_then(|keys| keys.get(key).copied())
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn unregister_calls(&self) -> usize {
        self.unregister_calls.load(Ordering::SeqCst)
    }
}

impl SettingsStore for InMemorySettings {
    fn current_user(&self) -> UserId {
        *self.current_user.read()
    }

    fn get_bool_for_user(&self, key: &str, user: UserId, default: bool) -> bool {
        self.values
            .read()
            .get(&(key.to_string(), user))
            .copied()
            .unwrap_or(default)
    }

    fn register_observer(&self, observer: ObserverId, key: &str, scope: UserScope) {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.observers
            .write()
            .entry(observer)
            .or_default()
            .insert(key.to_string(), scope);
    }

    fn unregister_observer(&self, observer: ObserverId) {
        self.unregister_calls.fetch_add(1, Ordering::SeqCst);
        self.observers.write().remove(&observer);
    }
}
