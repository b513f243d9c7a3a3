//! Wake-lock access for trigger callbacks.

use log::trace;

/// Reference-counted wake lock provided by the platform.
///
/// Acquire and release must be safe to nest.
pub trait WakeLock: Send + Sync {
    fn acquire(&self);
    fn release(&self);
}

/// Holds a wake lock until dropped.
///
/// Release happens on every exit path, including early returns and panics
/// unwinding through the holder.
pub struct WakeLockGuard<'a> {
    lock: &'a dyn WakeLock,
}

impl<'a> WakeLockGuard<'a> {
    pub fn acquire(lock: &'a dyn WakeLock) -> Self {
        lock.acquire();
        trace!("[Power] wake lock acquired");
        Self { lock }
    }
}

impl Drop for WakeLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
        trace!("[Power] wake lock released");
    }
}
