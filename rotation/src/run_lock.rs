//! Run-level lock: at most one in-flight rotation per corpus scope
//!
//! Two concurrent runs over the same corpus would both read the same LRU
//! dishes and race on `last_used`. Schedulers share the process-wide registry
//! from [`RunLock::process_wide`] unless given an isolated lock; separate
//! processes over one recipe book are kept apart by the book's file lock.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

static PROCESS_RUN_LOCK: OnceLock<RunLock> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct RunLock {
    active: Arc<Mutex<HashSet<String>>>,
}

/// Held for the lifetime of one run; releases the scope on drop
#[derive(Debug)]
pub struct RunGuard {
    scope: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl RunLock {
    /// A lock isolated from every other instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle on the registry shared by every scheduler in this process
    pub fn process_wide() -> Self {
        PROCESS_RUN_LOCK.get_or_init(RunLock::new).clone()
    }

    /// Claim `scope`, or `None` if a run already holds it
    pub fn try_acquire(&self, scope: &str) -> Option<RunGuard> {
        let mut active = lock(&self.active);
        if !active.insert(scope.to_string()) {
            return None;
        }
        Some(RunGuard {
            scope: scope.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_held(&self, scope: &str) -> bool {
        lock(&self.active).contains(scope)
    }
}

impl RunGuard {
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.scope);
    }
}

// The set stays consistent even if a holder panicked, so poisoning is ignored.
fn lock(active: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let lock = RunLock::new();

        let guard = lock.try_acquire("recipes").unwrap();
        assert_eq!(guard.scope(), "recipes");
        assert!(lock.is_held("recipes"));
        assert!(lock.try_acquire("recipes").is_none());

        drop(guard);
        assert!(!lock.is_held("recipes"));
        assert!(lock.try_acquire("recipes").is_some());
    }

    #[test]
    fn test_process_wide_handles_share_scopes() {
        let first = RunLock::process_wide();
        let second = RunLock::process_wide();

        let guard = first.try_acquire("run-lock-process-wide").unwrap();
        assert!(second.is_held("run-lock-process-wide"));
        assert!(second.try_acquire("run-lock-process-wide").is_none());
        assert!(!RunLock::new().is_held("run-lock-process-wide"));

        drop(guard);
        assert!(!second.is_held("run-lock-process-wide"));
    }

    #[test]
    fn test_scopes_are_independent() {
        let lock = RunLock::new();
        let shared = lock.clone();

        let _desserts = lock.try_acquire("desserts").unwrap();
        assert!(shared.try_acquire("entrees").is_some());
        assert!(shared.try_acquire("desserts").is_none());
    }
}
