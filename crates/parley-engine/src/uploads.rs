use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{EngineError, Result};

/// Owners with an upload-triggered exchange in flight
///
/// At most one per owner. A second attempt is refused rather than queued.
#[derive(Clone, Default)]
pub struct UploadRegistry {
    busy: Arc<Mutex<HashSet<String>>>,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn busy(&self) -> MutexGuard<'_, HashSet<String>> {
        self.busy.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark the owner busy until the returned guard is dropped
    pub fn try_acquire(&self, owner_id: &str) -> Result<UploadGuard> {
        if !self.busy().insert(owner_id.to_string()) {
            tracing::info!(owner_id, "upload refused, previous one still running");
            return Err(EngineError::UploadBusy);
        }
        Ok(UploadGuard {
            owner_id: owner_id.to_string(),
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self, owner_id: &str) -> bool {
        self.busy().contains(owner_id)
    }

    pub fn in_flight(&self) -> usize {
        self.busy().len()
    }
}

/// Clears the owner's busy flag on every exit path
pub struct UploadGuard {
    owner_id: String,
    busy: Arc<Mutex<HashSet<String>>>,
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        let mut busy = self.busy.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        busy.remove(&self.owner_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_refused() {
        let registry = UploadRegistry::new();
        let _guard = registry.try_acquire("u1").unwrap();

        assert!(matches!(registry.try_acquire("u1"), Err(EngineError::UploadBusy)));
        assert!(registry.try_acquire("u2").is_ok());
    }

    #[test]
    fn drop_releases_owner() {
        let registry = UploadRegistry::new();
        {
            let _guard = registry.try_acquire("u1").unwrap();
            assert!(registry.is_busy("u1"));
        }
        assert!(!registry.is_busy("u1"));
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn panic_releases_owner() {
        let registry = UploadRegistry::new();
        let cloned = registry.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = cloned.try_acquire("u1").unwrap();
            panic!("extraction blew up");
        });
        assert!(result.is_err());
        assert_eq!(registry.in_flight(), 0);
    }
}
