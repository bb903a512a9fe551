use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// Set of mutation keys currently being processed.
///
/// A store takes a [`InFlightGuard`] before writing; a second request for the
/// same key while the first is still running is rejected instead of applied
/// twice (double-tap on "add to cart", double submit of a form).
#[derive(Clone, Debug, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, key: impl Into<String>) -> Result<InFlightGuard, StoreError> {
        let key = key.into();
        let mut keys = self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !keys.insert(key.clone()) {
            return Err(StoreError::InFlight(key));
        }
        Ok(InFlightGuard {
            keys: self.keys.clone(),
            key,
        })
    }

    #[cfg(test)]
    fn is_busy(&self, key: &str) -> bool {
        self.keys
            .lock()
            .map(|keys| keys.contains(key))
            .unwrap_or(false)
    }
}

/// Releases its key when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut keys = self.keys.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        keys.remove(&self.key);
    }
}
