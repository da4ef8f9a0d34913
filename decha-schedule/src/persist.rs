use std::fmt;
use std::sync::Arc;

use decha_core::serde_utils::{from_json_str, to_pretty_json};
use decha_core::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ScheduleError;

/// Write-through slot in a key-value store. Detached slots keep state in
/// memory only.
#[derive(Clone)]
pub(crate) struct Slot {
    kv: Option<Arc<dyn KeyValueStore>>,
    key: &'static str,
}

impl Slot {
    pub(crate) fn detached(key: &'static str) -> Self {
        Self { kv: None, key }
    }

    pub(crate) fn attached(kv: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self { kv: Some(kv), key }
    }

    pub(crate) fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, ScheduleError> {
        let Some(kv) = &self.kv else {
            return Ok(None);
        };
        match kv.get(self.key)? {
            Some(raw) => Ok(Some(from_json_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn save<T: Serialize>(&self, value: &T) -> Result<(), ScheduleError> {
        let Some(kv) = &self.kv else {
            return Ok(());
        };
        let raw = to_pretty_json(value)?;
        kv.set(self.key, &raw)?;
        debug!(key = self.key, bytes = raw.len(), "persisted");
        Ok(())
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("key", &self.key)
            .field("attached", &self.kv.is_some())
            .finish()
    }
}

/// Memory-backed store whose writes can be switched to fail.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    entries: decha_core::MemoryStore,
    failing: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl FlakyStore {
    pub(crate) fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    fn check(&self) -> decha_core::CoreResult<()> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(decha_core::DechaError::StorageError("disk full".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> decha_core::CoreResult<Option<String>> {
        self.entries.get(key)
    }

    fn set(&self, key: &str, value: &str) -> decha_core::CoreResult<()> {
        self.check()?;
        self.entries.set(key, value)
    }

    fn remove(&self, key: &str) -> decha_core::CoreResult<()> {
        self.check()?;
        self.entries.remove(key)
    }
}
