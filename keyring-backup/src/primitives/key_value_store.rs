use thiserror::Error;

/// Failures reported by the host's [`DeviceKeyValueStore`].
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Error, uniffi::Error)]
pub enum KeyValueStoreError {
    /// Nothing is stored under the key.
    #[error("key not found")]
    KeyNotFound,
    /// The stored value could not be decoded by the host.
    #[error("failed to parse value")]
    ParsingFailure,
    /// The host could not write or remove the value.
    #[error("failed to update value")]
    UpdateFailure,
    /// The foreign implementation threw something it did not declare.
    #[error("unexpected error in foreign callback: {0}")]
    UnexpectedUniFFICallbackError(String),
}

impl From<uniffi::UnexpectedUniFFICallbackError> for KeyValueStoreError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        Self::UnexpectedUniFFICallbackError(e.reason)
    }
}

/// String key-value storage that survives process death, implemented by the host.
///
/// Used to keep the backup code screen state when the host does not keep it in its own
/// instance-state bundle. Android backs it with `SharedPreferences`, iOS with
/// `UserDefaults`.
///
/// This is **not a secure store**. Nothing secret is written here: the saved screen state
/// never contains the backup code or the passphrase.
#[uniffi::export(with_foreign)]
pub trait DeviceKeyValueStore: Send + Sync {
    /// Reads the value under `key`.
    ///
    /// # Errors
    /// - `KeyValueStoreError::KeyNotFound` when nothing is stored under `key`
    /// - `KeyValueStoreError::ParsingFailure` when the stored value is unreadable
    fn get(&self, key: String) -> Result<String, KeyValueStoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// - `KeyValueStoreError::UpdateFailure` when the write fails
    fn set(&self, key: String, value: String) -> Result<(), KeyValueStoreError>;

    /// Removes the value under `key`.
    ///
    /// # Errors
    /// - `KeyValueStoreError::KeyNotFound` when nothing is stored under `key`
    /// - `KeyValueStoreError::UpdateFailure` when the removal fails
    fn delete(&self, key: String) -> Result<(), KeyValueStoreError>;
}

/// `HashMap` backed store for unit tests.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryDeviceKeyValueStore {
    values: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl InMemoryDeviceKeyValueStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, std::collections::HashMap<String, String>> {
        self.values.lock().unwrap()
    }
}

#[cfg(test)]
impl DeviceKeyValueStore for InMemoryDeviceKeyValueStore {
    fn get(&self, key: String) -> Result<String, KeyValueStoreError> {
        self.values()
            .get(&key)
            .cloned()
            .ok_or(KeyValueStoreError::KeyNotFound)
    }

    fn set(&self, key: String, value: String) -> Result<(), KeyValueStoreError> {
        self.values().insert(key, value);
        Ok(())
    }

    fn delete(&self, key: String) -> Result<(), KeyValueStoreError> {
        match self.values().remove(&key) {
            Some(_) => Ok(()),
            None => Err(KeyValueStoreError::KeyNotFound),
        }
    }
}
