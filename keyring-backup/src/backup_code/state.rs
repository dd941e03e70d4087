use std::sync::Arc;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use super::error::{BackupCodeError, BackupCodeResult};
use super::operation::BackupArtifact;
use crate::primitives::key_value_store::{DeviceKeyValueStore, KeyValueStoreError};

/// Key under which [`SavedScreenState`] is kept in the [`DeviceKeyValueStore`].
pub const SCREEN_STATE_KEY: &str = "backup_code.screen_state";

/// Where the user is in the backup code flow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum,
)]
pub enum VerificationState {
    /// Before the screen was created. Never re-entered.
    #[default]
    Uninitialized,
    /// The generated code is shown.
    Display,
    /// The user is re-typing the code.
    Input,
    /// The re-typed code did not match.
    InputError,
    /// The re-typed code matched.
    Confirmed,
}

impl VerificationState {
    /// `Input` or `InputError`, the states where the input slots are live.
    #[must_use]
    pub const fn is_input(&self) -> bool {
        matches!(self, Self::Input | Self::InputError)
    }

    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Display => "display",
            Self::Input => "input",
            Self::InputError => "input_error",
            Self::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for VerificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen state kept across process death.
///
/// Hosts either store this record in their own instance-state bundle, or let the verifier
/// persist it as JSON in the [`DeviceKeyValueStore`]. It never contains the backup code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct SavedScreenState {
    /// Current state.
    pub state: VerificationState,
    /// Back-stack depth recorded when entering the input state.
    pub navigation_marker: Option<u32>,
    /// Result of a finished backup operation, reused by later save/share actions.
    pub cached_artifact: Option<BackupArtifact>,
    /// The passphrase was already handed to the external caller.
    pub hand_off_delivered: bool,
}

impl SavedScreenState {
    /// Checks the invariants a restorable state must hold.
    ///
    /// # Errors
    /// - `BackupCodeError::InvalidSavedState` for an `Uninitialized` state, or a navigation
    ///   marker outside the input states.
    pub fn validate(&self) -> BackupCodeResult<()> {
        if self.state == VerificationState::Uninitialized {
            return Err(BackupCodeError::InvalidSavedState {
                reason: "cannot restore into the uninitialized state".to_string(),
            });
        }
        if self.navigation_marker.is_some() && !self.state.is_input() {
            return Err(BackupCodeError::InvalidSavedState {
                reason: format!("navigation marker set in state {}", self.state),
            });
        }
        Ok(())
    }
}

/// Reads and writes [`SavedScreenState`] in the device key-value store.
pub struct ScreenStateStore {
    kv_store: Arc<dyn DeviceKeyValueStore>,
}

impl ScreenStateStore {
    /// Wraps a host key-value store.
    #[must_use]
    pub fn new(kv_store: Arc<dyn DeviceKeyValueStore>) -> Self {
        Self { kv_store }
    }

    /// Serializes and stores `state`.
    ///
    /// # Errors
    /// - `BackupCodeError::JsonError` if serialization fails
    /// - `BackupCodeError::KeyValueStore` if the host store fails
    pub fn save(&self, state: &SavedScreenState) -> BackupCodeResult<()> {
        let json = serde_json::to_string(state)?;
        self.kv_store.set(SCREEN_STATE_KEY.to_string(), json)?;
        Ok(())
    }

    /// Loads the stored state, `None` if nothing was saved.
    ///
    /// # Errors
    /// - `BackupCodeError::Generic` if the stored JSON is unreadable
    /// - `BackupCodeError::KeyValueStore` if the host store fails
    pub fn load(&self) -> BackupCodeResult<Option<SavedScreenState>> {
        let json = match self.kv_store.get(SCREEN_STATE_KEY.to_string()) {
            Ok(json) => json,
            Err(KeyValueStoreError::KeyNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let parsed = serde_json::from_str::<SavedScreenState>(&json)
            .with_context(|| format!("reading {SCREEN_STATE_KEY}"));
        let state = BackupCodeError::from_anyhow_result_with_prefix(
            parsed,
            "saved screen state is corrupt",
        )?;
        Ok(Some(state))
    }

    /// Removes the stored state. Missing state is not an error.
    ///
    /// # Errors
    /// - `BackupCodeError::KeyValueStore` if the host store fails
    pub fn clear(&self) -> BackupCodeResult<()> {
        match self.kv_store.delete(SCREEN_STATE_KEY.to_string()) {
            Ok(()) | Err(KeyValueStoreError::KeyNotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
