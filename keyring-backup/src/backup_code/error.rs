use crate::primitives::key_value_store::KeyValueStoreError;

/// Errors surfaced by the backup code screen.
#[crate::backup_error]
pub enum BackupCodeError {
    /// The backup code is not 9 groups of 4 alphanumeric characters.
    #[error("invalid backup code: {reason}")]
    InvalidBackupCode {
        /// What is wrong with the code.
        reason: String,
    },

    /// An input slot index outside `0..9`.
    #[error("input slot {index} does not exist")]
    InvalidSlotIndex {
        /// The rejected index.
        index: u32,
    },

    /// A saved screen state that cannot be restored.
    #[error("invalid saved state: {reason}")]
    InvalidSavedState {
        /// Which invariant the saved state breaks.
        reason: String,
    },

    /// The action needs a confirmed backup code.
    #[error("backup code has not been confirmed")]
    NotConfirmed,

    /// The debug override is not compiled in or not allowed in this environment.
    #[error("debug tools are not available in this build")]
    DebugToolsUnavailable,

    /// Key-value store operation failed
    #[error(transparent)]
    KeyValueStore(#[from] KeyValueStoreError),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {message}")]
    JsonError {
        /// The error message from `serde_json`
        message: String,
    },
}

impl From<serde_json::Error> for BackupCodeError {
    fn from(e: serde_json::Error) -> Self {
        Self::JsonError {
            message: e.to_string(),
        }
    }
}

/// Result type for backup code operations
pub type BackupCodeResult<T> = std::result::Result<T, BackupCodeError>;
