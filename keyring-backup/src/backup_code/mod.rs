mod error;
mod input;
mod machine;
mod navigation;
mod operation;
mod presenter;
mod scheduler;
mod state;
mod verifier;


pub use error::{BackupCodeError, BackupCodeResult};
pub use input::{InputBuffer, SlotEdit};
pub use machine::{Effect, VerifierMachine, DEBUG_FILL_PATTERN, DEBUG_OVERRIDE_PASSPHRASE};
pub use navigation::{NavigationHost, NavigationMarker};
pub use operation::{
    backup_filename, BackupArtifact, BackupOperationHost, BackupRequest, DeliveryMode,
    DeliveryStep, OperationTracker, BACKUP_MIME_TYPE,
};
pub use presenter::{
    FlashColor, Notification, NotificationStyle, ScreenRenderer, ScreenUpdate, StatusPanel,
    TextFlash,
};
pub use scheduler::{DeferredScheduler, DeferredTasks};
pub use state::{SavedScreenState, ScreenStateStore, VerificationState, SCREEN_STATE_KEY};
pub use verifier::BackupCodeVerifier;

use rand::Rng;
use std::fmt;
use zeroize::Zeroizing;

/// Number of groups in a backup code.
pub const GROUP_COUNT: usize = 9;

/// Number of characters in each group.
pub const GROUP_LEN: usize = 4;

/// Separator between groups in the string form of a code.
pub const GROUP_SEPARATOR: char = '-';

/// Length of the delimited string form, e.g. `1234-5678-...-3456`.
pub const CODE_STRING_LEN: usize = GROUP_COUNT * GROUP_LEN + GROUP_COUNT - 1;

/// Delay between confirming the code and handing the passphrase to an external caller,
/// long enough for the success animation to finish.
pub const DEFAULT_HAND_OFF_DELAY_MS: u64 = 2000;

/// A backup code: 9 groups of 4 characters used as the passphrase of a key backup.
///
/// The code is generated once per screen and never changes. It is kept in a zeroizing buffer
/// and its `Debug` output is redacted.
///
/// ```
/// use keyring_backup::backup_code::BackupCode;
///
/// let code = BackupCode::parse("ABCD-EFGH-IJKL-MNOP-QRST-UVWX-YZ12-3456-7890").unwrap();
/// assert_eq!(code.groups()[8], "7890");
/// assert!(code.matches("ABCD-EFGH-IJKL-MNOP-QRST-UVWX-YZ12-3456-7890"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct BackupCode(Zeroizing<String>);

impl BackupCode {
    /// Generates a fresh numeric code from the thread-local CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut code = Zeroizing::new(String::with_capacity(CODE_STRING_LEN));
        for group in 0..GROUP_COUNT {
            if group > 0 {
                code.push(GROUP_SEPARATOR);
            }
            for _ in 0..GROUP_LEN {
                code.push(char::from(rng.random_range(b'0'..=b'9')));
            }
        }
        Self(code)
    }

    /// Parses the delimited string form of a code.
    ///
    /// # Errors
    /// - `BackupCodeError::InvalidBackupCode` if the string is not 9 `-`-separated groups of 4
    ///   ASCII alphanumeric characters.
    pub fn parse(code: &str) -> BackupCodeResult<Self> {
        let groups: Vec<&str> = code.split(GROUP_SEPARATOR).collect();
        if groups.len() != GROUP_COUNT {
            return Err(BackupCodeError::InvalidBackupCode {
                reason: format!("expected {GROUP_COUNT} groups, got {}", groups.len()),
            });
        }
        if let Some(position) = groups.iter().position(|group| !is_valid_group(group)) {
            return Err(BackupCodeError::InvalidBackupCode {
                reason: format!(
                    "group {} must be {GROUP_LEN} alphanumeric characters",
                    position + 1
                ),
            });
        }
        Ok(Self(Zeroizing::new(code.to_string())))
    }

    /// The 9 groups, in order.
    #[must_use]
    pub fn groups(&self) -> Vec<&str> {
        self.0.split(GROUP_SEPARATOR).collect()
    }

    /// Exact comparison against a delimited candidate string.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_str() == candidate
    }

    /// The code as a passphrase. Only handed to the backup operation.
    pub(crate) fn to_passphrase(&self) -> Zeroizing<String> {
        self.0.clone()
    }
}

impl fmt::Debug for BackupCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BackupCode(<redacted>)")
    }
}

fn is_valid_group(group: &str) -> bool {
    group.len() == GROUP_LEN && group.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Generates a new backup code for a backup code screen.
///
/// The host keeps the returned code with the screen's arguments so the same code can be
/// passed to [`BackupCodeVerifier::restore`] after process death.
#[uniffi::export]
#[must_use]
pub fn generate_backup_code() -> String {
    BackupCode::generate().0.as_str().to_string()
}

/// Per-screen configuration.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct BackupCodeConfig {
    /// Master key ids of the keys to back up.
    pub master_key_ids: Vec<u64>,
    /// Back up secret keys (`true`) or only public keys (`false`).
    pub export_secret: bool,
    /// Run the backup operation from this screen (`true`), or hand the confirmed passphrase
    /// to an external caller (`false`).
    pub execute_backup_operation: bool,
    /// Delay before the passphrase hand-off when `execute_backup_operation` is `false`.
    pub hand_off_delay_ms: u64,
}

impl BackupCodeConfig {
    /// Config with the default hand-off delay.
    #[must_use]
    pub const fn new(
        master_key_ids: Vec<u64>,
        export_secret: bool,
        execute_backup_operation: bool,
    ) -> Self {
        Self {
            master_key_ids,
            export_secret,
            execute_backup_operation,
            hand_off_delay_ms: DEFAULT_HAND_OFF_DELAY_MS,
        }
    }
}
