use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// File name prefix of exported backups.
pub const BACKUP_FILE_PREFIX: &str = "backup_";

/// Extension of backups containing secret keys.
pub const SECRET_BACKUP_EXTENSION: &str = ".sec.pgp";

/// Extension of backups containing only public keys.
pub const PUBLIC_BACKUP_EXTENSION: &str = ".pub.pgp";

/// MIME type of the encrypted backup file.
pub const BACKUP_MIME_TYPE: &str = "application/pgp-encrypted";

/// Suggested file name for a backup made on `date`, e.g. `backup_2026-10-19.sec.pgp`.
#[must_use]
pub fn backup_filename(export_secret: bool, date: NaiveDate) -> String {
    let extension = if export_secret {
        SECRET_BACKUP_EXTENSION
    } else {
        PUBLIC_BACKUP_EXTENSION
    };
    format!("{BACKUP_FILE_PREFIX}{}{extension}", date.format("%Y-%m-%d"))
}

/// What to do with the backup file once it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum DeliveryMode {
    /// Let the user pick a location and save it there.
    Save,
    /// Open the share sheet.
    Share,
}

/// Reference to the encrypted backup produced by the backup operation, e.g. a content URI of
/// a temporary file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct BackupArtifact {
    /// Platform reference to the file.
    pub uri: String,
}

/// Input of the backup operation.
#[derive(Clone, PartialEq, Eq, uniffi::Record)]
pub struct BackupRequest {
    /// Passphrase to encrypt the backup with.
    pub passphrase: String,
    /// Keys to back up.
    pub master_key_ids: Vec<u64>,
    /// Include secret keys.
    pub export_secret: bool,
    /// Suggested file name.
    pub filename: String,
    /// MIME type of the produced file.
    pub mime_type: String,
}

impl std::fmt::Debug for BackupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupRequest")
            .field("passphrase", &"<redacted>")
            .field("master_key_ids", &self.master_key_ids)
            .field("export_secret", &self.export_secret)
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// The key backup machinery of the host app.
///
/// `start_operation` runs asynchronously; the host reports the result on the UI thread
/// through [`BackupCodeVerifier::on_operation_succeeded`](super::BackupCodeVerifier::on_operation_succeeded),
/// [`on_operation_failed`](super::BackupCodeVerifier::on_operation_failed) or
/// [`on_operation_cancelled`](super::BackupCodeVerifier::on_operation_cancelled).
#[uniffi::export(with_foreign)]
pub trait BackupOperationHost: Send + Sync {
    /// Encrypts and exports the keys of `request` into a new artifact.
    fn start_operation(&self, request: BackupRequest);

    /// Gives the confirmed passphrase to the external caller that opened the screen.
    fn hand_off_passphrase(&self, passphrase: String);

    /// Opens the share sheet for the artifact.
    fn share_artifact(&self, artifact: BackupArtifact);

    /// Lets the user save the artifact, suggesting `filename`.
    fn save_artifact(&self, artifact: BackupArtifact, filename: String);
}

/// Progress of the backup operation for one screen.
///
/// The artifact is cached after a successful run so later save/share actions reuse it. Failure
/// and cancellation drop it so the next action runs the operation again.
#[derive(Debug, Default, Clone)]
pub struct OperationTracker {
    cached_artifact: Option<BackupArtifact>,
    in_flight: bool,
    pending_delivery: Option<DeliveryMode>,
}

/// Next step after the user asked for a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryStep {
    /// Run the operation first.
    Start,
    /// The operation is already running; the delivery happens when it finishes.
    Wait,
    /// Deliver the cached artifact now.
    Deliver(BackupArtifact),
}

impl OperationTracker {
    /// Tracker resuming with a cached artifact.
    #[must_use]
    pub const fn with_cached(cached_artifact: Option<BackupArtifact>) -> Self {
        Self {
            cached_artifact,
            in_flight: false,
            pending_delivery: None,
        }
    }

    /// Registers a delivery request.
    pub fn request(&mut self, mode: DeliveryMode) -> DeliveryStep {
        if self.in_flight {
            self.pending_delivery = Some(mode);
            return DeliveryStep::Wait;
        }
        if let Some(artifact) = &self.cached_artifact {
            return DeliveryStep::Deliver(artifact.clone());
        }
        self.in_flight = true;
        self.pending_delivery = Some(mode);
        DeliveryStep::Start
    }

    /// Records a finished operation, returning the delivery that was waiting for it.
    pub fn succeed(&mut self, artifact: BackupArtifact) -> Option<DeliveryMode> {
        self.in_flight = false;
        self.cached_artifact = Some(artifact);
        self.pending_delivery.take()
    }

    /// Records a failed or cancelled operation. The cached artifact is always dropped.
    pub fn reset(&mut self) {
        self.in_flight = false;
        self.cached_artifact = None;
        self.pending_delivery = None;
    }

    /// The cached artifact.
    #[must_use]
    pub const fn cached_artifact(&self) -> Option<&BackupArtifact> {
        self.cached_artifact.as_ref()
    }

    /// Whether an operation is running.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> BackupArtifact {
        BackupArtifact {
            uri: "content://keychain.tempstorage/backup".to_string(),
        }
    }

    #[test]
    fn test_backup_filename() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(backup_filename(true, date), "backup_2026-10-19.sec.pgp");
        assert_eq!(backup_filename(false, date), "backup_2026-10-19.pub.pgp");
    }

    #[test]
    fn test_request_debug_redacts_passphrase() {
        let request = BackupRequest {
            passphrase: "1234-5678-9012-3456-7890-1234-5678-9012-3456".to_string(),
            master_key_ids: vec![1],
            export_secret: true,
            filename: "backup.sec.pgp".to_string(),
            mime_type: BACKUP_MIME_TYPE.to_string(),
        };
        let debug = format!("{request:?}");
        assert!(!debug.contains("1234"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_tracker_runs_once_then_reuses_artifact() {
        let mut tracker = OperationTracker::default();
        assert_eq!(tracker.request(DeliveryMode::Share), DeliveryStep::Start);
        assert!(tracker.is_in_flight());

        // second tap while running only changes the pending delivery
        assert_eq!(tracker.request(DeliveryMode::Save), DeliveryStep::Wait);

        assert_eq!(tracker.succeed(artifact()), Some(DeliveryMode::Save));
        assert_eq!(tracker.cached_artifact(), Some(&artifact()));

        assert_eq!(
            tracker.request(DeliveryMode::Share),
            DeliveryStep::Deliver(artifact())
        );
    }

    #[test]
    fn test_tracker_reset_drops_artifact() {
        let mut tracker = OperationTracker::with_cached(Some(artifact()));
        tracker.reset();
        assert_eq!(tracker.cached_artifact(), None);
        assert_eq!(tracker.request(DeliveryMode::Save), DeliveryStep::Start);
    }
}
