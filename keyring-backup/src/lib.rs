#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

//! `keyring-backup` drives the backup code screen of a PGP key manager.
//!
//! The library generates a backup code, walks the user through re-typing it, and hands the
//! confirmed passphrase to the platform's backup operation. Hosts (Kotlin/Swift) implement the
//! small foreign traits in [`backup_code`] for rendering, navigation, timers and the
//! encryption/export itself; everything else lives here.

/// Backup code generation, verification state machine and the host traits it talks to.
pub mod backup_code;

/// Shared error handling utilities.
pub mod error;

/// Low level primitives: configuration, logging and device storage.
pub mod primitives;

pub use keyring_backup_macros::{backup_error, backup_export};

#[doc(hidden)]
pub use log as __log;

uniffi::setup_scaffolding!("keyring_backup");
