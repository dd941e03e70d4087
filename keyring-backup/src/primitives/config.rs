use std::sync::OnceLock;

use crate::backup_export;

/// Global configuration for keyring-backup
static CONFIG_INSTANCE: OnceLock<KeyringBackupConfig> = OnceLock::new();

/// The kind of app build the library is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum BuildEnvironment {
    /// Development builds. Debug tooling may be enabled.
    Development,
    /// Release builds.
    Production,
}

impl BuildEnvironment {
    /// Returns the string representation of the environment
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for BuildEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Global configuration for keyring-backup
#[derive(Debug, Clone, uniffi::Object)]
pub struct KeyringBackupConfig {
    environment: BuildEnvironment,
}

#[backup_export]
impl KeyringBackupConfig {
    /// Creates a new config for the given environment.
    ///
    /// # Examples
    ///
    /// ## Kotlin
    ///
    /// ```kotlin
    /// val config = KeyringBackupConfig(BuildEnvironment.PRODUCTION)
    /// ```
    #[uniffi::constructor]
    #[must_use]
    pub fn new(environment: BuildEnvironment) -> Self {
        Self { environment }
    }

    /// Gets the configured environment
    #[must_use]
    pub fn environment(&self) -> BuildEnvironment {
        self.environment
    }
}

/// Initializes the global configuration.
///
/// Call once at application startup, before creating any backup code screen. Later calls are
/// ignored with a warning.
///
/// # Examples
///
/// ## Kotlin
///
/// ```kotlin
/// // Application.onCreate
/// initKeyringBackupConfig(if (BuildConfig.DEBUG) BuildEnvironment.DEVELOPMENT else BuildEnvironment.PRODUCTION)
/// ```
#[uniffi::export]
pub fn init_keyring_backup_config(environment: BuildEnvironment) {
    match CONFIG_INSTANCE.set(KeyringBackupConfig::new(environment)) {
        Ok(()) => {
            crate::info!("config initialized with environment: {environment}");
        }
        Err(_) => {
            crate::warn!("config already initialized, ignoring");
        }
    }
}

/// Gets the current environment, defaulting to `Production` when the config was never
/// initialized.
#[must_use]
pub fn current_environment() -> BuildEnvironment {
    CONFIG_INSTANCE.get().map_or_else(
        || {
            crate::warn!("config not initialized, defaulting to Production");
            BuildEnvironment::Production
        },
        KeyringBackupConfig::environment,
    )
}

/// Whether development-only tooling (the "accept any code" override) may be used.
///
/// Requires the `debug-tools` cargo feature at compile time and the `Development`
/// environment at runtime.
#[uniffi::export]
#[must_use]
pub fn debug_tools_enabled() -> bool {
    cfg!(any(test, feature = "debug-tools"))
        && current_environment() == BuildEnvironment::Development
}
