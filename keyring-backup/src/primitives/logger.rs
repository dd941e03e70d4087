use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

thread_local! {
    static THREAD_LOG_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

tokio::task_local! {
    /// Task-local logging context, used when exported methods run inside a tokio task.
    pub static LOG_CONTEXT: RefCell<Option<String>>;
}

/// Logger implemented by the host app.
///
/// Every record emitted through the `log` facade by this library is forwarded here once
/// [`set_logger`] has been called.
///
/// # Examples
///
/// ```rust
/// use keyring_backup::primitives::logger::{LogLevel, Logger};
///
/// struct StdoutLogger;
///
/// impl Logger for StdoutLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         println!("[{level:?}] {message}");
///     }
/// }
/// ```
///
/// ## Kotlin
///
/// ```kotlin
/// object TimberLogger : Logger {
///     override fun log(level: LogLevel, message: String) {
///         when (level) {
///             LogLevel.ERROR -> Timber.e(message)
///             LogLevel.WARN -> Timber.w(message)
///             LogLevel.INFO -> Timber.i(message)
///             LogLevel.DEBUG, LogLevel.TRACE -> Timber.d(message)
///         }
///     }
/// }
///
/// setLogger(TimberLogger) // once, in Application.onCreate
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs a message at the specified level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very low priority, extremely detailed messages.
    Trace,
    /// Debugging information.
    Debug,
    /// Progress of the application, e.g. state transitions.
    Info,
    /// Potentially harmful situations.
    Warn,
    /// Errors the application may still recover from.
    Error,
}

/// `log::Log` implementation that forwards to the host's [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !should_forward(record.level(), record.module_path()) {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(log_level(record.level()), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Debug and trace records are only forwarded when they come from this crate.
fn should_forward(level: log::Level, module_path: Option<&str>) -> bool {
    let is_own_record =
        module_path.is_some_and(|module_path| module_path.starts_with("keyring_backup"));
    let is_verbose = matches!(level, log::Level::Debug | log::Level::Trace);
    is_own_record || !is_verbose
}

const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Installs the host logger and routes the `log` facade to it.
///
/// Only the first call has an effect.
#[allow(clippy::module_name_repetitions)]
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }

    if let Err(e) = init_logger() {
        eprintln!("Failed to install logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Emits a `log` record at `$level`, prefixed with the current [`LogContext`] if one is open.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_with_context {
    ($level:expr, $($arg:tt)*) => {
        match $crate::primitives::logger::get_context() {
            Some(ctx) => $crate::__log::log!($level, "{} {}", ctx, format_args!($($arg)*)),
            None => $crate::__log::log!($level, $($arg)*),
        }
    };
}

/// Logs a trace-level message prefixed with the current [`LogContext`].
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => { $crate::__log_with_context!($crate::__log::Level::Trace, $($arg)*) };
}

/// Logs a debug-level message prefixed with the current [`LogContext`].
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => { $crate::__log_with_context!($crate::__log::Level::Debug, $($arg)*) };
}

/// Logs an info-level message prefixed with the current [`LogContext`].
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { $crate::__log_with_context!($crate::__log::Level::Info, $($arg)*) };
}

/// Logs a warning-level message prefixed with the current [`LogContext`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { $crate::__log_with_context!($crate::__log::Level::Warn, $($arg)*) };
}

/// Logs an error-level message prefixed with the current [`LogContext`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { $crate::__log_with_context!($crate::__log::Level::Error, $($arg)*) };
}

/// Which storage a [`LogContext`] wrote to, so `Drop` restores the same one.
enum LogContextStorage {
    TaskLocal,
    ThreadLocal,
}

/// Scope guard that sets the logging context and restores the previous one on drop.
///
/// `#[backup_export]` opens one at the top of every exported method.
///
/// ```rust
/// use keyring_backup::primitives::logger::{get_context, LogContext};
///
/// {
///     let _ctx = LogContext::new("BackupCodeVerifier");
///     assert_eq!(get_context().as_deref(), Some("[KeyringBackup][BackupCodeVerifier]"));
/// }
/// assert_eq!(get_context(), None);
/// ```
pub struct LogContext {
    previous: Option<String>,
    storage: LogContextStorage,
}

impl LogContext {
    /// Opens a logging context for `module` until the guard is dropped.
    #[must_use]
    pub fn new(module: &str) -> Self {
        let new_context = Some(format!("[KeyringBackup][{module}]"));

        // task_local survives .await points; plain threads fall back to thread_local
        match LOG_CONTEXT.try_with(|ctx| ctx.replace(new_context.clone())) {
            Ok(previous) => Self {
                previous,
                storage: LogContextStorage::TaskLocal,
            },
            Err(_) => {
                let previous = THREAD_LOG_CONTEXT.with(|ctx| ctx.replace(new_context));
                Self {
                    previous,
                    storage: LogContextStorage::ThreadLocal,
                }
            }
        }
    }
}

impl Drop for LogContext {
    fn drop(&mut self) {
        let previous = self.previous.take();
        match self.storage {
            LogContextStorage::TaskLocal => {
                let _ = LOG_CONTEXT.try_with(|ctx| ctx.replace(previous));
            }
            LogContextStorage::ThreadLocal => {
                THREAD_LOG_CONTEXT.with(|ctx| ctx.replace(previous));
            }
        }
    }
}

/// Gets the current logging context, if any.
#[must_use]
pub fn get_context() -> Option<String> {
    LOG_CONTEXT
        .try_with(|ctx| ctx.borrow().clone())
        .unwrap_or_else(|_| THREAD_LOG_CONTEXT.with(|ctx| ctx.borrow().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_contexts_restore_previous() {
        assert_eq!(get_context(), None);
        {
            let _outer = LogContext::new("Outer");
            assert_eq!(get_context().as_deref(), Some("[KeyringBackup][Outer]"));
            {
                let _inner = LogContext::new("Inner");
                assert_eq!(get_context().as_deref(), Some("[KeyringBackup][Inner]"));
            }
            assert_eq!(get_context().as_deref(), Some("[KeyringBackup][Outer]"));
        }
        assert_eq!(get_context(), None);
    }

    #[tokio::test]
    async fn test_task_local_context() {
        LOG_CONTEXT
            .scope(RefCell::new(None), async {
                let _ctx = LogContext::new("Task");
                tokio::task::yield_now().await;
                assert_eq!(get_context().as_deref(), Some("[KeyringBackup][Task]"));
            })
            .await;
    }

    #[test]
    fn test_should_forward() {
        assert!(should_forward(log::Level::Debug, Some("keyring_backup::backup_code")));
        assert!(!should_forward(log::Level::Debug, Some("uniffi::ffi")));
        assert!(!should_forward(log::Level::Trace, None));
        assert!(should_forward(log::Level::Warn, Some("uniffi::ffi")));
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(log_level(log::Level::Error), LogLevel::Error);
        assert_eq!(log_level(log::Level::Trace), LogLevel::Trace);
    }
}
