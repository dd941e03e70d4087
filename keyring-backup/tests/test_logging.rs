mod common;

use std::sync::{Arc, Mutex};

use common::Screen;
use keyring_backup::backup_code::BackupCodeConfig;
use keyring_backup::primitives::logger::{set_logger, LogLevel, Logger};

const CODE: &str = "ABCD-EFGH-IJKL-MNOP-QRST-UVWX-YZ12-3456-7890";

#[derive(Default)]
struct CapturingLogger {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl Logger for CapturingLogger {
    fn log(&self, level: LogLevel, message: String) {
        self.records.lock().unwrap().push((level, message));
    }
}

// the logger is process global, so everything lives in one test
#[test]
fn test_logs_are_prefixed_and_never_contain_secrets() {
    let logger = Arc::new(CapturingLogger::default());
    set_logger(logger.clone());

    let screen = Screen::open(CODE, BackupCodeConfig::new(vec![0xAB], true, true));
    screen.verifier.enter_code();
    screen.type_code(CODE);
    screen.verifier.share_backup().unwrap();
    screen
        .verifier
        .on_operation_failed("export failed".to_string());

    let records = logger.records.lock().unwrap().clone();

    assert!(records.iter().any(|(level, message)| {
        *level == LogLevel::Info
            && message == "[KeyringBackup][BackupCodeVerifier] state input -> confirmed"
    }));
    assert!(records.iter().any(|(level, message)| {
        *level == LogLevel::Info
            && message.starts_with("[KeyringBackup][BackupCodeVerifier] starting backup operation")
            && message.contains("0x00000000000000ab")
    }));
    assert!(records
        .iter()
        .any(|(level, _)| *level == LogLevel::Warn));

    for (_, message) in &records {
        assert!(!message.contains("ABCD"), "secret leaked into {message:?}");
    }
}
