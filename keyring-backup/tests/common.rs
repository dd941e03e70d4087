#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use keyring_backup::backup_code::{
    BackupArtifact, BackupCodeConfig, BackupCodeVerifier, BackupOperationHost, BackupRequest,
    DeferredScheduler, NavigationHost, Notification, ScreenRenderer, ScreenUpdate,
};
use keyring_backup::primitives::key_value_store::{DeviceKeyValueStore, KeyValueStoreError};

/// Renderer that keeps everything it was asked to draw.
#[derive(Default)]
pub struct RecordingRenderer {
    pub updates: Mutex<Vec<ScreenUpdate>>,
    pub input_texts: Mutex<Vec<Vec<String>>>,
    pub notifications: Mutex<Vec<Notification>>,
}

impl ScreenRenderer for RecordingRenderer {
    fn render(&self, update: ScreenUpdate) {
        self.updates.lock().unwrap().push(update);
    }

    fn set_input_text(&self, slots: Vec<String>) {
        self.input_texts.lock().unwrap().push(slots);
    }

    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

/// Back-stack starting with the screen's own entry. Fires the listener synchronously.
pub struct BackStack {
    depth: Mutex<u32>,
    listening: Mutex<bool>,
    verifier: Mutex<Weak<BackupCodeVerifier>>,
}

impl BackStack {
    pub fn new() -> Self {
        Self {
            depth: Mutex::new(1),
            listening: Mutex::new(false),
            verifier: Mutex::new(Weak::new()),
        }
    }

    pub fn attach(&self, verifier: &Arc<BackupCodeVerifier>) {
        *self.verifier.lock().unwrap() = Arc::downgrade(verifier);
    }

    pub fn depth(&self) -> u32 {
        *self.depth.lock().unwrap()
    }

    pub fn is_listening(&self) -> bool {
        *self.listening.lock().unwrap()
    }

    /// System back action.
    pub fn press_back(&self) {
        self.pop_back_stack();
    }

    fn notify(&self) {
        if !self.is_listening() {
            return;
        }
        let verifier = self.verifier.lock().unwrap().upgrade();
        if let Some(verifier) = verifier {
            verifier.on_back_stack_changed();
        }
    }
}

impl NavigationHost for BackStack {
    fn back_stack_depth(&self) -> u32 {
        self.depth()
    }

    fn push_input_entry(&self) {
        *self.depth.lock().unwrap() += 1;
        self.notify();
    }

    fn pop_input_entry(&self) {
        *self.depth.lock().unwrap() -= 1;
    }

    fn pop_back_stack(&self) {
        *self.depth.lock().unwrap() -= 1;
        self.notify();
    }

    fn set_back_stack_listener(&self, enabled: bool) {
        *self.listening.lock().unwrap() = enabled;
    }
}

/// Scheduler whose tasks are fired by hand.
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<Vec<(u64, u64)>>,
}

impl ManualScheduler {
    pub fn pending(&self) -> Vec<(u64, u64)> {
        self.pending.lock().unwrap().clone()
    }

    /// Fires every pending task.
    pub fn run_pending(&self, verifier: &BackupCodeVerifier) {
        let tasks = std::mem::take(&mut *self.pending.lock().unwrap());
        for (_, token) in tasks {
            verifier.on_deferred_task(token);
        }
    }
}

impl DeferredScheduler for ManualScheduler {
    fn schedule(&self, delay_ms: u64, token: u64) {
        self.pending.lock().unwrap().push((delay_ms, token));
    }

    fn cancel(&self, token: u64) {
        self.pending
            .lock()
            .unwrap()
            .retain(|(_, pending)| *pending != token);
    }
}

#[derive(Default)]
pub struct RecordingOperationHost {
    pub requests: Mutex<Vec<BackupRequest>>,
    pub hand_offs: Mutex<Vec<String>>,
    pub shared: Mutex<Vec<BackupArtifact>>,
    pub saved: Mutex<Vec<(BackupArtifact, String)>>,
}

impl BackupOperationHost for RecordingOperationHost {
    fn start_operation(&self, request: BackupRequest) {
        self.requests.lock().unwrap().push(request);
    }

    fn hand_off_passphrase(&self, passphrase: String) {
        self.hand_offs.lock().unwrap().push(passphrase);
    }

    fn share_artifact(&self, artifact: BackupArtifact) {
        self.shared.lock().unwrap().push(artifact);
    }

    fn save_artifact(&self, artifact: BackupArtifact, filename: String) {
        self.saved.lock().unwrap().push((artifact, filename));
    }
}

/// `SharedPreferences` stand-in.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl DeviceKeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: String) -> Result<String, KeyValueStoreError> {
        let value = self.values.lock().unwrap().get(&key).cloned();
        value.ok_or(KeyValueStoreError::KeyNotFound)
    }

    fn set(&self, key: String, value: String) -> Result<(), KeyValueStoreError> {
        self.values.lock().unwrap().insert(key, value);
        Ok(())
    }

    fn delete(&self, key: String) -> Result<(), KeyValueStoreError> {
        self.values
            .lock()
            .unwrap()
            .remove(&key)
            .map(|_| ())
            .ok_or(KeyValueStoreError::KeyNotFound)
    }
}

/// One backup code screen with its hosts.
pub struct Screen {
    pub verifier: Arc<BackupCodeVerifier>,
    pub renderer: Arc<RecordingRenderer>,
    pub back_stack: Arc<BackStack>,
    pub scheduler: Arc<ManualScheduler>,
    pub operation: Arc<RecordingOperationHost>,
}

impl Screen {
    pub fn open(code: &str, config: BackupCodeConfig) -> Self {
        let renderer = Arc::new(RecordingRenderer::default());
        let back_stack = Arc::new(BackStack::new());
        let scheduler = Arc::new(ManualScheduler::default());
        let operation = Arc::new(RecordingOperationHost::default());

        let verifier = BackupCodeVerifier::new(
            code.to_string(),
            config,
            renderer.clone(),
            back_stack.clone(),
            scheduler.clone(),
            operation.clone(),
        )
        .unwrap();
        back_stack.attach(&verifier);

        Self {
            verifier,
            renderer,
            back_stack,
            scheduler,
            operation,
        }
    }

    /// Recreates the screen from a persisted snapshot, as after process death.
    pub fn reopen(code: &str, config: BackupCodeConfig, store: Arc<dyn DeviceKeyValueStore>) -> Self {
        let renderer = Arc::new(RecordingRenderer::default());
        let back_stack = Arc::new(BackStack::new());
        let scheduler = Arc::new(ManualScheduler::default());
        let operation = Arc::new(RecordingOperationHost::default());

        let verifier = BackupCodeVerifier::restore_from_store(
            code.to_string(),
            config,
            store,
            renderer.clone(),
            back_stack.clone(),
            scheduler.clone(),
            operation.clone(),
        )
        .unwrap();
        back_stack.attach(&verifier);

        Self {
            verifier,
            renderer,
            back_stack,
            scheduler,
            operation,
        }
    }

    /// Types `code` group by group, following the focus the verifier asks for.
    pub fn type_code(&self, code: &str) {
        let mut focus = Some(0);
        for group in code.split('-') {
            let slot = focus.expect("focus left the input slots early");
            focus = self.verifier.update_slot(slot, group.to_string()).unwrap();
        }
    }
}
