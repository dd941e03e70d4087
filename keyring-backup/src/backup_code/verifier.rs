use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backup_export;
use crate::primitives::config::debug_tools_enabled;
use crate::primitives::key_value_store::DeviceKeyValueStore;

use super::error::BackupCodeError;
use super::machine::{Effect, VerifierMachine};
use super::navigation::NavigationHost;
use super::operation::{BackupArtifact, BackupOperationHost, DeliveryMode};
use super::presenter::ScreenRenderer;
use super::scheduler::DeferredScheduler;
use super::state::{SavedScreenState, ScreenStateStore, VerificationState};
use super::{BackupCode, BackupCodeConfig};

/// The backup code screen.
///
/// Shows a backup code, asks the user to type it back, and once it matches passes the
/// passphrase on to the backup operation. All calls are expected from the host's UI thread;
/// they are serialized internally. Host callbacks run after the internal lock is released,
/// so a host may call back into the verifier from inside a callback (for example when its
/// back-stack notifies listeners synchronously).
///
/// # Examples
///
/// ## Kotlin
///
/// ```kotlin
/// // BackupCodeFragment.newInstance
/// args.putString(ARG_BACKUP_CODE, generateBackupCode())
///
/// // onViewCreated
/// verifier = if (savedInstanceState == null) {
///     BackupCodeVerifier(code, config, renderer, navigation, scheduler, operationHost)
/// } else {
///     BackupCodeVerifier.restore(code, config, savedInstanceState.toSavedScreenState(), renderer, navigation, scheduler, operationHost)
/// }
///
/// // TextWatcher.afterTextChanged on slot i
/// verifier.updateSlot(i.toUInt(), s.toString())?.let { codeFields[it.toInt()].requestFocus() }
/// ```
#[derive(uniffi::Object)]
pub struct BackupCodeVerifier {
    machine: Mutex<VerifierMachine>,
    renderer: Arc<dyn ScreenRenderer>,
    navigation: Arc<dyn NavigationHost>,
    scheduler: Arc<dyn DeferredScheduler>,
    operation: Arc<dyn BackupOperationHost>,
}

#[backup_export]
impl BackupCodeVerifier {
    /// Creates the screen for `backup_code` and shows it.
    ///
    /// # Errors
    /// - `BackupCodeError::InvalidBackupCode` if `backup_code` is malformed.
    #[uniffi::constructor]
    pub fn new(
        backup_code: String,
        config: BackupCodeConfig,
        renderer: Arc<dyn ScreenRenderer>,
        navigation: Arc<dyn NavigationHost>,
        scheduler: Arc<dyn DeferredScheduler>,
        operation: Arc<dyn BackupOperationHost>,
    ) -> Result<Arc<Self>, BackupCodeError> {
        let code = BackupCode::parse(&backup_code)?;
        let mut machine = VerifierMachine::new(code, config, debug_tools_enabled());
        let effects = machine.start();

        let verifier = Arc::new(Self {
            machine: Mutex::new(machine),
            renderer,
            navigation,
            scheduler,
            operation,
        });
        verifier.apply(effects);
        Ok(verifier)
    }

    /// Recreates the screen after process death from `saved`, without animations.
    ///
    /// `backup_code` must be the code the screen was originally created with.
    ///
    /// # Errors
    /// - `BackupCodeError::InvalidBackupCode` if `backup_code` is malformed.
    /// - `BackupCodeError::InvalidSavedState` if `saved` breaks the state invariants.
    #[uniffi::constructor]
    pub fn restore(
        backup_code: String,
        config: BackupCodeConfig,
        saved: SavedScreenState,
        renderer: Arc<dyn ScreenRenderer>,
        navigation: Arc<dyn NavigationHost>,
        scheduler: Arc<dyn DeferredScheduler>,
        operation: Arc<dyn BackupOperationHost>,
    ) -> Result<Arc<Self>, BackupCodeError> {
        let code = BackupCode::parse(&backup_code)?;
        let depth = navigation.back_stack_depth();
        let (machine, effects) =
            VerifierMachine::restore(code, config, debug_tools_enabled(), &saved, depth)?;

        let verifier = Arc::new(Self {
            machine: Mutex::new(machine),
            renderer,
            navigation,
            scheduler,
            operation,
        });
        verifier.apply(effects);
        Ok(verifier)
    }

    /// Like [`Self::restore`], reading the saved state from `store`. Starts a fresh screen
    /// when nothing was saved.
    ///
    /// # Errors
    /// - `BackupCodeError::InvalidBackupCode` if `backup_code` is malformed.
    /// - `BackupCodeError::InvalidSavedState` if the stored state breaks the state invariants.
    /// - `BackupCodeError::KeyValueStore` / `BackupCodeError::Generic` if the stored state
    ///   cannot be read.
    #[uniffi::constructor]
    pub fn restore_from_store(
        backup_code: String,
        config: BackupCodeConfig,
        store: Arc<dyn DeviceKeyValueStore>,
        renderer: Arc<dyn ScreenRenderer>,
        navigation: Arc<dyn NavigationHost>,
        scheduler: Arc<dyn DeferredScheduler>,
        operation: Arc<dyn BackupOperationHost>,
    ) -> Result<Arc<Self>, BackupCodeError> {
        match ScreenStateStore::new(store).load()? {
            Some(saved) => Self::restore(
                backup_code,
                config,
                saved,
                renderer,
                navigation,
                scheduler,
                operation,
            ),
            None => {
                crate::info!("no saved screen state, starting fresh");
                Self::new(backup_code, config, renderer, navigation, scheduler, operation)
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> VerificationState {
        self.lock().state()
    }

    /// Back-stack depth recorded on entering the input state.
    pub fn navigation_marker(&self) -> Option<u32> {
        self.lock().navigation_marker()
    }

    /// The 9 groups of the code, for the display state.
    pub fn display_groups(&self) -> Vec<String> {
        self.lock().display_groups()
    }

    /// "Enter code" tapped.
    pub fn enter_code(&self) {
        let depth = self.navigation.back_stack_depth();
        self.run(|machine| machine.enter_code(depth));
    }

    /// Text of input slot `index` changed to `text`. Returns the slot to move focus to.
    ///
    /// # Errors
    /// - `BackupCodeError::InvalidSlotIndex` if `index >= 9`.
    ///
    /// # Panics
    /// If `text` is longer than 4 characters; the host's fields must be length limited.
    pub fn update_slot(&self, index: u32, text: String) -> Result<Option<u32>, BackupCodeError> {
        let (focus, effects) = self.lock().update_slot(index, &text)?;
        self.apply(effects);
        Ok(focus)
    }

    /// In-screen "back" button tapped.
    pub fn go_back(&self) {
        self.run(VerifierMachine::go_back);
    }

    /// Back-stack listener, active while the input entry is on the back-stack.
    pub fn on_back_stack_changed(&self) {
        let depth = self.navigation.back_stack_depth();
        self.run(|machine| machine.on_back_stack_changed(depth));
    }

    /// "Save" tapped after confirmation.
    ///
    /// # Errors
    /// - `BackupCodeError::NotConfirmed` before the code was confirmed.
    pub fn save_backup(&self) -> Result<(), BackupCodeError> {
        self.deliver(DeliveryMode::Save)
    }

    /// "Share" tapped after confirmation.
    ///
    /// # Errors
    /// - `BackupCodeError::NotConfirmed` before the code was confirmed.
    pub fn share_backup(&self) -> Result<(), BackupCodeError> {
        self.deliver(DeliveryMode::Share)
    }

    /// The backup operation finished and produced `artifact`.
    pub fn on_operation_succeeded(&self, artifact: BackupArtifact) {
        self.run(|machine| machine.on_operation_succeeded(artifact));
    }

    /// The backup operation failed; `reason` is shown to the user.
    pub fn on_operation_failed(&self, reason: String) {
        self.run(|machine| machine.on_operation_failed(reason));
    }

    /// The backup operation was cancelled.
    pub fn on_operation_cancelled(&self) {
        self.run(VerifierMachine::on_operation_cancelled);
    }

    /// A task scheduled through [`DeferredScheduler`] fired.
    pub fn on_deferred_task(&self, token: u64) {
        self.run(|machine| machine.on_deferred_task(token));
    }

    /// Development only: accept any complete input as the correct code.
    ///
    /// # Errors
    /// - `BackupCodeError::DebugToolsUnavailable` unless built with the `debug-tools`
    ///   feature and running in the `Development` environment.
    pub fn set_debug_override(&self, enabled: bool) -> Result<(), BackupCodeError> {
        let effects = self.lock().set_debug_override(enabled)?;
        self.apply(effects);
        Ok(())
    }

    /// Snapshot for the host's instance-state bundle.
    pub fn saved_state(&self) -> SavedScreenState {
        self.lock().saved_state()
    }

    /// Writes the current snapshot to `store`.
    ///
    /// # Errors
    /// - `BackupCodeError::JsonError` / `BackupCodeError::KeyValueStore` if writing fails.
    pub fn persist(&self, store: Arc<dyn DeviceKeyValueStore>) -> Result<(), BackupCodeError> {
        let saved = self.saved_state();
        ScreenStateStore::new(store).save(&saved)
    }

    /// Removes a snapshot written by [`Self::persist`], once the screen is finished for good.
    ///
    /// # Errors
    /// - `BackupCodeError::KeyValueStore` if the host store fails.
    pub fn forget_persisted(
        &self,
        store: Arc<dyn DeviceKeyValueStore>,
    ) -> Result<(), BackupCodeError> {
        ScreenStateStore::new(store).clear()
    }

    /// The screen is being destroyed.
    pub fn dispose(&self) {
        self.run(VerifierMachine::dispose);
    }
}

impl BackupCodeVerifier {
    fn lock(&self) -> MutexGuard<'_, VerifierMachine> {
        // the machine is consistent between events, so a panic mid-event leaves usable state
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, mode: DeliveryMode) -> Result<(), BackupCodeError> {
        let effects = self.lock().request_delivery(mode)?;
        self.apply(effects);
        Ok(())
    }

    /// Runs one event on the machine, then applies its effects with the lock released.
    fn run(&self, event: impl FnOnce(&mut VerifierMachine) -> Vec<Effect>) {
        let effects = event(&mut self.lock());
        self.apply(effects);
    }

    fn apply(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Render(update) => self.renderer.render(update),
                Effect::SetInputText(slots) => self.renderer.set_input_text(slots),
                Effect::Notify(notification) => self.renderer.notify(notification),
                Effect::PushInputEntry => self.navigation.push_input_entry(),
                Effect::PopInputEntry => self.navigation.pop_input_entry(),
                Effect::PopBackStack => self.navigation.pop_back_stack(),
                Effect::ListenBackStack(enabled) => {
                    self.navigation.set_back_stack_listener(enabled);
                }
                Effect::Schedule { delay_ms, token } => {
                    self.scheduler.schedule(delay_ms, token);
                }
                Effect::CancelScheduled(token) => self.scheduler.cancel(token),
                Effect::HandOff(passphrase) => {
                    self.operation.hand_off_passphrase(passphrase.to_string());
                }
                Effect::StartOperation(request) => self.operation.start_operation(request),
                Effect::Share(artifact) => self.operation.share_artifact(artifact),
                Effect::Save { artifact, filename } => {
                    self.operation.save_artifact(artifact, filename);
                }
            }
        }
    }
}
