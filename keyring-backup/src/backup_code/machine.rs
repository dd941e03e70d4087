use zeroize::Zeroizing;

use super::error::{BackupCodeError, BackupCodeResult};
use super::input::InputBuffer;
use super::navigation::NavigationMarker;
use super::operation::{
    backup_filename, BackupArtifact, BackupRequest, DeliveryMode, DeliveryStep,
    OperationTracker, BACKUP_MIME_TYPE,
};
use super::presenter::{Notification, ScreenUpdate};
use super::scheduler::DeferredTasks;
use super::state::{SavedScreenState, VerificationState};
use super::{BackupCode, BackupCodeConfig, GROUP_COUNT};

/// Slot contents written by the debug override. Deliberately not the real code.
pub const DEBUG_FILL_PATTERN: [&str; GROUP_COUNT] = [
    "1234", "5678", "9012", "3456", "7890", "1234", "5678", "9012", "3456",
];

/// Passphrase used for the backup while the debug override is active.
pub const DEBUG_OVERRIDE_PASSPHRASE: &str = "1111-1111-1111-1111-1111-1111-1111-1111-1111";

/// A side effect for the host, produced by a transition.
///
/// The machine never calls the host itself; `BackupCodeVerifier` applies effects in order
/// after releasing its lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Draw the screen for a new state.
    Render(ScreenUpdate),
    /// Overwrite the input slot texts.
    SetInputText(Vec<String>),
    /// Show a notification.
    Notify(Notification),
    /// Add the input-state back-stack entry.
    PushInputEntry,
    /// Remove the input-state back-stack entry without a back transition.
    PopInputEntry,
    /// Pop one back-stack entry, like the system back action.
    PopBackStack,
    /// Start or stop listening to back-stack changes.
    ListenBackStack(bool),
    /// Schedule a deferred task.
    Schedule {
        /// Delay before the task fires.
        delay_ms: u64,
        /// Token the host passes back.
        token: u64,
    },
    /// Cancel a scheduled task.
    CancelScheduled(u64),
    /// Give the passphrase to the external caller.
    HandOff(Zeroizing<String>),
    /// Run the backup operation.
    StartOperation(BackupRequest),
    /// Open the share sheet for the artifact.
    Share(BackupArtifact),
    /// Save the artifact under the suggested name.
    Save {
        /// The backup file.
        artifact: BackupArtifact,
        /// Suggested file name.
        filename: String,
    },
}

/// The backup code verification state machine.
///
/// Pure data plus transition functions: every event returns the effects the host has to
/// perform. Invariant: the navigation marker is armed iff the state is `Input` or
/// `InputError`.
#[derive(Debug)]
pub struct VerifierMachine {
    code: BackupCode,
    config: BackupCodeConfig,
    state: VerificationState,
    input: InputBuffer,
    marker: NavigationMarker,
    deferred: DeferredTasks,
    operation: OperationTracker,
    hand_off_delivered: bool,
    debug_tools_allowed: bool,
    debug_override: bool,
}

impl VerifierMachine {
    /// A machine in the `Uninitialized` state.
    #[must_use]
    pub fn new(code: BackupCode, config: BackupCodeConfig, debug_tools_allowed: bool) -> Self {
        Self {
            code,
            config,
            state: VerificationState::Uninitialized,
            input: InputBuffer::new(),
            marker: NavigationMarker::default(),
            deferred: DeferredTasks::default(),
            operation: OperationTracker::default(),
            hand_off_delivered: false,
            debug_tools_allowed,
            debug_override: false,
        }
    }

    /// Screen created: `Uninitialized` -> `Display`.
    pub fn start(&mut self) -> Vec<Effect> {
        if self.state != VerificationState::Uninitialized {
            crate::debug!("start ignored in state {}", self.state);
            return Vec::new();
        }
        self.switch_state(VerificationState::Display, true)
    }

    /// Rebuilds a machine from saved state, without animations.
    ///
    /// `current_depth` is the host back-stack depth, used when the saved input state has no
    /// marker and the input entry has to be pushed again.
    ///
    /// # Errors
    /// - `BackupCodeError::InvalidSavedState` if `saved` breaks the state invariants.
    pub fn restore(
        code: BackupCode,
        config: BackupCodeConfig,
        debug_tools_allowed: bool,
        saved: &SavedScreenState,
        current_depth: u32,
    ) -> BackupCodeResult<(Self, Vec<Effect>)> {
        saved.validate()?;

        let mut machine = Self::new(code, config, debug_tools_allowed);
        machine.marker = NavigationMarker::from_depth(saved.navigation_marker);
        machine.operation = OperationTracker::with_cached(saved.cached_artifact.clone());
        machine.hand_off_delivered = saved.hand_off_delivered;

        let mut effects = Vec::new();
        if machine.marker.is_armed() {
            effects.push(Effect::ListenBackStack(true));
        }
        effects.extend(machine.switch_state_at(saved.state, false, current_depth));

        crate::info!(
            "restored state={} marker={:?} cached_artifact={} hand_off_delivered={}",
            machine.state,
            machine.marker.depth(),
            machine.operation.cached_artifact().is_some(),
            machine.hand_off_delivered
        );
        Ok((machine, effects))
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> VerificationState {
        self.state
    }

    /// Current navigation marker depth.
    #[must_use]
    pub const fn navigation_marker(&self) -> Option<u32> {
        self.marker.depth()
    }

    /// The groups of the code, for the display state.
    #[must_use]
    pub fn display_groups(&self) -> Vec<String> {
        self.code.groups().into_iter().map(str::to_string).collect()
    }

    /// Input slot texts.
    #[must_use]
    pub const fn input(&self) -> &InputBuffer {
        &self.input
    }

    /// Snapshot for process restoration.
    #[must_use]
    pub fn saved_state(&self) -> SavedScreenState {
        SavedScreenState {
            state: self.state,
            navigation_marker: self.marker.depth(),
            cached_artifact: self.operation.cached_artifact().cloned(),
            hand_off_delivered: self.hand_off_delivered,
        }
    }

    /// "Enter code" tapped: `Display` -> `Input`.
    pub fn enter_code(&mut self, current_depth: u32) -> Vec<Effect> {
        if self.state != VerificationState::Display {
            crate::debug!("enter code ignored in state {}", self.state);
            return Vec::new();
        }
        self.switch_state_at(VerificationState::Input, true, current_depth)
    }

    /// Text of slot `index` changed. Returns the slot to focus next.
    ///
    /// # Errors
    /// - `BackupCodeError::InvalidSlotIndex` if `index >= 9`.
    ///
    /// # Panics
    /// If `text` is longer than 4 characters.
    pub fn update_slot(
        &mut self,
        index: u32,
        text: &str,
    ) -> BackupCodeResult<(Option<u32>, Vec<Effect>)> {
        let slot = usize::try_from(index)
            .ok()
            .filter(|slot| *slot < GROUP_COUNT)
            .ok_or(BackupCodeError::InvalidSlotIndex { index })?;

        if self.state == VerificationState::Confirmed {
            crate::debug!("slot {index} edit ignored, code already confirmed");
            return Ok((None, Vec::new()));
        }

        let edit = self.input.set_slot(slot, text);
        // usize -> u32 cannot truncate, slots are < GROUP_COUNT
        let focus = InputBuffer::next_focus(slot, edit).and_then(|next| u32::try_from(next).ok());

        if !self.state.is_input() || !edit.completed {
            return Ok((focus, Vec::new()));
        }

        Ok((focus, self.check_code()))
    }

    /// In-screen "back" tapped while typing.
    pub fn go_back(&mut self) -> Vec<Effect> {
        if !self.state.is_input() {
            crate::debug!("back ignored in state {}", self.state);
            return Vec::new();
        }
        vec![Effect::PopBackStack]
    }

    /// The host back-stack changed; returns to `Display` once it is back at the marker.
    pub fn on_back_stack_changed(&mut self, current_depth: u32) -> Vec<Effect> {
        if !self.marker.is_reached(current_depth) {
            return Vec::new();
        }
        self.marker.disarm();

        let mut effects = vec![Effect::ListenBackStack(false)];
        effects.extend(self.switch_state(VerificationState::Display, true));
        effects
    }

    /// Save or share tapped after confirmation.
    ///
    /// # Errors
    /// - `BackupCodeError::NotConfirmed` before the code was confirmed.
    pub fn request_delivery(&mut self, mode: DeliveryMode) -> BackupCodeResult<Vec<Effect>> {
        if self.state != VerificationState::Confirmed {
            return Err(BackupCodeError::NotConfirmed);
        }

        if !self.config.execute_backup_operation {
            return Ok(self.deliver_hand_off());
        }

        let effects = match self.operation.request(mode) {
            DeliveryStep::Start => {
                crate::info!(
                    "starting backup operation keys={} export_secret={}",
                    crate::primitives::format_key_ids(&self.config.master_key_ids),
                    self.config.export_secret
                );
                vec![Effect::StartOperation(self.backup_request())]
            }
            DeliveryStep::Wait => {
                crate::debug!("backup operation in flight, delivery {mode:?} queued");
                Vec::new()
            }
            DeliveryStep::Deliver(artifact) => vec![self.delivery(mode, artifact)],
        };
        Ok(effects)
    }

    /// The backup operation produced `artifact`.
    pub fn on_operation_succeeded(&mut self, artifact: BackupArtifact) -> Vec<Effect> {
        if !self.operation.is_in_flight() {
            crate::warn!("operation result without a running operation, caching it anyway");
        }
        match self.operation.succeed(artifact.clone()) {
            Some(mode) => vec![self.delivery(mode, artifact)],
            None => Vec::new(),
        }
    }

    /// The backup operation failed with a user-displayable `reason`.
    pub fn on_operation_failed(&mut self, reason: String) -> Vec<Effect> {
        crate::warn!("backup operation failed");
        self.operation.reset();
        vec![Effect::Notify(Notification::error(reason))]
    }

    /// The backup operation was cancelled by the user.
    pub fn on_operation_cancelled(&mut self) -> Vec<Effect> {
        crate::info!("backup operation cancelled");
        self.operation.reset();
        Vec::new()
    }

    /// A deferred task fired.
    pub fn on_deferred_task(&mut self, token: u64) -> Vec<Effect> {
        if !self.deferred.take_if_current(token) {
            crate::debug!("stale deferred task {token} ignored");
            return Vec::new();
        }
        self.deliver_hand_off()
    }

    /// Turns the "accept any code" development override on or off.
    ///
    /// Turning it on with empty slots fills them with [`DEBUG_FILL_PATTERN`]; while typing,
    /// that immediately confirms.
    ///
    /// # Errors
    /// - `BackupCodeError::DebugToolsUnavailable` unless debug tools are allowed.
    pub fn set_debug_override(&mut self, enabled: bool) -> BackupCodeResult<Vec<Effect>> {
        if !self.debug_tools_allowed {
            return Err(BackupCodeError::DebugToolsUnavailable);
        }
        self.debug_override = enabled;
        crate::warn!("debug override {}", if enabled { "enabled" } else { "disabled" });

        if !enabled
            || self.state == VerificationState::Confirmed
            || !self.input.slot(0).is_empty()
        {
            return Ok(Vec::new());
        }

        self.input.fill(&DEBUG_FILL_PATTERN);
        let mut effects = vec![
            Effect::SetInputText(self.input.to_vec()),
            Effect::Notify(Notification::warn("Actual backup code is all '1's")),
        ];
        if self.state.is_input() {
            effects.extend(self.check_code());
        }
        Ok(effects)
    }

    /// Screen destroyed: drops the pending hand-off and the back-stack listener.
    pub fn dispose(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(token) = self.deferred.cancel() {
            effects.push(Effect::CancelScheduled(token));
        }
        if self.marker.is_armed() {
            effects.push(Effect::ListenBackStack(false));
        }
        effects
    }

    /// Compares the buffer with the code once every slot is complete.
    fn check_code(&mut self) -> Vec<Effect> {
        if self.debug_override {
            return self.switch_state(VerificationState::Confirmed, true);
        }

        let Some(candidate) = self.input.joined() else {
            return Vec::new();
        };

        if self.code.matches(&candidate) {
            self.switch_state(VerificationState::Confirmed, true)
        } else {
            self.switch_state(VerificationState::InputError, true)
        }
    }

    fn switch_state(&mut self, target: VerificationState, animate: bool) -> Vec<Effect> {
        // the depth is only read while the marker is unarmed, which happens through switch_state_at
        self.switch_state_at(target, animate, 0)
    }

    /// Enters `target`. The single place `self.state` changes.
    ///
    /// # Panics
    /// If `target` is `Uninitialized`.
    fn switch_state_at(
        &mut self,
        target: VerificationState,
        animate: bool,
        current_depth: u32,
    ) -> Vec<Effect> {
        assert!(
            target != VerificationState::Uninitialized,
            "can't switch to uninitialized state, this is a bug!"
        );

        crate::info!("state {} -> {}", self.state, target);

        let external_hand_off = !self.config.execute_backup_operation;
        let mut effects = vec![Effect::Render(ScreenUpdate::for_state(
            target,
            animate,
            external_hand_off,
        ))];

        match target {
            VerificationState::Uninitialized | VerificationState::Display => {}
            VerificationState::Input | VerificationState::InputError => {
                if target == VerificationState::Input {
                    self.input.clear();
                }
                // no-op while the marker is armed, e.g. Input -> InputError
                if self.marker.arm(current_depth) {
                    effects.push(Effect::PushInputEntry);
                    effects.push(Effect::ListenBackStack(true));
                }
            }
            VerificationState::Confirmed => {
                if self.marker.disarm().is_some() {
                    effects.push(Effect::ListenBackStack(false));
                    effects.push(Effect::PopInputEntry);
                }
                if external_hand_off && !self.hand_off_delivered {
                    let (token, replaced) = self.deferred.schedule();
                    if let Some(replaced) = replaced {
                        effects.push(Effect::CancelScheduled(replaced));
                    }
                    effects.push(Effect::Schedule {
                        delay_ms: self.config.hand_off_delay_ms,
                        token,
                    });
                }
            }
        }

        self.state = target;
        effects
    }

    /// Hands the passphrase off, at most once per screen.
    fn deliver_hand_off(&mut self) -> Vec<Effect> {
        if self.hand_off_delivered {
            crate::debug!("passphrase already handed off");
            return Vec::new();
        }
        let mut effects = Vec::new();
        // a manual request can overtake the timer
        if let Some(token) = self.deferred.cancel() {
            effects.push(Effect::CancelScheduled(token));
        }
        self.hand_off_delivered = true;
        crate::info!("handing off confirmed passphrase");
        effects.push(Effect::HandOff(self.passphrase()));
        effects
    }

    fn passphrase(&self) -> Zeroizing<String> {
        if self.debug_override {
            Zeroizing::new(DEBUG_OVERRIDE_PASSPHRASE.to_string())
        } else {
            self.code.to_passphrase()
        }
    }

    fn backup_request(&self) -> BackupRequest {
        BackupRequest {
            passphrase: self.passphrase().to_string(),
            master_key_ids: self.config.master_key_ids.clone(),
            export_secret: self.config.export_secret,
            filename: self.filename(),
            mime_type: BACKUP_MIME_TYPE.to_string(),
        }
    }

    fn delivery(&self, mode: DeliveryMode, artifact: BackupArtifact) -> Effect {
        match mode {
            DeliveryMode::Share => Effect::Share(artifact),
            DeliveryMode::Save => Effect::Save {
                artifact,
                filename: self.filename(),
            },
        }
    }

    fn filename(&self) -> String {
        backup_filename(
            self.config.export_secret,
            chrono::Utc::now().date_naive(),
        )
    }
}
