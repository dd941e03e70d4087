use super::state::VerificationState;

/// Which action bar sits under the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum StatusPanel {
    /// "Enter code" button under the displayed code.
    DisplayActions,
    /// Hint while the user types. Also shown after confirmation when the passphrase is handed
    /// off externally.
    InputPrompt,
    /// "Codes don't match" message.
    InputError,
    /// Save and share buttons after confirmation.
    BackupActions,
}

/// Colour the input text flashes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FlashColor {
    /// Mismatch.
    Error,
    /// Match.
    Success,
}

/// Text colour flash over the input slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Record)]
pub struct TextFlash {
    /// Target colour.
    pub color: FlashColor,
    /// Number of reversals; the flash ends on the target colour when `keep_final_color`.
    pub repeat_count: u32,
    /// Duration of one pass.
    pub duration_ms: u64,
    /// Leave the text in the target colour afterwards.
    pub keep_final_color: bool,
}

impl TextFlash {
    const PASS_DURATION_MS: u64 = 180;

    /// Flash back to the normal colour after a mismatch.
    #[must_use]
    pub const fn error() -> Self {
        Self {
            color: FlashColor::Error,
            repeat_count: 5,
            duration_ms: Self::PASS_DURATION_MS,
            keep_final_color: false,
        }
    }

    /// Flash ending on the success colour.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            color: FlashColor::Success,
            repeat_count: 4,
            duration_ms: Self::PASS_DURATION_MS,
            keep_final_color: true,
        }
    }
}

/// Everything the host needs to draw after a state change.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct ScreenUpdate {
    /// The state just entered.
    pub state: VerificationState,
    /// Animate the switch (false when restoring).
    pub animate: bool,
    /// Action bar to show.
    pub status: StatusPanel,
    /// Show the input slots instead of the displayed code.
    pub show_input_fields: bool,
    /// Empty the input slots.
    pub clear_inputs: bool,
    /// Input slots accept edits.
    pub inputs_enabled: bool,
    /// Hide the soft keyboard.
    pub dismiss_keyboard: bool,
    /// Flash to run over the input text.
    pub flash: Option<TextFlash>,
    /// Set the input text to the success colour without animation.
    pub highlight_success: bool,
}

impl ScreenUpdate {
    /// The update for entering `state`.
    ///
    /// `external_hand_off` selects the status panel after confirmation.
    ///
    /// # Panics
    /// If `state` is `Uninitialized`.
    #[must_use]
    pub fn for_state(state: VerificationState, animate: bool, external_hand_off: bool) -> Self {
        let base = Self {
            state,
            animate,
            status: StatusPanel::DisplayActions,
            show_input_fields: false,
            clear_inputs: false,
            inputs_enabled: true,
            dismiss_keyboard: false,
            flash: None,
            highlight_success: false,
        };

        match state {
            VerificationState::Uninitialized => {
                panic!("can't render the uninitialized state, this is a bug!")
            }
            VerificationState::Display => base,
            VerificationState::Input => Self {
                status: StatusPanel::InputPrompt,
                show_input_fields: true,
                clear_inputs: true,
                ..base
            },
            VerificationState::InputError => Self {
                status: StatusPanel::InputError,
                show_input_fields: true,
                dismiss_keyboard: true,
                flash: animate.then(TextFlash::error),
                ..base
            },
            VerificationState::Confirmed => Self {
                status: if external_hand_off {
                    StatusPanel::InputPrompt
                } else {
                    StatusPanel::BackupActions
                },
                show_input_fields: true,
                inputs_enabled: false,
                dismiss_keyboard: true,
                flash: animate.then(TextFlash::success),
                highlight_success: !animate,
                ..base
            },
        }
    }
}

/// Severity of a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum NotificationStyle {
    /// Informational.
    Ok,
    /// Warning.
    Warn,
    /// Failure.
    Error,
}

/// A message for the host to show (snackbar/toast).
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct Notification {
    /// Severity.
    pub style: NotificationStyle,
    /// User-displayable text.
    pub message: String,
}

impl Notification {
    /// Error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            style: NotificationStyle::Error,
            message: message.into(),
        }
    }

    /// Warning notification.
    #[must_use]
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            style: NotificationStyle::Warn,
            message: message.into(),
        }
    }
}

/// Presentation layer of the backup code screen, implemented by the host.
///
/// The verifier owns all state; the renderer only draws what it is told.
#[uniffi::export(with_foreign)]
pub trait ScreenRenderer: Send + Sync {
    /// Draws the screen for a newly entered state.
    fn render(&self, update: ScreenUpdate);

    /// Replaces the text of all 9 input slots.
    fn set_input_text(&self, slots: Vec<String>);

    /// Shows a notification.
    fn notify(&self, notification: Notification);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_update_clears_fields() {
        let update = ScreenUpdate::for_state(VerificationState::Input, true, false);
        assert_eq!(update.status, StatusPanel::InputPrompt);
        assert!(update.show_input_fields);
        assert!(update.clear_inputs);
        assert!(update.inputs_enabled);
        assert_eq!(update.flash, None);
    }

    #[test]
    fn test_error_update_flashes_only_when_animated() {
        let update = ScreenUpdate::for_state(VerificationState::InputError, true, false);
        assert_eq!(update.flash, Some(TextFlash::error()));
        assert!(update.dismiss_keyboard);
        assert!(!update.clear_inputs);

        let restored = ScreenUpdate::for_state(VerificationState::InputError, false, false);
        assert_eq!(restored.flash, None);
    }

    #[test]
    fn test_confirmed_update() {
        let update = ScreenUpdate::for_state(VerificationState::Confirmed, true, false);
        assert_eq!(update.status, StatusPanel::BackupActions);
        assert!(!update.inputs_enabled);
        assert_eq!(update.flash, Some(TextFlash::success()));
        assert!(!update.highlight_success);

        let restored = ScreenUpdate::for_state(VerificationState::Confirmed, false, true);
        assert_eq!(restored.status, StatusPanel::InputPrompt);
        assert_eq!(restored.flash, None);
        assert!(restored.highlight_success);
    }

    #[test]
    #[should_panic(expected = "uninitialized")]
    fn test_uninitialized_cannot_be_rendered() {
        let _ = ScreenUpdate::for_state(VerificationState::Uninitialized, true, false);
    }
}
