/// The host's back-stack, as seen by the backup code screen.
///
/// Entering the input state adds a back-stack entry so the system back action returns to the
/// displayed code instead of leaving the screen. The verifier listens for back-stack changes
/// only while that entry exists.
#[uniffi::export(with_foreign)]
pub trait NavigationHost: Send + Sync {
    /// Number of entries currently on the back-stack.
    fn back_stack_depth(&self) -> u32;

    /// Adds the entry for the input state.
    fn push_input_entry(&self);

    /// Pops the input entry (inclusive) without treating it as a user back action.
    fn pop_input_entry(&self);

    /// Pops one entry, as the in-screen "back" button does.
    fn pop_back_stack(&self);

    /// Starts or stops delivering back-stack changes to
    /// [`BackupCodeVerifier::on_back_stack_changed`](super::BackupCodeVerifier::on_back_stack_changed).
    fn set_back_stack_listener(&self, enabled: bool);
}

/// Back-stack depth saved when the input entry was pushed.
///
/// Set iff the screen is in `Input` or `InputError`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationMarker(Option<u32>);

impl NavigationMarker {
    /// A marker restored from saved state.
    #[must_use]
    pub const fn from_depth(depth: Option<u32>) -> Self {
        Self(depth)
    }

    /// Records `depth`. Returns `false` if a marker was already set, which is left unchanged.
    pub fn arm(&mut self, depth: u32) -> bool {
        if self.0.is_some() {
            return false;
        }
        self.0 = Some(depth);
        true
    }

    /// Clears the marker, returning the recorded depth.
    pub fn disarm(&mut self) -> Option<u32> {
        self.0.take()
    }

    /// Whether the back-stack has been unwound to the recorded depth.
    #[must_use]
    pub fn is_reached(&self, current_depth: u32) -> bool {
        self.0 == Some(current_depth)
    }

    /// The recorded depth.
    #[must_use]
    pub const fn depth(&self) -> Option<u32> {
        self.0
    }

    /// Whether a depth is recorded.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.0.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_arms_once() {
        let mut marker = NavigationMarker::default();
        assert!(marker.arm(2));
        assert!(!marker.arm(5));
        assert_eq!(marker.depth(), Some(2));

        assert!(!marker.is_reached(3));
        assert!(marker.is_reached(2));

        assert_eq!(marker.disarm(), Some(2));
        assert!(!marker.is_armed());
        assert!(!marker.is_reached(2));
    }
}
