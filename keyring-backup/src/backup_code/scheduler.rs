/// Deferred callbacks on the host's UI thread (a `Handler.postDelayed` on Android, a
/// `DispatchQueue.main.asyncAfter` on iOS).
///
/// When the delay expires the host calls
/// [`BackupCodeVerifier::on_deferred_task`](super::BackupCodeVerifier::on_deferred_task)
/// with the same token. Tokens the verifier has since cancelled are ignored, so a host that
/// cannot cancel its timer may still fire it.
#[uniffi::export(with_foreign)]
pub trait DeferredScheduler: Send + Sync {
    /// Schedules `token` to fire after `delay_ms`.
    fn schedule(&self, delay_ms: u64, token: u64);

    /// Best-effort cancellation of a scheduled token.
    fn cancel(&self, token: u64);
}

/// Token bookkeeping for the single deferred task a screen may have pending.
#[derive(Debug, Default, Clone)]
pub struct DeferredTasks {
    next_token: u64,
    pending: Option<u64>,
}

impl DeferredTasks {
    /// Allocates a token for a new task, replacing any pending one.
    ///
    /// Returns the new token and the replaced one, if any.
    pub fn schedule(&mut self) -> (u64, Option<u64>) {
        self.next_token = self.next_token.wrapping_add(1);
        let replaced = self.pending.replace(self.next_token);
        (self.next_token, replaced)
    }

    /// Cancels the pending task, returning its token.
    pub fn cancel(&mut self) -> Option<u64> {
        self.pending.take()
    }

    /// Consumes the pending task if `token` is the current one.
    pub fn take_if_current(&mut self, token: u64) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Whether a task is pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_tokens_are_ignored() {
        let mut tasks = DeferredTasks::default();
        let (first, replaced) = tasks.schedule();
        assert_eq!(replaced, None);

        let (second, replaced) = tasks.schedule();
        assert_eq!(replaced, Some(first));
        assert_ne!(first, second);

        assert!(!tasks.take_if_current(first));
        assert!(tasks.take_if_current(second));
        // fires once
        assert!(!tasks.take_if_current(second));
    }

    #[test]
    fn test_cancel() {
        let mut tasks = DeferredTasks::default();
        let (token, _) = tasks.schedule();
        assert!(tasks.is_pending());
        assert_eq!(tasks.cancel(), Some(token));
        assert!(!tasks.take_if_current(token));
        assert_eq!(tasks.cancel(), None);
    }
}
