//! Error handling utilities
//!
//! Error enums in this crate combine strongly typed variants for the cases callers handle
//! with a `Generic { message }` catch-all fed from `anyhow` chains. Declare them with the
//! [`backup_error`] attribute.

pub use keyring_backup_macros::backup_error;

/// Re-export anyhow for convenience
pub use anyhow;

/// Flattens an `anyhow` error chain into a single displayable message.
///
/// Backs the `From<anyhow::Error>` conversion generated by [`backup_error`].
pub trait AnyhowErrorExt {
    /// Convert an anyhow error to a string, preserving the error chain
    fn to_generic_message(self) -> String;

    /// Convert an anyhow error to a string with a custom prefix
    fn to_generic_message_with_prefix(self, prefix: &str) -> String;
}

impl AnyhowErrorExt for anyhow::Error {
    fn to_generic_message(self) -> String {
        let mut message = self.to_string();
        let chain: Vec<String> = self.chain().skip(1).map(ToString::to_string).collect();
        if !chain.is_empty() {
            message.push_str(" (caused by: ");
            message.push_str(&chain.join(" -> "));
            message.push(')');
        }
        message
    }

    fn to_generic_message_with_prefix(self, prefix: &str) -> String {
        format!("{prefix}: {}", self.to_generic_message())
    }
}
