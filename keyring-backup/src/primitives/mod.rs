use std::fmt::Display;

/// Global configuration (environment, debug tooling).
pub mod config;

/// Device key-value storage implemented by the host.
pub mod key_value_store;

/// Logging that forwards to the host's logger.
pub mod logger;

/// Identifier of a PGP master key, as stored by the host's key database.
///
/// Displayed as the 16-digit hex key id (`0x` prefixed), which is how key ids are shown to
/// users and written to logs.
///
/// # Examples
/// ```
/// use keyring_backup::primitives::MasterKeyId;
/// assert_eq!(MasterKeyId::new(0xABCD).to_string(), "0x000000000000abcd");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MasterKeyId(u64);

impl MasterKeyId {
    /// Wraps a raw key id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for MasterKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.to_be_bytes()))
    }
}

/// Renders key ids as a comma separated list for log lines.
#[must_use]
pub fn format_key_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| MasterKeyId::new(*id).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_key_id_display() {
        let id = MasterKeyId::new(0x1234_5678_90ab_cdef);
        assert_eq!(id.to_string(), "0x1234567890abcdef");
        assert_eq!(MasterKeyId::new(1).to_string(), "0x0000000000000001");
    }

    #[test]
    fn test_format_key_ids() {
        assert_eq!(format_key_ids(&[]), "");
        assert_eq!(
            format_key_ids(&[1, 0xff]),
            "0x0000000000000001,0x00000000000000ff"
        );
    }
}
