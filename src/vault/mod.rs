//! Secure Vault - authentication-gated custody of the wallet secret.
//!
//! One secret per installation, keyed by a fixed service identifier. Every
//! access runs a fresh authentication challenge; there is no session unlock.
//! The challenge releases the sealing key, so a copied vault file is
//! useless without the platform authenticator.
//!
//! # Contract
//!
//! | Operation | Success | Failure |
//! |-----------|---------|---------|
//! | `store(secret)` | secret replaced atomically | `VaultError`, prior value intact |
//! | `load()` | `Some(secret)` or `None` if never stored | `VaultError` |
//!
//! Callers treat every `VaultError` as fatal and terminate the host
//! (see [`crate::terminate::Terminator`]). Cancelling the platform prompt
//! is a failure like any other.

mod error;
mod file;
pub mod memory;
mod seal;

pub use error::{VaultError, VaultResult};
pub use file::FileVault;
pub use memory::{GateOutcome, MemoryVault, ScriptedGate};
pub use seal::{SealedSecret, VaultKey};

use async_trait::async_trait;
use std::fmt;
use zeroize::Zeroizing;

/// Opaque secret blob (the wallet seed material). Zeroed on drop, redacted in `Debug`.
#[derive(Clone)]
pub struct SecretRecord(Zeroizing<Vec<u8>>);

impl SecretRecord {
    pub fn new(bytes: Vec<u8>) -> Self { Self(Zeroizing::new(bytes)) }
    pub fn as_bytes(&self) -> &[u8] { &self.0 }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    /// The secret as text, if it is UTF-8 (mnemonics are).
    pub fn as_str(&self) -> Option<&str> { std::str::from_utf8(&self.0).ok() }
}

impl From<&str> for SecretRecord {
    fn from(value: &str) -> Self { Self::new(value.as_bytes().to_vec()) }
}

impl PartialEq for SecretRecord {
    fn eq(&self, other: &Self) -> bool { self.as_bytes() == other.as_bytes() }
}

impl Eq for SecretRecord {}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretRecord(<{} bytes redacted>)", self.0.len())
    }
}

/// Text shown by the platform authentication prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPrompt {
    pub title: &'static str,
    pub description: &'static str,
    pub cancel: &'static str,
}

pub const STORE_PROMPT: AuthPrompt = AuthPrompt {
    title: "Authenticate to store your wallet private key",
    description: "This is required to store your private key to the device secure storage",
    cancel: "Close the wallet",
};

pub const LOAD_PROMPT: AuthPrompt = AuthPrompt {
    title: "Authenticate to access your wallet",
    description: "This is required to load your private key from the secure storage",
    cancel: "Close the wallet",
};

/// Platform authentication gate (biometrics, device credential).
///
/// A passed challenge releases the key held by the platform keystore.
/// A challenge, once dispatched, cannot be cancelled by the caller.
#[async_trait]
pub trait AuthGate: Send + Sync {
    async fn challenge(&self, prompt: &AuthPrompt) -> VaultResult<VaultKey>;
}

#[async_trait]
pub trait SecureVault: Send + Sync {
    async fn store(&self, secret: SecretRecord) -> VaultResult<()>;
    async fn load(&self) -> VaultResult<Option<SecretRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let secret = SecretRecord::from("abandon abandon about");
        let printed = format!("{secret:?}");
        assert!(!printed.contains("abandon"));
        assert!(printed.contains("21 bytes"));
    }

    #[test]
    fn text_view() {
        assert_eq!(SecretRecord::from("seed words").as_str(), Some("seed words"));
        assert_eq!(SecretRecord::new(vec![0xff, 0xfe]).as_str(), None);
    }
}
