//! File-backed vault: one sealed JSON entry per service, replaced by rename.
//!
//! The entry holds only ChaCha20-Poly1305 ciphertext. The key comes from the
//! [`AuthGate`] on every access and is never written next to the entry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zeroize::Zeroizing;

use super::{
    AuthGate, SealedSecret, SecretRecord, SecureVault, VaultError, VaultKey, VaultResult, LOAD_PROMPT, STORE_PROMPT,
};

#[derive(Debug, Serialize, Deserialize)]
struct VaultEntry {
    service: String,
    #[serde(flatten)]
    sealed: SealedSecret,
    stored_at: DateTime<Utc>,
}

pub struct FileVault {
    path: PathBuf,
    service: String,
    gate: Arc<dyn AuthGate>,
}

impl FileVault {
    pub fn new(path: impl Into<PathBuf>, service: impl Into<String>, gate: Arc<dyn AuthGate>) -> Self {
        Self { path: path.into(), service: service.into(), gate }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Whether an entry exists. Does not challenge and does not read the secret.
    pub fn exists(&self) -> bool { self.path.exists() }

    fn tmp_path(&self) -> PathBuf { self.path.with_extension("json.tmp") }

    async fn write_entry(&self, key: &VaultKey, secret: &SecretRecord) -> VaultResult<()> {
        let entry = VaultEntry {
            service: self.service.clone(),
            sealed: SealedSecret::seal(key, &self.service, secret)?,
            stored_at: Utc::now(),
        };
        let json = serde_json::to_vec_pretty(&entry).map_err(|e| VaultError::Unavailable(format!("encode: {e}")))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.tmp_path();
        if let Err(e) = tokio::fs::write(&tmp, &json).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_entry(&self, key: &VaultKey) -> VaultResult<SecretRecord> {
        let raw = Zeroizing::new(tokio::fs::read(&self.path).await?);
        let entry: VaultEntry = serde_json::from_slice(&raw)
            .map_err(|e| VaultError::Corrupt(format!("entry json: {e}")))?;
        if entry.service != self.service {
            return Err(VaultError::Corrupt(format!("entry belongs to service {}", entry.service)));
        }
        entry.sealed.open(key, &self.service)
    }
}

#[async_trait]
impl SecureVault for FileVault {
    async fn store(&self, secret: SecretRecord) -> VaultResult<()> {
        let key = self.gate.challenge(&STORE_PROMPT).await?;
        self.write_entry(&key, &secret).await?;
        tracing::info!(service = %self.service, "secret stored");
        Ok(())
    }

    async fn load(&self) -> VaultResult<Option<SecretRecord>> {
        if !tokio::fs::try_exists(&self.path).await? {
            tracing::info!(service = %self.service, "no secret stored");
            return Ok(None);
        }
        let key = self.gate.challenge(&LOAD_PROMPT).await?;
        let secret = self.read_entry(&key).await?;
        tracing::info!(service = %self.service, "secret loaded");
        Ok(Some(secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{GateOutcome, ScriptedGate};
    use base64::Engine;
    use tempfile::TempDir;

    fn vault(dir: &TempDir, gate: Arc<ScriptedGate>) -> FileVault {
        FileVault::new(dir.path().join("vault").join("eCashWallet.json"), "eCashWallet", gate)
    }

    #[tokio::test]
    async fn load_without_store_is_absent() {
        let dir = TempDir::new().expect("tempdir");
        let gate = Arc::new(ScriptedGate::allow());
        let vault = vault(&dir, gate.clone());

        assert!(vault.load().await.expect("load").is_none());
        assert_eq!(gate.challenges(), 0);
    }

    #[tokio::test]
    async fn store_then_load() {
        let dir = TempDir::new().expect("tempdir");
        let gate = Arc::new(ScriptedGate::allow());
        let vault = vault(&dir, gate.clone());

        vault.store(SecretRecord::from("legal winner thank year")).await.expect("store");
        vault.store(SecretRecord::from("letter advice cage absurd")).await.expect("overwrite");
        let loaded = vault.load().await.expect("load").expect("present");

        assert_eq!(loaded.as_str(), Some("letter advice cage absurd"));
        assert_eq!(gate.challenges(), 3);
        assert!(!dir.path().join("vault").join("eCashWallet.json.tmp").exists());
    }

    #[tokio::test]
    async fn copied_entry_is_useless_without_the_key() {
        let dir = TempDir::new().expect("tempdir");
        let key = [42u8; 32];
        let owner = vault(&dir, Arc::new(ScriptedGate::with_key(VaultKey::new(key))));
        owner.store(SecretRecord::from("legal winner thank year")).await.expect("store");

        let raw = std::fs::read(owner.path()).expect("read");
        assert!(!raw.windows(b"legal".len()).any(|w| w == b"legal"));
        let entry: serde_json::Value = serde_json::from_slice(&raw).expect("json");
        let ciphertext = base64::engine::general_purpose::STANDARD
            .decode(entry["ciphertext"].as_str().expect("ciphertext"))
            .expect("base64");
        assert!(!ciphertext.windows(b"legal".len()).any(|w| w == b"legal"));
        assert!(entry.get("secret").is_none());

        let thief = vault(&dir, Arc::new(ScriptedGate::allow()));
        assert!(matches!(thief.load().await, Err(VaultError::WrongKey)));

        let reopened = vault(&dir, Arc::new(ScriptedGate::with_key(VaultKey::new(key))));
        let loaded = reopened.load().await.expect("load").expect("present");
        assert_eq!(loaded.as_str(), Some("legal winner thank year"));
    }

    #[tokio::test]
    async fn rejected_store_keeps_prior_value() {
        let dir = TempDir::new().expect("tempdir");
        let gate = Arc::new(ScriptedGate::allow());
        let vault = vault(&dir, gate.clone());
        vault.store(SecretRecord::from("first")).await.expect("store");

        gate.set_outcome(GateOutcome::Reject);
        assert!(matches!(vault.store(SecretRecord::from("second")).await, Err(VaultError::Rejected)));

        gate.set_outcome(GateOutcome::Allow);
        let loaded = vault.load().await.expect("load").expect("present");
        assert_eq!(loaded.as_str(), Some("first"));
    }

    #[tokio::test]
    async fn cancelled_load_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let gate = Arc::new(ScriptedGate::allow());
        let vault = vault(&dir, gate.clone());
        vault.store(SecretRecord::from("seed")).await.expect("store");

        gate.set_outcome(GateOutcome::Cancel);
        assert!(matches!(vault.load().await, Err(VaultError::Cancelled)));
    }

    #[tokio::test]
    async fn tampered_entry_is_corrupt() {
        let dir = TempDir::new().expect("tempdir");
        let vault = vault(&dir, Arc::new(ScriptedGate::allow()));
        vault.store(SecretRecord::from("seed")).await.expect("store");

        let raw = std::fs::read_to_string(vault.path()).expect("read");
        let mut entry: serde_json::Value = serde_json::from_str(&raw).expect("json");
        entry["ciphertext"] = serde_json::json!(base64::engine::general_purpose::STANDARD.encode([0u8; 20]));
        std::fs::write(vault.path(), entry.to_string()).expect("write");

        assert!(matches!(vault.load().await, Err(VaultError::Corrupt(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_write_leaves_no_tmp_file() {
        let dir = TempDir::new().expect("tempdir");
        let vault = vault(&dir, Arc::new(ScriptedGate::allow()));
        let tmp = vault.tmp_path();
        std::fs::create_dir_all(dir.path().join("vault")).expect("mkdir");
        // Dangling link: the write fails after the tmp name is taken.
        std::os::unix::fs::symlink(dir.path().join("missing").join("target"), &tmp).expect("symlink");

        assert!(matches!(vault.store(SecretRecord::from("seed")).await, Err(VaultError::Io(_))));
        assert!(std::fs::symlink_metadata(&tmp).is_err());
        assert!(!vault.exists());
    }
}
