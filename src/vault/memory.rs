//! In-memory vault and a scripted authentication gate, for tests and embedding.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    AuthGate, AuthPrompt, SecretRecord, SecureVault, VaultError, VaultKey, VaultResult, LOAD_PROMPT, STORE_PROMPT,
};

/// Answer a [`ScriptedGate`] gives to the next challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GateOutcome {
    Allow = 0,
    Reject = 1,
    Cancel = 2,
}

impl GateOutcome {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => GateOutcome::Allow,
            2 => GateOutcome::Cancel,
            _ => GateOutcome::Reject,
        }
    }
}

/// Gate whose answer is set by the test. An allowed challenge releases a fixed key.
#[derive(Debug)]
pub struct ScriptedGate {
    key: VaultKey,
    outcome: AtomicU8,
    challenges: AtomicUsize,
}

impl ScriptedGate {
    pub fn allow() -> Self { Self::with_outcome(GateOutcome::Allow) }
    pub fn reject() -> Self { Self::with_outcome(GateOutcome::Reject) }
    pub fn cancel() -> Self { Self::with_outcome(GateOutcome::Cancel) }

    /// Allowing gate releasing `key`, e.g. to reopen a vault in a later process.
    pub fn with_key(key: VaultKey) -> Self {
        Self { key, outcome: AtomicU8::new(GateOutcome::Allow as u8), challenges: AtomicUsize::new(0) }
    }

    fn with_outcome(outcome: GateOutcome) -> Self {
        let gate = Self::with_key(VaultKey::generate());
        gate.set_outcome(outcome);
        gate
    }

    pub fn set_outcome(&self, outcome: GateOutcome) { self.outcome.store(outcome as u8, Ordering::SeqCst); }
    pub fn outcome(&self) -> GateOutcome { GateOutcome::from_u8(self.outcome.load(Ordering::SeqCst)) }
    pub fn challenges(&self) -> usize { self.challenges.load(Ordering::SeqCst) }
}

#[async_trait]
impl AuthGate for ScriptedGate {
    async fn challenge(&self, prompt: &AuthPrompt) -> VaultResult<VaultKey> {
        self.challenges.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(title = prompt.title, "authentication challenge");
        match self.outcome() {
            GateOutcome::Allow => Ok(self.key.clone()),
            GateOutcome::Cancel => Err(VaultError::Cancelled),
            GateOutcome::Reject => Err(VaultError::Rejected),
        }
    }
}

pub struct MemoryVault {
    slot: Mutex<Option<SecretRecord>>,
    gate: Arc<dyn AuthGate>,
}

impl MemoryVault {
    pub fn new(gate: Arc<dyn AuthGate>) -> Self {
        Self { slot: Mutex::new(None), gate }
    }

    /// Peek at the slot without a challenge.
    pub fn contains(&self) -> bool {
        self.slot.lock().map(|s| s.is_some()).unwrap_or(false)
    }
}

#[async_trait]
impl SecureVault for MemoryVault {
    async fn store(&self, secret: SecretRecord) -> VaultResult<()> {
        self.gate.challenge(&STORE_PROMPT).await?;
        let mut slot = self.slot.lock().map_err(|_| VaultError::Unavailable("vault lock".into()))?;
        *slot = Some(secret);
        Ok(())
    }

    async fn load(&self) -> VaultResult<Option<SecretRecord>> {
        if !self.contains() {
            return Ok(None);
        }
        self.gate.challenge(&LOAD_PROMPT).await?;
        let slot = self.slot.lock().map_err(|_| VaultError::Unavailable("vault lock".into()))?;
        Ok(slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_vault_loads_absent_without_prompt() {
        let gate = Arc::new(ScriptedGate::reject());
        let vault = MemoryVault::new(gate.clone());
        assert!(vault.load().await.expect("absent is not an error").is_none());
        assert_eq!(gate.challenges(), 0);
    }

    #[tokio::test]
    async fn rejected_store_leaves_slot_empty() {
        let vault = MemoryVault::new(Arc::new(ScriptedGate::reject()));
        assert!(vault.store(SecretRecord::from("seed")).await.is_err());
        assert!(!vault.contains());
    }

    #[tokio::test]
    async fn outcome_switches_between_challenges() {
        let gate = ScriptedGate::allow();
        assert!(gate.challenge(&LOAD_PROMPT).await.is_ok());

        gate.set_outcome(GateOutcome::Cancel);
        assert_eq!(gate.outcome(), GateOutcome::Cancel);
        assert!(matches!(gate.challenge(&LOAD_PROMPT).await, Err(VaultError::Cancelled)));

        gate.set_outcome(GateOutcome::Reject);
        assert!(matches!(gate.challenge(&LOAD_PROMPT).await, Err(VaultError::Rejected)));
        assert_eq!(gate.challenges(), 3);
    }
}
