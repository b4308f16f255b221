//! Host - the native side's bridge handler.
//!
//! One message at a time, in arrival order. Vault access is awaited inline,
//! so at most one secret request is ever in flight.
//!
//! | Kind | Effect |
//! |------|--------|
//! | `LOG` | re-logged under the `runtime` target |
//! | `TERMINATE_HOST` | terminate, forceful first |
//! | `TRANSACTION_FINALIZED` | haptic feedback; failure only logged |
//! | `STORE_SECRET` | vault store; failure terminates |
//! | `LOAD_SECRET_REQUEST` | vault load → `LOAD_SECRET_RESPONSE`; failure terminates |
//! | anything else | logged and ignored |

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::bridge::{BridgeHandler, BridgeMessage, BridgeSender, MessageKind};
use crate::config::IntentConfig;
use crate::intent::{DeferredIntentQueue, ReadinessProbe};
use crate::terminate::{TerminationReason, Terminator};
use crate::vault::{SecretRecord, SecureVault};

/// Local notification side effect for a finalized transaction.
pub trait Haptics: Send + Sync {
    fn transaction_feedback(&self) -> anyhow::Result<()>;
}

/// Haptics for hosts without a vibration motor: just a log line.
pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn transaction_feedback(&self) -> anyhow::Result<()> {
        tracing::info!("transaction finalized");
        Ok(())
    }
}

pub struct Host {
    vault: Arc<dyn SecureVault>,
    terminator: Terminator,
    haptics: Arc<dyn Haptics>,
    to_runtime: BridgeSender,
}

impl Host {
    pub fn new(vault: Arc<dyn SecureVault>, terminator: Terminator, haptics: Arc<dyn Haptics>, to_runtime: BridgeSender) -> Self {
        Self { vault, terminator, haptics, to_runtime }
    }

    pub fn terminator(&self) -> &Terminator { &self.terminator }

    /// Deferred intent queue emitting `PAYMENT_REQUEST` on this host's bridge.
    pub fn intent_queue(&self, config: IntentConfig, probe: Arc<dyn ReadinessProbe>) -> DeferredIntentQueue {
        DeferredIntentQueue::new(config, probe, Arc::new(self.to_runtime.clone()))
    }

    async fn store_secret(&self, payload: &Value) {
        let Some(secret) = payload.as_str().filter(|s| !s.is_empty()) else {
            tracing::warn!("STORE_SECRET without data ignored");
            return;
        };
        if let Err(e) = self.vault.store(SecretRecord::from(secret)).await {
            self.terminator.terminate(TerminationReason::VaultStoreFailed(e.to_string()));
        }
    }

    async fn load_secret(&self) {
        match self.vault.load().await {
            Ok(secret) => {
                if secret.is_none() {
                    tracing::info!("no secret stored, answering not-found");
                }
                self.to_runtime.send(&BridgeMessage::load_secret_response(secret.as_ref()));
            }
            Err(e) => {
                self.terminator.terminate(TerminationReason::VaultLoadFailed(e.to_string()));
            }
        }
    }
}

#[async_trait]
impl BridgeHandler for Host {
    async fn handle(&mut self, message: BridgeMessage) {
        if self.terminator.has_fired() {
            tracing::debug!(kind = message.kind.tag(), "host terminated, message dropped");
            return;
        }
        match &message.kind {
            MessageKind::Log => match &message.payload {
                Value::String(text) => tracing::info!(target: "runtime", "{text}"),
                other => tracing::info!(target: "runtime", "{other}"),
            },
            MessageKind::TerminateHost => {
                self.terminator.terminate(TerminationReason::RuntimeRequest);
            }
            MessageKind::TransactionFinalized => {
                if let Err(e) = self.haptics.transaction_feedback() {
                    tracing::warn!(error = %e, "haptic feedback failed");
                }
            }
            MessageKind::StoreSecret => self.store_secret(&message.payload).await,
            MessageKind::LoadSecretRequest => self.load_secret().await,
            MessageKind::LoadSecretResponse | MessageKind::PaymentRequest => {
                tracing::warn!(kind = message.kind.tag(), "host-to-runtime kind received by host, ignored");
            }
            MessageKind::Unknown(tag) => {
                tracing::info!(kind = %tag, "unknown bridge message kind ignored");
            }
        }
    }
}
