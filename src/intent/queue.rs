//! Deferred Intent Queue - holds one payment URI until the runtime can take it.
//!
//! ```text
//! IDLE ──capture──▶ CAPTURED ──resume/poll──▶ DELIVERING ──emit ok──▶ DELIVERED
//!   ▲                  ▲                          │
//!   └──────────────────┴──── new capture ─────────┤ (last wins)
//!                                                 └──budget spent──▶ EXPIRED
//! ```
//!
//! Delivery is a spawned task that polls the readiness probe every
//! `poll_interval`. It emits once the runtime has been reachable for
//! `min_ready_polls` consecutive polls, and gives up after `max_attempts`.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::{AbortHandle, JoinHandle};

use crate::bridge::{BridgeError, BridgeMessage, BridgeSender};
use crate::config::IntentConfig;

/// How the platform handed us the intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentSource {
    /// Launch or relaunch that brought the app to the foreground with this payload.
    ForegroundLaunch,
    /// Re-delivery observed while already running; a duplicate of a foreground intent.
    BackgroundObserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentState {
    Idle,
    Captured,
    Delivering,
    Delivered,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredIntent {
    pub uri: String,
    pub captured_at: DateTime<Utc>,
    pub attempt: u32,
}

/// Result of one delivery task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Expired,
    /// A newer capture took the slot.
    Superseded,
    /// The transport refused the emission; the intent stays pending.
    Failed,
}

/// Whether the embedded runtime is up and listening.
pub trait ReadinessProbe: Send + Sync {
    fn is_ready(&self) -> bool;
}

impl<F> ReadinessProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_ready(&self) -> bool { self() }
}

/// Readiness flag flipped by the host shell when the runtime context comes and goes.
#[derive(Debug, Clone, Default)]
pub struct RuntimeReadiness(Arc<AtomicBool>);

impl RuntimeReadiness {
    pub fn new() -> Self { Self::default() }
    pub fn mark_ready(&self) { self.0.store(true, Ordering::SeqCst); }
    pub fn mark_gone(&self) { self.0.store(false, Ordering::SeqCst); }
}

impl ReadinessProbe for RuntimeReadiness {
    fn is_ready(&self) -> bool { self.0.load(Ordering::SeqCst) }
}

/// Where a deliverable intent goes.
pub trait IntentSink: Send + Sync {
    fn emit(&self, uri: &str) -> Result<(), BridgeError>;
}

impl IntentSink for BridgeSender {
    fn emit(&self, uri: &str) -> Result<(), BridgeError> {
        self.try_send(&BridgeMessage::payment_request(uri))
    }
}

struct Slot {
    pending: Option<DeferredIntent>,
    state: IntentState,
    generation: u64,
    /// Generation of the running delivery task, if any.
    active: Option<u64>,
    task: Option<AbortHandle>,
}

#[derive(Clone)]
pub struct DeferredIntentQueue {
    slot: Arc<Mutex<Slot>>,
    config: IntentConfig,
    probe: Arc<dyn ReadinessProbe>,
    sink: Arc<dyn IntentSink>,
}

impl DeferredIntentQueue {
    pub fn new(config: IntentConfig, probe: Arc<dyn ReadinessProbe>, sink: Arc<dyn IntentSink>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot { pending: None, state: IntentState::Idle, generation: 0, active: None, task: None })),
            config,
            probe,
            sink,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn state(&self) -> IntentState { self.slot().state }

    pub fn pending(&self) -> Option<DeferredIntent> { self.slot().pending.clone() }

    /// Record an external intent and start delivering it. Must run inside a tokio runtime.
    ///
    /// Returns the delivery task, or `None` if the intent was ignored.
    pub fn capture(&self, uri: impl Into<String>, source: IntentSource) -> Option<JoinHandle<DeliveryOutcome>> {
        let uri = uri.into();
        if source == IntentSource::BackgroundObserved {
            tracing::debug!("ignoring background re-delivery of payment intent");
            return None;
        }
        {
            let mut slot = self.slot();
            if let Some(previous) = slot.pending.take() {
                tracing::warn!(replaced = %previous.uri, "unconsumed payment intent replaced");
            }
            if let Some(task) = slot.task.take() {
                task.abort();
            }
            slot.generation += 1;
            slot.active = None;
            slot.state = IntentState::Captured;
            slot.pending = Some(DeferredIntent { uri, captured_at: Utc::now(), attempt: 0 });
            tracing::info!(generation = slot.generation, "payment intent captured");
        }
        self.try_deliver()
    }

    /// Readiness check on process resume. Starts a fresh delivery task if one is pending and none runs.
    pub fn on_resume(&self) -> Option<JoinHandle<DeliveryOutcome>> {
        self.try_deliver()
    }

    fn try_deliver(&self) -> Option<JoinHandle<DeliveryOutcome>> {
        let mut slot = self.slot();
        slot.pending.as_ref()?;
        let generation = slot.generation;
        if slot.active == Some(generation) {
            return None;
        }
        slot.active = Some(generation);
        slot.state = IntentState::Delivering;
        let queue = self.clone();
        let handle = tokio::spawn(async move { queue.deliver(generation).await });
        slot.task = Some(handle.abort_handle());
        Some(handle)
    }

    async fn deliver(self, generation: u64) -> DeliveryOutcome {
        let IntentConfig { poll_interval, min_ready_polls, max_attempts } = self.config;
        let mut reachable_since: Option<u32> = None;
        let mut attempt = 0u32;

        loop {
            {
                let mut slot = self.slot();
                if slot.generation != generation {
                    return DeliveryOutcome::Superseded;
                }
                if let Some(pending) = slot.pending.as_mut() {
                    pending.attempt = attempt;
                }
            }

            if self.probe.is_ready() {
                let since = *reachable_since.get_or_insert(attempt);
                if attempt - since >= min_ready_polls {
                    return self.emit(generation, attempt);
                }
            } else {
                reachable_since = None;
            }

            if attempt >= max_attempts {
                return self.expire(generation);
            }
            attempt += 1;
            tokio::time::sleep(poll_interval).await;
        }
    }

    fn emit(&self, generation: u64, attempt: u32) -> DeliveryOutcome {
        // The sink runs unlocked: it may capture again from inside emission.
        let intent = {
            let mut slot = self.slot();
            if slot.generation != generation {
                return DeliveryOutcome::Superseded;
            }
            slot.task = None;
            let Some(intent) = slot.pending.take() else {
                return DeliveryOutcome::Superseded;
            };
            intent
        };
        let sent = self.sink.emit(&intent.uri);

        let mut slot = self.slot();
        if slot.generation != generation {
            return match sent {
                Ok(()) => {
                    tracing::info!(attempt, "payment intent delivered, newer intent already captured");
                    DeliveryOutcome::Delivered
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "payment intent emission failed and was replaced");
                    DeliveryOutcome::Superseded
                }
            };
        }
        slot.active = None;
        match sent {
            Ok(()) => {
                slot.state = IntentState::Delivered;
                tracing::info!(attempt, "payment intent delivered");
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                slot.pending = Some(intent);
                slot.state = IntentState::Captured;
                tracing::error!(attempt, error = %e, "payment intent emission failed, kept for next resume");
                DeliveryOutcome::Failed
            }
        }
    }

    fn expire(&self, generation: u64) -> DeliveryOutcome {
        let mut slot = self.slot();
        if slot.generation != generation {
            return DeliveryOutcome::Superseded;
        }
        slot.active = None;
        slot.task = None;
        if let Some(intent) = slot.pending.take() {
            tracing::warn!(
                uri = %intent.uri,
                waited_ms = self.config.budget().as_millis() as u64,
                "runtime never became ready, payment intent dropped"
            );
        }
        slot.state = IntentState::Expired;
        DeliveryOutcome::Expired
    }
}
