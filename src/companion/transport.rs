//! Sync transport between host and companions.
//!
//! Published state uses an application-context style channel: the last
//! value is retained and handed to any companion that (re)connects later.
//! Wake requests go the other way as plain fire-and-forget messages.

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};

use super::state::{ContextPayload, OPEN_APP_PATH};
use super::{SyncError, SyncResult};

/// Host side: replace the context seen by every paired companion.
pub trait SyncTransport: Send + Sync {
    fn update_context(&self, payload: ContextPayload) -> SyncResult<()>;
}

/// Companion side: ask reachable hosts to come up. Returns how many were reached.
pub trait WakeTransport: Send + Sync {
    fn send_wake(&self) -> SyncResult<usize>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeRequest {
    pub path: &'static str,
    pub requested_at: DateTime<Utc>,
}

/// In-process transport linking one host to any number of companions.
pub struct LocalSyncTransport {
    context: watch::Sender<Option<ContextPayload>>,
    wake: broadcast::Sender<WakeRequest>,
}

impl Default for LocalSyncTransport {
    fn default() -> Self { Self::new() }
}

impl LocalSyncTransport {
    pub fn new() -> Self {
        let (context, _) = watch::channel(None);
        let (wake, _) = broadcast::channel(8);
        Self { context, wake }
    }

    /// Pair a companion. It sees the current context immediately.
    pub fn pair(&self) -> CompanionLink {
        CompanionLink { context: self.context.subscribe(), wake: self.wake.clone() }
    }

    /// Host-side wake subscription.
    pub fn wake_requests(&self) -> broadcast::Receiver<WakeRequest> {
        self.wake.subscribe()
    }

    pub fn paired_count(&self) -> usize { self.context.receiver_count() }
}

impl SyncTransport for LocalSyncTransport {
    fn update_context(&self, payload: ContextPayload) -> SyncResult<()> {
        // Retained even with no companion attached.
        self.context.send_replace(Some(payload));
        Ok(())
    }
}

/// A companion's end of the transport.
pub struct CompanionLink {
    pub context: watch::Receiver<Option<ContextPayload>>,
    wake: broadcast::Sender<WakeRequest>,
}

impl WakeTransport for CompanionLink {
    fn send_wake(&self) -> SyncResult<usize> {
        let request = WakeRequest { path: OPEN_APP_PATH, requested_at: Utc::now() };
        self.wake.send(request).map_err(|_| SyncError::Unreachable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::state::CompanionState;

    #[test]
    fn late_companion_gets_last_context() {
        let transport = LocalSyncTransport::new();
        transport.update_context(CompanionState::new("ecash:qa", "ecash:").to_payload()).expect("publish");
        transport.update_context(CompanionState::new("ecash:qb", "ecash:").to_payload()).expect("publish");

        let link = transport.pair();
        let current = link.context.borrow().clone().expect("context");
        assert_eq!(current["address"], "ecash:qb");
    }

    #[test]
    fn wake_without_host_is_unreachable() {
        let transport = LocalSyncTransport::new();
        let link = transport.pair();
        assert!(matches!(link.send_wake(), Err(SyncError::Unreachable)));

        let mut wakes = transport.wake_requests();
        assert_eq!(link.send_wake().expect("reached"), 1);
        assert_eq!(wakes.try_recv().expect("wake").path, OPEN_APP_PATH);
    }
}
