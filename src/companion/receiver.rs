//! Companion-side receiver: persists the last state and renders it.

use std::sync::Arc;
use tokio::sync::watch;

use super::state::{CompanionState, ContextPayload};
use super::store::{StateStore, StoreResult};
use super::transport::WakeTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// First state ever received.
    First,
    Updated,
    /// Same address and prefix as the current state.
    Unchanged,
    /// Payload incomplete.
    Dropped,
}

/// What the companion shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionView {
    Payment { address: String, payment_uri: String },
    /// No state yet: offer to wake the host.
    OpenOnPhone,
}

impl CompanionView {
    fn from_state(state: Option<&CompanionState>) -> Self {
        match state {
            Some(state) => CompanionView::Payment { address: state.address.clone(), payment_uri: state.payment_uri() },
            None => CompanionView::OpenOnPhone,
        }
    }
}

pub struct CompanionReceiver {
    store: Arc<dyn StateStore>,
    wake: Arc<dyn WakeTransport>,
    current: Option<CompanionState>,
    view: watch::Sender<CompanionView>,
}

impl CompanionReceiver {
    /// Restore the persisted state, if any.
    pub fn open(store: Arc<dyn StateStore>, wake: Arc<dyn WakeTransport>) -> StoreResult<Self> {
        let current = store.load()?;
        let (view, _) = watch::channel(CompanionView::from_state(current.as_ref()));
        Ok(Self { store, wake, current, view })
    }

    pub fn state(&self) -> Option<&CompanionState> { self.current.as_ref() }

    pub fn view(&self) -> CompanionView { self.view.borrow().clone() }

    /// Re-render notifications. Only full views are ever sent.
    pub fn subscribe(&self) -> watch::Receiver<CompanionView> { self.view.subscribe() }

    /// URI for tag emulation; `None` clears it.
    pub fn payment_uri(&self) -> Option<String> { self.current.as_ref().map(CompanionState::payment_uri) }

    pub fn apply(&mut self, payload: &ContextPayload) -> ReceiveOutcome {
        let Some(next) = CompanionState::from_payload(payload) else {
            tracing::warn!("incomplete companion payload dropped");
            return ReceiveOutcome::Dropped;
        };
        if self.current.as_ref().is_some_and(|current| current.same_value(&next)) {
            return ReceiveOutcome::Unchanged;
        }

        if let Err(e) = self.store.save(&next) {
            tracing::error!(error = %e, "could not persist companion state");
        }
        let outcome = if self.current.is_none() { ReceiveOutcome::First } else { ReceiveOutcome::Updated };
        self.view.send_replace(CompanionView::from_state(Some(&next)));
        self.current = Some(next);
        tracing::info!(?outcome, "companion state applied");
        outcome
    }

    /// Ask reachable hosts to wake. Only offered while no state exists.
    pub fn request_wake(&self) -> Option<usize> {
        if self.current.is_some() {
            return None;
        }
        match self.wake.send_wake() {
            Ok(reached) => {
                tracing::info!(reached, "wake request sent");
                Some(reached)
            }
            Err(e) => {
                tracing::warn!(error = %e, "wake request not delivered");
                Some(0)
            }
        }
    }

    /// Apply the retained context, then every change until the host side is gone.
    pub async fn run(mut self, mut context: watch::Receiver<Option<ContextPayload>>) {
        loop {
            let payload = context.borrow_and_update().clone();
            if let Some(payload) = payload {
                self.apply(&payload);
            }
            if context.changed().await.is_err() {
                tracing::debug!("companion transport closed");
                return;
            }
        }
    }
}
