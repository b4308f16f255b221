//! Host-side publisher: pushes each distinct wallet state once.

use std::sync::Arc;

use super::state::CompanionState;
use super::transport::SyncTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Same address and prefix as the last successful publish.
    Unchanged,
    /// Transport refused; logged and dropped.
    Failed,
}

pub struct CompanionPublisher {
    transport: Arc<dyn SyncTransport>,
    last: Option<CompanionState>,
}

impl CompanionPublisher {
    pub fn new(transport: Arc<dyn SyncTransport>) -> Self {
        Self { transport, last: None }
    }

    pub fn last(&self) -> Option<&CompanionState> { self.last.as_ref() }

    /// Publish unless the value equals the last one sent.
    pub fn publish(&mut self, address: &str, uri_prefix: &str) -> PublishOutcome {
        let state = CompanionState::new(address, uri_prefix);
        if self.last.as_ref().is_some_and(|last| last.same_value(&state)) {
            tracing::debug!("companion state unchanged, not publishing");
            return PublishOutcome::Unchanged;
        }
        self.send(state)
    }

    /// A companion was (re)paired: the next publish goes out regardless.
    pub fn on_paired(&mut self) {
        self.last = None;
    }

    /// A companion asked for the host. Re-sends the last state if there is one.
    pub fn on_wake(&mut self) -> Option<PublishOutcome> {
        let state = self.last.take()?;
        Some(self.send(CompanionState::new(state.address, state.uri_prefix)))
    }

    fn send(&mut self, state: CompanionState) -> PublishOutcome {
        match self.transport.update_context(state.to_payload()) {
            Ok(()) => {
                tracing::info!(address = %state.address, prefix = %state.uri_prefix, "companion state published");
                self.last = Some(state);
                PublishOutcome::Published
            }
            Err(e) => {
                tracing::warn!(error = %e, "companion publish failed");
                PublishOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companion::{SyncError, SyncResult};
    use crate::companion::state::ContextPayload;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<ContextPayload>>,
        down: AtomicBool,
    }

    impl SyncTransport for Recorder {
        fn update_context(&self, payload: ContextPayload) -> SyncResult<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(SyncError::Unreachable);
            }
            self.sent.lock().unwrap_or_else(|p| p.into_inner()).push(payload);
            Ok(())
        }
    }

    impl Recorder {
        fn count(&self) -> usize { self.sent.lock().unwrap_or_else(|p| p.into_inner()).len() }
    }

    #[test]
    fn dedups_identical_state() {
        let recorder = Arc::new(Recorder::default());
        let mut publisher = CompanionPublisher::new(recorder.clone());

        assert_eq!(publisher.publish("ecash:qa", "ecash:"), PublishOutcome::Published);
        assert_eq!(publisher.publish("ecash:qa", "ecash:"), PublishOutcome::Unchanged);
        assert_eq!(publisher.publish("ecash:qa", "ectest:"), PublishOutcome::Published);
        assert_eq!(recorder.count(), 2);
    }

    #[test]
    fn pairing_forces_next_publish() {
        let recorder = Arc::new(Recorder::default());
        let mut publisher = CompanionPublisher::new(recorder.clone());

        publisher.publish("ecash:qa", "ecash:");
        publisher.on_paired();
        assert_eq!(publisher.publish("ecash:qa", "ecash:"), PublishOutcome::Published);
        assert_eq!(recorder.count(), 2);
    }

    #[test]
    fn failed_publish_is_not_remembered() {
        let recorder = Arc::new(Recorder::default());
        let mut publisher = CompanionPublisher::new(recorder.clone());

        recorder.down.store(true, Ordering::SeqCst);
        assert_eq!(publisher.publish("ecash:qa", "ecash:"), PublishOutcome::Failed);
        recorder.down.store(false, Ordering::SeqCst);
        assert_eq!(publisher.publish("ecash:qa", "ecash:"), PublishOutcome::Published);
    }

    #[test]
    fn wake_republishes_last_state() {
        let recorder = Arc::new(Recorder::default());
        let mut publisher = CompanionPublisher::new(recorder.clone());
        assert_eq!(publisher.on_wake(), None);

        publisher.publish("ecash:qa", "ecash:");
        assert_eq!(publisher.on_wake(), Some(PublishOutcome::Published));
        assert_eq!(recorder.count(), 2);
    }
}
