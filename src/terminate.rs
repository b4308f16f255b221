//! Host termination - fail-closed exit, exactly once.
//!
//! The forceful primitive runs first. If it reports failure the soft
//! fallback runs. Once `terminate` has been entered, later calls are no-ops,
//! so a retrying remote side cannot trigger a second termination nor
//! cancel the first.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::runtime::{Shutdown, ShutdownCause};

#[derive(Debug, thiserror::Error)]
pub enum TerminateError {
    #[error("exit primitive unavailable: {0}")]
    Unavailable(String),
    #[error("exit primitive failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationReason {
    /// The runtime asked the host to close.
    RuntimeRequest,
    VaultStoreFailed(String),
    VaultLoadFailed(String),
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::RuntimeRequest => write!(f, "runtime requested termination"),
            TerminationReason::VaultStoreFailed(e) => write!(f, "vault store failed: {e}"),
            TerminationReason::VaultLoadFailed(e) => write!(f, "vault load failed: {e}"),
        }
    }
}

/// A way of ending the host process.
pub trait ExitPrimitive: Send + Sync {
    fn name(&self) -> &'static str;
    /// Returns only on failure for real process exits.
    fn exit(&self) -> Result<(), TerminateError>;
}

/// Aborts the process immediately. No destructors, no flushing.
pub struct ProcessAbort;

impl ExitPrimitive for ProcessAbort {
    fn name(&self) -> &'static str { "abort" }
    fn exit(&self) -> Result<(), TerminateError> {
        std::process::abort()
    }
}

/// Stops the host event loop through its shutdown broadcaster.
pub struct SoftExit {
    shutdown: Shutdown,
}

impl SoftExit {
    pub fn new(shutdown: Shutdown) -> Self { Self { shutdown } }
}

impl ExitPrimitive for SoftExit {
    fn name(&self) -> &'static str { "shutdown" }
    fn exit(&self) -> Result<(), TerminateError> {
        // An earlier trigger still stops the loop, so either outcome is a success.
        self.shutdown.trigger(ShutdownCause::Terminated);
        Ok(())
    }
}

/// Exactly-once host terminator.
#[derive(Clone)]
pub struct Terminator {
    primary: Arc<dyn ExitPrimitive>,
    fallback: Arc<dyn ExitPrimitive>,
    fired: Arc<AtomicBool>,
}

impl Terminator {
    pub fn new(primary: Arc<dyn ExitPrimitive>, fallback: Arc<dyn ExitPrimitive>) -> Self {
        Self { primary, fallback, fired: Arc::new(AtomicBool::new(false)) }
    }

    /// Abort first, then fall back to stopping the event loop.
    pub fn process(shutdown: Shutdown) -> Self {
        Self::new(Arc::new(ProcessAbort), Arc::new(SoftExit::new(shutdown)))
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Terminate the host. Returns `false` if termination already happened.
    pub fn terminate(&self, reason: TerminationReason) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            tracing::debug!(%reason, "termination already in progress");
            return false;
        }
        tracing::error!(%reason, primitive = self.primary.name(), "terminating host");
        if let Err(e) = self.primary.exit() {
            tracing::warn!(error = %e, fallback = self.fallback.name(), "primary exit failed, falling back");
            if let Err(e) = self.fallback.exit() {
                tracing::error!(error = %e, "fallback exit failed");
            }
        }
        true
    }
}
