//! Companion Sync - one-way wallet state to paired display devices, with a wake path back.
//!
//! ```text
//! host                                   companion
//! CompanionPublisher ──context {address, bip21_prefix}──▶ CompanionReceiver ──▶ store + view
//!        ▲                                                    │
//!        └──────────────── wake (/open_app) ◀─────────────────┘ (only while no state)
//! ```

mod publisher;
mod receiver;
pub mod state;
pub mod store;
pub mod transport;

pub use publisher::{CompanionPublisher, PublishOutcome};
pub use receiver::{CompanionReceiver, CompanionView, ReceiveOutcome};
pub use state::{CompanionState, ContextPayload};
pub use store::{FileStateStore, MemoryStateStore, StateStore, StoreError};
pub use transport::{CompanionLink, LocalSyncTransport, SyncTransport, WakeRequest, WakeTransport};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("no companion or host reachable")]
    Unreachable,

    #[error("sync transport: {0}")]
    Transport(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
