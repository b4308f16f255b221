//! Bridge Channel - typed, fire-and-forget messaging between host and embedded runtime.
//!
//! ```text
//! runtime ──{"type":"LOAD_MNEMONIC"}──────────────▶ host ──▶ vault
//!         ◀─{"type":"MNEMONIC_RESPONSE","data":..}─
//! ```
//!
//! No correlation ids: at most one request of each kind is in flight.
//! Malformed frames and unknown kinds are logged and dropped.

mod channel;
mod message;

pub use channel::{BridgeChannel, BridgeHandler, BridgeReceiver, BridgeSender};
pub use message::{BridgeMessage, MessageKind};

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("malformed bridge payload: {0}")]
    Malformed(String),

    #[error("remote side not attached")]
    Detached,
}

pub type BridgeResult<T> = Result<T, BridgeError>;
