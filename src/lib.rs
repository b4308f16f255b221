//! Marlin bridge: wallet host plumbing between a native shell, an embedded
//! wallet runtime, and paired companion devices.
//!
//! # Architecture
//!
//! ```text
//! Host (native shell)
//!   │
//!   ├── BridgeChannel ◀──── JSON {type, data} ────▶ wallet runtime
//!   │     └── Host handler
//!   │           ├── SecureVault (auth challenge per access)
//!   │           ├── Terminator (exactly once, forceful then soft)
//!   │           └── Haptics
//!   │
//!   ├── DeferredIntentQueue (cold-start payment URIs → PAYMENT_REQUEST)
//!   │
//!   └── CompanionPublisher ──context──▶ CompanionReceiver (companion device)
//!                          ◀──wake────
//! ```
//!
//! # Messages
//!
//! | Kind | Direction | Data |
//! |------|-----------|------|
//! | `LOG` | runtime → host | text |
//! | `CLOSE_APP` | runtime → host | - |
//! | `TX_FINALIZED` | runtime → host | - |
//! | `STORE_MNEMONIC` | runtime → host | secret |
//! | `LOAD_MNEMONIC` | runtime → host | - |
//! | `MNEMONIC_RESPONSE` | host → runtime | secret or `null` |
//! | `PAYMENT_REQUEST` | host → runtime | payment URI |
//!
//! # Usage
//!
//! ```ignore
//! use marlin_bridge::{BridgeChannel, BridgeConfig, FileVault, Host, LogHaptics, Network, Terminator};
//!
//! let config = BridgeConfig::new(Network::Mainnet);
//! let ((host_tx, host_rx), (runtime_tx, runtime_rx)) = BridgeChannel::pair();
//! let vault = FileVault::new(config.vault_path(), &config.service, gate);
//! let mut host = Host::new(Arc::new(vault), Terminator::process(shutdown.clone()), Arc::new(LogHaptics), host_tx);
//! host_rx.run_until(&mut host, &shutdown).await;
//! ```

pub mod bridge;
pub mod companion;
pub mod config;
pub mod host;
pub mod intent;
pub mod logging;
pub mod runtime;
pub mod terminate;
pub mod vault;

pub use bridge::{BridgeChannel, BridgeError, BridgeHandler, BridgeMessage, BridgeReceiver, BridgeSender, MessageKind};
pub use companion::{
    CompanionPublisher, CompanionReceiver, CompanionState, CompanionView, LocalSyncTransport, PublishOutcome,
    ReceiveOutcome, SyncError,
};
pub use config::{BridgeConfig, IntentConfig, Network};
pub use host::{Haptics, Host, LogHaptics};
pub use intent::{
    parse_bip21, CashAddrValidator, DeferredIntentQueue, DeliveryOutcome, IntentSource, IntentState, PaymentRequest,
    RuntimeReadiness,
};
pub use runtime::{Shutdown, ShutdownCause};
pub use terminate::{ExitPrimitive, TerminationReason, Terminator};
pub use vault::{AuthGate, FileVault, MemoryVault, SecretRecord, SecureVault, VaultError, VaultKey};
