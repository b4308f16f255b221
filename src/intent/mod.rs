//! External payment intents: decoding, validation, and deferred delivery to the runtime.

pub mod address;
pub mod bip21;
pub mod ndef;
mod queue;

pub use address::{payment_uri, strip_network_prefix, AddressValidator, CashAddrValidator};
pub use bip21::{parse_bip21, PaymentRequest};
pub use queue::{
    DeferredIntent, DeferredIntentQueue, DeliveryOutcome, IntentSink, IntentSource, IntentState, ReadinessProbe,
    RuntimeReadiness,
};
