//! Companion wallet state and its key/value wire form.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::intent::address::payment_uri;

/// Data item path for published wallet state.
pub const WALLET_DATA_PATH: &str = "/wallet_data";
/// Message path for the companion's wake request.
pub const OPEN_APP_PATH: &str = "/open_app";

pub const KEY_ADDRESS: &str = "address";
pub const KEY_BIP21_PREFIX: &str = "bip21_prefix";
pub const KEY_TIMESTAMP: &str = "timestamp";

/// Key/value map carried by the sync transport.
pub type ContextPayload = Map<String, Value>;

/// Minimal public wallet state mirrored on companions. Always complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionState {
    pub address: String,
    pub uri_prefix: String,
    pub updated_at: DateTime<Utc>,
}

impl CompanionState {
    pub fn new(address: impl Into<String>, uri_prefix: impl Into<String>) -> Self {
        Self { address: address.into(), uri_prefix: uri_prefix.into(), updated_at: Utc::now() }
    }

    /// Equal address and prefix; the timestamp is ignored.
    pub fn same_value(&self, other: &CompanionState) -> bool {
        self.address == other.address && self.uri_prefix == other.uri_prefix
    }

    pub fn payment_uri(&self) -> String {
        payment_uri(&self.address, &self.uri_prefix)
    }

    pub fn to_payload(&self) -> ContextPayload {
        let mut map = Map::new();
        map.insert(KEY_ADDRESS.into(), Value::String(self.address.clone()));
        map.insert(KEY_BIP21_PREFIX.into(), Value::String(self.uri_prefix.clone()));
        let seconds = self.updated_at.timestamp_millis() as f64 / 1000.0;
        map.insert(KEY_TIMESTAMP.into(), serde_json::json!(seconds));
        map
    }

    /// Build a full state from a payload. `None` unless both address and prefix are present.
    pub fn from_payload(payload: &ContextPayload) -> Option<Self> {
        let address = payload.get(KEY_ADDRESS)?.as_str()?.to_string();
        let uri_prefix = payload.get(KEY_BIP21_PREFIX)?.as_str()?.to_string();
        let updated_at = payload
            .get(KEY_TIMESTAMP)
            .and_then(Value::as_f64)
            .and_then(|secs| Utc.timestamp_millis_opt((secs * 1000.0).round() as i64).single())
            .unwrap_or_else(Utc::now);
        Some(Self { address, uri_prefix, updated_at })
    }
}
