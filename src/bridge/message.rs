//! Bridge message envelope: `{"type": "<TAG>", "data": <any>}` as a JSON string.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BridgeError, BridgeResult};
use crate::vault::SecretRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Log,
    TerminateHost,
    TransactionFinalized,
    StoreSecret,
    LoadSecretRequest,
    LoadSecretResponse,
    /// Host → runtime: a captured payment URI.
    PaymentRequest,
    /// Any tag this build does not know. Never fatal.
    Unknown(String),
}

impl MessageKind {
    /// Tag written on the wire.
    pub fn tag(&self) -> &str {
        match self {
            MessageKind::Log => "LOG",
            MessageKind::TerminateHost => "CLOSE_APP",
            MessageKind::TransactionFinalized => "TX_FINALIZED",
            MessageKind::StoreSecret => "STORE_MNEMONIC",
            MessageKind::LoadSecretRequest => "LOAD_MNEMONIC",
            MessageKind::LoadSecretResponse => "MNEMONIC_RESPONSE",
            MessageKind::PaymentRequest => "PAYMENT_REQUEST",
            MessageKind::Unknown(tag) => tag,
        }
    }

    /// Accepts both the wire tags and the long-form kind names.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "LOG" => MessageKind::Log,
            "CLOSE_APP" | "TERMINATE_HOST" => MessageKind::TerminateHost,
            "TX_FINALIZED" | "TRANSACTION_FINALIZED" => MessageKind::TransactionFinalized,
            "STORE_MNEMONIC" | "STORE_SECRET" => MessageKind::StoreSecret,
            "LOAD_MNEMONIC" | "LOAD_SECRET_REQUEST" => MessageKind::LoadSecretRequest,
            "MNEMONIC_RESPONSE" | "LOAD_SECRET_RESPONSE" => MessageKind::LoadSecretResponse,
            "PAYMENT_REQUEST" => MessageKind::PaymentRequest,
            other => MessageKind::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeMessage {
    pub kind: MessageKind,
    pub payload: Value,
}

impl BridgeMessage {
    pub fn new(kind: MessageKind, payload: Value) -> Self { Self { kind, payload } }

    pub fn log(text: impl Into<String>) -> Self { Self::new(MessageKind::Log, Value::String(text.into())) }
    pub fn terminate_host() -> Self { Self::new(MessageKind::TerminateHost, Value::Null) }
    pub fn transaction_finalized() -> Self { Self::new(MessageKind::TransactionFinalized, Value::Null) }
    pub fn store_secret(secret: &str) -> Self { Self::new(MessageKind::StoreSecret, Value::String(secret.into())) }
    pub fn load_secret_request() -> Self { Self::new(MessageKind::LoadSecretRequest, Value::Null) }
    pub fn payment_request(uri: &str) -> Self { Self::new(MessageKind::PaymentRequest, Value::String(uri.into())) }

    /// `null` data is the "not found" marker.
    pub fn load_secret_response(secret: Option<&SecretRecord>) -> Self {
        let payload = secret
            .map(|s| Value::String(String::from_utf8_lossy(s.as_bytes()).into_owned()))
            .unwrap_or(Value::Null);
        Self::new(MessageKind::LoadSecretResponse, payload)
    }

    pub fn payload_str(&self) -> Option<&str> { self.payload.as_str() }

    pub fn encode(&self) -> BridgeResult<String> {
        let envelope = Envelope { kind: self.kind.tag().to_string(), data: self.payload.clone() };
        serde_json::to_string(&envelope).map_err(|e| BridgeError::Malformed(e.to_string()))
    }

    pub fn decode(raw: &str) -> BridgeResult<Self> {
        let envelope: Envelope = serde_json::from_str(raw).map_err(|e| BridgeError::Malformed(e.to_string()))?;
        Ok(Self { kind: MessageKind::from_tag(&envelope.kind), payload: envelope.data })
    }
}
