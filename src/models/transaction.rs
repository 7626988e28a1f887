use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a submitted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

/// Payload handed to the provider. Everything beyond `to` and `value` is
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub to: String,
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransactionRequest {
    pub fn new(to: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            value: value.into(),
            extra: Map::new(),
        }
    }

    /// Attach an extra payload field (data, gas, nonce...)
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A transaction tracked by the manager, identified by `hash`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub status: TransactionStatus,
    pub submitted_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub request: TransactionRequest,
    /// Hash reported back by the provider, if it reported one
    pub provider_hash: Option<String>,
    pub error: Option<String>,
}

impl Transaction {
    pub fn pending(hash: String, request: TransactionRequest) -> Self {
        Self {
            hash,
            status: TransactionStatus::Pending,
            submitted_at: Utc::now(),
            confirmed_at: None,
            request,
            provider_hash: None,
            error: None,
        }
    }

    pub(crate) fn confirm(mut self, provider_hash: String) -> Self {
        self.status = TransactionStatus::Confirmed;
        self.confirmed_at = Some(Utc::now());
        self.provider_hash = Some(provider_hash);
        self
    }

    pub(crate) fn fail(mut self, error: String) -> Self {
        self.status = TransactionStatus::Failed;
        self.error = Some(error);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}
