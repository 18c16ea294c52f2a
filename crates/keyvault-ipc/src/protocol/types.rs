//! IPC message types

use keyvault_core::{ErrorKind, VaultError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request from the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcRequest {
    /// Correlation id, echoed back untouched
    #[serde(default)]
    pub id: Value,
    pub channel: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl IpcRequest {
    pub fn new(id: impl Into<Value>, channel: &str, args: Vec<Value>) -> Self {
        Self {
            id: id.into(),
            channel: channel.to_string(),
            args,
        }
    }
}

/// The reply to one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    pub id: Value,
    pub result: Envelope,
}

impl IpcResponse {
    pub fn new(id: Value, result: Envelope) -> Self {
        Self { id, result }
    }

    /// Reply to a line that could not be parsed as a request
    pub fn unparseable(message: impl Into<String>) -> Self {
        Self::new(Value::Null, Envelope::invalid_request(message))
    }
}

/// Error classification carried in an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvelopeErrorKind {
    AuthDenied,
    NotFound,
    StorageFailure,
    ValidationFailure,
    InvalidRequest,
}

impl From<ErrorKind> for EnvelopeErrorKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::AuthDenied => EnvelopeErrorKind::AuthDenied,
            ErrorKind::NotFound => EnvelopeErrorKind::NotFound,
            ErrorKind::StorageFailure => EnvelopeErrorKind::StorageFailure,
            ErrorKind::ValidationFailure => EnvelopeErrorKind::ValidationFailure,
        }
    }
}

/// Result envelope: `{ success, ...data, error?, errorKind?, warning? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<EnvelopeErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Channel-specific fields, flattened into the envelope
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Envelope {
    /// Success with no data
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            error_kind: None,
            warning: None,
            data: Map::new(),
        }
    }

    /// Success carrying one data field
    pub fn ok_with(field: &str, value: impl Into<Value>) -> Self {
        Self::ok().with(field, value)
    }

    /// Add a data field
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.data.insert(field.to_string(), value.into());
        self
    }

    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }

    /// Failure with an explicit message and kind
    pub fn failure(kind: EnvelopeErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            error_kind: Some(kind),
            warning: None,
            data: Map::new(),
        }
    }

    /// Failure for a malformed request
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::failure(EnvelopeErrorKind::InvalidRequest, message)
    }

    /// Failure derived from a vault error
    pub fn from_error(err: &VaultError) -> Self {
        Self::failure(err.kind().into(), err.to_string())
    }

    /// A data field, if present
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }
}
