//! Error type shared by the codec, handler and runtime layers.

use serde::{Deserialize, Serialize};

/// Boxed error returned by responders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by a single invocation or by the runtime loop.
#[derive(Debug)]
pub enum BridgeError {
    /// The request body was flagged as base64 but did not decode.
    Decode(base64::DecodeError),
    /// The invocation payload was not a valid event for the configured source.
    Payload(serde_json::Error),
    /// The responder failed. Displayed as the inner error.
    Responder(BoxError),
    /// The runtime API could not be reached or answered unexpectedly.
    Runtime(String),
    /// The lifecycle loop was started more than once.
    AlreadyStarted,
}

impl BridgeError {
    /// Create a runtime transport error.
    pub fn runtime(message: impl Into<String>) -> Self {
        BridgeError::Runtime(message.into())
    }

    /// Short machine-readable name reported to the platform as `errorType`.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Decode(_) => "DecodeError",
            BridgeError::Payload(_) => "PayloadError",
            BridgeError::Responder(_) => "ResponderError",
            BridgeError::Runtime(_) => "RuntimeError",
            BridgeError::AlreadyStarted => "AlreadyStarted",
        }
    }
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::Decode(e) => write!(f, "invalid base64 request body: {}", e),
            BridgeError::Payload(e) => write!(f, "invalid event payload: {}", e),
            BridgeError::Responder(e) => write!(f, "{}", e),
            BridgeError::Runtime(message) => write!(f, "runtime API error: {}", message),
            BridgeError::AlreadyStarted => write!(f, "lifecycle already started"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::Decode(e) => Some(e),
            BridgeError::Payload(e) => Some(e),
            BridgeError::Responder(e) => e.source(),
            BridgeError::Runtime(_) | BridgeError::AlreadyStarted => None,
        }
    }
}

impl From<base64::DecodeError> for BridgeError {
    fn from(err: base64::DecodeError) -> Self {
        BridgeError::Decode(err)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Payload(err)
    }
}

impl From<hyper::Error> for BridgeError {
    fn from(err: hyper::Error) -> Self {
        BridgeError::Runtime(err.to_string())
    }
}

impl From<hyper::http::Error> for BridgeError {
    fn from(err: hyper::http::Error) -> Self {
        BridgeError::Runtime(err.to_string())
    }
}

impl From<hyper_util::client::legacy::Error> for BridgeError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        BridgeError::Runtime(err.to_string())
    }
}

/// Error body posted to the runtime API's error endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error_type: String,
    pub error_message: String,
}

impl From<&BridgeError> for ErrorReport {
    fn from(err: &BridgeError) -> Self {
        Self {
            error_type: err.kind().to_string(),
            error_message: err.to_string(),
        }
    }
}
