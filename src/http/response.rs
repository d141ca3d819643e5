//! Generic HTTP response produced by a responder.

use crate::http::Headers;
use bytes::Bytes;
use serde::Serialize;

/// Numeric HTTP status, copied to the response event unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::OK
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

/// Response payload.
///
/// `Text` is already-decoded text and goes back to the platform verbatim;
/// `Binary` is opaque bytes and gets base64-encoded on the way out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Binary(Bytes),
}

impl Body {
    /// The body as text, if it was produced as text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The body as bytes, for either text or binary payloads.
    pub fn to_bytes(&self) -> Option<Bytes> {
        match self {
            Body::Empty => None,
            Body::Text(text) => Some(Bytes::copy_from_slice(text.as_bytes())),
            Body::Binary(bytes) => Some(bytes.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Binary(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Binary(Bytes::from(bytes))
    }
}

/// Generic HTTP response returned by a [`Responder`](crate::handler::Responder).
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers. The same name may appear several times.
    pub headers: Headers,
    /// Response body.
    pub body: Body,
}

impl HttpResponse {
    /// Create a new HttpResponse with the given status code.
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status: status.into(),
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    /// Create an OK response.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// Create a response with JSON body.
    pub fn json<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_string(data)?;
        Ok(Self::new(StatusCode::OK)
            .header("Content-Type", "application/json")
            .body(body))
    }

    /// Create a text response.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(StatusCode::OK)
            .header("Content-Type", "text/plain")
            .body(Body::Text(content.into()))
    }

    /// Create a binary response.
    pub fn binary(content_type: &str, bytes: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK)
            .header("Content-Type", content_type)
            .body(Body::Binary(bytes.into()))
    }

    /// Create an error response.
    pub fn error(status: impl Into<StatusCode>, message: impl Into<String>) -> Self {
        Self::new(status)
            .header("Content-Type", "text/plain")
            .body(Body::Text(message.into()))
    }

    /// Append a header to the response.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(key, value);
        self
    }

    /// Set the response body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Get the body as text if present.
    pub fn text_body(&self) -> Option<String> {
        self.body
            .to_bytes()
            .map(|b| String::from_utf8_lossy(&b).to_string())
    }

    /// Parse the body as JSON if present.
    pub fn json_body<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Option<Result<T, serde_json::Error>> {
        self.body.to_bytes().map(|b| serde_json::from_slice(&b))
    }
}
