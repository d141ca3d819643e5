//! Generic HTTP request built from an invocation event.

use crate::http::Headers;
use crate::storage::{Storage, StorageKey};
use bytes::Bytes;
use hyper::Version;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::Span;

/// HTTP method.
///
/// Tokens are matched case-sensitively, so `"get"` is an extension method
/// and not [`Method::Get`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Connect,
    Trace,
    /// Any other token, kept verbatim.
    Extension(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
            Method::Trace => "TRACE",
            Method::Extension(token) => token,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Method {
    fn from(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "PATCH" => Method::Patch,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "CONNECT" => Method::Connect,
            "TRACE" => Method::Trace,
            other => Method::Extension(other.to_string()),
        }
    }
}

impl From<String> for Method {
    fn from(token: String) -> Self {
        Method::from(token.as_str())
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        match method {
            Method::Extension(token) => token,
            other => other.as_str().to_string(),
        }
    }
}

/// Generic HTTP request passed to a [`Responder`](crate::handler::Responder).
#[derive(Debug)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Request path, already percent-encoded by the platform.
    pub url: String,
    /// Protocol version. Always HTTP/1.1 for requests built from events.
    pub version: Version,
    /// Request headers in arrival order.
    pub headers: Headers,
    /// Request body. `None` means the event carried no body at all.
    pub body: Option<Bytes>,
    /// Client address, when the platform reported a parseable one.
    pub remote_addr: Option<IpAddr>,
    /// Span that request-scoped logging should be attached to.
    pub span: Span,
    /// Side channel for platform data, e.g. the original event.
    pub storage: Storage,
}

impl HttpRequest {
    /// Create a new request with no headers and no body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            version: Version::HTTP_11,
            headers: Headers::new(),
            body: None,
            remote_addr: None,
            span: Span::none(),
            storage: Storage::new(),
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(key, value);
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Get the first value of a header.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Fetch a value from the side-channel storage, e.g.
    /// `request.get::<ApiGatewayV2Request>()`.
    pub fn get<K: StorageKey>(&self) -> Option<&K::Value> {
        self.storage.get::<K>()
    }

    /// Get the body as text if present.
    pub fn text(&self) -> Option<String> {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).to_string())
    }

    /// Parse the body as JSON if present.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.body.as_ref().map(|b| serde_json::from_slice(b))
    }
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self::new(Method::Get, "/")
    }
}
