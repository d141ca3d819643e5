//! Translation between invocation events and the generic HTTP model.
//!
//! Codecs are pure: decoding allocates the request body and nothing else,
//! encoding cannot fail.

mod apigateway;
mod apigateway_v2;

pub use apigateway::ApiGatewayCodec;
pub use apigateway_v2::ApiGatewayV2Codec;

use crate::error::BridgeError;
use crate::event::{GatewayResponse, InvocationContext};
use crate::http::{Body, Headers, HttpRequest, HttpResponse, Method};
use crate::storage::StorageKey;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use hyper::Version;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;

/// One event dialect: how its request event becomes an [`HttpRequest`] and
/// how an [`HttpResponse`] becomes its response event.
pub trait EventCodec: Send + Sync + 'static {
    /// Request event as delivered by the platform.
    type Event: DeserializeOwned + StorageKey<Value = Self::Event> + Send + Sync;
    /// Response event handed back to the platform.
    type Output: Serialize + Send;

    /// Build a generic request. Fails only on a malformed base64 body.
    fn decode(event: Self::Event, ctx: &InvocationContext) -> Result<HttpRequest, BridgeError>;

    /// Build the response event.
    fn encode(response: HttpResponse) -> Self::Output;
}

/// Fields every dialect contributes to a request.
pub(crate) struct RequestParts<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub headers: &'a HashMap<String, String>,
    pub body: Option<&'a str>,
    pub is_base64_encoded: bool,
    pub source_ip: Option<&'a str>,
}

/// Build the generic request shared by both dialects.
pub(crate) fn build_request(
    parts: RequestParts<'_>,
    ctx: &InvocationContext,
) -> Result<HttpRequest, BridgeError> {
    let body = decode_body(parts.body, parts.is_base64_encoded)?;

    let mut headers = Headers::new();
    for (name, value) in parts.headers {
        headers.add(name.as_str(), value.as_str());
    }

    let mut request = HttpRequest::new(Method::from(parts.method), parts.path);
    request.version = Version::HTTP_11;
    request.headers = headers;
    request.body = body;
    request.remote_addr = parts.source_ip.and_then(|ip| ip.parse::<IpAddr>().ok());
    request.span = ctx.span.clone();
    request.storage.insert::<InvocationContext>(ctx.clone());
    Ok(request)
}

/// Materialize the request body.
///
/// An absent body stays `None`; it never turns into an empty buffer.
pub(crate) fn decode_body(
    body: Option<&str>,
    is_base64_encoded: bool,
) -> Result<Option<Bytes>, BridgeError> {
    match (body, is_base64_encoded) {
        (Some(encoded), true) => Ok(Some(Bytes::from(STANDARD.decode(encoded)?))),
        (Some(text), false) => Ok(Some(Bytes::copy_from_slice(text.as_bytes()))),
        (None, _) => Ok(None),
    }
}

/// Build the response event shared by both dialects.
pub(crate) fn encode_response(response: HttpResponse) -> GatewayResponse {
    let mut multi_value_headers: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in response.headers {
        multi_value_headers.entry(name).or_default().push(value);
    }

    let (body, is_base64_encoded) = match response.body {
        Body::Text(text) => (Some(text), false),
        Body::Binary(bytes) => (Some(STANDARD.encode(&bytes)), true),
        Body::Empty => (None, false),
    };

    GatewayResponse {
        status_code: response.status.0,
        multi_value_headers,
        body,
        is_base64_encoded,
    }
}
