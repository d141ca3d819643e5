//! Codec for API Gateway REST API proxy events.

use super::{build_request, encode_response, EventCodec, RequestParts};
use crate::error::BridgeError;
use crate::event::{ApiGatewayRequest, GatewayResponse, InvocationContext};
use crate::http::{HttpRequest, HttpResponse};

/// Payload format 1.0 (REST APIs).
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiGatewayCodec;

impl EventCodec for ApiGatewayCodec {
    type Event = ApiGatewayRequest;
    type Output = GatewayResponse;

    fn decode(event: ApiGatewayRequest, ctx: &InvocationContext) -> Result<HttpRequest, BridgeError> {
        let mut request = build_request(
            RequestParts {
                method: &event.http_method,
                path: &event.path,
                headers: &event.headers,
                body: event.body.as_deref(),
                is_base64_encoded: event.is_base64_encoded,
                source_ip: event.request_context.identity.source_ip.as_deref(),
            },
            ctx,
        )?;
        request.storage.insert::<ApiGatewayRequest>(event);
        Ok(request)
    }

    fn encode(response: HttpResponse) -> GatewayResponse {
        encode_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use std::collections::HashMap;

    fn event(method: &str, path: &str) -> ApiGatewayRequest {
        ApiGatewayRequest {
            path: path.to_string(),
            http_method: method.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_get_without_body() {
        let ctx = InvocationContext::new("req-1");
        let request = ApiGatewayCodec::decode(event("GET", "/todos"), &ctx).unwrap();

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url, "/todos");
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_original_event_is_attached() {
        let ctx = InvocationContext::new("req-2");
        let mut original = event("DELETE", "/todos/7");
        original.request_context.stage = Some("prod".to_string());
        original.request_context.identity.source_ip = Some("203.0.113.9".to_string());

        let request = ApiGatewayCodec::decode(original.clone(), &ctx).unwrap();

        assert_eq!(request.get::<ApiGatewayRequest>(), Some(&original));
        assert_eq!(
            request.get::<InvocationContext>().map(|c| c.request_id.as_str()),
            Some("req-2")
        );
        assert_eq!(request.remote_addr, "203.0.113.9".parse().ok());
    }

    #[test]
    fn test_headers_copied_verbatim() {
        let ctx = InvocationContext::new("req-3");
        let mut original = event("POST", "/todos");
        original.headers = HashMap::from([
            ("Accept".to_string(), "text/html, application/json".to_string()),
            ("X-Custom".to_string(), "1".to_string()),
        ]);
        original.body = Some("title=x".to_string());

        let request = ApiGatewayCodec::decode(original, &ctx).unwrap();

        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.get_header("accept"), Some("text/html, application/json"));
        assert_eq!(request.text().as_deref(), Some("title=x"));
    }

    #[test]
    fn test_bad_base64_produces_no_request() {
        let ctx = InvocationContext::new("req-4");
        let mut original = event("PUT", "/todos/1");
        original.body = Some("***".to_string());
        original.is_base64_encoded = true;

        assert!(matches!(
            ApiGatewayCodec::decode(original, &ctx),
            Err(BridgeError::Decode(_))
        ));
    }
}
