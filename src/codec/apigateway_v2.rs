//! Codec for API Gateway HTTP API events.

use super::{build_request, encode_response, EventCodec, RequestParts};
use crate::error::BridgeError;
use crate::event::{ApiGatewayV2Request, GatewayResponse, InvocationContext};
use crate::http::{HttpRequest, HttpResponse};

/// Payload format 2.0 (HTTP APIs).
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiGatewayV2Codec;

impl EventCodec for ApiGatewayV2Codec {
    type Event = ApiGatewayV2Request;
    type Output = GatewayResponse;

    fn decode(
        event: ApiGatewayV2Request,
        ctx: &InvocationContext,
    ) -> Result<HttpRequest, BridgeError> {
        let mut request = build_request(
            RequestParts {
                method: &event.request_context.http.method,
                path: &event.raw_path,
                headers: &event.headers,
                body: event.body.as_deref(),
                is_base64_encoded: event.is_base64_encoded,
                source_ip: event.request_context.http.source_ip.as_deref(),
            },
            ctx,
        )?;

        // HTTP APIs move the Cookie header into `cookies`.
        if !event.cookies.is_empty() && !request.headers.contains("cookie") {
            request.headers.add("cookie", event.cookies.join("; "));
        }

        request.storage.insert::<ApiGatewayV2Request>(event);
        Ok(request)
    }

    fn encode(response: HttpResponse) -> GatewayResponse {
        encode_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ApiGatewayV2Http, ApiGatewayV2RequestContext};
    use crate::http::Method;

    fn event(method: &str, raw_path: &str) -> ApiGatewayV2Request {
        ApiGatewayV2Request {
            raw_path: raw_path.to_string(),
            request_context: ApiGatewayV2RequestContext {
                http: ApiGatewayV2Http {
                    method: method.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_base64_body_decoded() {
        let ctx = InvocationContext::new("req-1");
        let mut original = event("POST", "/todos");
        original.body = Some("aGVsbG8=".to_string());
        original.is_base64_encoded = true;

        let request = ApiGatewayV2Codec::decode(original, &ctx).unwrap();

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_method_and_path_passthrough() {
        let ctx = InvocationContext::new("req-2");
        let request =
            ApiGatewayV2Codec::decode(event("patch", "/todos/a%20b"), &ctx).unwrap();

        assert_eq!(request.method, Method::Extension("patch".to_string()));
        assert_eq!(request.url, "/todos/a%20b");
    }

    #[test]
    fn test_cookies_become_cookie_header() {
        let ctx = InvocationContext::new("req-3");
        let mut original = event("GET", "/");
        original.cookies = vec!["session=abc".to_string(), "theme=dark".to_string()];

        let request = ApiGatewayV2Codec::decode(original, &ctx).unwrap();

        assert_eq!(request.get_header("Cookie"), Some("session=abc; theme=dark"));
        assert_eq!(
            request.get::<ApiGatewayV2Request>().map(|e| e.cookies.len()),
            Some(2)
        );
    }

    #[test]
    fn test_unparseable_source_ip_is_dropped() {
        let ctx = InvocationContext::new("req-4");
        let mut original = event("GET", "/");
        original.request_context.http.source_ip = Some("test-invoke-source-ip".to_string());

        let request = ApiGatewayV2Codec::decode(original, &ctx).unwrap();
        assert!(request.remote_addr.is_none());
    }
}
