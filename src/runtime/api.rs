//! Client side of the Lambda runtime API.

use crate::error::{BridgeError, ErrorReport};
use crate::event::InvocationContext;
use crate::runtime::RuntimeConfig;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderMap, CONTENT_TYPE};
use hyper::{Method, Request, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

const REQUEST_ID: &str = "lambda-runtime-aws-request-id";
const DEADLINE_MS: &str = "lambda-runtime-deadline-ms";
const FUNCTION_ARN: &str = "lambda-runtime-invoked-function-arn";
const TRACE_ID: &str = "lambda-runtime-trace-id";
const ERROR_TYPE: &str = "lambda-runtime-function-error-type";

/// One pending invocation fetched from the platform.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub context: InvocationContext,
    pub payload: Bytes,
}

/// Operations the lifecycle loop needs from the platform.
#[async_trait]
pub trait RuntimeApi: Send + Sync {
    /// Block until the next invocation is available.
    async fn next_invocation(&self) -> Result<Invocation, BridgeError>;

    /// Report a successful response event.
    async fn post_response(&self, request_id: &str, body: Bytes) -> Result<(), BridgeError>;

    /// Report a failed invocation.
    async fn post_error(&self, request_id: &str, report: &ErrorReport) -> Result<(), BridgeError>;

    /// Report that the function could not initialize.
    async fn post_init_error(&self, report: &ErrorReport) -> Result<(), BridgeError>;
}

/// [`RuntimeApi`] over HTTP, as exposed inside a Lambda execution environment.
pub struct HttpRuntimeApi {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
}

impl HttpRuntimeApi {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            base_url: config.base_url(),
        }
    }

    async fn send(
        &self,
        request: Request<Full<Bytes>>,
    ) -> Result<(StatusCode, HeaderMap, Bytes), BridgeError> {
        let response = self.client.request(request).await?;
        let (parts, body) = response.into_parts();
        let body = body.collect().await?.to_bytes();
        Ok((parts.status, parts.headers, body))
    }

    async fn post(
        &self,
        path: &str,
        body: Bytes,
        error_type: Option<&str>,
    ) -> Result<(), BridgeError> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json");
        if let Some(error_type) = error_type {
            builder = builder.header(ERROR_TYPE, error_type);
        }

        let (status, _, body) = self.send(builder.body(Full::new(body))?).await?;
        if !status.is_success() {
            return Err(BridgeError::runtime(format!(
                "POST {} returned {}: {}",
                path,
                status,
                String::from_utf8_lossy(&body)
            )));
        }
        Ok(())
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[async_trait]
impl RuntimeApi for HttpRuntimeApi {
    async fn next_invocation(&self) -> Result<Invocation, BridgeError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(format!("{}/runtime/invocation/next", self.base_url))
            .body(Full::new(Bytes::new()))?;

        let (status, headers, payload) = self.send(request).await?;
        if !status.is_success() {
            return Err(BridgeError::runtime(format!(
                "next invocation returned {}",
                status
            )));
        }

        let request_id = header(&headers, REQUEST_ID)
            .ok_or_else(|| BridgeError::runtime("next invocation is missing a request id"))?;
        let mut context = InvocationContext::new(request_id)
            .with_deadline_ms(
                header(&headers, DEADLINE_MS)
                    .and_then(|v| v.parse().ok())
                    .unwrap_or_default(),
            )
            .with_function_arn(header(&headers, FUNCTION_ARN).unwrap_or_default());
        if let Some(trace_id) = header(&headers, TRACE_ID) {
            context = context.with_trace_id(trace_id);
        }

        debug!("received invocation {}", context.request_id);
        Ok(Invocation { context, payload })
    }

    async fn post_response(&self, request_id: &str, body: Bytes) -> Result<(), BridgeError> {
        self.post(
            &format!("/runtime/invocation/{}/response", request_id),
            body,
            None,
        )
        .await
    }

    async fn post_error(&self, request_id: &str, report: &ErrorReport) -> Result<(), BridgeError> {
        self.post(
            &format!("/runtime/invocation/{}/error", request_id),
            Bytes::from(serde_json::to_vec(report)?),
            Some("Unhandled"),
        )
        .await
    }

    async fn post_init_error(&self, report: &ErrorReport) -> Result<(), BridgeError> {
        self.post(
            "/runtime/init/error",
            Bytes::from(serde_json::to_vec(report)?),
            Some("Unhandled"),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use hyper::body::Incoming;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::Response;
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Seen = Arc<Mutex<Vec<(String, String, Option<String>, Bytes)>>>;

    /// Minimal stand-in for the runtime API endpoint.
    async fn fake_runtime_api(seen: Seen) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let seen = seen.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let seen = seen.clone();
                        async move {
                            let method = req.method().to_string();
                            let path = req.uri().path().to_string();
                            let error_type = req
                                .headers()
                                .get(ERROR_TYPE)
                                .map(|v| v.to_str().unwrap().to_string());
                            let body = req.collect().await.unwrap().to_bytes();
                            seen.lock().unwrap().push((method, path.clone(), error_type, body));

                            let response = if path.ends_with("/invocation/next") {
                                Response::builder()
                                    .header(REQUEST_ID, "8476a536")
                                    .header(DEADLINE_MS, "1542409706888")
                                    .header(FUNCTION_ARN, "arn:aws:lambda:us-east-2:123:function:todos")
                                    .header(TRACE_ID, "Root=1-5bef4de7")
                                    .body(Full::new(Bytes::from_static(br#"{"rawPath":"/"}"#)))
                            } else {
                                Response::builder()
                                    .status(202)
                                    .body(Full::new(Bytes::from_static(b"{\"status\":\"OK\"}")))
                            };
                            Ok::<_, Infallible>(response.unwrap())
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        addr.to_string()
    }

    #[tokio::test]
    async fn test_next_invocation_reads_context_headers() {
        let seen = Seen::default();
        let endpoint = fake_runtime_api(seen.clone()).await;
        let api = HttpRuntimeApi::new(&RuntimeConfig::new().api_endpoint(endpoint));

        let invocation = api.next_invocation().await.unwrap();

        assert_eq!(invocation.context.request_id, "8476a536");
        assert_eq!(invocation.context.deadline_ms, 1542409706888);
        assert_eq!(invocation.context.trace_id.as_deref(), Some("Root=1-5bef4de7"));
        assert_eq!(&invocation.payload[..], br#"{"rawPath":"/"}"#);
        assert_eq!(seen.lock().unwrap()[0].1, "/2018-06-01/runtime/invocation/next");
    }

    #[tokio::test]
    async fn test_post_response_and_error() {
        let seen = Seen::default();
        let endpoint = fake_runtime_api(seen.clone()).await;
        let api = HttpRuntimeApi::new(&RuntimeConfig::new().api_endpoint(endpoint));

        api.post_response("abc", Bytes::from_static(b"{\"statusCode\":200}"))
            .await
            .unwrap();
        let report = ErrorReport::from(&BridgeError::runtime("boom"));
        api.post_error("abc", &report).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "POST");
        assert_eq!(seen[0].1, "/2018-06-01/runtime/invocation/abc/response");
        assert_eq!(seen[0].2, None);
        assert_eq!(seen[1].1, "/2018-06-01/runtime/invocation/abc/error");
        assert_eq!(seen[1].2.as_deref(), Some("Unhandled"));
        let posted: ErrorReport = serde_json::from_slice(&seen[1].3).unwrap();
        assert_eq!(posted, report);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_runtime_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        drop(listener);

        let api = HttpRuntimeApi::new(&RuntimeConfig::new().api_endpoint(endpoint));
        assert!(matches!(
            api.next_invocation().await,
            Err(BridgeError::Runtime(_))
        ));
    }
}
