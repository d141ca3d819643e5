//! In-process runtime API, for tests and local runs without the platform.

use crate::error::{BridgeError, ErrorReport};
use crate::event::InvocationContext;
use crate::runtime::{Invocation, RuntimeApi};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};

/// What the function reported back for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    Response { request_id: String, body: Bytes },
    Error { request_id: String, report: ErrorReport },
    InitError(ErrorReport),
}

impl InvocationResult {
    /// Parse a successful response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        match self {
            InvocationResult::Response { body, .. } => Some(serde_json::from_slice(body)),
            _ => None,
        }
    }
}

/// Runtime side: handed to the lifecycle.
pub struct MemoryRuntimeApi {
    invocations: Mutex<mpsc::UnboundedReceiver<Invocation>>,
    results: mpsc::UnboundedSender<InvocationResult>,
}

/// Platform side: queues invocations and collects results.
///
/// Dropping the client closes the queue, which ends the lifecycle loop the
/// same way a lost runtime API connection would.
pub struct MemoryRuntimeClient {
    invocations: mpsc::UnboundedSender<Invocation>,
    results: mpsc::UnboundedReceiver<InvocationResult>,
    next_id: u64,
}

/// Create a connected runtime API / client pair.
pub fn memory_runtime() -> (MemoryRuntimeApi, MemoryRuntimeClient) {
    let (invocation_tx, invocation_rx) = mpsc::unbounded_channel();
    let (result_tx, result_rx) = mpsc::unbounded_channel();
    (
        MemoryRuntimeApi {
            invocations: Mutex::new(invocation_rx),
            results: result_tx,
        },
        MemoryRuntimeClient {
            invocations: invocation_tx,
            results: result_rx,
            next_id: 0,
        },
    )
}

impl MemoryRuntimeClient {
    /// Queue a raw payload. Returns the request ID assigned to it.
    pub fn invoke(&mut self, payload: impl Into<Bytes>) -> String {
        self.next_id += 1;
        let request_id = format!("local-{}", self.next_id);
        let invocation = Invocation {
            context: InvocationContext::new(request_id.clone()),
            payload: payload.into(),
        };
        if self.invocations.send(invocation).is_err() {
            tracing::warn!("runtime loop is gone, dropping invocation {}", request_id);
        }
        request_id
    }

    /// Queue a JSON event.
    pub fn invoke_json(&mut self, event: &serde_json::Value) -> String {
        self.invoke(event.to_string())
    }

    /// Wait for the next reported result. `None` once the runtime is gone.
    pub async fn next_result(&mut self) -> Option<InvocationResult> {
        self.results.recv().await
    }
}

impl MemoryRuntimeApi {
    fn report(&self, result: InvocationResult) -> Result<(), BridgeError> {
        self.results
            .send(result)
            .map_err(|_| BridgeError::runtime("runtime client disconnected"))
    }
}

#[async_trait]
impl RuntimeApi for MemoryRuntimeApi {
    async fn next_invocation(&self) -> Result<Invocation, BridgeError> {
        self.invocations
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| BridgeError::runtime("runtime client disconnected"))
    }

    async fn post_response(&self, request_id: &str, body: Bytes) -> Result<(), BridgeError> {
        self.report(InvocationResult::Response {
            request_id: request_id.to_string(),
            body,
        })
    }

    async fn post_error(&self, request_id: &str, report: &ErrorReport) -> Result<(), BridgeError> {
        self.report(InvocationResult::Error {
            request_id: request_id.to_string(),
            report: report.clone(),
        })
    }

    async fn post_init_error(&self, report: &ErrorReport) -> Result<(), BridgeError> {
        self.report(InvocationResult::InitError(report.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invocations_flow_through() {
        let (api, mut client) = memory_runtime();

        let id = client.invoke("{}");
        let invocation = api.next_invocation().await.unwrap();
        assert_eq!(invocation.context.request_id, id);

        api.post_response(&id, Bytes::from_static(b"{\"statusCode\":200}"))
            .await
            .unwrap();
        let result = client.next_result().await.unwrap();
        let value: serde_json::Value = result.json().unwrap().unwrap();
        assert_eq!(value["statusCode"], 200);
    }

    #[tokio::test]
    async fn test_dropped_client_ends_polling() {
        let (api, client) = memory_runtime();
        drop(client);
        assert!(matches!(
            api.next_invocation().await,
            Err(BridgeError::Runtime(_))
        ));
    }
}
