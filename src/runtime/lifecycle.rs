//! The invocation loop and its completion signal.

use crate::error::{BridgeError, ErrorReport};
use crate::handler::EventHandler;
use crate::runtime::{Invocation, RuntimeApi};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info, warn, Instrument, Span};

/// Future returned by a handler factory.
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<Arc<dyn EventHandler>, BridgeError>> + Send>>;

type HandlerFactory = Box<dyn Fn() -> HandlerFuture + Send + Sync>;

/// How a lifecycle ended: the number of invocations processed, or the error
/// that stopped the loop.
pub type LifecycleOutcome = Result<u64, Arc<BridgeError>>;

/// Drives invocations from a [`RuntimeApi`] into one [`EventHandler`].
pub struct Lifecycle {
    handle: Handle,
    span: Span,
    api: Arc<dyn RuntimeApi>,
    factory: HandlerFactory,
    started: AtomicBool,
    stop: Notify,
    completion: watch::Sender<Option<LifecycleOutcome>>,
}

impl Lifecycle {
    /// Create a lifecycle bound to `handle`.
    ///
    /// `factory` is called once, when the loop starts, to obtain the handler.
    pub fn new<F, Fut>(handle: Handle, span: Span, api: Arc<dyn RuntimeApi>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn EventHandler>, BridgeError>> + Send + 'static,
    {
        let (completion, _) = watch::channel(None);
        Self {
            handle,
            span,
            api,
            factory: Box::new(move || Box::pin(factory())),
            started: AtomicBool::new(false),
            stop: Notify::new(),
            completion,
        }
    }

    /// Runtime this lifecycle is bound to.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Schedule [`Lifecycle::start`] on the bound runtime and return at once.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<LifecycleOutcome> {
        let lifecycle = self.clone();
        self.handle.spawn(async move { lifecycle.start().await })
    }

    /// Run the loop until it is stopped or the runtime API fails.
    ///
    /// Fires the shutdown signal exactly once with the returned outcome.
    /// A second call returns [`BridgeError::AlreadyStarted`] without touching
    /// the signal.
    pub async fn start(&self) -> LifecycleOutcome {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Arc::new(BridgeError::AlreadyStarted));
        }

        let outcome = self.run().instrument(self.span.clone()).await;
        match &outcome {
            Ok(count) => info!(parent: &self.span, "lifecycle finished after {} invocations", count),
            Err(e) => error!(parent: &self.span, "lifecycle failed: {}", e),
        }

        self.completion.send_replace(Some(outcome.clone()));
        outcome
    }

    /// Ask the loop to finish. An invocation already in progress completes
    /// first; a stop requested before `start` ends the loop immediately.
    pub fn stop(&self) {
        self.stop.notify_one();
    }

    /// Signal that completes when the loop has finished.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.completion.subscribe(),
        }
    }

    async fn run(&self) -> LifecycleOutcome {
        info!("initializing handler");
        let handler = match (self.factory)().await {
            Ok(handler) => handler,
            Err(e) => {
                error!("handler initialization failed: {}", e);
                if let Err(post) = self.api.post_init_error(&ErrorReport::from(&e)).await {
                    warn!("could not report init error: {}", post);
                }
                return Err(Arc::new(e));
            }
        };

        let mut count = 0u64;
        loop {
            let invocation = tokio::select! {
                biased;
                _ = self.stop.notified() => {
                    info!("stop requested");
                    return Ok(count);
                }
                next = self.api.next_invocation() => next.map_err(Arc::new)?,
            };

            self.invoke(handler.as_ref(), invocation)
                .await
                .map_err(Arc::new)?;
            count += 1;
        }
    }

    async fn invoke(
        &self,
        handler: &dyn EventHandler,
        invocation: Invocation,
    ) -> Result<(), BridgeError> {
        let request_id = invocation.context.request_id.clone();
        let span = invocation.context.span.clone();

        async {
            match handler.handle(invocation.context, invocation.payload).await {
                Ok(body) => self.api.post_response(&request_id, body).await,
                Err(e) => {
                    warn!("invocation failed: {}", e);
                    self.api
                        .post_error(&request_id, &ErrorReport::from(&e))
                        .await
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// One-shot completion signal of a [`Lifecycle`].
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<LifecycleOutcome>>,
}

impl ShutdownSignal {
    /// Wait for the lifecycle to finish.
    pub async fn wait(mut self) -> LifecycleOutcome {
        let outcome = match self.rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| {
            Err(Arc::new(BridgeError::runtime(
                "lifecycle dropped before completing",
            )))
        })
    }

    pub fn is_complete(&self) -> bool {
        self.rx.borrow().is_some()
    }
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("complete", &self.is_complete())
            .finish()
    }
}
