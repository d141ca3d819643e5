//! decode → respond → encode pipeline for one event dialect.

use crate::codec::EventCodec;
use crate::error::BridgeError;
use crate::event::InvocationContext;
use crate::handler::Responder;
use async_trait::async_trait;
use bytes::Bytes;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, Instrument};

/// Handles raw invocation payloads for the runtime loop.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle one invocation and return the serialized response event.
    async fn handle(&self, ctx: InvocationContext, payload: Bytes) -> Result<Bytes, BridgeError>;
}

/// Handler binding a [`Responder`] to an [`EventCodec`].
pub struct GatewayHandler<C> {
    responder: Arc<dyn Responder>,
    _codec: PhantomData<fn() -> C>,
}

impl<C: EventCodec> GatewayHandler<C> {
    /// Create a handler that forwards decoded requests to `responder`.
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            responder,
            _codec: PhantomData,
        }
    }

    /// Run the pipeline on an already-deserialized event.
    ///
    /// A decode failure returns before the responder is called. Responder
    /// failures are passed through as [`BridgeError::Responder`].
    pub async fn handle_event(
        &self,
        ctx: &InvocationContext,
        event: C::Event,
    ) -> Result<C::Output, BridgeError> {
        let request = C::decode(event, ctx)?;
        debug!("{} {}", request.method, request.url);

        let response = self
            .responder
            .respond(request)
            .await
            .map_err(BridgeError::Responder)?;
        debug!("responded with status {}", response.status.0);

        Ok(C::encode(response))
    }
}

impl<C> Clone for GatewayHandler<C> {
    fn clone(&self) -> Self {
        Self {
            responder: self.responder.clone(),
            _codec: PhantomData,
        }
    }
}

#[async_trait]
impl<C: EventCodec> EventHandler for GatewayHandler<C> {
    async fn handle(&self, ctx: InvocationContext, payload: Bytes) -> Result<Bytes, BridgeError> {
        let span = ctx.span.clone();
        async move {
            let event: C::Event = serde_json::from_slice(&payload)?;
            let output = self.handle_event(&ctx, event).await?;
            Ok::<_, BridgeError>(Bytes::from(serde_json::to_vec(&output)?))
        }
        .instrument(span)
        .await
    }
}
