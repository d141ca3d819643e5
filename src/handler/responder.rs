//! The responder capability provided by the application.

use crate::error::BoxError;
use crate::http::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::sync::Arc;

/// Turns a generic HTTP request into a generic HTTP response.
///
/// This is the seam to the web application: routing, middleware and
/// business logic all live behind it. Implement it by hand or generate an
/// implementation with the `#[responder]` attribute.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce the response for `request`.
    async fn respond(&self, request: HttpRequest) -> Result<HttpResponse, BoxError>;
}

#[async_trait]
impl<R: Responder + ?Sized> Responder for Arc<R> {
    async fn respond(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        (**self).respond(request).await
    }
}

#[async_trait]
impl<R: Responder + ?Sized> Responder for Box<R> {
    async fn respond(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
        (**self).respond(request).await
    }
}
