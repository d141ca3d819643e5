//! # Lambda Bridge - HTTP applications on AWS Lambda
//!
//! Lambda Bridge translates API Gateway invocation events into a generic
//! HTTP request, hands that request to an application [`Responder`], and
//! translates the response back into the event shape Lambda returns to
//! API Gateway.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   next    ┌───────────┐  event   ┌──────────────────┐
//! │  Runtime API │ ────────► │ Lifecycle │ ───────► │  GatewayHandler  │
//! │ (2018-06-01) │ ◄──────── │   loop    │ ◄─────── │ decode → respond │
//! └──────────────┘ response  └───────────┘  output  │     → encode     │
//!                                  ▲                └────────┬─────────┘
//!                                  │                         ▼
//!                           ┌──────┴───────┐          ┌─────────────┐
//!                           │ LambdaServer │          │  Responder  │
//!                           │  (singleton) │          │ (your app)  │
//!                           └──────────────┘          └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lambda_bridge::prelude::*;
//!
//! #[responder]
//! async fn hello(request: HttpRequest) -> Result<HttpResponse, BoxError> {
//!     Ok(HttpResponse::text(format!("Hello from {}!", request.url)))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BridgeError> {
//!     let app = Application::new(HelloResponder);
//!     app.lambda()
//!         .server()
//!         .set_configuration(ServerConfiguration::from_env(app.span().clone()));
//!     app.run().await
//! }
//! ```
//!
//! ## Server lifecycle
//!
//! 1. **Configure**: [`ServerAccessor::set_configuration`] may be called any
//!    number of times before the server is first used.
//! 2. **Materialize**: the first [`ServerAccessor::shared`] call creates the
//!    server and freezes the configuration.
//! 3. **Start**: [`Server::start`] schedules the invocation loop.
//! 4. **Shut down**: when the loop completes, the application is shut down
//!    on a dedicated thread.
//!
//! [`ServerAccessor::set_configuration`]: server::ServerAccessor::set_configuration
//! [`ServerAccessor::shared`]: server::ServerAccessor::shared
//! [`Server::start`]: server::Server::start

pub mod codec;
pub mod error;
pub mod event;
pub mod handler;
pub mod http;
pub mod runtime;
pub mod server;
pub mod storage;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::error::{BoxError, BridgeError};
    pub use crate::event::InvocationContext;
    pub use crate::handler::Responder;
    pub use crate::http::{Body, HttpRequest, HttpResponse, Method, StatusCode};
    pub use crate::server::{Application, RequestSource, Server, ServerConfiguration};
    pub use crate::storage::{Storage, StorageKey};
    pub use async_trait::async_trait;
    pub use lambda_bridge_macro::responder;
}

// Re-export for convenience
pub use error::{BoxError, BridgeError};
pub use handler::Responder;
pub use http::{HttpRequest, HttpResponse};
pub use server::{Application, ServerConfiguration};
