//! Invocation handlers.

mod gateway;
mod responder;

pub use gateway::{EventHandler, GatewayHandler};
pub use responder::Responder;
