//! Event-processing runtime: polls the platform for invocations and feeds
//! them to an [`EventHandler`](crate::handler::EventHandler).

mod api;
mod config;
mod lifecycle;
mod memory;

pub use api::{HttpRuntimeApi, Invocation, RuntimeApi};
pub use config::RuntimeConfig;
pub use lifecycle::{HandlerFuture, Lifecycle, LifecycleOutcome, ShutdownSignal};
pub use memory::{memory_runtime, InvocationResult, MemoryRuntimeApi, MemoryRuntimeClient};
