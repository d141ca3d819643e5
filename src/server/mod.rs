//! Application context and the per-application Lambda server singleton.

mod application;
mod config;
mod lambda;

pub use application::Application;
pub use config::{
    ParseRequestSourceError, RequestSource, ServerConfiguration, Unsupported, REQUEST_SOURCE_ENV,
};
pub use lambda::{ConfigurationUpdate, Lambda, LambdaServer, Server, ServerAccessor, ServerState};
