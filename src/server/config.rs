//! Lambda server configuration.

use crate::runtime::{RuntimeApi, RuntimeConfig};
use std::str::FromStr;
use std::sync::Arc;
use tracing::Span;

/// Environment variable selecting the request source.
pub const REQUEST_SOURCE_ENV: &str = "LAMBDA_BRIDGE_REQUEST_SOURCE";

/// Which event dialect the function is invoked with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestSource {
    /// API Gateway REST APIs (payload format 1.0).
    #[default]
    ApiGateway,
    /// API Gateway HTTP APIs (payload format 2.0).
    ApiGatewayV2,
    /// Application Load Balancer target groups. Not supported yet; the
    /// payload cannot be constructed.
    ApplicationLoadBalancer(Unsupported),
}

/// Uninhabited marker for request sources that are not supported yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsupported(Never);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Never {}

impl Unsupported {
    pub(crate) fn unreachable(self) -> ! {
        match self.0 {}
    }
}

impl std::fmt::Display for RequestSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestSource::ApiGateway => write!(f, "apigateway"),
            RequestSource::ApiGatewayV2 => write!(f, "apigatewayv2"),
            RequestSource::ApplicationLoadBalancer(unsupported) => unsupported.unreachable(),
        }
    }
}

/// Error returned when a request source name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequestSourceError {
    pub value: String,
    pub reason: &'static str,
}

impl std::fmt::Display for ParseRequestSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request source '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for ParseRequestSourceError {}

impl FromStr for RequestSource {
    type Err = ParseRequestSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apigateway" | "v1" | "rest" => Ok(RequestSource::ApiGateway),
            "apigatewayv2" | "v2" | "http" => Ok(RequestSource::ApiGatewayV2),
            "alb" | "applicationloadbalancer" => Err(ParseRequestSourceError {
                value: s.to_string(),
                reason: "not supported yet",
            }),
            _ => Err(ParseRequestSourceError {
                value: s.to_string(),
                reason: "unknown request source",
            }),
        }
    }
}

/// Configuration of the Lambda server.
///
/// Only honored if set before the server is first used; see
/// [`ServerAccessor::set_configuration`](crate::server::ServerAccessor::set_configuration).
#[derive(Clone)]
pub struct ServerConfiguration {
    /// Event dialect the handler decodes.
    pub request_source: RequestSource,
    /// Span the server and its lifecycle log under.
    pub span: Span,
    /// Runtime API location.
    pub runtime: RuntimeConfig,
    runtime_api: Option<Arc<dyn RuntimeApi>>,
}

impl ServerConfiguration {
    /// Create a configuration for the default request source.
    pub fn new(span: Span) -> Self {
        Self {
            request_source: RequestSource::default(),
            span,
            runtime: RuntimeConfig::default(),
            runtime_api: None,
        }
    }

    /// Build from `LAMBDA_BRIDGE_REQUEST_SOURCE` and the `AWS_LAMBDA_*` variables.
    pub fn from_env(span: Span) -> Self {
        let request_source = match std::env::var(REQUEST_SOURCE_ENV) {
            Ok(value) => value.parse().unwrap_or_else(|e: ParseRequestSourceError| {
                tracing::warn!(parent: &span, "{}, using {}", e, RequestSource::default());
                RequestSource::default()
            }),
            Err(_) => RequestSource::default(),
        };

        Self {
            request_source,
            runtime: RuntimeConfig::from_env(),
            ..Self::new(span)
        }
    }

    /// Set the request source.
    pub fn request_source(mut self, source: RequestSource) -> Self {
        self.request_source = source;
        self
    }

    /// Set the runtime API location.
    pub fn runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    /// Use `api` instead of connecting to [`ServerConfiguration::runtime`].
    pub fn runtime_api(mut self, api: Arc<dyn RuntimeApi>) -> Self {
        self.runtime_api = Some(api);
        self
    }

    pub(crate) fn custom_runtime_api(&self) -> Option<Arc<dyn RuntimeApi>> {
        self.runtime_api.clone()
    }
}

impl std::fmt::Debug for ServerConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfiguration")
            .field("request_source", &self.request_source)
            .field("runtime", &self.runtime)
            .field("custom_runtime_api", &self.runtime_api.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_source() {
        assert_eq!("apigateway".parse::<RequestSource>(), Ok(RequestSource::ApiGateway));
        assert_eq!(" ApiGatewayV2 ".parse::<RequestSource>(), Ok(RequestSource::ApiGatewayV2));
        assert_eq!("v2".parse::<RequestSource>(), Ok(RequestSource::ApiGatewayV2));

        let err = "alb".parse::<RequestSource>().unwrap_err();
        assert_eq!(err.reason, "not supported yet");
        assert!("kinesis".parse::<RequestSource>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for source in [RequestSource::ApiGateway, RequestSource::ApiGatewayV2] {
            assert_eq!(source.to_string().parse::<RequestSource>(), Ok(source));
        }
    }

    #[test]
    fn test_builder() {
        let config = ServerConfiguration::new(Span::none())
            .request_source(RequestSource::ApiGatewayV2)
            .runtime(RuntimeConfig::new().api_endpoint("localhost:9009"));

        assert_eq!(config.request_source, RequestSource::ApiGatewayV2);
        assert_eq!(config.runtime.api_endpoint, "localhost:9009");
        assert!(config.custom_runtime_api().is_none());
    }
}
