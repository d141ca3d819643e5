//! Runtime API configuration.

use serde::{Deserialize, Serialize};

/// Where the runtime API lives and what the platform says about the function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// `host:port` of the runtime API.
    pub api_endpoint: String,
    /// Function name.
    pub function_name: Option<String>,
    /// Function version.
    pub function_version: Option<String>,
    /// Configured memory in megabytes.
    pub memory_size_mb: Option<u32>,
    /// CloudWatch log group.
    pub log_group: Option<String>,
    /// CloudWatch log stream.
    pub log_stream: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_endpoint: "127.0.0.1:9001".to_string(),
            function_name: None,
            function_version: None,
            memory_size_mb: None,
            log_group: None,
            log_stream: None,
        }
    }
}

impl RuntimeConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the standard `AWS_LAMBDA_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_endpoint = match lookup("AWS_LAMBDA_RUNTIME_API") {
            Some(endpoint) if !endpoint.is_empty() => endpoint,
            _ => {
                tracing::warn!(
                    "AWS_LAMBDA_RUNTIME_API is not set, using {}",
                    defaults.api_endpoint
                );
                defaults.api_endpoint
            }
        };

        Self {
            api_endpoint,
            function_name: lookup("AWS_LAMBDA_FUNCTION_NAME"),
            function_version: lookup("AWS_LAMBDA_FUNCTION_VERSION"),
            memory_size_mb: lookup("AWS_LAMBDA_FUNCTION_MEMORY_SIZE").and_then(|v| v.parse().ok()),
            log_group: lookup("AWS_LAMBDA_LOG_GROUP_NAME"),
            log_stream: lookup("AWS_LAMBDA_LOG_STREAM_NAME"),
        }
    }

    /// Set the runtime API endpoint.
    pub fn api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = endpoint.into();
        self
    }

    /// Set the function name.
    pub fn function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    /// Base URL of the versioned runtime API.
    pub fn base_url(&self) -> String {
        format!("http://{}/2018-06-01", self.api_endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup() {
        let env = HashMap::from([
            ("AWS_LAMBDA_RUNTIME_API", "169.254.100.1:9001"),
            ("AWS_LAMBDA_FUNCTION_NAME", "todos"),
            ("AWS_LAMBDA_FUNCTION_MEMORY_SIZE", "512"),
        ]);
        let config = RuntimeConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url(), "http://169.254.100.1:9001/2018-06-01");
        assert_eq!(config.function_name.as_deref(), Some("todos"));
        assert_eq!(config.memory_size_mb, Some(512));
        assert_eq!(config.log_group, None);
    }

    #[test]
    fn test_missing_endpoint_falls_back() {
        let config = RuntimeConfig::from_lookup(|_| None);
        assert_eq!(config.api_endpoint, "127.0.0.1:9001");
    }

    #[test]
    fn test_builder() {
        let config = RuntimeConfig::new()
            .api_endpoint("localhost:8080")
            .function_name("echo");
        assert_eq!(config.base_url(), "http://localhost:8080/2018-06-01");
        assert_eq!(config.function_name.as_deref(), Some("echo"));
    }
}
