//! API Gateway REST API (payload format 1.0) proxy events.

use super::null_as_default;
use crate::storage::StorageKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Proxy integration request from an API Gateway REST API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayRequest {
    #[serde(default)]
    pub resource: Option<String>,
    /// Request path, e.g. `/todos/1`.
    pub path: String,
    pub http_method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stage_variables: HashMap<String, String>,
    #[serde(default)]
    pub request_context: ApiGatewayRequestContext,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

/// `requestContext` of a REST API proxy event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayRequestContext {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub api_id: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub resource_path: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub request_time_epoch: Option<i64>,
    #[serde(default)]
    pub identity: ApiGatewayIdentity,
}

/// Caller identity of a REST API proxy event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayIdentity {
    #[serde(default)]
    pub source_ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl StorageKey for ApiGatewayRequest {
    type Value = ApiGatewayRequest;
}
