//! API Gateway HTTP API (payload format 2.0) events.

use super::null_as_default;
use crate::storage::StorageKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request event from an API Gateway HTTP API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayV2Request {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub route_key: Option<String>,
    /// Path as received, already percent-encoded.
    pub raw_path: String,
    #[serde(default)]
    pub raw_query_string: String,
    /// Cookies split out of the `Cookie` header by API Gateway.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cookies: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stage_variables: HashMap<String, String>,
    pub request_context: ApiGatewayV2RequestContext,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

/// `requestContext` of an HTTP API event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayV2RequestContext {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub api_id: Option<String>,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub domain_prefix: Option<String>,
    pub http: ApiGatewayV2Http,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub route_key: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub time_epoch: Option<i64>,
}

/// `requestContext.http` of an HTTP API event. The method lives here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayV2Http {
    pub method: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub source_ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl StorageKey for ApiGatewayV2Request {
    type Value = ApiGatewayV2Request;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_http_api_event() {
        let event: ApiGatewayV2Request = serde_json::from_str(
            r#"{
                "version": "2.0",
                "routeKey": "$default",
                "rawPath": "/todos/42",
                "rawQueryString": "verbose=1",
                "cookies": ["session=abc", "theme=dark"],
                "headers": { "content-type": "application/json" },
                "requestContext": {
                    "apiId": "r3pmxmplak",
                    "http": {
                        "method": "PATCH",
                        "path": "/todos/42",
                        "protocol": "HTTP/1.1",
                        "sourceIp": "198.51.100.4",
                        "userAgent": "agent"
                    },
                    "requestId": "JKJaXmPLvHcESHA=",
                    "stage": "$default",
                    "timeEpoch": 1583348638390
                },
                "body": "eyJ0aXRsZSI6Im5ldyJ9",
                "isBase64Encoded": true
            }"#,
        )
        .unwrap();

        assert_eq!(event.request_context.http.method, "PATCH");
        assert_eq!(event.raw_path, "/todos/42");
        assert_eq!(event.cookies.len(), 2);
        assert!(event.is_base64_encoded);
        assert!(event.path_parameters.is_empty());
    }
}
