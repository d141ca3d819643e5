//! Response event returned to API Gateway.

use super::null_as_default;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Proxy integration response, shared by both API Gateway payload formats.
///
/// Built once per invocation by the codec and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_body_is_omitted() {
        let response = GatewayResponse {
            status_code: 204,
            ..Default::default()
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 204);
        assert_eq!(json["isBase64Encoded"], false);
        assert!(json.get("body").is_none());
    }

    #[test]
    fn test_multi_value_headers_shape() {
        let mut response = GatewayResponse {
            status_code: 200,
            body: Some("ok".to_string()),
            ..Default::default()
        };
        response
            .multi_value_headers
            .insert("Set-Cookie".to_string(), vec!["a=1".to_string(), "b=2".to_string()]);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["multiValueHeaders"]["Set-Cookie"], serde_json::json!(["a=1", "b=2"]));
        assert_eq!(json["body"], "ok");
    }
}
