//! Invocation event wire shapes.
//!
//! Field names follow the JSON documents API Gateway sends to and expects
//! from a Lambda function. Incoming headers are single-valued; outgoing
//! headers are always emitted as `multiValueHeaders`.

mod apigateway;
mod apigateway_v2;
mod context;
mod response;

pub use apigateway::{ApiGatewayIdentity, ApiGatewayRequest, ApiGatewayRequestContext};
pub use apigateway_v2::{ApiGatewayV2Http, ApiGatewayV2Request, ApiGatewayV2RequestContext};
pub use context::InvocationContext;
pub use response::GatewayResponse;

use serde::{Deserialize, Deserializer};

/// API Gateway sends `null` rather than `{}` for empty maps.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
