//! Generic HTTP model handed to responders.

mod headers;
mod request;
mod response;

pub use headers::Headers;
pub use request::{HttpRequest, Method};
pub use response::{Body, HttpResponse, StatusCode};
