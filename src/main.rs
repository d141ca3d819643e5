//! Lambda Bridge - example function
//!
//! Serves a small JSON greeting through the Lambda runtime API. The event
//! dialect is chosen with `LAMBDA_BRIDGE_REQUEST_SOURCE` (`apigateway` or
//! `apigatewayv2`).

use lambda_bridge::prelude::*;
use tracing_subscriber::EnvFilter;

/// Greets the caller named by `X-Name` and describes the request it saw.
#[responder]
async fn hello(request: HttpRequest) -> Result<HttpResponse, BoxError> {
    let name = request.get_header("X-Name").unwrap_or("World");
    let request_id = request
        .get::<InvocationContext>()
        .map(|ctx| ctx.request_id.clone());

    let body = serde_json::json!({
        "message": format!("Hello, {}!", name),
        "method": request.method.to_string(),
        "path": request.url,
        "request_id": request_id,
        "source_ip": request.remote_addr.map(|ip| ip.to_string()),
    });

    Ok(HttpResponse::json(&body)?)
}

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = Application::new(HelloResponder);
    app.lambda()
        .server()
        .set_configuration(ServerConfiguration::from_env(app.span().clone()));

    let server = app.lambda().server().shared();
    tracing::info!(
        "Starting lambda-bridge for {} events",
        server.configuration().request_source
    );

    tokio::spawn({
        let app = app.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, shutting down after the current invocation");
                app.shutdown();
            }
        }
    });

    app.on_shutdown(|_| tracing::info!("Goodbye"));
    app.run().await
}
