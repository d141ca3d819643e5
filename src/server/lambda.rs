//! The per-application Lambda server singleton.

use crate::codec::{ApiGatewayCodec, ApiGatewayV2Codec};
use crate::error::BridgeError;
use crate::handler::{EventHandler, GatewayHandler};
use crate::runtime::{HttpRuntimeApi, Lifecycle, RuntimeApi, ShutdownSignal};
use crate::server::application::ApplicationInner;
use crate::server::{Application, RequestSource, ServerConfiguration};
use crate::storage::StorageKey;
use std::io;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn, Span};

const SHUTDOWN_THREAD: &str = "lambda-shutdown";

struct ServerKey;

impl StorageKey for ServerKey {
    type Value = Arc<LambdaServer>;
}

struct ConfigurationKey;

impl StorageKey for ConfigurationKey {
    type Value = ServerConfiguration;
}

/// Generic server contract the Lambda server is started through.
pub trait Server: Send + Sync {
    /// Start serving. Hostname and port are accepted for compatibility with
    /// socket servers; a Lambda server has no socket of its own.
    fn start(&self, hostname: Option<&str>, port: Option<u16>) -> Result<(), BridgeError>;

    /// Stop serving.
    fn shutdown(&self);
}

/// Entry point to an application's Lambda integration.
pub struct Lambda<'a> {
    application: &'a Application,
}

impl<'a> Lambda<'a> {
    pub(crate) fn new(application: &'a Application) -> Self {
        Self { application }
    }

    pub fn server(&self) -> ServerAccessor<'a> {
        ServerAccessor {
            application: self.application,
        }
    }
}

/// Result of [`ServerAccessor::set_configuration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationUpdate {
    Applied,
    /// The server already exists; its configuration was kept.
    Ignored,
}

/// Access to the server singleton and its configuration.
pub struct ServerAccessor<'a> {
    application: &'a Application,
}

impl ServerAccessor<'_> {
    /// The application's server, created on first access.
    ///
    /// Creation uses the configuration current at that moment and freezes
    /// it. Concurrent first accesses all receive the same instance.
    pub fn shared(&self) -> Arc<LambdaServer> {
        let app = self.application;
        let mut storage = app.storage();
        if let Some(server) = storage.get::<ServerKey>() {
            return server.clone();
        }

        let configuration = storage
            .get::<ConfigurationKey>()
            .cloned()
            .unwrap_or_else(|| ServerConfiguration::new(app.span().clone()));
        storage
            .get_or_insert_with::<ServerKey, _>(|| Arc::new(LambdaServer::new(app, configuration)))
            .clone()
    }

    /// The server if it has been created.
    pub fn existing(&self) -> Option<Arc<LambdaServer>> {
        self.application.storage().get::<ServerKey>().cloned()
    }

    /// Whether the server has been created.
    pub fn is_materialized(&self) -> bool {
        self.application.storage().contains::<ServerKey>()
    }

    /// The configuration in effect, or that will be used on creation.
    pub fn configuration(&self) -> ServerConfiguration {
        let storage = self.application.storage();
        if let Some(server) = storage.get::<ServerKey>() {
            return server.configuration().clone();
        }
        storage
            .get::<ConfigurationKey>()
            .cloned()
            .unwrap_or_else(|| ServerConfiguration::new(self.application.span().clone()))
    }

    /// Replace the configuration.
    ///
    /// Once the server exists this logs a warning and keeps the existing
    /// configuration.
    pub fn set_configuration(&self, configuration: ServerConfiguration) -> ConfigurationUpdate {
        let mut storage = self.application.storage();
        if storage.contains::<ServerKey>() {
            warn!(
                parent: self.application.span(),
                "Cannot modify server configuration after server has been used."
            );
            return ConfigurationUpdate::Ignored;
        }
        storage.insert::<ConfigurationKey>(configuration);
        ConfigurationUpdate::Applied
    }
}

/// Observable lifecycle of a [`LambdaServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServerState {
    Materialized,
    Started,
    ShuttingDown,
    Shutdown,
}

/// Binds the application's responder to the Lambda runtime.
pub struct LambdaServer {
    application: Weak<ApplicationInner>,
    configuration: ServerConfiguration,
    lifecycle: Arc<Lifecycle>,
    state: Arc<watch::Sender<ServerState>>,
}

impl LambdaServer {
    fn new(app: &Application, configuration: ServerConfiguration) -> Self {
        let handler: Arc<dyn EventHandler> = match configuration.request_source {
            RequestSource::ApiGateway => {
                Arc::new(GatewayHandler::<ApiGatewayCodec>::new(app.responder()))
            }
            RequestSource::ApiGatewayV2 => {
                Arc::new(GatewayHandler::<ApiGatewayV2Codec>::new(app.responder()))
            }
            RequestSource::ApplicationLoadBalancer(unsupported) => unsupported.unreachable(),
        };

        let api = configuration.custom_runtime_api().unwrap_or_else(|| {
            Arc::new(HttpRuntimeApi::new(&configuration.runtime)) as Arc<dyn RuntimeApi>
        });

        let lifecycle = Lifecycle::new(
            app.handle().clone(),
            configuration.span.clone(),
            api,
            move || {
                let handler = handler.clone();
                async move { Ok::<_, BridgeError>(handler) }
            },
        );

        info!(
            parent: &configuration.span,
            "lambda server created for {} events", configuration.request_source
        );
        let (state, _) = watch::channel(ServerState::Materialized);
        Self {
            application: app.downgrade(),
            lifecycle: Arc::new(lifecycle),
            state: Arc::new(state),
            configuration,
        }
    }

    /// The frozen configuration this server was created with.
    pub fn configuration(&self) -> &ServerConfiguration {
        &self.configuration
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Completion signal of the underlying lifecycle.
    pub fn on_shutdown(&self) -> ShutdownSignal {
        self.lifecycle.shutdown_signal()
    }

    /// Wait until the server has reached `target` or a later state.
    pub async fn wait_for_state(&self, target: ServerState) {
        let mut state = self.state.subscribe();
        // The sender is owned by `self`, so the channel outlives this wait.
        let _ = state.wait_for(|state| *state >= target).await;
    }

    /// Move a server that was never started straight to `Shutdown`.
    /// Returns false if it has been started.
    pub(crate) fn retire_unstarted(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == ServerState::Materialized {
                *state = ServerState::Shutdown;
                true
            } else {
                false
            }
        })
    }

    fn teardown_job(&self) -> TeardownJob {
        TeardownJob {
            application: self.application.clone(),
            state: self.state.clone(),
        }
    }

    fn spawn_teardown(&self) {
        let signal = self.lifecycle.shutdown_signal();
        let job = self.teardown_job();
        let span = self.configuration.span.clone();

        self.lifecycle.handle().spawn(async move {
            let _ = signal.wait().await;
            job.state.send_replace(ServerState::ShuttingDown);
            debug!(parent: &span, "lifecycle complete, tearing down application");
            schedule_teardown(job, &span, spawn_shutdown_thread);
        });
    }
}

/// Application teardown, run once the lifecycle has completed.
#[derive(Clone)]
struct TeardownJob {
    application: Weak<ApplicationInner>,
    state: Arc<watch::Sender<ServerState>>,
}

impl TeardownJob {
    fn run(self) {
        if let Some(app) = Application::upgrade(&self.application) {
            app.teardown();
        }
        self.state.send_replace(ServerState::Shutdown);
    }
}

fn spawn_shutdown_thread(job: TeardownJob) -> io::Result<()> {
    std::thread::Builder::new()
        .name(SHUTDOWN_THREAD.to_string())
        .spawn(move || job.run())
        .map(drop)
}

/// Run `job` off the runtime's worker threads: on a thread from `spawn`,
/// or on the blocking pool when no thread can be created.
fn schedule_teardown<S>(job: TeardownJob, span: &Span, spawn: S)
where
    S: FnOnce(TeardownJob) -> io::Result<()>,
{
    if let Err(e) = spawn(job.clone()) {
        warn!(
            parent: span,
            "could not spawn {} thread ({}), using the blocking pool", SHUTDOWN_THREAD, e
        );
        tokio::task::spawn_blocking(move || job.run());
    }
}

impl Server for LambdaServer {
    fn start(&self, hostname: Option<&str>, port: Option<u16>) -> Result<(), BridgeError> {
        if hostname.is_some() || port.is_some() {
            debug!(
                parent: &self.configuration.span,
                "ignoring hostname {:?} and port {:?}", hostname, port
            );
        }

        let started = self.state.send_if_modified(|state| {
            if *state == ServerState::Materialized {
                *state = ServerState::Started;
                true
            } else {
                false
            }
        });
        if !started {
            return Err(BridgeError::AlreadyStarted);
        }

        self.spawn_teardown();
        // Detached; completion is observed through the shutdown signal.
        drop(self.lifecycle.spawn());
        info!(parent: &self.configuration.span, "lambda server started");
        Ok(())
    }

    /// Does nothing: shutdown always arrives through
    /// [`Application::shutdown`], which stops the lifecycle itself.
    fn shutdown(&self) {
        debug!(parent: &self.configuration.span, "server shutdown requested");
    }
}

impl std::fmt::Debug for LambdaServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LambdaServer")
            .field("configuration", &self.configuration)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::handler::Responder;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::runtime::{memory_runtime, InvocationResult};
    use async_trait::async_trait;
    use tracing::Span;

    struct MethodName;

    #[async_trait]
    impl Responder for MethodName {
        async fn respond(&self, request: HttpRequest) -> Result<HttpResponse, BoxError> {
            Ok(HttpResponse::text(request.method.to_string()))
        }
    }

    #[tokio::test]
    async fn test_shared_returns_one_instance() {
        let app = Application::new(MethodName);
        assert!(!app.lambda().server().is_materialized());

        let first = app.lambda().server().shared();
        let second = app.lambda().server().shared();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.state(), ServerState::Materialized);
        assert!(app.lambda().server().is_materialized());
    }

    #[tokio::test]
    async fn test_configuration_frozen_after_first_access() {
        let app = Application::new(MethodName);
        let v2 = ServerConfiguration::new(Span::none()).request_source(RequestSource::ApiGatewayV2);

        assert_eq!(
            app.lambda().server().set_configuration(v2),
            ConfigurationUpdate::Applied
        );
        let server = app.lambda().server().shared();
        assert_eq!(
            server.configuration().request_source,
            RequestSource::ApiGatewayV2
        );

        let v1 = ServerConfiguration::new(Span::none());
        assert_eq!(
            app.lambda().server().set_configuration(v1),
            ConfigurationUpdate::Ignored
        );
        assert_eq!(
            app.lambda().server().configuration().request_source,
            RequestSource::ApiGatewayV2
        );
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let (api, _client) = memory_runtime();
        let app = Application::new(MethodName);
        app.lambda().server().set_configuration(
            ServerConfiguration::new(Span::none()).runtime_api(Arc::new(api)),
        );
        let server = app.lambda().server().shared();

        server.start(Some("0.0.0.0"), Some(8080)).unwrap();
        assert_eq!(server.state(), ServerState::Started);
        assert!(matches!(
            server.start(None, None),
            Err(BridgeError::AlreadyStarted)
        ));
        server.lifecycle().stop();
        server.wait_for_state(ServerState::Shutdown).await;
    }

    #[tokio::test]
    async fn test_shutdown_before_start_retires_server() {
        let app = Application::new(MethodName);
        let server = app.lambda().server().shared();

        app.shutdown();

        server.wait_for_state(ServerState::Shutdown).await;
        assert!(app.is_shut_down());
        assert!(matches!(
            server.start(None, None),
            Err(BridgeError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn test_teardown_falls_back_to_blocking_pool() {
        let app = Application::new(MethodName);
        let server = app.lambda().server().shared();
        let ran_on = Arc::new(std::sync::Mutex::new(None));
        app.on_shutdown({
            let ran_on = ran_on.clone();
            move |_: &Application| {
                *ran_on.lock().unwrap() = std::thread::current().name().map(str::to_string);
            }
        });

        schedule_teardown(server.teardown_job(), &Span::none(), |_| {
            Err(io::Error::new(io::ErrorKind::Other, "thread limit reached"))
        });

        server.wait_for_state(ServerState::Shutdown).await;
        assert!(app.is_shut_down());
        assert_ne!(ran_on.lock().unwrap().as_deref(), Some(SHUTDOWN_THREAD));
    }

    #[tokio::test]
    async fn test_lifecycle_completion_shuts_application_down() {
        let (api, mut client) = memory_runtime();
        let app = Application::new(MethodName);
        app.lambda().server().set_configuration(
            ServerConfiguration::new(Span::none())
                .request_source(RequestSource::ApiGatewayV2)
                .runtime_api(Arc::new(api)),
        );
        let server = app.lambda().server().shared();
        server.start(None, None).unwrap();

        client.invoke_json(&serde_json::json!({
            "rawPath": "/",
            "requestContext": { "http": { "method": "DELETE" } }
        }));
        let result = client.next_result().await.unwrap();
        let value: serde_json::Value = result.json().unwrap().unwrap();
        assert_eq!(value["body"], "DELETE");
        assert!(!matches!(result, InvocationResult::Error { .. }));

        drop(client);
        server.wait_for_state(ServerState::Shutdown).await;
        assert!(app.is_shut_down());
        assert!(server.on_shutdown().is_complete());
    }
}
