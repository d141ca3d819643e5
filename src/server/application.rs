//! The owning application context.

use crate::error::BridgeError;
use crate::handler::Responder;
use crate::server::{Lambda, Server};
use crate::storage::Storage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, Span};

type ShutdownHook = Box<dyn FnOnce(&Application) + Send>;

/// Application context: responder, runtime handle, keyed storage and
/// shutdown coordination. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Application {
    inner: Arc<ApplicationInner>,
}

pub(crate) struct ApplicationInner {
    responder: Arc<dyn Responder>,
    handle: Handle,
    span: Span,
    storage: Mutex<Storage>,
    shutdown_hooks: Mutex<Vec<ShutdownHook>>,
    shutting_down: AtomicBool,
    stopped: watch::Sender<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Application {
    /// Create an application on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; use
    /// [`Application::with_handle`] there.
    pub fn new(responder: impl Responder + 'static) -> Self {
        Self::with_handle(responder, Handle::current())
    }

    /// Create an application bound to `handle`.
    pub fn with_handle(responder: impl Responder + 'static, handle: Handle) -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            inner: Arc::new(ApplicationInner {
                responder: Arc::new(responder),
                handle,
                span: tracing::info_span!("application"),
                storage: Mutex::new(Storage::new()),
                shutdown_hooks: Mutex::new(Vec::new()),
                shutting_down: AtomicBool::new(false),
                stopped,
            }),
        }
    }

    pub fn responder(&self) -> Arc<dyn Responder> {
        self.inner.responder.clone()
    }

    /// Runtime the application's work is scheduled on.
    pub fn handle(&self) -> &Handle {
        &self.inner.handle
    }

    /// Application-wide span.
    pub fn span(&self) -> &Span {
        &self.inner.span
    }

    /// Lock the application's keyed storage.
    pub fn storage(&self) -> MutexGuard<'_, Storage> {
        lock(&self.inner.storage)
    }

    /// Lambda integration of this application.
    pub fn lambda(&self) -> Lambda<'_> {
        Lambda::new(self)
    }

    /// Register a hook to run during [`Application::shutdown`].
    ///
    /// Hooks run once, in registration order, on the thread that performs
    /// the shutdown.
    pub fn on_shutdown(&self, hook: impl FnOnce(&Application) + Send + 'static) {
        lock(&self.inner.shutdown_hooks).push(Box::new(hook));
    }

    /// Shut the application down.
    ///
    /// With a started server this only asks the invocation loop to stop;
    /// hooks run, and [`Application::is_shut_down`] turns true, after the
    /// loop has finished its current invocation. Otherwise the application
    /// is torn down before this returns. Later calls do nothing.
    pub fn shutdown(&self) {
        if self.is_shut_down() {
            return;
        }
        if let Some(server) = self.lambda().server().existing() {
            server.shutdown();
            if !server.retire_unstarted() {
                info!(parent: &self.inner.span, "stopping invocation loop");
                server.lifecycle().stop();
                return;
            }
        }
        self.teardown();
    }

    /// Run shutdown hooks and mark the application stopped. Runs once.
    pub(crate) fn teardown(&self) {
        if self.inner.shutting_down.swap(true, Ordering::SeqCst) {
            debug!(parent: &self.inner.span, "application already shutting down");
            return;
        }
        info!(parent: &self.inner.span, "shutting down application");

        let hooks = std::mem::take(&mut *lock(&self.inner.shutdown_hooks));
        for hook in hooks {
            hook(self);
        }

        self.inner.stopped.send_replace(true);
        info!(parent: &self.inner.span, "application shut down");
    }

    /// Whether [`Application::shutdown`] has completed.
    pub fn is_shut_down(&self) -> bool {
        *self.inner.stopped.borrow()
    }

    /// Wait until [`Application::shutdown`] has completed.
    pub async fn wait_for_shutdown(&self) {
        let mut stopped = self.inner.stopped.subscribe();
        // The sender lives as long as `self`, so this only returns once set.
        let _ = stopped.wait_for(|stopped| *stopped).await;
    }

    /// Start the Lambda server and wait for the application to shut down.
    pub async fn run(&self) -> Result<(), BridgeError> {
        let server = self.lambda().server().shared();
        server.start(None, None)?;
        self.wait_for_shutdown().await;
        Ok(())
    }

    pub(crate) fn downgrade(&self) -> Weak<ApplicationInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<ApplicationInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
