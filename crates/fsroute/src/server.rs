// File: src/server.rs
// Purpose: Orchestrator: load and register every route concurrently, then serve

use axum::http::Uri;
use futures::future::join_all;
use fsroute_router::{FileSystemRouter, RouterOptions, DEFAULT_EXTENSION};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, Instrument, Span};

use crate::app::{App, RegisteredRoute};
use crate::config::Options;
use crate::context::Store;
use crate::error::{format_addr, Error, Result, RouteFailure, ServerState};
use crate::loader::load_route;
use crate::logging;
use crate::module::ModuleRegistry;
use crate::registrar::register_module;
use crate::transform::transform_route;

/// A started server
#[derive(Debug, Clone)]
pub struct RunningApp {
    /// Address the listener is bound to
    pub local_addr: SocketAddr,
    /// Origin URL with the bound port, e.g. `http://localhost:3000`
    pub url: String,
    /// Every registered method + pattern
    pub routes: Vec<RegisteredRoute>,
    /// Shared state store of this run
    pub store: Store,
}

struct Running {
    app: RunningApp,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// File-system routed server
///
/// Every [`Server::start`] builds a new [`App`] from the current route table,
/// so a stop/reload/start cycle replaces all routes, state and decorators.
pub struct Server {
    router: FileSystemRouter,
    registry: ModuleRegistry,
    options: Options,
    state: ServerState,
    running: Option<Running>,
    span: Span,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("dir", &self.router.dir())
            .field("routes", &self.router.len())
            .field("state", &self.state)
            .finish()
    }
}

impl Server {
    /// Scan the configured routes directory and prepare a server
    pub fn new(registry: ModuleRegistry, options: Options) -> Result<Self> {
        let router = FileSystemRouter::with_options(
            options.config.routing.resolved_routes_dir(),
            RouterOptions {
                extension: DEFAULT_EXTENSION.to_string(),
                origin: options.config.server.resolved_origin(),
            },
        )?;
        Ok(Self::with_router(router, registry, options))
    }

    /// Prepare a server around an already scanned router
    pub fn with_router(router: FileSystemRouter, registry: ModuleRegistry, options: Options) -> Self {
        let span = logging::server_span(router.dir());
        Self {
            router,
            registry,
            options,
            state: ServerState::Idle,
            running: None,
            span,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn router(&self) -> &FileSystemRouter {
        &self.router
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The running app, if started
    pub fn running(&self) -> Option<&RunningApp> {
        self.running.as_ref().map(|running| &running.app)
    }

    /// Register every route and start listening
    ///
    /// Routes load and register concurrently. If any route fails, every
    /// failure is logged and returned together and nothing is bound.
    pub async fn start(&mut self) -> Result<RunningApp> {
        if self.state != ServerState::Idle {
            return Err(Error::InvalidState {
                expected: ServerState::Idle,
                actual: self.state,
            });
        }

        self.state = ServerState::Starting;
        let span = self.span.clone();
        match self.start_inner().instrument(span).await {
            Ok(running) => {
                let app = running.app.clone();
                self.running = Some(running);
                self.state = ServerState::Running;
                Ok(app)
            }
            Err(err) => {
                self.state = ServerState::Idle;
                Err(err)
            }
        }
    }

    async fn start_inner(&self) -> Result<Running> {
        let base_path = self.options.config.routing.base_path.as_deref();
        let app = Mutex::new(App::new());
        let tokens: Vec<&str> = self.router.tokens().collect();

        info!(routes = tokens.len(), "Registering routes");

        let outcomes = join_all(
            tokens
                .iter()
                .map(|route| self.load_and_register(route, base_path, &app)),
        )
        .await;

        let mut routes = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(registered) => routes.extend(registered),
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            for failure in &failures {
                error!(route = %failure.route, error = %failure.error, "Route failed to register");
            }
            return Err(Error::RoutesFailed(failures));
        }

        let (router, store) = app
            .into_inner()
            .into_router(self.options.derived_state.clone(), &self.options.plugins);

        let addr = format_addr(
            &self.options.config.server.host,
            self.options.config.server.resolved_port(),
        );
        let bind_error = |source| Error::Bind {
            addr: addr.clone(),
            source,
        };
        let listener = TcpListener::bind(&addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(
            async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        let _ = signal.await;
                    })
                    .await
            }
            .instrument(Span::current()),
        );

        let url = origin_with_port(self.router.origin(), local_addr.port());
        info!(routes = routes.len(), "Server running at {}", url);

        Ok(Running {
            app: RunningApp {
                local_addr,
                url,
                routes,
                store,
            },
            shutdown,
            task,
        })
    }

    /// Load one route's module and register its methods
    async fn load_and_register(
        &self,
        route: &str,
        base_path: Option<&str>,
        app: &Mutex<App>,
    ) -> std::result::Result<Vec<RegisteredRoute>, RouteFailure> {
        let failure = |error| RouteFailure {
            route: route.to_string(),
            error,
        };

        let handlers = load_route(route, &self.router, &self.registry)
            .await
            .map_err(failure)?;
        let pattern = transform_route(route, base_path);
        register_module(route, &pattern, handlers, app)
            .await
            .map_err(failure)
    }

    /// Stop listening and wait for in-flight requests
    ///
    /// Does nothing when the server is idle.
    pub async fn stop(&mut self) -> Result<()> {
        match self.state {
            ServerState::Idle => return Ok(()),
            ServerState::Running => {}
            actual => {
                return Err(Error::InvalidState {
                    expected: ServerState::Running,
                    actual,
                })
            }
        }

        self.state = ServerState::Stopping;
        let result = match self.running.take() {
            Some(running) => {
                let _ = running.shutdown.send(());
                match running.task.instrument(self.span.clone()).await {
                    Ok(result) => result.map_err(Error::Serve),
                    Err(join_error) => {
                        self.span.in_scope(|| {
                            error!(error = %join_error, "Server task ended abnormally")
                        });
                        Ok(())
                    }
                }
            }
            None => Ok(()),
        };

        self.state = ServerState::Idle;
        self.span.in_scope(|| info!("Server stopped"));
        result
    }

    /// Rebuild the route table from disk
    pub fn reload_routes(&mut self) -> Result<()> {
        self.router.reload()?;
        self.span
            .in_scope(|| info!(routes = self.router.len(), "Route table reloaded"));
        Ok(())
    }
}

/// `origin` with its port set to `port`, replacing any port it already names
fn origin_with_port(origin: &str, port: u16) -> String {
    let origin = origin.trim_end_matches('/');
    match origin.parse::<Uri>() {
        Ok(uri) => match (uri.scheme_str(), uri.host()) {
            (Some(scheme), Some(host)) => format!("{}://{}:{}", scheme, host, port),
            _ => format!("{}:{}", origin, port),
        },
        Err(_) => format!("{}:{}", origin, port),
    }
}
