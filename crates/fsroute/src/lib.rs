// fsroute - file-system routing for axum
// Route modules in a directory become registered handlers, reloaded on change

pub mod app;
pub mod build;
pub mod config;
pub mod context;
pub mod error;
pub mod handler;
pub mod loader;
pub mod logging;
pub mod module;
pub mod registrar;
pub mod server;
pub mod transform;
pub mod watcher;

// Re-export framework types
pub use app::{plugin_fn, App, FnPlugin, Plugin, RegisteredRoute, TracePlugin};
pub use build::{build, BuildOptions, BuildReport, RustTranspiler, SourceMapMode, Transpiler};
pub use config::{is_production, Config, Options};
pub use context::{Context, Decorator, Decorators, QueryParams, Store};
pub use error::{AppError, Error, Result, RouteError, RouteFailure, ServerState};
pub use handler::{handler, DeriveFn, HandlerConfig, HandlerFn, HandlerMap, Hook, RouteModule};
pub use loader::load_route;
pub use module::{ModuleProvider, ModuleRegistry};
pub use registrar::{register_method, register_module};
pub use server::{RunningApp, Server};
pub use transform::transform_route;
pub use watcher::{run_reload_loop, watch, DevWatcher, LoopExit, Reloadable};

// Re-export commonly used types from dependencies
pub use axum;
pub use axum::http::StatusCode;
pub use fsroute_router::{FileSystemRouter, RouteFile};
