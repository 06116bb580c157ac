// File: src/registrar.rs
// Purpose: Register a route module's state, decorators, hooks and handlers on the App

use tokio::sync::Mutex;

use crate::app::{App, RegisteredRoute};
use crate::error::RouteError;
use crate::handler::{HandlerConfig, HandlerMap};

/// Register every method of a handler map at `pattern`, in map order
///
/// Stops at the first failing method; methods registered before it stay
/// registered on the app.
pub async fn register_module(
    route: &str,
    pattern: &str,
    handlers: HandlerMap,
    app: &Mutex<App>,
) -> Result<Vec<RegisteredRoute>, RouteError> {
    let mut registered = Vec::with_capacity(handlers.len());
    for (method, config) in handlers {
        registered.push(register_method(route, pattern, &method, config, app).await?);
    }
    Ok(registered)
}

/// Register one method of a route
///
/// Within the method, state pairs go in first, then decorators, then the
/// handler with its hooks. Repeated keys overwrite earlier ones.
pub async fn register_method(
    route: &str,
    pattern: &str,
    method: &str,
    config: HandlerConfig,
    app: &Mutex<App>,
) -> Result<RegisteredRoute, RouteError> {
    let HandlerConfig {
        handler,
        state,
        decorators,
        hooks,
    } = config;

    let handler = handler.ok_or_else(|| RouteError::MissingHandlerFunction {
        route: route.to_string(),
        method: method.to_string(),
    })?;

    let mut app = app.lock().await;

    for (key, value) in state {
        tracing::debug!(route, key = %key, "Registering state");
        app.state(key, value);
    }

    for (name, value) in decorators {
        tracing::debug!(route, name = %name, "Registering decorator");
        app.decorate(name, value);
    }

    let hooks = (!hooks.is_empty()).then_some(hooks);
    app.add_route(method, pattern, handler, hooks)
        .map_err(|source| {
            tracing::error!(method, pattern, error = %source, "Error registering route");
            RouteError::Registration {
                method: method.to_string(),
                pattern: pattern.to_string(),
                source,
            }
        })?;

    tracing::debug!(method, pattern, "Registered route");
    Ok(RegisteredRoute {
        method: method.to_ascii_uppercase(),
        pattern: pattern.to_string(),
    })
}
