// File: src/handler.rs
// Purpose: Route module contract: handler functions, hooks, per-method configuration

use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use serde_json::Value as JsonValue;
use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::context::{Context, Decorator};

/// Type-erased async route handler
pub type HandlerFn = Arc<dyn Fn(Context) -> BoxFuture<'static, Response> + Send + Sync>;

/// Function deriving per-request values from the context
pub type DeriveFn = Arc<dyn Fn(&Context) -> Vec<(String, JsonValue)> + Send + Sync>;

/// Hook run before the handler; returning a response skips the handler
pub type BeforeHandleFn = Arc<dyn Fn(&Context) -> Option<Response> + Send + Sync>;

/// Hook run after the handler with mutable access to the response
pub type AfterHandleFn = Arc<dyn Fn(&Context, &mut Response) + Send + Sync>;

/// Per-method map exported by a route module, keyed by uppercase method name
pub type HandlerMap = BTreeMap<String, HandlerConfig>;

/// Wraps an async function into a [`HandlerFn`]
///
/// The response type is chosen per route; anything implementing
/// `IntoResponse` works (`&'static str`, `Json<T>`, `(StatusCode, String)`, ...).
///
/// ```
/// use fsroute::{handler, Context};
///
/// let hello = handler(|_ctx: Context| async { "ok" });
/// ```
pub fn handler<F, Fut, R>(f: F) -> HandlerFn
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse,
{
    Arc::new(move |ctx: Context| -> BoxFuture<'static, Response> {
        let fut = f(ctx);
        Box::pin(async move { fut.await.into_response() })
    })
}

/// Lifecycle hook attached to a single route
#[derive(Clone)]
pub enum Hook {
    BeforeHandle(BeforeHandleFn),
    AfterHandle(AfterHandleFn),
}

impl Hook {
    pub fn before_handle<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Option<Response> + Send + Sync + 'static,
    {
        Hook::BeforeHandle(Arc::new(f))
    }

    pub fn after_handle<F>(f: F) -> Self
    where
        F: Fn(&Context, &mut Response) + Send + Sync + 'static,
    {
        Hook::AfterHandle(Arc::new(f))
    }
}

impl std::fmt::Debug for Hook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hook::BeforeHandle(_) => f.write_str("BeforeHandle"),
            Hook::AfterHandle(_) => f.write_str("AfterHandle"),
        }
    }
}

/// Ordered hook set of a registered route
#[derive(Clone, Default, Debug)]
pub struct Hooks {
    hooks: Vec<Hook>,
}

impl Hooks {
    pub fn new(hooks: Vec<Hook>) -> Self {
        Self { hooks }
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Runs `handler` wrapped by the hooks, in list order within each phase
    pub async fn run(&self, ctx: Context, handler: &HandlerFn) -> Response {
        for hook in &self.hooks {
            if let Hook::BeforeHandle(before) = hook {
                if let Some(response) = before(&ctx) {
                    return response;
                }
            }
        }

        let after: Vec<&AfterHandleFn> = self
            .hooks
            .iter()
            .filter_map(|hook| match hook {
                Hook::AfterHandle(f) => Some(f),
                Hook::BeforeHandle(_) => None,
            })
            .collect();

        if after.is_empty() {
            return handler(ctx).await;
        }

        let mut response = handler(ctx.clone()).await;
        for hook in after {
            hook(&ctx, &mut response);
        }
        response
    }
}

/// Configuration of one HTTP method of a route module
#[derive(Clone, Default)]
pub struct HandlerConfig {
    pub handler: Option<HandlerFn>,
    pub state: Vec<(String, JsonValue)>,
    pub decorators: Vec<(String, Decorator)>,
    pub hooks: Vec<Hook>,
}

impl std::fmt::Debug for HandlerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerConfig")
            .field("handler", &self.handler.is_some())
            .field("state", &self.state)
            .field(
                "decorators",
                &self.decorators.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl HandlerConfig {
    /// Configuration with a handler function and nothing else
    pub fn new(handler: HandlerFn) -> Self {
        Self {
            handler: Some(handler),
            ..Self::default()
        }
    }

    /// Shorthand for `HandlerConfig::new(handler(f))`
    pub fn from_fn<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse,
    {
        Self::new(handler(f))
    }

    /// Add a state pair registered into the shared store
    pub fn state(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.state.push((key.into(), value));
        self
    }

    /// Add a decorator visible to every request context
    pub fn decorate<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        let value: Decorator = Arc::new(value);
        self.decorators.push((name.into(), value));
        self
    }

    /// Add a lifecycle hook
    pub fn hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }
}

/// A loaded route module
///
/// `handler` is `None` for a module that exports nothing routable.
#[derive(Clone, Default, Debug)]
pub struct RouteModule {
    pub handler: Option<HandlerMap>,
}

impl RouteModule {
    /// Module with an empty handler map
    pub fn new() -> Self {
        Self {
            handler: Some(HandlerMap::new()),
        }
    }

    /// Module without a handler map
    pub fn without_handler() -> Self {
        Self { handler: None }
    }

    /// Add the configuration for a method (name is uppercased)
    pub fn method(mut self, method: &str, config: HandlerConfig) -> Self {
        self.handler
            .get_or_insert_with(HandlerMap::new)
            .insert(method.to_ascii_uppercase(), config);
        self
    }

    pub fn get(self, config: HandlerConfig) -> Self {
        self.method("GET", config)
    }

    pub fn post(self, config: HandlerConfig) -> Self {
        self.method("POST", config)
    }

    pub fn put(self, config: HandlerConfig) -> Self {
        self.method("PUT", config)
    }

    pub fn patch(self, config: HandlerConfig) -> Self {
        self.method("PATCH", config)
    }

    pub fn delete(self, config: HandlerConfig) -> Self {
        self.method("DELETE", config)
    }
}
