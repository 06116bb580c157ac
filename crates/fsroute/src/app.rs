// File: src/app.rs
// Purpose: Host application wrapping axum: route table, shared state, decorators, plugins

use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Query};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter};
use axum::Router;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::context::{Context, Decorator, Decorators, QueryParams, Store};
use crate::error::AppError;
use crate::handler::{DeriveFn, HandlerFn, Hook, Hooks};
use crate::transform::{to_axum_path, WILDCARD_KEY, WILDCARD_PARAM};

/// Transformation of the axum router applied when the server binds
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, router: Router) -> Router;
}

/// Plugin built from a closure
pub struct FnPlugin<F> {
    name: String,
    apply: F,
}

/// Wrap a closure as a named plugin
pub fn plugin_fn<F>(name: impl Into<String>, apply: F) -> FnPlugin<F>
where
    F: Fn(Router) -> Router + Send + Sync,
{
    FnPlugin {
        name: name.into(),
        apply,
    }
}

impl<F> Plugin for FnPlugin<F>
where
    F: Fn(Router) -> Router + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, router: Router) -> Router {
        (self.apply)(router)
    }
}

/// HTTP request tracing through tower-http
#[derive(Debug, Clone, Copy, Default)]
pub struct TracePlugin;

impl Plugin for TracePlugin {
    fn name(&self) -> &str {
        "trace"
    }

    fn apply(&self, router: Router) -> Router {
        router.layer(TraceLayer::new_for_http())
    }
}

/// A route as registered on the host application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRoute {
    pub method: String,
    pub pattern: String,
}

/// How a registered path exposes the wildcard param
#[derive(Debug, Clone, Copy)]
enum Wildcard {
    None,
    Named,
    Bare,
}

struct RouteEntry {
    method: Method,
    pattern: String,
    path: String,
    bare: Option<String>,
    handler: HandlerFn,
    hooks: Hooks,
}

/// The host application routes are registered against
///
/// Collects routes, state and decorators while route modules register, then
/// turns into an axum [`Router`] once every route succeeded. Route conflicts
/// are detected at registration time so building the router never panics.
#[derive(Default)]
pub struct App {
    routes: Vec<RouteEntry>,
    matcher: matchit::Router<()>,
    inserted: HashSet<String>,
    state: HashMap<String, JsonValue>,
    decorators: Decorators,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("routes", &self.routes())
            .field("state", &self.state)
            .field("decorators", &self.decorators)
            .finish()
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state value (last write wins)
    pub fn state(&mut self, key: impl Into<String>, value: JsonValue) -> &mut Self {
        self.state.insert(key.into(), value);
        self
    }

    /// Register a decorator (last write wins)
    pub fn decorate(&mut self, name: impl Into<String>, value: Decorator) -> &mut Self {
        self.decorators.insert(name, value);
        self
    }

    pub fn state_value(&self, key: &str) -> Option<&JsonValue> {
        self.state.get(key)
    }

    pub fn decorators(&self) -> &Decorators {
        &self.decorators
    }

    /// Add a route for `method` at `pattern`
    ///
    /// Fails with [`AppError::UnsupportedMethod`] for a method axum cannot
    /// route, [`AppError::DuplicateRoute`] if the method is already bound to the
    /// same path and [`AppError::Conflict`] if the path overlaps another route.
    pub fn add_route(
        &mut self,
        method: &str,
        pattern: &str,
        handler: HandlerFn,
        hooks: Option<Vec<Hook>>,
    ) -> Result<(), AppError> {
        let method = parse_method(method)?;
        let (path, bare) = to_axum_path(pattern);

        if self
            .routes
            .iter()
            .any(|route| route.method == method && route.path == path)
        {
            return Err(AppError::DuplicateRoute {
                method: method.to_string(),
                path: pattern.to_string(),
            });
        }

        self.insert_path(&path)?;
        if let Some(bare) = &bare {
            self.insert_path(bare)?;
        }

        tracing::debug!(%method, pattern, path = %path, "Route added");
        self.routes.push(RouteEntry {
            method,
            pattern: pattern.to_string(),
            path,
            bare,
            handler,
            hooks: Hooks::new(hooks.unwrap_or_default()),
        });
        Ok(())
    }

    fn insert_path(&mut self, path: &str) -> Result<(), AppError> {
        if self.inserted.contains(path) {
            return Ok(());
        }
        self.matcher
            .insert(path, ())
            .map_err(|err| AppError::Conflict {
                path: path.to_string(),
                reason: err.to_string(),
            })?;
        self.inserted.insert(path.to_string());
        Ok(())
    }

    /// Registered routes in registration order
    pub fn routes(&self) -> Vec<RegisteredRoute> {
        self.routes
            .iter()
            .map(|route| RegisteredRoute {
                method: route.method.to_string(),
                pattern: route.pattern.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freeze the application into an axum router and its state store
    ///
    /// Derive functions run on every request before hooks; plugins are applied
    /// in order on the finished router.
    pub fn into_router(self, derive: Vec<DeriveFn>, plugins: &[Arc<dyn Plugin>]) -> (Router, Store) {
        let store = Store::with_values(self.state);
        let decorators = Arc::new(self.decorators);
        let derive: Arc<[DeriveFn]> = derive.into();

        let explicit: HashSet<(Method, String)> = self
            .routes
            .iter()
            .map(|route| (route.method.clone(), route.path.clone()))
            .collect();

        let mut groups: BTreeMap<String, MethodRouter> = BTreeMap::new();
        let mut bound: HashSet<(Method, String)> = HashSet::new();

        for route in self.routes {
            let Some(filter) = method_filter(&route.method) else {
                continue;
            };

            let mut targets = vec![(route.path.clone(), wildcard_mode(&route))];
            if let Some(bare) = &route.bare {
                // An explicit route at the bare prefix wins over the alias
                if !explicit.contains(&(route.method.clone(), bare.clone())) {
                    targets.push((bare.clone(), Wildcard::Bare));
                }
            }

            for (path, wildcard) in targets {
                if !bound.insert((route.method.clone(), path.clone())) {
                    continue;
                }

                let endpoint = Arc::new(Endpoint {
                    handler: route.handler.clone(),
                    hooks: route.hooks.clone(),
                    wildcard,
                    store: store.clone(),
                    decorators: decorators.clone(),
                    derive: derive.clone(),
                });
                // Bytes enforces DefaultBodyLimit and answers 413 past it
                let service = move |params: Result<Path<HashMap<String, String>>, PathRejection>,
                                    method: Method,
                                    uri: Uri,
                                    headers: HeaderMap,
                                    body: Bytes| {
                    let endpoint = endpoint.clone();
                    async move { endpoint.call(params, method, uri, headers, body).await }
                };

                let method_router = match groups.remove(&path) {
                    Some(existing) => existing.on(filter, service),
                    None => axum::routing::on(filter, service),
                };
                groups.insert(path, method_router);
            }
        }

        let router = groups
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router)
            });

        let router = plugins.iter().fold(router, |router, plugin| {
            tracing::debug!(plugin = plugin.name(), "Applying plugin");
            plugin.apply(router)
        });

        (router, store)
    }
}

fn wildcard_mode(route: &RouteEntry) -> Wildcard {
    if route.bare.is_some() {
        Wildcard::Named
    } else {
        Wildcard::None
    }
}

/// Per-path request adapter: axum request in, [`Context`] to the route handler
struct Endpoint {
    handler: HandlerFn,
    hooks: Hooks,
    wildcard: Wildcard,
    store: Store,
    decorators: Arc<Decorators>,
    derive: Arc<[DeriveFn]>,
}

impl Endpoint {
    async fn call(
        self: Arc<Self>,
        params: Result<Path<HashMap<String, String>>, PathRejection>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let mut params = match params {
            Ok(Path(params)) => params,
            Err(PathRejection::MissingPathParams(_)) => HashMap::new(),
            Err(rejection) => return rejection.into_response(),
        };
        match self.wildcard {
            Wildcard::None => {}
            Wildcard::Named => {
                let rest = params.remove(WILDCARD_PARAM).unwrap_or_default();
                params.insert(WILDCARD_KEY.to_string(), rest);
            }
            Wildcard::Bare => {
                params.insert(WILDCARD_KEY.to_string(), String::new());
            }
        }

        let query = Query::<HashMap<String, String>>::try_from_uri(&uri)
            .map(|Query(query)| query)
            .unwrap_or_default();

        let mut ctx = Context::new(method, uri.path())
            .with_params(params)
            .with_query(QueryParams::new(query))
            .with_headers(headers)
            .with_body(body)
            .with_store(self.store.clone())
            .with_decorators(self.decorators.clone());

        for derive in self.derive.iter() {
            for (name, value) in derive(&ctx) {
                ctx.insert_derived(name, value);
            }
        }

        self.hooks.run(ctx, &self.handler).await
    }
}

/// Parse a method name into one axum can route
fn parse_method(name: &str) -> Result<Method, AppError> {
    let method = Method::from_bytes(name.to_ascii_uppercase().as_bytes())
        .map_err(|_| AppError::UnsupportedMethod(name.to_string()))?;

    match method_filter(&method) {
        Some(_) => Ok(method),
        None => Err(AppError::UnsupportedMethod(name.to_string())),
    }
}

fn method_filter(method: &Method) -> Option<MethodFilter> {
    let filter = match *method {
        Method::GET => MethodFilter::GET,
        Method::POST => MethodFilter::POST,
        Method::PUT => MethodFilter::PUT,
        Method::PATCH => MethodFilter::PATCH,
        Method::DELETE => MethodFilter::DELETE,
        Method::HEAD => MethodFilter::HEAD,
        Method::OPTIONS => MethodFilter::OPTIONS,
        Method::TRACE => MethodFilter::TRACE,
        _ => return None,
    };
    Some(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::Json;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tower::ServiceExt;

    fn ok() -> HandlerFn {
        handler(|_ctx: Context| async { "ok" })
    }

    fn params_handler() -> HandlerFn {
        handler(|ctx: Context| async move {
            let params: BTreeMap<String, String> = ctx.params.into_iter().collect();
            Json(params)
        })
    }

    async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, String) {
        let response = router
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_unsupported_method() {
        let mut app = App::new();
        let err = app.add_route("BREW", "/coffee", ok(), None).unwrap_err();
        assert_eq!(err, AppError::UnsupportedMethod("BREW".to_string()));
        assert!(app.is_empty());
    }

    #[test]
    fn test_duplicate_route() {
        let mut app = App::new();
        app.add_route("GET", "/about", ok(), None).unwrap();
        app.add_route("POST", "/about", ok(), None).unwrap();

        let err = app.add_route("get", "/about", ok(), None).unwrap_err();
        assert_eq!(
            err,
            AppError::DuplicateRoute {
                method: "GET".to_string(),
                path: "/about".to_string(),
            }
        );
    }

    #[test]
    fn test_conflicting_params() {
        let mut app = App::new();
        app.add_route("GET", "/user/:id", ok(), None).unwrap();

        let err = app.add_route("GET", "/user/:name", ok(), None).unwrap_err();
        assert!(matches!(err, AppError::Conflict { path, .. } if path == "/user/:name"));
    }

    #[test]
    fn test_state_and_decorators_last_write_wins() {
        let mut app = App::new();
        app.state("version", json!(1)).state("version", json!(2));
        app.decorate("db", Arc::new("first")).decorate("db", Arc::new("second"));

        assert_eq!(app.state_value("version"), Some(&json!(2)));
        assert_eq!(app.decorators().get::<&str>("db"), Some(&"second"));
    }

    #[tokio::test]
    async fn test_router_serves_params() {
        let mut app = App::new();
        app.add_route("GET", "/", ok(), None).unwrap();
        app.add_route("GET", "/user/:id", params_handler(), None).unwrap();
        let (router, _store) = app.into_router(Vec::new(), &[]);

        assert_eq!(send(&router, "GET", "/").await, (StatusCode::OK, "ok".to_string()));
        assert_eq!(
            send(&router, "GET", "/user/42").await,
            (StatusCode::OK, r#"{"id":"42"}"#.to_string())
        );
        assert_eq!(send(&router, "POST", "/").await.0, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(send(&router, "GET", "/missing").await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wildcard_exposed_as_star() {
        let mut app = App::new();
        app.add_route("GET", "/static/*", params_handler(), None).unwrap();
        let (router, _store) = app.into_router(Vec::new(), &[]);

        assert_eq!(
            send(&router, "GET", "/static/css/site.css").await.1,
            r#"{"*":"css/site.css"}"#
        );
        assert_eq!(send(&router, "GET", "/static").await.1, r#"{"*":""}"#);
    }

    #[tokio::test]
    async fn test_explicit_route_beats_wildcard_alias() {
        let mut app = App::new();
        app.add_route("GET", "/docs/*", params_handler(), None).unwrap();
        app.add_route("GET", "/docs", ok(), None).unwrap();
        let (router, _store) = app.into_router(Vec::new(), &[]);

        assert_eq!(send(&router, "GET", "/docs").await.1, "ok");
        assert_eq!(send(&router, "GET", "/docs/a").await.1, r#"{"*":"a"}"#);
    }

    #[tokio::test]
    async fn test_store_seeded_and_shared() {
        let mut app = App::new();
        app.state("greeting", json!("hi"));
        app.add_route(
            "GET",
            "/greet",
            handler(|ctx: Context| async move {
                let greeting = ctx.store.get("greeting").await.unwrap_or_default();
                Json(greeting)
            }),
            None,
        )
        .unwrap();
        let (router, store) = app.into_router(Vec::new(), &[]);

        assert_eq!(send(&router, "GET", "/greet").await.1, r#""hi""#);
        store.set("greeting", json!("hello")).await;
        assert_eq!(send(&router, "GET", "/greet").await.1, r#""hello""#);
    }

    #[tokio::test]
    async fn test_derive_hooks_and_plugins() {
        let mut app = App::new();
        app.add_route(
            "GET",
            "/who",
            handler(|ctx: Context| async move { Json(ctx.derived("user").cloned()) }),
            Some(vec![Hook::before_handle(|ctx| {
                ctx.query
                    .has("deny")
                    .then(|| StatusCode::FORBIDDEN.into_response())
            })]),
        )
        .unwrap();

        let derive: DeriveFn = Arc::new(|ctx: &Context| {
            let user = ctx.query.get("user").cloned().unwrap_or_default();
            vec![("user".to_string(), json!(user))]
        });
        let plugins: Vec<Arc<dyn Plugin>> = vec![
            Arc::new(TracePlugin),
            Arc::new(plugin_fn("health", |router: Router| {
                router.route("/health", axum::routing::get(|| async { "healthy" }))
            })),
        ];
        let (router, _store) = app.into_router(vec![derive], &plugins);

        assert_eq!(send(&router, "GET", "/who?user=ada").await.1, r#""ada""#);
        assert_eq!(send(&router, "GET", "/who?deny=1").await.0, StatusCode::FORBIDDEN);
        assert_eq!(send(&router, "GET", "/health").await.1, "healthy");
    }

    fn body_length() -> HandlerFn {
        handler(|ctx: Context| async move { ctx.body.len().to_string() })
    }

    async fn post(router: &Router, uri: &str, body: Vec<u8>) -> (StatusCode, String) {
        let response = router
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri(uri)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_body_within_limit_reaches_handler() {
        let mut app = App::new();
        app.add_route("POST", "/upload", body_length(), None).unwrap();
        let (router, _store) = app.into_router(Vec::new(), &[]);

        assert_eq!(
            post(&router, "/upload", vec![b'x'; 1024]).await,
            (StatusCode::OK, "1024".to_string())
        );
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut app = App::new();
        app.add_route("POST", "/upload", body_length(), None).unwrap();
        let (router, _store) = app.into_router(Vec::new(), &[]);

        let (status, _) = post(&router, "/upload", vec![b'x'; 8 * 1024 * 1024]).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_invalid_utf8_param_rejected() {
        let mut app = App::new();
        app.add_route("GET", "/user/:id", params_handler(), None).unwrap();
        let (router, _store) = app.into_router(Vec::new(), &[]);

        assert_eq!(send(&router, "GET", "/user/%FF").await.0, StatusCode::BAD_REQUEST);
        assert_eq!(
            send(&router, "GET", "/user/ada%20l").await,
            (StatusCode::OK, r#"{"id":"ada l"}"#.to_string())
        );
    }
}
