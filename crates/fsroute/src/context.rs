// File: src/context.rs
// Purpose: Per-request context handed to route handlers and hooks

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A named value attached to every request context
pub type Decorator = Arc<dyn Any + Send + Sync>;

/// Application-wide state store
///
/// Shared by every route: state registered by one route module is visible to
/// handlers of all others. Writes are last-write-wins.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<HashMap<String, JsonValue>>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with initial values
    pub fn with_values(values: HashMap<String, JsonValue>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(values)),
        }
    }

    /// Get a copy of a state value
    pub async fn get(&self, key: &str) -> Option<JsonValue> {
        self.inner.read().await.get(key).cloned()
    }

    /// Set a state value, replacing any previous one
    pub async fn set(&self, key: impl Into<String>, value: JsonValue) {
        self.inner.write().await.insert(key.into(), value);
    }

    /// Remove a state value
    pub async fn remove(&self, key: &str) -> Option<JsonValue> {
        self.inner.write().await.remove(key)
    }

    /// Update a value in place, inserting `Null` first if missing
    pub async fn update<F>(&self, key: &str, f: F) -> JsonValue
    where
        F: FnOnce(&mut JsonValue),
    {
        let mut guard = self.inner.write().await;
        let value = guard.entry(key.to_string()).or_insert(JsonValue::Null);
        f(value);
        value.clone()
    }

    /// Copy of the whole store
    pub async fn snapshot(&self) -> HashMap<String, JsonValue> {
        self.inner.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Named values decorating the request context
///
/// Frozen when the server binds; handlers get read-only access.
#[derive(Clone, Default)]
pub struct Decorators {
    values: HashMap<String, Decorator>,
}

impl std::fmt::Debug for Decorators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Decorators").field("names", &names).finish()
    }
}

impl Decorators {
    /// Insert a decorator, replacing any previous one with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: Decorator) {
        self.values.insert(name.into(), value);
    }

    /// Typed access to a decorator
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.values.get(name)?.downcast_ref::<T>()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Request context passed to handlers, hooks and derive functions
#[derive(Clone)]
pub struct Context {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: Method,

    /// Request path
    pub path: String,

    /// Path parameters (`:id` → `params["id"]`, wildcard → `params["*"]`)
    pub params: HashMap<String, String>,

    /// Query parameters from URL (?key=value)
    pub query: QueryParams,

    /// Request headers
    pub headers: HeaderMap,

    /// Parsed cookies
    pub cookies: HashMap<String, String>,

    /// Raw request body
    pub body: Bytes,

    /// Application-wide state
    pub store: Store,

    decorators: Arc<Decorators>,
    derived: HashMap<String, JsonValue>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .finish()
    }
}

impl Context {
    /// Create a context with no params, headers or body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            query: QueryParams::default(),
            headers: HeaderMap::new(),
            cookies: HashMap::new(),
            body: Bytes::new(),
            store: Store::default(),
            decorators: Arc::new(Decorators::default()),
            derived: HashMap::new(),
        }
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.cookies = parse_cookies(&headers);
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.store = store;
        self
    }

    pub fn with_decorators(mut self, decorators: Arc<Decorators>) -> Self {
        self.decorators = decorators;
        self
    }

    /// Get a path parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Typed access to a decorator registered by any route
    pub fn decorator<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.decorators.get(name)
    }

    /// All decorators
    pub fn decorators(&self) -> &Decorators {
        &self.decorators
    }

    /// Value produced by a derive function for this request
    pub fn derived(&self, name: &str) -> Option<&JsonValue> {
        self.derived.get(name)
    }

    pub(crate) fn insert_derived(&mut self, name: String, value: JsonValue) {
        self.derived.insert(name, value);
    }

    /// Get a cookie value
    pub fn get_cookie(&self, name: &str) -> Option<&String> {
        self.cookies.get(name)
    }

    /// Get a header value
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Check if request accepts JSON
    pub fn accepts_json(&self) -> bool {
        self.get_header("accept")
            .is_some_and(|accept| accept.contains("json"))
    }

    /// Body as text, lossy on invalid UTF-8
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Body parsed as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Parse cookies from Cookie header
fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Query parameters from URL
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    /// Create from HashMap
    pub fn new(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Get a query parameter value
    pub fn get(&self, key: &str) -> Option<&String> {
        self.params.get(key)
    }

    /// Get a query parameter as a specific type
    pub fn get_as<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.params.get(key)?.parse().ok()
    }

    /// Check if a parameter exists
    pub fn has(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Get as HashMap
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.params
    }
}
