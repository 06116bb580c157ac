// File: src/module.rs
// Purpose: Module registry mapping route files to the code that provides them

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::handler::RouteModule;

/// Produces the route module backing one route file
///
/// Resolving is async so a provider may do setup work (open a pool, read a
/// fixture) before handing back its handlers. `None` means the module could
/// not be produced.
pub trait ModuleProvider: Send + Sync {
    fn load(&self) -> BoxFuture<'static, Option<RouteModule>>;
}

impl<F, Fut> ModuleProvider for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Option<RouteModule>> + Send + 'static,
{
    fn load(&self) -> BoxFuture<'static, Option<RouteModule>> {
        self().boxed()
    }
}

/// Route file path → module provider
///
/// Keys are paths relative to the routes directory with `/` separators,
/// e.g. `user/[id]/index.rs`.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    providers: HashMap<String, Arc<dyn ModuleProvider>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut paths: Vec<&String> = self.providers.keys().collect();
        paths.sort();
        f.debug_struct("ModuleRegistry").field("paths", &paths).finish()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous module constructor
    ///
    /// ```
    /// use fsroute::{Context, HandlerConfig, ModuleRegistry, RouteModule};
    ///
    /// fn index() -> RouteModule {
    ///     RouteModule::new().get(HandlerConfig::from_fn(|_ctx: Context| async { "ok" }))
    /// }
    ///
    /// let registry = ModuleRegistry::new().module("index.rs", index);
    /// assert!(registry.contains("index.rs"));
    /// ```
    pub fn module(self, path: impl Into<String>, build: fn() -> RouteModule) -> Self {
        self.provider(path, move || async move { Some(build()) })
    }

    /// Register an async provider
    pub fn provider(mut self, path: impl Into<String>, provider: impl ModuleProvider + 'static) -> Self {
        self.providers
            .insert(normalize_key(&path.into()), Arc::new(provider));
        self
    }

    pub fn get(&self, path: &str) -> Option<Arc<dyn ModuleProvider>> {
        self.providers.get(&normalize_key(path)).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.providers.contains_key(&normalize_key(path))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

fn normalize_key(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches("./").trim_start_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sync_module_resolves() {
        let registry = ModuleRegistry::new().module("index.rs", RouteModule::new);
        let provider = registry.get("index.rs").unwrap();
        let module = provider.load().await.unwrap();
        assert!(module.handler.is_some());
    }

    #[tokio::test]
    async fn test_async_provider_can_fail() {
        let registry = ModuleRegistry::new().provider("broken.rs", || async { None });
        assert!(registry.get("broken.rs").unwrap().load().await.is_none());
    }

    #[test]
    fn test_keys_are_normalized() {
        let registry = ModuleRegistry::new().module("./user/[id]/index.rs", RouteModule::new);
        assert!(registry.contains("user/[id]/index.rs"));
        assert!(registry.contains("/user/[id]/index.rs"));
        assert!(!registry.contains("user/index.rs"));
        assert_eq!(registry.len(), 1);
    }
}
