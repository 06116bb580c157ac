// File: src/loader.rs
// Purpose: Resolve the module backing a route token and validate its handler map

use fsroute_router::FileSystemRouter;

use crate::error::RouteError;
use crate::handler::HandlerMap;
use crate::module::ModuleRegistry;

/// Load the handler map for `route`
///
/// The token is matched against the file router, the matched file is looked
/// up in the registry and its provider awaited. Each step has its own error:
/// no file ([`RouteError::RouteNotMatched`]), no provider or no module
/// ([`RouteError::ModuleLoad`]), no handler map ([`RouteError::MissingHandler`]).
pub async fn load_route(
    route: &str,
    router: &FileSystemRouter,
    registry: &ModuleRegistry,
) -> Result<HandlerMap, RouteError> {
    let file = router
        .match_token(route)
        .ok_or_else(|| RouteError::RouteNotMatched {
            route: route.to_string(),
        })?;

    let provider = registry
        .get(&file.relative_path)
        .ok_or_else(|| RouteError::ModuleLoad {
            route: route.to_string(),
            reason: format!("no module registered for {}", file.relative_path),
        })?;

    tracing::debug!(route, file = %file.relative_path, "Loading route module");

    let module = provider.load().await.ok_or_else(|| RouteError::ModuleLoad {
        route: route.to_string(),
        reason: format!("{} resolved to no module", file.relative_path),
    })?;

    module.handler.ok_or_else(|| RouteError::MissingHandler {
        route: route.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::handler::{HandlerConfig, RouteModule};
    use std::fs;
    use tempfile::TempDir;

    fn routes_dir(files: &[&str]) -> (TempDir, FileSystemRouter) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
        let router = FileSystemRouter::new(dir.path()).unwrap();
        (dir, router)
    }

    fn index() -> RouteModule {
        RouteModule::new().get(HandlerConfig::from_fn(|_ctx: Context| async { "ok" }))
    }

    #[tokio::test]
    async fn test_loads_registered_module() {
        let (_dir, router) = routes_dir(&["index.rs"]);
        let registry = ModuleRegistry::new().module("index.rs", index);

        let map = load_route("/", &router, &registry).await.unwrap();
        assert!(map.contains_key("GET"));
    }

    #[tokio::test]
    async fn test_unmatched_route() {
        let (_dir, router) = routes_dir(&["index.rs"]);
        let err = load_route("/nope", &router, &ModuleRegistry::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::RouteNotMatched { route } if route == "/nope"));
    }

    #[tokio::test]
    async fn test_missing_provider_and_empty_module() {
        let (_dir, router) = routes_dir(&["a.rs", "b.rs"]);
        let registry = ModuleRegistry::new().provider("b.rs", || async { None });

        let err = load_route("/a", &router, &registry).await.unwrap_err();
        assert!(matches!(err, RouteError::ModuleLoad { .. }));

        let err = load_route("/b", &router, &registry).await.unwrap_err();
        assert!(matches!(err, RouteError::ModuleLoad { reason, .. } if reason.contains("no module")));
    }

    #[tokio::test]
    async fn test_module_without_handler_map() {
        let (_dir, router) = routes_dir(&["user/[id]/index.rs"]);
        let registry =
            ModuleRegistry::new().module("user/[id]/index.rs", RouteModule::without_handler);

        let err = load_route("/user/[id]", &router, &registry).await.unwrap_err();
        assert_eq!(err.to_string(), "couldn't find route handler for route: /user/[id]");
    }
}
