//! Compile-time registry of the demo route modules

use fsroute::ModuleRegistry;

#[path = "routes/healthcheck/index.rs"]
pub mod healthcheck;

#[path = "routes/static/[[...a]].rs"]
pub mod public_asset;

#[path = "routes/user/[id]/index.rs"]
pub mod user;

pub fn registry() -> ModuleRegistry {
    ModuleRegistry::new()
        .module("healthcheck/index.rs", healthcheck::module)
        .module("static/[[...a]].rs", public_asset::module)
        .module("user/[id]/index.rs", user::module)
}
