// File: src/config.rs
// Purpose: Configuration parsing from fsroute.toml, environment overrides, code-level options

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::Plugin;
use crate::handler::DeriveFn;

/// Environment variable overriding the origin URL
pub const ENV_ORIGIN: &str = "FSROUTE_ORIGIN";
/// Environment variable overriding the listening port
pub const ENV_PORT: &str = "FSROUTE_PORT";
/// Environment variable selecting the run mode (`production` disables the dev watcher)
pub const ENV_MODE: &str = "FSROUTE_ENV";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub dev: DevConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
///
/// `port` and `origin` resolve as: explicit value, then environment, then default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub origin: Option<String>,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoutingConfig {
    /// Directory containing route files (default: `<cwd>/src/routes`)
    #[serde(default)]
    pub routes_dir: Option<PathBuf>,

    /// Prefix for all route patterns (e.g. "api" or "/v1")
    #[serde(default)]
    pub base_path: Option<String>,
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub src_dir: Option<PathBuf>,

    #[serde(default = "default_output_dir")]
    pub out_dir: PathBuf,

    #[serde(default = "default_false")]
    pub sourcemaps: bool,
}

/// Development configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// Watch the routes directory and reload on change (ignored in production)
    #[serde(default = "default_true")]
    pub watch: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn, error or off
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_origin() -> String {
    fsroute_router::DEFAULT_ORIGIN.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            origin: None,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            src_dir: None,
            out_dir: default_output_dir(),
            sourcemaps: false,
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self { watch: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// Port to listen on: explicit, then `FSROUTE_PORT`, then 3000
    pub fn resolved_port(&self) -> u16 {
        self.resolve_port_with(env_var)
    }

    /// Origin URL: explicit, then `FSROUTE_ORIGIN`, then `http://localhost`
    pub fn resolved_origin(&self) -> String {
        self.resolve_origin_with(env_var)
    }

    fn resolve_port_with(&self, lookup: impl Fn(&str) -> Option<String>) -> u16 {
        self.port
            .or_else(|| {
                let raw = lookup(ENV_PORT)?;
                raw.trim()
                    .parse()
                    .map_err(|_| tracing::warn!(value = %raw, "Ignoring invalid {}", ENV_PORT))
                    .ok()
            })
            .unwrap_or_else(default_port)
    }

    fn resolve_origin_with(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        self.origin
            .clone()
            .or_else(|| lookup(ENV_ORIGIN))
            .unwrap_or_else(default_origin)
    }
}

impl RoutingConfig {
    /// Routes directory: explicit, then `<cwd>/src/routes`
    pub fn resolved_routes_dir(&self) -> PathBuf {
        self.routes_dir
            .clone()
            .unwrap_or_else(|| current_dir().join("src").join("routes"))
    }
}

impl BuildConfig {
    /// Source directory: explicit, then `<cwd>/src`
    pub fn resolved_src_dir(&self) -> PathBuf {
        self.src_dir.clone().unwrap_or_else(|| current_dir().join("src"))
    }
}

impl DevConfig {
    /// Whether the dev watcher should run, taking `FSROUTE_ENV` into account
    pub fn watch_enabled(&self) -> bool {
        self.watch && !is_production()
    }
}

/// Whether the process runs in production mode (`FSROUTE_ENV=production`)
pub fn is_production() -> bool {
    is_production_with(env_var)
}

fn is_production_with(lookup: impl Fn(&str) -> Option<String>) -> bool {
    lookup(ENV_MODE).is_some_and(|mode| mode.eq_ignore_ascii_case("production"))
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./fsroute.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("fsroute.toml")
    }
}

/// Construction-time options: configuration plus the code-only pieces
/// (plugins and derived state) that cannot live in a TOML file.
#[derive(Clone, Default)]
pub struct Options {
    pub config: Config,
    pub plugins: Vec<Arc<dyn Plugin>>,
    pub derived_state: Vec<DeriveFn>,
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("config", &self.config)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("derived_state", &self.derived_state.len())
            .finish()
    }
}

impl Options {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn routes_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.routing.routes_dir = Some(dir.into());
        self
    }

    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.config.routing.base_path = Some(base_path.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = Some(port);
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.config.server.origin = Some(origin.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Mount a plugin on the application when it starts
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    /// Add a function deriving per-request values from the context
    pub fn derive<F>(mut self, f: F) -> Self
    where
        F: Fn(&crate::Context) -> Vec<(String, serde_json::Value)> + Send + Sync + 'static,
    {
        self.derived_state.push(Arc::new(f));
        self
    }
}
