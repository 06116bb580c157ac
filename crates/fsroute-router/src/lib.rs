//! # fsroute router
//!
//! File-system route discovery using the Next.js directory conventions:
//! - Static routes (`about.rs` → `/about`)
//! - Index files (`user/index.rs` → `/user`, `index.rs` → `/`)
//! - Dynamic segments (`user/[id]/index.rs` → `/user/[id]`)
//! - Catch-all segments (`docs/[...slug].rs`, `static/[[...a]].rs`)
//! - Route groups (`(marketing)/pricing.rs` → `/pricing`)
//!
//! The router only discovers routes. Tokens keep their bracket notation;
//! converting them into patterns for a web framework and matching requests
//! is left to the layer above.
//!
//! ## Ignored files
//!
//! - Hidden files and directories (`.git`, `.DS_Store`)
//! - Files and directories starting with `_`
//! - `mod.rs` module glue
//! - Files with a different extension than the router's
//!
//! ## Example
//!
//! ```no_run
//! use fsroute_router::FileSystemRouter;
//!
//! let router = FileSystemRouter::new("src/routes").unwrap();
//! for (token, file) in router.routes() {
//!     println!("{} -> {}", token, file.relative_path);
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

pub mod path;
pub mod route;

pub use path::{canonical_token, relative_route_path};
pub use route::segment::{classify_segment, SegmentKind};
pub use route::token::{token_from_path, TokenError};

/// Default extension of route files
pub const DEFAULT_EXTENSION: &str = "rs";

/// Default origin used to build absolute route URLs
pub const DEFAULT_ORIGIN: &str = "http://localhost";

// ============================================================================
// Core Types
// ============================================================================

/// Errors raised while scanning the routes directory
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("routes directory not found: {0}")]
    MissingDir(PathBuf),
    #[error("failed to walk routes directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A route file discovered on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFile {
    /// Route token, e.g. `/user/[id]`
    pub token: String,
    /// Absolute (or routes-dir prefixed) path to the file
    pub file_path: PathBuf,
    /// Path relative to the routes directory, `/`-separated
    pub relative_path: String,
}

/// Options for the file-system router
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Extension of route files, without the dot
    pub extension: String,
    /// Origin prepended to tokens by [`FileSystemRouter::url_for`]
    pub origin: String,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

/// Route table built from a routes directory
///
/// The table is built on construction and rebuilt wholesale by
/// [`FileSystemRouter::reload`]; there is no incremental update.
#[derive(Debug, Clone)]
pub struct FileSystemRouter {
    dir: PathBuf,
    options: RouterOptions,
    routes: BTreeMap<String, RouteFile>,
}

// ============================================================================
// FileSystemRouter Implementation
// ============================================================================

impl FileSystemRouter {
    /// Scans `dir` with the default options
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ScanError> {
        Self::with_options(dir, RouterOptions::default())
    }

    /// Scans `dir` with custom options
    pub fn with_options(dir: impl Into<PathBuf>, options: RouterOptions) -> Result<Self, ScanError> {
        let dir = dir.into();
        let routes = scan(&dir, &options.extension)?;
        Ok(Self { dir, options, routes })
    }

    /// Rebuilds the route table from disk
    ///
    /// On failure the previous table is left untouched.
    pub fn reload(&mut self) -> Result<(), ScanError> {
        self.routes = scan(&self.dir, &self.options.extension)?;
        debug!(dir = %self.dir.display(), routes = self.routes.len(), "Reloaded route table");
        Ok(())
    }

    /// All discovered routes, keyed and sorted by token
    pub fn routes(&self) -> &BTreeMap<String, RouteFile> {
        &self.routes
    }

    /// All discovered tokens in sorted order
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Looks up the file backing a token
    ///
    /// The token is normalized first, so `/user/[id]/` finds `/user/[id]`.
    pub fn match_token(&self, token: &str) -> Option<&RouteFile> {
        self.routes.get(canonical_token(token).as_ref())
    }

    /// Absolute URL of a token under the configured origin
    pub fn url_for(&self, token: &str) -> String {
        format!("{}{}", self.options.origin.trim_end_matches('/'), token)
    }

    /// The routes directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The configured origin
    pub fn origin(&self) -> &str {
        &self.options.origin
    }

    /// Number of discovered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether no route was discovered
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

// ============================================================================
// Scanning
// ============================================================================

fn is_ignored(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map_or(true, |name| name.starts_with('.') || name.starts_with('_'))
}

fn scan(dir: &Path, extension: &str) -> Result<BTreeMap<String, RouteFile>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::MissingDir(dir.to_path_buf()));
    }

    let mut routes: BTreeMap<String, RouteFile> = BTreeMap::new();

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_path = entry.path();
        if file_path.extension().and_then(|s| s.to_str()) != Some(extension)
            || entry.file_name() == "mod.rs"
        {
            continue;
        }

        let Some(relative_path) = relative_route_path(file_path, dir) else {
            warn!(file = %file_path.display(), "Skipping route file with a non UTF-8 path");
            continue;
        };

        let token = match token_from_path(&relative_path, extension) {
            Ok(token) => token,
            Err(e) => {
                warn!(file = %relative_path, error = %e, "Skipping invalid route file");
                continue;
            }
        };

        if let Some(existing) = routes.get(&token) {
            warn!(
                token = %token,
                kept = %existing.relative_path,
                ignored = %relative_path,
                "Two route files resolve to the same route"
            );
            continue;
        }

        debug!(token = %token, file = %relative_path, "Discovered route");
        routes.insert(
            token.clone(),
            RouteFile {
                token,
                file_path: file_path.to_path_buf(),
                relative_path,
            },
        );
    }

    Ok(routes)
}
