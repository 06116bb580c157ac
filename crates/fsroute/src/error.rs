// File: src/error.rs
// Purpose: Error types for route loading, registration and the server lifecycle

use std::fmt;

use thiserror::Error;

/// Errors raised by the host application when a route is added
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("unsupported HTTP method `{0}`")]
    UnsupportedMethod(String),

    #[error("{method} {path} is already registered")]
    DuplicateRoute { method: String, path: String },

    #[error("path `{path}` conflicts with an existing route: {reason}")]
    Conflict { path: String, reason: String },
}

/// Errors scoped to a single route's load and registration
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("couldn't match route: {route}")]
    RouteNotMatched { route: String },

    #[error("module for route {route} not loaded: {reason}")]
    ModuleLoad { route: String, reason: String },

    #[error("couldn't find route handler for route: {route}")]
    MissingHandler { route: String },

    #[error("no handler function for {method} {route}")]
    MissingHandlerFunction { route: String, method: String },

    #[error("error registering route {method} {pattern}")]
    Registration {
        method: String,
        pattern: String,
        #[source]
        source: AppError,
    },
}

impl RouteError {
    /// Whether the error came from the host application rather than the module
    pub fn is_registration(&self) -> bool {
        matches!(self, RouteError::Registration { .. })
    }
}

/// A failed route together with its token
#[derive(Debug)]
pub struct RouteFailure {
    pub route: String,
    pub error: RouteError,
}

impl fmt::Display for RouteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.route, self.error)?;
        if let RouteError::Registration { source, .. } = &self.error {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

/// Lifecycle state of a [`crate::Server`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Idle => "idle",
            ServerState::Starting => "starting",
            ServerState::Running => "running",
            ServerState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Top-level errors of the orchestrator and the dev watcher
#[derive(Debug, Error)]
pub enum Error {
    #[error("{} route(s) failed to register", .0.len())]
    RoutesFailed(Vec<RouteFailure>),

    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server is {actual}, expected {expected}")]
    InvalidState {
        expected: ServerState,
        actual: ServerState,
    },

    #[error("failed to scan routes directory")]
    Scan(#[from] fsroute_router::ScanError),

    #[error("file watcher error")]
    Watch(#[from] notify::Error),

    #[error("server task failed")]
    Serve(#[source] std::io::Error),
}

impl Error {
    /// Per-route failures when the error is an aggregated registration failure
    pub fn failures(&self) -> &[RouteFailure] {
        match self {
            Error::RoutesFailed(failures) => failures,
            _ => &[],
        }
    }
}

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Formats a host and port as a bindable address, bracketing bare IPv6 hosts
pub(crate) fn format_addr(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_failed_message() {
        let err = Error::RoutesFailed(vec![RouteFailure {
            route: "/broken".to_string(),
            error: RouteError::MissingHandler {
                route: "/broken".to_string(),
            },
        }]);
        assert_eq!(err.to_string(), "1 route(s) failed to register");
        assert_eq!(err.failures().len(), 1);
    }

    #[test]
    fn test_failure_display_includes_source() {
        let failure = RouteFailure {
            route: "/x".to_string(),
            error: RouteError::Registration {
                method: "BREW".to_string(),
                pattern: "/x".to_string(),
                source: AppError::UnsupportedMethod("BREW".to_string()),
            },
        };
        assert_eq!(
            failure.to_string(),
            "/x: error registering route BREW /x (unsupported HTTP method `BREW`)"
        );
        assert!(failure.error.is_registration());
    }

    #[test]
    fn test_format_addr() {
        assert_eq!(format_addr("127.0.0.1", 8080), "127.0.0.1:8080");
        assert_eq!(format_addr("localhost", 3000), "localhost:3000");
        assert_eq!(format_addr("::1", 0), "[::1]:0");
        assert_eq!(format_addr("[::1]", 0), "[::1]:0");
    }
}
