//! Route token → route pattern conversion
//!
//! Pure string functions, no error conditions: any string is accepted.

/// Marker that starts an optional catch-all segment in a route token
const OPTIONAL_CATCH_ALL: &str = "[[...";

/// Parameter name axum binds a trailing wildcard to
pub const WILDCARD_PARAM: &str = "wildcard";

/// Name under which handlers see the captured wildcard
pub const WILDCARD_KEY: &str = "*";

/// Converts a route token into a route pattern
///
/// 1. Everything from an optional catch-all marker (`[[...`) on is replaced by `*`
/// 2. Every `[name]` becomes `:name`
/// 3. With a base path, the root token becomes the base path itself and any
///    other token is appended to it
///
/// ```
/// use fsroute::transform::transform_route;
///
/// assert_eq!(transform_route("/user/[id]", None), "/user/:id");
/// assert_eq!(transform_route("/static/[[...a]]", None), "/static/*");
/// assert_eq!(transform_route("/", Some("api")), "api");
/// assert_eq!(transform_route("/x", Some("api")), "api/x");
/// ```
pub fn transform_route(route: &str, base_path: Option<&str>) -> String {
    let transformed = replace_dynamic_segments(&remove_wildcard(route));

    match base_path.filter(|b| !b.is_empty()) {
        Some(base) if route == "/" => base.to_string(),
        Some(base) => format!("{}{}", base, transformed),
        None => transformed,
    }
}

/// Truncates a token at the optional catch-all marker and appends `*`
pub fn remove_wildcard(route: &str) -> String {
    match route.find(OPTIONAL_CATCH_ALL) {
        Some(index) => format!("{}*", &route[..index]),
        None => route.to_string(),
    }
}

/// Replaces every bracketed `[name]` with `:name`
///
/// Same semantics as the regex substitution `\[([^\]]+)\]` → `:$1`: the name
/// runs up to the first `]`, empty brackets are left alone.
fn replace_dynamic_segments(route: &str) -> String {
    let mut out = String::with_capacity(route.len());
    let mut rest = route;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find(']') {
            Some(close) if close > 0 => {
                out.push(':');
                out.push_str(&after[..close]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('[');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Converts a route pattern into a path axum accepts
///
/// Adds the leading `/` a base path without one is missing and names a
/// trailing `*` wildcard. Returns the path to register plus, for wildcard
/// patterns, the bare prefix that must also match (`/static/*` also answers
/// `/static`).
pub fn to_axum_path(pattern: &str) -> (String, Option<String>) {
    let path = if pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("/{}", pattern)
    };

    match path.strip_suffix('*') {
        Some(prefix) if prefix.ends_with('/') => {
            let bare = match prefix.trim_end_matches('/') {
                "" => "/".to_string(),
                trimmed => trimmed.to_string(),
            };
            (format!("{}*{}", prefix, WILDCARD_PARAM), Some(bare))
        }
        Some(prefix) => (format!("{}/*{}", prefix, WILDCARD_PARAM), Some(ensure_root(prefix))),
        None => (path, None),
    }
}

fn ensure_root(prefix: &str) -> String {
    if prefix.is_empty() {
        "/".to_string()
    } else {
        prefix.to_string()
    }
}
