//! Conversions between file paths and route tokens

use std::borrow::Cow;
use std::path::{Component, Path};

/// Bring a lookup string into the form route tokens are stored in
///
/// Tokens always start with `/`, never end with one (root aside) and hold no
/// empty segments. A string already in that form is returned borrowed.
///
/// ```
/// use fsroute_router::path::canonical_token;
///
/// assert_eq!(canonical_token("/user/[id]"), "/user/[id]");
/// assert_eq!(canonical_token("user//[id]/"), "/user/[id]");
/// assert_eq!(canonical_token(""), "/");
/// ```
pub fn canonical_token(token: &str) -> Cow<'_, str> {
    if token == "/" || is_canonical(token) {
        return Cow::Borrowed(token);
    }

    let mut out = String::with_capacity(token.len() + 1);
    for segment in token.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    Cow::Owned(out)
}

fn is_canonical(token: &str) -> bool {
    token.starts_with('/') && token[1..].split('/').all(|segment| !segment.is_empty())
}

/// Converts a file path under `root` into a `/`-separated relative path
///
/// Returns `None` when `file` is not inside `root` or contains components
/// that cannot appear in a route (`..`, non UTF-8 names).
///
/// # Examples
///
/// ```
/// use fsroute_router::path::relative_route_path;
/// use std::path::Path;
///
/// let rel = relative_route_path(Path::new("/app/routes/user/[id]/index.rs"), Path::new("/app/routes"));
/// assert_eq!(rel.as_deref(), Some("user/[id]/index.rs"));
/// ```
pub fn relative_route_path(file: &Path, root: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;

    relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .map(|parts| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/")]
    #[case("/about")]
    #[case("/user/[id]")]
    #[case("/static/[[...a]]")]
    fn test_canonical_token_borrows(#[case] token: &str) {
        assert!(matches!(canonical_token(token), Cow::Borrowed(t) if t == token));
    }

    #[rstest]
    #[case("", "/")]
    #[case("//", "/")]
    #[case("about", "/about")]
    #[case("/user/[id]/", "/user/[id]")]
    #[case("/blog//[slug]", "/blog/[slug]")]
    fn test_canonical_token_rewrites(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(canonical_token(input), expected);
    }

    #[test]
    fn test_relative_route_path() {
        let root = Path::new("/srv/routes");
        assert_eq!(
            relative_route_path(Path::new("/srv/routes/static/[[...a]].rs"), root).as_deref(),
            Some("static/[[...a]].rs")
        );
        assert_eq!(relative_route_path(Path::new("/elsewhere/a.rs"), root), None);
    }
}
