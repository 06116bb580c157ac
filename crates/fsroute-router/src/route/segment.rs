/// Segment classification for route file paths
///
/// Pure functional parsing of file-system path segments into typed segments.
/// All functions are **pure**: same input → same output, no side effects.

/// Represents the different kinds of segments a route file path can contain
///
/// # Examples
///
/// ```
/// use fsroute_router::route::segment::{classify_segment, SegmentKind};
///
/// assert!(matches!(classify_segment("about"), SegmentKind::Static(_)));
/// assert!(matches!(classify_segment("[id]"), SegmentKind::Dynamic(_)));
/// assert!(matches!(classify_segment("[...slug]"), SegmentKind::CatchAll(_)));
/// assert!(matches!(classify_segment("[[...slug]]"), SegmentKind::OptionalCatchAll(_)));
/// assert!(matches!(classify_segment("(marketing)"), SegmentKind::Group(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Optional catch-all segment: `[[...slug]]`
    OptionalCatchAll(String),
    /// Catch-all segment: `[...slug]`
    CatchAll(String),
    /// Dynamic segment: `[id]`
    Dynamic(String),
    /// Route group: `(name)`, contributes nothing to the URL
    Group(String),
    /// Static text segment
    Static(String),
}

impl SegmentKind {
    /// Whether the segment swallows every remaining path segment
    pub fn is_catch_all(&self) -> bool {
        matches!(self, SegmentKind::CatchAll(_) | SegmentKind::OptionalCatchAll(_))
    }

    /// Parameter name bound by this segment, if any
    pub fn param_name(&self) -> Option<&str> {
        match self {
            SegmentKind::OptionalCatchAll(name)
            | SegmentKind::CatchAll(name)
            | SegmentKind::Dynamic(name) => Some(name),
            SegmentKind::Group(_) | SegmentKind::Static(_) => None,
        }
    }
}

/// Classifies a segment into a segment kind (pure function)
///
/// # Parsing Rules (evaluated in order)
///
/// 1. **Optional catch-all**: `[[...name]]`
/// 2. **Catch-all**: `[...name]`
/// 3. **Dynamic**: `[name]`
/// 4. **Group**: `(name)`
/// 5. **Static**: any other text
pub fn classify_segment(segment: &str) -> SegmentKind {
    if let Some(name) = segment
        .strip_prefix("[[...")
        .and_then(|s| s.strip_suffix("]]"))
    {
        return SegmentKind::OptionalCatchAll(name.to_string());
    }

    if let Some(inner) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return match inner.strip_prefix("...") {
            Some(name) => SegmentKind::CatchAll(name.to_string()),
            None => SegmentKind::Dynamic(inner.to_string()),
        };
    }

    match segment.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(name) => SegmentKind::Group(name.to_string()),
        None => SegmentKind::Static(segment.to_string()),
    }
}

/// Checks that a bracketed parameter name is usable
///
/// Names must be non-empty and must not contain brackets, slashes or dots.
pub fn is_valid_param_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| matches!(c, '[' | ']' | '/' | '.' | ':' | '*'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_static() {
        assert_eq!(classify_segment("about"), SegmentKind::Static("about".to_string()));
    }

    #[test]
    fn test_classify_dynamic() {
        assert_eq!(classify_segment("[id]"), SegmentKind::Dynamic("id".to_string()));
    }

    #[test]
    fn test_classify_catch_all() {
        assert_eq!(
            classify_segment("[...slug]"),
            SegmentKind::CatchAll("slug".to_string())
        );
    }

    #[test]
    fn test_classify_optional_catch_all() {
        assert_eq!(
            classify_segment("[[...a]]"),
            SegmentKind::OptionalCatchAll("a".to_string())
        );
    }

    #[test]
    fn test_classify_group() {
        assert_eq!(
            classify_segment("(marketing)"),
            SegmentKind::Group("marketing".to_string())
        );
    }

    #[test]
    fn test_param_names() {
        assert_eq!(classify_segment("[id]").param_name(), Some("id"));
        assert_eq!(classify_segment("about").param_name(), None);
        assert!(classify_segment("[[...rest]]").is_catch_all());
        assert!(!classify_segment("[id]").is_catch_all());
    }

    #[test]
    fn test_valid_param_names() {
        assert!(is_valid_param_name("id"));
        assert!(is_valid_param_name("user_id"));
        assert!(!is_valid_param_name(""));
        assert!(!is_valid_param_name("a.b"));
        assert!(!is_valid_param_name("[id"));
    }
}
