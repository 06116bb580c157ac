/// Route token derivation from file paths
///
/// Pure functional parser that turns a route file's path (relative to the
/// routes directory) into the URL-shaped token the rest of the stack works
/// with. Bracket notation is preserved: `user/[id]/index.rs` → `/user/[id]`.

use thiserror::Error;

use super::segment::{classify_segment, is_valid_param_name, SegmentKind};

/// Why a file path could not be turned into a route token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid parameter segment `{0}`")]
    InvalidParam(String),
    #[error("segment `{0}` follows a catch-all segment")]
    SegmentAfterCatchAll(String),
    #[error("parameter `{0}` is bound more than once")]
    DuplicateParam(String),
}

/// Accumulator for the fold over path segments
#[derive(Default)]
struct TokenState {
    token: String,
    params: Vec<String>,
    catch_all: bool,
}

impl TokenState {
    fn push(mut self, segment: &str, kind: &SegmentKind) -> Result<Self, TokenError> {
        if self.catch_all {
            return Err(TokenError::SegmentAfterCatchAll(segment.to_string()));
        }

        if let Some(name) = kind.param_name() {
            if !is_valid_param_name(name) {
                return Err(TokenError::InvalidParam(segment.to_string()));
            }
            if self.params.iter().any(|p| p == name) {
                return Err(TokenError::DuplicateParam(name.to_string()));
            }
            self.params.push(name.to_string());
        }

        self.catch_all = kind.is_catch_all();
        self.token.push('/');
        self.token.push_str(segment);
        Ok(self)
    }

    fn finalize(mut self) -> String {
        if self.token.is_empty() {
            self.token.push('/');
        }
        self.token
    }
}

/// Processes one segment (pure function: (state, segment) -> new state)
fn process_segment(
    state: TokenState,
    (segment, is_last): (&str, bool),
) -> Result<TokenState, TokenError> {
    if segment.is_empty() || (is_last && segment == "index") {
        return Ok(state);
    }

    match classify_segment(segment) {
        SegmentKind::Group(_) => Ok(state),
        kind => state.push(segment, &kind),
    }
}

/// Strips the route file extension from the final path component
pub fn strip_extension<'a>(relative: &'a str, extension: &str) -> &'a str {
    relative
        .strip_suffix(extension)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(relative)
}

/// Derives a route token from a path relative to the routes directory
///
/// # Examples
///
/// ```
/// use fsroute_router::route::token::token_from_path;
///
/// assert_eq!(token_from_path("index.rs", "rs").unwrap(), "/");
/// assert_eq!(token_from_path("user/[id]/index.rs", "rs").unwrap(), "/user/[id]");
/// assert_eq!(token_from_path("static/[[...a]].rs", "rs").unwrap(), "/static/[[...a]]");
/// assert_eq!(token_from_path("(site)/about.rs", "rs").unwrap(), "/about");
/// ```
pub fn token_from_path(relative: &str, extension: &str) -> Result<String, TokenError> {
    let without_ext = strip_extension(relative, extension);
    let segments: Vec<&str> = without_ext.split('/').collect();
    let last = segments.len().saturating_sub(1);

    segments
        .iter()
        .enumerate()
        .map(|(i, s)| (*s, i == last))
        .try_fold(TokenState::default(), process_segment)
        .map(TokenState::finalize)
}
