/// Route module for file-based routing
///
/// Contains the pure functional pieces: segment classification and token
/// derivation. Nothing in here touches the file system.

pub mod segment;
pub mod token;

pub use segment::{classify_segment, SegmentKind};
pub use token::{token_from_path, TokenError};
