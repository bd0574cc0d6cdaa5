//! Line format handling.
//!
//! This module turns raw transport bytes into records:
//! - Decoding (UTF-8 + trim)
//! - Parsing (comment/blank detection, field splitting, arity check)

mod decode;
mod parse;

pub use decode::decode_line;
pub use parse::{parse_line, LineParser, ParsedLine, DEFAULT_COMMENT_MARKER, DEFAULT_DELIMITER};
